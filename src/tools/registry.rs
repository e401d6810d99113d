//! Tool registry for dispatching model tool calls

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::declaration::ToolDeclaration;
use super::dispatcher::{decode_arguments, Dispatch, ToolDispatcher, ToolHandler, ToolOutcome};
use super::error::DispatchError;
use crate::core::types::{TerminalStatus, ToolCall, ToolResponse};

/// Why a typed tool function did not produce an outcome
enum ToolFault {
    BadArguments(String),
    Failed(String),
}

/// Type alias for boxed async functions
type AsyncToolFn =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<ToolOutcome, ToolFault>> + Send + Sync>;

enum ToolEntry {
    Typed(AsyncToolFn),
    Handler(Arc<dyn ToolHandler>),
}

impl ToolEntry {
    async fn run(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolFault> {
        match self {
            ToolEntry::Typed(func) => func(arguments).await,
            ToolEntry::Handler(handler) => handler.invoke(arguments).await.map_err(ToolFault::Failed),
        }
    }
}

/// Coerce a tool result to the text sent back to the model
///
/// JSON strings are passed through without quotes; everything else becomes
/// compact JSON.
pub fn coerce_result<R: Serialize>(result: &R) -> Result<String, String> {
    match serde_json::to_value(result) {
        Ok(serde_json::Value::String(text)) => Ok(text),
        Ok(value) => Ok(value.to_string()),
        Err(e) => Err(format!("Failed to serialize result: {}", e)),
    }
}

fn deserialize_args<Args: DeserializeOwned>(arguments: serde_json::Value) -> Result<Args, ToolFault> {
    serde_json::from_value::<Args>(arguments)
        .map_err(|e| ToolFault::BadArguments(format!("Failed to deserialize arguments: {}", e)))
}

/// A tool paired with its declaration, ready to be added to a registry
///
/// Produced by hand or by the `#[tool]` attribute's generated
/// `registration()` function.
pub struct ToolRegistration {
    declaration: ToolDeclaration,
    entry: ToolEntry,
}

impl ToolRegistration {
    /// Wrap an async function that returns a serializable result
    pub fn from_async<F, Args, R, Fut>(declaration: ToolDeclaration, func: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let args = match deserialize_args::<Args>(args_json) {
                Ok(args) => args,
                Err(fault) => {
                    return Box::pin(async move { Err(fault) })
                        as BoxFuture<'static, Result<ToolOutcome, ToolFault>>
                }
            };

            let future = func(args);
            Box::pin(async move {
                match future.await {
                    Ok(result) => coerce_result(&result)
                        .map(ToolOutcome::Output)
                        .map_err(ToolFault::Failed),
                    Err(e) => Err(ToolFault::Failed(e)),
                }
            }) as BoxFuture<'static, Result<ToolOutcome, ToolFault>>
        };

        Self {
            declaration,
            entry: ToolEntry::Typed(Box::new(wrapper)),
        }
    }

    /// Wrap a synchronous function that returns a serializable result
    pub fn from_sync<F, Args, R>(declaration: ToolDeclaration, func: F) -> Self
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let outcome = deserialize_args::<Args>(args_json).and_then(|args| {
                let result = func(args).map_err(ToolFault::Failed)?;
                coerce_result(&result)
                    .map(ToolOutcome::Output)
                    .map_err(ToolFault::Failed)
            });
            Box::pin(async move { outcome }) as BoxFuture<'static, _>
        };

        Self {
            declaration,
            entry: ToolEntry::Typed(Box::new(wrapper)),
        }
    }

    /// Wrap a function that ends the conversation when called
    pub fn terminal<F, Args>(declaration: ToolDeclaration, func: F) -> Self
    where
        F: Fn(Args) -> Result<TerminalStatus, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let outcome = deserialize_args::<Args>(args_json).and_then(|args| {
                func(args)
                    .map(ToolOutcome::EndConversation)
                    .map_err(ToolFault::Failed)
            });
            Box::pin(async move { outcome }) as BoxFuture<'static, _>
        };

        Self {
            declaration,
            entry: ToolEntry::Typed(Box::new(wrapper)),
        }
    }

    /// Use a hand-written handler
    pub fn from_handler(declaration: ToolDeclaration, handler: impl ToolHandler + 'static) -> Self {
        Self {
            declaration,
            entry: ToolEntry::Handler(Arc::new(handler)),
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }
}

/// Registry of the tools a conversation may call
///
/// Maps tool names to handlers and keeps the declarations advertised to the
/// provider in registration order.
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct OrderArgs {
///     order_id: String,
/// }
///
/// let mut registry = ToolRegistry::new();
/// registry.register_sync(
///     create_tool_declaration::<OrderArgs>("get_order_status", "Get status of an order"),
///     |args: OrderArgs| lookup_status(&args.order_id),
/// )?;
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
    declarations: Vec<ToolDeclaration>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            declarations: Vec::new(),
        }
    }

    /// Add a prepared registration
    pub fn register(&mut self, registration: ToolRegistration) -> Result<(), DispatchError> {
        let name = registration.declaration.name.clone();
        if self.tools.contains_key(&name) {
            return Err(DispatchError::DuplicateTool(name));
        }
        debug!(tool = %name, "Registered tool");
        self.tools.insert(name, registration.entry);
        self.declarations.push(registration.declaration);
        Ok(())
    }

    /// Register an async function that returns a serializable result
    pub fn register_async<F, Args, R, Fut>(
        &mut self,
        declaration: ToolDeclaration,
        func: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        self.register(ToolRegistration::from_async(declaration, func))
    }

    /// Register a synchronous function that returns a serializable result
    pub fn register_sync<F, Args, R>(
        &mut self,
        declaration: ToolDeclaration,
        func: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.register(ToolRegistration::from_sync(declaration, func))
    }

    /// Register a tool whose invocation ends the conversation
    pub fn register_terminal<F, Args>(
        &mut self,
        declaration: ToolDeclaration,
        func: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Args) -> Result<TerminalStatus, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
    {
        self.register(ToolRegistration::terminal(declaration, func))
    }

    /// Register a hand-written [`ToolHandler`]
    pub fn register_handler(
        &mut self,
        declaration: ToolDeclaration,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), DispatchError> {
        self.register(ToolRegistration::from_handler(declaration, handler))
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolDispatcher for ToolRegistry {
    fn declarations(&self) -> Vec<ToolDeclaration> {
        self.declarations.clone()
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<Dispatch, DispatchError> {
        let entry = self
            .tools
            .get(&call.tool_name)
            .ok_or_else(|| DispatchError::UnknownTool {
                name: call.tool_name.clone(),
            })?;

        let arguments = decode_arguments(call)?;
        info!(tool = %call.tool_name, call_id = %call.call_id, "Dispatching tool call");

        let outcome = entry.run(arguments).await.map_err(|fault| match fault {
            ToolFault::BadArguments(reason) => DispatchError::InvalidArguments {
                tool_name: call.tool_name.clone(),
                arguments: call.arguments.clone(),
                reason,
            },
            ToolFault::Failed(message) => DispatchError::ToolFailed {
                tool_name: call.tool_name.clone(),
                arguments: call.arguments.clone(),
                message,
            },
        })?;

        match outcome {
            ToolOutcome::Output(result) => Ok(Dispatch::Continue(ToolResponse::new(
                call.tool_name.clone(),
                call.call_id.clone(),
                result,
            ))),
            ToolOutcome::EndConversation(status) => {
                info!(tool = %call.tool_name, status = status.as_str(), "Tool ended the conversation");
                Ok(Dispatch::Terminate(status))
            }
        }
    }
}
