//! Tool dispatch framework
//!
//! Tools are registered with a [`ToolRegistry`] together with the declaration
//! advertised to the model. The agent hands every model-issued [`ToolCall`]
//! to a [`ToolDispatcher`], which either answers it or ends the conversation.
//!
//! [`ToolCall`]: crate::core::types::ToolCall

pub mod declaration;
pub mod dispatcher;
pub mod error;
pub mod registry;

pub use declaration::{create_tool_declaration, ToolDeclaration, ToolParam, ToolParamType};
pub use dispatcher::{Dispatch, ToolDispatcher, ToolHandler, ToolOutcome};
pub use error::DispatchError;
pub use registry::{ToolRegistration, ToolRegistry};

/// Helper macro to register multiple tools at once
///
/// Takes a registry and a list of modules generated by the `#[tool]`
/// attribute. Evaluates to `Result<(), DispatchError>`, stopping at the first
/// duplicate name.
///
/// # Example
///
/// ```ignore
/// #[tool(description = "Get status of the order with the given order_id")]
/// fn get_order_status(args: OrderArgs) -> Result<String, String> {
///     // Implementation
/// }
///
/// #[tool(description = "Get the price of the product with the given product_id")]
/// fn get_product_price(args: ProductArgs) -> Result<f64, String> {
///     // Implementation
/// }
///
/// let mut registry = ToolRegistry::new();
/// register_tools!(registry, get_order_status_tool, get_product_price_tool)?;
/// ```
#[macro_export]
macro_rules! register_tools {
    ($registry:expr, $($tool_mod:ident),+ $(,)?) => {
        (|| -> ::std::result::Result<(), $crate::tools::DispatchError> {
            $(
                $registry.register($tool_mod::registration())?;
            )+
            Ok(())
        })()
    };
}
