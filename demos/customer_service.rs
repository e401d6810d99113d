//! Example: customer service bot with tools
//!
//! A support agent answers a customer's issue using an in-memory order and
//! product database. Two of its tools end the conversation: one hands the
//! customer to a human, the other marks the chat complete with a short
//! analysis.
//!
//! # Prerequisites
//!
//! Create a `.env` file in the project root with:
//! ```
//! OPENAI_API_KEY=sk-...
//! OPENAI_MODEL=gpt-4o-mini
//! ```
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=llm_wrappers=info cargo run --example customer_service
//! ```
//!
//! Type `EXIT` to leave the chat.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use llm_wrappers::{
    create_provider, create_tool_declaration, register_tools, tool, Agent, AgentError,
    ChatOutcome, GenerationConfig, OpenAiConfig, ProviderConfig, TerminalStatus, ToolRegistry,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const SYSTEM_PROMPT: &str = "You are a customer support agent for an online store. \
The first message contains the customer's profile and the order they are asking about. \
Use the tools to look up orders and products; never invent order or product details. \
If you cannot help, or the customer asks for a person, call `request_transfer_to_human`. \
Use `sys_request` to ask the internal expert team when a policy question is unclear. \
Once the customer has nothing more to ask, call `chat_complete`.";

#[derive(Debug, Clone)]
struct Order {
    product_id: u32,
    status: &'static str,
    refund_available: bool,
}

#[derive(Debug, Clone, Serialize)]
struct Product {
    name: &'static str,
    product_type: &'static str,
    price: f64,
    in_stock: bool,
}

struct Database {
    orders: HashMap<u32, Order>,
    products: HashMap<u32, Product>,
}

impl Database {
    fn sample() -> Self {
        let orders = [
            (10045, 51033, "Delivered", true),
            (10046, 51034, "Delivered", false),
            (10047, 51035, "Shipped", true),
            (10048, 51036, "Processing", true),
            (10049, 51033, "Cancelled", false),
            (10050, 51037, "In Transit", true),
            (10051, 51038, "Returned", false),
        ]
        .into_iter()
        .map(|(id, product_id, status, refund_available)| {
            (
                id,
                Order {
                    product_id,
                    status,
                    refund_available,
                },
            )
        })
        .collect();

        let products = [
            (51033, "Trail Runner 2", "shoes", 89.99, true),
            (51034, "City Walker", "shoes", 64.50, true),
            (51035, "Storm Shell Jacket", "jackets", 149.00, false),
            (51036, "Down Parka", "jackets", 229.00, true),
            (51037, "Daypack 20L", "bags", 54.95, true),
            (51038, "Weekender Duffel", "bags", 99.00, false),
        ]
        .into_iter()
        .map(|(id, name, product_type, price, in_stock)| {
            (
                id,
                Product {
                    name,
                    product_type,
                    price,
                    in_stock,
                },
            )
        })
        .collect();

        Self { orders, products }
    }

    fn order(&self, order_id: &str) -> Result<&Order, String> {
        let id: u32 = order_id
            .trim()
            .parse()
            .map_err(|_| format!("`{}` is not a valid order id", order_id))?;
        self.orders
            .get(&id)
            .ok_or_else(|| format!("No order with id {}", id))
    }

    fn product(&self, product_id: &str) -> Result<&Product, String> {
        let id: u32 = product_id
            .trim()
            .parse()
            .map_err(|_| format!("`{}` is not a valid product id", product_id))?;
        self.products
            .get(&id)
            .ok_or_else(|| format!("No product with id {}", id))
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct OrderArgs {
    /// Order ID of the order, e.g. 10045
    pub order_id: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct ProductArgs {
    /// Product ID of the product, e.g. 51033
    pub product_id: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct CategoryArgs {
    /// Product category: one of "shoes", "jackets" or "bags"
    pub category: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct ShippingArgs {
    /// Name of the city
    pub city_name: String,
    /// Two-letter state code, e.g. CA
    pub state_code: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct ExpertQuery {
    /// Question for the internal expert team
    pub query: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct NoArgs {}

#[derive(Deserialize, JsonSchema)]
pub struct ChatCompleteArgs {
    /// "True" if the customer's issue was resolved, otherwise "False"
    pub issue_resolved: String,
    /// Customer satisfaction: "Positive", "Neutral" or "Negative"
    pub customer_satisfaction_level: String,
}

#[tool(description = "Check whether shipping is available to the given city")]
fn is_shipping_available(_args: ShippingArgs) -> Result<String, String> {
    Ok("True".to_string())
}

#[tool(description = "Ask the internal expert team a question and wait for their answer")]
async fn sys_request(args: ExpertQuery) -> Result<String, String> {
    // Waiting on a human must not stall a runtime worker
    tokio::task::spawn_blocking(move || ask_expert(&args.query))
        .await
        .map_err(|e| format!("Expert prompt was interrupted: {}", e))?
}

fn ask_expert(query: &str) -> Result<String, String> {
    println!("\n[Message by AI for human expert: ```{}```]", query);
    print!("Expert: ");
    io::stdout().flush().map_err(|e| e.to_string())?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| e.to_string())?;
    Ok(answer.trim().to_string())
}

#[tool(description = "Transfer the chat to a human expert", terminal)]
fn request_transfer_to_human(_args: NoArgs) -> Result<TerminalStatus, String> {
    Ok(TerminalStatus::TransferredToHuman {
        message: "The chat is being transferred to a human expert.".to_string(),
    })
}

#[tool(description = "Mark the chat complete once the customer has nothing more to ask", terminal)]
fn chat_complete(args: ChatCompleteArgs) -> Result<TerminalStatus, String> {
    Ok(TerminalStatus::Completed {
        analysis: serde_json::json!({
            "issue_resolved": args.issue_resolved,
            "customer_satisfaction_level": args.customer_satisfaction_level,
        }),
    })
}

fn build_registry(db: Arc<Database>) -> Result<ToolRegistry, Box<dyn std::error::Error>> {
    let mut registry = ToolRegistry::new();

    let orders = db.clone();
    registry.register_sync(
        create_tool_declaration::<OrderArgs>(
            "get_order_status",
            "Get status of the order with the given `order_id`",
        ),
        move |args: OrderArgs| orders.order(&args.order_id).map(|order| order.status),
    )?;

    let orders = db.clone();
    registry.register_sync(
        create_tool_declaration::<OrderArgs>(
            "check_refund_available",
            "Check whether the order with the given `order_id` can be refunded",
        ),
        move |args: OrderArgs| {
            orders
                .order(&args.order_id)
                .map(|order| if order.refund_available { "True" } else { "False" })
        },
    )?;

    let products = db.clone();
    registry.register_sync(
        create_tool_declaration::<ProductArgs>(
            "get_product_details",
            "Get name, category, price and stock of the product with the given `product_id`",
        ),
        move |args: ProductArgs| products.product(&args.product_id).cloned(),
    )?;

    let products = db;
    registry.register_sync(
        create_tool_declaration::<CategoryArgs>(
            "get_product_suggestions",
            "List the product ids available in the given category",
        ),
        move |args: CategoryArgs| {
            let mut ids: Vec<u32> = products
                .products
                .iter()
                .filter(|(_, product)| product.product_type.eq_ignore_ascii_case(&args.category))
                .map(|(id, _)| *id)
                .collect();
            ids.sort_unstable();
            Ok::<_, String>(ids)
        },
    )?;

    register_tools!(
        registry,
        is_shipping_available_tool,
        sys_request_tool,
        request_transfer_to_human_tool,
        chat_complete_tool,
    )?;

    Ok(registry)
}

fn customer_issue(db: &Database) -> serde_json::Value {
    let order_id = 10050;
    let product_id = db.orders.get(&order_id).map(|order| order.product_id);
    serde_json::json!({
        "customer": {
            "name": "Jordan Lee",
            "account_type": "premium",
            "city": "Sacramento",
            "account_age_months": 27,
        },
        "order": {
            "order_id": order_id,
            "product_id": product_id,
            "payment_type": "credit_card",
        },
    })
}

fn print_outcome(outcome: &ChatOutcome) {
    match outcome {
        ChatOutcome::Reply { text, truncated } => {
            println!("Agent: {}", text);
            if *truncated {
                println!("[reply was cut off at the token limit]");
            }
        }
        ChatOutcome::Ended(TerminalStatus::TransferredToHuman { message }) => {
            println!("[{}]", message);
        }
        ChatOutcome::Ended(TerminalStatus::Completed { analysis }) => {
            println!("[Chat has been marked complete by AI: {}]", analysis);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Customer Service Bot ===\n");

    let db = Arc::new(Database::sample());
    let issue = customer_issue(&db);
    let registry = build_registry(db)?;

    let config = OpenAiConfig::from_env()?
        .with_generation(GenerationConfig::new(512).with_temperature(0.2))
        .with_timeout_secs(60);
    println!("Model: {}\n", config.model);

    // The agent advertises the registry's tools with every request
    let provider = create_provider(ProviderConfig::OpenAi(config), Vec::new())?;
    let agent = Agent::new(provider, Box::new(registry));
    let mut context = agent.new_chat(SYSTEM_PROMPT);

    println!("Customer issue: {}\n", issue);
    let outcome = agent.chat(&mut context, issue.to_string()).await?;
    print_outcome(&outcome);

    let mut ended = matches!(outcome, ChatOutcome::Ended(_));
    let stdin = io::stdin();
    while !ended {
        print!("\nYou: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "EXIT" {
            println!("[Chat ended by user]");
            break;
        }

        match agent.chat(&mut context, line).await {
            Ok(outcome) => {
                print_outcome(&outcome);
                ended = matches!(outcome, ChatOutcome::Ended(_));
            }
            Err(AgentError::Llm(e)) if e.is_transient() => {
                eprintln!("Provider unavailable, try again: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let usage = context.usage();
    println!(
        "\nExchanges: {}  Tokens: {} in / {} out",
        context.chat_length(),
        usage.input_tokens,
        usage.output_tokens
    );
    Ok(())
}
