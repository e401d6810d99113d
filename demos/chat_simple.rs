/// Simple chat example
///
/// This example demonstrates the basic usage of the wrappers:
/// - Picking a provider from the environment with create_provider
/// - Keeping a conversation in a ChatContext
/// - Reading user turns from stdin until EXIT
///
/// To run this example:
/// 1. Create a .env file in the project root with either
///    OPENAI_API_KEY=sk-...
///    or, for Claude,
///    ANTHROPIC_API_KEY=sk-ant-...
///    or, for a hosted HuggingFace model,
///    HF_API_KEY=hf_...
///    HF_MODEL=HuggingFaceH4/zephyr-7b-beta
/// 2. Run: cargo run --example chat_simple
use std::io::{self, BufRead, Write};

use llm_wrappers::{
    create_provider, Agent, AnthropicConfig, ChatOutcome, GenerationConfig, HuggingFaceConfig,
    OpenAiConfig, ProviderConfig, ToolRegistry,
};
use tracing_subscriber::EnvFilter;

fn provider_config() -> Result<ProviderConfig, Box<dyn std::error::Error>> {
    let generation = GenerationConfig::new(256).with_temperature(0.7);
    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        let config = AnthropicConfig::from_env()?.with_generation(generation);
        Ok(ProviderConfig::Anthropic(config))
    } else if std::env::var("HF_API_KEY").is_ok() {
        let config = HuggingFaceConfig::from_env()?.with_generation(generation);
        Ok(ProviderConfig::HuggingFace(config))
    } else {
        let config = OpenAiConfig::from_env()?.with_generation(generation);
        Ok(ProviderConfig::OpenAi(config))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== LLM Wrappers - Simple Chat ===\n");

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = provider_config()?;
    println!("Provider: {:?}\n", config);
    let provider = create_provider(config, Vec::new())?;
    let agent = Agent::new(provider, Box::new(ToolRegistry::new()));

    // One-off completion before the conversation starts
    let completion = agent.new_completion("Reply with a single short sentence.");
    let greeting = agent
        .completion(&completion, "Greet a user who just opened a chat window.")
        .await?;
    println!("Assistant: {}", greeting);

    let mut context = agent.new_chat("You are a friendly, concise assistant.");
    let stdin = io::stdin();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line == "EXIT" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match agent.chat(&mut context, line).await {
            Ok(ChatOutcome::Reply { text, truncated }) => {
                println!("Assistant: {}", text);
                if truncated {
                    println!("[truncated]");
                }
            }
            Ok(ChatOutcome::Ended(status)) => {
                println!("[conversation ended: {}]", status.as_str());
                break;
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    let usage = context.usage();
    println!(
        "\n{} exchanges, {} tokens used",
        context.chat_length(),
        usage.total_tokens
    );
    Ok(())
}
