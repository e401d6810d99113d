//! Environment-driven configuration

use std::env;

use llm_wrappers::{
    create_provider, AnthropicConfig, HuggingFaceConfig, LlmError, OpenAiConfig, PayloadFormat,
    ProviderConfig,
};
use serial_test::serial;

const VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_MODEL",
    "OPENAI_BASE_URL",
    "HF_API_KEY",
    "HF_MODEL",
    "HF_BASE_URL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_MODEL",
    "ANTHROPIC_BASE_URL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_openai_from_env_defaults() {
    clear_env();
    env::set_var("OPENAI_API_KEY", "sk-env");

    let config = OpenAiConfig::from_env().unwrap();
    assert_eq!(config.api_key, "sk-env");
    assert_eq!(config.model, "gpt-3.5-turbo");
    assert_eq!(config.base_url, "https://api.openai.com/v1");

    clear_env();
}

#[test]
#[serial]
fn test_openai_from_env_overrides() {
    clear_env();
    env::set_var("OPENAI_API_KEY", "sk-env");
    env::set_var("OPENAI_MODEL", "gpt-4o-mini");
    env::set_var("OPENAI_BASE_URL", "http://localhost:8080/v1");

    let config = OpenAiConfig::from_env().unwrap();
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.base_url, "http://localhost:8080/v1");

    clear_env();
}

#[test]
#[serial]
fn test_missing_or_blank_key_is_an_error() {
    clear_env();
    assert!(matches!(OpenAiConfig::from_env(), Err(LlmError::ConfigError(_))));

    env::set_var("HF_API_KEY", "   ");
    assert!(matches!(HuggingFaceConfig::from_env(), Err(LlmError::ConfigError(_))));

    clear_env();
}

#[test]
#[serial]
fn test_huggingface_provider_from_env() {
    clear_env();
    env::set_var("HF_API_KEY", "hf_env");
    env::set_var("HF_MODEL", "meta-llama/Llama-2-7b-chat-hf");

    let config = HuggingFaceConfig::from_env().unwrap();
    assert_eq!(config.model, "meta-llama/Llama-2-7b-chat-hf");
    assert_eq!(config.base_url, "https://api-inference.huggingface.co/models");

    let provider = create_provider(ProviderConfig::HuggingFace(config), Vec::new()).unwrap();
    assert_eq!(provider.payload_format(), PayloadFormat::RoleContent);

    clear_env();
}

#[test]
#[serial]
fn test_anthropic_provider_from_env() {
    clear_env();
    assert!(matches!(AnthropicConfig::from_env(), Err(LlmError::ConfigError(_))));

    env::set_var("ANTHROPIC_API_KEY", "sk-ant-env");
    env::set_var("ANTHROPIC_BASE_URL", "http://localhost:9000/v1");

    let config = AnthropicConfig::from_env().unwrap();
    assert_eq!(config.model, "claude-3-5-sonnet-latest");
    assert_eq!(config.base_url, "http://localhost:9000/v1");

    let provider = create_provider(ProviderConfig::Anthropic(config), Vec::new()).unwrap();
    assert_eq!(provider.payload_format(), PayloadFormat::Anthropic);

    clear_env();
}
