//! HuggingFace provider implementation
//!
//! Chat-tuned causal models hosted on the HuggingFace Inference API. The
//! conversation is rendered through a [`ChatTemplate`] and the answer is cut
//! out of the generated text.

pub mod client;
pub mod config;
pub mod mapper;
pub mod template;
pub mod types;

pub use client::HuggingFaceClient;
pub use config::HuggingFaceConfig;
pub use template::ChatTemplate;
