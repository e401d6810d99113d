//! Core abstractions for the wrapper layer

pub mod config;
pub mod error;
pub mod format;
pub mod provider;
pub mod retry;
pub mod types;
