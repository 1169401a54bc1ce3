//! Chat-completion provider implementations for TreatOrHell.
//!
//! [`OpenAiCompatProvider`] performs single HTTP calls; [`CompletionClient`]
//! layers the fixed model settings, retry policy, and usage logging on top
//! of any `treatorhell_core::Provider`.

pub mod client;
pub mod openai_compat;
pub mod retry;

pub use client::{Completion, CompletionClient};
pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryPolicy;
