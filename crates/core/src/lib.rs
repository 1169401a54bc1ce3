//! # TreatOrHell Core
//!
//! Domain types, traits, and error definitions for the TreatOrHell persona
//! chat service. This crate has **no framework dependencies**: it defines the
//! model every other crate implements against.
//!
//! Each external system sits behind a trait declared here:
//! - [`Provider`] for the chat-completion API
//! - [`StorageBackend`] for the single stored answers record
//!
//! Implementations live in `treatorhell-providers` and `treatorhell-storage`,
//! which keeps the persona and gateway code testable with mocks.

pub mod error;
pub mod message;
pub mod provider;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, StorageError, ValidationError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use storage::{STUDENT_RESPONSES_KEY, StorageBackend, StudentAnswers};
