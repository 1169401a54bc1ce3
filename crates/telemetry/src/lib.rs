//! Cost estimation for completion calls.
//!
//! Usage is never persisted; the estimate only feeds the structured log line
//! emitted after each successful completion.

pub mod pricing;

pub use pricing::{ModelPricing, PricingTable};
