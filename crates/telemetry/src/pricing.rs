//! Built-in pricing table for OpenAI chat models.
//!
//! Prices are in USD per 1 million tokens, with separate input and output
//! rates. Models missing from the table are billed at the `gpt-4o-mini`
//! rates, which is the service default.

use std::collections::HashMap;

/// The model whose rates are used when nothing better matches.
pub const FALLBACK_MODEL: &str = "gpt-4o-mini";

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Price per 1M input (prompt) tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output (completion) tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    /// Create a new pricing entry.
    pub const fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// `gpt-4o-mini`: $0.15 / 1M input, $0.60 / 1M output.
    pub const fn gpt_4o_mini() -> Self {
        Self::new(0.15, 0.60)
    }

    /// Compute cost in USD for the given token counts.
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (prompt_tokens as f64 * self.input_per_m + completion_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }
}

/// Model name → pricing lookup.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        prices.insert("gpt-4o".into(), ModelPricing::new(2.5, 10.0));
        prices.insert(FALLBACK_MODEL.into(), ModelPricing::gpt_4o_mini());
        prices.insert("gpt-4.1".into(), ModelPricing::new(2.0, 8.0));
        prices.insert("gpt-4.1-mini".into(), ModelPricing::new(0.4, 1.6));
        prices.insert("gpt-4.1-nano".into(), ModelPricing::new(0.1, 0.4));
        prices.insert("gpt-4-turbo".into(), ModelPricing::new(10.0, 30.0));
        prices.insert("gpt-3.5-turbo".into(), ModelPricing::new(0.5, 1.5));
        prices.insert("o1".into(), ModelPricing::new(15.0, 60.0));
        prices.insert("o1-mini".into(), ModelPricing::new(3.0, 12.0));
        prices.insert("o3-mini".into(), ModelPricing::new(1.1, 4.4));

        Self { prices }
    }

    /// Exact lookup.
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.prices.get(model).copied()
    }

    /// Pricing for a model name as the API reports it.
    ///
    /// Tries an exact match, then strips an `openai/` style prefix, then the
    /// longest table key that prefixes the name (`gpt-4o-mini-2024-07-18`
    /// → `gpt-4o-mini`), then falls back to [`FALLBACK_MODEL`].
    pub fn resolve(&self, model: &str) -> ModelPricing {
        if let Some(p) = self.get(model) {
            return p;
        }

        let lower = model.to_lowercase();
        let bare = lower.rsplit('/').next().unwrap_or(&lower);
        if let Some(p) = self.get(bare) {
            return p;
        }

        self.prices
            .iter()
            .filter(|(key, _)| bare.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, p)| *p)
            .unwrap_or(ModelPricing::gpt_4o_mini())
    }

    /// Estimated USD cost of one call to `model`.
    pub fn cost_for(&self, model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        self.resolve(model).cost(prompt_tokens, completion_tokens)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
