//! Model pricing and cost estimation.
//!
//! Model ids map to per-token USD rates through an ordered list of substring
//! tiers ("opus", "sonnet", "haiku" by default). Unrecognized models fall
//! back to a default rate instead of failing, so cost stays an estimate
//! rather than a hard error.

use serde::{Deserialize, Serialize};

use super::session::TokenUsage;

/// Fallback input cost per token for unrecognized models (USD).
pub const FALLBACK_INPUT_COST_PER_TOKEN: f64 = 3e-6;
/// Fallback output cost per token for unrecognized models (USD).
pub const FALLBACK_OUTPUT_COST_PER_TOKEN: f64 = 15e-6;

/// Per-token USD rates for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRates {
    /// Cost per input token.
    pub input_cost_per_token: f64,
    /// Cost per output token.
    pub output_cost_per_token: f64,
    /// Cost per cache-read input token.
    pub cache_read_cost_per_token: f64,
    /// Cost per cache-creation input token.
    pub cache_creation_cost_per_token: f64,
}

impl Default for ModelRates {
    fn default() -> Self {
        Self {
            input_cost_per_token: FALLBACK_INPUT_COST_PER_TOKEN,
            output_cost_per_token: FALLBACK_OUTPUT_COST_PER_TOKEN,
            cache_read_cost_per_token: FALLBACK_INPUT_COST_PER_TOKEN * 0.1,
            cache_creation_cost_per_token: FALLBACK_INPUT_COST_PER_TOKEN * 1.25,
        }
    }
}

impl ModelRates {
    /// Total estimated USD cost for the given token counters.
    #[must_use]
    pub fn cost(&self, tokens: &TokenUsage) -> f64 {
        to_f64(tokens.input) * self.input_cost_per_token
            + to_f64(tokens.output) * self.output_cost_per_token
            + to_f64(tokens.cache_read) * self.cache_read_cost_per_token
            + to_f64(tokens.cache_creation) * self.cache_creation_cost_per_token
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(count: u64) -> f64 {
    count as f64
}

/// One pricing tier: a substring needle plus the rates it selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    /// Case-insensitive substring matched against the model id.
    pub needle: String,
    /// Rates applied when the needle matches.
    #[serde(flatten)]
    pub rates: ModelRates,
}

impl PricingTier {
    fn new(needle: &str, input: f64, output: f64) -> Self {
        Self {
            needle: needle.to_string(),
            rates: ModelRates {
                input_cost_per_token: input,
                output_cost_per_token: output,
                cache_read_cost_per_token: input * 0.1,
                cache_creation_cost_per_token: input * 1.25,
            },
        }
    }
}

/// Ordered pricing tiers with a fallback for unrecognized models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTable {
    /// Tiers checked in order; the first matching needle wins.
    pub tiers: Vec<PricingTier>,
    /// Rates used when no tier matches.
    pub fallback: ModelRates,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                PricingTier::new("opus", 5e-6, 25e-6),
                PricingTier::new("sonnet", 3e-6, 15e-6),
                PricingTier::new("haiku", 1e-6, 5e-6),
            ],
            fallback: ModelRates::default(),
        }
    }
}

impl PricingTable {
    /// Look up rates for a model id by substring match, first tier wins.
    #[must_use]
    pub fn rates_for(&self, model: &str) -> &ModelRates {
        let lower = model.to_ascii_lowercase();
        self.tiers
            .iter()
            .find(|tier| lower.contains(&tier.needle.to_ascii_lowercase()))
            .map_or(&self.fallback, |tier| &tier.rates)
    }

    /// Estimated USD cost for a session's cumulative token counters.
    ///
    /// Sessions that have not reported a model yet use the fallback rates.
    #[must_use]
    pub fn estimate_cost(&self, model: Option<&str>, tokens: &TokenUsage) -> f64 {
        let rates = model.map_or(&self.fallback, |m| self.rates_for(m));
        rates.cost(tokens)
    }
}

/// Derive a short display name from a raw model id.
///
/// Picks out the family ("Opus", "Sonnet", "Haiku") and the one- or
/// two-component version around it: `claude-opus-4-1-20250805` becomes
/// "Opus 4.1" and `claude-3-5-haiku-20241022` becomes "Haiku 3.5". Ids
/// without a recognized family are returned unchanged.
#[must_use]
pub fn short_model_name(model: &str) -> String {
    let lower = model.to_ascii_lowercase();
    let family = ["opus", "sonnet", "haiku"]
        .iter()
        .find(|family| lower.contains(**family));

    let Some(family) = family else {
        return model.to_string();
    };

    // Version components are short numeric segments; date stamps are longer
    // and are skipped.
    let version: Vec<&str> = lower
        .split('-')
        .filter(|part| part.len() <= 2 && !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .take(2)
        .collect();

    let mut name = String::new();
    let mut chars = family.chars();
    if let Some(first) = chars.next() {
        name.push(first.to_ascii_uppercase());
        name.push_str(chars.as_str());
    }
    if !version.is_empty() {
        name.push(' ');
        name.push_str(&version.join("."));
    }
    name
}
