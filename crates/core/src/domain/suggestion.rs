use serde::{Deserialize, Serialize};

use crate::domain::quote::LineItem;

/// Confidence attached by the suggestion source to each estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "alta" => Some(Self::High),
            "medium" | "media" => Some(Self::Medium),
            "low" | "bassa" => Some(Self::Low),
            _ => None,
        }
    }
}

/// One raw estimate coming back from the suggestion source. Untrusted input:
/// amounts get clamped by the pricing engine and suggestions without a
/// non-empty `explanation` are discarded before pricing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub description: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub suggested_unit_cost: f64,
    #[serde(default)]
    pub suggested_margin_percent: f64,
    pub confidence: Confidence,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub needs_input: bool,
}

impl AiSuggestion {
    pub fn has_explanation(&self) -> bool {
        !self.explanation.trim().is_empty()
    }
}

/// Frozen copy of what the AI proposed for an item, kept for later
/// delta comparison by the feedback tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiSnapshot {
    pub unit_cost: f64,
    pub margin_percent: f64,
    pub confidence: Confidence,
}

/// A priced line item that still carries its AI provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichedLineItem {
    pub item: LineItem,
    pub confidence: Confidence,
    pub explanation: String,
    pub needs_input: bool,
    pub ai_suggested: AiSnapshot,
}

/// Full payload returned by the suggestion source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub suggestions: Vec<AiSuggestion>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub validity_days: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}
