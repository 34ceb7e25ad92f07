//! Canonical pricing math: cost/margin/price conversions, quote totals and
//! fiscal totals.
//!
//! Every monetary value is rounded to 2 decimals with round-half-away-from-
//! zero semantics. The epsilon term counters binary floating point
//! truncation of values like 0.005 that would otherwise round down.
//! Margins are silently clamped into `[0, margin_ceiling]`, never rejected:
//! they originate from user-editable fields and must not block a save.

use serde::{Deserialize, Serialize};

use crate::domain::quote::{LineItem, QuotePricing};
use crate::domain::suggestion::{AiSnapshot, AiSuggestion, EnrichedLineItem};

/// Round to 2 decimals, half away from zero, with an epsilon correction.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let epsilon = if value >= 0.0 { 1e-9 } else { -1e-9 };
    ((value + epsilon) * 100.0).round() / 100.0
}

/// Tunable pricing policy. The margin ceiling is deliberately a parameter:
/// product has not decided whether premium categories deserve a different
/// one, so nothing hard-codes 90 outside of this default.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tax_rate: f64,
    pub margin_ceiling: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { tax_rate: 22.0, margin_ceiling: 90.0 }
    }
}

/// A consistent cost/margin/price triangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricedPair {
    pub unit_cost: f64,
    pub margin_percent: f64,
    pub unit_price: f64,
}

/// Monetary shape of an incoming line item, resolved once at ingestion
/// instead of branching on field presence at every call site.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawAmounts {
    CostMargin { unit_cost: f64, margin_percent: f64 },
    CostPrice { unit_cost: f64, unit_price: f64 },
    PriceOnly { unit_price: f64 },
}

impl RawAmounts {
    /// Dispatch rule for loosely shaped input: cost+margin wins, then
    /// cost+price, then legacy price-only (cost=0, margin=0).
    pub fn from_parts(
        unit_cost: Option<f64>,
        margin_percent: Option<f64>,
        unit_price: Option<f64>,
    ) -> Self {
        match (unit_cost, margin_percent, unit_price) {
            (Some(cost), Some(margin), _) => Self::CostMargin { unit_cost: cost, margin_percent: margin },
            (Some(cost), None, Some(price)) => Self::CostPrice { unit_cost: cost, unit_price: price },
            _ => Self::PriceOnly { unit_price: unit_price.unwrap_or(0.0) },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLineItem {
    pub description: String,
    pub quantity: Option<f64>,
    pub amounts: RawAmounts,
}

impl From<&LineItem> for RawLineItem {
    /// Re-ingestion of an already processed item. Price is preserved exactly
    /// so that reprocessing never drifts totals.
    fn from(item: &LineItem) -> Self {
        let amounts = if item.unit_cost > 0.0 {
            RawAmounts::CostPrice { unit_cost: item.unit_cost, unit_price: item.unit_price }
        } else {
            RawAmounts::PriceOnly { unit_price: item.unit_price }
        };
        Self { description: item.description.clone(), quantity: Some(f64::from(item.quantity)), amounts }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PricingEngine {
    policy: PricingPolicy,
}

impl PricingEngine {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PricingPolicy {
        self.policy
    }

    fn clamp_margin(&self, margin: f64) -> f64 {
        if !margin.is_finite() {
            return 0.0;
        }
        margin.clamp(0.0, self.policy.margin_ceiling)
    }

    fn clamp_amount(&self, amount: f64) -> f64 {
        if !amount.is_finite() {
            return 0.0;
        }
        amount.max(0.0)
    }

    /// Derive price from cost by markup.
    pub fn compute_price(&self, unit_cost: f64, margin_percent: f64) -> PricedPair {
        let unit_cost = round2(self.clamp_amount(unit_cost));
        let margin_percent = round2(self.clamp_margin(margin_percent));
        let unit_price = round2(unit_cost * (1.0 + margin_percent / 100.0));
        PricedPair { unit_cost, margin_percent, unit_price }
    }

    /// Derive margin from cost and price. A non-positive cost forces margin
    /// to 0: the margin is undefined there, not infinite.
    pub fn compute_margin(&self, unit_cost: f64, unit_price: f64) -> PricedPair {
        let unit_cost = round2(self.clamp_amount(unit_cost));
        let unit_price = round2(self.clamp_amount(unit_price));
        let margin_percent = if unit_cost <= 0.0 {
            0.0
        } else {
            round2(self.clamp_margin((unit_price - unit_cost) / unit_cost * 100.0))
        };
        PricedPair { unit_cost, margin_percent, unit_price }
    }

    /// Invert the markup: what cost would produce `unit_price` at
    /// `margin_percent`? Used to enrich manually added rows the AI never saw.
    pub fn infer_cost(&self, unit_price: f64, margin_percent: f64) -> f64 {
        let unit_price = self.clamp_amount(unit_price);
        let margin_percent = self.clamp_margin(margin_percent);
        round2(unit_price / (1.0 + margin_percent / 100.0))
    }

    fn coerce_quantity(quantity: Option<f64>) -> u32 {
        let raw = quantity.unwrap_or(1.0);
        if !raw.is_finite() {
            return 1;
        }
        (raw.round().max(1.0).min(f64::from(u32::MAX))) as u32
    }

    pub fn process_line_item(&self, raw: &RawLineItem) -> LineItem {
        let pair = match raw.amounts {
            RawAmounts::CostMargin { unit_cost, margin_percent } => {
                self.compute_price(unit_cost, margin_percent)
            }
            RawAmounts::CostPrice { unit_cost, unit_price } => {
                self.compute_margin(unit_cost, unit_price)
            }
            RawAmounts::PriceOnly { unit_price } => PricedPair {
                unit_cost: 0.0,
                margin_percent: 0.0,
                unit_price: round2(self.clamp_amount(unit_price)),
            },
        };
        let quantity = Self::coerce_quantity(raw.quantity);

        LineItem {
            description: raw.description.trim().to_string(),
            quantity,
            unit_cost: pair.unit_cost,
            margin_percent: pair.margin_percent,
            unit_price: pair.unit_price,
            subtotal: round2(f64::from(quantity) * pair.unit_price),
        }
    }

    /// Canonical recompute path. Safe to call repeatedly on already
    /// processed data: totals never drift.
    pub fn process_quote(&self, items: &[RawLineItem]) -> QuotePricing {
        let line_items: Vec<LineItem> =
            items.iter().map(|raw| self.process_line_item(raw)).collect();
        let subtotal = round2(line_items.iter().map(|item| item.subtotal).sum());
        let taxes = round2(subtotal * self.policy.tax_rate / 100.0);
        QuotePricing { line_items, subtotal, taxes, total: round2(subtotal + taxes) }
    }

    /// Price each AI suggestion and freeze a snapshot of what the AI
    /// proposed, for later delta comparison against the user's final values.
    pub fn process_ai_suggestions(&self, suggestions: &[AiSuggestion]) -> Vec<EnrichedLineItem> {
        suggestions
            .iter()
            .map(|suggestion| {
                let pair = self
                    .compute_price(suggestion.suggested_unit_cost, suggestion.suggested_margin_percent);
                let quantity = Self::coerce_quantity(suggestion.quantity);
                EnrichedLineItem {
                    item: LineItem {
                        description: suggestion.description.trim().to_string(),
                        quantity,
                        unit_cost: pair.unit_cost,
                        margin_percent: pair.margin_percent,
                        unit_price: pair.unit_price,
                        subtotal: round2(f64::from(quantity) * pair.unit_price),
                    },
                    confidence: suggestion.confidence,
                    explanation: suggestion.explanation.trim().to_string(),
                    needs_input: suggestion.needs_input,
                    ai_suggested: AiSnapshot {
                        unit_cost: pair.unit_cost,
                        margin_percent: pair.margin_percent,
                        confidence: suggestion.confidence,
                    },
                }
            })
            .collect()
    }

    /// Generalized tax computation: social contribution on the taxable
    /// amount, VAT on taxable plus contribution.
    pub fn compute_fiscal_totals(
        &self,
        subtotal: f64,
        profile: &crate::domain::fiscal::FiscalProfile,
    ) -> crate::domain::fiscal::FiscalTotals {
        let imponibile = round2(self.clamp_amount(subtotal));
        let cassa = round2(imponibile * self.clamp_amount(profile.previdenza_percent) / 100.0);
        let imponibile_con_cassa = round2(imponibile + cassa);
        let iva = round2(imponibile_con_cassa * self.clamp_amount(profile.iva_percent) / 100.0);
        crate::domain::fiscal::FiscalTotals {
            imponibile,
            cassa,
            imponibile_con_cassa,
            iva,
            totale: round2(imponibile + cassa + iva),
        }
    }
}
