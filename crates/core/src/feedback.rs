//! Feedback loop: per-line comparison of what the AI suggested against what
//! the professional actually sent, plus aggregate KPIs over that history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quote::QuoteId;
use crate::domain::suggestion::AiSnapshot;
use crate::pricing::round2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "accepted" | "accettato" => Some(Outcome::Accepted),
            "rejected" | "rifiutato" => Some(Outcome::Rejected),
            _ => None,
        }
    }
}

/// The numbers the professional actually sent for one line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserFinal {
    pub unit_cost: f64,
    pub margin_percent: f64,
    pub unit_price: f64,
}

/// One AI-priced line at send time. The outcome arrives later, when the
/// client answers, and is linked back by quote id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub quote_id: QuoteId,
    pub item_description: String,
    pub ai_suggested: AiSnapshot,
    pub user_final: UserFinal,
    pub outcome: Option<Outcome>,
    pub recorded_at: DateTime<Utc>,
    pub outcome_at: Option<DateTime<Utc>>,
}

impl FeedbackEntry {
    /// Whether the professional kept the AI's cost and margin untouched,
    /// compared at two decimals.
    pub fn is_exact_match(&self) -> bool {
        round2(self.user_final.unit_cost) == round2(self.ai_suggested.unit_cost)
            && round2(self.user_final.margin_percent) == round2(self.ai_suggested.margin_percent)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackKpi {
    pub total_feedback: u32,
    pub total_accepted: u32,
    pub total_rejected: u32,
    /// Accepted over entries with a known outcome; pending entries excluded.
    pub acceptance_rate: f64,
    pub avg_margin: f64,
    /// Share of lines where the user kept the AI cost and margin unchanged.
    pub ai_accuracy: f64,
}

/// Pure aggregation over the feedback history. An empty history yields an
/// all-zero KPI rather than NaN.
pub fn compute_kpi(entries: &[FeedbackEntry]) -> FeedbackKpi {
    let total = u32::try_from(entries.len()).unwrap_or(u32::MAX);
    if total == 0 {
        return FeedbackKpi {
            total_feedback: 0,
            total_accepted: 0,
            total_rejected: 0,
            acceptance_rate: 0.0,
            avg_margin: 0.0,
            ai_accuracy: 0.0,
        };
    }

    let mut accepted = 0u32;
    let mut rejected = 0u32;
    let mut margin_sum = 0.0;
    let mut exact = 0u32;

    for entry in entries {
        match entry.outcome {
            Some(Outcome::Accepted) => accepted += 1,
            Some(Outcome::Rejected) => rejected += 1,
            None => {}
        }
        margin_sum += entry.user_final.margin_percent;
        if entry.is_exact_match() {
            exact += 1;
        }
    }

    let decided = accepted + rejected;
    FeedbackKpi {
        total_feedback: total,
        total_accepted: accepted,
        total_rejected: rejected,
        acceptance_rate: if decided > 0 {
            round2(f64::from(accepted) / f64::from(decided) * 100.0)
        } else {
            0.0
        },
        avg_margin: round2(margin_sum / f64::from(total)),
        ai_accuracy: round2(f64::from(exact) / f64::from(total) * 100.0),
    }
}
