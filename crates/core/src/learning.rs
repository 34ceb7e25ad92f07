//! Learning profile: aggregated historical pricing behavior for one
//! professional, regenerated wholesale from quote history and summarized
//! into a natural-language context prompt that biases future AI estimates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Quote, Tier};
use crate::pricing::round2;
use crate::registry::normalize;

/// Minimum completed quotes before a profile is worth generating.
pub const DEFAULT_TRAINING_THRESHOLD: u32 = 5;

/// How many recurring items the profile keeps.
pub const MAX_RECURRING_ITEMS: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringItem {
    pub description: String,
    pub frequenza: u32,
    pub prezzo_medio: f64,
    pub costo_medio: Option<f64>,
    pub margine_medio: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub main_category: Option<String>,
    pub margine_medio: f64,
    pub prezzi_medi: BTreeMap<String, f64>,
    pub voci_ricorrenti: Vec<RecurringItem>,
    pub preferred_tier: Tier,
}

/// Owned exclusively by the learning subsystem; read-only to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningProfile {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub based_on_count: u32,
    pub profile: ProfileStats,
    pub context_prompt: String,
}

#[derive(Clone, Copy, Debug)]
pub struct LearningProfileBuilder {
    training_threshold: u32,
}

impl Default for LearningProfileBuilder {
    fn default() -> Self {
        Self { training_threshold: DEFAULT_TRAINING_THRESHOLD }
    }
}

impl LearningProfileBuilder {
    pub fn new(training_threshold: u32) -> Self {
        Self { training_threshold }
    }

    /// Memoized by count, not by time: regenerate only when the completed
    /// quote count crossed the threshold and changed since last generation.
    pub fn should_regenerate(&self, completed_count: u32, last: Option<&LearningProfile>) -> bool {
        completed_count >= self.training_threshold
            && last.map_or(true, |profile| profile.based_on_count != completed_count)
    }

    /// Pure function of the quote history. Returns `None` below the
    /// training threshold.
    pub fn build(
        &self,
        user_id: &str,
        quotes: &[Quote],
        now: DateTime<Utc>,
    ) -> Option<LearningProfile> {
        let count = u32::try_from(quotes.len()).unwrap_or(u32::MAX);
        if count < self.training_threshold {
            return None;
        }

        let stats = Self::aggregate(quotes);
        let context_prompt = Self::context_prompt(&stats, count);

        Some(LearningProfile {
            user_id: user_id.to_string(),
            generated_at: now,
            based_on_count: count,
            profile: stats,
            context_prompt,
        })
    }

    fn aggregate(quotes: &[Quote]) -> ProfileStats {
        let mut margin_sum = 0.0;
        let mut margin_count = 0u32;
        let mut tier_totals: BTreeMap<String, (f64, u32)> = BTreeMap::new();
        let mut category_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut tier_counts: BTreeMap<&'static str, u32> = BTreeMap::new();

        struct Bucket {
            display: String,
            frequenza: u32,
            price_sum: f64,
            cost_sum: f64,
            cost_count: u32,
            margin_sum: f64,
            margin_count: u32,
        }
        let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

        for quote in quotes {
            let entry = tier_totals.entry(quote.tier.as_str().to_string()).or_insert((0.0, 0));
            entry.0 += quote.pricing.total;
            entry.1 += 1;
            *tier_counts.entry(quote.tier.as_str()).or_insert(0) += 1;
            if let Some(category) = &quote.category {
                *category_counts.entry(category.clone()).or_insert(0) += 1;
            }

            for item in &quote.pricing.line_items {
                if item.margin_percent > 0.0 {
                    margin_sum += item.margin_percent;
                    margin_count += 1;
                }

                let key = normalize(&item.description);
                if key.is_empty() {
                    continue;
                }
                let bucket = buckets.entry(key).or_insert_with(|| Bucket {
                    display: item.description.clone(),
                    frequenza: 0,
                    price_sum: 0.0,
                    cost_sum: 0.0,
                    cost_count: 0,
                    margin_sum: 0.0,
                    margin_count: 0,
                });
                bucket.frequenza += 1;
                bucket.price_sum += item.unit_price;
                if item.unit_cost > 0.0 {
                    bucket.cost_sum += item.unit_cost;
                    bucket.cost_count += 1;
                }
                if item.margin_percent > 0.0 {
                    bucket.margin_sum += item.margin_percent;
                    bucket.margin_count += 1;
                }
            }
        }

        let mut recurring: Vec<RecurringItem> = buckets
            .into_values()
            .map(|bucket| RecurringItem {
                prezzo_medio: round2(bucket.price_sum / f64::from(bucket.frequenza)),
                costo_medio: (bucket.cost_count > 0)
                    .then(|| round2(bucket.cost_sum / f64::from(bucket.cost_count))),
                margine_medio: (bucket.margin_count > 0)
                    .then(|| round2(bucket.margin_sum / f64::from(bucket.margin_count))),
                description: bucket.display,
                frequenza: bucket.frequenza,
            })
            .collect();
        recurring.sort_by(|a, b| {
            b.frequenza.cmp(&a.frequenza).then_with(|| a.description.cmp(&b.description))
        });
        recurring.truncate(MAX_RECURRING_ITEMS);

        let prezzi_medi = tier_totals
            .into_iter()
            .map(|(tier, (sum, count))| (tier, round2(sum / f64::from(count))))
            .collect();

        let main_category = category_counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(category, _)| category);

        let preferred_tier = tier_counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1))
            .and_then(|(tier, _)| Tier::parse(tier))
            .unwrap_or_default();

        ProfileStats {
            main_category,
            margine_medio: if margin_count > 0 {
                round2(margin_sum / f64::from(margin_count))
            } else {
                0.0
            },
            prezzi_medi,
            voci_ricorrenti: recurring,
            preferred_tier,
        }
    }

    /// Assembled in Italian because it is injected verbatim into the
    /// suggestion request for an Italian-market product.
    fn context_prompt(stats: &ProfileStats, count: u32) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Profilo storico del professionista, basato su {count} preventivi completati."
        ));
        if let Some(category) = &stats.main_category {
            lines.push(format!("Categoria principale: {category}."));
        }
        if stats.margine_medio > 0.0 {
            lines.push(format!("Margine medio applicato: {}%.", stats.margine_medio));
        }
        if !stats.prezzi_medi.is_empty() {
            let tiers: Vec<String> = stats
                .prezzi_medi
                .iter()
                .map(|(tier, total)| format!("{tier} {total} EUR"))
                .collect();
            lines.push(format!("Totale medio per fascia: {}.", tiers.join(", ")));
        }
        if !stats.voci_ricorrenti.is_empty() {
            let items: Vec<String> = stats
                .voci_ricorrenti
                .iter()
                .take(5)
                .map(|item| {
                    format!(
                        "\"{}\" ({} volte, prezzo medio {} EUR)",
                        item.description, item.frequenza, item.prezzo_medio
                    )
                })
                .collect();
            lines.push(format!("Voci ricorrenti: {}.", items.join("; ")));
        }
        lines.push(format!("Fascia preferita: {}.", stats.preferred_tier.as_str()));
        lines.push(
            "Allinea le stime di costo e margine a questo storico quando coerente con il lavoro richiesto."
                .to_string(),
        );
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::quote::{LineItem, Quote, QuoteId, QuotePricing, QuoteStatus, Tier};

    use super::LearningProfileBuilder;

    fn quote(id: &str, tier: Tier, category: &str, items: Vec<(&str, f64, f64, f64)>) -> Quote {
        let line_items: Vec<LineItem> = items
            .into_iter()
            .map(|(description, cost, margin, price)| LineItem {
                description: description.to_string(),
                quantity: 1,
                unit_cost: cost,
                margin_percent: margin,
                unit_price: price,
                subtotal: price,
            })
            .collect();
        let subtotal: f64 = line_items.iter().map(|item| item.subtotal).sum();
        Quote {
            id: QuoteId(id.to_string()),
            user_id: "user-1".to_string(),
            status: QuoteStatus::Sent,
            category: Some(category.to_string()),
            tier,
            ai_generated: false,
            pricing: QuotePricing {
                line_items,
                subtotal,
                taxes: 0.0,
                total: subtotal,
            },
            created_at: Utc::now(),
        }
    }

    fn history() -> Vec<Quote> {
        vec![
            quote("P-1", Tier::Standard, "idraulico", vec![("Manodopera idraulica", 100.0, 30.0, 130.0)]),
            quote("P-2", Tier::Standard, "idraulico", vec![("Manodopera idraulica", 100.0, 30.0, 130.0)]),
            quote("P-3", Tier::Standard, "idraulico", vec![("Manodopera idraulica", 120.0, 20.0, 144.0)]),
            quote("P-4", Tier::Premium, "idraulico", vec![("Fornitura caldaia", 1450.0, 40.0, 2030.0)]),
            quote("P-5", Tier::Standard, "elettricista", vec![("Voce storica", 0.0, 0.0, 90.0)]),
        ]
    }

    #[test]
    fn below_threshold_builds_nothing() {
        let builder = LearningProfileBuilder::default();
        let quotes = history();
        assert!(builder.build("user-1", &quotes[..4], Utc::now()).is_none());
        assert!(builder.build("user-1", &quotes, Utc::now()).is_some());
    }

    #[test]
    fn regeneration_is_memoized_by_count() {
        let builder = LearningProfileBuilder::default();
        let quotes = history();
        let profile = builder.build("user-1", &quotes, Utc::now()).unwrap();

        assert!(!builder.should_regenerate(5, Some(&profile)));
        assert!(builder.should_regenerate(6, Some(&profile)));
        assert!(!builder.should_regenerate(4, None));
        assert!(builder.should_regenerate(5, None));
    }

    #[test]
    fn aggregates_margins_excluding_zero() {
        let builder = LearningProfileBuilder::default();
        let profile = builder.build("user-1", &history(), Utc::now()).unwrap();

        // (30 + 30 + 20 + 40) / 4: the zero-margin legacy item is excluded.
        assert_eq!(profile.profile.margine_medio, 30.0);
        assert_eq!(profile.based_on_count, 5);
    }

    #[test]
    fn recurring_items_count_case_insensitively() {
        let builder = LearningProfileBuilder::default();
        let mut quotes = history();
        quotes.push(quote(
            "P-6",
            Tier::Standard,
            "idraulico",
            vec![("MANODOPERA IDRAULICA", 100.0, 30.0, 130.0)],
        ));

        let profile = builder.build("user-1", &quotes, Utc::now()).unwrap();
        let top = &profile.profile.voci_ricorrenti[0];
        assert_eq!(top.description, "Manodopera idraulica");
        assert_eq!(top.frequenza, 4);
        assert_eq!(top.costo_medio, Some(105.0));
    }

    #[test]
    fn tier_averages_and_preferences() {
        let builder = LearningProfileBuilder::default();
        let profile = builder.build("user-1", &history(), Utc::now()).unwrap();

        assert_eq!(profile.profile.preferred_tier, Tier::Standard);
        assert_eq!(profile.profile.prezzi_medi.get("premium"), Some(&2030.0));
        assert_eq!(profile.profile.main_category.as_deref(), Some("idraulico"));
    }

    #[test]
    fn context_prompt_reflects_the_statistics() {
        let builder = LearningProfileBuilder::default();
        let profile = builder.build("user-1", &history(), Utc::now()).unwrap();

        assert!(profile.context_prompt.contains("5 preventivi"));
        assert!(profile.context_prompt.contains("Categoria principale: idraulico."));
        assert!(profile.context_prompt.contains("Margine medio applicato: 30%."));
        assert!(profile.context_prompt.contains("Fascia preferita: standard."));
    }

    #[test]
    fn builds_identical_profiles_for_identical_history() {
        let builder = LearningProfileBuilder::default();
        let now = Utc::now();
        let first = builder.build("user-1", &history(), now).unwrap();
        let second = builder.build("user-1", &history(), now).unwrap();
        assert_eq!(first, second);
    }
}
