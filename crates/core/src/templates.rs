//! Deterministic template fallback: produces a category-appropriate item
//! list when the AI is unavailable or its output was rejected.

use serde::{Deserialize, Serialize};

use crate::domain::quote::Tier;
use crate::pricing::round2;
use crate::registry::{normalize, tier_policy, CategoryDef, CategoryKind, CategoryRegistry, TemplateItem};

/// Template output is capped before pricing.
pub const MAX_TEMPLATE_ITEMS: usize = 6;

const GENERIC_LABOR_COST: f64 = 250.0;

/// A template-sourced item with the tier multiplier already applied to its
/// base cost and the tier default margin attached. Ready for pricing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub description: String,
    pub quantity: u32,
    pub unit_cost: f64,
    pub margin_percent: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateSelector {
    registry: CategoryRegistry,
}

impl TemplateSelector {
    pub fn new(registry: CategoryRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Select the fallback items for a job.
    ///
    /// Knowledge professions match only on the explicit job-type selector
    /// (exact, then bidirectional substring, then the category default).
    /// Craft trades match keyword groups against the free job description.
    /// An unresolved category synthesizes a generic three-line quote.
    pub fn select_template(
        &self,
        category: Option<&CategoryDef>,
        job_description: &str,
        job_type: Option<&str>,
        tier: Tier,
    ) -> Vec<SelectedItem> {
        let base = match category {
            Some(category) => match category.kind {
                CategoryKind::Knowledge { job_types } => {
                    Self::knowledge_items(category, job_types, job_type)
                }
                CategoryKind::Craft { keyword_groups } => {
                    Self::craft_items(category, keyword_groups, job_description)
                }
            },
            None => Self::generic_items(job_description),
        };

        let policy = tier_policy(tier);
        base.into_iter()
            .take(MAX_TEMPLATE_ITEMS)
            .map(|(description, quantity, base_cost)| SelectedItem {
                description,
                quantity,
                unit_cost: round2(base_cost * policy.multiplier),
                margin_percent: policy.default_margin,
            })
            .collect()
    }

    fn knowledge_items(
        category: &CategoryDef,
        job_types: &'static [crate::registry::JobTypeEntry],
        job_type: Option<&str>,
    ) -> Vec<(String, u32, f64)> {
        let selector = job_type.map(normalize).unwrap_or_default();

        let matched = if selector.is_empty() {
            None
        } else {
            job_types
                .iter()
                .find(|entry| entry.job_type == selector)
                .or_else(|| {
                    job_types.iter().find(|entry| {
                        entry.job_type.contains(&selector) || selector.contains(entry.job_type)
                    })
                })
                .map(|entry| entry.items)
        };

        Self::owned(matched.unwrap_or(category.default_items))
    }

    fn craft_items(
        category: &CategoryDef,
        keyword_groups: &'static [crate::registry::KeywordGroup],
        job_description: &str,
    ) -> Vec<(String, u32, f64)> {
        let text = normalize(job_description);
        let mut merged: Vec<(String, u32, f64)> = Vec::new();

        for group in keyword_groups {
            if group.keywords.iter().any(|keyword| text.contains(keyword)) {
                for item in group.items {
                    if !merged.iter().any(|(description, _, _)| description == item.description) {
                        merged.push((item.description.to_string(), item.quantity, item.base_cost));
                    }
                }
            }
        }

        if merged.is_empty() {
            return Self::owned(category.default_items);
        }

        let has_labor =
            merged.iter().any(|(description, _, _)| description.to_lowercase().contains("manodopera"));
        if !has_labor && merged.len() <= 5 {
            merged.insert(
                0,
                (format!("Manodopera {}", category.label.to_lowercase()), 1, GENERIC_LABOR_COST),
            );
        }

        merged
    }

    /// Last resort when no category resolved: labor, materials and transport
    /// seeded from the first few long words of the description.
    fn generic_items(job_description: &str) -> Vec<(String, u32, f64)> {
        let hint: Vec<&str> = job_description
            .split_whitespace()
            .filter(|word| word.chars().count() >= 5)
            .take(3)
            .collect();
        let labor = if hint.is_empty() {
            "Manodopera e lavorazione".to_string()
        } else {
            format!("Manodopera e lavorazione: {}", hint.join(" "))
        };

        vec![
            (labor, 1, 350.0),
            ("Materiali e forniture".to_string(), 1, 200.0),
            ("Trasporto e logistica".to_string(), 1, 80.0),
        ]
    }

    fn owned(items: &'static [TemplateItem]) -> Vec<(String, u32, f64)> {
        items.iter().map(|item| (item.description.to_string(), item.quantity, item.base_cost)).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::quote::Tier;
    use crate::registry::CategoryRegistry;

    use super::{TemplateSelector, MAX_TEMPLATE_ITEMS};

    fn selector() -> TemplateSelector {
        TemplateSelector::new(CategoryRegistry::builtin())
    }

    #[test]
    fn knowledge_selection_is_deterministic() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("consulenti");

        let first = selector().select_template(
            category,
            "qualunque testo libero",
            Some("contenzioso civile"),
            Tier::Standard,
        );
        let second =
            selector().select_template(category, "altro testo", Some("contenzioso civile"), Tier::Standard);

        assert_eq!(first, second);
        assert!(first.iter().any(|item| item.description.contains("memorie")));
    }

    #[test]
    fn knowledge_matches_job_type_by_substring_both_ways() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("avvocato");

        let partial = selector().select_template(category, "", Some("contenzioso"), Tier::Standard);
        assert!(partial.iter().any(|item| item.description.contains("atto introduttivo")));

        let longer = selector().select_template(
            category,
            "",
            Some("contenzioso tributario urgente"),
            Tier::Standard,
        );
        assert!(longer.iter().any(|item| item.description.contains("atto introduttivo")));
    }

    #[test]
    fn knowledge_unknown_job_type_uses_default_never_keywords() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("consulenti");

        // Description full of craft keywords must not influence selection.
        let items = selector().select_template(
            category,
            "rifacimento bagno con caldaia e cartongesso",
            Some("pratica sconosciuta"),
            Tier::Standard,
        );
        assert!(items.iter().any(|item| item.description.contains("consulenza dedicata")));
    }

    #[test]
    fn craft_keyword_match_prepends_labor_line() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("idraulico");

        let items =
            selector().select_template(category, "Rifacimento bagno 8mq", None, Tier::Standard);

        assert_eq!(items[0].description, "Manodopera idraulico");
        assert!(items.iter().any(|item| item.description.contains("sanitari")));
        assert_eq!(items[0].margin_percent, 30.0);
    }

    #[test]
    fn craft_union_of_matching_groups_is_capped() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("idraulico");

        let items = selector().select_template(
            category,
            "perdita in bagno e sostituzione caldaia",
            None,
            Tier::Standard,
        );
        assert!(items.len() <= MAX_TEMPLATE_ITEMS);
    }

    #[test]
    fn craft_without_keyword_match_uses_defaults() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("elettricista");

        let items = selector().select_template(category, "lavoro generico", None, Tier::Standard);
        assert!(items.iter().any(|item| item.description.contains("Manodopera elettricista")));
    }

    #[test]
    fn unresolved_category_synthesizes_generic_quote() {
        let items = selector().select_template(
            None,
            "Sistemazione giardino condominiale con potatura",
            None,
            Tier::Standard,
        );

        assert_eq!(items.len(), 3);
        assert!(items[0].description.starts_with("Manodopera e lavorazione: Sistemazione"));
        assert!(items.iter().any(|item| item.description.contains("Trasporto")));
    }

    #[test]
    fn tier_scales_cost_and_margin() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("imbianchino");

        let economy = selector().select_template(category, "", None, Tier::Economy);
        let premium = selector().select_template(category, "", None, Tier::Premium);

        assert!(economy[0].unit_cost < premium[0].unit_cost);
        assert_eq!(economy[0].margin_percent, 20.0);
        assert_eq!(premium[0].margin_percent, 40.0);
    }
}
