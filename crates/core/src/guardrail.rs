//! Content guardrail for AI-generated line items.
//!
//! Knowledge-profession quotes must never contain craft vocabulary
//! (labor/materials/transport/disposal jargon). Craft categories bypass the
//! filter entirely: there is no banned-term concept for them.

use crate::domain::suggestion::EnrichedLineItem;
use crate::registry::{CategoryDef, CategoryRegistry};

/// Below this many surviving items the whole candidate set is rejected and
/// the caller regenerates from templates instead of submitting an
/// under-specified quote.
pub const MIN_COHERENT_ITEMS: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct GuardrailReport {
    pub valid: bool,
    pub items: Vec<EnrichedLineItem>,
    pub rejected: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GuardrailValidator {
    registry: CategoryRegistry,
}

impl GuardrailValidator {
    pub fn new(registry: CategoryRegistry) -> Self {
        Self { registry }
    }

    pub fn validate_items(
        &self,
        category: &CategoryDef,
        items: Vec<EnrichedLineItem>,
    ) -> GuardrailReport {
        if !category.is_knowledge() {
            return GuardrailReport { valid: !items.is_empty(), items, rejected: Vec::new() };
        }

        let banned = self.registry.banned_terms();
        let mut kept = Vec::with_capacity(items.len());
        let mut rejected = Vec::new();

        for item in items {
            let description = item.item.description.to_lowercase();
            if banned.iter().any(|term| description.contains(term)) {
                rejected.push(item.item.description.clone());
            } else {
                kept.push(item);
            }
        }

        let valid = kept.len() >= MIN_COHERENT_ITEMS;
        if !rejected.is_empty() {
            tracing::warn!(
                category = category.id,
                rejected = rejected.len(),
                kept = kept.len(),
                valid,
                "guardrail filtered craft vocabulary from knowledge-profession items"
            );
        }

        GuardrailReport { valid, items: kept, rejected }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::quote::LineItem;
    use crate::domain::suggestion::{AiSnapshot, Confidence, EnrichedLineItem};
    use crate::registry::CategoryRegistry;

    use super::GuardrailValidator;

    fn enriched(description: &str) -> EnrichedLineItem {
        EnrichedLineItem {
            item: LineItem {
                description: description.to_string(),
                quantity: 1,
                unit_cost: 100.0,
                margin_percent: 30.0,
                unit_price: 130.0,
                subtotal: 130.0,
            },
            confidence: Confidence::Medium,
            explanation: "stima".to_string(),
            needs_input: false,
            ai_suggested: AiSnapshot {
                unit_cost: 100.0,
                margin_percent: 30.0,
                confidence: Confidence::Medium,
            },
        }
    }

    fn validator() -> GuardrailValidator {
        GuardrailValidator::new(CategoryRegistry::builtin())
    }

    #[test]
    fn rejects_craft_vocabulary_for_knowledge_category() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("avvocato").unwrap();

        let report = validator().validate_items(
            category,
            vec![
                enriched("Redazione atto introduttivo"),
                enriched("Manodopera specializzata"),
                enriched("Partecipazione alle udienze"),
            ],
        );

        assert!(report.valid);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.rejected, vec!["Manodopera specializzata".to_string()]);
    }

    #[test]
    fn fewer_than_two_survivors_invalidates_the_set() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("consulenti").unwrap();

        let report = validator().validate_items(
            category,
            vec![
                enriched("Fornitura materiali di cantiere"),
                enriched("Trasporto attrezzature"),
                enriched("Analisi del contesto aziendale"),
            ],
        );

        assert!(!report.valid);
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.rejected.len(), 2);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("commercialista").unwrap();

        let report = validator().validate_items(category, vec![enriched("MANODOPERA edile")]);
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn craft_categories_bypass_the_filter() {
        let registry = CategoryRegistry::builtin();
        let category = registry.category("idraulico").unwrap();

        let report = validator().validate_items(
            category,
            vec![enriched("Manodopera idraulica"), enriched("Materiali di consumo")],
        );

        assert!(report.valid);
        assert_eq!(report.items.len(), 2);
        assert!(report.rejected.is_empty());
    }
}
