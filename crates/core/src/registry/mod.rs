//! Static category registry: profession resolution, per-category item
//! templates and the tier policy table.
//!
//! Craft trades index their templates by free-text keywords; knowledge
//! professions index by an explicit job-type selector with a mandatory
//! default. The distinction is an invariant: knowledge categories are never
//! matched against description text, because their terminology carries
//! legal and contractual weight.

mod data;

use serde::{Deserialize, Serialize};

use crate::domain::quote::Tier;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateItem {
    pub description: &'static str,
    pub quantity: u32,
    pub base_cost: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeywordGroup {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub items: &'static [TemplateItem],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JobTypeEntry {
    pub job_type: &'static str,
    pub items: &'static [TemplateItem],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CategoryKind {
    Craft { keyword_groups: &'static [KeywordGroup] },
    Knowledge { job_types: &'static [JobTypeEntry] },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryDef {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: CategoryKind,
    pub default_items: &'static [TemplateItem],
}

impl CategoryDef {
    pub fn is_knowledge(&self) -> bool {
        matches!(self.kind, CategoryKind::Knowledge { .. })
    }
}

/// Cost multiplier and default margin for a price tier. Applied to every
/// template-sourced item before pricing, so one template set serves all
/// three tiers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    pub multiplier: f64,
    pub default_margin: f64,
}

pub fn tier_policy(tier: Tier) -> TierPolicy {
    match tier {
        Tier::Economy => TierPolicy { multiplier: 0.85, default_margin: 20.0 },
        Tier::Standard => TierPolicy { multiplier: 1.0, default_margin: 30.0 },
        Tier::Premium => TierPolicy { multiplier: 1.25, default_margin: 40.0 },
    }
}

pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryRegistry;

impl CategoryRegistry {
    pub fn builtin() -> Self {
        Self
    }

    pub fn category(&self, id: &str) -> Option<&'static CategoryDef> {
        let id = normalize(id);
        data::CATEGORIES.iter().find(|category| category.id == id)
    }

    pub fn categories(&self) -> &'static [CategoryDef] {
        data::CATEGORIES
    }

    pub fn banned_terms(&self) -> &'static [&'static str] {
        data::BANNED_CRAFT_TERMS
    }

    fn resolve_one(&self, value: &str) -> Option<&'static CategoryDef> {
        let normalized = normalize(value);
        if normalized.is_empty() {
            return None;
        }
        if let Some(category) = self.category(&normalized) {
            return Some(category);
        }
        data::PROFESSION_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .and_then(|(_, id)| self.category(id))
    }

    /// Explicit profession wins over the professional's stored category.
    /// Unresolvable input yields `None`, which downstream turns into the
    /// generic template fallback.
    pub fn resolve_category(
        &self,
        explicit_profession: Option<&str>,
        profile_category: Option<&str>,
    ) -> Option<&'static CategoryDef> {
        explicit_profession
            .and_then(|value| self.resolve_one(value))
            .or_else(|| profile_category.and_then(|value| self.resolve_one(value)))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::quote::Tier;

    use super::{tier_policy, CategoryKind, CategoryRegistry};

    #[test]
    fn resolves_aliases_and_ids() {
        let registry = CategoryRegistry::builtin();
        assert_eq!(registry.resolve_category(Some("Termoidraulico"), None).unwrap().id, "idraulico");
        assert_eq!(registry.resolve_category(Some("idraulico"), None).unwrap().id, "idraulico");
        assert_eq!(registry.resolve_category(Some("Studio Legale"), None).unwrap().id, "avvocato");
    }

    #[test]
    fn explicit_profession_beats_profile_category() {
        let registry = CategoryRegistry::builtin();
        let resolved = registry.resolve_category(Some("elettricista"), Some("idraulico")).unwrap();
        assert_eq!(resolved.id, "elettricista");
    }

    #[test]
    fn falls_back_to_profile_category() {
        let registry = CategoryRegistry::builtin();
        let resolved = registry.resolve_category(Some("sciamano"), Some("muratore")).unwrap();
        assert_eq!(resolved.id, "muratore");
        assert!(registry.resolve_category(Some("sciamano"), Some("druido")).is_none());
    }

    #[test]
    fn knowledge_categories_have_no_keyword_index() {
        let registry = CategoryRegistry::builtin();
        for category in registry.categories() {
            if category.is_knowledge() {
                assert!(matches!(category.kind, CategoryKind::Knowledge { .. }));
                assert!(
                    !category.default_items.is_empty(),
                    "{} needs a default job-type entry",
                    category.id
                );
            }
        }
    }

    #[test]
    fn tier_policy_orders_multipliers() {
        assert!(tier_policy(Tier::Economy).multiplier < tier_policy(Tier::Standard).multiplier);
        assert!(tier_policy(Tier::Standard).multiplier < tier_policy(Tier::Premium).multiplier);
        assert_eq!(tier_policy(Tier::Standard).multiplier, 1.0);
    }

    #[test]
    fn banned_terms_are_lowercase() {
        for term in CategoryRegistry::builtin().banned_terms() {
            assert_eq!(*term, term.to_lowercase());
        }
    }
}
