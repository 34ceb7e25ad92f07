//! Suggestion reconciliation: turns an unreliable AI estimate (or none at
//! all) into a numerically consistent, category-appropriate priced quote.
//!
//! Flow: an explicit price list short-circuits straight to pricing; an AI
//! attempt is validated by the guardrail and replaced wholesale by the
//! template fallback when it fails; the template path is trusted by
//! construction. Every path terminates in a valid, fully priced quote.

mod cache;

pub use cache::{CachedAiContext, PreviewCache, DEFAULT_PREVIEW_TTL};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::quote::{QuoteId, QuotePricing, Tier};
use crate::domain::suggestion::{AiSnapshot, Confidence, EnrichedLineItem, SuggestionResponse};
use crate::errors::DomainError;
use crate::feedback::{FeedbackEntry, UserFinal};
use crate::guardrail::GuardrailValidator;
use crate::pricing::{PricingEngine, RawAmounts, RawLineItem};
use crate::registry::{normalize, tier_policy, CategoryRegistry};
use crate::templates::TemplateSelector;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SuggestionError {
    #[error("suggestion source timed out")]
    Timeout,
    #[error("suggestion source returned a malformed response: {0}")]
    Malformed(String),
    #[error("suggestion source unavailable: {0}")]
    Unavailable(String),
}

/// What the reconciler sends to the suggestion source. The context prompt
/// comes verbatim from the professional's learning profile, when present.
#[derive(Clone, Debug, PartialEq)]
pub struct SuggestionRequest {
    pub job_description: String,
    pub category_id: Option<String>,
    pub tier: Tier,
    pub context_prompt: Option<String>,
}

/// The external, untrusted estimate source. Implementations own their
/// timeout; the reconciler treats any error as a signal to fall back.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn generate_suggestions(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, SuggestionError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileRequest {
    pub session_id: String,
    pub job_description: String,
    pub profession: Option<String>,
    pub profile_category: Option<String>,
    pub tier: Tier,
    pub job_type: Option<String>,
    pub price_list: Option<Vec<RawLineItem>>,
    pub context_prompt: Option<String>,
}

/// Client-visible preview line: price structure only, never raw cost or
/// margin, so the margin layout cannot leak before confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
    pub confidence: Option<Confidence>,
    pub explanation: Option<String>,
    pub needs_input: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuotePreview {
    pub items: Vec<PreviewItem>,
    pub subtotal: f64,
    pub taxes: f64,
    pub total: f64,
    pub payment_terms: Option<String>,
    pub validity_days: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub ai_generated: bool,
    pub category: Option<String>,
    pub preview: QuotePreview,
}

/// A row as submitted back by the client after possibly editing the
/// preview's unit prices or adding rows of its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmittedItem {
    pub description: String,
    pub quantity: Option<f64>,
    pub unit_price: f64,
}

/// The priced result of confirming a preview. `ai_matches` runs parallel to
/// `pricing.line_items`: `Some` where the row matched a cached AI suggestion,
/// `None` for rows the user added by hand or the templates produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatedQuote {
    pub pricing: QuotePricing,
    pub ai_matches: Vec<Option<AiSnapshot>>,
}

impl CreatedQuote {
    /// One feedback entry per AI-originated line, pairing the frozen
    /// snapshot with the user's final numbers. Lines without AI provenance
    /// produce no entry.
    pub fn feedback_entries(
        &self,
        quote_id: &QuoteId,
        recorded_at: DateTime<Utc>,
    ) -> Vec<FeedbackEntry> {
        self.pricing
            .line_items
            .iter()
            .zip(&self.ai_matches)
            .filter_map(|(line, snapshot)| {
                snapshot.as_ref().map(|ai_suggested| FeedbackEntry {
                    quote_id: quote_id.clone(),
                    item_description: line.description.clone(),
                    ai_suggested: ai_suggested.clone(),
                    user_final: UserFinal {
                        unit_cost: line.unit_cost,
                        margin_percent: line.margin_percent,
                        unit_price: line.unit_price,
                    },
                    outcome: None,
                    recorded_at,
                    outcome_at: None,
                })
            })
            .collect()
    }
}

pub struct SuggestionReconciler<S> {
    pricing: PricingEngine,
    registry: CategoryRegistry,
    guardrail: GuardrailValidator,
    templates: TemplateSelector,
    cache: Arc<PreviewCache>,
    source: Option<S>,
}

impl<S> SuggestionReconciler<S>
where
    S: SuggestionSource,
{
    pub fn new(
        pricing: PricingEngine,
        registry: CategoryRegistry,
        cache: Arc<PreviewCache>,
        source: Option<S>,
    ) -> Self {
        Self {
            pricing,
            registry,
            guardrail: GuardrailValidator::new(registry),
            templates: TemplateSelector::new(registry),
            cache,
            source,
        }
    }

    /// Price a job. May consult the suggestion source; always returns a
    /// fully priced preview. External-source failures and guardrail
    /// rejections are recovered locally and never surface to the caller.
    pub async fn reconcile(
        &self,
        request: &ReconcileRequest,
    ) -> Result<ReconcileOutcome, DomainError> {
        // An explicit price list is authoritative: no AI, no guardrail.
        if let Some(price_list) = &request.price_list {
            if price_list.is_empty() {
                return Err(DomainError::EmptyLineItems);
            }
            let pricing = self.pricing.process_quote(price_list);
            return Ok(ReconcileOutcome {
                ai_generated: false,
                category: self.resolved_category_id(request),
                preview: Self::plain_preview(pricing, None),
            });
        }

        let category =
            self.registry.resolve_category(request.profession.as_deref(), request.profile_category.as_deref());

        if let Some(source) = &self.source {
            let suggestion_request = SuggestionRequest {
                job_description: request.job_description.clone(),
                category_id: category.map(|c| c.id.to_string()),
                tier: request.tier,
                context_prompt: request.context_prompt.clone(),
            };

            match source.generate_suggestions(&suggestion_request).await {
                Ok(response) => {
                    if let Some(outcome) = self.try_ai_path(request, category, response) {
                        return Ok(outcome);
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "suggestion source failed, using template fallback");
                }
            }
        }

        Ok(self.template_fallback(request, category))
    }

    /// AI output survives only if something remains after the explanation
    /// filter and the guardrail accepts it. Rejection discards the whole
    /// set: incoherence is corrected by substitution, not patching.
    fn try_ai_path(
        &self,
        request: &ReconcileRequest,
        category: Option<&'static crate::registry::CategoryDef>,
        response: SuggestionResponse,
    ) -> Option<ReconcileOutcome> {
        let trusted: Vec<_> =
            response.suggestions.into_iter().filter(|s| s.has_explanation()).collect();
        if trusted.is_empty() {
            tracing::warn!("no AI suggestion carried an explanation, using template fallback");
            return None;
        }

        let enriched = self.pricing.process_ai_suggestions(&trusted);
        let enriched = match category {
            Some(category) => {
                let report = self.guardrail.validate_items(category, enriched);
                if !report.valid {
                    tracing::warn!(
                        category = category.id,
                        rejected = report.rejected.len(),
                        "guardrail rejected AI suggestions, using template fallback"
                    );
                    return None;
                }
                report.items
            }
            None => {
                if enriched.is_empty() {
                    return None;
                }
                enriched
            }
        };

        let raw: Vec<RawLineItem> = enriched.iter().map(|e| RawLineItem::from(&e.item)).collect();
        let pricing = self.pricing.process_quote(&raw);

        let items = pricing
            .line_items
            .iter()
            .zip(enriched.iter())
            .map(|(line, source)| PreviewItem {
                description: line.description.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
                confidence: Some(source.confidence),
                explanation: Some(source.explanation.clone()),
                needs_input: source.needs_input,
            })
            .collect();

        self.cache.put(&request.session_id, CachedAiContext { items: enriched });

        Some(ReconcileOutcome {
            ai_generated: true,
            category: category.map(|c| c.id.to_string()),
            preview: QuotePreview {
                items,
                subtotal: pricing.subtotal,
                taxes: pricing.taxes,
                total: pricing.total,
                payment_terms: response.payment_terms,
                validity_days: response.validity_days,
                notes: response.notes,
            },
        })
    }

    /// Templates are trusted by construction: no guardrail re-check.
    fn template_fallback(
        &self,
        request: &ReconcileRequest,
        category: Option<&'static crate::registry::CategoryDef>,
    ) -> ReconcileOutcome {
        let selected = self.templates.select_template(
            category,
            &request.job_description,
            request.job_type.as_deref(),
            request.tier,
        );

        let raw: Vec<RawLineItem> = selected
            .iter()
            .map(|item| RawLineItem {
                description: item.description.clone(),
                quantity: Some(f64::from(item.quantity)),
                amounts: RawAmounts::CostMargin {
                    unit_cost: item.unit_cost,
                    margin_percent: item.margin_percent,
                },
            })
            .collect();
        let pricing = self.pricing.process_quote(&raw);

        ReconcileOutcome {
            ai_generated: false,
            category: category.map(|c| c.id.to_string()),
            preview: Self::plain_preview(pricing, None),
        }
    }

    /// Enrichment at quote-creation time: every persisted item must carry a
    /// consistent cost/margin/price triangle, including rows the AI never
    /// saw. Cached AI cost wins where descriptions match; otherwise cost is
    /// inferred by inverting the tier default margin against the final price.
    /// The matched snapshots travel with the result so the caller can write
    /// feedback entries once the quote id exists.
    pub fn create_from_preview(
        &self,
        session_id: &str,
        tier: Tier,
        items: &[SubmittedItem],
    ) -> Result<CreatedQuote, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyLineItems);
        }

        let cached = self.cache.take(session_id);
        let cached_items: &[EnrichedLineItem] =
            cached.as_ref().map(|c| c.items.as_slice()).unwrap_or(&[]);
        let default_margin = tier_policy(tier).default_margin;

        let mut ai_matches = Vec::with_capacity(items.len());
        let raw: Vec<RawLineItem> = items
            .iter()
            .map(|submitted| {
                let key = normalize(&submitted.description);
                let matched = cached_items
                    .iter()
                    .find(|candidate| normalize(&candidate.item.description) == key);
                ai_matches.push(matched.map(|candidate| candidate.ai_suggested.clone()));
                let amounts = match matched {
                    Some(candidate) => RawAmounts::CostPrice {
                        unit_cost: candidate.ai_suggested.unit_cost,
                        unit_price: submitted.unit_price,
                    },
                    None => RawAmounts::CostPrice {
                        unit_cost: self.pricing.infer_cost(submitted.unit_price, default_margin),
                        unit_price: submitted.unit_price,
                    },
                };
                RawLineItem {
                    description: submitted.description.clone(),
                    quantity: submitted.quantity,
                    amounts,
                }
            })
            .collect();

        Ok(CreatedQuote { pricing: self.pricing.process_quote(&raw), ai_matches })
    }

    fn resolved_category_id(&self, request: &ReconcileRequest) -> Option<String> {
        self.registry
            .resolve_category(request.profession.as_deref(), request.profile_category.as_deref())
            .map(|c| c.id.to_string())
    }

    fn plain_preview(pricing: QuotePricing, notes: Option<String>) -> QuotePreview {
        QuotePreview {
            items: pricing
                .line_items
                .iter()
                .map(|line| PreviewItem {
                    description: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                    confidence: None,
                    explanation: None,
                    needs_input: false,
                })
                .collect(),
            subtotal: pricing.subtotal,
            taxes: pricing.taxes,
            total: pricing.total,
            payment_terms: None,
            validity_days: None,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::domain::quote::{QuoteId, Tier};
    use crate::domain::suggestion::{AiSuggestion, Confidence, SuggestionResponse};
    use crate::errors::DomainError;
    use crate::pricing::{PricingEngine, RawAmounts, RawLineItem};
    use crate::registry::CategoryRegistry;

    use super::{
        PreviewCache, ReconcileRequest, SubmittedItem, SuggestionError, SuggestionReconciler,
        SuggestionRequest, SuggestionSource,
    };

    struct StubSource {
        response: Result<SuggestionResponse, SuggestionError>,
    }

    #[async_trait]
    impl SuggestionSource for StubSource {
        async fn generate_suggestions(
            &self,
            _request: &SuggestionRequest,
        ) -> Result<SuggestionResponse, SuggestionError> {
            self.response.clone()
        }
    }

    fn reconciler(source: Option<StubSource>) -> SuggestionReconciler<StubSource> {
        SuggestionReconciler::new(
            PricingEngine::default(),
            CategoryRegistry::builtin(),
            Arc::new(PreviewCache::default()),
            source,
        )
    }

    fn request(session: &str) -> ReconcileRequest {
        ReconcileRequest {
            session_id: session.to_string(),
            job_description: "Rifacimento bagno 8mq".to_string(),
            profession: Some("idraulico".to_string()),
            profile_category: None,
            tier: Tier::Standard,
            job_type: None,
            price_list: None,
            context_prompt: None,
        }
    }

    fn suggestion(description: &str, explanation: &str) -> AiSuggestion {
        AiSuggestion {
            description: description.to_string(),
            quantity: Some(1.0),
            suggested_unit_cost: 200.0,
            suggested_margin_percent: 30.0,
            confidence: Confidence::High,
            explanation: explanation.to_string(),
            needs_input: false,
        }
    }

    #[tokio::test]
    async fn price_list_short_circuits_without_ai() {
        let source = StubSource {
            response: Err(SuggestionError::Unavailable("must not be called".to_string())),
        };
        let reconciler = reconciler(Some(source));

        let mut req = request("sess-1");
        req.price_list = Some(vec![RawLineItem {
            description: "Tariffa oraria".to_string(),
            quantity: Some(4.0),
            amounts: RawAmounts::CostMargin { unit_cost: 40.0, margin_percent: 50.0 },
        }]);

        let outcome = reconciler.reconcile(&req).await.expect("reconcile");
        assert!(!outcome.ai_generated);
        assert_eq!(outcome.preview.items[0].unit_price, 60.0);
        assert_eq!(outcome.preview.subtotal, 240.0);
    }

    #[tokio::test]
    async fn empty_price_list_is_a_structural_failure() {
        let reconciler = reconciler(None);
        let mut req = request("sess-1");
        req.price_list = Some(Vec::new());

        let error = reconciler.reconcile(&req).await.expect_err("should reject");
        assert_eq!(error, DomainError::EmptyLineItems);
    }

    #[tokio::test]
    async fn accepted_ai_output_is_priced_and_cached() {
        let source = StubSource {
            response: Ok(SuggestionResponse {
                suggestions: vec![
                    suggestion("Sostituzione sanitari", "prezzo medio zona"),
                    suggestion("Rifacimento impianto idrico", "superficie 8mq"),
                ],
                payment_terms: Some("30 giorni".to_string()),
                validity_days: Some(30),
                notes: None,
            }),
        };
        let reconciler = reconciler(Some(source));

        let outcome = reconciler.reconcile(&request("sess-ai")).await.expect("reconcile");
        assert!(outcome.ai_generated);
        assert_eq!(outcome.category.as_deref(), Some("idraulico"));
        assert_eq!(outcome.preview.items.len(), 2);
        assert_eq!(outcome.preview.items[0].confidence, Some(Confidence::High));
        assert_eq!(outcome.preview.payment_terms.as_deref(), Some("30 giorni"));

        // Cost/margin context went to the cache, not the preview.
        let created = reconciler
            .create_from_preview(
                "sess-ai",
                Tier::Standard,
                &[SubmittedItem {
                    description: "Sostituzione sanitari".to_string(),
                    quantity: Some(1.0),
                    unit_price: 250.0,
                }],
            )
            .expect("create");
        assert_eq!(created.pricing.line_items[0].unit_cost, 200.0);
        assert_eq!(created.pricing.line_items[0].margin_percent, 25.0);
    }

    #[tokio::test]
    async fn edited_ai_lines_keep_their_snapshot_for_feedback() {
        let source = StubSource {
            response: Ok(SuggestionResponse {
                suggestions: vec![suggestion("Sostituzione sanitari", "prezzo medio zona")],
                ..SuggestionResponse::default()
            }),
        };
        let reconciler = reconciler(Some(source));
        reconciler.reconcile(&request("sess-fb")).await.expect("reconcile");

        // The user edits the AI price (260 -> 250) and adds a manual row.
        let created = reconciler
            .create_from_preview(
                "sess-fb",
                Tier::Standard,
                &[
                    SubmittedItem {
                        description: "Sostituzione sanitari".to_string(),
                        quantity: Some(1.0),
                        unit_price: 250.0,
                    },
                    SubmittedItem {
                        description: "Voce aggiunta a mano".to_string(),
                        quantity: Some(1.0),
                        unit_price: 130.0,
                    },
                ],
            )
            .expect("create");

        assert!(created.ai_matches[0].is_some());
        assert!(created.ai_matches[1].is_none());

        let entries =
            created.feedback_entries(&QuoteId("PREV-0001".to_string()), Utc::now());
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.ai_suggested.unit_cost, 200.0);
        assert_eq!(entry.ai_suggested.margin_percent, 30.0);
        assert_eq!(entry.user_final.unit_price, 250.0);
        assert_eq!(entry.user_final.margin_percent, 25.0);
        assert!(!entry.is_exact_match());
    }

    #[tokio::test]
    async fn source_failure_falls_back_to_templates() {
        let source = StubSource { response: Err(SuggestionError::Timeout) };
        let reconciler = reconciler(Some(source));

        let outcome = reconciler.reconcile(&request("sess-1")).await.expect("reconcile");
        assert!(!outcome.ai_generated);
        assert_eq!(outcome.preview.items[0].description, "Manodopera idraulico");
        assert!(outcome.preview.items.iter().any(|i| i.description.contains("sanitari")));
    }

    #[tokio::test]
    async fn suggestions_without_explanation_are_discarded() {
        let source = StubSource {
            response: Ok(SuggestionResponse {
                suggestions: vec![suggestion("Voce qualsiasi", "  ")],
                ..SuggestionResponse::default()
            }),
        };
        let reconciler = reconciler(Some(source));

        let outcome = reconciler.reconcile(&request("sess-1")).await.expect("reconcile");
        assert!(!outcome.ai_generated);
    }

    #[tokio::test]
    async fn guardrail_rejection_substitutes_templates_wholesale() {
        let source = StubSource {
            response: Ok(SuggestionResponse {
                suggestions: vec![
                    suggestion("Manodopera specializzata", "ore uomo"),
                    suggestion("Trasporto materiali in cantiere", "mezzi"),
                    suggestion("Analisi preliminare", "inquadramento"),
                ],
                ..SuggestionResponse::default()
            }),
        };
        let reconciler = reconciler(Some(source));

        let mut req = request("sess-1");
        req.profession = Some("consulente".to_string());
        req.job_type = Some("consulenza strategica".to_string());

        let outcome = reconciler.reconcile(&req).await.expect("reconcile");
        assert!(!outcome.ai_generated);
        assert_eq!(outcome.category.as_deref(), Some("consulenti"));
        // None of the rejected AI lines survive; the template set replaces them.
        assert!(outcome.preview.items.iter().all(|i| i.description != "Analisi preliminare"));
        assert!(outcome.preview.items.iter().any(|i| i.description.contains("roadmap")));
    }

    #[tokio::test]
    async fn no_source_goes_straight_to_templates() {
        let reconciler = reconciler(None);
        let mut req = request("sess-1");
        req.profession = Some("professione ignota".to_string());

        let outcome = reconciler.reconcile(&req).await.expect("reconcile");
        assert!(!outcome.ai_generated);
        assert!(outcome.category.is_none());
        assert_eq!(outcome.preview.items.len(), 3);
        assert!(outcome.preview.items[0].description.starts_with("Manodopera e lavorazione"));
    }

    #[tokio::test]
    async fn manually_added_rows_get_cost_inferred_from_default_margin() {
        let reconciler = reconciler(None);

        let created = reconciler
            .create_from_preview(
                "sess-none",
                Tier::Standard,
                &[SubmittedItem {
                    description: "Voce aggiunta a mano".to_string(),
                    quantity: Some(1.0),
                    unit_price: 130.0,
                }],
            )
            .expect("create");

        let line = &created.pricing.line_items[0];
        assert_eq!(line.unit_cost, 100.0);
        assert_eq!(line.margin_percent, 30.0);
        assert_eq!(line.unit_price, 130.0);
        assert_eq!(created.ai_matches, vec![None]);
    }

    #[tokio::test]
    async fn create_from_preview_rejects_empty_submission() {
        let reconciler = reconciler(None);
        let error = reconciler
            .create_from_preview("sess-1", Tier::Standard, &[])
            .expect_err("empty submission");
        assert_eq!(error, DomainError::EmptyLineItems);
    }
}
