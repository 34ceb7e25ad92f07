pub mod config;
pub mod domain;
pub mod errors;
pub mod feedback;
pub mod guardrail;
pub mod learning;
pub mod pricing;
pub mod reconciler;
pub mod registry;
pub mod templates;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::fiscal::{FiscalProfile, FiscalTotals};
pub use domain::quote::{LineItem, Quote, QuoteId, QuotePricing, QuoteStatus, Tier};
pub use domain::suggestion::{
    AiSnapshot, AiSuggestion, Confidence, EnrichedLineItem, SuggestionResponse,
};
pub use errors::DomainError;
pub use feedback::{compute_kpi, FeedbackEntry, FeedbackKpi, Outcome, UserFinal};
pub use guardrail::{GuardrailReport, GuardrailValidator};
pub use learning::{LearningProfile, LearningProfileBuilder, ProfileStats, RecurringItem};
pub use pricing::{round2, PricingEngine, PricingPolicy, RawAmounts, RawLineItem};
pub use reconciler::{
    CachedAiContext, CreatedQuote, PreviewCache, QuotePreview, ReconcileOutcome,
    ReconcileRequest, SubmittedItem, SuggestionError, SuggestionReconciler, SuggestionRequest,
    SuggestionSource,
};
pub use registry::{CategoryDef, CategoryKind, CategoryRegistry, TierPolicy};
pub use templates::{SelectedItem, TemplateSelector};
