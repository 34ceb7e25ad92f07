use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::commands::CommandResult;
use preventivo_core::config::{AppConfig, LoadOptions};
use preventivo_core::domain::quote::{Quote, QuoteId, QuoteStatus, Tier};
use preventivo_core::domain::suggestion::{AiSuggestion, Confidence, SuggestionResponse};
use preventivo_core::feedback::{compute_kpi, Outcome};
use preventivo_core::learning::LearningProfileBuilder;
use preventivo_core::pricing::{PricingEngine, PricingPolicy};
use preventivo_core::reconciler::{
    PreviewCache, ReconcileRequest, SubmittedItem, SuggestionReconciler, SuggestionSource,
};
use preventivo_core::registry::CategoryRegistry;
use preventivo_db::repositories::{
    FeedbackRepository, InMemoryFeedbackRepository, InMemoryQuoteRepository, QuoteRepository,
};
use preventivo_db::{connect, migrations};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("pricing_consistency"));
            checks.push(skipped("quote_lifecycle"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("pricing_consistency"));
            checks.push(skipped("quote_lifecycle"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let db_started = Instant::now();
    let db_result = runtime.block_on(connect(&config.database));

    let pool = match db_result {
        Ok(pool) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Pass,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("connected using `{}`", config.database.url),
            });
            Some(pool)
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("failed to connect: {error}"),
            });
            None
        }
    };

    match pool {
        Some(pool) => {
            let migration_started = Instant::now();
            let migration_result =
                runtime.block_on(async { migrations::run_pending(&pool).await });
            runtime.block_on(async {
                pool.close().await;
            });
            match migration_result {
                Ok(()) => checks.push(SmokeCheck {
                    name: "migration_visibility",
                    status: SmokeStatus::Pass,
                    elapsed_ms: migration_started.elapsed().as_millis() as u64,
                    message: "migrations are visible and executable".to_string(),
                }),
                Err(error) => checks.push(SmokeCheck {
                    name: "migration_visibility",
                    status: SmokeStatus::Fail,
                    elapsed_ms: migration_started.elapsed().as_millis() as u64,
                    message: format!("migration execution failed: {error}"),
                }),
            }
        }
        None => checks.push(skipped("migration_visibility")),
    }

    checks.push(pricing_consistency_check(&config));

    let lifecycle_started = Instant::now();
    let lifecycle = runtime.block_on(quote_lifecycle_check(&config));
    checks.push(SmokeCheck {
        name: "quote_lifecycle",
        status: if lifecycle.is_ok() { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: lifecycle_started.elapsed().as_millis() as u64,
        message: match lifecycle {
            Ok(message) => message,
            Err(message) => message,
        },
    });

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

fn pricing_engine(config: &AppConfig) -> PricingEngine {
    PricingEngine::new(PricingPolicy {
        tax_rate: config.pricing.tax_rate,
        margin_ceiling: config.pricing.margin_ceiling,
    })
}

fn pricing_consistency_check(config: &AppConfig) -> SmokeCheck {
    let started = Instant::now();
    let engine = pricing_engine(config);

    let pair = engine.compute_price(100.0, 30.0);
    let back = engine.compute_margin(pair.unit_cost, pair.unit_price);
    let consistent = pair.unit_price == 130.0 && back.margin_percent == 30.0;

    SmokeCheck {
        name: "pricing_consistency",
        status: if consistent { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: started.elapsed().as_millis() as u64,
        message: if consistent {
            "cost/margin/price triangle is consistent".to_string()
        } else {
            format!(
                "expected 130.00 at 30%, got price {} margin {}",
                pair.unit_price, back.margin_percent
            )
        },
    }
}

// Deterministic stand-in for the LLM so the AI path runs without network.
struct CannedSource;

#[async_trait::async_trait]
impl SuggestionSource for CannedSource {
    async fn generate_suggestions(
        &self,
        _request: &preventivo_core::reconciler::SuggestionRequest,
    ) -> Result<SuggestionResponse, preventivo_core::reconciler::SuggestionError> {
        let suggestion = |description: &str, explanation: &str| AiSuggestion {
            description: description.to_string(),
            quantity: Some(1.0),
            suggested_unit_cost: 200.0,
            suggested_margin_percent: 30.0,
            confidence: Confidence::High,
            explanation: explanation.to_string(),
            needs_input: false,
        };
        Ok(SuggestionResponse {
            suggestions: vec![
                suggestion("Sostituzione sanitari", "prezzo medio zona"),
                suggestion("Rifacimento impianto idrico", "superficie 8mq"),
            ],
            ..SuggestionResponse::default()
        })
    }
}

/// Full in-memory pass over the quote lifecycle: AI reconcile, an edited
/// create, persist, feedback from the retained snapshots, outcome linking,
/// KPI and learning profile.
async fn quote_lifecycle_check(config: &AppConfig) -> Result<String, String> {
    let reconciler = SuggestionReconciler::new(
        pricing_engine(config),
        CategoryRegistry::builtin(),
        Arc::new(PreviewCache::default()),
        Some(CannedSource),
    );

    let session_id = Uuid::new_v4().to_string();
    let outcome = reconciler
        .reconcile(&ReconcileRequest {
            session_id: session_id.clone(),
            job_description: "Rifacimento bagno 8mq".to_string(),
            profession: Some("idraulico".to_string()),
            profile_category: None,
            tier: Tier::Standard,
            job_type: None,
            price_list: None,
            context_prompt: None,
        })
        .await
        .map_err(|error| format!("reconcile failed: {error}"))?;

    if !outcome.ai_generated || outcome.preview.items.is_empty() {
        return Err("reconcile did not produce an AI preview".to_string());
    }

    // Keep the first AI price, edit the second: the feedback loop must see
    // one exact match and one correction.
    let submitted: Vec<SubmittedItem> = outcome
        .preview
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| SubmittedItem {
            description: item.description.clone(),
            quantity: Some(f64::from(item.quantity)),
            unit_price: if index == 0 { item.unit_price } else { item.unit_price - 10.0 },
        })
        .collect();
    let created = reconciler
        .create_from_preview(&session_id, Tier::Standard, &submitted)
        .map_err(|error| format!("create failed: {error}"))?;

    let quote = Quote {
        id: QuoteId(format!("PREV-SMOKE-{}", Uuid::new_v4())),
        user_id: "smoke-user".to_string(),
        status: QuoteStatus::Draft,
        category: outcome.category.clone(),
        tier: Tier::Standard,
        ai_generated: outcome.ai_generated,
        pricing: created.pricing.clone(),
        created_at: Utc::now(),
    };

    let quote_repo = InMemoryQuoteRepository::new();
    quote_repo.save(&quote).await.map_err(|error| error.to_string())?;
    quote_repo
        .update_status(&quote.id, QuoteStatus::Sent)
        .await
        .map_err(|error| error.to_string())?;

    let feedback_repo = InMemoryFeedbackRepository::new();
    feedback_repo.register_quote_owner(&quote.id, &quote.user_id);
    let entries = created.feedback_entries(&quote.id, Utc::now());
    if entries.len() != 2 {
        return Err(format!("expected 2 feedback entries, got {}", entries.len()));
    }
    feedback_repo.record(&entries).await.map_err(|error| error.to_string())?;
    feedback_repo
        .link_outcome(&quote.id, Outcome::Accepted, Utc::now())
        .await
        .map_err(|error| error.to_string())?;

    let history = feedback_repo
        .list_for_user(&quote.user_id)
        .await
        .map_err(|error| error.to_string())?;
    let kpi = compute_kpi(&history);
    if kpi.acceptance_rate != 100.0 || kpi.ai_accuracy != 50.0 {
        return Err(format!(
            "unexpected kpi: acceptance {} accuracy {}",
            kpi.acceptance_rate, kpi.ai_accuracy
        ));
    }

    let builder = LearningProfileBuilder::new(1);
    let completed = quote_repo
        .list_completed_for_user(&quote.user_id)
        .await
        .map_err(|error| error.to_string())?;
    let profile = builder
        .build(&quote.user_id, &completed, Utc::now())
        .ok_or_else(|| "learning profile was not generated".to_string())?;

    Ok(format!(
        "lifecycle ok: {} preview items, kpi acceptance {}% accuracy {}%, profile over {} quotes",
        outcome.preview.items.len(),
        kpi.acceptance_rate,
        kpi.ai_accuracy,
        profile.based_on_count
    ))
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
