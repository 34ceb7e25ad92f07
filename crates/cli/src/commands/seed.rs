use chrono::{Duration, Utc};

use crate::commands::CommandResult;
use preventivo_core::config::{AppConfig, LoadOptions};
use preventivo_core::domain::quote::{Quote, QuoteId, QuoteStatus, Tier};
use preventivo_core::learning::LearningProfileBuilder;
use preventivo_core::pricing::{PricingEngine, RawAmounts, RawLineItem};
use preventivo_core::registry::CategoryRegistry;
use preventivo_core::templates::TemplateSelector;
use preventivo_db::repositories::{
    LearningProfileRepository, QuoteRepository, SqlLearningProfileRepository, SqlQuoteRepository,
};
use preventivo_db::{connect, migrations};

const DEMO_USER: &str = "demo-user";

const DEMO_JOBS: &[(&str, &str, Tier, QuoteStatus)] = &[
    ("PREV-DEMO-0001", "Rifacimento bagno 8mq", Tier::Standard, QuoteStatus::Accepted),
    ("PREV-DEMO-0002", "Riparazione perdita sotto il lavello", Tier::Economy, QuoteStatus::Accepted),
    ("PREV-DEMO-0003", "Sostituzione caldaia a condensazione", Tier::Premium, QuoteStatus::Rejected),
    ("PREV-DEMO-0004", "Installazione sanitari e doccia", Tier::Standard, QuoteStatus::Sent),
    ("PREV-DEMO-0005", "Rifacimento impianto bagno di servizio", Tier::Standard, QuoteStatus::Accepted),
];

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let quotes = build_demo_quotes(&config);
        let quote_repo = SqlQuoteRepository::new(pool.clone());
        for quote in &quotes {
            quote_repo
                .save(quote)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        }

        // The demo history crosses the training threshold, so seed the
        // derived profile too.
        let builder = LearningProfileBuilder::new(config.learning.training_threshold);
        let completed = quote_repo
            .list_completed_for_user(DEMO_USER)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        if let Some(profile) = builder.build(DEMO_USER, &completed, Utc::now()) {
            SqlLearningProfileRepository::new(pool.clone())
                .upsert(&profile)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        }

        let count = quote_repo
            .count_completed_for_user(DEMO_USER)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;

        if count as usize != DEMO_JOBS.len() {
            return Err((
                "seed_verification",
                format!("expected {} demo quotes, found {count}", DEMO_JOBS.len()),
                6u8,
            ));
        }
        Ok(count)
    });

    match result {
        Ok(count) => CommandResult::success(
            "seed",
            format!("loaded {count} demo quotes and a learning profile for `{DEMO_USER}`"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

/// Deterministic apart from timestamps: the same template and pricing paths
/// the reconciler uses, so seeded amounts are internally consistent.
fn build_demo_quotes(config: &AppConfig) -> Vec<Quote> {
    let registry = CategoryRegistry::builtin();
    let selector = TemplateSelector::new(registry);
    let engine = PricingEngine::new(preventivo_core::pricing::PricingPolicy {
        tax_rate: config.pricing.tax_rate,
        margin_ceiling: config.pricing.margin_ceiling,
    });
    let category = registry.category("idraulico");
    let base_time = Utc::now() - Duration::days(DEMO_JOBS.len() as i64);

    DEMO_JOBS
        .iter()
        .enumerate()
        .map(|(index, (id, job, tier, status))| {
            let selected = selector.select_template(category, job, None, *tier);
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

            Quote {
                id: QuoteId((*id).to_string()),
                user_id: DEMO_USER.to_string(),
                status: status.clone(),
                category: Some("idraulico".to_string()),
                tier: *tier,
                ai_generated: false,
                pricing: engine.process_quote(&raw),
                created_at: base_time + Duration::days(index as i64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use preventivo_core::config::AppConfig;
    use preventivo_core::domain::quote::QuoteStatus;

    use super::{build_demo_quotes, DEMO_JOBS};

    #[test]
    fn demo_quotes_are_fully_priced() {
        let quotes = build_demo_quotes(&AppConfig::default());

        assert_eq!(quotes.len(), DEMO_JOBS.len());
        for quote in &quotes {
            assert!(!quote.pricing.line_items.is_empty());
            assert!(quote.pricing.total > quote.pricing.subtotal);
            for line in &quote.pricing.line_items {
                assert!(line.unit_cost > 0.0);
                assert!(line.unit_price >= line.unit_cost);
            }
        }
    }

    #[test]
    fn demo_history_crosses_the_training_threshold() {
        let quotes = build_demo_quotes(&AppConfig::default());
        let completed =
            quotes.iter().filter(|quote| quote.status != QuoteStatus::Draft).count();
        assert!(completed >= 5);
    }
}
