use crate::commands::CommandResult;
use preventivo_core::config::{AppConfig, LoadOptions};
use preventivo_db::{connect, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
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
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(apply(&config)) {
        Ok(applied) => CommandResult::success(
            "migrate",
            format!("database schema is current ({applied} migrations applied)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

async fn apply(config: &AppConfig) -> Result<i64, (&'static str, String, u8)> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", format!("failed to open database: {error}"), 4u8))?;

    let outcome = match migrations::run_pending(&pool).await {
        Ok(()) => migrations::applied_count(&pool)
            .await
            .map_err(|error| ("migration", format!("could not read migration ledger: {error}"), 5u8)),
        Err(error) => Err(("migration", error.to_string(), 5u8)),
    };
    pool.close().await;
    outcome
}
