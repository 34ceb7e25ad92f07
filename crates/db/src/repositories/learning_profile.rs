use chrono::{DateTime, Utc};
use sqlx::Row;

use preventivo_core::learning::{LearningProfile, ProfileStats};

use super::{LearningProfileRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLearningProfileRepository {
    pool: DbPool,
}

impl SqlLearningProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<LearningProfile, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let generated_at_str: String =
        row.try_get("generated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let based_on_count: i64 =
        row.try_get("based_on_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile_json: String =
        row.try_get("profile_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let context_prompt: String =
        row.try_get("context_prompt").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let generated_at = DateTime::parse_from_rfc3339(&generated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile: ProfileStats =
        serde_json::from_str(&profile_json).map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(LearningProfile {
        user_id,
        generated_at,
        based_on_count: u32::try_from(based_on_count)
            .map_err(|_| RepositoryError::Decode(format!("invalid count `{based_on_count}`")))?,
        profile,
        context_prompt,
    })
}

#[async_trait::async_trait]
impl LearningProfileRepository for SqlLearningProfileRepository {
    async fn upsert(&self, profile: &LearningProfile) -> Result<(), RepositoryError> {
        let profile_json = serde_json::to_string(&profile.profile)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO learning_profile
                (user_id, generated_at, based_on_count, profile_json, context_prompt)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 generated_at = excluded.generated_at,
                 based_on_count = excluded.based_on_count,
                 profile_json = excluded.profile_json,
                 context_prompt = excluded.context_prompt",
        )
        .bind(&profile.user_id)
        .bind(profile.generated_at.to_rfc3339())
        .bind(i64::from(profile.based_on_count))
        .bind(&profile_json)
        .bind(&profile.context_prompt)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<LearningProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, generated_at, based_on_count, profile_json, context_prompt
             FROM learning_profile
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_profile).transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use preventivo_core::domain::quote::Tier;
    use preventivo_core::learning::{LearningProfile, ProfileStats, RecurringItem};

    use super::SqlLearningProfileRepository;
    use crate::repositories::LearningProfileRepository;
    use crate::connection::{connect, memory_settings};
    use crate::migrations;

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect(&memory_settings()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_profile(user_id: &str, based_on_count: u32) -> LearningProfile {
        LearningProfile {
            user_id: user_id.to_string(),
            generated_at: Utc::now(),
            based_on_count,
            profile: ProfileStats {
                main_category: Some("idraulico".to_string()),
                margine_medio: 30.0,
                prezzi_medi: BTreeMap::from([("standard".to_string(), 1200.0)]),
                voci_ricorrenti: vec![RecurringItem {
                    description: "Manodopera idraulica".to_string(),
                    frequenza: 12,
                    prezzo_medio: 280.0,
                    costo_medio: Some(215.0),
                    margine_medio: Some(30.0),
                }],
                preferred_tier: Tier::Standard,
            },
            context_prompt: "Profilo storico del professionista.".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_find_round_trips_the_stats() {
        let pool = setup().await;
        let repo = SqlLearningProfileRepository::new(pool);

        repo.upsert(&sample_profile("user-1", 5)).await.expect("upsert");

        let loaded = repo.find_by_user("user-1").await.expect("find").expect("present");
        assert_eq!(loaded.based_on_count, 5);
        assert_eq!(loaded.profile.main_category.as_deref(), Some("idraulico"));
        assert_eq!(loaded.profile.voci_ricorrenti[0].frequenza, 12);
        assert_eq!(loaded.profile.preferred_tier, Tier::Standard);
    }

    #[tokio::test]
    async fn upsert_replaces_the_previous_generation() {
        let pool = setup().await;
        let repo = SqlLearningProfileRepository::new(pool);

        repo.upsert(&sample_profile("user-1", 5)).await.expect("first");
        repo.upsert(&sample_profile("user-1", 8)).await.expect("second");

        let loaded = repo.find_by_user("user-1").await.expect("find").expect("present");
        assert_eq!(loaded.based_on_count, 8);
    }

    #[tokio::test]
    async fn unknown_user_has_no_profile() {
        let pool = setup().await;
        let repo = SqlLearningProfileRepository::new(pool);

        assert!(repo.find_by_user("user-404").await.expect("find").is_none());
    }
}
