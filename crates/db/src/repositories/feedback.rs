use chrono::{DateTime, Utc};
use sqlx::Row;

use preventivo_core::domain::quote::QuoteId;
use preventivo_core::domain::suggestion::{AiSnapshot, Confidence};
use preventivo_core::feedback::{FeedbackEntry, Outcome, UserFinal};

use super::{FeedbackRepository, RepositoryError};
use crate::DbPool;

pub struct SqlFeedbackRepository {
    pool: DbPool,
}

impl SqlFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<FeedbackEntry, RepositoryError> {
    let quote_id: String = decode(row.try_get("quote_id"))?;
    let confidence_str: String = decode(row.try_get("ai_confidence"))?;
    let outcome_str: Option<String> = decode(row.try_get("outcome"))?;
    let recorded_at_str: String = decode(row.try_get("recorded_at"))?;
    let outcome_at_str: Option<String> = decode(row.try_get("outcome_at"))?;

    let confidence = Confidence::parse(&confidence_str).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown confidence `{confidence_str}`"))
    })?;
    let outcome = match outcome_str {
        Some(value) => Some(
            Outcome::parse(&value)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown outcome `{value}`")))?,
        ),
        None => None,
    };

    Ok(FeedbackEntry {
        quote_id: QuoteId(quote_id),
        item_description: decode(row.try_get("item_description"))?,
        ai_suggested: AiSnapshot {
            unit_cost: decode(row.try_get("ai_unit_cost"))?,
            margin_percent: decode(row.try_get("ai_margin_percent"))?,
            confidence,
        },
        user_final: UserFinal {
            unit_cost: decode(row.try_get("user_unit_cost"))?,
            margin_percent: decode(row.try_get("user_margin_percent"))?,
            unit_price: decode(row.try_get("user_unit_price"))?,
        },
        outcome,
        recorded_at: parse_timestamp(&recorded_at_str)?,
        outcome_at: outcome_at_str.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait::async_trait]
impl FeedbackRepository for SqlFeedbackRepository {
    async fn record(&self, entries: &[FeedbackEntry]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO feedback_entry
                    (quote_id, item_description, ai_unit_cost, ai_margin_percent,
                     ai_confidence, user_unit_cost, user_margin_percent,
                     user_unit_price, outcome, recorded_at, outcome_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&entry.quote_id.0)
            .bind(&entry.item_description)
            .bind(entry.ai_suggested.unit_cost)
            .bind(entry.ai_suggested.margin_percent)
            .bind(entry.ai_suggested.confidence.as_str())
            .bind(entry.user_final.unit_cost)
            .bind(entry.user_final.margin_percent)
            .bind(entry.user_final.unit_price)
            .bind(entry.outcome.map(|o| o.as_str()))
            .bind(entry.recorded_at.to_rfc3339())
            .bind(entry.outcome_at.map(|at| at.to_rfc3339()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn link_outcome(
        &self,
        quote_id: &QuoteId,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE feedback_entry
             SET outcome = ?, outcome_at = ?
             WHERE quote_id = ? AND outcome IS NULL",
        )
        .bind(outcome.as_str())
        .bind(at.to_rfc3339())
        .bind(&quote_id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<FeedbackEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT f.quote_id, f.item_description, f.ai_unit_cost, f.ai_margin_percent,
                    f.ai_confidence, f.user_unit_cost, f.user_margin_percent,
                    f.user_unit_price, f.outcome, f.recorded_at, f.outcome_at
             FROM feedback_entry f
             JOIN quote q ON q.id = f.quote_id
             WHERE q.user_id = ?
             ORDER BY f.recorded_at, f.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}
