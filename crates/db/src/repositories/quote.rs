use chrono::{DateTime, Utc};
use sqlx::Row;

use preventivo_core::domain::quote::{
    LineItem, Quote, QuoteId, QuotePricing, QuoteStatus, Tier,
};

use super::{QuoteRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_quote(
    row: &sqlx::sqlite::SqliteRow,
    line_items: Vec<LineItem>,
) -> Result<Quote, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let user_id: String = decode(row.try_get("user_id"))?;
    let status_str: String = decode(row.try_get("status"))?;
    let category: Option<String> = decode(row.try_get("category"))?;
    let tier_str: String = decode(row.try_get("tier"))?;
    let ai_generated: bool = decode(row.try_get("ai_generated"))?;
    let subtotal: f64 = decode(row.try_get("subtotal"))?;
    let taxes: f64 = decode(row.try_get("taxes"))?;
    let total: f64 = decode(row.try_get("total"))?;
    let created_at_str: String = decode(row.try_get("created_at"))?;

    let status = QuoteStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown quote status `{status_str}`")))?;
    let tier = Tier::parse(&tier_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown tier `{tier_str}`")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Quote {
        id: QuoteId(id),
        user_id,
        status,
        category,
        tier,
        ai_generated,
        pricing: QuotePricing { line_items, subtotal, taxes, total },
        created_at,
    })
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<LineItem, RepositoryError> {
    let quantity: i64 = decode(row.try_get("quantity"))?;
    Ok(LineItem {
        description: decode(row.try_get("description"))?,
        quantity: u32::try_from(quantity)
            .map_err(|_| RepositoryError::Decode(format!("invalid quantity `{quantity}`")))?,
        unit_cost: decode(row.try_get("unit_cost"))?,
        margin_percent: decode(row.try_get("margin_percent"))?,
        unit_price: decode(row.try_get("unit_price"))?,
        subtotal: decode(row.try_get("subtotal"))?,
    })
}

impl SqlQuoteRepository {
    async fn lines_for(&self, quote_id: &str) -> Result<Vec<LineItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT description, quantity, unit_cost, margin_percent, unit_price, subtotal
             FROM quote_line
             WHERE quote_id = ?
             ORDER BY position",
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_line).collect()
    }
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, status, category, tier, ai_generated,
                    subtotal, taxes, total, created_at
             FROM quote
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.lines_for(&id.0).await?;
                Ok(Some(row_to_quote(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quote
                (id, user_id, status, category, tier, ai_generated,
                 subtotal, taxes, total, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 category = excluded.category,
                 tier = excluded.tier,
                 ai_generated = excluded.ai_generated,
                 subtotal = excluded.subtotal,
                 taxes = excluded.taxes,
                 total = excluded.total",
        )
        .bind(&quote.id.0)
        .bind(&quote.user_id)
        .bind(quote.status.as_str())
        .bind(&quote.category)
        .bind(quote.tier.as_str())
        .bind(quote.ai_generated)
        .bind(quote.pricing.subtotal)
        .bind(quote.pricing.taxes)
        .bind(quote.pricing.total)
        .bind(quote.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM quote_line WHERE quote_id = ?")
            .bind(&quote.id.0)
            .execute(&mut *tx)
            .await?;

        for (position, line) in quote.pricing.line_items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quote_line
                    (quote_id, position, description, quantity,
                     unit_cost, margin_percent, unit_price, subtotal)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&quote.id.0)
            .bind(position as i64)
            .bind(&line.description)
            .bind(i64::from(line.quantity))
            .bind(line.unit_cost)
            .bind(line.margin_percent)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &QuoteId,
        status: QuoteStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE quote SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_completed_for_user(&self, user_id: &str) -> Result<Vec<Quote>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, status, category, tier, ai_generated,
                    subtotal, taxes, total, created_at
             FROM quote
             WHERE user_id = ? AND status != 'draft'
             ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut quotes = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let lines = self.lines_for(&id).await?;
            quotes.push(row_to_quote(row, lines)?);
        }
        Ok(quotes)
    }

    async fn count_completed_for_user(&self, user_id: &str) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM quote WHERE user_id = ? AND status != 'draft'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 =
            row.try_get("count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}
