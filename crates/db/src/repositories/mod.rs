use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use preventivo_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use preventivo_core::feedback::{FeedbackEntry, Outcome};
use preventivo_core::learning::LearningProfile;

pub mod feedback;
pub mod learning_profile;
pub mod memory;
pub mod quote;

pub use feedback::SqlFeedbackRepository;
pub use learning_profile::SqlLearningProfileRepository;
pub use memory::{InMemoryFeedbackRepository, InMemoryLearningProfileRepository, InMemoryQuoteRepository};
pub use quote::SqlQuoteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn save(&self, quote: &Quote) -> Result<(), RepositoryError>;
    async fn update_status(
        &self,
        id: &QuoteId,
        status: QuoteStatus,
    ) -> Result<(), RepositoryError>;
    /// Completed means sent or beyond; drafts never feed the learning loop.
    async fn list_completed_for_user(&self, user_id: &str) -> Result<Vec<Quote>, RepositoryError>;
    async fn count_completed_for_user(&self, user_id: &str) -> Result<u32, RepositoryError>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn record(&self, entries: &[FeedbackEntry]) -> Result<(), RepositoryError>;
    /// Attach the client's outcome to every pending entry of a quote.
    /// Entries that already carry an outcome are left alone, so replays
    /// are no-ops. Returns the number of entries updated.
    async fn link_outcome(
        &self,
        quote_id: &QuoteId,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<FeedbackEntry>, RepositoryError>;
}

#[async_trait]
pub trait LearningProfileRepository: Send + Sync {
    async fn upsert(&self, profile: &LearningProfile) -> Result<(), RepositoryError>;
    async fn find_by_user(&self, user_id: &str) -> Result<Option<LearningProfile>, RepositoryError>;
}
