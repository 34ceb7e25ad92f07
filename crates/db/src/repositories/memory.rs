//! In-memory repository implementations for tests and smoke checks.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use preventivo_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use preventivo_core::feedback::{FeedbackEntry, Outcome};
use preventivo_core::learning::LearningProfile;

use super::{
    FeedbackRepository, LearningProfileRepository, QuoteRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: Mutex<HashMap<String, Quote>>,
}

impl InMemoryQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        Ok(self.quotes.lock().expect("quote store lock").get(&id.0).cloned())
    }

    async fn save(&self, quote: &Quote) -> Result<(), RepositoryError> {
        self.quotes.lock().expect("quote store lock").insert(quote.id.0.clone(), quote.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: &QuoteId,
        status: QuoteStatus,
    ) -> Result<(), RepositoryError> {
        if let Some(quote) = self.quotes.lock().expect("quote store lock").get_mut(&id.0) {
            quote.status = status;
        }
        Ok(())
    }

    async fn list_completed_for_user(&self, user_id: &str) -> Result<Vec<Quote>, RepositoryError> {
        let mut quotes: Vec<Quote> = self
            .quotes
            .lock()
            .expect("quote store lock")
            .values()
            .filter(|quote| quote.user_id == user_id && quote.status != QuoteStatus::Draft)
            .cloned()
            .collect();
        quotes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(quotes)
    }

    async fn count_completed_for_user(&self, user_id: &str) -> Result<u32, RepositoryError> {
        let count = self
            .quotes
            .lock()
            .expect("quote store lock")
            .values()
            .filter(|quote| quote.user_id == user_id && quote.status != QuoteStatus::Draft)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    // (user_id, entry): the user scope comes from the owning quote in the
    // SQL implementation, so callers register it via `record_for_user`
    // or implicitly through entries joined against the quote store.
    entries: Mutex<Vec<(String, FeedbackEntry)>>,
    quote_users: Mutex<HashMap<String, String>>,
}

impl InMemoryFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror of the quote table's ownership column.
    pub fn register_quote_owner(&self, quote_id: &QuoteId, user_id: &str) {
        self.quote_users
            .lock()
            .expect("feedback store lock")
            .insert(quote_id.0.clone(), user_id.to_string());
    }
}

#[async_trait::async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn record(&self, entries: &[FeedbackEntry]) -> Result<(), RepositoryError> {
        let owners = self.quote_users.lock().expect("feedback store lock");
        let mut store = self.entries.lock().expect("feedback store lock");
        for entry in entries {
            let user_id = owners.get(&entry.quote_id.0).cloned().unwrap_or_default();
            store.push((user_id, entry.clone()));
        }
        Ok(())
    }

    async fn link_outcome(
        &self,
        quote_id: &QuoteId,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut store = self.entries.lock().expect("feedback store lock");
        let mut updated = 0u64;
        for (_, entry) in store.iter_mut() {
            if entry.quote_id == *quote_id && entry.outcome.is_none() {
                entry.outcome = Some(outcome);
                entry.outcome_at = Some(at);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<FeedbackEntry>, RepositoryError> {
        Ok(self
            .entries
            .lock()
            .expect("feedback store lock")
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryLearningProfileRepository {
    profiles: Mutex<HashMap<String, LearningProfile>>,
}

impl InMemoryLearningProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LearningProfileRepository for InMemoryLearningProfileRepository {
    async fn upsert(&self, profile: &LearningProfile) -> Result<(), RepositoryError> {
        self.profiles
            .lock()
            .expect("profile store lock")
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<LearningProfile>, RepositoryError> {
        Ok(self.profiles.lock().expect("profile store lock").get(user_id).cloned())
    }
}
