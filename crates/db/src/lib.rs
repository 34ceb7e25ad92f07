pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, DbPool};
pub use repositories::{
    FeedbackRepository, InMemoryFeedbackRepository, InMemoryLearningProfileRepository,
    InMemoryQuoteRepository, LearningProfileRepository, QuoteRepository, RepositoryError,
    SqlFeedbackRepository, SqlLearningProfileRepository, SqlQuoteRepository,
};
