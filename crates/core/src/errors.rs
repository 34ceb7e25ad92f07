use thiserror::Error;

use crate::domain::quote::QuoteStatus;

/// Failures that cannot be recovered by clamping or falling back to
/// templates. Everything else in the engine degrades to a valid, fully
/// priced quote instead of erroring.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid quote transition from {from:?} to {to:?}")]
    InvalidQuoteTransition { from: QuoteStatus, to: QuoteStatus },
    #[error("a quote needs at least one line item")]
    EmptyLineItems,
}

#[cfg(test)]
mod tests {
    use crate::domain::quote::QuoteStatus;

    use super::DomainError;

    #[test]
    fn transition_error_names_both_states() {
        let error = DomainError::InvalidQuoteTransition {
            from: QuoteStatus::Accepted,
            to: QuoteStatus::Draft,
        };
        assert_eq!(error.to_string(), "invalid quote transition from Accepted to Draft");
    }

    #[test]
    fn empty_line_items_is_a_distinct_failure() {
        assert_ne!(
            DomainError::EmptyLineItems,
            DomainError::InvalidQuoteTransition {
                from: QuoteStatus::Draft,
                to: QuoteStatus::Sent,
            }
        );
    }
}
