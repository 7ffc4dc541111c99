//! Error taxonomy for the order book graph and the path finder.
//!
//! Two families, matching the two kinds of callers:
//!
//! - [`InvalidBatchError`] goes back to the ingestion pipeline when a staged
//!   batch cannot be committed. The graph is left untouched; a recurring
//!   stream of these means the upstream ledger-to-offer translation is
//!   broken and should page somebody.
//! - [`QueryError`] goes back to request handlers. `EmptyOrderBook` maps to
//!   a "still ingesting" response, everything else to a 400-class parameter
//!   problem. A search that legitimately finds nothing returns an empty
//!   result list, never an error.

use thiserror::Error;

use crate::types::OfferId;

/// A staged mutation batch failed validation; nothing was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBatchError {
    #[error("offer {0} has a malformed asset")]
    MalformedAsset(OfferId),

    #[error("offer {0} has a non-positive price")]
    NonPositivePrice(OfferId),

    #[error("offer {0} has a negative amount")]
    NegativeAmount(OfferId),

    #[error("offer {0} is not present in the order book")]
    OfferNotPresent(OfferId),

    #[error("ledger {applied} is older than the last applied ledger {current}")]
    LedgerRegression { applied: u32, current: u32 },
}

/// A read query could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The graph holds no offers or no ledger has ever been applied.
    /// Callers surface this as "still ingesting", not as "no route".
    #[error("order book is empty")]
    EmptyOrderBook,

    /// More source/destination assets than the configured maximum.
    /// Rejected before any graph access.
    #[error("list of assets exceeds maximum length of {max}")]
    TooManyAssets { max: usize },

    /// The requested path length exceeds the configured maximum.
    /// Rejected before any graph access.
    #[error("path length {requested} exceeds maximum of {max}")]
    TooManyHops { requested: u32, max: u32 },

    /// An asset in the request fails the structural rules.
    #[error("malformed asset {0}")]
    MalformedAsset(String),

    /// The requested amount must be strictly positive.
    #[error("amount must be positive")]
    NonPositiveAmount,
}

impl QueryError {
    /// True for the parameter-validation class of errors (everything except
    /// [`QueryError::EmptyOrderBook`]), which handlers translate into
    /// 400-class responses.
    pub fn is_parameter_error(&self) -> bool {
        !matches!(self, QueryError::EmptyOrderBook)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(!QueryError::EmptyOrderBook.is_parameter_error());
        assert!(QueryError::TooManyAssets { max: 15 }.is_parameter_error());
        assert!(QueryError::TooManyHops { requested: 9, max: 5 }.is_parameter_error());
        assert!(QueryError::MalformedAsset("x".into()).is_parameter_error());
    }

    #[test]
    fn test_batch_error_display_names_offender() {
        let err = InvalidBatchError::NonPositivePrice(42);
        assert!(err.to_string().contains("42"));
    }
}
