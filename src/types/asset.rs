//! Asset and account identifiers.
//!
//! Assets are the nodes of the order book graph. An asset is either the
//! network's native currency or a credit identified by a short code plus the
//! account that issued it. Assets are immutable values: equality and hashing
//! cover the discriminant, the code and the issuer, so they can be used
//! directly as graph node keys.
//!
//! The derived `Ord` (native sorts before credits, then code, then issuer)
//! is what gives path ranking its deterministic lexicographic tie-break.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a credit asset code.
pub const MAX_CODE_LENGTH: usize = 12;

/// An account identifier.
///
/// Opaque to this crate; used for offer sellers and for the accounts whose
/// balances seed a path search.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fungible unit of value on the network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The network's native currency.
    Native,
    /// A credit issued by a specific account.
    Credit { code: String, issuer: AccountId },
}

impl Asset {
    /// Build a credit asset.
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Asset::Credit {
            code: code.into(),
            issuer: AccountId::new(issuer),
        }
    }

    /// Whether this asset satisfies the structural rules for graph membership.
    ///
    /// Native is always well formed. A credit needs a 1..=12 alphanumeric
    /// code and a non-empty issuer.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Asset::Native => true,
            Asset::Credit { code, issuer } => {
                !code.is_empty()
                    && code.len() <= MAX_CODE_LENGTH
                    && code.chars().all(|c| c.is_ascii_alphanumeric())
                    && !issuer.0.is_empty()
            }
        }
    }

    /// Short code for log lines; the issuer is elided.
    pub fn code(&self) -> &str {
        match self {
            Asset::Native => "native",
            Asset::Credit { code, .. } => code,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Credit { code, issuer } => write!(f, "{}:{}", code, issuer),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
