//! Transaction isolation levels callers may attach to a request.
//!
//! The level is not interpreted here; it is parsed and handed to the
//! executor unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SQL transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionIsolationLevel {
    /// Dirty reads permitted.
    ReadUncommitted,
    /// Only committed rows are visible.
    ReadCommitted,
    /// Rows read once stay stable for the transaction.
    RepeatableRead,
    /// Full serialisability.
    Serializable,
}

impl TransactionIsolationLevel {
    /// Every level, weakest first.
    pub const ALL: [Self; 4] = [
        Self::ReadUncommitted,
        Self::ReadCommitted,
        Self::RepeatableRead,
        Self::Serializable,
    ];

    /// Name as it appears in request input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "ReadUncommitted",
            Self::ReadCommitted => "ReadCommitted",
            Self::RepeatableRead => "RepeatableRead",
            Self::Serializable => "Serializable",
        }
    }
}

impl fmt::Display for TransactionIsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an isolation level name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction isolation level '{value}'")]
pub struct UnknownIsolationLevel {
    /// The rejected input.
    pub value: String,
}

impl FromStr for TransactionIsolationLevel {
    type Err = UnknownIsolationLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownIsolationLevel { value: s.to_owned() })
    }
}
