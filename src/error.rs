//! Crate-wide error type.

use thiserror::Error;

use crate::property;

/// Shard-local and peered operation error (§7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Id or key does not resolve on its owning shard.
    #[error("not found")]
    NotFound,

    /// Property or type registered with an incompatible kind.
    #[error("schema conflict: {name} already registered as {existing}, requested {requested}")]
    SchemaConflict {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// Malformed JSON payload, unknown property name, or value of the wrong kind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Shard inbox is full; the dispatch was rejected rather than queued.
    #[error("shard overloaded")]
    Overloaded,

    /// A peered operation in which some shards succeeded and some failed.
    /// Carries the most severe sub-error observed.
    #[error("partial failure: {0}")]
    PartialFailure(Box<Error>),

    #[error("property: {0}")]
    Property(#[from] property::Error),

    #[error("shard channel closed")]
    ShardGone,
}

impl Error {
    /// Rank errors by severity so a peered gather can keep the worst one.
    fn severity(&self) -> u8 {
        match self {
            Error::NotFound => 0,
            Error::InvalidArgument(_) => 1,
            Error::Property(_) => 1,
            Error::SchemaConflict { .. } => 2,
            Error::Overloaded => 3,
            Error::ShardGone => 4,
            Error::PartialFailure(inner) => inner.severity(),
        }
    }

    /// Combine two sub-call errors into one, keeping the more severe.
    pub fn worse(self, other: Error) -> Error {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    pub(crate) fn partial(self) -> Error {
        Error::PartialFailure(Box::new(self))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
