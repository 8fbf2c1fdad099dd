//! Error types for identity hashing.
//!
//! Every failure aborts the whole traversal: there is no partial digest and no
//! retry. Callers branch on [`IdentityError::kind`], whose string form is stable.

use crate::value::ValueKind;

/// Error raised while computing an identity hash.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The root value is absent (`None`, a dead weak reference, ...).
    #[error("Cannot compute identity of an absent value")]
    NilInput,

    /// No strategy in the chain accepted a (sub)value.
    #[error("No strategy matched value of kind {kind}: {detail}")]
    UnmatchedStrategy {
        /// Kind of the rejected value.
        kind: ValueKind,
        /// Short description of the rejected value.
        detail: String,
    },

    /// The sink rejected canonical bytes.
    #[error("Failed to write canonical bytes to sink: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// Nesting exceeded the configured depth guard.
    #[error("Value nesting exceeds maximum depth of {max_depth}")]
    TooDeep {
        /// The configured limit.
        max_depth: usize,
    },

    /// A shared pointer was reached again while still being traversed.
    #[error("Cyclic reference detected at address {address:#x}")]
    Cyclic {
        /// Allocation address of the shared pointer that closed the cycle.
        address: usize,
    },
}

impl IdentityError {
    /// Stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NilInput => ErrorKind::NilInput,
            Self::UnmatchedStrategy { .. } => ErrorKind::UnmatchedStrategy,
            Self::SinkWrite(_) => ErrorKind::SinkWriteFailure,
            Self::TooDeep { .. } => ErrorKind::TooDeep,
            Self::Cyclic { .. } => ErrorKind::Cyclic,
        }
    }
}

/// Error classification with a stable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Root value is absent.
    NilInput,
    /// No strategy accepted a value.
    UnmatchedStrategy,
    /// The sink rejected a write.
    SinkWriteFailure,
    /// Depth guard tripped.
    TooDeep,
    /// Cycle through shared pointers.
    Cyclic,
}

impl ErrorKind {
    /// Stable, namespaced identifier for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NilInput => "destruct.nil_input",
            Self::UnmatchedStrategy => "destruct.unmatched_strategy",
            Self::SinkWriteFailure => "destruct.sink_write_failure",
            Self::TooDeep => "destruct.too_deep",
            Self::Cyclic => "destruct.cyclic",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
