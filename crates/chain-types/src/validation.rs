//! # Block Validation Outcomes
//!
//! The verdict delivered with block-checked notifications. Subscribers
//! use it to distinguish "this block is bad" from "this node could not
//! tell"; misbehaviour scoring must only act on the former.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of checking a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlockValidationState {
    /// The block passed all validation rules.
    #[default]
    Valid,
    /// The block violated a consensus rule.
    Invalid {
        /// Short machine-parseable reject reason (e.g. `"bad-txns-inputs"`).
        reason: String,
        /// Extra human-readable context, possibly empty.
        debug: String,
    },
    /// Validation aborted on a local fault (I/O, resources); no verdict
    /// on the block itself.
    InternalError {
        /// Description of the fault.
        debug: String,
    },
}

impl BlockValidationState {
    /// An invalid verdict with a reject reason and debug context.
    pub fn invalid(reason: impl Into<String>, debug: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
            debug: debug.into(),
        }
    }

    /// A local-fault outcome.
    pub fn internal_error(debug: impl Into<String>) -> Self {
        Self::InternalError {
            debug: debug.into(),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::InternalError { .. })
    }

    /// The machine-parseable reject reason, if the block was invalid.
    pub fn reject_reason(&self) -> Option<&str> {
        match self {
            Self::Invalid { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for BlockValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("valid"),
            Self::Invalid { reason, debug } if debug.is_empty() => f.write_str(reason),
            Self::Invalid { reason, debug } => write!(f, "{reason}, {debug}"),
            Self::InternalError { debug } => write!(f, "internal error: {debug}"),
        }
    }
}
