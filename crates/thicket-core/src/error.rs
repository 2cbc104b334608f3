//! Error types shared by agents and the commit path.

use std::error::Error;
use std::fmt;

use crate::field::{Field, ValueKind};

/// Errors raised while an agent computes or commits a cycle.
///
/// An agent error never breaks the lockstep protocol: the engine records
/// it, halts the world during the commit window, and every participant
/// leaves its loop at the start of the next cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentError {
    /// The agent's update rule failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The agent proposed a value for a field it never declared.
    UndeclaredWrite {
        /// Name of the proposing agent.
        agent: String,
        /// The field it tried to write.
        field: Field,
    },
    /// The proposed value does not match the field's storage kind.
    KindMismatch {
        /// The target field.
        field: Field,
        /// The kind the field stores.
        expected: ValueKind,
    },
    /// A real-valued proposal was NaN or infinite.
    NonFinite {
        /// The target field.
        field: Field,
    },
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::UndeclaredWrite { agent, field } => {
                write!(f, "agent '{agent}' wrote undeclared field {field}")
            }
            Self::KindMismatch { field, expected } => {
                write!(f, "field {field} stores {expected} values")
            }
            Self::NonFinite { field } => write!(f, "non-finite value proposed for {field}"),
        }
    }
}

impl Error for AgentError {}
