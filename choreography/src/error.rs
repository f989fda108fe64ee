//! Error kinds shared by every stage of the pipeline

use crate::ast::Role;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Cause tag of a validation or compilation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// `do` target not found, or called with the wrong arguments
    UnresolvedSubprotocol,
    /// Subprotocol calls that never reach an action
    NonTerminatingInlining,
    /// A role acts before being causally enabled
    RoleNotEnabled,
    /// A receiver observes different senders across the blocks of a choice
    InconsistentExternalChoice,
    /// A declared role never acts
    UnusedRole,
    /// A recursion that never loops or never acts
    VacuousRecursion,
    /// Behaviour that can never be reached
    UnreachableBranch,
    /// Internal invariant broken
    GraphConstructionInvariantViolation,
}

impl ErrorKind {
    /// Whether this kind signals a defect in the toolchain rather than in
    /// the protocol being checked
    pub fn is_defect(self) -> bool {
        matches!(self, ErrorKind::GraphConstructionInvariantViolation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnresolvedSubprotocol => "UnresolvedSubprotocol",
            ErrorKind::NonTerminatingInlining => "NonTerminatingInlining",
            ErrorKind::RoleNotEnabled => "RoleNotEnabled",
            ErrorKind::InconsistentExternalChoice => "InconsistentExternalChoice",
            ErrorKind::UnusedRole => "UnusedRole",
            ErrorKind::VacuousRecursion => "VacuousRecursion",
            ErrorKind::UnreachableBranch => "UnreachableBranch",
            ErrorKind::GraphConstructionInvariantViolation => {
                "GraphConstructionInvariantViolation"
            }
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common reporting interface of the per-stage error types
pub trait Diagnostic: std::error::Error + Send + Sync + 'static {
    /// Cause tag
    fn kind(&self) -> ErrorKind;

    /// Roles implicated in the failure, if any
    fn roles(&self) -> Vec<Role> {
        Vec::new()
    }
}
