// Reachability: no vacuous recursion, no dead behaviour

use crate::ast::{GType, LType, Message, RecVar, Role, SessionType, Shape};
use crate::error::{Diagnostic, ErrorKind};
use std::fmt::Display;

/// Errors that can occur during reachability checking
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReachabilityError {
    #[error("Recursion {var} is never continued")]
    UnusedRecursion { var: RecVar },

    #[error("Recursion {var} performs no action")]
    ActionlessRecursion { var: RecVar },

    #[error("`{element}` can never be reached")]
    DeadCode { element: String },

    #[error("Block `{block}` can never be selected: an earlier block also starts with `{msg} from {peer}`")]
    ShadowedBlock {
        block: String,
        peer: Role,
        msg: Message,
    },
}

impl Diagnostic for ReachabilityError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReachabilityError::UnusedRecursion { .. }
            | ReachabilityError::ActionlessRecursion { .. } => ErrorKind::VacuousRecursion,
            ReachabilityError::DeadCode { .. } | ReachabilityError::ShadowedBlock { .. } => {
                ErrorKind::UnreachableBranch
            }
        }
    }

    fn roles(&self) -> Vec<Role> {
        match self {
            ReachabilityError::ShadowedBlock { peer, .. } => vec![peer.clone()],
            _ => Vec::new(),
        }
    }
}

/// Types whose choice blocks may be dispatched on leading receives
pub trait LeadingReceive: SessionType + Display {
    /// The receives this type may start with, looking through choices
    fn leading_receives(&self) -> Vec<(&Role, &Message)> {
        Vec::new()
    }
}

impl LeadingReceive for GType {}

impl LeadingReceive for LType {
    fn leading_receives(&self) -> Vec<(&Role, &Message)> {
        match self.head() {
            LType::Receive { peer, msg, .. } => vec![(peer, msg)],
            LType::Recursion { body, .. } => body.leading_receives(),
            LType::Choice { blocks, .. } => {
                blocks.iter().flat_map(|block| block.leading_receives()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Check that every recursion loops and acts, and that every element and
/// choice block can be reached.
///
/// # Reachability Rules
/// - A recursion must continue its variable and perform some action
/// - Nothing may follow an element that never falls through (a `continue`,
///   or a loop without exit)
/// - No choice block may start with the same receive as an earlier block
pub fn check_reachability<T: LeadingReceive>(ty: &T) -> Result<(), ReachabilityError> {
    falls_through(ty).map(|_| ())
}

/// Check `ty`, returning whether control can leave it normally
fn falls_through<T: LeadingReceive>(ty: &T) -> Result<bool, ReachabilityError> {
    match ty.shape() {
        Shape::Action | Shape::Do | Shape::Skip => Ok(true),

        Shape::Continue(_) => Ok(false),

        Shape::Seq(elems) => {
            let mut live = true;
            for elem in elems.iter().filter(|elem| !elem.is_skip()) {
                if !live {
                    return Err(ReachabilityError::DeadCode {
                        element: elem.to_string(),
                    });
                }
                live = falls_through(elem)?;
            }
            Ok(live)
        }

        Shape::Choice(blocks) => {
            let mut heads: Vec<(&Role, &Message)> = Vec::new();
            let mut live = blocks.is_empty();
            for block in blocks {
                let leading = block.leading_receives();
                if let Some((peer, msg)) = leading.iter().find(|head| heads.contains(*head)) {
                    return Err(ReachabilityError::ShadowedBlock {
                        block: block.to_string(),
                        peer: (*peer).clone(),
                        msg: (*msg).clone(),
                    });
                }
                heads.extend(leading);
                live |= falls_through(block)?;
            }
            Ok(live)
        }

        Shape::Recursion(var, body) => {
            if !body.free_rec_vars().contains(var) {
                return Err(ReachabilityError::UnusedRecursion { var: var.clone() });
            }
            if !body.has_actions() {
                return Err(ReachabilityError::ActionlessRecursion { var: var.clone() });
            }
            falls_through(body)
        }
    }
}
