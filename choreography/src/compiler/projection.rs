// Projection from inlined global types to local session types

use crate::ast::{GType, LType, Message, ProtocolName, RecVar, Role, RoleList, SessionType};
use crate::error::{Diagnostic, ErrorKind};
use tracing::trace;

/// Project an inlined global type onto `role`
pub fn project(ty: &GType, role: &Role) -> Result<LType, ProjectionError> {
    let context = ProjectionContext::new(role);
    let local = context.project_type(ty)?;
    trace!(role = %role, local = %local, "Projected");
    Ok(local)
}

/// Project an inlined global type onto every role of `roles`, in order
pub fn project_all(ty: &GType, roles: &RoleList) -> Result<Vec<(Role, LType)>, ProjectionError> {
    roles
        .iter()
        .map(|role| Ok((role.clone(), project(ty, role)?)))
        .collect()
}

/// Errors that can occur during projection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Cannot project call to {proto} onto role {role}: inline first")]
    UnexpectedDo { proto: ProtocolName, role: Role },
}

impl Diagnostic for ProjectionError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::GraphConstructionInvariantViolation
    }

    fn roles(&self) -> Vec<Role> {
        match self {
            ProjectionError::UnexpectedDo { role, .. } => vec![role.clone()],
        }
    }
}

/// Context for projection algorithm
struct ProjectionContext<'a> {
    role: &'a Role,
}

impl<'a> ProjectionContext<'a> {
    fn new(role: &'a Role) -> Self {
        ProjectionContext { role }
    }

    fn project_type(&self, ty: &GType) -> Result<LType, ProjectionError> {
        match ty {
            GType::MessageTransfer {
                src,
                msg,
                dsts,
                source,
            } => Ok(self.project_transfer(src, msg, dsts).at(*source)),

            GType::Choice { subj, blocks, source } => {
                Ok(self.project_choice(subj, blocks)?.at(*source))
            }

            GType::Recursion { var, body, source } => {
                Ok(self.project_recursion(var, body)?.at(*source))
            }

            GType::Continue { var, source } => Ok(LType::cont(var.clone()).at(*source)),

            GType::Do { proto, .. } => Err(ProjectionError::UnexpectedDo {
                proto: proto.clone(),
                role: self.role.clone(),
            }),

            GType::Seq(elems) => Ok(LType::seq(
                elems
                    .iter()
                    .map(|elem| self.project_type(elem))
                    .collect::<Result<Vec<_>, _>>()?,
            )),

            GType::Skip => Ok(LType::Skip),
        }
    }

    /// Project a message transfer onto the local type for this role
    ///
    /// # Projection Rules
    /// - If `role == src`: Project to `Send(dsts, msg)`
    /// - If `role ∈ dsts`: Project to `Receive(src, msg)`
    /// - Otherwise: Project to `Skip` (uninvolved party)
    fn project_transfer(&self, src: &Role, msg: &Message, dsts: &[Role]) -> LType {
        if self.role == src {
            LType::send(dsts.iter().cloned(), msg.clone())
        } else if dsts.contains(self.role) {
            LType::receive(src.clone(), msg.clone())
        } else {
            LType::Skip
        }
    }

    /// Project a choice onto the local type for this role
    ///
    /// # Projection Rules
    /// - Blocks projecting to `Skip` are dropped, identical blocks merged
    /// - No block left: `Skip`; one block left: that block
    /// - If `role == subj`: an internal choice at `role`
    /// - Otherwise: an external choice at the first sender `role` receives
    ///   from, falling back to the global subject
    fn project_choice(&self, subj: &Role, blocks: &[GType]) -> Result<LType, ProjectionError> {
        let mut projected: Vec<LType> = Vec::new();
        for block in blocks {
            let local = self.project_type(block)?;
            if !local.is_skip() && !projected.contains(&local) {
                projected.push(local);
            }
        }

        if projected.len() <= 1 {
            return Ok(projected.pop().unwrap_or(LType::Skip));
        }

        let subj = if self.role == subj {
            subj.clone()
        } else {
            projected
                .iter()
                .find_map(first_sender)
                .unwrap_or(subj)
                .clone()
        };
        Ok(LType::choice(subj, projected))
    }

    /// Project a recursion onto the local type for this role
    ///
    /// # Projection Rules
    /// - Variable no longer continued: the projected body alone
    /// - Body performs no action: the loop is silent for this role, so its
    ///   `continue var` blocks are dropped and the rest is kept
    /// - Otherwise: `Recursion(var, body↓role)`
    fn project_recursion(&self, var: &RecVar, body: &GType) -> Result<LType, ProjectionError> {
        let body = self.project_type(body)?;

        if !body.free_rec_vars().contains(var) {
            return Ok(body);
        }
        if !body.has_actions() {
            return Ok(drop_silent_loop(body, var));
        }
        Ok(LType::rec(var.clone(), body))
    }
}

/// Remove every `continue var` from an action-free local type
fn drop_silent_loop(ty: LType, var: &RecVar) -> LType {
    match ty {
        LType::Continue { var: target, .. } if &target == var => LType::Skip,

        LType::Choice { subj, blocks, source } => {
            let mut kept: Vec<LType> = Vec::new();
            for block in blocks {
                let block = drop_silent_loop(block, var);
                if !block.is_skip() && !kept.contains(&block) {
                    kept.push(block);
                }
            }
            if kept.len() <= 1 {
                return kept.pop().unwrap_or(LType::Skip);
            }
            LType::choice(subj, kept).at(source)
        }

        LType::Seq(elems) => LType::seq(elems.into_iter().map(|elem| drop_silent_loop(elem, var))),

        LType::Recursion { var: inner, body, source } => {
            // Shadowed: inner continues refer to the inner binder
            let body = if &inner == var {
                *body
            } else {
                drop_silent_loop(*body, var)
            };
            LType::rec(inner, body).at(source)
        }

        ty => ty,
    }
}

/// The peer of the first receive reachable without passing another action
fn first_sender(ty: &LType) -> Option<&Role> {
    match ty {
        LType::Receive { peer, .. } => Some(peer),
        LType::Seq(elems) => elems.first().and_then(first_sender),
        LType::Recursion { body, .. } => first_sender(body),
        LType::Choice { blocks, .. } => blocks.iter().find_map(first_sender),
        LType::Send { .. } | LType::Continue { .. } | LType::Skip => None,
    }
}
