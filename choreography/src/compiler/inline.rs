// Subprotocol inlining: eliminate `do` by substitution-based expansion

use crate::ast::{
    Arg, GProtocol, GType, ProtocolName, ProtocolSet, RecVar, Role, SessionType, SubprotoSig,
    SubstitutionError, Substitutions,
};
use crate::error::{Diagnostic, ErrorKind};
use tracing::{debug, trace};

/// Default bound on the depth of nested expansions
pub const DEFAULT_MAX_INLINING_DEPTH: usize = 256;

/// Inline every subprotocol call of the protocol `name`
pub fn inline(
    protocols: &ProtocolSet,
    name: &ProtocolName,
    max_depth: usize,
) -> Result<GType, InlineError> {
    let protocol = protocols
        .get(name)
        .ok_or_else(|| InlineError::UnknownProtocol {
            proto: name.clone(),
        })?;
    Inliner::new(protocols, max_depth).inline_protocol(protocol)
}

/// Errors that can occur during inlining
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InlineError {
    #[error("Unknown protocol {proto}")]
    UnknownProtocol { proto: ProtocolName },

    #[error("Call to {call} does not match the declaration of {proto}: {source}")]
    BadArguments {
        proto: ProtocolName,
        call: String,
        source: SubstitutionError,
    },

    #[error("Subprotocol expansion exceeded depth {depth} at {call}")]
    DepthExceeded { depth: usize, call: String },

    #[error("Call to {call} loops back on itself without performing any action")]
    UnproductiveCycle { call: String, roles: Vec<Role> },
}

impl Diagnostic for InlineError {
    fn kind(&self) -> ErrorKind {
        match self {
            InlineError::UnknownProtocol { .. } | InlineError::BadArguments { .. } => {
                ErrorKind::UnresolvedSubprotocol
            }
            InlineError::DepthExceeded { .. } | InlineError::UnproductiveCycle { .. } => {
                ErrorKind::NonTerminatingInlining
            }
        }
    }

    fn roles(&self) -> Vec<Role> {
        match self {
            InlineError::UnproductiveCycle { roles, .. } => roles.clone(),
            _ => Vec::new(),
        }
    }
}

/// Expansion state for inlining one protocol
///
/// The stack holds the signatures being expanded. Meeting a signature that
/// is already on the stack closes a loop: it becomes a `continue` to the
/// recursion wrapping that signature's expansion.
pub struct Inliner<'a> {
    protocols: &'a ProtocolSet,
    max_depth: usize,
    stack: Vec<SubprotoSig>,
}

impl<'a> Inliner<'a> {
    pub fn new(protocols: &'a ProtocolSet, max_depth: usize) -> Self {
        Inliner {
            protocols,
            max_depth,
            stack: Vec::new(),
        }
    }

    /// Inline the body of `protocol`, a root of the expansion
    pub fn inline_protocol(&mut self, protocol: &GProtocol) -> Result<GType, InlineError> {
        let sig = protocol.sig();
        debug!(protocol = %protocol.name, "Inlining");

        self.stack.clear();
        let body = self.expand(sig, &protocol.body, &Substitutions::identity(), None)?;

        trace!(protocol = %protocol.name, inlined = %body, "Inlined");
        Ok(body)
    }

    /// Expand the body of `sig` under `subs`, wrapping it in the recursion
    /// minted for `sig`
    fn expand(
        &mut self,
        sig: SubprotoSig,
        body: &GType,
        subs: &Substitutions,
        scope: Option<&RecVar>,
    ) -> Result<GType, InlineError> {
        let var = sig.rec_var();
        self.stack.push(sig);
        let result = self.inline_type(body, subs, scope);
        let sig = self.stack.pop();
        let body = result?;

        if !body.free_rec_vars().contains(&var) {
            return Ok(body);
        }
        if !body.has_actions() {
            let (call, roles) = sig
                .map(|sig| (sig.to_string(), sig.roles))
                .unwrap_or_default();
            return Err(InlineError::UnproductiveCycle { call, roles });
        }
        Ok(GType::rec(var, body))
    }

    fn inline_type(
        &mut self,
        ty: &GType,
        subs: &Substitutions,
        scope: Option<&RecVar>,
    ) -> Result<GType, InlineError> {
        match ty {
            GType::Do {
                proto, roles, args, ..
            } => self.inline_do(proto, roles, args, subs),

            GType::Recursion { var, body, source } => Ok(GType::Recursion {
                var: rename(var, scope),
                body: Box::new(self.inline_type(body, subs, scope)?),
                source: *source,
            }),

            GType::Continue { var, source } => Ok(GType::Continue {
                var: rename(var, scope),
                source: *source,
            }),

            GType::MessageTransfer { .. } => Ok(ty.substitute(subs)),

            GType::Choice { subj, blocks, source } => Ok(GType::Choice {
                subj: subs.role(subj),
                blocks: blocks
                    .iter()
                    .map(|block| self.inline_type(block, subs, scope))
                    .collect::<Result<_, _>>()?,
                source: *source,
            }),

            GType::Seq(elems) => Ok(GType::Seq(
                elems
                    .iter()
                    .map(|elem| self.inline_type(elem, subs, scope))
                    .collect::<Result<_, _>>()?,
            )),

            GType::Skip => Ok(GType::Skip),
        }
    }

    fn inline_do(
        &mut self,
        proto: &ProtocolName,
        roles: &[Role],
        args: &[Arg],
        subs: &Substitutions,
    ) -> Result<GType, InlineError> {
        let sig = SubprotoSig {
            proto: proto.clone(),
            roles: roles.iter().map(|role| subs.role(role)).collect(),
            args: args.iter().map(|arg| arg.substitute(subs)).collect(),
        };

        if self.stack.contains(&sig) {
            trace!(call = %sig, "Closing subprotocol loop");
            return Ok(GType::cont(sig.rec_var()));
        }
        if self.stack.len() >= self.max_depth {
            return Err(InlineError::DepthExceeded {
                depth: self.max_depth,
                call: sig.to_string(),
            });
        }

        let callee = self
            .protocols
            .get(proto)
            .ok_or_else(|| InlineError::UnknownProtocol {
                proto: proto.clone(),
            })?;
        let callee_subs = Substitutions::new(
            callee.roles.as_slice(),
            &sig.roles,
            &callee.params,
            &sig.args,
        )
        .map_err(|source| InlineError::BadArguments {
            proto: proto.clone(),
            call: sig.to_string(),
            source,
        })?;

        trace!(call = %sig, depth = self.stack.len(), "Expanding call");
        let var = sig.rec_var();
        self.expand(sig, &callee.body, &callee_subs, Some(&var))
    }
}

/// Qualify a callee's recursion variable by the call it was expanded for.
/// Variables of the root protocol keep their names.
fn rename(var: &RecVar, scope: Option<&RecVar>) -> RecVar {
    match scope {
        Some(scope) => var.qualified_by(scope),
        None => var.clone(),
    }
}
