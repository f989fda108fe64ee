// Well-formedness of inlined global types: role enabling and external
// choice consistency

use crate::ast::{GType, ProtocolName, Role, RoleList};
use crate::error::{Diagnostic, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Which roles are enabled before the first interaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleEnablingMode {
    /// The participants of the first interaction are enabled by fiat
    #[default]
    SessionStart,
    /// Every declared role starts enabled
    AllDeclared,
}

/// Errors that can occur during well-formedness checking
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WellFormednessError {
    #[error("Role {role} is not enabled at `{action}`")]
    RoleNotEnabled { role: Role, action: String },

    #[error("Inconsistent external choice subjects for {receiver}: {}", format_senders(.senders))]
    InconsistentExternalChoice { receiver: Role, senders: Vec<Role> },

    #[error("Unexpected call to {proto} in an inlined type")]
    UnexpectedDo { proto: ProtocolName },
}

fn format_senders(senders: &[Role]) -> String {
    senders
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Diagnostic for WellFormednessError {
    fn kind(&self) -> ErrorKind {
        match self {
            WellFormednessError::RoleNotEnabled { .. } => ErrorKind::RoleNotEnabled,
            WellFormednessError::InconsistentExternalChoice { .. } => {
                ErrorKind::InconsistentExternalChoice
            }
            WellFormednessError::UnexpectedDo { .. } => {
                ErrorKind::GraphConstructionInvariantViolation
            }
        }
    }

    fn roles(&self) -> Vec<Role> {
        match self {
            WellFormednessError::RoleNotEnabled { role, .. } => vec![role.clone()],
            WellFormednessError::InconsistentExternalChoice { receiver, senders } => {
                let mut roles = vec![receiver.clone()];
                roles.extend(senders.iter().cloned());
                roles
            }
            WellFormednessError::UnexpectedDo { .. } => Vec::new(),
        }
    }
}

/// The enabled roles at some point of a global type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enabling {
    enabled: BTreeSet<Role>,
    started: bool,
}

impl Enabling {
    /// Nothing enabled; the first interaction enables its participants
    pub fn session_start() -> Self {
        Self::default()
    }

    /// Every role of `roles` enabled
    pub fn all(roles: &RoleList) -> Self {
        Enabling {
            enabled: roles.iter().cloned().collect(),
            started: true,
        }
    }

    /// Start of a choice block: only the subject is enabled
    pub fn block(subj: &Role) -> Self {
        Enabling {
            enabled: BTreeSet::from([subj.clone()]),
            started: true,
        }
    }

    /// Initial state for `mode`
    pub fn initial(mode: RoleEnablingMode, roles: &RoleList) -> Self {
        match mode {
            RoleEnablingMode::SessionStart => Self::session_start(),
            RoleEnablingMode::AllDeclared => Self::all(roles),
        }
    }

    pub fn is_enabled(&self, role: &Role) -> bool {
        self.enabled.contains(role)
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.enabled
    }

    fn start(&mut self, roles: impl IntoIterator<Item = Role>) {
        if !self.started {
            self.enabled.extend(roles);
            self.started = true;
        }
    }
}

/// Check that every role acts only once enabled. Returns the enabled roles
/// after `ty`.
///
/// # Enabling Rules
/// - A transfer requires its sender enabled, then enables every receiver
/// - A choice requires its subject enabled. Each block starts with only the
///   subject enabled; afterwards the roles enabled by every block are added
/// - Recursions are transparent and continues change nothing
pub fn check_role_enabling(ty: &GType, before: Enabling) -> Result<Enabling, WellFormednessError> {
    match ty {
        GType::MessageTransfer { src, dsts, .. } => {
            let mut after = before;
            after.start(std::iter::once(src.clone()).chain(dsts.iter().cloned()));
            if !after.is_enabled(src) {
                return Err(WellFormednessError::RoleNotEnabled {
                    role: src.clone(),
                    action: ty.to_string(),
                });
            }
            after.enabled.extend(dsts.iter().cloned());
            Ok(after)
        }

        GType::Choice { subj, blocks, .. } => {
            let mut after = before;
            after.start([subj.clone()]);
            if !after.is_enabled(subj) {
                return Err(WellFormednessError::RoleNotEnabled {
                    role: subj.clone(),
                    action: format!("choice at {subj}"),
                });
            }

            let mut common: Option<BTreeSet<Role>> = None;
            for block in blocks {
                let post = check_role_enabling(block, Enabling::block(subj))?.enabled;
                common = Some(match common {
                    None => post,
                    Some(common) => common.intersection(&post).cloned().collect(),
                });
            }
            after.enabled.extend(common.unwrap_or_default());
            Ok(after)
        }

        GType::Recursion { body, .. } => check_role_enabling(body, before),

        GType::Continue { .. } | GType::Skip => Ok(before),

        GType::Seq(elems) => elems
            .iter()
            .try_fold(before, |enabling, elem| check_role_enabling(elem, enabling)),

        GType::Do { proto, .. } => Err(WellFormednessError::UnexpectedDo {
            proto: proto.clone(),
        }),
    }
}

/// Receiver to the sender it first observed
pub type Enablers = BTreeMap<Role, Role>;

/// Check that the receivers of each choice observe a single sender across
/// all blocks. Returns the resolved enablers after `ty`.
///
/// Inside a block the subject enables itself and every receiver is mapped
/// to the first role it receives from. Block resolutions are merged into
/// the outer map, keeping the first resolution seen.
pub fn check_ext_choice_consistency(
    ty: &GType,
    enablers: Enablers,
) -> Result<Enablers, WellFormednessError> {
    match ty {
        GType::MessageTransfer { src, dsts, .. } => {
            let mut after = enablers;
            for dst in dsts {
                after.entry(dst.clone()).or_insert_with(|| src.clone());
            }
            Ok(after)
        }

        GType::Choice { subj, blocks, .. } => {
            let initial = Enablers::from([(subj.clone(), subj.clone())]);
            let resolved = blocks
                .iter()
                .map(|block| check_ext_choice_consistency(block, initial.clone()))
                .collect::<Result<Vec<_>, _>>()?;

            let mut observed: BTreeMap<&Role, BTreeSet<&Role>> = BTreeMap::new();
            for (receiver, sender) in resolved.iter().flatten() {
                observed.entry(receiver).or_default().insert(sender);
            }
            if let Some((receiver, senders)) =
                observed.into_iter().find(|(_, senders)| senders.len() > 1)
            {
                return Err(WellFormednessError::InconsistentExternalChoice {
                    receiver: receiver.clone(),
                    senders: senders.into_iter().cloned().collect(),
                });
            }

            let mut after = enablers;
            for (receiver, sender) in resolved.into_iter().flatten() {
                after.entry(receiver).or_insert(sender);
            }
            trace!(subject = %subj, enablers = ?after, "Choice consistent");
            Ok(after)
        }

        GType::Recursion { body, .. } => check_ext_choice_consistency(body, enablers),

        GType::Continue { .. } | GType::Skip => Ok(enablers),

        GType::Seq(elems) => elems
            .iter()
            .try_fold(enablers, |enablers, elem| check_ext_choice_consistency(elem, enablers)),

        GType::Do { proto, .. } => Err(WellFormednessError::UnexpectedDo {
            proto: proto.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arg, MessageSig};
    use assert_matches::assert_matches;

    fn m(op: &str) -> MessageSig {
        MessageSig::label(op)
    }

    fn roles(names: &[&str]) -> BTreeSet<Role> {
        names.iter().copied().map(Role::new).collect()
    }

    #[test]
    fn test_first_interaction_enables_by_fiat() {
        let ty = GType::seq([
            GType::transfer("A", m("M1"), ["B"]),
            GType::transfer("B", m("M2"), ["C"]),
        ]);
        let after = check_role_enabling(&ty, Enabling::session_start()).unwrap();
        assert_eq!(after.roles(), &roles(&["A", "B", "C"]));
    }

    #[test]
    fn test_sender_must_be_enabled() {
        let ty = GType::seq([
            GType::transfer("A", m("M1"), ["B"]),
            GType::transfer("C", m("M2"), ["A"]),
        ]);
        let err = check_role_enabling(&ty, Enabling::session_start()).unwrap_err();
        assert_matches!(err, WellFormednessError::RoleNotEnabled { ref role, .. } if role.as_str() == "C");
        assert_eq!(err.kind(), ErrorKind::RoleNotEnabled);
    }

    #[test]
    fn test_choice_block_starts_from_subject() {
        // B is enabled before the choice but not inside the block
        let ty = GType::seq([
            GType::transfer("A", m("M0"), ["B"]),
            GType::choice("A", [GType::transfer("B", m("M1"), ["A"])]),
        ]);
        let err = check_role_enabling(&ty, Enabling::session_start()).unwrap_err();
        assert_matches!(err, WellFormednessError::RoleNotEnabled { ref role, .. } if role.as_str() == "B");
    }

    #[test]
    fn test_choice_enables_intersection() {
        let ty = GType::choice(
            "A",
            [
                GType::seq([
                    GType::transfer("A", m("M1"), ["B"]),
                    GType::transfer("A", m("M2"), ["C"]),
                ]),
                GType::transfer("A", m("M3"), ["B"]),
            ],
        );
        let after = check_role_enabling(&ty, Enabling::all(&RoleList::new([Role::new("A")])))
            .unwrap();
        assert_eq!(after.roles(), &roles(&["A", "B"]));
    }

    #[test]
    fn test_all_declared_mode() {
        let declared = RoleList::new(["A", "B", "C"].map(Role::new));
        let ty = GType::transfer("C", m("M"), ["B"]);
        let start = Enabling::initial(RoleEnablingMode::AllDeclared, &declared);
        assert!(check_role_enabling(&ty, start).is_ok());
    }

    #[test]
    fn test_residual_do_is_invariant_violation() {
        let ty = GType::call("Sub", ["A"], Vec::<Arg>::new());
        let err = check_role_enabling(&ty, Enabling::session_start()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GraphConstructionInvariantViolation);
    }

    #[test]
    fn test_consistent_choice() {
        let ty = GType::choice(
            "A",
            [
                GType::transfer("A", m("M1"), ["B"]),
                GType::transfer("A", m("M2"), ["B"]),
            ],
        );
        let enablers = check_ext_choice_consistency(&ty, Enablers::new()).unwrap();
        assert_eq!(enablers.get(&Role::new("B")), Some(&Role::new("A")));
    }

    #[test]
    fn test_inconsistent_choice_names_receiver() {
        let ty = GType::choice(
            "A",
            [
                GType::transfer("A", m("M1"), ["B"]),
                GType::seq([
                    GType::transfer("A", m("M2"), ["C"]),
                    GType::transfer("C", m("M3"), ["B"]),
                ]),
            ],
        );
        let err = check_ext_choice_consistency(&ty, Enablers::new()).unwrap_err();
        assert_eq!(
            err,
            WellFormednessError::InconsistentExternalChoice {
                receiver: Role::new("B"),
                senders: vec![Role::new("A"), Role::new("C")],
            }
        );
        assert_eq!(
            err.to_string(),
            "Inconsistent external choice subjects for B: A, C"
        );
    }

    #[test]
    fn test_nested_choice_resolution_flows_outward() {
        let inner = GType::choice(
            "A",
            [
                GType::transfer("A", m("M1"), ["B"]),
                GType::transfer("A", m("M2"), ["B"]),
            ],
        );
        let ty = GType::choice(
            "A",
            [
                inner,
                GType::seq([
                    GType::transfer("A", m("M3"), ["C"]),
                    GType::transfer("C", m("M4"), ["B"]),
                ]),
            ],
        );
        let err = check_ext_choice_consistency(&ty, Enablers::new()).unwrap_err();
        assert_eq!(err.roles(), vec![Role::new("B"), Role::new("A"), Role::new("C")]);
    }
}
