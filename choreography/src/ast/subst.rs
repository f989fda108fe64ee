//! Substitution of roles and non-role parameters

use super::message::{Arg, Message, NonRoleParam};
use super::name::{DataType, MessageSigName};
use super::role::Role;
use std::collections::HashMap;

/// Errors raised while pairing formal parameters with actual arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubstitutionError {
    #[error("expected {expected} role argument(s), found {found}")]
    RoleArity { expected: usize, found: usize },

    #[error("expected {expected} non-role argument(s), found {found}")]
    ArgArity { expected: usize, found: usize },

    #[error("argument `{arg}` does not fit parameter `{param}`")]
    ArgKind { param: NonRoleParam, arg: Arg },
}

/// A role map plus a non-role argument map.
///
/// Names absent from the maps are left unchanged, so the empty substitution
/// is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    roles: HashMap<Role, Role>,
    data: HashMap<DataType, DataType>,
    sigs: HashMap<MessageSigName, Message>,
}

impl Substitutions {
    /// The identity substitution
    pub fn identity() -> Self {
        Self::default()
    }

    /// Pair a declaration's formals with a call site's actuals
    pub fn new(
        formal_roles: &[Role],
        actual_roles: &[Role],
        params: &[NonRoleParam],
        args: &[Arg],
    ) -> Result<Self, SubstitutionError> {
        if formal_roles.len() != actual_roles.len() {
            return Err(SubstitutionError::RoleArity {
                expected: formal_roles.len(),
                found: actual_roles.len(),
            });
        }
        if params.len() != args.len() {
            return Err(SubstitutionError::ArgArity {
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut subs = Self::default();
        for (formal, actual) in formal_roles.iter().zip(actual_roles) {
            subs.roles.insert(formal.clone(), actual.clone());
        }

        for (param, arg) in params.iter().zip(args) {
            match (param, arg) {
                (NonRoleParam::Type(name), Arg::Data(data)) => {
                    subs.data.insert(name.clone(), data.clone());
                }
                (NonRoleParam::Sig(name), Arg::Sig(sig)) => {
                    subs.sigs.insert(name.clone(), Message::Sig(sig.clone()));
                }
                (NonRoleParam::Sig(name), Arg::SigName(actual)) => {
                    subs.sigs.insert(name.clone(), Message::Param(actual.clone()));
                }
                (param, arg) => {
                    return Err(SubstitutionError::ArgKind {
                        param: param.clone(),
                        arg: arg.clone(),
                    })
                }
            }
        }

        Ok(subs)
    }

    /// Substitution renaming roles only
    pub fn roles(pairs: impl IntoIterator<Item = (Role, Role)>) -> Self {
        Substitutions {
            roles: pairs.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether this substitution changes nothing
    pub fn is_identity(&self) -> bool {
        self.roles.iter().all(|(from, to)| from == to)
            && self.data.iter().all(|(from, to)| from == to)
            && self
                .sigs
                .iter()
                .all(|(from, to)| matches!(to, Message::Param(name) if name == from))
    }

    /// Image of a role
    pub fn role(&self, role: &Role) -> Role {
        self.roles.get(role).unwrap_or(role).clone()
    }

    /// Image of a data type name
    pub fn data_type(&self, data: &DataType) -> DataType {
        self.data.get(data).unwrap_or(data).clone()
    }

    /// Image of a `sig` parameter
    pub fn message(&self, name: &MessageSigName) -> Message {
        self.sigs
            .get(name)
            .cloned()
            .unwrap_or_else(|| Message::Param(name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MessageSig, Payload};
    use assert_matches::assert_matches;

    #[test]
    fn test_pairs_formals_with_actuals() {
        let subs = Substitutions::new(
            &[Role::new("X"), Role::new("Y")],
            &[Role::new("A"), Role::new("B")],
            &[
                NonRoleParam::Type(DataType::new("T")),
                NonRoleParam::Sig(MessageSigName::new("M")),
            ],
            &[
                Arg::Data(DataType::new("Int")),
                Arg::Sig(MessageSig::new("Ping", Payload::empty())),
            ],
        )
        .unwrap();

        assert_eq!(subs.role(&Role::new("Y")), Role::new("B"));
        assert_eq!(subs.role(&Role::new("Z")), Role::new("Z"));
        assert_eq!(subs.data_type(&DataType::new("T")), DataType::new("Int"));
        assert_eq!(
            subs.message(&MessageSigName::new("M")).to_string(),
            "Ping()"
        );
        assert!(!subs.is_identity());
    }

    #[test]
    fn test_rejects_arity_mismatch() {
        let err = Substitutions::new(&[Role::new("X")], &[], &[], &[]).unwrap_err();
        assert_matches!(err, SubstitutionError::RoleArity { expected: 1, found: 0 });

        let err = Substitutions::new(
            &[],
            &[],
            &[NonRoleParam::Type(DataType::new("T"))],
            &[Arg::Sig(MessageSig::label("Ping"))],
        )
        .unwrap_err();
        assert_matches!(err, SubstitutionError::ArgKind { .. });
    }
}
