//! Job-level errors

use rumpsteak_choreography::{Diagnostic, ErrorKind, ProtocolName, Role};
use std::error::Error;

/// Declared roles that never act in the inlined body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unused roles: {}", join(.roles))]
pub struct UnusedRoleError {
    pub roles: Vec<Role>,
}

fn join(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

impl Diagnostic for UnusedRoleError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::UnusedRole
    }

    fn roles(&self) -> Vec<Role> {
        self.roles.clone()
    }
}

/// Failure of one protocol, tagged with its cause.
///
/// The stage error is kept as the source; use [`JobError::downcast_ref`] to
/// inspect it.
#[derive(Debug, thiserror::Error)]
#[error("Protocol {protocol} failed with {kind}: {source}")]
pub struct JobError {
    pub protocol: ProtocolName,
    pub kind: ErrorKind,
    /// Offending roles, in the order the stage reported them
    pub roles: Vec<Role>,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl JobError {
    pub fn new<E: Diagnostic>(protocol: &ProtocolName, error: E) -> Self {
        Self {
            protocol: protocol.clone(),
            kind: error.kind(),
            roles: error.roles(),
            source: Box::new(error),
        }
    }

    /// Attribute the failure to `role` as well
    pub(crate) fn for_role(mut self, role: &Role) -> Self {
        if !self.roles.contains(role) {
            self.roles.push(role.clone());
        }
        self
    }

    /// Whether this is a defect of the toolchain rather than of the protocol
    pub fn is_defect(&self) -> bool {
        self.kind.is_defect()
    }

    /// The stage error, if it has type `E`
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref()
    }
}
