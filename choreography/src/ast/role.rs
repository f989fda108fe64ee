//! Role definitions for choreographic protocols

use super::name::name_type;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

name_type! {
    /// A role (participant) in the choreography
    ///
    /// Roles are compared by name. The front end resolves every role to its
    /// canonical declared name before handing a protocol to this crate.
    ///
    /// # Examples
    ///
    /// ```
    /// use rumpsteak_choreography::Role;
    ///
    /// let client = Role::new("Client");
    /// assert_eq!(client, Role::from("Client"));
    /// ```
    Role
}

/// An ordered, deduplicated list of roles as declared by a protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleList(Vec<Role>);

impl RoleList {
    /// Build a role list, keeping the first occurrence of each role
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut list = Vec::new();
        for role in roles {
            if !list.contains(&role) {
                list.push(role);
            }
        }
        RoleList(list)
    }

    /// Whether the list contains `role`
    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    /// Iterate the roles in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Role> {
        self.0.iter()
    }

    /// Number of declared roles
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no role is declared
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The roles as a slice
    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a RoleList {
    type Item = &'a Role;
    type IntoIter = std::slice::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Role> for RoleList {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        RoleList::new(iter)
    }
}

/// Format a list of roles as `A, B, C`
pub(crate) fn join_roles(f: &mut Formatter<'_>, roles: &[Role]) -> std::fmt::Result {
    let mut roles = roles.iter();
    if let Some(role) = roles.next() {
        Display::fmt(role, f)?;
        for role in roles {
            write!(f, ", {role}")?;
        }
    }
    Ok(())
}
