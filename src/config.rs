//! Job configuration

use rumpsteak_choreography::{RoleEnablingMode, DEFAULT_MAX_INLINING_DEPTH};
use serde::{Deserialize, Serialize};

/// What to do with declared roles that never act
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnusedRolePolicy {
    /// Fail the protocol with `UnusedRole`
    #[default]
    Error,
    /// Log a warning and carry on
    Warn,
}

/// Knobs of a [`Job`](crate::Job).
///
/// Every field has a default, so a partial document deserialises:
///
/// ```
/// use rumpsteak_protocol::{JobConfig, UnusedRolePolicy};
///
/// let config: JobConfig = serde_json::from_str(r#"{ "unused_roles": "warn" }"#).unwrap();
/// assert_eq!(config.unused_roles, UnusedRolePolicy::Warn);
/// assert_eq!(config.max_inlining_depth, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub unused_roles: UnusedRolePolicy,
    pub role_enabling: RoleEnablingMode,
    /// Bound on nested subprotocol expansions
    pub max_inlining_depth: usize,
    pub check_reachability: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            unused_roles: UnusedRolePolicy::default(),
            role_enabling: RoleEnablingMode::default(),
            max_inlining_depth: DEFAULT_MAX_INLINING_DEPTH,
            check_reachability: true,
        }
    }
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unused_roles(mut self, policy: UnusedRolePolicy) -> Self {
        self.unused_roles = policy;
        self
    }

    pub fn role_enabling(mut self, mode: RoleEnablingMode) -> Self {
        self.role_enabling = mode;
        self
    }

    pub fn max_inlining_depth(mut self, depth: usize) -> Self {
        self.max_inlining_depth = depth;
        self
    }

    pub fn check_reachability(mut self, enabled: bool) -> Self {
        self.check_reachability = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.unused_roles, UnusedRolePolicy::Error);
        assert_eq!(config.role_enabling, RoleEnablingMode::SessionStart);
        assert_eq!(config.max_inlining_depth, DEFAULT_MAX_INLINING_DEPTH);
        assert!(config.check_reachability);
    }

    #[test]
    fn test_setters() {
        let config = JobConfig::new()
            .unused_roles(UnusedRolePolicy::Warn)
            .role_enabling(RoleEnablingMode::AllDeclared)
            .max_inlining_depth(8)
            .check_reachability(false);
        assert_eq!(config.unused_roles, UnusedRolePolicy::Warn);
        assert_eq!(config.role_enabling, RoleEnablingMode::AllDeclared);
        assert_eq!(config.max_inlining_depth, 8);
        assert!(!config.check_reachability);
    }

    #[test]
    fn test_deserialize() {
        let config: JobConfig = serde_json::from_str(
            r#"{ "role_enabling": "all_declared", "check_reachability": false }"#,
        )
        .unwrap();
        assert_eq!(config.role_enabling, RoleEnablingMode::AllDeclared);
        assert!(!config.check_reachability);
        assert_eq!(config.unused_roles, UnusedRolePolicy::Error);

        let empty: JobConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, JobConfig::default());
    }
}
