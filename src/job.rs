//! Pipeline driver
//!
//! A [`Job`] takes every root protocol of a module through inlining,
//! validation, projection and automaton construction.

use crate::config::{JobConfig, UnusedRolePolicy};
use crate::error::{JobError, UnusedRoleError};
use rumpsteak_choreography::{
    check_ext_choice_consistency, check_reachability, check_role_enabling, inline, project_all,
    unfold_all_once, Enablers, Enabling, GType, InlineError, LType, ProtocolName, ProtocolSet,
    Role,
};
use rumpsteak_fsm::{EGraph, EGraphBuilder};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Everything produced for one protocol
#[derive(Debug, Clone)]
pub struct ProtocolArtifacts {
    pub protocol: ProtocolName,
    /// Body with every subprotocol call expanded
    pub inlined: GType,
    /// Local type of each declared role, in declaration order
    pub projections: Vec<(Role, LType)>,
    /// Automaton of each declared role, in declaration order
    pub graphs: Vec<(Role, EGraph)>,
}

impl ProtocolArtifacts {
    pub fn projection(&self, role: &Role) -> Option<&LType> {
        self.projections
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, ty)| ty)
    }

    pub fn graph(&self, role: &Role) -> Option<&EGraph> {
        self.graphs
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, graph)| graph)
    }
}

/// A module of protocols together with the configuration to check it with
#[derive(Debug, Clone)]
pub struct Job {
    protocols: ProtocolSet,
    config: JobConfig,
}

impl Job {
    pub fn new(protocols: ProtocolSet, config: JobConfig) -> Self {
        Self { protocols, config }
    }

    pub fn protocols(&self) -> &ProtocolSet {
        &self.protocols
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run every non-auxiliary protocol, stopping at the first failure
    pub fn run(&self) -> Result<BTreeMap<ProtocolName, ProtocolArtifacts>, JobError> {
        let mut artifacts = BTreeMap::new();
        for protocol in self.protocols.roots() {
            let result = self.run_protocol(&protocol.name)?;
            artifacts.insert(protocol.name.clone(), result);
        }
        Ok(artifacts)
    }

    /// Run every non-auxiliary protocol, collecting each outcome
    pub fn run_each(&self) -> BTreeMap<ProtocolName, Result<ProtocolArtifacts, JobError>> {
        self.protocols
            .roots()
            .map(|protocol| (protocol.name.clone(), self.run_protocol(&protocol.name)))
            .collect()
    }

    /// Run the whole pipeline for the protocol `name`
    pub fn run_protocol(&self, name: &ProtocolName) -> Result<ProtocolArtifacts, JobError> {
        let protocol = self.protocols.get(name).ok_or_else(|| {
            JobError::new(name, InlineError::UnknownProtocol { proto: name.clone() })
        })?;
        debug!(protocol = %name, roles = protocol.roles.len(), "Running protocol");

        let inlined = inline(&self.protocols, name, self.config.max_inlining_depth)
            .map_err(|error| JobError::new(name, error))?;
        trace!(protocol = %name, %inlined, "Inlined");

        let unused = protocol.unused_roles(&inlined);
        if !unused.is_empty() {
            match self.config.unused_roles {
                UnusedRolePolicy::Error => {
                    return Err(JobError::new(name, UnusedRoleError { roles: unused }));
                }
                UnusedRolePolicy::Warn => {
                    for role in &unused {
                        warn!(protocol = %name, %role, "Role is declared but never used");
                    }
                }
            }
        }

        check_ext_choice_consistency(&inlined, Enablers::new())
            .map_err(|error| JobError::new(name, error))?;

        let initial = Enabling::initial(self.config.role_enabling, &protocol.roles);
        check_role_enabling(&unfold_all_once(&inlined), initial)
            .map_err(|error| JobError::new(name, error))?;
        trace!(protocol = %name, "Well-formed");

        let projections = project_all(&inlined, &protocol.roles)
            .map_err(|error| JobError::new(name, error))?;

        if self.config.check_reachability {
            check_reachability(&inlined).map_err(|error| JobError::new(name, error))?;
            for (role, local) in &projections {
                check_reachability(local)
                    .map_err(|error| JobError::new(name, error).for_role(role))?;
            }
        }

        let mut builder = EGraphBuilder::new();
        let mut graphs = Vec::with_capacity(projections.len());
        for (role, local) in &projections {
            trace!(protocol = %name, %role, %local, "Building endpoint graph");
            let graph = builder
                .build(local)
                .and_then(|()| builder.finalize())
                .map_err(|error| JobError::new(name, error).for_role(role))?;
            let (states, edges) = graph.size();
            debug!(protocol = %name, %role, states, edges, "Built endpoint graph");
            graphs.push((role.clone(), graph));
        }

        Ok(ProtocolArtifacts {
            protocol: name.clone(),
            inlined,
            projections,
            graphs,
        })
    }
}
