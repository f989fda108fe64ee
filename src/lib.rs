//! Multiparty protocol pipeline for Rumpsteak
//!
//! A [`Job`] checks a module of global protocols and turns each of them into
//! per-role endpoint automata:
//!
//! 1. subprotocol calls are inlined
//! 2. the result is checked for well-formedness (unused roles, external
//!    choice consistency, role enabling)
//! 3. it is projected onto every declared role
//! 4. global and local types are checked for reachability
//! 5. an [`EGraph`](fsm::EGraph) is built for every local type
//!
//! ```
//! use rumpsteak_protocol::choreography::{
//!     GProtocol, GType, MessageSig, ProtocolName, ProtocolSet, Role,
//! };
//! use rumpsteak_protocol::{Job, JobConfig};
//!
//! let body = GType::transfer("A", MessageSig::label("Ping"), ["B"]);
//! let protocols: ProtocolSet = [GProtocol::new("PingPong", ["A", "B"], body)]
//!     .into_iter()
//!     .collect();
//!
//! let artifacts = Job::new(protocols, JobConfig::default()).run().unwrap();
//! let graph = artifacts[&ProtocolName::new("PingPong")].graph(&Role::new("B")).unwrap();
//! assert_eq!(graph.size(), (2, 1));
//! ```

pub mod config;
pub mod error;
pub mod job;

pub use rumpsteak_choreography as choreography;
pub use rumpsteak_fsm as fsm;

pub use config::{JobConfig, UnusedRolePolicy};
pub use error::{JobError, UnusedRoleError};
pub use job::{Job, ProtocolArtifacts};
