//! Abstract Syntax Tree for multiparty protocols
//!
//! This module defines the protocol type model: global types, local
//! (projected) types, roles, messages and the declarations that bind them.
//! All trees are immutable values; every pass builds a new tree.

/// Global types
pub mod global;

/// Local types resulting from projection
pub mod local;

/// Message signatures and non-role arguments
pub mod message;

/// Interned names
pub mod name;

/// Protocol declarations and module context
pub mod protocol;

/// Role definitions
pub mod role;

/// Operations shared by global and local types
pub mod session;

/// Source positions
pub mod source;

/// Role and parameter substitution
pub mod subst;

/// Depth-first visitors
pub mod visit;

pub use global::*;
pub use local::*;
pub use message::*;
pub use name::{DataType, MessageSigName, Op, ProtocolName, RecVar};
pub use protocol::*;
pub use role::{Role, RoleList};
pub use session::*;
pub use source::*;
pub use subst::*;
pub use visit::*;
