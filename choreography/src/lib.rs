//! Multiparty session types for Rumpsteak
//!
//! This crate provides the protocol type model and its compile-time
//! pipeline: global protocols are inlined, checked for well-formedness and
//! projected onto each role, yielding the local types from which endpoint
//! automata are built (see `rumpsteak-fsm`).

pub mod ast;
pub mod compiler;
pub mod error;

// Re-export main APIs
pub use ast::{
    Arg, DataType, GProtocol, GType, LType, Message, MessageSig, MessageSigName, NonRoleParam,
    Op, Payload, PayloadElem, ProtocolName, ProtocolSet, RecVar, Role, RoleList, SessionType,
    Source, SubprotoSig, Substitutions,
};
pub use compiler::{
    check_ext_choice_consistency, check_reachability, check_role_enabling, inline, project,
    project_all, unfold, unfold_all_once, Enablers, Enabling, InlineError, ProjectionError,
    ReachabilityError, RoleEnablingMode, WellFormednessError, DEFAULT_MAX_INLINING_DEPTH,
};
pub use error::{Diagnostic, ErrorKind};
