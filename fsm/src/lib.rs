//! Endpoint automata for Rumpsteak protocols
//!
//! Each local type produced by `rumpsteak-choreography` is turned into an
//! [`EGraph`]: states joined by send and receive actions, with recursion
//! realised as cycles. Graphs can be exported to DOT with [`Dot`].

mod builder;
pub mod dot;
mod egraph;
pub mod scope;

pub use builder::{build_egraph, EGraphBuilder, GraphError, ToEGraph};
pub use dot::Dot;
pub use egraph::{EAction, EGraph, EState, StateIndex};
pub use scope::EnactingScopes;
