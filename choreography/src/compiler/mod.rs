//! Protocol compilation pipeline
//!
//! Passes over the type model, in pipeline order: inlining, unfolding,
//! well-formedness, projection and reachability.

pub mod inline;
pub mod projection;
pub mod reachability;
pub mod unfold;
pub mod wellformed;

pub use inline::*;
pub use projection::*;
pub use reachability::*;
pub use unfold::*;
pub use wellformed::*;
