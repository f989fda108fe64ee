//! DOT format export for endpoint automata.
//!
//! DOT files can be visualized using Graphviz tools.

use crate::egraph::EGraph;
use rumpsteak_choreography::Role;
use std::fmt::{self, Display, Formatter};

/// Wrapper for exporting the automaton of a role in DOT format.
///
/// The terminal state, if any, is drawn as a double circle.
///
/// # Example
///
/// ```rust
/// use rumpsteak_choreography::{LType, MessageSig, Role};
/// use rumpsteak_fsm::{build_egraph, Dot};
///
/// let ty = LType::send(["B"], MessageSig::label("M"));
/// let graph = build_egraph(&ty).unwrap();
/// let role = Role::new("A");
/// println!("{}", Dot::new(&role, &graph));
/// ```
pub struct Dot<'a> {
    role: &'a Role,
    graph: &'a EGraph,
}

impl<'a> Dot<'a> {
    /// Creates a new DOT exporter for the automaton of `role`.
    pub fn new(role: &'a Role, graph: &'a EGraph) -> Self {
        Self { role, graph }
    }
}

impl Display for Dot<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "digraph \"{}\" {{", self.role)?;
        let states = self.graph.states();
        let (_, transitions) = self.graph.size();

        if !states.is_empty() {
            writeln!(f)?;
        }

        for state in &states {
            if self.graph.is_terminal(*state) {
                writeln!(f, "    {} [shape=doublecircle];", state.index())?;
            } else {
                writeln!(f, "    {};", state.index())?;
            }
        }

        if transitions > 0 {
            writeln!(f)?;
        }

        for state in &states {
            for (action, to) in self.graph.edges_from(*state) {
                let (from, to) = (state.index(), to.index());
                writeln!(f, "    {} -> {} [label=\"{}\"];", from, to, action)?;
            }
        }

        write!(f, "}}")
    }
}
