//! Endpoint automata built from local types

use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use rumpsteak_choreography::{Message, RecVar, Role};
use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display, Formatter};

/// Handle of a state in an [`EGraph`]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateIndex(NodeIndex);

impl StateIndex {
    pub(crate) fn new(index: NodeIndex) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0.index()
    }

    pub(crate) fn node(self) -> NodeIndex {
        self.0
    }
}

impl Debug for StateIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.index())
    }
}

/// A state of an endpoint automaton.
///
/// Identity is by allocation: two states with equal labels are still
/// distinct states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EState {
    labels: BTreeSet<RecVar>,
}

impl EState {
    /// Recursion variables whose entry this state is
    pub fn labels(&self) -> &BTreeSet<RecVar> {
        &self.labels
    }

    pub(crate) fn add_label(&mut self, var: RecVar) {
        self.labels.insert(var);
    }
}

/// A communication action labelling an automaton edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EAction {
    /// `peer!msg`
    Send { peer: Role, msg: Message },
    /// `peer?msg`
    Receive { peer: Role, msg: Message },
}

impl EAction {
    pub fn peer(&self) -> &Role {
        match self {
            EAction::Send { peer, .. } | EAction::Receive { peer, .. } => peer,
        }
    }

    pub fn msg(&self) -> &Message {
        match self {
            EAction::Send { msg, .. } | EAction::Receive { msg, .. } => msg,
        }
    }

    pub fn is_send(&self) -> bool {
        matches!(self, EAction::Send { .. })
    }
}

impl Display for EAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EAction::Send { peer, msg } => write!(f, "{peer}!{msg}"),
            EAction::Receive { peer, msg } => write!(f, "{peer}?{msg}"),
        }
    }
}

/// Outgoing edges of `node` in the order they were added
pub(crate) fn outgoing<N, E>(graph: &Graph<N, E>, node: NodeIndex) -> Vec<(&E, NodeIndex)> {
    // petgraph walks a node's edge list newest first
    let mut edges: Vec<_> = graph
        .edges(node)
        .map(|edge| (edge.weight(), edge.target()))
        .collect();
    edges.reverse();
    edges
}

/// A finalised endpoint automaton.
///
/// Every state is reachable from the entry. The terminal state is absent
/// when the endpoint never completes.
#[derive(Debug, Clone)]
pub struct EGraph {
    graph: Graph<EState, EAction>,
    entry: StateIndex,
    terminal: Option<StateIndex>,
}

impl EGraph {
    pub(crate) fn new(
        graph: Graph<EState, EAction>,
        entry: StateIndex,
        terminal: Option<StateIndex>,
    ) -> Self {
        Self {
            graph,
            entry,
            terminal,
        }
    }

    pub fn entry(&self) -> StateIndex {
        self.entry
    }

    pub fn terminal(&self) -> Option<StateIndex> {
        self.terminal
    }

    pub fn is_terminal(&self, state: StateIndex) -> bool {
        self.terminal == Some(state)
    }

    /// Recursion labels of `state`
    pub fn labels(&self, state: StateIndex) -> &BTreeSet<RecVar> {
        self.graph[state.node()].labels()
    }

    /// States reachable from the entry, depth first
    pub fn states(&self) -> Vec<StateIndex> {
        let mut dfs = Dfs::new(&self.graph, self.entry.node());
        let mut states = Vec::new();
        while let Some(node) = dfs.next(&self.graph) {
            states.push(StateIndex::new(node));
        }
        states
    }

    /// Outgoing `(action, successor)` edges of `state`, in construction order
    pub fn edges_from(&self, state: StateIndex) -> Vec<(&EAction, StateIndex)> {
        outgoing(&self.graph, state.node())
            .into_iter()
            .map(|(action, target)| (action, StateIndex::new(target)))
            .collect()
    }

    /// Every edge as `(from, to, action)`
    pub fn transitions(&self) -> impl Iterator<Item = (StateIndex, StateIndex, &EAction)> {
        self.graph.edge_references().map(|edge| {
            (
                StateIndex::new(edge.source()),
                StateIndex::new(edge.target()),
                edge.weight(),
            )
        })
    }

    /// Number of states and edges
    pub fn size(&self) -> (usize, usize) {
        (self.graph.node_count(), self.graph.edge_count())
    }
}
