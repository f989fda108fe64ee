//! Construction of endpoint automata from local types
//!
//! Building is two-phase. The traversal adds real action edges and, for
//! each unguarded `continue`, an intermediate edge to the recursion entry.
//! [`EGraphBuilder::finalize`] then copies the graph reachable from the
//! entry, replacing every intermediate edge by the enacting actions of its
//! recursion.

use crate::egraph::{outgoing, EAction, EGraph, EState, StateIndex};
use crate::scope::EnactingScopes;
use petgraph::graph::{Graph, NodeIndex};
use rumpsteak_choreography::{Diagnostic, ErrorKind, LType, Message, RecVar, Role, SessionType};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Errors that can occur while building an endpoint automaton
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Continue to unknown recursion variable {var}")]
    UnknownRecVar { var: RecVar },

    #[error("No enacting actions recorded for recursion {var}")]
    MissingEnacting { var: RecVar },
}

impl Diagnostic for GraphError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::GraphConstructionInvariantViolation
    }
}

/// Identity of one recursion node being built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScopeId(usize);

/// Edge of the graph under construction
#[derive(Debug, Clone, PartialEq, Eq)]
enum BuildEdge {
    Action(EAction),
    /// Placeholder for an unguarded `continue`, never present once finalised
    IntermediateContinue { var: RecVar, scope: ScopeId },
}

/// Builds one [`EGraph`] at a time.
///
/// Call [`build`](Self::build) once, then [`finalize`](Self::finalize),
/// which also resets the builder for the next local type. A builder holds
/// mutable traversal state and is not meant to be shared.
pub struct EGraphBuilder {
    graph: Graph<EState, BuildEdge>,
    entry: NodeIndex,
    exit: NodeIndex,
    rec_entries: HashMap<RecVar, Vec<(NodeIndex, ScopeId)>>,
    scopes: EnactingScopes<ScopeId, EAction>,
    next_scope: usize,
}

impl Default for EGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EGraphBuilder {
    pub fn new() -> Self {
        let mut graph = Graph::new();
        let entry = graph.add_node(EState::default());
        let exit = graph.add_node(EState::default());
        Self {
            graph,
            entry,
            exit,
            rec_entries: HashMap::new(),
            scopes: EnactingScopes::new(),
            next_scope: 0,
        }
    }

    /// Drop everything built so far, keeping allocations
    fn reset(&mut self) {
        self.graph.clear();
        self.entry = self.graph.add_node(EState::default());
        self.exit = self.graph.add_node(EState::default());
        self.rec_entries.clear();
        self.scopes.clear();
        self.next_scope = 0;
    }

    /// Add the behaviour of `ty` between the entry and exit states
    pub fn build(&mut self, ty: &LType) -> Result<(), GraphError> {
        if ty.is_skip() {
            // Nothing to do: the endpoint terminates immediately
            self.exit = self.entry;
            return Ok(());
        }
        let result = self.build_type(ty, self.entry, self.exit);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn new_state(&mut self) -> NodeIndex {
        self.graph.add_node(EState::default())
    }

    /// Add an action edge. The action counts as enacting even when a sibling
    /// block already added the same edge.
    fn add_action(&mut self, from: NodeIndex, action: EAction, to: NodeIndex) {
        self.scopes.record(&action);
        add_edge_once(&mut self.graph, from, BuildEdge::Action(action), to);
    }

    fn rec_entry(&self, var: &RecVar) -> Result<(NodeIndex, ScopeId), GraphError> {
        self.rec_entries
            .get(var)
            .and_then(|entries| entries.last())
            .copied()
            .ok_or_else(|| GraphError::UnknownRecVar { var: var.clone() })
    }

    fn build_type(&mut self, ty: &LType, from: NodeIndex, to: NodeIndex) -> Result<(), GraphError> {
        match ty {
            LType::Send { peers, msg, .. } => {
                self.build_send(peers, msg, from, to);
                Ok(())
            }

            LType::Receive { peer, msg, .. } => {
                let action = EAction::Receive {
                    peer: peer.clone(),
                    msg: msg.clone(),
                };
                self.add_action(from, action, to);
                Ok(())
            }

            LType::Choice { blocks, .. } => {
                self.scopes.enter_choice();
                for block in blocks {
                    self.scopes.push_block();
                    self.build_type(block, from, to)?;
                    self.scopes.pop_block();
                }
                self.scopes.leave_choice();
                Ok(())
            }

            LType::Recursion { var, body, .. } => self.build_recursion(var, body, from, to),

            LType::Continue { var, .. } => {
                let (entry, scope) = self.rec_entry(var)?;
                trace!(%var, "Intermediate continue edge");
                let edge = BuildEdge::IntermediateContinue {
                    var: var.clone(),
                    scope,
                };
                add_edge_once(&mut self.graph, from, edge, entry);
                Ok(())
            }

            LType::Seq(elems) => self.build_seq(elems, from, to),

            LType::Skip => Ok(()),
        }
    }

    /// A send to several peers becomes a chain of single-peer sends
    fn build_send(&mut self, peers: &[Role], msg: &Message, from: NodeIndex, to: NodeIndex) {
        let mut current = from;
        for (i, peer) in peers.iter().enumerate() {
            let next = if i + 1 == peers.len() {
                to
            } else {
                self.new_state()
            };
            let action = EAction::Send {
                peer: peer.clone(),
                msg: msg.clone(),
            };
            self.add_action(current, action, next);
            current = next;
        }
    }

    /// Thread fresh states through the elements. An element directly
    /// followed by `continue X` exits straight into the entry of `X`.
    fn build_seq(&mut self, elems: &[LType], from: NodeIndex, to: NodeIndex) -> Result<(), GraphError> {
        let elems: Vec<&LType> = elems.iter().filter(|elem| !elem.is_skip()).collect();
        let mut current = from;

        for (i, elem) in elems.iter().enumerate() {
            match elems.get(i + 1) {
                None => return self.build_type(elem, current, to),
                Some(LType::Continue { var, .. }) if !matches!(elem, LType::Continue { .. }) => {
                    let (entry, _) = self.rec_entry(var)?;
                    return self.build_type(elem, current, entry);
                }
                Some(_) => {
                    let next = self.new_state();
                    self.build_type(elem, current, next)?;
                    current = next;
                }
            }
        }

        Ok(())
    }

    fn build_recursion(
        &mut self,
        var: &RecVar,
        body: &LType,
        from: NodeIndex,
        to: NodeIndex,
    ) -> Result<(), GraphError> {
        let scope = ScopeId(self.next_scope);
        self.next_scope += 1;

        self.graph[from].add_label(var.clone());
        self.rec_entries
            .entry(var.clone())
            .or_default()
            .push((from, scope));
        self.scopes.push_recursion(scope);

        let result = self.build_type(body, from, to);

        self.scopes.pop_recursion(&scope);
        if let Some(entries) = self.rec_entries.get_mut(var) {
            entries.pop();
            if entries.is_empty() {
                self.rec_entries.remove(var);
            }
        }
        result
    }

    /// Produce the automaton, resolving intermediate continue edges, and
    /// reset the builder
    pub fn finalize(&mut self) -> Result<EGraph, GraphError> {
        let result = self.resolve();
        self.reset();
        result
    }

    fn resolve(&self) -> Result<EGraph, GraphError> {
        let mut graph = Graph::new();
        let mut clones = HashMap::new();
        let mut seen = HashSet::new();

        let entry = clone_state(&self.graph, &mut graph, &mut clones, self.entry);
        let mut pending = vec![self.entry];

        while let Some(orig) = pending.pop() {
            if !seen.insert(orig) {
                continue;
            }
            let clone = clones[&orig];

            for (edge, succ) in outgoing(&self.graph, orig) {
                match edge {
                    BuildEdge::Action(action) => {
                        let target = clone_state(&self.graph, &mut graph, &mut clones, succ);
                        add_edge_once(&mut graph, clone, action.clone(), target);
                        pending.push(succ);
                    }
                    BuildEdge::IntermediateContinue { var, scope } => {
                        let enacting = self
                            .scopes
                            .enacting(scope)
                            .ok_or_else(|| GraphError::MissingEnacting { var: var.clone() })?;
                        // Loop back through what the recursion entry does first
                        for action in enacting {
                            for (entry_edge, next) in outgoing(&self.graph, succ) {
                                if entry_edge != &BuildEdge::Action(action.clone()) {
                                    continue;
                                }
                                let target = clone_state(&self.graph, &mut graph, &mut clones, next);
                                add_edge_once(&mut graph, clone, action.clone(), target);
                                pending.push(next);
                            }
                        }
                    }
                }
            }
        }

        let terminal = clones.get(&self.exit).copied().map(StateIndex::new);
        let egraph = EGraph::new(graph, StateIndex::new(entry), terminal);
        let (states, edges) = egraph.size();
        debug!(states, edges, terminal = terminal.is_some(), "Finalised endpoint graph");
        Ok(egraph)
    }
}

/// The copy of `orig` in the finalised graph, created on first use
fn clone_state(
    from: &Graph<EState, BuildEdge>,
    into: &mut Graph<EState, EAction>,
    clones: &mut HashMap<NodeIndex, NodeIndex>,
    orig: NodeIndex,
) -> NodeIndex {
    *clones
        .entry(orig)
        .or_insert_with(|| into.add_node(from[orig].clone()))
}

/// Add an edge unless an identical one already exists
fn add_edge_once<E: PartialEq>(
    graph: &mut Graph<EState, E>,
    from: NodeIndex,
    weight: E,
    to: NodeIndex,
) -> bool {
    if graph
        .edges_connecting(from, to)
        .any(|edge| edge.weight() == &weight)
    {
        return false;
    }
    graph.add_edge(from, to, weight);
    true
}

/// Build and finalise the automaton of `ty`
pub fn build_egraph(ty: &LType) -> Result<EGraph, GraphError> {
    let mut builder = EGraphBuilder::new();
    builder.build(ty)?;
    builder.finalize()
}

/// Conversion of a local type into its endpoint automaton
pub trait ToEGraph {
    fn to_egraph(&self) -> Result<EGraph, GraphError>;
}

impl ToEGraph for LType {
    fn to_egraph(&self) -> Result<EGraph, GraphError> {
        build_egraph(self)
    }
}
