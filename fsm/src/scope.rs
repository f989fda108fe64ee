//! Scope stacks discovering the enacting actions of recursions
//!
//! While a recursion is being built, the first action added on each path
//! from its entry is what runs when a `continue` loops back. Each active
//! recursion keeps a stack of collecting lists: one for the recursion
//! itself, plus one per open choice and choice block. An action is recorded
//! in every list that is still empty.

use std::collections::HashMap;
use std::hash::Hash;

/// Collecting lists for the recursions being built, and the enacting
/// actions of those already closed.
///
/// Calls must be balanced: every `push_recursion` is matched by a
/// `pop_recursion`, every `enter_choice` by a `leave_choice` and every
/// `push_block` by a `pop_block`, properly nested.
#[derive(Debug, Clone)]
pub struct EnactingScopes<K, A> {
    collecting: HashMap<K, Vec<Vec<A>>>,
    enacting: HashMap<K, Vec<A>>,
}

impl<K, A> Default for EnactingScopes<K, A> {
    fn default() -> Self {
        Self {
            collecting: HashMap::new(),
            enacting: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, A: Clone + PartialEq> EnactingScopes<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start collecting the enacting actions of the recursion `key`
    pub fn push_recursion(&mut self, key: K) {
        self.collecting.entry(key).or_insert_with(|| vec![Vec::new()]);
    }

    /// Stop collecting for `key`, storing what was found
    pub fn pop_recursion(&mut self, key: &K) {
        if let Some(mut lists) = self.collecting.remove(key) {
            let found = lists.pop().unwrap_or_default();
            self.enacting.insert(key.clone(), found);
        }
    }

    /// Open a choice in every active recursion
    pub fn enter_choice(&mut self) {
        for lists in self.collecting.values_mut() {
            lists.push(Vec::new());
        }
    }

    /// Close a choice: its blocks' actions count only where nothing was
    /// found before the choice
    pub fn leave_choice(&mut self) {
        for lists in self.collecting.values_mut() {
            let choice = lists.pop().unwrap_or_default();
            if let Some(parent) = lists.last_mut() {
                if parent.is_empty() {
                    parent.extend(choice);
                }
            }
        }
    }

    /// Open a block of the current choice
    pub fn push_block(&mut self) {
        for lists in self.collecting.values_mut() {
            lists.push(Vec::new());
        }
    }

    /// Close a block, adding its actions to the enclosing choice
    pub fn pop_block(&mut self) {
        for lists in self.collecting.values_mut() {
            let block = lists.pop().unwrap_or_default();
            if let Some(choice) = lists.last_mut() {
                for action in block {
                    if !choice.contains(&action) {
                        choice.push(action);
                    }
                }
            }
        }
    }

    /// Record `action` wherever nothing has been found yet
    pub fn record(&mut self, action: &A) {
        for lists in self.collecting.values_mut() {
            if let Some(current) = lists.last_mut() {
                if current.is_empty() {
                    current.push(action.clone());
                }
            }
        }
    }

    /// Enacting actions of a closed recursion
    pub fn enacting(&self, key: &K) -> Option<&[A]> {
        self.enacting.get(key).map(Vec::as_slice)
    }

    /// Forget every recursion, open or closed
    pub fn clear(&mut self) {
        self.collecting.clear();
        self.enacting.clear();
    }
}
