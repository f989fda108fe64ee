//! Operations shared by global and local session types

use super::name::RecVar;
use super::role::Role;
use super::subst::Substitutions;
use std::collections::BTreeSet;
use std::convert::Infallible;

/// Borrowed, kind-independent view of one node of a session type
#[derive(Debug)]
pub enum Shape<'a, T> {
    /// A communication action (transfer, send or receive)
    Action,
    /// Choice with its blocks
    Choice(&'a [T]),
    /// Recursion binder and body
    Recursion(&'a RecVar, &'a T),
    /// Jump back to an enclosing recursion
    Continue(&'a RecVar),
    /// Subprotocol call (global only)
    Do,
    /// Sequence of elements
    Seq(&'a [T]),
    /// No behaviour
    Skip,
}

/// Common interface of [`GType`](super::GType) and [`LType`](super::LType).
///
/// Kind-independent passes (unfolding, reachability, variable queries) are
/// written once against this trait.
pub trait SessionType: Clone + PartialEq + Sized {
    /// View this node by shape
    fn shape(&self) -> Shape<'_, Self>;

    /// Rebuild this node with every direct child mapped by `f`
    fn try_map_children<E, F>(&self, f: F) -> Result<Self, E>
    where
        F: FnMut(&Self) -> Result<Self, E>;

    /// Apply role and parameter substitutions. Recursion variables are kept.
    fn substitute(&self, subs: &Substitutions) -> Self;

    /// Every role occurring in this type
    fn roles(&self) -> BTreeSet<Role>;

    /// Build `rec var { body }`
    fn make_recursion(var: RecVar, body: Self) -> Self;

    /// Build `continue var;`
    fn make_continue(var: RecVar) -> Self;

    /// Infallible [`try_map_children`](Self::try_map_children)
    fn map_children(&self, mut f: impl FnMut(&Self) -> Self) -> Self {
        match self.try_map_children::<Infallible, _>(|child| Ok(f(child))) {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }

    /// Direct children in order
    fn children(&self) -> Vec<&Self> {
        match self.shape() {
            Shape::Choice(elems) | Shape::Seq(elems) => elems.iter().collect(),
            Shape::Recursion(_, body) => vec![body],
            Shape::Action | Shape::Continue(_) | Shape::Do | Shape::Skip => Vec::new(),
        }
    }

    /// The binder and body, if this is a recursion
    fn recursion(&self) -> Option<(&RecVar, &Self)> {
        match self.shape() {
            Shape::Recursion(var, body) => Some((var, body)),
            _ => None,
        }
    }

    /// The target variable, if this is a continue
    fn continue_var(&self) -> Option<&RecVar> {
        match self.shape() {
            Shape::Continue(var) => Some(var),
            _ => None,
        }
    }

    /// Whether this is `Skip` or an empty sequence
    fn is_skip(&self) -> bool {
        match self.shape() {
            Shape::Skip => true,
            Shape::Seq(elems) => elems.iter().all(Self::is_skip),
            _ => false,
        }
    }

    /// Whether any communication action or call occurs in this type
    fn has_actions(&self) -> bool {
        match self.shape() {
            Shape::Action | Shape::Do => true,
            _ => self.children().into_iter().any(Self::has_actions),
        }
    }

    /// Variables continued without an enclosing binder
    fn free_rec_vars(&self) -> BTreeSet<RecVar> {
        match self.shape() {
            Shape::Continue(var) => BTreeSet::from([var.clone()]),
            Shape::Recursion(var, body) => {
                let mut free = body.free_rec_vars();
                free.remove(var);
                free
            }
            _ => self
                .children()
                .into_iter()
                .flat_map(Self::free_rec_vars)
                .collect(),
        }
    }

    /// Variables bound by some recursion in this type
    fn bound_rec_vars(&self) -> BTreeSet<RecVar> {
        let mut bound: BTreeSet<_> = self
            .children()
            .into_iter()
            .flat_map(Self::bound_rec_vars)
            .collect();
        if let Some((var, _)) = self.recursion() {
            bound.insert(var.clone());
        }
        bound
    }
}
