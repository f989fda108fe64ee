// Recursion unfolding ahead of validation

use crate::ast::{RecVar, SessionType};
use std::collections::HashMap;

/// Replace every `continue X` bound inside `ty` by a copy of its binder
/// `rec X { .. }` (with the original body), so that each loop is visible
/// one iteration deep.
pub fn unfold_all_once<T: SessionType>(ty: &T) -> T {
    unfold_with(ty, &HashMap::new())
}

fn unfold_with<T: SessionType>(ty: &T, binders: &HashMap<RecVar, T>) -> T {
    if let Some((var, body)) = ty.recursion() {
        let mut inner = binders.clone();
        inner.insert(var.clone(), ty.clone());
        return T::make_recursion(var.clone(), unfold_with(body, &inner));
    }
    if let Some(var) = ty.continue_var() {
        return binders
            .get(var)
            .cloned()
            .unwrap_or_else(|| ty.clone());
    }
    ty.map_children(|child| unfold_with(child, binders))
}

/// Unfold the outermost recursion once: `rec X { B }` becomes
/// `B[rec X { B } / X]`. Other types are returned unchanged.
pub fn unfold<T: SessionType>(ty: &T) -> T {
    match ty.recursion() {
        Some((var, body)) => replace_continue(body, var, ty),
        None => ty.clone(),
    }
}

/// Replace the free occurrences of `continue var` in `ty` by `with`
fn replace_continue<T: SessionType>(ty: &T, var: &RecVar, with: &T) -> T {
    match (ty.recursion(), ty.continue_var()) {
        (Some((bound, _)), _) if bound == var => ty.clone(),
        (_, Some(target)) if target == var => with.clone(),
        _ => ty.map_children(|child| replace_continue(child, var, with)),
    }
}
