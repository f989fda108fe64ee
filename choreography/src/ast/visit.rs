//! Depth-first visitors over global and local types
//!
//! Every `visit_*` method defaults to walking the children, so a visitor only
//! overrides the variants it cares about.

use super::global::GType;
use super::local::LType;
use super::message::{Arg, Message};
use super::name::{ProtocolName, RecVar};
use super::role::Role;
use std::collections::BTreeSet;

/// Visitor over [`GType`] trees
pub trait GVisitor {
    /// Dispatch on the variant of `ty`
    fn visit(&mut self, ty: &GType) {
        walk_global(self, ty);
    }

    fn visit_transfer(&mut self, _src: &Role, _msg: &Message, _dsts: &[Role]) {}

    fn visit_choice(&mut self, _subj: &Role, blocks: &[GType]) {
        for block in blocks {
            self.visit(block);
        }
    }

    fn visit_recursion(&mut self, _var: &RecVar, body: &GType) {
        self.visit(body);
    }

    fn visit_continue(&mut self, _var: &RecVar) {}

    fn visit_do(&mut self, _proto: &ProtocolName, _roles: &[Role], _args: &[Arg]) {}

    fn visit_seq(&mut self, elems: &[GType]) {
        for elem in elems {
            self.visit(elem);
        }
    }
}

/// Call the `visit_*` method matching the variant of `ty`
pub fn walk_global<V: GVisitor + ?Sized>(visitor: &mut V, ty: &GType) {
    match ty {
        GType::MessageTransfer { src, msg, dsts, .. } => visitor.visit_transfer(src, msg, dsts),
        GType::Choice { subj, blocks, .. } => visitor.visit_choice(subj, blocks),
        GType::Recursion { var, body, .. } => visitor.visit_recursion(var, body),
        GType::Continue { var, .. } => visitor.visit_continue(var),
        GType::Do {
            proto, roles, args, ..
        } => visitor.visit_do(proto, roles, args),
        GType::Seq(elems) => visitor.visit_seq(elems),
        GType::Skip => {}
    }
}

/// Visitor over [`LType`] trees
pub trait LVisitor {
    /// Dispatch on the variant of `ty`
    fn visit(&mut self, ty: &LType) {
        walk_local(self, ty);
    }

    fn visit_send(&mut self, _peers: &[Role], _msg: &Message) {}

    fn visit_receive(&mut self, _peer: &Role, _msg: &Message) {}

    fn visit_choice(&mut self, _subj: &Role, blocks: &[LType]) {
        for block in blocks {
            self.visit(block);
        }
    }

    fn visit_recursion(&mut self, _var: &RecVar, body: &LType) {
        self.visit(body);
    }

    fn visit_continue(&mut self, _var: &RecVar) {}

    fn visit_seq(&mut self, elems: &[LType]) {
        for elem in elems {
            self.visit(elem);
        }
    }
}

/// Call the `visit_*` method matching the variant of `ty`
pub fn walk_local<V: LVisitor + ?Sized>(visitor: &mut V, ty: &LType) {
    match ty {
        LType::Send { peers, msg, .. } => visitor.visit_send(peers, msg),
        LType::Receive { peer, msg, .. } => visitor.visit_receive(peer, msg),
        LType::Choice { subj, blocks, .. } => visitor.visit_choice(subj, blocks),
        LType::Recursion { var, body, .. } => visitor.visit_recursion(var, body),
        LType::Continue { var, .. } => visitor.visit_continue(var),
        LType::Seq(elems) => visitor.visit_seq(elems),
        LType::Skip => {}
    }
}

/// Collects every role mentioned by a type
#[derive(Debug, Default)]
pub struct RoleCollector {
    roles: BTreeSet<Role>,
}

impl RoleCollector {
    /// The roles seen so far
    pub fn into_roles(self) -> BTreeSet<Role> {
        self.roles
    }
}

impl GVisitor for RoleCollector {
    fn visit_transfer(&mut self, src: &Role, _msg: &Message, dsts: &[Role]) {
        self.roles.insert(src.clone());
        self.roles.extend(dsts.iter().cloned());
    }

    fn visit_choice(&mut self, subj: &Role, blocks: &[GType]) {
        self.roles.insert(subj.clone());
        for block in blocks {
            GVisitor::visit(self, block);
        }
    }

    fn visit_do(&mut self, _proto: &ProtocolName, roles: &[Role], _args: &[Arg]) {
        self.roles.extend(roles.iter().cloned());
    }
}

impl LVisitor for RoleCollector {
    fn visit_send(&mut self, peers: &[Role], _msg: &Message) {
        self.roles.extend(peers.iter().cloned());
    }

    fn visit_receive(&mut self, peer: &Role, _msg: &Message) {
        self.roles.insert(peer.clone());
    }

    fn visit_choice(&mut self, subj: &Role, blocks: &[LType]) {
        self.roles.insert(subj.clone());
        for block in blocks {
            LVisitor::visit(self, block);
        }
    }
}

/// Collects the protocols called by a global type, in first-call order
#[derive(Debug, Default)]
pub struct CallCollector {
    calls: Vec<ProtocolName>,
}

impl CallCollector {
    /// Protocols called, without duplicates
    pub fn into_calls(self) -> Vec<ProtocolName> {
        self.calls
    }
}

impl GVisitor for CallCollector {
    fn visit_do(&mut self, proto: &ProtocolName, _roles: &[Role], _args: &[Arg]) {
        if !self.calls.contains(proto) {
            self.calls.push(proto.clone());
        }
    }
}
