//! Local types: one role's view of a protocol

use super::global::{write_block, write_seq};
use super::message::Message;
use super::name::RecVar;
use super::role::{join_roles, Role};
use super::session::{SessionType, Shape};
use super::source::Source;
use super::subst::Substitutions;
use super::visit::{LVisitor, RoleCollector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// A local session type, as produced by projection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LType {
    /// `msg to peers;`
    Send {
        peers: Vec<Role>,
        msg: Message,
        source: Source,
    },

    /// `msg from peer;`
    Receive {
        peer: Role,
        msg: Message,
        source: Source,
    },

    /// `choice at subj { .. } or { .. }`
    ///
    /// When `subj` is the projecting role itself the choice is internal,
    /// otherwise it is observed through the messages received from `subj`.
    Choice {
        subj: Role,
        blocks: Vec<LType>,
        source: Source,
    },

    /// `rec var { body }`
    Recursion {
        var: RecVar,
        body: Box<LType>,
        source: Source,
    },

    /// `continue var;`
    Continue { var: RecVar, source: Source },

    /// Elements run one after the other
    Seq(Vec<LType>),

    /// No action
    Skip,
}

impl LType {
    /// Send `msg` to every role in `peers`
    pub fn send(peers: impl IntoIterator<Item = impl Into<Role>>, msg: impl Into<Message>) -> Self {
        LType::Send {
            peers: peers.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            source: Source::NONE,
        }
    }

    /// Receive `msg` from `peer`
    pub fn receive(peer: impl Into<Role>, msg: impl Into<Message>) -> Self {
        LType::Receive {
            peer: peer.into(),
            msg: msg.into(),
            source: Source::NONE,
        }
    }

    /// Choice at `subj` over `blocks`
    pub fn choice(subj: impl Into<Role>, blocks: impl IntoIterator<Item = LType>) -> Self {
        LType::Choice {
            subj: subj.into(),
            blocks: blocks.into_iter().collect(),
            source: Source::NONE,
        }
    }

    /// Recursion binding `var` over `body`
    pub fn rec(var: impl Into<RecVar>, body: LType) -> Self {
        LType::Recursion {
            var: var.into(),
            body: Box::new(body),
            source: Source::NONE,
        }
    }

    /// Continue to the recursion binding `var`
    pub fn cont(var: impl Into<RecVar>) -> Self {
        LType::Continue {
            var: var.into(),
            source: Source::NONE,
        }
    }

    /// Normalising sequence constructor.
    ///
    /// Nested sequences are flattened and `Skip`s dropped. An empty result is
    /// `Skip` and a single element stands for itself.
    ///
    /// ```
    /// use rumpsteak_choreography::{LType, MessageSig};
    ///
    /// let hello = LType::send(["B"], MessageSig::label("Hello"));
    /// let ty = LType::seq([LType::Skip, LType::seq([hello.clone()]), LType::Skip]);
    /// assert_eq!(ty, hello);
    /// ```
    pub fn seq(elems: impl IntoIterator<Item = LType>) -> Self {
        let mut flat = Vec::new();
        for elem in elems {
            match elem {
                LType::Seq(inner) => flat.extend(inner.into_iter().filter(|e| !e.is_skip())),
                LType::Skip => {}
                elem => flat.push(elem),
            }
        }
        match flat.len() {
            0 => LType::Skip,
            1 => flat.pop().unwrap_or(LType::Skip),
            _ => LType::Seq(flat),
        }
    }

    /// Attach a source position to this node
    pub fn at(mut self, position: Source) -> Self {
        match &mut self {
            LType::Send { source, .. }
            | LType::Receive { source, .. }
            | LType::Choice { source, .. }
            | LType::Recursion { source, .. }
            | LType::Continue { source, .. } => *source = position,
            LType::Seq(_) | LType::Skip => {}
        }
        self
    }

    /// The first element of this type, looking through sequences
    pub fn head(&self) -> &LType {
        match self {
            LType::Seq(elems) => elems.first().map_or(self, LType::head),
            _ => self,
        }
    }
}

impl SessionType for LType {
    fn shape(&self) -> Shape<'_, Self> {
        match self {
            LType::Send { .. } | LType::Receive { .. } => Shape::Action,
            LType::Choice { blocks, .. } => Shape::Choice(blocks),
            LType::Recursion { var, body, .. } => Shape::Recursion(var, body),
            LType::Continue { var, .. } => Shape::Continue(var),
            LType::Seq(elems) => Shape::Seq(elems),
            LType::Skip => Shape::Skip,
        }
    }

    fn try_map_children<E, F>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&Self) -> Result<Self, E>,
    {
        Ok(match self {
            LType::Choice {
                subj,
                blocks,
                source,
            } => LType::Choice {
                subj: subj.clone(),
                blocks: blocks.iter().map(&mut f).collect::<Result<_, _>>()?,
                source: *source,
            },
            LType::Recursion { var, body, source } => LType::Recursion {
                var: var.clone(),
                body: Box::new(f(body)?),
                source: *source,
            },
            LType::Seq(elems) => LType::seq(elems.iter().map(&mut f).collect::<Result<Vec<_>, _>>()?),
            LType::Send { .. } | LType::Receive { .. } | LType::Continue { .. } | LType::Skip => {
                self.clone()
            }
        })
    }

    fn substitute(&self, subs: &Substitutions) -> Self {
        match self {
            LType::Send { peers, msg, source } => LType::Send {
                peers: peers.iter().map(|peer| subs.role(peer)).collect(),
                msg: msg.substitute(subs),
                source: *source,
            },
            LType::Receive { peer, msg, source } => LType::Receive {
                peer: subs.role(peer),
                msg: msg.substitute(subs),
                source: *source,
            },
            LType::Choice {
                subj,
                blocks,
                source,
            } => LType::Choice {
                subj: subs.role(subj),
                blocks: blocks.iter().map(|block| block.substitute(subs)).collect(),
                source: *source,
            },
            _ => self.map_children(|child| child.substitute(subs)),
        }
    }

    fn roles(&self) -> BTreeSet<Role> {
        let mut collector = RoleCollector::default();
        collector.visit(self);
        collector.into_roles()
    }

    fn make_recursion(var: RecVar, body: Self) -> Self {
        LType::rec(var, body)
    }

    fn make_continue(var: RecVar) -> Self {
        LType::cont(var)
    }
}

impl Display for LType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LType::Send { peers, msg, .. } => {
                write!(f, "{msg} to ")?;
                join_roles(f, peers)?;
                write!(f, ";")
            }
            LType::Receive { peer, msg, .. } => write!(f, "{msg} from {peer};"),
            LType::Choice { subj, blocks, .. } => {
                write!(f, "choice at {subj}")?;
                for (i, block) in blocks.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or")?;
                    }
                    write_block(f, block)?;
                }
                Ok(())
            }
            LType::Recursion { var, body, .. } => {
                write!(f, "rec {var}")?;
                write_block(f, &**body)
            }
            LType::Continue { var, .. } => write!(f, "continue {var};"),
            LType::Seq(elems) => write_seq(f, elems),
            LType::Skip => Ok(()),
        }
    }
}
