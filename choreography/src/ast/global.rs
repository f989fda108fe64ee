//! Global types: the all-roles view of a protocol

use super::message::{Arg, Message};
use super::name::{ProtocolName, RecVar};
use super::role::{join_roles, Role};
use super::session::{SessionType, Shape};
use super::source::Source;
use super::subst::Substitutions;
use super::visit::{GVisitor, RoleCollector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// A global session type
///
/// Trees are immutable values: every pass returns a new tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GType {
    /// `msg from src to dsts;`
    MessageTransfer {
        src: Role,
        msg: Message,
        dsts: Vec<Role>,
        source: Source,
    },

    /// `choice at subj { .. } or { .. }`
    Choice {
        subj: Role,
        blocks: Vec<GType>,
        source: Source,
    },

    /// `rec var { body }`
    Recursion {
        var: RecVar,
        body: Box<GType>,
        source: Source,
    },

    /// `continue var;`
    Continue { var: RecVar, source: Source },

    /// `do proto<args>(roles);`
    Do {
        proto: ProtocolName,
        roles: Vec<Role>,
        args: Vec<Arg>,
        source: Source,
    },

    /// Elements run one after the other
    Seq(Vec<GType>),

    /// No interaction
    Skip,
}

impl GType {
    /// Message transfer from `src` to every role in `dsts`
    pub fn transfer(
        src: impl Into<Role>,
        msg: impl Into<Message>,
        dsts: impl IntoIterator<Item = impl Into<Role>>,
    ) -> Self {
        GType::MessageTransfer {
            src: src.into(),
            msg: msg.into(),
            dsts: dsts.into_iter().map(Into::into).collect(),
            source: Source::NONE,
        }
    }

    /// Choice at `subj` over `blocks`
    pub fn choice(subj: impl Into<Role>, blocks: impl IntoIterator<Item = GType>) -> Self {
        GType::Choice {
            subj: subj.into(),
            blocks: blocks.into_iter().collect(),
            source: Source::NONE,
        }
    }

    /// Recursion binding `var` over `body`
    pub fn rec(var: impl Into<RecVar>, body: GType) -> Self {
        GType::Recursion {
            var: var.into(),
            body: Box::new(body),
            source: Source::NONE,
        }
    }

    /// Continue to the recursion binding `var`
    pub fn cont(var: impl Into<RecVar>) -> Self {
        GType::Continue {
            var: var.into(),
            source: Source::NONE,
        }
    }

    /// Call of subprotocol `proto`
    pub fn call(
        proto: impl Into<ProtocolName>,
        roles: impl IntoIterator<Item = impl Into<Role>>,
        args: impl IntoIterator<Item = Arg>,
    ) -> Self {
        GType::Do {
            proto: proto.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            args: args.into_iter().collect(),
            source: Source::NONE,
        }
    }

    /// Sequence of `elems`
    pub fn seq(elems: impl IntoIterator<Item = GType>) -> Self {
        GType::Seq(elems.into_iter().collect())
    }

    /// Attach a source position to this node
    pub fn at(mut self, position: Source) -> Self {
        match &mut self {
            GType::MessageTransfer { source, .. }
            | GType::Choice { source, .. }
            | GType::Recursion { source, .. }
            | GType::Continue { source, .. }
            | GType::Do { source, .. } => *source = position,
            GType::Seq(_) | GType::Skip => {}
        }
        self
    }

    /// Source position of this node
    pub fn source(&self) -> Source {
        match self {
            GType::MessageTransfer { source, .. }
            | GType::Choice { source, .. }
            | GType::Recursion { source, .. }
            | GType::Continue { source, .. }
            | GType::Do { source, .. } => *source,
            GType::Seq(_) | GType::Skip => Source::NONE,
        }
    }

    /// Whether any subprotocol call remains
    pub fn has_do(&self) -> bool {
        match self {
            GType::Do { .. } => true,
            _ => self.children().into_iter().any(GType::has_do),
        }
    }
}

impl SessionType for GType {
    fn shape(&self) -> Shape<'_, Self> {
        match self {
            GType::MessageTransfer { .. } => Shape::Action,
            GType::Choice { blocks, .. } => Shape::Choice(blocks),
            GType::Recursion { var, body, .. } => Shape::Recursion(var, body),
            GType::Continue { var, .. } => Shape::Continue(var),
            GType::Do { .. } => Shape::Do,
            GType::Seq(elems) => Shape::Seq(elems),
            GType::Skip => Shape::Skip,
        }
    }

    fn try_map_children<E, F>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&Self) -> Result<Self, E>,
    {
        Ok(match self {
            GType::Choice {
                subj,
                blocks,
                source,
            } => GType::Choice {
                subj: subj.clone(),
                blocks: blocks.iter().map(&mut f).collect::<Result<_, _>>()?,
                source: *source,
            },
            GType::Recursion { var, body, source } => GType::Recursion {
                var: var.clone(),
                body: Box::new(f(body)?),
                source: *source,
            },
            GType::Seq(elems) => GType::Seq(elems.iter().map(&mut f).collect::<Result<_, _>>()?),
            GType::MessageTransfer { .. } | GType::Continue { .. } | GType::Do { .. } | GType::Skip => {
                self.clone()
            }
        })
    }

    fn substitute(&self, subs: &Substitutions) -> Self {
        match self {
            GType::MessageTransfer {
                src,
                msg,
                dsts,
                source,
            } => GType::MessageTransfer {
                src: subs.role(src),
                msg: msg.substitute(subs),
                dsts: dsts.iter().map(|dst| subs.role(dst)).collect(),
                source: *source,
            },
            GType::Choice {
                subj,
                blocks,
                source,
            } => GType::Choice {
                subj: subs.role(subj),
                blocks: blocks.iter().map(|block| block.substitute(subs)).collect(),
                source: *source,
            },
            GType::Do {
                proto,
                roles,
                args,
                source,
            } => GType::Do {
                proto: proto.clone(),
                roles: roles.iter().map(|role| subs.role(role)).collect(),
                args: args.iter().map(|arg| arg.substitute(subs)).collect(),
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
        GType::rec(var, body)
    }

    fn make_continue(var: RecVar) -> Self {
        GType::cont(var)
    }
}

impl Display for GType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GType::MessageTransfer { src, msg, dsts, .. } => {
                write!(f, "{msg} from {src} to ")?;
                join_roles(f, dsts)?;
                write!(f, ";")
            }
            GType::Choice { subj, blocks, .. } => {
                write!(f, "choice at {subj}")?;
                for (i, block) in blocks.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or")?;
                    }
                    write_block(f, block)?;
                }
                Ok(())
            }
            GType::Recursion { var, body, .. } => {
                write!(f, "rec {var}")?;
                write_block(f, &**body)
            }
            GType::Continue { var, .. } => write!(f, "continue {var};"),
            GType::Do {
                proto, roles, args, ..
            } => {
                write!(f, "do {proto}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                write!(f, "(")?;
                join_roles(f, roles)?;
                write!(f, ");")
            }
            GType::Seq(elems) => write_seq(f, elems),
            GType::Skip => Ok(()),
        }
    }
}

/// Write ` { body }`, or ` { }` for an empty body
pub(crate) fn write_block<T: Display + SessionType>(f: &mut Formatter<'_>, body: &T) -> fmt::Result {
    if body.is_skip() {
        write!(f, " {{ }}")
    } else {
        write!(f, " {{ {body} }}")
    }
}

/// Write the non-empty elements of a sequence separated by spaces
pub(crate) fn write_seq<T: Display + SessionType>(f: &mut Formatter<'_>, elems: &[T]) -> fmt::Result {
    let mut first = true;
    for elem in elems.iter().filter(|elem| !elem.is_skip()) {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{elem}")?;
        first = false;
    }
    Ok(())
}
