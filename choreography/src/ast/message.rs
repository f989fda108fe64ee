//! Message signatures and non-role protocol arguments

use super::name::{DataType, MessageSigName, Op, ProtocolName};
use super::role::Role;
use super::subst::Substitutions;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One element of a message payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadElem {
    /// A plain data type, e.g. `Int`
    Data(DataType),
    /// A delegated session, e.g. `Proto@B`
    Delegation {
        /// Protocol being delegated
        proto: ProtocolName,
        /// Role of that protocol the receiver takes over
        role: Role,
    },
}

impl Display for PayloadElem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PayloadElem::Data(data) => write!(f, "{data}"),
            PayloadElem::Delegation { proto, role } => write!(f, "{proto}@{role}"),
        }
    }
}

/// Ordered payload of a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload(pub Vec<PayloadElem>);

impl Payload {
    /// Payload with no elements
    pub fn empty() -> Self {
        Payload(Vec::new())
    }

    /// Payload made of plain data types
    pub fn data(types: impl IntoIterator<Item = impl Into<DataType>>) -> Self {
        Payload(types.into_iter().map(|t| PayloadElem::Data(t.into())).collect())
    }

    /// Whether the payload carries nothing
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn substitute(&self, subs: &Substitutions) -> Self {
        let elems = self.0.iter().map(|elem| match elem {
            PayloadElem::Data(data) => PayloadElem::Data(subs.data_type(data)),
            PayloadElem::Delegation { proto, role } => PayloadElem::Delegation {
                proto: proto.clone(),
                role: role.clone(),
            },
        });
        Payload(elems.collect())
    }
}

impl Display for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut elems = self.0.iter();
        if let Some(elem) = elems.next() {
            write!(f, "{elem}")?;
            for elem in elems {
                write!(f, ", {elem}")?;
            }
        }
        write!(f, ")")
    }
}

/// A concrete message signature: operator plus payload
///
/// # Examples
///
/// ```
/// use rumpsteak_choreography::{MessageSig, Payload};
///
/// let request = MessageSig::new("Request", Payload::data(["String"]));
/// assert_eq!(request.to_string(), "Request(String)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageSig {
    /// The operator (label)
    pub op: Op,
    /// The payload elements
    pub payload: Payload,
}

impl MessageSig {
    /// Create a message signature
    pub fn new(op: impl Into<Op>, payload: Payload) -> Self {
        MessageSig {
            op: op.into(),
            payload,
        }
    }

    /// A message with an empty payload
    pub fn label(op: impl Into<Op>) -> Self {
        Self::new(op, Payload::empty())
    }
}

impl Display for MessageSig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.payload)
    }
}

/// A message as written in a protocol body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    /// Concrete signature
    Sig(MessageSig),
    /// A `sig` parameter of the enclosing protocol, replaced on substitution
    Param(MessageSigName),
}

impl Message {
    /// Apply non-role substitutions
    pub fn substitute(&self, subs: &Substitutions) -> Message {
        match self {
            Message::Sig(sig) => Message::Sig(MessageSig {
                op: sig.op.clone(),
                payload: sig.payload.substitute(subs),
            }),
            Message::Param(name) => subs.message(name),
        }
    }

    /// The concrete signature, if this is not an unsubstituted parameter
    pub fn sig(&self) -> Option<&MessageSig> {
        match self {
            Message::Sig(sig) => Some(sig),
            Message::Param(_) => None,
        }
    }
}

impl From<MessageSig> for Message {
    fn from(sig: MessageSig) -> Self {
        Message::Sig(sig)
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Message::Sig(sig) => write!(f, "{sig}"),
            Message::Param(name) => write!(f, "{name}"),
        }
    }
}

/// Formal non-role parameter of a protocol declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonRoleParam {
    /// `type T`
    Type(DataType),
    /// `sig M`
    Sig(MessageSigName),
}

impl Display for NonRoleParam {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NonRoleParam::Type(name) => write!(f, "type {name}"),
            NonRoleParam::Sig(name) => write!(f, "sig {name}"),
        }
    }
}

/// Actual non-role argument supplied at a `do` call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arg {
    /// A data type
    Data(DataType),
    /// A concrete message signature
    Sig(MessageSig),
    /// A `sig` parameter of the caller, forwarded to the callee
    SigName(MessageSigName),
}

impl Arg {
    /// Apply the caller's substitutions to this argument
    pub fn substitute(&self, subs: &Substitutions) -> Arg {
        match self {
            Arg::Data(data) => Arg::Data(subs.data_type(data)),
            Arg::Sig(sig) => match Message::Sig(sig.clone()).substitute(subs) {
                Message::Sig(sig) => Arg::Sig(sig),
                Message::Param(name) => Arg::SigName(name),
            },
            Arg::SigName(name) => match subs.message(name) {
                Message::Sig(sig) => Arg::Sig(sig),
                Message::Param(name) => Arg::SigName(name),
            },
        }
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Data(data) => write!(f, "{data}"),
            Arg::Sig(sig) => write!(f, "{sig}"),
            Arg::SigName(name) => write!(f, "{name}"),
        }
    }
}
