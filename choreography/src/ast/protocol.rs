// Protocol declarations and the module context they are resolved in

use super::global::GType;
use super::message::{Arg, NonRoleParam};
use super::name::{ProtocolName, RecVar};
use super::role::{join_roles, Role, RoleList};
use super::session::SessionType;
use super::source::Source;
use super::visit::{CallCollector, GVisitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// A global protocol declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GProtocol {
    pub name: ProtocolName,
    pub roles: RoleList,
    pub params: Vec<NonRoleParam>,
    pub body: GType,
    /// Auxiliary protocols are only ever inlined into callers
    pub aux: bool,
    pub source: Source,
}

impl GProtocol {
    /// Declare a protocol with no non-role parameters
    pub fn new(
        name: impl Into<ProtocolName>,
        roles: impl IntoIterator<Item = impl Into<Role>>,
        body: GType,
    ) -> Self {
        GProtocol {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            params: Vec::new(),
            body,
            aux: false,
            source: Source::NONE,
        }
    }

    /// Set the non-role parameters
    pub fn with_params(mut self, params: impl IntoIterator<Item = NonRoleParam>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    /// Mark as auxiliary
    pub fn auxiliary(mut self) -> Self {
        self.aux = true;
        self
    }

    /// The signature of calling this protocol with its own formals
    pub fn sig(&self) -> SubprotoSig {
        let args = self.params.iter().map(|param| match param {
            NonRoleParam::Type(name) => Arg::Data(name.clone()),
            NonRoleParam::Sig(name) => Arg::SigName(name.clone()),
        });
        SubprotoSig {
            proto: self.name.clone(),
            roles: self.roles.as_slice().to_vec(),
            args: args.collect(),
        }
    }

    /// Declared roles that never occur in the body
    pub fn unused_roles(&self, body: &GType) -> Vec<Role> {
        let used = body.roles();
        self.roles
            .iter()
            .filter(|role| !used.contains(role))
            .cloned()
            .collect()
    }

    /// Protocols called directly by this body
    pub fn calls(&self) -> Vec<ProtocolName> {
        let mut collector = CallCollector::default();
        collector.visit(&self.body);
        collector.into_calls()
    }
}

impl Display for GProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.aux {
            write!(f, "aux ")?;
        }
        write!(f, "global protocol {}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "<")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{param}")?;
            }
            write!(f, ">")?;
        }
        write!(f, "(")?;
        for (i, role) in self.roles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "role {role}")?;
        }
        write!(f, ") {{ {} }}", self.body)
    }
}

/// A call-site signature: callee plus concrete arguments.
///
/// Used as the loop-detection key during inlining and to mint the recursion
/// variable standing for an expanded call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubprotoSig {
    pub proto: ProtocolName,
    pub roles: Vec<Role>,
    pub args: Vec<Arg>,
}

impl SubprotoSig {
    /// Recursion variable for this call, e.g. `__Sub<Int>(A, B)`
    pub fn rec_var(&self) -> RecVar {
        RecVar::new(format!("{}{}", RecVar::MINTED_PREFIX, self))
    }
}

impl Display for SubprotoSig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.proto)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        write!(f, "(")?;
        join_roles(f, &self.roles)?;
        write!(f, ")")
    }
}

/// The protocols of a module together with every protocol they can reach
/// through `do`, indexed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSet {
    protocols: BTreeMap<ProtocolName, GProtocol>,
}

impl ProtocolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, returning any previous one with the same name
    pub fn insert(&mut self, protocol: GProtocol) -> Option<GProtocol> {
        self.protocols.insert(protocol.name.clone(), protocol)
    }

    pub fn get(&self, name: &ProtocolName) -> Option<&GProtocol> {
        self.protocols.get(name)
    }

    /// Every declaration, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &GProtocol> {
        self.protocols.values()
    }

    /// Declarations that are validated and projected on their own
    pub fn roots(&self) -> impl Iterator<Item = &GProtocol> {
        self.iter().filter(|protocol| !protocol.aux)
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl FromIterator<GProtocol> for ProtocolSet {
    fn from_iter<T: IntoIterator<Item = GProtocol>>(iter: T) -> Self {
        let mut set = ProtocolSet::new();
        for protocol in iter {
            set.insert(protocol);
        }
        set
    }
}
