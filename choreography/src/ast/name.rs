//! Interned names used throughout the protocol model
//!
//! Every name is a cheap-to-clone `Arc<str>` newtype. Names compare, order and
//! hash by their text, and serialise as plain strings.

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(::std::sync::Arc<str>);

        impl $name {
            /// Create a name from its text
            pub fn new(name: impl AsRef<str>) -> Self {
                Self(::std::sync::Arc::from(name.as_ref()))
            }

            /// The underlying text
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(::std::sync::Arc::from(name))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

pub(crate) use name_type;

name_type! {
    /// A recursion variable bound by a `rec` block
    ///
    /// Variables minted by the inliner start with `__` and never clash with
    /// user-written ones.
    RecVar
}

name_type! {
    /// Fully qualified name of a global protocol declaration
    ProtocolName
}

name_type! {
    /// Message operator (label)
    Op
}

name_type! {
    /// Data type name appearing in payloads or as a `type` parameter
    DataType
}

name_type! {
    /// Name of a `sig` parameter standing for a whole message signature
    MessageSigName
}

impl RecVar {
    /// Prefix reserved for variables minted during inlining
    pub const MINTED_PREFIX: &'static str = "__";

    /// Whether this variable was minted by the inliner
    pub fn is_minted(&self) -> bool {
        self.as_str().starts_with(Self::MINTED_PREFIX)
    }

    /// Qualify this variable by an enclosing minted variable.
    ///
    /// Used to keep callee recursion variables apart from the caller's.
    pub fn qualified_by(&self, scope: &RecVar) -> RecVar {
        RecVar::new(format!("{}:{}", scope, self))
    }
}
