//! Structural type references.
//!
//! The resolver never inspects real language types. It works on a light
//! structural representation: a declared type name plus type arguments.
//! Framework types (`Provider`, `Lazy`, `Optional`, `Set`, `Map`, ...) are
//! recognized by their canonical names, which is all the graph construction
//! needs to classify a key as a set, a map, an optional, or a members
//! injector request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical names of the framework types the resolver treats specially.
pub mod framework {
    pub const OPTIONAL: &str = "Optional";
    pub const SET: &str = "Set";
    pub const MAP: &str = "Map";
    pub const PROVIDER: &str = "Provider";
    pub const LAZY: &str = "Lazy";
    pub const PRODUCER: &str = "Producer";
    pub const PRODUCED: &str = "Produced";
    pub const MEMBERS_INJECTOR: &str = "MembersInjector";
}

/// A declared type with type arguments.
///
/// `TypeRef` is immutable and value-semantic; it is used inside [`crate::Key`]
/// and compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef {
    name: String,
    arguments: Vec<TypeRef>,
}

impl TypeRef {
    /// A type with no type arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// A parameterized type.
    pub fn parameterized(name: impl Into<String>, arguments: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[TypeRef] {
        &self.arguments
    }

    /// The sole type argument, if this type has exactly one.
    pub fn type_argument(&self) -> Option<&TypeRef> {
        match self.arguments.as_slice() {
            [argument] => Some(argument),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.name == framework::OPTIONAL && self.arguments.len() == 1
    }

    pub fn is_set(&self) -> bool {
        self.name == framework::SET && self.arguments.len() == 1
    }

    pub fn is_map(&self) -> bool {
        self.name == framework::MAP && self.arguments.len() == 2
    }

    pub fn is_members_injector(&self) -> bool {
        self.name == framework::MEMBERS_INJECTOR && self.arguments.len() == 1
    }

    /// True for `Provider<T>`, `Lazy<T>`, `Producer<T>`, and `Produced<T>`.
    pub fn is_framework_wrapper(&self) -> bool {
        matches!(
            self.name.as_str(),
            framework::PROVIDER | framework::LAZY | framework::PRODUCER | framework::PRODUCED
        ) && self.arguments.len() == 1
    }

    pub fn map_key(&self) -> Option<&TypeRef> {
        if self.is_map() { self.arguments.first() } else { None }
    }

    pub fn map_value(&self) -> Option<&TypeRef> {
        if self.is_map() { self.arguments.get(1) } else { None }
    }

    /// Strips one framework wrapper, if present: `Provider<T>` becomes `T`.
    pub fn unwrap_framework(&self) -> &TypeRef {
        if self.is_framework_wrapper() {
            &self.arguments[0]
        } else {
            self
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "<")?;
            for (i, argument) in self.arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{argument}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
