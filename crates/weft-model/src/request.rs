//! Dependency requests.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::types::TypeRef;

/// How a dependency is requested at an injection site or entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// A direct `T` request.
    Instance,
    /// `Provider<T>`.
    Provider,
    /// `Lazy<T>`.
    Lazy,
    /// `Producer<T>`.
    Producer,
    /// `Produced<T>`.
    Produced,
    /// A future of `T` on a production entry point.
    Future,
    /// Members injection of an existing instance.
    MembersInjection,
}

impl RequestKind {
    /// Derives the request kind implied by a framework wrapper type.
    ///
    /// `Provider<Foo>` implies [`RequestKind::Provider`], a bare `Foo`
    /// implies [`RequestKind::Instance`], and so on. Used when synthesizing
    /// an optional binding from its value type.
    pub fn for_framework_type(ty: &TypeRef) -> RequestKind {
        match ty.name() {
            crate::types::framework::PROVIDER => RequestKind::Provider,
            crate::types::framework::LAZY => RequestKind::Lazy,
            crate::types::framework::PRODUCER => RequestKind::Producer,
            crate::types::framework::PRODUCED => RequestKind::Produced,
            _ => RequestKind::Instance,
        }
    }
}

/// A request for a key, tagged with how the requester wants it satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub key: Key,
    pub kind: RequestKind,
}

impl DependencyRequest {
    pub fn new(key: Key, kind: RequestKind) -> Self {
        Self { key, kind }
    }

    /// An [`RequestKind::Instance`] request.
    pub fn instance(key: Key) -> Self {
        Self::new(key, RequestKind::Instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::framework;

    #[test]
    fn test_request_kind_for_framework_type() {
        let provider = TypeRef::parameterized(framework::PROVIDER, vec![TypeRef::new("Foo")]);
        assert_eq!(
            RequestKind::for_framework_type(&provider),
            RequestKind::Provider
        );
        let lazy = TypeRef::parameterized(framework::LAZY, vec![TypeRef::new("Foo")]);
        assert_eq!(RequestKind::for_framework_type(&lazy), RequestKind::Lazy);
        assert_eq!(
            RequestKind::for_framework_type(&TypeRef::new("Foo")),
            RequestKind::Instance
        );
    }
}
