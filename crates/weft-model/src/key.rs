//! Binding keys.
//!
//! A [`Key`] identifies the target of a dependency request: a type, an
//! optional qualifier, and (for multibinding contributions) an identifier
//! of the contributing module method. Two keys are interchangeable exactly
//! when all three parts are equal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{TypeRef, framework};

/// A qualifier annotation distinguishing otherwise identical types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qualifier(String);

impl Qualifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Identifies the module method a multibinding contribution came from.
///
/// Contribution keys carry this so each `@IntoSet`/`@IntoMap` method gets its
/// own key even when several contribute the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributionIdentifier {
    pub module: String,
    pub element: String,
}

impl ContributionIdentifier {
    pub fn new(module: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            element: element.into(),
        }
    }
}

/// Identity of a dependency request target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    qualifier: Option<Qualifier>,
    ty: TypeRef,
    contribution_id: Option<ContributionIdentifier>,
}

impl Key {
    /// An unqualified key for a type.
    pub fn of(ty: impl Into<TypeRef>) -> Self {
        Self {
            qualifier: None,
            ty: ty.into(),
            contribution_id: None,
        }
    }

    /// A qualified key.
    pub fn qualified(qualifier: Qualifier, ty: impl Into<TypeRef>) -> Self {
        Self {
            qualifier: Some(qualifier),
            ty: ty.into(),
            contribution_id: None,
        }
    }

    /// Tags this key with a multibinding contribution identifier.
    pub fn with_contribution_id(mut self, id: ContributionIdentifier) -> Self {
        self.contribution_id = Some(id);
        self
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    pub fn multibinding_contribution_id(&self) -> Option<&ContributionIdentifier> {
        self.contribution_id.as_ref()
    }

    /// This key without its multibinding contribution identifier.
    pub fn without_multibinding_contribution_id(&self) -> Key {
        Key {
            qualifier: self.qualifier.clone(),
            ty: self.ty.clone(),
            contribution_id: None,
        }
    }

    /// For an `Optional<T>` key, the key for the underlying `T`.
    ///
    /// Any framework wrapper on the value type is stripped as well, so
    /// `Optional<Provider<Foo>>` unwraps to `Foo`. The request kind implied
    /// by the wrapper is recovered separately via
    /// [`crate::RequestKind::for_framework_type`].
    pub fn unwrap_optional(&self) -> Option<Key> {
        if !self.ty.is_optional() {
            return None;
        }
        let value = self.ty.type_argument().expect("optional has one argument");
        Some(Key {
            qualifier: self.qualifier.clone(),
            ty: value.unwrap_framework().clone(),
            contribution_id: self.contribution_id.clone(),
        })
    }

    /// For a `Map<K, Wrapper<V>>` key, the key for `Map<K, V>`.
    ///
    /// Returns a clone of this key when the type is not a map or the map
    /// value carries no framework wrapper.
    pub fn unwrap_map_value_type(&self) -> Key {
        if let Some(value) = self.ty.map_value()
            && value.is_framework_wrapper()
        {
            let key_type = self.ty.map_key().expect("map has a key type").clone();
            return Key {
                qualifier: self.qualifier.clone(),
                ty: TypeRef::parameterized(
                    framework::MAP,
                    vec![key_type, value.unwrap_framework().clone()],
                ),
                contribution_id: self.contribution_id.clone(),
            };
        }
        self.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier} ")?;
        }
        write!(f, "{}", self.ty)?;
        if let Some(id) = &self.contribution_id {
            write!(f, " [{}.{}]", id.module, id.element)?;
        }
        Ok(())
    }
}
