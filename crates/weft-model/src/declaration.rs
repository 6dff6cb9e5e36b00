//! Module declarations.
//!
//! Declarations are the raw material the resolver works from: what a module
//! says, before any resolution. The declaration extractor (outside this
//! crate) produces them; the resolver only queries them by key.

use serde::{Deserialize, Serialize};

use crate::binding::{ContributionBinding, Scope};
use crate::key::Key;
use crate::request::DependencyRequest;

/// A `@Binds`-style declaration: the key on the left is satisfied by
/// whatever satisfies the delegate request on the right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegateDeclaration {
    pub key: Key,
    pub delegate_request: DependencyRequest,
    pub contributing_module: Option<String>,
    pub binding_element: Option<String>,
    pub scope: Option<Scope>,
}

impl DelegateDeclaration {
    pub fn new(
        key: Key,
        delegate_request: DependencyRequest,
        module: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        Self {
            key,
            delegate_request,
            contributing_module: Some(module.into()),
            binding_element: Some(element.into()),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// A `@Multibinds`-style declaration that a set or map exists even with no
/// contributions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultibindingDeclaration {
    pub key: Key,
    pub contributing_module: Option<String>,
    pub binding_element: Option<String>,
}

impl MultibindingDeclaration {
    pub fn new(key: Key, module: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            key,
            contributing_module: Some(module.into()),
            binding_element: Some(element.into()),
        }
    }
}

/// A `@BindsOptionalOf`-style declaration, keyed by the *underlying* type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionalBindingDeclaration {
    pub key: Key,
    pub contributing_module: Option<String>,
    pub binding_element: Option<String>,
}

impl OptionalBindingDeclaration {
    pub fn new(key: Key, module: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            key,
            contributing_module: Some(module.into()),
            binding_element: Some(element.into()),
        }
    }
}

/// A module's declaration that a child component is installable, keyed by
/// the child's creator type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubcomponentDeclaration {
    pub key: Key,
    pub subcomponent: String,
    pub contributing_module: Option<String>,
}

impl SubcomponentDeclaration {
    pub fn new(key: Key, subcomponent: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            key,
            subcomponent: subcomponent.into(),
            contributing_module: Some(module.into()),
        }
    }
}

/// Any declaration a module can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Declaration {
    /// An explicit binding, including multibinding contributions.
    Binding(ContributionBinding),
    Delegate(DelegateDeclaration),
    Multibinding(MultibindingDeclaration),
    OptionalBinding(OptionalBindingDeclaration),
    Subcomponent(SubcomponentDeclaration),
}

impl Declaration {
    pub fn key(&self) -> &Key {
        match self {
            Declaration::Binding(binding) => binding.key(),
            Declaration::Delegate(declaration) => &declaration.key,
            Declaration::Multibinding(declaration) => &declaration.key,
            Declaration::OptionalBinding(declaration) => &declaration.key,
            Declaration::Subcomponent(declaration) => &declaration.key,
        }
    }

    pub fn contributing_module(&self) -> Option<&str> {
        match self {
            Declaration::Binding(binding) => binding.contributing_module(),
            Declaration::Delegate(declaration) => declaration.contributing_module.as_deref(),
            Declaration::Multibinding(declaration) => declaration.contributing_module.as_deref(),
            Declaration::OptionalBinding(declaration) => {
                declaration.contributing_module.as_deref()
            }
            Declaration::Subcomponent(declaration) => declaration.contributing_module.as_deref(),
        }
    }
}
