//! Binding values.
//!
//! A binding is a rule for satisfying a key. Contribution bindings satisfy
//! ordinary requests; members-injection bindings populate fields and methods
//! of an existing instance. Both are value-semantic: two bindings are the
//! same binding exactly when their identity-forming fields are equal, which
//! is what lets the resolver recognize a binding it already installed in an
//! ancestor component.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::request::DependencyRequest;

/// A scope annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope(String);

impl Scope {
    /// Canonical name of the relaxed reusable scope.
    pub const REUSABLE: &'static str = "Reusable";
    /// Canonical name of the production scope.
    pub const PRODUCTION: &'static str = "ProductionScope";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn reusable() -> Self {
        Self::new(Self::REUSABLE)
    }

    pub fn production() -> Self {
        Self::new(Self::PRODUCTION)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Reusable scope carries no uniqueness guarantee and never pins a
    /// binding to a component.
    pub fn is_reusable(&self) -> bool {
        self.0 == Self::REUSABLE
    }

    pub fn is_production(&self) -> bool {
        self.0 == Self::PRODUCTION
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// What kind of rule a contribution binding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    /// Implicit constructor injection.
    Injection,
    /// Constructor injection with assisted (caller-supplied) parameters.
    AssistedInjection,
    /// A user-declared factory for an assisted-injection type.
    AssistedFactory,
    /// A provision method on a module.
    Provision,
    /// A production method on a module.
    Production,
    /// A binding that forwards to whatever satisfies another key.
    Delegate,
    /// A synthesized set aggregating multibinding contributions.
    MultiboundSet,
    /// A synthesized map aggregating multibinding contributions.
    MultiboundMap,
    /// A synthesized optional around a possibly-absent underlying binding.
    Optional,
    /// A binding for the type that constructs a child component.
    SubcomponentCreator,
    /// A binding for a `MembersInjector<T>` request.
    MembersInjector,
    /// The component itself.
    Component,
    /// A provision method on the component.
    ComponentProvision,
    /// A component dependency instance.
    ComponentDependency,
    /// An instance bound on the component creator.
    BoundInstance,
    /// A delegate whose target is missing or cyclic.
    UnresolvedDelegate,
}

/// A rule for satisfying an ordinary (non-members-injection) request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContributionBinding {
    key: Key,
    kind: BindingKind,
    scope: Option<Scope>,
    contributing_module: Option<String>,
    binding_element: Option<String>,
    dependencies: Vec<DependencyRequest>,
}

impl ContributionBinding {
    pub fn new(kind: BindingKind, key: Key) -> Self {
        Self {
            key,
            kind,
            scope: None,
            contributing_module: None,
            binding_element: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Records the module and method this binding was declared by.
    pub fn with_element(
        mut self,
        module: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        self.contributing_module = Some(module.into());
        self.binding_element = Some(element.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<DependencyRequest>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn contributing_module(&self) -> Option<&str> {
        self.contributing_module.as_deref()
    }

    pub fn binding_element(&self) -> Option<&str> {
        self.binding_element.as_deref()
    }

    pub fn dependencies(&self) -> &[DependencyRequest] {
        &self.dependencies
    }
}

/// A rule for injecting the members of an existing instance.
///
/// Members-injection bindings have no scope and are never inherited across
/// components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembersInjectionBinding {
    key: Key,
    dependencies: Vec<DependencyRequest>,
}

impl MembersInjectionBinding {
    pub fn new(key: Key, dependencies: Vec<DependencyRequest>) -> Self {
        Self { key, dependencies }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn dependencies(&self) -> &[DependencyRequest] {
        &self.dependencies
    }
}

/// Either kind of binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Binding {
    Contribution(ContributionBinding),
    MembersInjection(MembersInjectionBinding),
}

impl Binding {
    pub fn key(&self) -> &Key {
        match self {
            Binding::Contribution(binding) => binding.key(),
            Binding::MembersInjection(binding) => binding.key(),
        }
    }

    pub fn dependencies(&self) -> &[DependencyRequest] {
        match self {
            Binding::Contribution(binding) => binding.dependencies(),
            Binding::MembersInjection(binding) => binding.dependencies(),
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        match self {
            Binding::Contribution(binding) => binding.scope(),
            Binding::MembersInjection(_) => None,
        }
    }

    pub fn as_contribution(&self) -> Option<&ContributionBinding> {
        match self {
            Binding::Contribution(binding) => Some(binding),
            Binding::MembersInjection(_) => None,
        }
    }
}

impl From<ContributionBinding> for Binding {
    fn from(binding: ContributionBinding) -> Self {
        Binding::Contribution(binding)
    }
}

impl From<MembersInjectionBinding> for Binding {
    fn from(binding: MembersInjectionBinding) -> Self {
        Binding::MembersInjection(binding)
    }
}
