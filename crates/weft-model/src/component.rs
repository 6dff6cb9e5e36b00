//! Component descriptors.
//!
//! A component descriptor is the pre-parsed shape of one component: its
//! scopes, entry points, installed modules, and child components. The
//! resolver walks a tree of these, one resolver per descriptor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::binding::Scope;
use crate::declaration::Declaration;
use crate::request::DependencyRequest;
use crate::types::TypeRef;

/// The component types from the root to one component, in order.
///
/// Paths are value-semantic; two paths are equal exactly when the whole
/// sequence matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentPath {
    components: Vec<String>,
}

impl ComponentPath {
    /// The path of a root component.
    pub fn root(component: impl Into<String>) -> Self {
        Self {
            components: vec![component.into()],
        }
    }

    /// The path of a child of this component.
    pub fn child_path(&self, component: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The component this path points at.
    pub fn current_component(&self) -> &str {
        self.components.last().expect("paths are never empty")
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join(" → "))
    }
}

/// One entry-point method on a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    pub method_name: String,
    pub request: DependencyRequest,
}

impl EntryPoint {
    pub fn new(method_name: impl Into<String>, request: DependencyRequest) -> Self {
        Self {
            method_name: method_name.into(),
            request,
        }
    }
}

/// A module installed on a component, carrying its declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub type_name: String,
    pub declarations: Vec<Declaration>,
}

impl ModuleDescriptor {
    pub fn new(type_name: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            type_name: type_name.into(),
            declarations,
        }
    }
}

/// The pre-parsed shape of one component.
///
/// Descriptor identity is the component type: equality and hashing use only
/// `type_name`, so a descriptor can act as its own key in seen-sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    type_name: String,
    scopes: IndexSet<Scope>,
    is_production: bool,
    is_subcomponent: bool,
    creator_type: Option<TypeRef>,
    entry_points: Vec<EntryPoint>,
    modules: Vec<ModuleDescriptor>,
    factory_method_children: Vec<Rc<ComponentDescriptor>>,
    builder_entry_point_children: Vec<Rc<ComponentDescriptor>>,
    module_declared_children: Vec<Rc<ComponentDescriptor>>,
}

impl ComponentDescriptor {
    /// A root component descriptor.
    pub fn component(type_name: impl Into<String>) -> Self {
        Self::new(type_name, false)
    }

    /// A subcomponent descriptor.
    pub fn subcomponent(type_name: impl Into<String>) -> Self {
        Self::new(type_name, true)
    }

    fn new(type_name: impl Into<String>, is_subcomponent: bool) -> Self {
        Self {
            type_name: type_name.into(),
            scopes: IndexSet::new(),
            is_production: false,
            is_subcomponent,
            creator_type: None,
            entry_points: Vec::new(),
            modules: Vec::new(),
            factory_method_children: Vec::new(),
            builder_entry_point_children: Vec::new(),
            module_declared_children: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.insert(scope);
        self
    }

    pub fn production(mut self) -> Self {
        self.is_production = true;
        self
    }

    /// Declares the builder/factory type that constructs this component.
    pub fn with_creator_type(mut self, creator_type: TypeRef) -> Self {
        self.creator_type = Some(creator_type);
        self
    }

    pub fn with_entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_points.push(entry_point);
        self
    }

    pub fn with_module(mut self, module: ModuleDescriptor) -> Self {
        self.modules.push(module);
        self
    }

    /// A child declared by a factory method on this component.
    pub fn with_factory_method_child(mut self, child: Rc<ComponentDescriptor>) -> Self {
        self.factory_method_children.push(child);
        self
    }

    /// A child declared by a builder-returning entry point on this component.
    pub fn with_builder_entry_point_child(mut self, child: Rc<ComponentDescriptor>) -> Self {
        self.builder_entry_point_children.push(child);
        self
    }

    /// A child declared by a module's subcomponent attribute; only reached
    /// through its creator binding.
    pub fn with_module_declared_child(mut self, child: Rc<ComponentDescriptor>) -> Self {
        self.module_declared_children.push(child);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn scopes(&self) -> &IndexSet<Scope> {
        &self.scopes
    }

    pub fn is_production(&self) -> bool {
        self.is_production
    }

    pub fn is_subcomponent(&self) -> bool {
        self.is_subcomponent
    }

    pub fn creator_type(&self) -> Option<&TypeRef> {
        self.creator_type.as_ref()
    }

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn factory_method_children(&self) -> &[Rc<ComponentDescriptor>] {
        &self.factory_method_children
    }

    pub fn builder_entry_point_children(&self) -> &[Rc<ComponentDescriptor>] {
        &self.builder_entry_point_children
    }

    /// Finds the child component constructed by the given creator type,
    /// searching all three child groups.
    pub fn child_component_with_creator_type(
        &self,
        creator_type: &TypeRef,
    ) -> Option<Rc<ComponentDescriptor>> {
        self.factory_method_children
            .iter()
            .chain(&self.builder_entry_point_children)
            .chain(&self.module_declared_children)
            .find(|child| child.creator_type.as_ref() == Some(creator_type))
            .cloned()
    }
}

impl PartialEq for ComponentDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for ComponentDescriptor {}

impl Hash for ComponentDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
    }
}
