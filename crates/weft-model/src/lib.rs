// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Value types for the weft binding graph.
//!
//! This crate contains the data model shared by the resolver and by
//! downstream passes: structural type references, binding keys, dependency
//! requests, binding values, component descriptors, and module declarations.
//! It holds no resolution logic; see `weft-resolve` for the graph
//! construction itself.

pub mod binding;
pub mod component;
pub mod declaration;
pub mod key;
pub mod request;
pub mod types;

pub use binding::{Binding, BindingKind, ContributionBinding, MembersInjectionBinding, Scope};
pub use component::{ComponentDescriptor, ComponentPath, EntryPoint, ModuleDescriptor};
pub use declaration::{
    Declaration, DelegateDeclaration, MultibindingDeclaration, OptionalBindingDeclaration,
    SubcomponentDeclaration,
};
pub use key::{ContributionIdentifier, Key, Qualifier};
pub use request::{DependencyRequest, RequestKind};
pub use types::TypeRef;
