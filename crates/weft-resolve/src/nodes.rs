//! Resolved binding nodes.
//!
//! A [`BindingNode`] is a binding plus the component path it is installed at,
//! together with the multibinding/optional/subcomponent declarations that
//! were in view at that component. Nodes are shared immutable values: when a
//! descendant component inherits an ancestor's resolution, it reuses the
//! ancestor's node *instance*, which is how downstream consumers de-duplicate
//! ([`BindingNode::ptr_eq`] exposes that identity).

use std::fmt;
use std::rc::Rc;

use weft_model::{
    Binding, ComponentPath, ContributionBinding, DependencyRequest, Key, MembersInjectionBinding,
    MultibindingDeclaration, OptionalBindingDeclaration, SubcomponentDeclaration,
};

#[derive(Debug, PartialEq, Eq)]
struct BindingNodeData {
    component_path: ComponentPath,
    binding: Binding,
    multibinding_declarations: Vec<MultibindingDeclaration>,
    optional_binding_declarations: Vec<OptionalBindingDeclaration>,
    subcomponent_declarations: Vec<SubcomponentDeclaration>,
}

/// A binding installed at a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingNode(Rc<BindingNodeData>);

impl BindingNode {
    /// Wraps a contribution binding installed at `component_path`, together
    /// with the declaration sets gathered when it was resolved.
    pub fn for_contribution(
        component_path: ComponentPath,
        binding: ContributionBinding,
        multibinding_declarations: Vec<MultibindingDeclaration>,
        optional_binding_declarations: Vec<OptionalBindingDeclaration>,
        subcomponent_declarations: Vec<SubcomponentDeclaration>,
    ) -> Self {
        Self(Rc::new(BindingNodeData {
            component_path,
            binding: Binding::Contribution(binding),
            multibinding_declarations,
            optional_binding_declarations,
            subcomponent_declarations,
        }))
    }

    /// Wraps a members-injection binding installed at `component_path`.
    pub fn for_members_injection(
        component_path: ComponentPath,
        binding: MembersInjectionBinding,
    ) -> Self {
        Self(Rc::new(BindingNodeData {
            component_path,
            binding: Binding::MembersInjection(binding),
            multibinding_declarations: Vec::new(),
            optional_binding_declarations: Vec::new(),
            subcomponent_declarations: Vec::new(),
        }))
    }

    /// The component this node is installed at.
    pub fn component_path(&self) -> &ComponentPath {
        &self.0.component_path
    }

    pub fn binding(&self) -> &Binding {
        &self.0.binding
    }

    pub fn contribution_binding(&self) -> Option<&ContributionBinding> {
        self.0.binding.as_contribution()
    }

    pub fn dependencies(&self) -> &[DependencyRequest] {
        self.0.binding.dependencies()
    }

    pub fn multibinding_declarations(&self) -> &[MultibindingDeclaration] {
        &self.0.multibinding_declarations
    }

    pub fn optional_binding_declarations(&self) -> &[OptionalBindingDeclaration] {
        &self.0.optional_binding_declarations
    }

    pub fn subcomponent_declarations(&self) -> &[SubcomponentDeclaration] {
        &self.0.subcomponent_declarations
    }

    /// True when both handles point at the same node instance. Inherited
    /// nodes compare identical to the ancestor's node under this test.
    pub fn ptr_eq(&self, other: &BindingNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Everything resolved for one key as seen from one component.
///
/// An empty set means no satisfying binding was found; that is data for a
/// later validation pass, not an error here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBindings {
    key: Key,
    nodes: Vec<BindingNode>,
}

impl ResolvedBindings {
    pub fn new(key: Key, nodes: Vec<BindingNode>) -> Self {
        Self { key, nodes }
    }

    pub fn empty(key: Key) -> Self {
        Self {
            key,
            nodes: Vec::new(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn binding_nodes(&self) -> &[BindingNode] {
        &self.nodes
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.nodes.iter().map(BindingNode::binding)
    }

    pub fn contribution_bindings(&self) -> impl Iterator<Item = &ContributionBinding> {
        self.nodes.iter().filter_map(BindingNode::contribution_binding)
    }

    pub fn contains_contribution_binding(&self, binding: &ContributionBinding) -> bool {
        self.contribution_bindings().any(|b| b == binding)
    }

    /// The nodes installed at exactly `component_path`; inherited nodes are
    /// filtered out.
    pub fn binding_nodes_owned_by<'a>(
        &'a self,
        component_path: &'a ComponentPath,
    ) -> impl Iterator<Item = &'a BindingNode> {
        self.nodes
            .iter()
            .filter(move |node| node.component_path() == component_path)
    }

    /// The node wrapping the given binding.
    ///
    /// Panics when the binding is not part of this resolution; callers only
    /// ask for bindings they just observed in it.
    pub fn for_binding(&self, binding: &ContributionBinding) -> &BindingNode {
        self.nodes
            .iter()
            .find(|node| node.contribution_binding() == Some(binding))
            .unwrap_or_else(|| panic!("no node for binding {} in {}", binding.key(), self.key))
    }
}

impl fmt::Display for ResolvedBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bindings)", self.key, self.nodes.len())
    }
}
