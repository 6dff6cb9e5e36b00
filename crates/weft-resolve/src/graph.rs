//! Binding graph construction.
//!
//! The factory seeds a root resolver with the component's entry points,
//! drains the queue of discovered subcomponents (each resolved by a child
//! resolver), and freezes the result into a [`BindingGraph`]: an arena of
//! per-component resolution tables navigated through [`ComponentGraph`]
//! views.

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use weft_model::{
    ComponentDescriptor, ComponentPath, DependencyRequest, Key, RequestKind,
};

use crate::nodes::ResolvedBindings;
use crate::options::CompilerOptions;
use crate::registry::InjectBindingRegistry;
use crate::resolver::{ResolutionPass, Resolver};

/// Builds [`BindingGraph`]s from component descriptors.
pub struct BindingGraphFactory<'r> {
    registry: &'r dyn InjectBindingRegistry,
    options: CompilerOptions,
}

impl<'r> BindingGraphFactory<'r> {
    pub fn new(registry: &'r dyn InjectBindingRegistry, options: CompilerOptions) -> Self {
        Self { registry, options }
    }

    /// Creates a binding graph rooted at `descriptor`.
    ///
    /// With `create_full_binding_graph`, the keys of all module declarations
    /// are resolved in addition to the entry points, so the graph covers
    /// bindings no entry point reaches.
    pub fn create(
        &self,
        descriptor: Rc<ComponentDescriptor>,
        create_full_binding_graph: bool,
    ) -> BindingGraph {
        debug!(
            component = descriptor.type_name(),
            full = create_full_binding_graph,
            "building binding graph"
        );
        let mut pass = ResolutionPass::new(self.registry, &self.options);
        let mut children_by_resolver: Vec<Vec<usize>> = Vec::new();
        build_component(
            &mut pass,
            &mut children_by_resolver,
            None,
            descriptor,
            create_full_binding_graph,
        );

        let components = pass
            .resolvers
            .into_iter()
            .zip(children_by_resolver)
            .map(|(resolver, subgraphs)| ResolvedComponent::new(resolver, subgraphs))
            .collect();
        BindingGraph { components }
    }
}

/// Resolves one component and, recursively, every subcomponent discovered
/// while doing so. Returns the new resolver's index.
fn build_component(
    pass: &mut ResolutionPass<'_>,
    children_by_resolver: &mut Vec<Vec<usize>>,
    parent: Option<usize>,
    descriptor: Rc<ComponentDescriptor>,
    create_full_binding_graph: bool,
) -> usize {
    let this = pass.new_resolver(parent, descriptor.clone());
    children_by_resolver.push(Vec::new());

    for entry_point in descriptor.entry_points() {
        let request = &entry_point.request;
        if request.kind == RequestKind::MembersInjection {
            pass.resolve_members_injection(this, &request.key);
        } else {
            pass.resolve(this, &request.key);
        }
    }

    if create_full_binding_graph {
        // Resolve the keys of all bindings in all modules, stripping any
        // multibinding contribution identifier so the multibinding itself is
        // resolved.
        let declared_keys: Vec<Key> = pass.resolvers[this]
            .declarations
            .all_declarations()
            .iter()
            .filter(|declaration| declaration.contributing_module().is_some())
            .map(|declaration| declaration.key().without_multibinding_contribution_id())
            .collect();
        for key in declared_keys {
            pass.resolve(this, &key);
        }
    }

    // Drain the subcomponent queue. Resolving one subcomponent may enqueue
    // another (possibly on this resolver, via an ancestor-owned creator
    // binding), so the queue is re-read until it stays empty. Each
    // subcomponent is resolved once no matter how often its creator binding
    // was requested.
    let mut resolved_subcomponents: IndexSet<String> = IndexSet::new();
    while let Some(subcomponent) = pass.resolvers[this].subcomponents_to_resolve.pop_front() {
        if resolved_subcomponents.insert(subcomponent.type_name().to_string()) {
            let child = build_component(
                pass,
                children_by_resolver,
                Some(this),
                subcomponent,
                create_full_binding_graph,
            );
            children_by_resolver[this].push(child);
        }
    }
    this
}

/// A fully resolved component tree.
///
/// Components live in an arena; [`BindingGraph::root`] returns a view over
/// the root and [`ComponentGraph::subgraphs`] walks down, in the order the
/// subcomponents were drained from the queue.
#[derive(Debug)]
pub struct BindingGraph {
    components: Vec<ResolvedComponent>,
}

#[derive(Debug)]
struct ResolvedComponent {
    parent: Option<usize>,
    component_path: ComponentPath,
    descriptor: Rc<ComponentDescriptor>,
    contribution_bindings: IndexMap<Key, ResolvedBindings>,
    members_injection_bindings: IndexMap<Key, ResolvedBindings>,
    subgraphs: Vec<usize>,
}

impl ResolvedComponent {
    fn new(resolver: Resolver, subgraphs: Vec<usize>) -> Self {
        Self {
            parent: resolver.parent,
            component_path: resolver.component_path,
            descriptor: resolver.descriptor,
            contribution_bindings: resolver.resolved_contribution_bindings,
            members_injection_bindings: resolver.resolved_members_injection_bindings,
            subgraphs,
        }
    }
}

impl BindingGraph {
    /// The root component's view.
    pub fn root(&self) -> ComponentGraph<'_> {
        ComponentGraph {
            graph: self,
            index: 0,
        }
    }

    /// All components, root first, in resolution order.
    pub fn components(&self) -> impl Iterator<Item = ComponentGraph<'_>> {
        (0..self.components.len()).map(|index| ComponentGraph { graph: self, index })
    }
}

/// The component a graph node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentNode<'g> {
    pub component_path: &'g ComponentPath,
    pub descriptor: &'g ComponentDescriptor,
}

/// One component's resolution tables inside a [`BindingGraph`].
#[derive(Debug, Clone, Copy)]
pub struct ComponentGraph<'g> {
    graph: &'g BindingGraph,
    index: usize,
}

impl<'g> ComponentGraph<'g> {
    fn component(&self) -> &'g ResolvedComponent {
        &self.graph.components[self.index]
    }

    pub fn component_node(&self) -> ComponentNode<'g> {
        ComponentNode {
            component_path: self.component_path(),
            descriptor: self.component_descriptor(),
        }
    }

    pub fn component_path(&self) -> &'g ComponentPath {
        &self.component().component_path
    }

    pub fn component_descriptor(&self) -> &'g ComponentDescriptor {
        &self.component().descriptor
    }

    /// The resolution for `request` in this component or, for contribution
    /// requests, the nearest ancestor that resolved it.
    ///
    /// Panics when no component on the path resolved the request: every
    /// dependency was resolved during construction, so an absent entry is a
    /// caller bug.
    pub fn resolved_bindings(&self, request: &DependencyRequest) -> &'g ResolvedBindings {
        if request.kind == RequestKind::MembersInjection {
            return self
                .component()
                .members_injection_bindings
                .get(&request.key)
                .unwrap_or_else(|| {
                    panic!("no members-injection bindings for key: {}", request.key)
                });
        }
        let mut current = Some(self.index);
        while let Some(index) = current {
            let component = &self.graph.components[index];
            if let Some(resolved) = component.contribution_bindings.get(&request.key) {
                return resolved;
            }
            current = component.parent;
        }
        panic!("no resolved bindings for key: {}", request.key);
    }

    /// The resolutions stored in this component only; inherited entries from
    /// ancestors are not included.
    pub fn local_resolved_bindings(&self) -> impl Iterator<Item = &'g ResolvedBindings> {
        let component = self.component();
        component
            .members_injection_bindings
            .values()
            .chain(component.contribution_bindings.values())
    }

    /// The subgraphs for the subcomponents resolved under this component, in
    /// the order they were drained from the queue.
    pub fn subgraphs(&self) -> Vec<ComponentGraph<'g>> {
        self.component()
            .subgraphs
            .iter()
            .map(|&index| ComponentGraph {
                graph: self.graph,
                index,
            })
            .collect()
    }
}
