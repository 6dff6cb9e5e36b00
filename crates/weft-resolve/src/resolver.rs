//! Per-component resolution.
//!
//! One [`Resolver`] holds the resolution tables for one component. Resolvers
//! form a lineage (root to leaf) stored in an arena owned by the
//! [`ResolutionPass`]; every method takes the index of the resolver it acts
//! for, so a child can read ancestor state and append to an ancestor's
//! subcomponent queue without shared ownership.
//!
//! `resolve` is the public contract: after it returns, the key is resolved
//! in this resolver or an ancestor, and so are the dependencies of every
//! binding installed here. `look_up_bindings` builds the answer for one key:
//! it gathers declarations across the lineage, synthesizes multibound /
//! optional / subcomponent-creator bindings, falls back to constructor
//! injection, and decides per binding whether to reuse an ancestor's node
//! (ownership and re-resolution rules live in the sibling modules).

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use weft_model::{
    Binding, BindingKind, ComponentDescriptor, ComponentPath, ContributionBinding,
    DelegateDeclaration, Key, MultibindingDeclaration, OptionalBindingDeclaration,
    SubcomponentDeclaration,
};

use crate::declarations::ComponentDeclarations;
use crate::nodes::{BindingNode, ResolvedBindings};
use crate::options::CompilerOptions;
use crate::registry::InjectBindingRegistry;
use crate::synthesis;

/// Resolution state for one component.
pub(crate) struct Resolver {
    pub(crate) parent: Option<usize>,
    pub(crate) component_path: ComponentPath,
    pub(crate) descriptor: Rc<ComponentDescriptor>,
    pub(crate) declarations: ComponentDeclarations,
    pub(crate) resolved_contribution_bindings: IndexMap<Key, ResolvedBindings>,
    pub(crate) resolved_members_injection_bindings: IndexMap<Key, ResolvedBindings>,
    pub(crate) cycle_stack: Vec<Key>,
    pub(crate) key_depends_on_missing_binding: HashMap<Key, bool>,
    pub(crate) key_depends_on_local_bindings: HashMap<Key, bool>,
    pub(crate) subcomponents_to_resolve: VecDeque<Rc<ComponentDescriptor>>,
}

/// One resolution run over a component tree.
///
/// Owns the resolver arena. Single-threaded and synchronous: one pass runs
/// to completion before its results are consumed.
pub(crate) struct ResolutionPass<'r> {
    pub(crate) registry: &'r dyn InjectBindingRegistry,
    pub(crate) options: &'r CompilerOptions,
    pub(crate) resolvers: Vec<Resolver>,
}

impl<'r> ResolutionPass<'r> {
    pub(crate) fn new(registry: &'r dyn InjectBindingRegistry, options: &'r CompilerOptions) -> Self {
        Self {
            registry,
            options,
            resolvers: Vec::new(),
        }
    }

    /// Creates the resolver for `descriptor` under `parent` and returns its
    /// index. The subcomponent queue starts with the children declared by
    /// factory methods and builder entry points; module-declared children
    /// are only enqueued when their creator binding resolves.
    pub(crate) fn new_resolver(
        &mut self,
        parent: Option<usize>,
        descriptor: Rc<ComponentDescriptor>,
    ) -> usize {
        let component_path = match parent {
            Some(parent) => self.resolvers[parent]
                .component_path
                .child_path(descriptor.type_name()),
            None => ComponentPath::root(descriptor.type_name()),
        };
        let declarations = ComponentDeclarations::for_component(&descriptor);
        let mut subcomponents_to_resolve = VecDeque::new();
        subcomponents_to_resolve.extend(descriptor.factory_method_children().iter().cloned());
        subcomponents_to_resolve.extend(descriptor.builder_entry_point_children().iter().cloned());

        self.resolvers.push(Resolver {
            parent,
            component_path,
            descriptor,
            declarations,
            resolved_contribution_bindings: IndexMap::new(),
            resolved_members_injection_bindings: IndexMap::new(),
            cycle_stack: Vec::new(),
            key_depends_on_missing_binding: HashMap::new(),
            key_depends_on_local_bindings: HashMap::new(),
            subcomponents_to_resolve,
        });
        self.resolvers.len() - 1
    }

    /// The resolver indices from the root down to `this`, in that order.
    pub(crate) fn lineage(&self, this: usize) -> Vec<usize> {
        let mut lineage = Vec::new();
        let mut current = Some(this);
        while let Some(index) = current {
            lineage.push(index);
            current = self.resolvers[index].parent;
        }
        lineage.reverse();
        lineage
    }

    pub(crate) fn root_descriptor(&self, this: usize) -> &ComponentDescriptor {
        let root = *self.lineage(this).first().expect("lineage is never empty");
        &self.resolvers[root].descriptor
    }

    /// Resolves `key` in this resolver: after return the key is present in
    /// this or an ancestor resolver's contribution table, and so are the
    /// dependencies of every binding installed here.
    pub(crate) fn resolve(&mut self, this: usize, key: &Key) {
        // A cycle edge: the frame that pushed the key completes the entry.
        if self.resolvers[this].cycle_stack.contains(key) {
            return;
        }
        if self.resolvers[this]
            .resolved_contribution_bindings
            .contains_key(key)
        {
            return;
        }

        trace!(component = %self.resolvers[this].component_path, %key, "resolving");
        self.resolvers[this].cycle_stack.push(key.clone());
        let bindings = self.look_up_bindings(this, key);
        self.resolvers[this]
            .resolved_contribution_bindings
            .insert(key.clone(), bindings.clone());
        self.resolve_dependencies(this, &bindings);
        self.resolvers[this].cycle_stack.pop();
    }

    /// Resolves a members-injection request. The result is stored only in
    /// this resolver; members injection is never inherited.
    pub(crate) fn resolve_members_injection(&mut self, this: usize, key: &Key) {
        let bindings = self.look_up_members_injection_binding(this, key);
        self.resolve_dependencies(this, &bindings);
        self.resolvers[this]
            .resolved_members_injection_bindings
            .insert(key.clone(), bindings);
    }

    /// Resolves the dependencies of the bindings installed at this
    /// component. Inherited nodes had their dependencies resolved at their
    /// owning component.
    fn resolve_dependencies(&mut self, this: usize, bindings: &ResolvedBindings) {
        let dependency_keys: Vec<Key> = bindings
            .binding_nodes_owned_by(&self.resolvers[this].component_path)
            .flat_map(|node| node.dependencies())
            .map(|dependency| dependency.key.clone())
            .collect();
        for key in dependency_keys {
            self.resolve(this, &key);
        }
    }

    /// Builds the complete [`ResolvedBindings`] for `key` as seen from this
    /// component.
    pub(crate) fn look_up_bindings(&mut self, this: usize, request_key: &Key) -> ResolvedBindings {
        let mut bindings: IndexSet<ContributionBinding> = IndexSet::new();
        let mut multibinding_contributions: IndexSet<ContributionBinding> = IndexSet::new();
        let mut multibinding_declarations: IndexSet<MultibindingDeclaration> = IndexSet::new();
        let mut optional_binding_declarations: IndexSet<OptionalBindingDeclaration> =
            IndexSet::new();
        let mut subcomponent_declarations: IndexSet<SubcomponentDeclaration> = IndexSet::new();

        // Gather bindings, multibindings, optional, and subcomponent
        // declarations across the lineage, root first.
        let unwrapped_optional_key = request_key.unwrap_optional();
        for resolver in self.lineage(this) {
            bindings.extend(self.local_explicit_bindings(resolver, request_key));
            multibinding_contributions
                .extend(self.local_multibinding_contributions(resolver, request_key));
            multibinding_declarations.extend(
                self.resolvers[resolver]
                    .declarations
                    .multibindings(request_key)
                    .iter()
                    .cloned(),
            );
            subcomponent_declarations.extend(
                self.resolvers[resolver]
                    .declarations
                    .subcomponents(request_key)
                    .iter()
                    .cloned(),
            );
            // Optional binding declarations are keyed by the unwrapped type.
            if let Some(unwrapped) = &unwrapped_optional_key {
                optional_binding_declarations.extend(
                    self.resolvers[resolver]
                        .declarations
                        .optional_bindings(unwrapped)
                        .iter()
                        .cloned(),
                );
            }
        }

        // Synthetic multibinding.
        if !multibinding_contributions.is_empty() || !multibinding_declarations.is_empty() {
            if request_key.type_ref().is_map() {
                bindings.insert(synthesis::multibound_map(
                    request_key,
                    &multibinding_contributions,
                ));
            } else if request_key.type_ref().is_set() {
                bindings.insert(synthesis::multibound_set(
                    request_key,
                    &multibinding_contributions,
                ));
            } else {
                panic!("multibinding contributions for non-collection key: {request_key}");
            }
        }

        // Synthetic optional binding around the underlying key's resolution.
        if !optional_binding_declarations.is_empty() {
            let unwrapped = unwrapped_optional_key
                .as_ref()
                .expect("optional declarations only gathered for Optional<T> keys");
            let underlying = self.look_up_bindings(this, unwrapped);
            bindings.insert(synthesis::optional_binding(request_key, &underlying));
        }

        // Subcomponent creator binding; the owning resolver also queues the
        // child component for resolution.
        if !subcomponent_declarations.is_empty() {
            let binding =
                synthesis::subcomponent_creator_binding(request_key, &subcomponent_declarations);
            self.add_subcomponent_to_owning_resolver(this, &binding);
            bindings.insert(binding);
        }

        // Members injector binding.
        if request_key.type_ref().is_members_injector()
            && let Some(binding) = self.registry.get_or_find_members_injector_binding(request_key)
        {
            bindings.insert(binding);
        }

        // Assisted factory binding.
        if let Some(binding) = self.registry.assisted_factory_binding(request_key) {
            bindings.insert(binding);
        }

        // With no declarations in sight, fall back to the implicit
        // constructor-injection binding, if there is one.
        if bindings.is_empty()
            && let Some(binding) = self.registry.get_or_find_injection_binding(request_key)
            && self.is_correctly_scoped_in_subcomponent(this, &binding)
        {
            bindings.insert(binding);
        }

        let multibinding_declarations: Vec<_> = multibinding_declarations.into_iter().collect();
        let optional_binding_declarations: Vec<_> =
            optional_binding_declarations.into_iter().collect();
        let subcomponent_declarations: Vec<_> = subcomponent_declarations.into_iter().collect();

        let mut nodes = Vec::new();
        for binding in bindings {
            // An ancestor-owned binding reuses the ancestor's node instance
            // directly, so the descendant does not pick up multi/optional/
            // subcomponent declarations the ancestor never saw.
            let node = match self.binding_node_owned_by_ancestor(this, request_key, &binding) {
                Some(node) => node,
                None => BindingNode::for_contribution(
                    self.resolvers[this].component_path.clone(),
                    binding,
                    multibinding_declarations.clone(),
                    optional_binding_declarations.clone(),
                    subcomponent_declarations.clone(),
                ),
            };
            nodes.push(node);
        }
        ResolvedBindings::new(request_key.clone(), nodes)
    }

    /// The members-injection resolution for `key`: the registry's answer, or
    /// an empty set.
    fn look_up_members_injection_binding(&self, this: usize, key: &Key) -> ResolvedBindings {
        match self.registry.get_or_find_members_injection_binding(key) {
            Some(binding) => ResolvedBindings::new(
                key.clone(),
                vec![BindingNode::for_members_injection(
                    self.resolvers[this].component_path.clone(),
                    binding,
                )],
            ),
            None => ResolvedBindings::empty(key.clone()),
        }
    }

    /// Explicit bindings declared in `resolver`'s own modules: direct
    /// bindings plus bindings synthesized from its delegate declarations.
    fn local_explicit_bindings(&mut self, resolver: usize, key: &Key) -> Vec<ContributionBinding> {
        let mut bindings = self.resolvers[resolver].declarations.bindings(key).to_vec();
        // Plain delegate declarations have unwrapped map keys; undo the
        // request key's framework wrapper before looking them up.
        let delegate_declarations = self.resolvers[resolver]
            .declarations
            .delegates(&key.unwrap_map_value_type())
            .to_vec();
        bindings.extend(self.create_delegate_bindings(resolver, delegate_declarations));
        bindings
    }

    /// Multibinding contributions declared in `resolver`'s own modules.
    fn local_multibinding_contributions(
        &mut self,
        resolver: usize,
        key: &Key,
    ) -> Vec<ContributionBinding> {
        let mut contributions = self.resolvers[resolver]
            .declarations
            .multibinding_contributions(key)
            .to_vec();
        let delegate_declarations = self.resolvers[resolver]
            .declarations
            .delegate_multibinding_contributions(key)
            .to_vec();
        contributions.extend(self.create_delegate_bindings(resolver, delegate_declarations));
        contributions
    }

    fn create_delegate_bindings(
        &mut self,
        resolver: usize,
        declarations: Vec<DelegateDeclaration>,
    ) -> Vec<ContributionBinding> {
        declarations
            .into_iter()
            .map(|declaration| self.create_delegate_binding(resolver, declaration))
            .collect()
    }

    /// Creates one (and only one) delegate binding for a delegate
    /// declaration, based on the resolved bindings of its right-hand side.
    /// Cyclic or missing targets yield an unresolved-delegate placeholder.
    /// Duplicate targets still produce a single delegate binding; picking
    /// among duplicates is the validation phase's problem.
    fn create_delegate_binding(
        &mut self,
        resolver: usize,
        declaration: DelegateDeclaration,
    ) -> ContributionBinding {
        let delegate_key = declaration.delegate_request.key.clone();
        if self.resolvers[resolver].cycle_stack.contains(&delegate_key) {
            return synthesis::unresolved_delegate_binding(&declaration);
        }

        self.resolvers[resolver].cycle_stack.push(delegate_key.clone());
        let resolved_delegate = self.look_up_bindings(resolver, &delegate_key);
        self.resolvers[resolver].cycle_stack.pop();

        if resolved_delegate.is_empty() {
            return synthesis::unresolved_delegate_binding(&declaration);
        }
        let target = resolved_delegate
            .contribution_bindings()
            .next()
            .expect("non-empty resolution has a contribution binding");
        synthesis::delegate_binding(&declaration, target)
    }

    /// Queues the child component for the creator binding on the resolver
    /// that owns the binding. Drained by the orchestrator.
    fn add_subcomponent_to_owning_resolver(&mut self, this: usize, binding: &ContributionBinding) {
        debug_assert_eq!(binding.kind(), BindingKind::SubcomponentCreator);
        let owner = self
            .owning_resolver(this, binding)
            .expect("a creator binding is always explicitly installed somewhere in the lineage");
        let creator_type = binding.key().type_ref();
        let child = self.resolvers[owner]
            .descriptor
            .child_component_with_creator_type(creator_type)
            .unwrap_or_else(|| {
                panic!(
                    "{} declares no child component with creator {}",
                    self.resolvers[owner].descriptor.type_name(),
                    creator_type
                )
            });
        trace!(
            component = %self.resolvers[owner].component_path,
            subcomponent = child.type_name(),
            "queueing subcomponent"
        );
        self.resolvers[owner].subcomponents_to_resolve.push_back(child);
    }

    /// The resolution for `key` stored in the closest ancestor, if any.
    /// Contribution bindings only; members injection is not inherited.
    pub(crate) fn previously_resolved_bindings(
        &self,
        this: usize,
        key: &Key,
    ) -> Option<&ResolvedBindings> {
        let mut current = self.resolvers[this].parent;
        while let Some(index) = current {
            if let Some(resolved) = self.resolvers[index].resolved_contribution_bindings.get(key) {
                return Some(resolved);
            }
            current = self.resolvers[index].parent;
        }
        None
    }

    // --- Local-binding predicates used by the re-resolution analysis ---

    /// Whether resolving `resolved.key()` at this component would differ
    /// from the inherited resolution.
    pub(crate) fn has_local_bindings(&self, this: usize, resolved: &ResolvedBindings) -> bool {
        self.has_local_multibinding_contributions(this, resolved.key())
            || self.has_duplicate_explicit_binding(
                this,
                resolved.key(),
                resolved.contribution_bindings(),
            )
            || self.has_local_optional_binding_contribution(
                this,
                resolved.key(),
                resolved.bindings(),
            )
    }

    /// Single-binding form of [`Self::has_local_bindings`].
    pub(crate) fn has_local_bindings_for_binding(
        &self,
        this: usize,
        binding: &ContributionBinding,
    ) -> bool {
        let as_binding = Binding::Contribution(binding.clone());
        self.has_local_multibinding_contributions(this, binding.key())
            || self.has_duplicate_explicit_binding(this, binding.key(), std::iter::once(binding))
            || self.has_local_optional_binding_contribution(
                this,
                binding.key(),
                std::iter::once(&as_binding),
            )
    }

    /// True when a module of this component contributes to the multibinding
    /// for `key`.
    fn has_local_multibinding_contributions(&self, this: usize, key: &Key) -> bool {
        let declarations = &self.resolvers[this].declarations;
        !declarations.multibinding_contributions(key).is_empty()
            || !declarations.delegate_multibinding_contributions(key).is_empty()
    }

    /// True when this component contributes to an `Optional<T>` resolution
    /// that an ancestor did not see: either an explicit binding for the
    /// underlying key (when the inherited resolution is an optional), or an
    /// optional declaration with no optional binding resolved yet.
    fn has_local_optional_binding_contribution<'a>(
        &self,
        this: usize,
        key: &Key,
        mut previously_resolved: impl Iterator<Item = &'a Binding>,
    ) -> bool {
        let resolved_an_optional = previously_resolved.any(|binding| {
            binding
                .as_contribution()
                .is_some_and(|contribution| contribution.kind() == BindingKind::Optional)
        });
        if resolved_an_optional {
            let unwrapped = key
                .unwrap_optional()
                .expect("optional bindings have Optional<T> keys");
            self.has_local_explicit_bindings(this, &unwrapped)
        } else {
            // A parent's explicit Optional<T> binding and a local optional
            // declaration should conflict even with no underlying binding.
            !self.optional_binding_declarations(this, key).is_empty()
        }
    }

    /// Optional binding declarations for `key` from this and all ancestor
    /// resolvers.
    fn optional_binding_declarations(
        &self,
        this: usize,
        key: &Key,
    ) -> Vec<OptionalBindingDeclaration> {
        let Some(unwrapped) = key.unwrap_optional() else {
            return Vec::new();
        };
        let mut declarations: IndexSet<OptionalBindingDeclaration> = IndexSet::new();
        for resolver in self.lineage(this) {
            declarations.extend(
                self.resolvers[resolver]
                    .declarations
                    .optional_bindings(&unwrapped)
                    .iter()
                    .cloned(),
            );
        }
        declarations.into_iter().collect()
    }

    /// True when this component declares an explicit binding for `key`.
    pub(crate) fn has_local_explicit_bindings(&self, this: usize, key: &Key) -> bool {
        let declarations = &self.resolvers[this].declarations;
        !declarations.bindings(key).is_empty()
            || !declarations.delegates(&key.unwrap_map_value_type()).is_empty()
    }

    /// True when this component has an explicit binding that duplicates an
    /// already-resolved one. Unless the inject-conflict validation reports
    /// errors, injection bindings are ignored so a floating injection
    /// binding is not silently overridden.
    fn has_duplicate_explicit_binding<'a>(
        &self,
        this: usize,
        key: &Key,
        previously_resolved: impl Iterator<Item = &'a ContributionBinding>,
    ) -> bool {
        let report_inject_conflicts = self
            .options
            .explicit_binding_conflicts_with_inject
            .diagnostic_kind()
            == Some(crate::options::DiagnosticKind::Error);
        let mut remaining = previously_resolved
            .filter(|binding| report_inject_conflicts || binding.kind() != BindingKind::Injection);
        remaining.next().is_some() && self.has_local_explicit_bindings(this, key)
    }
}
