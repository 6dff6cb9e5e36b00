//! Binding ownership.
//!
//! Decides at which component a binding is installed. A scoped binding
//! belongs to the component carrying its scope, an explicitly installed
//! binding to the component whose module declares it, a production binding
//! to the highest production component. Everything else floats: it installs
//! wherever it is first needed, and descendants reuse the ancestor's node
//! unless the re-resolution analysis says the local component changes the
//! answer.

use weft_model::{BindingKind, ContributionBinding, Key, Scope};

use crate::nodes::BindingNode;
use crate::resolver::ResolutionPass;

impl ResolutionPass<'_> {
    /// The ancestor's node for `binding`, when the binding is owned above
    /// this component and needs no local re-resolution.
    ///
    /// The parent resolves the key first so its tables reflect the most
    /// recent multibinding and optional contributions.
    pub(crate) fn binding_node_owned_by_ancestor(
        &mut self,
        this: usize,
        request_key: &Key,
        binding: &ContributionBinding,
    ) -> Option<BindingNode> {
        if !self.can_be_resolved_in_parent(this, request_key, binding) {
            return None;
        }
        let parent = self.resolvers[this].parent.expect("checked by the guard");
        self.resolve(parent, request_key);
        if self.requires_resolution(this, binding) {
            return None;
        }
        let resolved = self
            .previously_resolved_bindings(this, request_key)
            .expect("the parent resolved the key above");
        Some(resolved.for_binding(binding).clone())
    }

    fn can_be_resolved_in_parent(
        &self,
        this: usize,
        request_key: &Key,
        binding: &ContributionBinding,
    ) -> bool {
        if self.resolvers[this].parent.is_none() {
            return false;
        }
        if let Some(owner) = self.owning_resolver(this, binding) {
            return owner != this;
        }
        !self.is_component_or_creator_key(this, request_key)
            // Assisted-injection bindings are never reused from a parent.
            && binding.kind() != BindingKind::AssistedInjection
            && self
                .previously_resolved_bindings(this, request_key)
                .is_some_and(|resolved| resolved.contains_contribution_binding(binding))
    }

    /// The resolver `binding` is installed at, evaluated from `this`.
    /// `None` means the binding floats and installs locally.
    pub(crate) fn owning_resolver(
        &self,
        this: usize,
        binding: &ContributionBinding,
    ) -> Option<usize> {
        let lineage = self.lineage(this);

        if binding.scope().is_some_and(Scope::is_production)
            || binding.kind() == BindingKind::Production
        {
            for &resolver in &lineage {
                // Production-scoped constructor injection installs at the
                // highest production component.
                if binding.kind() == BindingKind::Injection
                    && self.resolvers[resolver].descriptor.is_production()
                {
                    return Some(resolver);
                }
                // Explicit production bindings install at the highest
                // component whose modules declare them.
                if self.contains_explicit_binding(resolver, binding) {
                    return Some(resolver);
                }
            }
        }

        if binding.scope().is_some_and(Scope::is_reusable) {
            // A reusable binding already resolved in an ancestor is reused
            // from there; otherwise it installs locally.
            for &resolver in lineage.iter().rev() {
                if let Some(resolved) = self.resolvers[resolver]
                    .resolved_contribution_bindings
                    .get(binding.key())
                    && resolved.contains_contribution_binding(binding)
                {
                    return Some(resolver);
                }
            }
            return None;
        }

        for &resolver in lineage.iter().rev() {
            if self.contains_explicit_binding(resolver, binding) {
                return Some(resolver);
            }
        }

        if let Some(scope) = binding.scope() {
            for &resolver in lineage.iter().rev() {
                if self.resolvers[resolver].descriptor.scopes().contains(scope) {
                    return Some(resolver);
                }
            }
        }
        None
    }

    /// True when `resolver`'s own modules install `binding`: a matching
    /// explicit binding, a matching delegate declaration, or a subcomponent
    /// declaration for its key.
    pub(crate) fn contains_explicit_binding(
        &self,
        resolver: usize,
        binding: &ContributionBinding,
    ) -> bool {
        self.resolvers[resolver]
            .declarations
            .bindings(binding.key())
            .contains(binding)
            || self.contains_delegate_declaration_for_binding(resolver, binding)
            || !self.resolvers[resolver]
                .declarations
                .subcomponents(binding.key())
                .is_empty()
    }

    /// True when `binding` is a delegate declared by a module of this
    /// component, matched on (module, element).
    fn contains_delegate_declaration_for_binding(
        &self,
        resolver: usize,
        binding: &ContributionBinding,
    ) -> bool {
        if binding.kind() != BindingKind::Delegate {
            return false;
        }
        // Map multibinding delegate keys are provider-wrapped; strict mode
        // unwraps them to match the declaration's own key.
        let key = if self.options.use_strict_multibindings(binding) {
            binding.key().unwrap_map_value_type()
        } else {
            binding.key().clone()
        };
        self.resolvers[resolver]
            .declarations
            .delegates(&key)
            .iter()
            .any(|declaration| {
                declaration.contributing_module.as_deref() == binding.contributing_module()
                    && declaration.binding_element.as_deref() == binding.binding_element()
            })
    }

    /// Whether a constructor-injection binding's scope matches a component
    /// in the current ancestry. In a subcomponent-rooted resolution a
    /// mismatch means the binding belongs to a future ancestor, so the
    /// fallback must not claim it here.
    pub(crate) fn is_correctly_scoped_in_subcomponent(
        &self,
        this: usize,
        binding: &ContributionBinding,
    ) -> bool {
        debug_assert!(matches!(
            binding.kind(),
            BindingKind::Injection | BindingKind::AssistedInjection
        ));
        let Some(scope) = binding.scope() else {
            return true;
        };
        if !self.root_descriptor(this).is_subcomponent() || scope.is_reusable() {
            return true;
        }
        let owner = self.owning_resolver(this, binding).unwrap_or(this);
        self.resolvers[owner].descriptor.scopes().contains(scope)
    }

    /// True when the key names a component in the current lineage or one of
    /// their creator types. Such keys are always resolved locally.
    fn is_component_or_creator_key(&self, this: usize, key: &Key) -> bool {
        let ty = key.type_ref();
        self.lineage(this).into_iter().any(|resolver| {
            let descriptor = &self.resolvers[resolver].descriptor;
            descriptor.type_name() == ty.name() || descriptor.creator_type() == Some(ty)
        })
    }
}
