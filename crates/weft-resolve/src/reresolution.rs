//! Re-resolution analysis.
//!
//! When a binding was already resolved in an ancestor, the current component
//! must re-resolve its key only if it *changes* the answer: a local
//! multibinding contribution, a local optional contribution, or a duplicate
//! explicit binding. Two predicates propagate through the dependency graph,
//! "depends on a local binding" and "depends on a missing binding", and
//! because that graph may contain cycles, both are computed together by one
//! strongly-connected-component pass over the previously resolved bindings
//! and memoized per resolver.
//!
//! Floating is deliberately asymmetric: non-injection bindings may float
//! down to pick up new multibinding contributions, but not to pick up
//! bindings that were missing at the ancestor and only installed in a
//! descendant. Those stay unresolved where they were.

use indexmap::{IndexMap, IndexSet};

use weft_model::{Binding, BindingKind, ContributionBinding, Key};

use crate::resolver::ResolutionPass;
use crate::tarjan;

impl ResolutionPass<'_> {
    /// Whether `binding`, previously resolved in an ancestor, must be
    /// re-resolved at this component.
    pub(crate) fn requires_resolution(&mut self, this: usize, binding: &ContributionBinding) -> bool {
        // A binding that is not allowed to float cannot be re-resolved here.
        if self.is_not_allowed_to_float(this, binding) {
            return false;
        }
        if self.has_local_bindings_for_binding(this, binding) {
            return true;
        }
        if !should_check_dependencies_of_contribution(binding) {
            return false;
        }
        let dependency_keys: Vec<Key> = binding
            .dependencies()
            .iter()
            .map(|dependency| dependency.key.clone())
            .collect();
        dependency_keys
            .iter()
            .any(|key| self.requires_resolution_for_key(this, key))
    }

    /// Keys that depend on missing bindings are re-resolved too (when
    /// allowed to float); that keeps dependency traces from dragging in
    /// every floatable binding above the actually-missing one.
    fn requires_resolution_for_key(&mut self, this: usize, key: &Key) -> bool {
        self.depends_on_local_binding(this, key) || self.depends_on_missing_binding(this, key)
    }

    fn is_not_allowed_to_float(&mut self, this: usize, binding: &ContributionBinding) -> bool {
        binding.kind() != BindingKind::Injection
            && binding.kind() != BindingKind::AssistedInjection
            && self.depends_on_missing_binding(this, binding.key())
    }

    fn depends_on_missing_binding(&mut self, this: usize, key: &Key) -> bool {
        if !self.resolvers[this]
            .key_depends_on_missing_binding
            .contains_key(key)
        {
            self.visit_uncached_dependencies(this, key);
        }
        *self.resolvers[this]
            .key_depends_on_missing_binding
            .get(key)
            .expect("filled by the visit above")
    }

    fn depends_on_local_binding(&mut self, this: usize, key: &Key) -> bool {
        if !self.resolvers[this]
            .key_depends_on_local_bindings
            .contains_key(key)
        {
            self.visit_uncached_dependencies(this, key);
        }
        *self.resolvers[this]
            .key_depends_on_local_bindings
            .get(key)
            .expect("filled by the visit above")
    }

    /// Fills both caches for every uncached key reachable from
    /// `request_key`, one strongly connected component at a time in reverse
    /// topological order: when a component is processed, every dependency
    /// outside it is already cached.
    fn visit_uncached_dependencies(&mut self, this: usize, request_key: &Key) {
        for cycle_keys in self.uncached_strongly_connected_components(this, request_key) {
            assert!(
                cycle_keys.iter().all(|key| {
                    !self.resolvers[this]
                        .key_depends_on_local_bindings
                        .contains_key(key)
                        && !self.resolvers[this]
                            .key_depends_on_missing_binding
                            .contains_key(key)
                }),
                "cycle keys must be uncached"
            );

            let cycle_bindings: Vec<_> = cycle_keys
                .iter()
                .map(|key| {
                    self.previously_resolved_bindings(this, key)
                        .unwrap_or_else(|| {
                            panic!(
                                "no previously resolved bindings in {} for {key}",
                                self.resolvers[this].component_path
                            )
                        })
                        .clone()
                })
                .collect();

            // Dependencies that leave the cycle; everything inside the cycle
            // shares one answer.
            let external_dependency_keys: Vec<Key> = cycle_bindings
                .iter()
                .flat_map(|resolved| resolved.bindings())
                .filter(|binding| should_check_dependencies(binding))
                .flat_map(|binding| binding.dependencies())
                .map(|dependency| dependency.key.clone())
                .filter(|key| !cycle_keys.contains(key))
                .collect();

            let depends_on_missing_binding = cycle_bindings
                .iter()
                .any(|resolved| resolved.is_empty())
                || external_dependency_keys.iter().any(|key| {
                    *self.resolvers[this]
                        .key_depends_on_missing_binding
                        .get(key)
                        .expect("dependencies outside the cycle are cached first")
                });
            for key in &cycle_keys {
                self.resolvers[this]
                    .key_depends_on_missing_binding
                    .insert(key.clone(), depends_on_missing_binding);
            }

            // Scoped bindings are not filtered here: a scoped binding with a
            // duplicate in this component must still be re-resolved so the
            // duplicate gets reported.
            let depends_on_local_bindings = cycle_bindings
                .iter()
                .any(|resolved| self.has_local_bindings(this, resolved))
                || external_dependency_keys.iter().any(|key| {
                    *self.resolvers[this]
                        .key_depends_on_local_bindings
                        .get(key)
                        .expect("dependencies outside the cycle are cached first")
                });
            for key in &cycle_keys {
                self.resolvers[this]
                    .key_depends_on_local_bindings
                    .insert(key.clone(), depends_on_local_bindings);
            }
        }
    }

    /// The strongly connected components of the uncached dependency graph
    /// under `request_key`, in reverse topological order.
    ///
    /// Expansion stops at keys that already have a cached value; their
    /// answers are folded in when their dependents are processed.
    fn uncached_strongly_connected_components(
        &self,
        this: usize,
        request_key: &Key,
    ) -> Vec<Vec<Key>> {
        let mut uncached_keys: IndexSet<Key> = IndexSet::new();
        let mut successors: IndexMap<Key, IndexSet<Key>> = IndexMap::new();
        let mut queue = vec![request_key.clone()];
        while let Some(key) = queue.pop() {
            if self.resolvers[this]
                .key_depends_on_local_bindings
                .contains_key(&key)
                || !uncached_keys.insert(key.clone())
            {
                continue;
            }
            let resolved = self
                .previously_resolved_bindings(this, &key)
                .unwrap_or_else(|| {
                    panic!(
                        "no previously resolved bindings in {} for {key}",
                        self.resolvers[this].component_path
                    )
                });
            for binding in resolved.bindings() {
                if !should_check_dependencies(binding) {
                    continue;
                }
                for dependency in binding.dependencies() {
                    queue.push(dependency.key.clone());
                    successors
                        .entry(key.clone())
                        .or_default()
                        .insert(dependency.key.clone());
                }
            }
        }

        tarjan::strongly_connected_components(&uncached_keys, |key| {
            // Successors were queued eagerly; only the ones that stayed
            // uncached participate in the component analysis.
            successors
                .get(key)
                .map(|keys| {
                    keys.iter()
                        .filter(|successor| uncached_keys.contains(*successor))
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
    }
}

/// Dependencies of scoped and production bindings are skipped: duplicates
/// underneath a scoped binding are unused, and production subcomponents keep
/// their bindings pinned.
fn should_check_dependencies(binding: &Binding) -> bool {
    match binding {
        Binding::Contribution(contribution) => {
            should_check_dependencies_of_contribution(contribution)
        }
        Binding::MembersInjection(_) => true,
    }
}

fn should_check_dependencies_of_contribution(binding: &ContributionBinding) -> bool {
    !is_scoped_to_component(binding) && binding.kind() != BindingKind::Production
}

fn is_scoped_to_component(binding: &ContributionBinding) -> bool {
    binding.scope().is_some_and(|scope| !scope.is_reusable())
}
