//! Per-component declaration index.
//!
//! Materialized once per component from its installed modules, then queried
//! by key during resolution. All indexes are insertion-ordered so the output
//! graph is deterministic.
//!
//! Multibinding contributions (both provides-style bindings and delegate
//! declarations) are additionally indexed under a *normalized* key, with the
//! contribution identifier stripped and any map framework wrapper unwrapped,
//! so that `Map<K, V>` and `Map<K, Provider<V>>` requests reach the same
//! contributions.

use indexmap::IndexMap;

use weft_model::{
    ComponentDescriptor, ContributionBinding, Declaration, DelegateDeclaration, Key,
    MultibindingDeclaration, OptionalBindingDeclaration, SubcomponentDeclaration,
};

/// All declarations of one component, indexed by key.
#[derive(Debug, Default)]
pub struct ComponentDeclarations {
    bindings: IndexMap<Key, Vec<ContributionBinding>>,
    multibinding_contributions: IndexMap<Key, Vec<ContributionBinding>>,
    delegates: IndexMap<Key, Vec<DelegateDeclaration>>,
    delegate_multibinding_contributions: IndexMap<Key, Vec<DelegateDeclaration>>,
    multibindings: IndexMap<Key, Vec<MultibindingDeclaration>>,
    optional_bindings: IndexMap<Key, Vec<OptionalBindingDeclaration>>,
    subcomponents: IndexMap<Key, Vec<SubcomponentDeclaration>>,
    all: Vec<Declaration>,
}

/// The key multibinding contributions are aggregated under.
fn multibinding_key(key: &Key) -> Key {
    key.without_multibinding_contribution_id().unwrap_map_value_type()
}

impl ComponentDeclarations {
    /// Indexes the declarations of every module installed on `descriptor`.
    pub fn for_component(descriptor: &ComponentDescriptor) -> Self {
        let mut index = Self::default();
        for module in descriptor.modules() {
            for declaration in &module.declarations {
                index.insert(declaration.clone());
            }
        }
        index
    }

    fn insert(&mut self, declaration: Declaration) {
        match &declaration {
            Declaration::Binding(binding) => {
                // Explicit bindings are indexed by their full key; contributions
                // are additionally gathered under the multibinding key.
                self.bindings
                    .entry(binding.key().clone())
                    .or_default()
                    .push(binding.clone());
                if binding.key().multibinding_contribution_id().is_some() {
                    self.multibinding_contributions
                        .entry(multibinding_key(binding.key()))
                        .or_default()
                        .push(binding.clone());
                }
            }
            Declaration::Delegate(delegate) => {
                self.delegates
                    .entry(delegate.key.clone())
                    .or_default()
                    .push(delegate.clone());
                if delegate.key.multibinding_contribution_id().is_some() {
                    self.delegate_multibinding_contributions
                        .entry(multibinding_key(&delegate.key))
                        .or_default()
                        .push(delegate.clone());
                }
            }
            Declaration::Multibinding(multibinding) => {
                self.multibindings
                    .entry(multibinding.key.clone())
                    .or_default()
                    .push(multibinding.clone());
            }
            Declaration::OptionalBinding(optional) => {
                self.optional_bindings
                    .entry(optional.key.clone())
                    .or_default()
                    .push(optional.clone());
            }
            Declaration::Subcomponent(subcomponent) => {
                self.subcomponents
                    .entry(subcomponent.key.clone())
                    .or_default()
                    .push(subcomponent.clone());
            }
        }
        self.all.push(declaration);
    }

    /// Explicit bindings for `key`, multibinding contributions included when
    /// the key carries a contribution identifier.
    pub fn bindings(&self, key: &Key) -> &[ContributionBinding] {
        self.bindings.get(key).map_or(&[], Vec::as_slice)
    }

    /// Provides-style contributions to the multibinding `key` aggregates.
    pub fn multibinding_contributions(&self, key: &Key) -> &[ContributionBinding] {
        self.multibinding_contributions
            .get(&multibinding_key(key))
            .map_or(&[], Vec::as_slice)
    }

    /// Delegate declarations for `key`, matched on the declaration's own key.
    pub fn delegates(&self, key: &Key) -> &[DelegateDeclaration] {
        self.delegates.get(key).map_or(&[], Vec::as_slice)
    }

    /// Delegate contributions to the multibinding `key` aggregates.
    pub fn delegate_multibinding_contributions(&self, key: &Key) -> &[DelegateDeclaration] {
        self.delegate_multibinding_contributions
            .get(&multibinding_key(key))
            .map_or(&[], Vec::as_slice)
    }

    /// `@Multibinds`-style declarations for `key`.
    pub fn multibindings(&self, key: &Key) -> &[MultibindingDeclaration] {
        self.multibindings.get(key).map_or(&[], Vec::as_slice)
    }

    /// Optional binding declarations, queried by the *underlying* key.
    pub fn optional_bindings(&self, key: &Key) -> &[OptionalBindingDeclaration] {
        self.optional_bindings.get(key).map_or(&[], Vec::as_slice)
    }

    /// Subcomponent declarations for a creator `key`.
    pub fn subcomponents(&self, key: &Key) -> &[SubcomponentDeclaration] {
        self.subcomponents.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every declaration, in module installation order.
    pub fn all_declarations(&self) -> &[Declaration] {
        &self.all
    }
}
