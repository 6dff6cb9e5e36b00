//! Synthetic binding construction.
//!
//! Multibound sets and maps, optionals, delegates, and subcomponent creators
//! have no user-written binding; the resolver materializes them here from
//! the declarations it gathered.

use indexmap::IndexSet;

use weft_model::types::framework;
use weft_model::{
    BindingKind, ContributionBinding, DelegateDeclaration, DependencyRequest, Key, RequestKind,
    SubcomponentDeclaration, TypeRef,
};

use crate::nodes::ResolvedBindings;

/// The synthesized set aggregating `contributions`.
///
/// Each contribution becomes an instance dependency on its own (identified)
/// key, so resolving the aggregate resolves every contribution.
pub(crate) fn multibound_set(
    key: &Key,
    contributions: &IndexSet<ContributionBinding>,
) -> ContributionBinding {
    ContributionBinding::new(BindingKind::MultiboundSet, key.clone()).with_dependencies(
        contributions
            .iter()
            .map(|contribution| DependencyRequest::instance(contribution.key().clone()))
            .collect(),
    )
}

/// The synthesized map aggregating `contributions`.
///
/// Map values are held behind providers, so contributions are depended on as
/// provider requests.
pub(crate) fn multibound_map(
    key: &Key,
    contributions: &IndexSet<ContributionBinding>,
) -> ContributionBinding {
    ContributionBinding::new(BindingKind::MultiboundMap, key.clone()).with_dependencies(
        contributions
            .iter()
            .map(|contribution| {
                DependencyRequest::new(contribution.key().clone(), RequestKind::Provider)
            })
            .collect(),
    )
}

/// The synthesized optional around `underlying`.
///
/// When the underlying resolution is empty this is a present-but-empty
/// optional with no dependencies; otherwise it depends on the unwrapped key
/// with the request kind implied by the optional's value type.
pub(crate) fn optional_binding(key: &Key, underlying: &ResolvedBindings) -> ContributionBinding {
    let binding = ContributionBinding::new(BindingKind::Optional, key.clone());
    if underlying.is_empty() {
        return binding;
    }
    let value_type = key
        .type_ref()
        .type_argument()
        .expect("optional bindings are synthesized for Optional<T> keys only");
    binding.with_dependencies(vec![DependencyRequest::new(
        underlying.key().clone(),
        RequestKind::for_framework_type(value_type),
    )])
}

/// The creator binding declared by `declarations` (all for the same key).
pub(crate) fn subcomponent_creator_binding(
    key: &Key,
    declarations: &IndexSet<SubcomponentDeclaration>,
) -> ContributionBinding {
    let declaration = declarations
        .first()
        .expect("creator bindings are synthesized from at least one declaration");
    let mut binding = ContributionBinding::new(BindingKind::SubcomponentCreator, key.clone());
    if let Some(module) = &declaration.contributing_module {
        binding = binding.with_element(module.clone(), declaration.subcomponent.clone());
    }
    binding
}

/// A delegate binding forwarding to `target`.
///
/// An unresolved target propagates: delegating to a broken chain is itself a
/// broken chain.
pub(crate) fn delegate_binding(
    declaration: &DelegateDeclaration,
    target: &ContributionBinding,
) -> ContributionBinding {
    if target.kind() == BindingKind::UnresolvedDelegate {
        return unresolved_delegate_binding(declaration);
    }
    delegate_binding_of_kind(declaration, BindingKind::Delegate)
}

/// The placeholder for a delegate whose target is missing or cyclic.
pub(crate) fn unresolved_delegate_binding(
    declaration: &DelegateDeclaration,
) -> ContributionBinding {
    delegate_binding_of_kind(declaration, BindingKind::UnresolvedDelegate)
}

fn delegate_binding_of_kind(
    declaration: &DelegateDeclaration,
    kind: BindingKind,
) -> ContributionBinding {
    let mut binding = ContributionBinding::new(kind, framework_wrapped_key(declaration))
        .with_dependencies(vec![declaration.delegate_request.clone()]);
    if let Some(scope) = &declaration.scope {
        binding = binding.with_scope(scope.clone());
    }
    if let (Some(module), Some(element)) = (
        &declaration.contributing_module,
        &declaration.binding_element,
    ) {
        binding = binding.with_element(module.clone(), element.clone());
    }
    binding
}

/// Map delegate contributions are declared with plain `Map<K, V>` keys, but
/// the bindings they produce live alongside provides-style contributions
/// whose map values are provider-wrapped. Wrap the declared key to match.
fn framework_wrapped_key(declaration: &DelegateDeclaration) -> Key {
    let key = &declaration.key;
    if key.multibinding_contribution_id().is_none() {
        return key.clone();
    }
    match (key.type_ref().map_key(), key.type_ref().map_value()) {
        (Some(map_key), Some(value)) if !value.is_framework_wrapper() => {
            let wrapped = TypeRef::parameterized(
                framework::MAP,
                vec![
                    map_key.clone(),
                    TypeRef::parameterized(framework::PROVIDER, vec![value.clone()]),
                ],
            );
            let mut wrapped_key = Key::of(wrapped);
            if let Some(qualifier) = key.qualifier() {
                wrapped_key = Key::qualified(qualifier.clone(), wrapped_key.type_ref().clone());
            }
            wrapped_key.with_contribution_id(
                key.multibinding_contribution_id()
                    .expect("checked above")
                    .clone(),
            )
        }
        _ => key.clone(),
    }
}
