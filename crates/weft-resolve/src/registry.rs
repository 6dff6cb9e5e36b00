//! Inject binding discovery.

use weft_model::{ContributionBinding, Key, MembersInjectionBinding};

/// Source of implicit bindings discovered from annotated types.
///
/// The resolver consults this registry when no explicit declaration satisfies
/// a key: for constructor-injection bindings, for members injection, for
/// `MembersInjector<T>` requests, and for assisted-factory types. The
/// registry is expected to memoize; "get or find" may trigger discovery on
/// first use.
pub trait InjectBindingRegistry {
    /// The constructor-injection binding for `key`, if its type has an
    /// injectable constructor.
    fn get_or_find_injection_binding(&self, key: &Key) -> Option<ContributionBinding>;

    /// The members-injection binding for `key`, if its type has injectable
    /// members.
    fn get_or_find_members_injection_binding(&self, key: &Key)
    -> Option<MembersInjectionBinding>;

    /// The contribution binding for a `MembersInjector<T>` key.
    fn get_or_find_members_injector_binding(&self, key: &Key) -> Option<ContributionBinding>;

    /// The factory binding for `key`, if its type is an assisted-factory
    /// type; `None` otherwise.
    fn assisted_factory_binding(&self, key: &Key) -> Option<ContributionBinding>;
}
