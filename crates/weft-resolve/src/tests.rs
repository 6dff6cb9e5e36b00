//! End-to-end resolution scenarios over small component trees.

use std::collections::HashMap;
use std::rc::Rc;

use weft_model::types::framework;
use weft_model::{
    BindingKind, ComponentDescriptor, ContributionBinding, ContributionIdentifier, Declaration,
    DelegateDeclaration, DependencyRequest, EntryPoint, Key, MembersInjectionBinding,
    ModuleDescriptor, OptionalBindingDeclaration, RequestKind, Scope, SubcomponentDeclaration,
    TypeRef,
};

use crate::graph::{BindingGraph, ComponentGraph};
use crate::options::CompilerOptions;
use crate::registry::InjectBindingRegistry;
use crate::BindingGraphFactory;

fn key(name: &str) -> Key {
    Key::of(name)
}

fn set_key(element: &str) -> Key {
    Key::of(TypeRef::parameterized(
        framework::SET,
        vec![TypeRef::new(element)],
    ))
}

fn optional_key(inner: TypeRef) -> Key {
    Key::of(TypeRef::parameterized(framework::OPTIONAL, vec![inner]))
}

fn provides(module: &str, element: &str, key: Key) -> ContributionBinding {
    ContributionBinding::new(BindingKind::Provision, key).with_element(module, element)
}

fn inject(key: Key, dependencies: &[Key]) -> ContributionBinding {
    ContributionBinding::new(BindingKind::Injection, key).with_dependencies(
        dependencies
            .iter()
            .map(|dependency| DependencyRequest::instance(dependency.clone()))
            .collect(),
    )
}

fn entry(name: &str, key: Key) -> EntryPoint {
    EntryPoint::new(name, DependencyRequest::instance(key))
}

#[derive(Default)]
struct TestRegistry {
    injection_bindings: HashMap<Key, ContributionBinding>,
    members_injection_bindings: HashMap<Key, MembersInjectionBinding>,
    members_injector_bindings: HashMap<Key, ContributionBinding>,
    assisted_factory_bindings: HashMap<Key, ContributionBinding>,
}

impl TestRegistry {
    fn with_injection(mut self, binding: ContributionBinding) -> Self {
        self.injection_bindings.insert(binding.key().clone(), binding);
        self
    }

    fn with_members_injection(mut self, binding: MembersInjectionBinding) -> Self {
        self.members_injection_bindings
            .insert(binding.key().clone(), binding);
        self
    }

    fn with_members_injector(mut self, binding: ContributionBinding) -> Self {
        self.members_injector_bindings
            .insert(binding.key().clone(), binding);
        self
    }

    fn with_assisted_factory(mut self, binding: ContributionBinding) -> Self {
        self.assisted_factory_bindings
            .insert(binding.key().clone(), binding);
        self
    }
}

impl InjectBindingRegistry for TestRegistry {
    fn get_or_find_injection_binding(&self, key: &Key) -> Option<ContributionBinding> {
        self.injection_bindings.get(key).cloned()
    }

    fn get_or_find_members_injection_binding(
        &self,
        key: &Key,
    ) -> Option<MembersInjectionBinding> {
        self.members_injection_bindings.get(key).cloned()
    }

    fn get_or_find_members_injector_binding(&self, key: &Key) -> Option<ContributionBinding> {
        self.members_injector_bindings.get(key).cloned()
    }

    fn assisted_factory_binding(&self, key: &Key) -> Option<ContributionBinding> {
        self.assisted_factory_bindings.get(key).cloned()
    }
}

fn build(registry: &TestRegistry, root: ComponentDescriptor) -> BindingGraph {
    BindingGraphFactory::new(registry, CompilerOptions::default())
        .create(Rc::new(root), false)
}

fn local_keys(component: &ComponentGraph<'_>) -> Vec<Key> {
    component
        .local_resolved_bindings()
        .map(|resolved| resolved.key().clone())
        .collect()
}

// A @Singleton-scoped injectable requested in a subcomponent installs at the
// root carrying the scope, and so do its unscoped dependencies resolved
// there; the subcomponent's table holds the root's node instances.
#[test]
fn test_scoped_injection_hoisted_to_scope_owner() {
    let registry = TestRegistry::default()
        .with_injection(inject(key("Foo"), &[key("Bar")]).with_scope(Scope::new("Singleton")))
        .with_injection(inject(key("Bar"), &[]));

    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session").with_entry_point(entry("foo", key("Foo"))),
    );
    let app = ComponentDescriptor::component("App")
        .with_scope(Scope::new("Singleton"))
        .with_factory_method_child(session);

    let graph = build(&registry, app);
    let root = graph.root();
    let sub = root.subgraphs()[0];

    let root_foo = root.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    let sub_foo = sub.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    assert_eq!(root_foo.binding_nodes().len(), 1);
    assert!(root_foo.binding_nodes()[0].ptr_eq(&sub_foo.binding_nodes()[0]));
    assert_eq!(
        sub_foo.binding_nodes()[0].component_path(),
        root.component_path()
    );

    // Bar was resolved at the root while walking Foo's dependencies; the
    // subcomponent only sees it through the parent walk.
    assert!(local_keys(&root).contains(&key("Bar")));
    assert!(!local_keys(&sub).contains(&key("Bar")));
    let sub_bar = sub.resolved_bindings(&DependencyRequest::instance(key("Bar")));
    assert_eq!(sub_bar.binding_nodes()[0].component_path(), root.component_path());
}

// A subcomponent's own @IntoSet contribution forces the aggregate to be
// re-resolved locally with both contributions; the parent's aggregate keeps
// only its own.
#[test]
fn test_multibinding_contribution_re_resolves_aggregate() {
    let contribution = |module: &str, element: &str| {
        provides(
            module,
            element,
            set_key("String").with_contribution_id(ContributionIdentifier::new(module, element)),
        )
    };
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session")
            .with_module(ModuleDescriptor::new(
                "SessionModule",
                vec![Declaration::Binding(contribution("SessionModule", "b"))],
            ))
            .with_entry_point(entry("strings", set_key("String"))),
    );
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![Declaration::Binding(contribution("AppModule", "a"))],
        ))
        .with_entry_point(entry("strings", set_key("String")))
        .with_factory_method_child(session);

    let graph = build(&TestRegistry::default(), app);
    let root = graph.root();
    let sub = root.subgraphs()[0];

    let root_set = root.resolved_bindings(&DependencyRequest::instance(set_key("String")));
    let sub_set = sub.resolved_bindings(&DependencyRequest::instance(set_key("String")));

    let root_node = &root_set.binding_nodes()[0];
    let sub_node = &sub_set.binding_nodes()[0];
    assert_eq!(root_node.dependencies().len(), 1);
    assert_eq!(sub_node.dependencies().len(), 2);
    assert_eq!(sub_node.component_path(), sub.component_path());
    assert!(!root_node.ptr_eq(sub_node));
}

// A @BindsOptionalOf declaration with no underlying binding resolves to a
// single optional binding with no dependencies. Not an error at this layer.
#[test]
fn test_optional_of_missing_underlying_binding() {
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![Declaration::OptionalBinding(OptionalBindingDeclaration::new(
                key("Foo"),
                "AppModule",
                "optionalFoo",
            ))],
        ))
        .with_entry_point(entry("foo", optional_key(TypeRef::new("Foo"))));

    let graph = build(&TestRegistry::default(), app);
    let resolved = graph
        .root()
        .resolved_bindings(&DependencyRequest::instance(optional_key(TypeRef::new("Foo"))));

    assert_eq!(resolved.binding_nodes().len(), 1);
    let node = &resolved.binding_nodes()[0];
    assert_eq!(
        node.contribution_binding().unwrap().kind(),
        BindingKind::Optional
    );
    assert!(node.dependencies().is_empty());
    // The underlying key never resolved anywhere.
    assert!(!local_keys(&graph.root()).contains(&key("Foo")));
}

// An optional whose underlying binding exists depends on it with the request
// kind implied by the optional's value type.
#[test]
fn test_optional_of_present_underlying_binding() {
    let provider_foo = TypeRef::parameterized(framework::PROVIDER, vec![TypeRef::new("Foo")]);
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![
                Declaration::OptionalBinding(OptionalBindingDeclaration::new(
                    key("Foo"),
                    "AppModule",
                    "optionalFoo",
                )),
                Declaration::Binding(provides("AppModule", "foo", key("Foo"))),
            ],
        ))
        .with_entry_point(entry("foo", optional_key(provider_foo.clone())));

    let graph = build(&TestRegistry::default(), app);
    let resolved = graph
        .root()
        .resolved_bindings(&DependencyRequest::instance(optional_key(provider_foo)));

    let node = &resolved.binding_nodes()[0];
    assert_eq!(node.dependencies().len(), 1);
    assert_eq!(node.dependencies()[0].key, key("Foo"));
    assert_eq!(node.dependencies()[0].kind, RequestKind::Provider);
    assert!(local_keys(&graph.root()).contains(&key("Foo")));
}

// A provision whose dependency is missing at the parent stays resolved at
// the parent even when a subcomponent binds the missing dependency locally:
// non-injection bindings may not float toward missing bindings.
#[test]
fn test_floating_blocked_by_missing_dependency() {
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session")
            .with_module(ModuleDescriptor::new(
                "SessionModule",
                vec![Declaration::Binding(provides("SessionModule", "bar", key("Bar")))],
            ))
            .with_entry_point(entry("foo", key("Foo")))
            .with_entry_point(entry("bar", key("Bar"))),
    );
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![Declaration::Binding(
                provides("AppModule", "foo", key("Foo"))
                    .with_dependencies(vec![DependencyRequest::instance(key("Bar"))]),
            )],
        ))
        .with_factory_method_child(session);

    let graph = build(&TestRegistry::default(), app);
    let root = graph.root();
    let sub = root.subgraphs()[0];

    // Foo is installed at the root and inherited, not re-resolved.
    let sub_foo = sub.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    assert_eq!(sub_foo.binding_nodes()[0].component_path(), root.component_path());
    let root_foo = root.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    assert!(root_foo.binding_nodes()[0].ptr_eq(&sub_foo.binding_nodes()[0]));

    // Bar is missing at the root but present in the subcomponent.
    assert!(root
        .resolved_bindings(&DependencyRequest::instance(key("Bar")))
        .is_empty());
    let sub_bar = sub.resolved_bindings(&DependencyRequest::instance(key("Bar")));
    assert!(!sub_bar.is_empty());
    assert_eq!(sub_bar.binding_nodes()[0].component_path(), sub.component_path());
}

// Mutually recursive delegate declarations cannot resolve their targets;
// both collapse to unresolved-delegate placeholders.
#[test]
fn test_delegate_cycle_yields_unresolved_delegates() {
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![
                Declaration::Delegate(DelegateDeclaration::new(
                    key("A"),
                    DependencyRequest::instance(key("B")),
                    "AppModule",
                    "a",
                )),
                Declaration::Delegate(DelegateDeclaration::new(
                    key("B"),
                    DependencyRequest::instance(key("A")),
                    "AppModule",
                    "b",
                )),
            ],
        ))
        .with_entry_point(entry("a", key("A")))
        .with_entry_point(entry("b", key("B")));

    let graph = build(&TestRegistry::default(), app);
    for requested in ["A", "B"] {
        let resolved = graph
            .root()
            .resolved_bindings(&DependencyRequest::instance(key(requested)));
        assert_eq!(resolved.binding_nodes().len(), 1, "key {requested}");
        assert_eq!(
            resolved.binding_nodes()[0].contribution_binding().unwrap().kind(),
            BindingKind::UnresolvedDelegate,
            "key {requested}"
        );
    }
}

// A non-cyclic delegate chain resolves to a delegate binding forwarding to
// the implementation, which gets resolved as a dependency.
#[test]
fn test_delegate_forwards_to_implementation() {
    let registry = TestRegistry::default().with_injection(inject(key("FooImpl"), &[]));
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![Declaration::Delegate(DelegateDeclaration::new(
                key("Foo"),
                DependencyRequest::instance(key("FooImpl")),
                "AppModule",
                "foo",
            ))],
        ))
        .with_entry_point(entry("foo", key("Foo")));

    let graph = build(&registry, app);
    let resolved = graph
        .root()
        .resolved_bindings(&DependencyRequest::instance(key("Foo")));
    let binding = resolved.binding_nodes()[0].contribution_binding().unwrap();
    assert_eq!(binding.kind(), BindingKind::Delegate);
    assert_eq!(binding.dependencies()[0].key, key("FooImpl"));
    assert!(local_keys(&graph.root()).contains(&key("FooImpl")));
}

// Resolving a creator binding queues its subcomponent on the owning
// resolver, exactly once, no matter how many requests reach it.
#[test]
fn test_subcomponent_creator_discovery() {
    let builder = TypeRef::new("Session.Builder");
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session").with_creator_type(builder.clone()),
    );
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![
                Declaration::Subcomponent(SubcomponentDeclaration::new(
                    Key::of(builder.clone()),
                    "Session",
                    "AppModule",
                )),
                Declaration::Binding(
                    provides("AppModule", "foo", key("Foo")).with_dependencies(vec![
                        DependencyRequest::instance(Key::of(builder.clone())),
                    ]),
                ),
            ],
        ))
        .with_entry_point(entry("foo", key("Foo")))
        .with_entry_point(entry("sessionBuilder", Key::of(builder.clone())))
        .with_module_declared_child(session);

    let graph = build(&TestRegistry::default(), app);
    let root = graph.root();

    let creator = root.resolved_bindings(&DependencyRequest::instance(Key::of(builder)));
    assert_eq!(
        creator.binding_nodes()[0].contribution_binding().unwrap().kind(),
        BindingKind::SubcomponentCreator
    );

    let subgraphs = root.subgraphs();
    assert_eq!(subgraphs.len(), 1);
    assert_eq!(subgraphs[0].component_descriptor().type_name(), "Session");
}

// A @Reusable binding already resolved in an ancestor is reused from there.
#[test]
fn test_reusable_binding_reused_from_ancestor() {
    let registry = TestRegistry::default()
        .with_injection(inject(key("Foo"), &[]).with_scope(Scope::reusable()));
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session").with_entry_point(entry("foo", key("Foo"))),
    );
    let app = ComponentDescriptor::component("App")
        .with_entry_point(entry("foo", key("Foo")))
        .with_factory_method_child(session);

    let graph = build(&registry, app);
    let root = graph.root();
    let sub = root.subgraphs()[0];
    let root_foo = root.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    let sub_foo = sub.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    assert!(root_foo.binding_nodes()[0].ptr_eq(&sub_foo.binding_nodes()[0]));
}

// A production-scoped injectable requested in a subcomponent installs at the
// highest production component.
#[test]
fn test_production_scoped_injection_installed_at_production_root() {
    let registry = TestRegistry::default()
        .with_injection(inject(key("Foo"), &[]).with_scope(Scope::production()));
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session").with_entry_point(entry("foo", key("Foo"))),
    );
    let app = ComponentDescriptor::component("App")
        .production()
        .with_factory_method_child(session);

    let graph = build(&registry, app);
    let root = graph.root();
    let sub = root.subgraphs()[0];
    let sub_foo = sub.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    assert_eq!(sub_foo.binding_nodes()[0].component_path(), root.component_path());
}

// Assisted-injection bindings are never reused from a parent, even when the
// parent already resolved them.
#[test]
fn test_assisted_injection_not_cached_from_parent() {
    let registry = TestRegistry::default().with_injection(ContributionBinding::new(
        BindingKind::AssistedInjection,
        key("Widget"),
    ));
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session")
            .with_entry_point(entry("widget", key("Widget"))),
    );
    let app = ComponentDescriptor::component("App")
        .with_entry_point(entry("widget", key("Widget")))
        .with_factory_method_child(session);

    let graph = build(&registry, app);
    let root = graph.root();
    let sub = root.subgraphs()[0];
    let root_widget = root.resolved_bindings(&DependencyRequest::instance(key("Widget")));
    let sub_widget = sub.resolved_bindings(&DependencyRequest::instance(key("Widget")));
    assert!(!root_widget.binding_nodes()[0].ptr_eq(&sub_widget.binding_nodes()[0]));
    assert_eq!(sub_widget.binding_nodes()[0].component_path(), sub.component_path());
}

// An assisted factory type resolves through the registry's factory binding.
#[test]
fn test_assisted_factory_binding() {
    let registry = TestRegistry::default()
        .with_assisted_factory(
            ContributionBinding::new(BindingKind::AssistedFactory, key("WidgetFactory"))
                .with_dependencies(vec![DependencyRequest::instance(key("Widget"))]),
        )
        .with_injection(ContributionBinding::new(
            BindingKind::AssistedInjection,
            key("Widget"),
        ));
    let app = ComponentDescriptor::component("App")
        .with_entry_point(entry("factory", key("WidgetFactory")));

    let graph = build(&registry, app);
    let resolved = graph
        .root()
        .resolved_bindings(&DependencyRequest::instance(key("WidgetFactory")));
    assert_eq!(
        resolved.binding_nodes()[0].contribution_binding().unwrap().kind(),
        BindingKind::AssistedFactory
    );
    assert!(local_keys(&graph.root()).contains(&key("Widget")));
}

// MembersInjector<T> requests resolve through the registry.
#[test]
fn test_members_injector_request() {
    let injector_key = Key::of(TypeRef::parameterized(
        framework::MEMBERS_INJECTOR,
        vec![TypeRef::new("Widget")],
    ));
    let registry = TestRegistry::default().with_members_injector(ContributionBinding::new(
        BindingKind::MembersInjector,
        injector_key.clone(),
    ));
    let app = ComponentDescriptor::component("App")
        .with_entry_point(entry("injector", injector_key.clone()));

    let graph = build(&registry, app);
    let resolved = graph
        .root()
        .resolved_bindings(&DependencyRequest::instance(injector_key));
    assert_eq!(
        resolved.binding_nodes()[0].contribution_binding().unwrap().kind(),
        BindingKind::MembersInjector
    );
}

// Members-injection resolutions live in their own table, resolve their
// dependencies, and are never inherited by subcomponents.
#[test]
fn test_members_injection_resolved_locally() {
    let registry = TestRegistry::default()
        .with_members_injection(MembersInjectionBinding::new(
            key("Widget"),
            vec![DependencyRequest::instance(key("Dep"))],
        ))
        .with_injection(inject(key("Dep"), &[]));
    let members_request = DependencyRequest::new(key("Widget"), RequestKind::MembersInjection);
    let app = ComponentDescriptor::component("App")
        .with_entry_point(EntryPoint::new("inject", members_request.clone()));

    let graph = build(&registry, app);
    let root = graph.root();
    let resolved = root.resolved_bindings(&members_request);
    assert!(!resolved.is_empty());
    // The dependency landed in the contribution table.
    assert!(local_keys(&root).contains(&key("Dep")));
    // The members-injection key is not a contribution resolution.
    assert!(
        !root
            .local_resolved_bindings()
            .filter_map(|r| r.binding_nodes().first())
            .filter_map(|node| node.contribution_binding())
            .any(|binding| binding.key() == &key("Widget"))
    );
}

// A duplicate explicit binding in a subcomponent forces local re-resolution
// with both bindings in view, so the validator can report the duplicate.
#[test]
fn test_duplicate_explicit_binding_re_resolved_locally() {
    let session = Rc::new(
        ComponentDescriptor::subcomponent("Session")
            .with_module(ModuleDescriptor::new(
                "SessionModule",
                vec![Declaration::Binding(provides("SessionModule", "foo", key("Foo")))],
            ))
            .with_entry_point(entry("foo", key("Foo"))),
    );
    let app = ComponentDescriptor::component("App")
        .with_module(ModuleDescriptor::new(
            "AppModule",
            vec![Declaration::Binding(provides("AppModule", "foo", key("Foo")))],
        ))
        .with_entry_point(entry("foo", key("Foo")))
        .with_factory_method_child(session);

    let graph = build(&TestRegistry::default(), app);
    let root = graph.root();
    let sub = root.subgraphs()[0];

    assert_eq!(
        root.resolved_bindings(&DependencyRequest::instance(key("Foo")))
            .binding_nodes()
            .len(),
        1
    );
    let sub_foo = sub.resolved_bindings(&DependencyRequest::instance(key("Foo")));
    assert_eq!(sub_foo.binding_nodes().len(), 2);
    for node in sub_foo.binding_nodes() {
        assert_eq!(node.component_path(), sub.component_path());
    }
}

// Constructor-injection dependency cycles resolve without recursing forever;
// the frame that saw the key first completes the table.
#[test]
fn test_dependency_cycle_terminates() {
    let registry = TestRegistry::default()
        .with_injection(inject(key("Chicken"), &[key("Egg")]))
        .with_injection(inject(key("Egg"), &[key("Chicken")]));
    let app = ComponentDescriptor::component("App")
        .with_entry_point(entry("chicken", key("Chicken")));

    let graph = build(&registry, app);
    let root = graph.root();
    assert!(!root
        .resolved_bindings(&DependencyRequest::instance(key("Chicken")))
        .is_empty());
    assert!(!root
        .resolved_bindings(&DependencyRequest::instance(key("Egg")))
        .is_empty());
}

// Resolving the same key through two entry points yields one table entry.
#[test]
fn test_resolution_is_idempotent() {
    let registry = TestRegistry::default().with_injection(inject(key("Foo"), &[]));
    let app = ComponentDescriptor::component("App")
        .with_entry_point(entry("foo", key("Foo")))
        .with_entry_point(entry("fooAgain", key("Foo")));

    let graph = build(&registry, app);
    let keys = local_keys(&graph.root());
    assert_eq!(keys.iter().filter(|k| **k == key("Foo")).count(), 1);
}

// Full-binding-graph mode resolves module declarations nobody requests,
// stripping contribution identifiers so aggregates resolve too.
#[test]
fn test_full_binding_graph_mode_resolves_unrequested_declarations() {
    let app = || {
        ComponentDescriptor::component("App").with_module(ModuleDescriptor::new(
            "AppModule",
            vec![
                Declaration::Binding(provides("AppModule", "orphan", key("Orphan"))),
                Declaration::Binding(provides(
                    "AppModule",
                    "s",
                    set_key("String")
                        .with_contribution_id(ContributionIdentifier::new("AppModule", "s")),
                )),
            ],
        ))
    };
    let registry = TestRegistry::default();

    let reachable_only =
        BindingGraphFactory::new(&registry, CompilerOptions::default()).create(Rc::new(app()), false);
    assert!(local_keys(&reachable_only.root()).is_empty());

    let full =
        BindingGraphFactory::new(&registry, CompilerOptions::default()).create(Rc::new(app()), true);
    let keys = local_keys(&full.root());
    assert!(keys.contains(&key("Orphan")));
    // The aggregate, not just the contribution, is resolved.
    assert!(keys.contains(&set_key("String")));
}
