use std::collections::BTreeSet;
use std::sync::Arc;

use eqmeta_common::{ArtifactId, FieldId, MetadataId, TypeId};
use eqmeta_config::{load_config_from_str, EngineConfig, RecomputePolicy};
use eqmeta_equals::{
    codes, ArtifactChange, ArtifactEvent, ArtifactState, MetadataProvider, ProviderError,
};
use eqmeta_model::{
    AnnotationValues, FieldDescriptor, InMemoryStore, JavaType, Modifier, TypeDescriptor,
};
use parking_lot::Mutex;

fn field(name: &str, ty: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, ty.parse::<JavaType>().unwrap())
}

fn equality() -> AnnotationValues {
    AnnotationValues::default()
}

fn excluding(names: &[&str]) -> AnnotationValues {
    AnnotationValues {
        exclude_fields: names.iter().map(|n| n.to_string()).collect(),
        append_super: false,
    }
}

fn aid(name: &str) -> ArtifactId {
    ArtifactId::new(name, "main")
}

fn fid(ty: &str, name: &str) -> MetadataId {
    FieldId::new(ty, "main", name).into()
}

fn tid(name: &str) -> MetadataId {
    TypeId::new(name, "main").into()
}

fn person() -> TypeDescriptor {
    TypeDescriptor::new("com.example.Person", "main")
        .with_equality(excluding(&["age"]))
        .with_version_field("version")
        .with_field(field("name", "java.lang.String"))
        .with_field(field("age", "int"))
        .with_field(field("friends", "java.util.List<com.example.Person>"))
        .with_field(field("version", "long"))
}

fn order() -> TypeDescriptor {
    TypeDescriptor::new("com.example.Order", "main")
        .with_equality(equality())
        .with_identity_field("id")
        .with_field(field("id", "java.lang.Long"))
        .with_field(field("total", "java.math.BigDecimal"))
        .with_field(field("STATUS", "java.lang.String").with_modifiers(Modifier::Static))
}

fn store_with(types: Vec<TypeDescriptor>) -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    for ty in types {
        store.insert(ty);
    }
    Arc::new(store)
}

fn provider(store: &Arc<InMemoryStore>) -> MetadataProvider<InMemoryStore> {
    MetadataProvider::new(Arc::clone(store), &EngineConfig::default())
}

fn lazy_provider(store: &Arc<InMemoryStore>) -> MetadataProvider<InMemoryStore> {
    let config = load_config_from_str("[engine]\nrecompute = \"lazy\"\n").unwrap();
    assert_eq!(config.engine.recompute, RecomputePolicy::Lazy);
    MetadataProvider::new(Arc::clone(store), &config)
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(String, bool)>>,
}

impl Recorder {
    fn attach(provider: &MetadataProvider<InMemoryStore>) -> Arc<Self> {
        let recorder = Arc::new(Self::default());
        let sink = Arc::clone(&recorder);
        provider.subscribe(move |event: &ArtifactEvent| {
            sink.events
                .lock()
                .push((event.id.type_name().to_string(), event.is_removal()));
        });
        recorder
    }

    fn take(&self) -> Vec<(String, bool)> {
        std::mem::take(&mut *self.events.lock())
    }
}

/// Every cached artifact has exactly one field edge per selected field, and
/// every edge points at a cached artifact.
fn assert_edges_consistent(provider: &MetadataProvider<InMemoryStore>) {
    let ids = provider.cached_ids();
    let artifacts: Vec<_> = ids.iter().map(|id| provider.get(id).unwrap()).collect();
    let registry = provider.registry();

    for artifact in &artifacts {
        let mut edge_fields: Vec<String> = registry
            .upstream_of(&artifact.id)
            .into_iter()
            .filter_map(|up| match up {
                MetadataId::Field(f) => Some(f.field_name().to_string()),
                _ => None,
            })
            .collect();
        edge_fields.sort();
        let mut selected: Vec<String> =
            artifact.field_names().into_iter().map(String::from).collect();
        selected.sort();
        assert_eq!(edge_fields, selected, "field edges of {}", artifact.id);
    }
    for (_, downstream) in registry.edges() {
        assert!(ids.contains(&downstream), "edge to uncached {downstream}");
    }
}

#[test]
fn person_selects_name_only() {
    let store = store_with(vec![person()]);
    let provider = provider(&store);
    let artifact = provider.get(&aid("com.example.Person")).unwrap();
    assert_eq!(artifact.field_names(), vec!["name"]);
    assert!(!artifact.delegated);
    assert_eq!(artifact.container_name, "Person_Equals");

    let registry = provider.registry();
    assert_eq!(registry.edge_count(), 1);
    assert!(registry.contains_edge(
        &fid("com.example.Person", "name"),
        &aid("com.example.Person")
    ));
}

#[test]
fn order_selects_id_and_total() {
    let store = store_with(vec![order()]);
    let provider = provider(&store);
    let artifact = provider.get(&aid("com.example.Order")).unwrap();
    assert_eq!(artifact.field_names(), vec!["id", "total"]);
    assert_eq!(
        artifact.identifier_field.as_ref().map(|f| f.name.as_str()),
        Some("id")
    );
    assert_edges_consistent(&provider);
}

#[test]
fn removing_order_total_retires_its_edge() {
    let store = store_with(vec![order()]);
    let provider = provider(&store);
    provider.prime();
    let recorder = Recorder::attach(&provider);
    let before = provider.get(&aid("com.example.Order")).unwrap();

    store.update("com.example.Order", |ty| ty.fields.retain(|f| f.name != "total"));
    let report = provider.notify(&fid("com.example.Order", "total"));
    assert_eq!(report.recomputed, vec![aid("com.example.Order")]);

    let after = provider.get(&aid("com.example.Order")).unwrap();
    assert_eq!(after.field_names(), vec!["id"]);
    assert_ne!(before.fingerprint, after.fingerprint);
    assert!(!provider
        .registry()
        .contains_edge(&fid("com.example.Order", "total"), &aid("com.example.Order")));
    assert_eq!(recorder.take(), vec![("com.example.Order".to_string(), false)]);
    assert_edges_consistent(&provider);

    // The retired field no longer reaches anything.
    assert!(provider.notify(&fid("com.example.Order", "total")).is_empty());
}

#[test]
fn delegated_type_has_no_fields_or_edges() {
    let dto = TypeDescriptor::new("com.example.Dto", "main")
        .with_equality(equality())
        .with_external_equality()
        .with_identity_field("id")
        .with_field(field("id", "java.lang.Long"))
        .with_field(field("label", "java.lang.String"));
    let store = store_with(vec![dto]);
    let provider = provider(&store);
    let artifact = provider.get(&aid("com.example.Dto")).unwrap();
    assert!(artifact.delegated);
    assert!(artifact.fields.is_empty());
    assert!(artifact.identifier_field.is_none());
    assert!(provider.registry().is_empty());
}

#[test]
fn unrelated_artifacts_stay_cached() {
    let store = store_with(vec![person(), order()]);
    let provider = provider(&store);
    provider.prime();
    let person_before = provider.get(&aid("com.example.Person")).unwrap();

    let report = provider.notify(&fid("com.example.Order", "id"));
    assert_eq!(report.recomputed, vec![aid("com.example.Order")]);
    assert_eq!(
        provider.state(&aid("com.example.Person")),
        ArtifactState::Cached
    );
    let person_after = provider.get(&aid("com.example.Person")).unwrap();
    assert!(Arc::ptr_eq(&person_before, &person_after));
}

#[test]
fn inherited_fields_are_keyed_by_declaring_type() {
    let base = TypeDescriptor::new("com.example.BaseEntity", "core")
        .with_field(field("id", "java.lang.Long"))
        .with_field(field("version", "long"));
    let customer = TypeDescriptor::new("com.example.Customer", "main")
        .with_supertype("com.example.BaseEntity")
        .with_equality(equality())
        .with_identity_field("id")
        .with_version_field("version")
        .with_field(field("email", "java.lang.String"));
    let store = store_with(vec![base, customer]);
    let provider = provider(&store);
    let artifact = provider.get(&aid("com.example.Customer")).unwrap();
    assert_eq!(artifact.field_names(), vec!["email", "id"]);

    let registry = provider.registry();
    let inherited: MetadataId = FieldId::new("com.example.BaseEntity", "core", "id").into();
    assert!(registry.contains_edge(&inherited, &aid("com.example.Customer")));
    let supertype: MetadataId = TypeId::new("com.example.BaseEntity", "core").into();
    assert!(registry.contains_edge(&supertype, &aid("com.example.Customer")));
}

#[test]
fn supertype_change_reaches_subtype() {
    let base = TypeDescriptor::new("com.example.BaseEntity", "main")
        .with_field(field("id", "java.lang.Long"));
    let customer = TypeDescriptor::new("com.example.Customer", "main")
        .with_supertype("com.example.BaseEntity")
        .with_equality(equality())
        .with_field(field("email", "java.lang.String"));
    let store = store_with(vec![base, customer]);
    let provider = provider(&store);
    provider.prime();

    store.update("com.example.BaseEntity", |ty| {
        ty.fields.push(field("createdAt", "java.time.Instant"));
    });
    let report = provider.notify(&tid("com.example.BaseEntity"));
    assert_eq!(report.recomputed, vec![aid("com.example.Customer")]);
    let artifact = provider.get(&aid("com.example.Customer")).unwrap();
    assert_eq!(artifact.field_names(), vec!["createdAt", "email", "id"]);
    assert_edges_consistent(&provider);
}

fn address_and_customer() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new("com.example.Address", "main")
            .with_equality(equality())
            .with_field(field("street", "java.lang.String")),
        TypeDescriptor::new("com.example.Customer", "main")
            .with_equality(equality())
            .with_field(field("address", "com.example.Address"))
            .with_field(field("name", "java.lang.String")),
    ]
}

fn appending_super(exclude: &[&str]) -> AnnotationValues {
    AnnotationValues {
        append_super: true,
        ..excluding(exclude)
    }
}

/// `Customer extends Party` and appends the `Party` comparison.
fn party_and_customer(customer_excludes: &[&str]) -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new("com.example.Party", "main")
            .with_equality(equality())
            .with_field(field("name", "java.lang.String")),
        TypeDescriptor::new("com.example.Customer", "main")
            .with_supertype("com.example.Party")
            .with_equality(appending_super(customer_excludes))
            .with_field(field("email", "java.lang.String")),
    ]
}

#[test]
fn field_type_reference_is_not_a_dependency() {
    let store = store_with(address_and_customer());
    let provider = provider(&store);
    provider.prime();
    let customer_before = provider.get(&aid("com.example.Customer")).unwrap();
    assert!(!provider.registry().contains_edge(
        &aid("com.example.Address").into(),
        &aid("com.example.Customer")
    ));

    store.update("com.example.Address", |ty| ty.fields[0].name = "line1".into());
    let report = provider.notify(&fid("com.example.Address", "street"));
    assert_eq!(report.recomputed, vec![aid("com.example.Address")]);
    assert_eq!(
        provider.get(&aid("com.example.Address")).unwrap().field_names(),
        vec!["line1"]
    );
    let customer_after = provider.get(&aid("com.example.Customer")).unwrap();
    assert!(Arc::ptr_eq(&customer_before, &customer_after));
    assert_edges_consistent(&provider);
}

#[test]
fn bidirectional_references_are_not_a_cycle() {
    let store = store_with(vec![
        TypeDescriptor::new("com.example.Order", "main")
            .with_equality(equality())
            .with_field(field("customer", "com.example.Customer"))
            .with_field(field("number", "java.lang.String")),
        TypeDescriptor::new("com.example.Customer", "main")
            .with_equality(equality())
            .with_field(field("lastOrder", "com.example.Order"))
            .with_field(field("name", "java.lang.String")),
    ]);
    let provider = provider(&store);
    provider.prime();

    let report = provider.notify(&fid("com.example.Order", "customer"));
    assert_eq!(report.recomputed, vec![aid("com.example.Order")]);
    let report = provider.notify(&tid("com.example.Customer"));
    assert_eq!(report.recomputed, vec![aid("com.example.Customer")]);
    assert_eq!(report.cycles, 0);
    assert!(provider.diagnostics().with_code(codes::W201).is_empty());
    assert!(provider.diagnostics().diagnostics().is_empty());
}

#[test]
fn change_propagates_to_dependent_artifacts() {
    // Customer does not compare `name` itself, so only the appended
    // supertype artifact connects it to the change.
    let store = store_with(party_and_customer(&["name"]));
    let provider = provider(&store);
    provider.prime();
    assert!(provider.registry().contains_edge(
        &aid("com.example.Party").into(),
        &aid("com.example.Customer")
    ));
    assert_eq!(
        provider.get(&aid("com.example.Customer")).unwrap().field_names(),
        vec!["email"]
    );

    let recorder = Recorder::attach(&provider);
    let report = provider.notify(&fid("com.example.Party", "name"));
    assert_eq!(
        report.recomputed,
        vec![aid("com.example.Party"), aid("com.example.Customer")]
    );
    assert_eq!(report.cycles, 0);
    assert_eq!(
        recorder.take(),
        vec![
            ("com.example.Party".to_string(), false),
            ("com.example.Customer".to_string(), false),
        ]
    );
    assert_edges_consistent(&provider);
}

#[test]
fn supertype_artifact_edge_requires_append_super() {
    let mut types = party_and_customer(&[]);
    types[1].annotations.equality = Some(equality());
    let store = store_with(types);
    let provider = provider(&store);
    provider.prime();
    assert!(provider
        .registry()
        .downstream_of(&aid("com.example.Party").into())
        .is_empty());
}

#[test]
fn diamond_recomputes_each_artifact_once() {
    // Leaf selects the inherited `x` directly and also appends Mid, which
    // appends Base: two routes from the one field.
    let store = store_with(vec![
        TypeDescriptor::new("d.Base", "main")
            .with_equality(equality())
            .with_field(field("x", "int")),
        TypeDescriptor::new("d.Mid", "main")
            .with_supertype("d.Base")
            .with_equality(appending_super(&[]))
            .with_field(field("y", "int")),
        TypeDescriptor::new("d.Leaf", "main")
            .with_supertype("d.Mid")
            .with_equality(appending_super(&[]))
            .with_field(field("z", "int")),
    ]);
    let provider = provider(&store);
    provider.prime();
    assert_eq!(
        provider.registry().downstream_of(&fid("d.Base", "x")),
        BTreeSet::from([aid("d.Base"), aid("d.Leaf"), aid("d.Mid")])
    );

    let report = provider.notify(&fid("d.Base", "x"));
    assert_eq!(
        report.recomputed,
        vec![aid("d.Base"), aid("d.Mid"), aid("d.Leaf")]
    );
    assert_eq!(report.cycles, 0);
    assert!(provider.diagnostics().diagnostics().is_empty());
    assert_edges_consistent(&provider);
}

#[test]
fn cycle_is_reported_and_terminates() {
    // A malformed hierarchy where each type extends and appends the other.
    let store = store_with(vec![
        TypeDescriptor::new("c.A", "main")
            .with_supertype("c.B")
            .with_equality(appending_super(&[]))
            .with_field(field("a", "int")),
        TypeDescriptor::new("c.B", "main")
            .with_supertype("c.A")
            .with_equality(appending_super(&[]))
            .with_field(field("b", "int")),
    ]);
    let provider = provider(&store);
    let primed = provider.prime();
    assert_eq!(primed.cycles, 0);

    let report = provider.notify(&tid("c.A"));
    assert_eq!(report.recomputed, vec![aid("c.A"), aid("c.B")]);
    assert_eq!(report.cycles, 1);

    let diags = provider.diagnostics().take_all();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::W201);
    assert_eq!(diags[0].subject.as_deref(), Some("equals:main?c.A"));
    assert!(!provider.diagnostics().has_errors());
    assert_eq!(provider.state(&aid("c.A")), ArtifactState::Cached);
    assert_eq!(provider.state(&aid("c.B")), ArtifactState::Cached);
}

#[test]
fn self_reference_is_not_an_edge() {
    let store = store_with(vec![TypeDescriptor::new("s.Node", "main")
        .with_equality(equality())
        .with_field(field("next", "s.Node"))]);
    let provider = provider(&store);
    provider.prime();
    assert!(!provider
        .registry()
        .contains_edge(&aid("s.Node").into(), &aid("s.Node")));
    let report = provider.notify(&fid("s.Node", "next"));
    assert_eq!(report.cycles, 0);
}

#[test]
fn lazy_policy_defers_recomputation() {
    let store = store_with(party_and_customer(&[]));
    let provider = lazy_provider(&store);
    provider.prime();
    let recorder = Recorder::attach(&provider);

    store.update("com.example.Party", |ty| {
        ty.fields.push(field("nickname", "java.lang.String"));
    });
    let report = provider.notify(&tid("com.example.Party"));
    assert!(report.recomputed.is_empty());
    assert_eq!(
        report.marked_stale,
        vec![aid("com.example.Party"), aid("com.example.Customer")]
    );
    assert!(recorder.take().is_empty());
    assert_eq!(
        provider.state(&aid("com.example.Party")),
        ArtifactState::Stale
    );

    let party = provider.get(&aid("com.example.Party")).unwrap();
    assert_eq!(party.field_names(), vec!["name", "nickname"]);
    assert_eq!(
        provider.state(&aid("com.example.Party")),
        ArtifactState::Cached
    );
    assert_eq!(
        provider.state(&aid("com.example.Customer")),
        ArtifactState::Stale
    );
    let customer = provider.get(&aid("com.example.Customer")).unwrap();
    assert_eq!(customer.field_names(), vec!["email", "name", "nickname"]);
    assert_eq!(
        recorder.take(),
        vec![
            ("com.example.Party".to_string(), false),
            ("com.example.Customer".to_string(), false),
        ]
    );
}

#[test]
fn lazy_removed_type_retires_on_get() {
    let store = store_with(vec![order(), person()]);
    let provider = lazy_provider(&store);
    provider.prime();
    let recorder = Recorder::attach(&provider);

    store.remove("com.example.Order");
    let report = provider.notify(&tid("com.example.Order"));
    assert_eq!(report.marked_stale, vec![aid("com.example.Order")]);
    assert!(report.removed.is_empty());
    assert_eq!(
        provider.state(&aid("com.example.Order")),
        ArtifactState::Stale
    );
    assert!(provider.cached_ids().contains(&aid("com.example.Order")));
    assert!(recorder.take().is_empty());
    assert!(provider.diagnostics().diagnostics().is_empty());

    assert_eq!(
        provider.get(&aid("com.example.Order")).unwrap_err(),
        ProviderError::MissingType(aid("com.example.Order"))
    );
    assert_eq!(
        provider.state(&aid("com.example.Order")),
        ArtifactState::Absent
    );
    assert_eq!(provider.cached_ids(), vec![aid("com.example.Person")]);
    assert_eq!(recorder.take(), vec![("com.example.Order".to_string(), true)]);
    let diags = provider.diagnostics().diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::N101);
    assert!(provider
        .registry()
        .upstream_of(&aid("com.example.Order"))
        .is_empty());
    assert_edges_consistent(&provider);
}

#[test]
fn removed_type_becomes_absent() {
    let store = store_with(vec![order(), person()]);
    let provider = provider(&store);
    provider.prime();
    let recorder = Recorder::attach(&provider);

    store.remove("com.example.Order");
    let report = provider.notify(&tid("com.example.Order"));
    assert_eq!(report.removed, vec![aid("com.example.Order")]);
    assert_eq!(
        provider.state(&aid("com.example.Order")),
        ArtifactState::Absent
    );
    assert_eq!(
        provider.get(&aid("com.example.Order")).unwrap_err(),
        ProviderError::MissingType(aid("com.example.Order"))
    );
    assert!(provider
        .registry()
        .upstream_of(&aid("com.example.Order"))
        .is_empty());
    assert_eq!(recorder.take(), vec![("com.example.Order".to_string(), true)]);

    let diags = provider.diagnostics().diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::N101);
    assert_edges_consistent(&provider);
}

#[test]
fn removed_annotation_retires_artifact_and_dependents_recompute() {
    let store = store_with(party_and_customer(&[]));
    let provider = provider(&store);
    provider.prime();

    store.update("com.example.Party", |ty| ty.annotations.equality = None);
    let report = provider.notify(&fid("com.example.Party", "name"));
    assert_eq!(report.removed, vec![aid("com.example.Party")]);
    assert_eq!(report.recomputed, vec![aid("com.example.Customer")]);
    assert_eq!(
        provider.get(&aid("com.example.Party")).unwrap_err(),
        ProviderError::NotRequested(aid("com.example.Party"))
    );
    // Customer still compares the inherited name, but no longer tracks the
    // retired supertype artifact.
    let customer = provider.get(&aid("com.example.Customer")).unwrap();
    assert_eq!(customer.field_names(), vec!["email", "name"]);
    assert!(provider
        .registry()
        .downstream_of(&aid("com.example.Party").into())
        .is_empty());
    assert_eq!(provider.diagnostics().diagnostics()[0].code, codes::N102);
    assert_edges_consistent(&provider);
}

#[test]
fn new_type_is_computed_on_type_notification() {
    let store = store_with(vec![order()]);
    let provider = provider(&store);
    provider.prime();

    store.insert(person());
    let report = provider.notify(&tid("com.example.Person"));
    assert_eq!(report.recomputed, vec![aid("com.example.Person")]);
    assert_eq!(
        provider.cached_ids(),
        vec![aid("com.example.Order"), aid("com.example.Person")]
    );
}

#[test]
fn unannotated_type_notification_is_quiet() {
    let store = store_with(vec![TypeDescriptor::new("com.example.Plain", "main")
        .with_field(field("x", "int"))]);
    let provider = provider(&store);
    let recorder = Recorder::attach(&provider);
    let report = provider.notify(&tid("com.example.Plain"));
    assert!(report.is_empty());
    assert!(recorder.take().is_empty());
    assert!(provider.diagnostics().diagnostics().is_empty());
}

#[test]
fn notification_by_string() {
    let store = store_with(vec![order()]);
    let provider = provider(&store);
    provider.prime();
    let report = provider
        .notify_str("field:main?com.example.Order#total")
        .unwrap();
    assert_eq!(report.recomputed, vec![aid("com.example.Order")]);
    assert!(matches!(
        provider.notify_str("nonsense"),
        Err(ProviderError::Malformed(_))
    ));
}

#[test]
fn listener_receives_updated_artifact() {
    let store = store_with(vec![order()]);
    let provider = provider(&store);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    provider.subscribe(move |event: &ArtifactEvent| {
        if let ArtifactChange::Updated(artifact) = &event.change {
            log.lock().push(artifact.field_names().join(","));
        }
    });
    provider.get(&aid("com.example.Order")).unwrap();
    assert_eq!(*seen.lock(), vec!["id,total".to_string()]);
}

#[test]
fn append_super_flows_into_artifact() {
    let store = store_with(vec![TypeDescriptor::new("com.example.Child", "main")
        .with_equality(AnnotationValues {
            exclude_fields: Vec::new(),
            append_super: true,
        })
        .with_field(field("x", "int"))]);
    let provider = provider(&store);
    let artifact = provider.get(&aid("com.example.Child")).unwrap();
    assert!(artifact.append_super);
}

#[test]
fn declarations_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decls.toml");
    std::fs::write(
        &path,
        r#"
[[types]]
name = "com.example.Order"
identity_field = "id"
annotations = { equality = {} }
fields = [
    { name = "total", type = "java.math.BigDecimal" },
    { name = "id", type = "java.lang.Long" },
    { name = "lines", type = "java.util.List<com.example.Line>" },
    { name = "tags", type = "java.util.Set<? extends java.lang.CharSequence>" },
    { name = "STATUS", type = "java.lang.String", modifiers = ["static"] },
]
"#,
    )
    .unwrap();
    let store = Arc::new(InMemoryStore::load(&path).unwrap());
    let provider = provider(&store);
    provider.prime();
    let artifact = provider.get(&aid("com.example.Order")).unwrap();
    assert_eq!(artifact.field_names(), vec!["id", "total"]);
}
