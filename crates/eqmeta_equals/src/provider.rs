//! The metadata provider: change handling, recomputation, and propagation.
//!
//! The provider owns the artifact cache and the dependency registry and guards
//! both with a single lock, so readers never see a cache entry whose edges
//! are half-updated. A change notification is processed to completion under
//! the write lock; listener callbacks run after the lock is released.
//!
//! Propagation is a depth-first walk over artifact-to-artifact edges. An
//! artifact already on the current walk path closes a cycle, which is reported
//! as a warning and cut; an artifact reached twice through different paths is
//! skipped. Each artifact is therefore recomputed at most once per
//! notification.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use eqmeta_common::{ArtifactId, MetadataId};
use eqmeta_config::{EngineConfig, RecomputePolicy};
use eqmeta_diagnostics::DiagnosticSink;
use eqmeta_model::{AnnotationKind, DeclarationStore, FieldDescriptor, TypeDescriptor};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::artifact::EqualityArtifact;
use crate::cache::{ArtifactCache, ArtifactState};
use crate::codes;
use crate::error::ProviderError;
use crate::event::{ArtifactEvent, ArtifactListener};
use crate::registry::DependencyRegistry;
use crate::selector::{FieldSelector, Selection};

/// Summary of the work done for one notification, `get`, or `prime`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Artifacts recomputed, in visit order.
    pub recomputed: Vec<ArtifactId>,
    /// Artifacts removed, in visit order.
    pub removed: Vec<ArtifactId>,
    /// Artifacts marked stale without recomputation (lazy policy).
    pub marked_stale: Vec<ArtifactId>,
    /// Number of dependency cycles cut.
    pub cycles: usize,
}

impl Propagation {
    /// Returns `true` if no artifact was touched.
    pub fn is_empty(&self) -> bool {
        self.recomputed.is_empty() && self.removed.is_empty() && self.marked_stale.is_empty()
    }
}

#[derive(Debug, Default)]
struct ProviderState {
    cache: ArtifactCache,
    registry: DependencyRegistry,
}

/// Traversal state of one notification.
#[derive(Default)]
struct Walk {
    visited: HashSet<ArtifactId>,
    path: Vec<ArtifactId>,
    events: Vec<ArtifactEvent>,
    report: Propagation,
}

/// Computes equality artifacts on demand and keeps them current.
pub struct MetadataProvider<S> {
    store: Arc<S>,
    selector: FieldSelector,
    policy: RecomputePolicy,
    state: RwLock<ProviderState>,
    listeners: RwLock<Vec<Arc<dyn ArtifactListener>>>,
    sink: DiagnosticSink,
}

impl<S: DeclarationStore> MetadataProvider<S> {
    /// Creates a provider over `store` configured from `eqmeta.toml`.
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self::with_selector(
            store,
            FieldSelector::from_config(&config.selection),
            config.engine.recompute,
        )
    }

    /// Creates a provider with an explicit selector and recompute policy.
    pub fn with_selector(store: Arc<S>, selector: FieldSelector, policy: RecomputePolicy) -> Self {
        Self {
            store,
            selector,
            policy,
            state: RwLock::new(ProviderState::default()),
            listeners: RwLock::new(Vec::new()),
            sink: DiagnosticSink::new(),
        }
    }

    /// The declaration store this provider reads.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The recompute policy.
    pub fn policy(&self) -> RecomputePolicy {
        self.policy
    }

    /// Diagnostics emitted so far (cycles, removals, malformed identifiers).
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Registers a listener for artifact updates and removals.
    pub fn subscribe(&self, listener: impl ArtifactListener + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Returns the artifact for `id`, recomputing it if it is stale or absent.
    pub fn get(&self, id: &ArtifactId) -> Result<Arc<EqualityArtifact>, ProviderError> {
        if let Some(artifact) = self.state.read().cache.fresh(id) {
            return Ok(artifact);
        }
        let mut walk = Walk::default();
        let result = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            match state.cache.fresh(id) {
                Some(artifact) => Ok(artifact),
                None => self.refresh(state, id, &mut walk),
            }
        };
        self.dispatch(walk.events);
        result
    }

    /// Decodes an artifact identifier string and returns its artifact.
    pub fn get_by_str(&self, id: &str) -> Result<Arc<EqualityArtifact>, ProviderError> {
        let id = ArtifactId::parse(id)?;
        self.get(&id)
    }

    /// Handles a change to the field, type, or artifact named by `id`.
    pub fn notify(&self, id: &MetadataId) -> Propagation {
        let mut walk = Walk::default();
        {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let targets = resolve(state, id);
            tracing::debug!(changed = %id, targets = targets.len(), "change notification");
            for target in &targets {
                self.visit(state, target, &mut walk);
            }
        }
        self.dispatch(walk.events);
        walk.report
    }

    /// Decodes an identifier string and handles a change to it.
    ///
    /// An undecodable identifier is reported to the diagnostic sink and
    /// returned as [`ProviderError::Malformed`].
    pub fn notify_str(&self, id: &str) -> Result<Propagation, ProviderError> {
        match MetadataId::parse(id) {
            Ok(id) => Ok(self.notify(&id)),
            Err(err) => {
                tracing::warn!(input = id, "ignoring change notification: {err}");
                self.sink.emit(codes::malformed_identifier(&err));
                Err(err.into())
            }
        }
    }

    /// Marks a cached artifact stale without recomputing it.
    ///
    /// Returns `false` if the artifact was not cached.
    pub fn invalidate(&self, id: &ArtifactId) -> bool {
        self.state.write().cache.mark_stale(id)
    }

    /// The lifecycle state of `id`.
    pub fn state(&self, id: &ArtifactId) -> ArtifactState {
        self.state.read().cache.state(id)
    }

    /// Identifiers of every published artifact, sorted.
    pub fn cached_ids(&self) -> Vec<ArtifactId> {
        self.state.read().cache.ids()
    }

    /// A read view on the dependency edges.
    ///
    /// Notifications block while the view is held.
    pub fn registry(&self) -> MappedRwLockReadGuard<'_, DependencyRegistry> {
        RwLockReadGuard::map(self.state.read(), |state| &state.registry)
    }

    /// Computes the artifact of every annotated type in the store.
    pub fn prime(&self) -> Propagation {
        let mut walk = Walk::default();
        {
            let mut guard = self.state.write();
            let state = &mut *guard;
            for name in self.store.type_names() {
                let Some(ty) = self.store.get_type(&name) else {
                    continue;
                };
                let id = ty.artifact_id();
                if walk.visited.contains(&id)
                    || state.cache.fresh(&id).is_some()
                    || !self.requests_equality(&ty)
                {
                    continue;
                }
                // Failures surface as removals; nothing else to report here.
                let _ = self.refresh(state, &id, &mut walk);
            }
            tracing::debug!(
                artifacts = state.cache.len(),
                edges = state.registry.edge_count(),
                "primed equality artifacts"
            );
        }
        self.dispatch(walk.events);
        walk.report
    }

    /// Drops every artifact and edge.
    pub fn shutdown(&self) {
        let mut state = self.state.write();
        state.cache.clear();
        state.registry.clear_all();
        tracing::debug!("equality provider shut down");
    }

    fn requests_equality(&self, ty: &TypeDescriptor) -> bool {
        self.store
            .get_annotation_config(ty, AnnotationKind::Equality)
            .is_some()
    }

    /// Visits `id` as a dependent of the change being processed.
    fn visit(&self, state: &mut ProviderState, id: &ArtifactId, walk: &mut Walk) {
        if walk.path.contains(id) {
            self.report_cycle(id, walk);
            return;
        }
        if walk.visited.contains(id) {
            return;
        }
        match self.policy {
            RecomputePolicy::Eager => {
                state.cache.mark_stale(id);
                let _ = self.refresh(state, id, walk);
            }
            RecomputePolicy::Lazy => {
                walk.visited.insert(id.clone());
                if state.cache.mark_stale(id) {
                    walk.report.marked_stale.push(id.clone());
                }
                walk.path.push(id.clone());
                let downstream = state.registry.downstream_of(&MetadataId::Artifact(id.clone()));
                for next in &downstream {
                    self.visit(state, next, walk);
                }
                walk.path.pop();
            }
        }
    }

    /// Recomputes `id`, then carries the change to its dependents.
    fn refresh(
        &self,
        state: &mut ProviderState,
        id: &ArtifactId,
        walk: &mut Walk,
    ) -> Result<Arc<EqualityArtifact>, ProviderError> {
        walk.visited.insert(id.clone());
        walk.path.push(id.clone());
        let (result, downstream) = self.recompute(state, id, walk);
        for next in &downstream {
            self.visit(state, next, walk);
        }
        walk.path.pop();
        result
    }

    /// Recomputes one artifact from the current declarations.
    ///
    /// Returns the outcome and the artifacts that depended on `id` before
    /// the recomputation.
    fn recompute(
        &self,
        state: &mut ProviderState,
        id: &ArtifactId,
        walk: &mut Walk,
    ) -> (Result<Arc<EqualityArtifact>, ProviderError>, BTreeSet<ArtifactId>) {
        state.cache.begin_compute(id);

        let ty = self
            .store
            .get_type(id.type_name())
            .filter(|ty| ty.path == id.path());
        let Some(ty) = ty else {
            return self.retire(state, id, ProviderError::MissingType(id.clone()), walk);
        };
        let Some(config) = self
            .store
            .get_annotation_config(&ty, AnnotationKind::Equality)
        else {
            return self.retire(state, id, ProviderError::NotRequested(id.clone()), walk);
        };

        let fields = self.store.get_fields(&ty);
        let identity = self.store.get_identity_field(&ty);
        let version = self.store.get_version_field(&ty);
        let selection = self.selector.select(
            &ty,
            &fields,
            identity.as_ref(),
            version.as_ref(),
            &config.exclude_fields,
        );
        let artifact = Arc::new(match selection {
            Selection::Delegated => EqualityArtifact::delegated(&ty),
            Selection::OwnFields { fields, identity } => {
                EqualityArtifact::own_fields(&ty, fields, identity, config.append_super)
            }
        });

        state.registry.remove_all_edges_for(id);
        if !artifact.delegated {
            self.register_edges(&mut state.registry, &ty, &artifact);
        }
        state.cache.insert(Arc::clone(&artifact));
        tracing::debug!(
            artifact = %id,
            fields = artifact.fields.len(),
            delegated = artifact.delegated,
            fingerprint = %artifact.fingerprint,
            "recomputed equality artifact"
        );

        walk.report.recomputed.push(id.clone());
        walk.events.push(ArtifactEvent::updated(Arc::clone(&artifact)));
        let downstream = state.registry.downstream_of(&MetadataId::Artifact(id.clone()));
        (Ok(artifact), downstream)
    }

    /// Removes `id` from the cache and the registry.
    fn retire(
        &self,
        state: &mut ProviderState,
        id: &ArtifactId,
        reason: ProviderError,
        walk: &mut Walk,
    ) -> (Result<Arc<EqualityArtifact>, ProviderError>, BTreeSet<ArtifactId>) {
        let as_upstream = MetadataId::Artifact(id.clone());
        let downstream = state.registry.downstream_of(&as_upstream);
        let previous = state.cache.remove(id);
        state.registry.remove_all_edges_for(id);
        state.registry.remove_upstream(&as_upstream);

        if previous.is_some() {
            tracing::debug!(artifact = %id, "removed equality artifact: {reason}");
            let diag = match reason {
                ProviderError::MissingType(_) => codes::type_removed(id),
                _ => codes::annotation_removed(id),
            };
            self.sink.emit(diag);
            walk.report.removed.push(id.clone());
            walk.events.push(ArtifactEvent::removed(id.clone()));
        }
        (Err(reason), downstream)
    }

    fn register_edges(
        &self,
        registry: &mut DependencyRegistry,
        ty: &TypeDescriptor,
        artifact: &EqualityArtifact,
    ) {
        let id = &artifact.id;
        for field in &artifact.fields {
            let field_id = field.field_id(&self.declaring_path(ty, field));
            tracing::trace!(upstream = %field_id, artifact = %id, "register edge");
            registry.register_edge(field_id, id.clone());
        }
        if artifact.append_super {
            if let Some(upstream) = self.super_artifact(ty).filter(|up| up != id) {
                tracing::trace!(upstream = %upstream, artifact = %id, "register edge");
                registry.register_edge(upstream, id.clone());
            }
        }
        for supertype in self.supertypes(ty) {
            registry.register_edge(supertype.type_id(), id.clone());
        }
    }

    /// Compilation path of the type that declares `field`.
    fn declaring_path(&self, ty: &TypeDescriptor, field: &FieldDescriptor) -> String {
        if field.declaring_type == ty.name {
            return ty.path.clone();
        }
        self.store
            .get_type(&field.declaring_type)
            .map_or_else(|| ty.path.clone(), |declaring| declaring.path)
    }

    /// The artifact of the direct supertype of `ty`, if that type requests one.
    ///
    /// An artifact that appends the supertype comparison delegates part of its
    /// contract to this one.
    fn super_artifact(&self, ty: &TypeDescriptor) -> Option<ArtifactId> {
        let name = ty.supertype.as_deref()?;
        self.store
            .get_type(name)
            .filter(|supertype| self.requests_equality(supertype))
            .map(|supertype| supertype.artifact_id())
    }

    /// The supertype chain of `ty` as far as the store knows it.
    fn supertypes(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([ty.name.clone()]);
        let mut next = ty.supertype.clone();
        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                break;
            }
            let Some(supertype) = self.store.get_type(&name) else {
                break;
            };
            next = supertype.supertype.clone();
            chain.push(supertype);
        }
        chain
    }

    fn report_cycle(&self, id: &ArtifactId, walk: &mut Walk) {
        let start = walk.path.iter().position(|p| p == id).unwrap_or(0);
        let cycle = &walk.path[start..];
        tracing::warn!(
            artifact = %id,
            length = cycle.len(),
            "dependency cycle between equality artifacts"
        );
        self.sink.emit(codes::dependency_cycle(cycle));
        walk.report.cycles += 1;
    }

    fn dispatch(&self, events: Vec<ArtifactEvent>) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.read().clone();
        for event in &events {
            for listener in &listeners {
                listener.on_artifact_event(event);
            }
        }
    }
}

/// Maps a changed identifier to the artifacts that must react to it.
fn resolve(state: &ProviderState, id: &MetadataId) -> Vec<ArtifactId> {
    match id {
        MetadataId::Type(ty) => {
            let own = ty.artifact_id();
            let mut targets = vec![own.clone()];
            targets.extend(
                state
                    .registry
                    .downstream_of(id)
                    .into_iter()
                    .filter(|a| *a != own),
            );
            targets
        }
        MetadataId::Field(_) | MetadataId::Artifact(_) => {
            state.registry.downstream_of(id).into_iter().collect()
        }
    }
}
