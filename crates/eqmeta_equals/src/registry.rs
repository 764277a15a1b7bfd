//! Directed dependency edges from upstream metadata to derived artifacts.
//!
//! An edge `(upstream, artifact)` records that `artifact` was computed from
//! `upstream`, which may be a field, a type, or another artifact. The registry
//! keeps both directions indexed so that a change notification finds its
//! downstream artifacts and a recomputation retires its own edges without a
//! full scan.

use std::collections::{BTreeSet, HashMap};

use eqmeta_common::{ArtifactId, MetadataId};

/// Bidirectionally indexed dependency edges.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    downstream: HashMap<MetadataId, BTreeSet<ArtifactId>>,
    upstream: HashMap<ArtifactId, BTreeSet<MetadataId>>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `artifact` depends on `upstream`.
    ///
    /// Returns `false` if the edge was already present.
    pub fn register_edge(&mut self, upstream: impl Into<MetadataId>, artifact: ArtifactId) -> bool {
        let upstream = upstream.into();
        let added = self
            .downstream
            .entry(upstream.clone())
            .or_default()
            .insert(artifact.clone());
        if added {
            self.upstream.entry(artifact).or_default().insert(upstream);
        }
        added
    }

    /// Removes every edge whose downstream endpoint is `artifact`.
    ///
    /// Returns the number of edges removed.
    pub fn remove_all_edges_for(&mut self, artifact: &ArtifactId) -> usize {
        let Some(upstreams) = self.upstream.remove(artifact) else {
            return 0;
        };
        for upstream in &upstreams {
            if let Some(targets) = self.downstream.get_mut(upstream) {
                targets.remove(artifact);
                if targets.is_empty() {
                    self.downstream.remove(upstream);
                }
            }
        }
        upstreams.len()
    }

    /// Removes every edge whose upstream endpoint is `upstream`.
    ///
    /// Returns the number of edges removed.
    pub fn remove_upstream(&mut self, upstream: &MetadataId) -> usize {
        let Some(targets) = self.downstream.remove(upstream) else {
            return 0;
        };
        for artifact in &targets {
            if let Some(sources) = self.upstream.get_mut(artifact) {
                sources.remove(upstream);
                if sources.is_empty() {
                    self.upstream.remove(artifact);
                }
            }
        }
        targets.len()
    }

    /// Artifacts that depend directly on `upstream`, sorted.
    pub fn downstream_of(&self, upstream: &MetadataId) -> BTreeSet<ArtifactId> {
        self.downstream.get(upstream).cloned().unwrap_or_default()
    }

    /// Metadata that `artifact` depends on directly, sorted.
    pub fn upstream_of(&self, artifact: &ArtifactId) -> BTreeSet<MetadataId> {
        self.upstream.get(artifact).cloned().unwrap_or_default()
    }

    /// Returns `true` if the edge `(upstream, artifact)` is present.
    pub fn contains_edge(&self, upstream: &MetadataId, artifact: &ArtifactId) -> bool {
        self.downstream
            .get(upstream)
            .is_some_and(|targets| targets.contains(artifact))
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.upstream.values().map(BTreeSet::len).sum()
    }

    /// Returns `true` if no edges are registered.
    pub fn is_empty(&self) -> bool {
        self.upstream.is_empty()
    }

    /// A sorted snapshot of every edge as `(upstream, artifact)`.
    pub fn edges(&self) -> Vec<(MetadataId, ArtifactId)> {
        let mut edges: Vec<_> = self
            .downstream
            .iter()
            .flat_map(|(upstream, targets)| {
                targets.iter().map(move |a| (upstream.clone(), a.clone()))
            })
            .collect();
        edges.sort();
        edges
    }

    /// Removes every edge.
    pub fn clear_all(&mut self) {
        self.downstream.clear();
        self.upstream.clear();
    }
}
