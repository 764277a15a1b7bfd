//! Identifier-addressed artifact cache with per-entry lifecycle state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use eqmeta_common::ArtifactId;

use crate::artifact::EqualityArtifact;

/// Lifecycle state of one artifact identifier.
///
/// ```text
/// Absent -> Computing -> Cached -> Stale -> Computing -> Cached
///                 \                    \
///                  -> Absent            -> Absent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactState {
    /// Never computed, or removed.
    Absent,
    /// A recomputation is in progress.
    Computing,
    /// Up to date with the declarations it was computed from.
    Cached,
    /// An upstream input changed; the held artifact is outdated.
    Stale,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Absent => "absent",
            Self::Computing => "computing",
            Self::Cached => "cached",
            Self::Stale => "stale",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
struct Entry {
    state: ArtifactState,
    artifact: Option<Arc<EqualityArtifact>>,
}

/// Holds at most one entry per artifact identifier.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: HashMap<ArtifactId, Entry>,
}

impl ArtifactCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The state of `id`; [`ArtifactState::Absent`] when it has no entry.
    pub fn state(&self, id: &ArtifactId) -> ArtifactState {
        self.entries
            .get(id)
            .map_or(ArtifactState::Absent, |e| e.state)
    }

    /// The artifact of `id` if it is [`ArtifactState::Cached`].
    pub fn fresh(&self, id: &ArtifactId) -> Option<Arc<EqualityArtifact>> {
        self.entries
            .get(id)
            .filter(|e| e.state == ArtifactState::Cached)
            .and_then(|e| e.artifact.clone())
    }

    /// The last published artifact of `id`, even if stale.
    pub fn last_known(&self, id: &ArtifactId) -> Option<Arc<EqualityArtifact>> {
        self.entries.get(id).and_then(|e| e.artifact.clone())
    }

    /// Moves `id` into [`ArtifactState::Computing`], keeping any previous artifact.
    pub fn begin_compute(&mut self, id: &ArtifactId) {
        self.entries
            .entry(id.clone())
            .or_insert(Entry {
                state: ArtifactState::Absent,
                artifact: None,
            })
            .state = ArtifactState::Computing;
    }

    /// Publishes `artifact` as [`ArtifactState::Cached`], returning the one it replaces.
    pub fn insert(&mut self, artifact: Arc<EqualityArtifact>) -> Option<Arc<EqualityArtifact>> {
        let previous = self.entries.insert(
            artifact.id.clone(),
            Entry {
                state: ArtifactState::Cached,
                artifact: Some(artifact),
            },
        );
        previous.and_then(|e| e.artifact)
    }

    /// Marks a cached artifact stale. Returns `false` if it was not cached.
    pub fn mark_stale(&mut self, id: &ArtifactId) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if entry.state == ArtifactState::Cached => {
                entry.state = ArtifactState::Stale;
                true
            }
            _ => false,
        }
    }

    /// Drops the entry for `id`, returning its last published artifact.
    pub fn remove(&mut self, id: &ArtifactId) -> Option<Arc<EqualityArtifact>> {
        self.entries.remove(id).and_then(|e| e.artifact)
    }

    /// Identifiers that hold a published artifact (cached or stale), sorted.
    pub fn ids(&self) -> Vec<ArtifactId> {
        let mut ids: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.artifact.is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Returns `true` if `id` holds a published artifact.
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.entries.get(id).is_some_and(|e| e.artifact.is_some())
    }

    /// Number of published artifacts.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| e.artifact.is_some()).count()
    }

    /// Returns `true` if no artifact is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
