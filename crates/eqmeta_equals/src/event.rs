//! Change events delivered to artifact consumers.

use std::sync::Arc;

use eqmeta_common::ArtifactId;

use crate::artifact::EqualityArtifact;

/// What happened to an artifact.
#[derive(Debug, Clone)]
pub enum ArtifactChange {
    /// The artifact was computed or recomputed.
    Updated(Arc<EqualityArtifact>),
    /// The artifact no longer exists.
    Removed,
}

/// A published change to one artifact.
#[derive(Debug, Clone)]
pub struct ArtifactEvent {
    /// The affected artifact.
    pub id: ArtifactId,
    /// The change.
    pub change: ArtifactChange,
}

impl ArtifactEvent {
    pub(crate) fn updated(artifact: Arc<EqualityArtifact>) -> Self {
        Self {
            id: artifact.id.clone(),
            change: ArtifactChange::Updated(artifact),
        }
    }

    pub(crate) fn removed(id: ArtifactId) -> Self {
        Self {
            id,
            change: ArtifactChange::Removed,
        }
    }

    /// Returns `true` for a removal.
    pub fn is_removal(&self) -> bool {
        matches!(self.change, ArtifactChange::Removed)
    }
}

/// Receives artifact events, typically a code emitter.
///
/// Events are delivered after the provider has released its internal lock,
/// so a listener may call back into the provider.
pub trait ArtifactListener: Send + Sync {
    /// Called once per published change.
    fn on_artifact_event(&self, event: &ArtifactEvent);
}

impl<F> ArtifactListener for F
where
    F: Fn(&ArtifactEvent) + Send + Sync,
{
    fn on_artifact_event(&self, event: &ArtifactEvent) {
        self(event)
    }
}
