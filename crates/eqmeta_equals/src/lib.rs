//! Incremental computation of equality artifacts.
//!
//! Given declared types, this crate derives for each one the ordered set of
//! fields that participate in its equality contract, and keeps that set
//! correct as declarations change:
//!
//! - [`FieldSelector`] applies the selection policy (exclusions, modifiers,
//!   collection and version fields) and the byte-wise name ordering.
//! - [`DependencyRegistry`] records which artifacts were computed from which
//!   fields, types, and other artifacts.
//! - [`ArtifactCache`] holds the identifier-addressed artifacts and their
//!   lifecycle state.
//! - [`MetadataProvider`] ties them together: it handles change notifications,
//!   recomputes stale artifacts, retires edges, and notifies listeners.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod codes;
pub mod error;
pub mod event;
pub mod provider;
pub mod registry;
pub mod selector;

pub use artifact::EqualityArtifact;
pub use cache::{ArtifactCache, ArtifactState};
pub use error::ProviderError;
pub use event::{ArtifactChange, ArtifactEvent, ArtifactListener};
pub use provider::{MetadataProvider, Propagation};
pub use registry::DependencyRegistry;
pub use selector::{ExclusionReason, FieldSelector, Selection};
