//! Shared foundational types used across the eqmeta engine.
//!
//! This crate provides the identifier scheme that names artifacts, fields and
//! types with stable, decodable strings, plus the content fingerprints used to
//! tell emitters whether a recomputed artifact actually changed.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;

pub use hash::ContentHash;
pub use ident::{
    artifact_id, decode_artifact_id, ArtifactId, FieldId, IdentError, MetadataId, TypeId,
};
