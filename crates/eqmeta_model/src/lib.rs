//! Declaration model consumed by the equality engine.
//!
//! This crate defines the read-only view over declared types that the engine
//! computes artifacts from: [`TypeDescriptor`], [`FieldDescriptor`], their
//! [`JavaType`]s and modifiers, and the [`DeclarationStore`] trait through which
//! the parsing layer exposes them. [`InMemoryStore`] is a mutable, thread-safe
//! implementation for hosts and tests, loadable from a TOML declarations file.

#![warn(missing_docs)]

pub mod error;
pub mod field;
pub mod java_type;
pub mod store;
pub mod type_desc;

pub use error::StoreError;
pub use field::{FieldDescriptor, Modifier, Modifiers};
pub use java_type::{CollectionTypes, JavaType, TypeArg, TypeParseError, WildcardBound};
pub use store::{DeclarationStore, InMemoryStore};
pub use type_desc::{AnnotationKind, AnnotationValues, Annotations, TypeDescriptor};
