//! Field selection policy for equality artifacts.
//!
//! A field participates in equality unless it is excluded by name, static,
//! transient, a collection or array, or the type's version field. Selected
//! fields are de-duplicated by name (first occurrence wins) and then ordered
//! by byte-wise comparison of their names, so the result does not depend on
//! declaration order.

use std::collections::HashSet;
use std::fmt;

use eqmeta_config::SelectionConfig;
use eqmeta_model::{AnnotationKind, CollectionTypes, FieldDescriptor, TypeDescriptor};

/// Outcome of selecting fields for one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Equality is owned by another generator; no fields are selected.
    Delegated,
    /// The type's own equality contract.
    OwnFields {
        /// Selected fields, sorted by name.
        fields: Vec<FieldDescriptor>,
        /// The persistence identity field, carried through unchanged.
        identity: Option<FieldDescriptor>,
    },
}

impl Selection {
    /// Returns `true` for [`Selection::Delegated`].
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Delegated)
    }

    /// The selected fields; empty when delegated.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match self {
            Self::Delegated => &[],
            Self::OwnFields { fields, .. } => fields,
        }
    }
}

/// Why a field was left out of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Named in the annotation's exclusion list.
    Excluded,
    /// Has the static modifier.
    Static,
    /// Has the transient modifier.
    Transient,
    /// Declared type is a recognized collection.
    Collection,
    /// Declared type is an array.
    Array,
    /// Is the type's optimistic-locking version field.
    Version,
    /// An earlier field with the same name was already selected.
    Duplicate,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Excluded => "excluded by annotation",
            Self::Static => "static",
            Self::Transient => "transient",
            Self::Collection => "collection",
            Self::Array => "array",
            Self::Version => "version field",
            Self::Duplicate => "shadowed by an earlier field",
        };
        f.write_str(text)
    }
}

/// Applies the selection policy to a type's fields.
#[derive(Debug, Clone, Default)]
pub struct FieldSelector {
    collections: CollectionTypes,
}

impl FieldSelector {
    /// Creates a selector recognizing the given collection types.
    pub fn new(collections: CollectionTypes) -> Self {
        Self { collections }
    }

    /// Creates a selector from the `[selection]` configuration section.
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(CollectionTypes::default().with_extra(config.collection_types.iter().cloned()))
    }

    /// The collection types this selector excludes.
    pub fn collections(&self) -> &CollectionTypes {
        &self.collections
    }

    /// Selects the equality fields of `ty`.
    ///
    /// `fields` is every field visible on the type, inherited ones included.
    /// Returns [`Selection::Delegated`] when the type's equality is owned
    /// elsewhere, regardless of its fields.
    pub fn select(
        &self,
        ty: &TypeDescriptor,
        fields: &[FieldDescriptor],
        identity_hint: Option<&FieldDescriptor>,
        version_hint: Option<&FieldDescriptor>,
        exclusions: &[String],
    ) -> Selection {
        if ty.has_annotation(AnnotationKind::ExternalEquality) {
            return Selection::Delegated;
        }
        Selection::OwnFields {
            fields: self.select_fields(fields, version_hint, exclusions),
            identity: identity_hint.cloned(),
        }
    }

    /// Filters, de-duplicates, and sorts `fields`.
    pub fn select_fields(
        &self,
        fields: &[FieldDescriptor],
        version_hint: Option<&FieldDescriptor>,
        exclusions: &[String],
    ) -> Vec<FieldDescriptor> {
        self.partition(fields, version_hint, exclusions).0
    }

    /// Splits `fields` into the selected ones and the rejected ones with reasons.
    ///
    /// Rejected fields keep their input order.
    pub fn partition(
        &self,
        fields: &[FieldDescriptor],
        version_hint: Option<&FieldDescriptor>,
        exclusions: &[String],
    ) -> (Vec<FieldDescriptor>, Vec<(FieldDescriptor, ExclusionReason)>) {
        let excluded: HashSet<&str> = exclusions.iter().map(String::as_str).collect();
        let version = version_hint.map(|f| f.name.as_str());
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        let mut rejected = Vec::new();

        for field in fields {
            let reason = self
                .exclusion_reason(field, &excluded, version)
                .or_else(|| (!seen.insert(field.name.as_str())).then_some(ExclusionReason::Duplicate));
            match reason {
                Some(reason) => rejected.push((field.clone(), reason)),
                None => selected.push(field.clone()),
            }
        }

        selected.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        (selected, rejected)
    }

    fn exclusion_reason(
        &self,
        field: &FieldDescriptor,
        excluded: &HashSet<&str>,
        version: Option<&str>,
    ) -> Option<ExclusionReason> {
        if excluded.contains(field.name.as_str()) {
            Some(ExclusionReason::Excluded)
        } else if field.is_static() {
            Some(ExclusionReason::Static)
        } else if field.is_transient() {
            Some(ExclusionReason::Transient)
        } else if field.field_type.is_array() {
            Some(ExclusionReason::Array)
        } else if self.collections.is_collection(&field.field_type) {
            Some(ExclusionReason::Collection)
        } else if version == Some(field.name.as_str()) {
            Some(ExclusionReason::Version)
        } else {
            None
        }
    }
}
