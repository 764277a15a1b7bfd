//! Type descriptors and the annotations the engine reads from them.

use eqmeta_common::{ArtifactId, TypeId};
use serde::{Deserialize, Serialize};

use crate::field::FieldDescriptor;

/// The annotation kinds the engine asks the store about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// Requests an equality artifact for the type; carries the exclusion list.
    Equality,
    /// Marks the type's equality as owned by another generator.
    ExternalEquality,
}

/// User-supplied options of an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationValues {
    /// Field names excluded from equality (exact match).
    #[serde(default)]
    pub exclude_fields: Vec<String>,
    /// Whether generated equality chains to the supertype's.
    #[serde(default)]
    pub append_super: bool,
}

/// Annotations present on a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    /// Present when the type requests an equality artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equality: Option<AnnotationValues>,
    /// Set when another generator already produces equality for the type.
    #[serde(default)]
    pub external_equality: bool,
}

impl Annotations {
    /// Returns the values of the given annotation kind, if present.
    ///
    /// [`AnnotationKind::ExternalEquality`] carries no options, so it reports
    /// default values when present.
    pub fn get(&self, kind: AnnotationKind) -> Option<AnnotationValues> {
        match kind {
            AnnotationKind::Equality => self.equality.clone(),
            AnnotationKind::ExternalEquality => {
                self.external_equality.then(AnnotationValues::default)
            }
        }
    }
}

/// A declared type: its qualified name, compilation path, fields, and annotations.
///
/// Owned by the declaration store and read-only to the engine. Persistence
/// hints (`identity_field`, `version_field`) name fields of the type or of its
/// supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified type name.
    pub name: String,
    /// Compilation path (module and source root) the type lives in.
    #[serde(default = "default_path")]
    pub path: String,
    /// Qualified name of the supertype, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,
    /// Fields declared directly on this type, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Annotations present on the type.
    #[serde(default)]
    pub annotations: Annotations,
    /// Name of the persistence identity field, if mapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_field: Option<String>,
    /// Name of the optimistic-locking version field, if mapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_field: Option<String>,
}

fn default_path() -> String {
    "main".to_string()
}

impl TypeDescriptor {
    /// Creates a type with no fields or annotations.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            supertype: None,
            fields: Vec::new(),
            annotations: Annotations::default(),
            identity_field: None,
            version_field: None,
        }
    }

    /// Adds a declared field; its declaring type becomes this type.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        let name = self.name.clone();
        self.fields.push(field.declared_by(name));
        self
    }

    /// Requests an equality artifact with the given options.
    pub fn with_equality(mut self, values: AnnotationValues) -> Self {
        self.annotations.equality = Some(values);
        self
    }

    /// Marks equality as owned by another generator.
    pub fn with_external_equality(mut self) -> Self {
        self.annotations.external_equality = true;
        self
    }

    /// Sets the supertype.
    pub fn with_supertype(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Sets the persistence identity field name.
    pub fn with_identity_field(mut self, name: impl Into<String>) -> Self {
        self.identity_field = Some(name.into());
        self
    }

    /// Sets the version field name.
    pub fn with_version_field(mut self, name: impl Into<String>) -> Self {
        self.version_field = Some(name.into());
        self
    }

    /// The unqualified type name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Returns `true` if the type carries the given annotation.
    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        self.annotations.get(kind).is_some()
    }

    /// Identifier of this type.
    pub fn type_id(&self) -> TypeId {
        TypeId::new(self.name.clone(), self.path.clone())
    }

    /// Identifier of the equality artifact this type governs.
    pub fn artifact_id(&self) -> ArtifactId {
        ArtifactId::new(self.name.clone(), self.path.clone())
    }

    /// Fills in the declaring type of fields that do not name one.
    pub(crate) fn normalize(&mut self) {
        for field in &mut self.fields {
            if field.declaring_type.is_empty() {
                field.declaring_type = self.name.clone();
            }
        }
    }
}
