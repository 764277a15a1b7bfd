//! The derived equality artifact of one type.

use std::fmt;

use eqmeta_common::{ArtifactId, ContentHash};
use eqmeta_model::{FieldDescriptor, TypeDescriptor};
use serde::{Serialize, Serializer};

/// Suffix of the generated container name, e.g. `Person_Equals`.
pub const CONTAINER_SUFFIX: &str = "Equals";

/// The equality contract derived for one type.
///
/// Immutable once published: a recomputation replaces the whole artifact.
/// The fingerprint covers everything an emitter would render, so two
/// artifacts with equal fingerprints produce identical generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EqualityArtifact {
    /// Identifier of this artifact.
    pub id: ArtifactId,
    /// Qualified name of the governing type.
    pub type_name: String,
    /// Name of the generated member container.
    pub container_name: String,
    /// Participating fields, sorted by name. Empty when delegated.
    pub fields: Vec<FieldDescriptor>,
    /// Persistence identity field of the type, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_field: Option<FieldDescriptor>,
    /// Whether generated equality chains to the supertype's.
    pub append_super: bool,
    /// Whether equality is owned by another generator.
    pub delegated: bool,
    /// Fingerprint of the rendered contract.
    #[serde(serialize_with = "serialize_hash")]
    pub fingerprint: ContentHash,
}

fn serialize_hash<S: Serializer>(hash: &ContentHash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(hash)
}

impl EqualityArtifact {
    /// Builds the artifact for a type that owns its equality.
    pub fn own_fields(
        ty: &TypeDescriptor,
        fields: Vec<FieldDescriptor>,
        identifier_field: Option<FieldDescriptor>,
        append_super: bool,
    ) -> Self {
        Self::build(ty, fields, identifier_field, append_super, false)
    }

    /// Builds the empty artifact for a type whose equality is owned elsewhere.
    pub fn delegated(ty: &TypeDescriptor) -> Self {
        Self::build(ty, Vec::new(), None, false, true)
    }

    fn build(
        ty: &TypeDescriptor,
        fields: Vec<FieldDescriptor>,
        identifier_field: Option<FieldDescriptor>,
        append_super: bool,
        delegated: bool,
    ) -> Self {
        let fingerprint = fingerprint(&fields, identifier_field.as_ref(), append_super, delegated);
        Self {
            id: ty.artifact_id(),
            type_name: ty.name.clone(),
            container_name: format!("{}_{CONTAINER_SUFFIX}", ty.simple_name()),
            fields,
            identifier_field,
            append_super,
            delegated,
            fingerprint,
        }
    }

    /// Compilation path of the governing type.
    pub fn path(&self) -> &str {
        self.id.path()
    }

    /// Names of the participating fields, in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns `true` if no fields participate.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn fingerprint(
    fields: &[FieldDescriptor],
    identifier: Option<&FieldDescriptor>,
    append_super: bool,
    delegated: bool,
) -> ContentHash {
    let rendered: Vec<String> = fields
        .iter()
        .map(|f| format!("{}:{}", f.name, f.field_type))
        .collect();
    let mut parts = vec![
        if delegated { "delegated" } else { "own" },
        if append_super { "super" } else { "" },
        identifier.map_or("", |f| f.name.as_str()),
    ];
    parts.extend(rendered.iter().map(String::as_str));
    ContentHash::from_parts(parts)
}

impl fmt::Display for EqualityArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delegated {
            return write!(f, "{} (delegated)", self.container_name);
        }
        write!(f, "{}(", self.container_name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.field_type)?;
        }
        f.write_str(")")?;
        if self.append_super {
            f.write_str(" + super")?;
        }
        Ok(())
    }
}
