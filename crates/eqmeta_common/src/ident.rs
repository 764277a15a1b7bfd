//! Stable string identifiers for artifacts, fields, and types.
//!
//! Every identifier has the shape `<kind>:<path>?<type>`, with an additional
//! `#<field>` suffix for fields. Components are percent-escaped, so any type
//! name or compilation path encodes to exactly one identifier and every
//! identifier decodes back to the components that produced it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of equality-artifact identifiers.
const ARTIFACT_PREFIX: &str = "equals:";

/// Prefix of field identifiers.
const FIELD_PREFIX: &str = "field:";

/// Prefix of type identifiers.
const TYPE_PREFIX: &str = "type:";

/// Errors produced when decoding an identifier string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentError {
    /// The string was not produced by this identifier scheme.
    #[error("malformed identifier '{input}': {reason}")]
    MalformedIdentifier {
        /// The rejected input.
        input: String,
        /// Why decoding failed.
        reason: &'static str,
    },
}

impl IdentError {
    fn malformed(input: &str, reason: &'static str) -> Self {
        Self::MalformedIdentifier {
            input: input.to_string(),
            reason,
        }
    }
}

/// Identifier of the equality artifact of one type in one compilation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId {
    type_name: String,
    path: String,
}

impl ArtifactId {
    /// Creates the artifact identifier for `type_name` compiled under `path`.
    pub fn new(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            path: path.into(),
        }
    }

    /// Decodes an artifact identifier string.
    pub fn parse(input: &str) -> Result<Self, IdentError> {
        let rest = input
            .strip_prefix(ARTIFACT_PREFIX)
            .ok_or_else(|| IdentError::malformed(input, "missing 'equals:' prefix"))?;
        let (path, type_name) = split_path(input, rest)?;
        Ok(Self {
            type_name: unescape(input, type_name)?,
            path: unescape(input, path)?,
        })
    }

    /// The qualified name of the governing type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The compilation path of the governing type.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identifier of the type that governs this artifact.
    pub fn type_id(&self) -> TypeId {
        TypeId::new(self.type_name.clone(), self.path.clone())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ARTIFACT_PREFIX}{}?{}",
            escape(&self.path),
            escape(&self.type_name)
        )
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = IdentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.to_string()
    }
}

/// Identifier of a field, named through the type that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldId {
    declaring_type: String,
    path: String,
    field_name: String,
}

impl FieldId {
    /// Creates the identifier of `field_name` declared by `declaring_type`.
    pub fn new(
        declaring_type: impl Into<String>,
        path: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            path: path.into(),
            field_name: field_name.into(),
        }
    }

    /// Decodes a field identifier string.
    pub fn parse(input: &str) -> Result<Self, IdentError> {
        let rest = input
            .strip_prefix(FIELD_PREFIX)
            .ok_or_else(|| IdentError::malformed(input, "missing 'field:' prefix"))?;
        let (path, qualified) = split_path(input, rest)?;
        let (declaring_type, field_name) = qualified
            .split_once('#')
            .ok_or_else(|| IdentError::malformed(input, "missing '#' before field name"))?;
        Ok(Self {
            declaring_type: unescape(input, declaring_type)?,
            path: unescape(input, path)?,
            field_name: unescape(input, field_name)?,
        })
    }

    /// The qualified name of the declaring type.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// The compilation path of the declaring type.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The simple field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{FIELD_PREFIX}{}?{}#{}",
            escape(&self.path),
            escape(&self.declaring_type),
            escape(&self.field_name)
        )
    }
}

impl TryFrom<String> for FieldId {
    type Error = IdentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldId> for String {
    fn from(id: FieldId) -> Self {
        id.to_string()
    }
}

/// Identifier of a declared type, used for type-level change notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeId {
    type_name: String,
    path: String,
}

impl TypeId {
    /// Creates the identifier of `type_name` compiled under `path`.
    pub fn new(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            path: path.into(),
        }
    }

    /// Decodes a type identifier string.
    pub fn parse(input: &str) -> Result<Self, IdentError> {
        let rest = input
            .strip_prefix(TYPE_PREFIX)
            .ok_or_else(|| IdentError::malformed(input, "missing 'type:' prefix"))?;
        let (path, type_name) = split_path(input, rest)?;
        Ok(Self {
            type_name: unescape(input, type_name)?,
            path: unescape(input, path)?,
        })
    }

    /// The qualified type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The compilation path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identifier of the equality artifact this type governs.
    pub fn artifact_id(&self) -> ArtifactId {
        ArtifactId::new(self.type_name.clone(), self.path.clone())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TYPE_PREFIX}{}?{}",
            escape(&self.path),
            escape(&self.type_name)
        )
    }
}

impl TryFrom<String> for TypeId {
    type Error = IdentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeId> for String {
    fn from(id: TypeId) -> Self {
        id.to_string()
    }
}

/// Any identifier the engine understands, classified by kind.
///
/// Change notifications carry a `MetadataId`: a field or an artifact resolves
/// through the dependency registry, a type resolves directly to its artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataId {
    /// An equality artifact.
    Artifact(ArtifactId),
    /// A field of a declared type.
    Field(FieldId),
    /// A declared type.
    Type(TypeId),
}

impl MetadataId {
    /// Decodes and classifies an identifier string.
    pub fn parse(input: &str) -> Result<Self, IdentError> {
        if input.starts_with(ARTIFACT_PREFIX) {
            ArtifactId::parse(input).map(Self::Artifact)
        } else if input.starts_with(FIELD_PREFIX) {
            FieldId::parse(input).map(Self::Field)
        } else if input.starts_with(TYPE_PREFIX) {
            TypeId::parse(input).map(Self::Type)
        } else {
            Err(IdentError::malformed(input, "unknown identifier kind"))
        }
    }
}

impl fmt::Display for MetadataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataId::Artifact(id) => id.fmt(f),
            MetadataId::Field(id) => id.fmt(f),
            MetadataId::Type(id) => id.fmt(f),
        }
    }
}

impl From<ArtifactId> for MetadataId {
    fn from(id: ArtifactId) -> Self {
        Self::Artifact(id)
    }
}

impl From<FieldId> for MetadataId {
    fn from(id: FieldId) -> Self {
        Self::Field(id)
    }
}

impl From<TypeId> for MetadataId {
    fn from(id: TypeId) -> Self {
        Self::Type(id)
    }
}

/// Builds the identifier string of the equality artifact of `type_name` under `path`.
pub fn artifact_id(type_name: &str, path: &str) -> ArtifactId {
    ArtifactId::new(type_name, path)
}

/// Decodes an artifact identifier string into `(type_name, path)`.
pub fn decode_artifact_id(input: &str) -> Result<(String, String), IdentError> {
    let id = ArtifactId::parse(input)?;
    Ok((id.type_name, id.path))
}

/// Splits `<path>?<rest>` at the single unescaped `?`.
fn split_path<'a>(input: &str, rest: &'a str) -> Result<(&'a str, &'a str), IdentError> {
    rest.split_once('?')
        .ok_or_else(|| IdentError::malformed(input, "missing '?' after path"))
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape`], accepting only the sequences it produces.
fn unescape(input: &str, component: &str) -> Result<String, IdentError> {
    let mut out = String::with_capacity(component.len());
    let mut chars = component.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' => {
                let code: String = chars.by_ref().take(2).collect();
                let decoded = match code.as_str() {
                    "25" => '%',
                    "3F" => '?',
                    "23" => '#',
                    "3A" => ':',
                    _ => return Err(IdentError::malformed(input, "invalid escape sequence")),
                };
                out.push(decoded);
            }
            '?' | '#' | ':' => {
                return Err(IdentError::malformed(input, "unescaped delimiter"));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
