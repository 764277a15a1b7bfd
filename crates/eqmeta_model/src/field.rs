//! Field descriptors and modifier flags.

use eqmeta_common::FieldId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::java_type::{CollectionTypes, JavaType};

/// A single field modifier as written in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// Class-level field, not part of instance state.
    Static,
    /// Excluded from serialized instance state.
    Transient,
    /// Assigned once.
    Final,
    /// Accessed without caching across threads.
    Volatile,
}

bitflags::bitflags! {
    /// A set of field modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Class-level field.
        const STATIC = 1 << 0;
        /// Excluded from serialized state.
        const TRANSIENT = 1 << 1;
        /// Assigned once.
        const FINAL = 1 << 2;
        /// Volatile access.
        const VOLATILE = 1 << 3;
    }
}

impl Modifier {
    /// Returns the bitflag for this modifier.
    pub const fn as_set(self) -> Modifiers {
        match self {
            Self::Static => Modifiers::STATIC,
            Self::Transient => Modifiers::TRANSIENT,
            Self::Final => Modifiers::FINAL,
            Self::Volatile => Modifiers::VOLATILE,
        }
    }
}

impl From<Modifier> for Modifiers {
    fn from(modifier: Modifier) -> Self {
        modifier.as_set()
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Modifiers::empty();
        for modifier in iter {
            set |= modifier.as_set();
        }
        set
    }
}

impl Modifiers {
    /// The individual modifiers in this set, in declaration order.
    pub fn to_vec(self) -> Vec<Modifier> {
        [
            Modifier::Static,
            Modifier::Transient,
            Modifier::Final,
            Modifier::Volatile,
        ]
        .into_iter()
        .filter(|m| self.contains(m.as_set()))
        .collect()
    }
}

// Modifiers are written as a list of keywords, e.g. `modifiers = ["static", "final"]`.
impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Modifier>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}

/// A declared field of a type.
///
/// Immutable value owned by the declaration store. `declaring_type` names the
/// type that declares the field, which differs from the type being inspected
/// when the field is inherited from a supertype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The field name.
    pub name: String,
    /// The declared type.
    #[serde(rename = "type")]
    pub field_type: JavaType,
    /// Modifier flags.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Qualified name of the declaring type; filled in by the store when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub declaring_type: String,
}

impl FieldDescriptor {
    /// Creates a field with no modifiers and no declaring type yet.
    pub fn new(name: impl Into<String>, field_type: JavaType) -> Self {
        Self {
            name: name.into(),
            field_type,
            modifiers: Modifiers::empty(),
            declaring_type: String::new(),
        }
    }

    /// Returns this field with the given modifiers added.
    pub fn with_modifiers(mut self, modifiers: impl Into<Modifiers>) -> Self {
        self.modifiers |= modifiers.into();
        self
    }

    /// Returns this field marked as declared by `declaring_type`.
    pub fn declared_by(mut self, declaring_type: impl Into<String>) -> Self {
        self.declaring_type = declaring_type.into();
        self
    }

    /// Returns `true` if the field is static.
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    /// Returns `true` if the field is transient.
    pub fn is_transient(&self) -> bool {
        self.modifiers.contains(Modifiers::TRANSIENT)
    }

    /// Returns `true` if the declared type is an array or a recognized collection.
    pub fn is_collection_or_array(&self, collections: &CollectionTypes) -> bool {
        self.field_type.is_array() || collections.is_collection(&self.field_type)
    }

    /// The identifier of this field, qualified by its declaring type under `path`.
    pub fn field_id(&self, path: &str) -> FieldId {
        FieldId::new(self.declaring_type.clone(), path, self.name.clone())
    }
}
