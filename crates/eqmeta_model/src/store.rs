//! The declaration store interface and an in-memory implementation.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::StoreError;
use crate::field::FieldDescriptor;
use crate::type_desc::{AnnotationKind, AnnotationValues, TypeDescriptor};

/// Read-only view over declared types, supplied by the parsing layer.
///
/// Every method returns owned snapshots: the store may change between calls,
/// and the engine re-reads it on each recomputation.
pub trait DeclarationStore: Send + Sync {
    /// Looks up a type by qualified name.
    fn get_type(&self, type_name: &str) -> Option<TypeDescriptor>;

    /// All fields visible on `ty` in order: its own declarations first, then
    /// those inherited from each supertype.
    fn get_fields(&self, ty: &TypeDescriptor) -> Vec<FieldDescriptor>;

    /// The options of an annotation on `ty`, or `None` if it is absent.
    fn get_annotation_config(
        &self,
        ty: &TypeDescriptor,
        kind: AnnotationKind,
    ) -> Option<AnnotationValues> {
        ty.annotations.get(kind)
    }

    /// The persistence identity field of `ty`, if one is mapped.
    fn get_identity_field(&self, ty: &TypeDescriptor) -> Option<FieldDescriptor>;

    /// The optimistic-locking version field of `ty`, if one is mapped.
    fn get_version_field(&self, ty: &TypeDescriptor) -> Option<FieldDescriptor>;

    /// Qualified names of every type in the store, sorted.
    fn type_names(&self) -> Vec<String>;
}

/// Shape of a TOML declarations file.
#[derive(Deserialize)]
struct DeclarationsFile {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// A thread-safe, mutable in-memory declaration store.
///
/// Hosts mutate it between change notifications; the engine only reads it.
#[derive(Default)]
pub struct InMemoryStore {
    types: RwLock<BTreeMap<String, TypeDescriptor>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a TOML declarations file (a list of `[[types]]` tables).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML declarations from a string.
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let file: DeclarationsFile =
            toml::from_str(content).map_err(|e| StoreError::Parse(e.to_string()))?;
        let store = Self::new();
        for ty in file.types {
            let name = ty.name.clone();
            if store.insert(ty).is_some() {
                return Err(StoreError::DuplicateType(name));
            }
        }
        Ok(store)
    }

    /// Inserts or replaces a type, returning the previous declaration.
    pub fn insert(&self, mut ty: TypeDescriptor) -> Option<TypeDescriptor> {
        ty.normalize();
        self.types.write().insert(ty.name.clone(), ty)
    }

    /// Removes a type, returning its declaration.
    pub fn remove(&self, type_name: &str) -> Option<TypeDescriptor> {
        self.types.write().remove(type_name)
    }

    /// Edits a type in place. Returns `false` if the type does not exist.
    pub fn update(&self, type_name: &str, edit: impl FnOnce(&mut TypeDescriptor)) -> bool {
        let mut types = self.types.write();
        match types.get_mut(type_name) {
            Some(ty) => {
                edit(ty);
                ty.normalize();
                true
            }
            None => false,
        }
    }

    /// Number of types in the store.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Returns `true` if the store holds no types.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    fn hint_field(&self, ty: &TypeDescriptor, name: Option<&str>) -> Option<FieldDescriptor> {
        let name = name?;
        self.get_fields(ty).into_iter().find(|f| f.name == name)
    }
}

impl DeclarationStore for InMemoryStore {
    fn get_type(&self, type_name: &str) -> Option<TypeDescriptor> {
        self.types.read().get(type_name).cloned()
    }

    fn get_fields(&self, ty: &TypeDescriptor) -> Vec<FieldDescriptor> {
        let types = self.types.read();
        let mut fields = ty.fields.clone();
        let mut visited = HashSet::from([ty.name.clone()]);
        let mut next = ty.supertype.clone();
        // Supertype chains are walked until they leave the store or loop back.
        while let Some(name) = next {
            if !visited.insert(name.clone()) {
                break;
            }
            let Some(supertype) = types.get(&name) else {
                break;
            };
            fields.extend(supertype.fields.iter().cloned());
            next = supertype.supertype.clone();
        }
        fields
    }

    fn get_identity_field(&self, ty: &TypeDescriptor) -> Option<FieldDescriptor> {
        self.hint_field(ty, ty.identity_field.as_deref())
    }

    fn get_version_field(&self, ty: &TypeDescriptor) -> Option<FieldDescriptor> {
        self.hint_field(ty, ty.version_field.as_deref())
    }

    fn type_names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }
}
