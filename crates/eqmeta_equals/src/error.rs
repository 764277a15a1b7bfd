//! Errors returned by the metadata provider.

use eqmeta_common::{ArtifactId, IdentError};

/// Why an artifact could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The governing type is not in the declaration store.
    #[error("type '{}' does not exist in path '{}'", .0.type_name(), .0.path())]
    MissingType(ArtifactId),

    /// The governing type exists but does not request an equality artifact.
    #[error("type '{}' does not request an equality artifact", .0.type_name())]
    NotRequested(ArtifactId),

    /// An identifier string could not be decoded.
    #[error(transparent)]
    Malformed(#[from] IdentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let id = ArtifactId::new("com.example.Order", "main");
        assert_eq!(
            ProviderError::MissingType(id.clone()).to_string(),
            "type 'com.example.Order' does not exist in path 'main'"
        );
        assert_eq!(
            ProviderError::NotRequested(id).to_string(),
            "type 'com.example.Order' does not request an equality artifact"
        );
    }

    #[test]
    fn malformed_is_transparent() {
        let ident = ArtifactId::parse("bogus").unwrap_err();
        let err = ProviderError::from(ident.clone());
        assert_eq!(err.to_string(), ident.to_string());
    }
}
