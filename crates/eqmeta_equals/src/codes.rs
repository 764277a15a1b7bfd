//! Diagnostic codes and helper functions for the metadata provider.
//!
//! `E101` reports undecodable identifiers, `W201` dependency cycles found
//! during propagation, and `N101`--`N102` artifacts retired by a change.

use eqmeta_common::{ArtifactId, IdentError};
use eqmeta_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// Change notification carried an undecodable identifier.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// Dependency cycle encountered while propagating a change.
pub const W201: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 201,
};

/// Artifact removed because its type no longer exists.
pub const N101: DiagnosticCode = DiagnosticCode {
    category: Category::Note,
    number: 101,
};

/// Artifact removed because its type no longer requests one.
pub const N102: DiagnosticCode = DiagnosticCode {
    category: Category::Note,
    number: 102,
};

/// Creates an E101 diagnostic for an identifier that failed to decode.
pub fn malformed_identifier(err: &IdentError) -> Diagnostic {
    Diagnostic::error(E101, err.to_string())
        .with_help("identifiers have the form <kind>:<path>?<type>[#<field>]")
}

/// Creates a W201 diagnostic for a cycle closing at `cycle[0]`.
///
/// `cycle` lists the artifacts along the cycle in propagation order.
pub fn dependency_cycle(cycle: &[ArtifactId]) -> Diagnostic {
    let mut diag = Diagnostic::warning(W201, "dependency cycle between equality artifacts");
    if let Some(first) = cycle.first() {
        diag = diag
            .with_subject(first.to_string())
            .with_note("each artifact in the cycle was recomputed once for this change");
    }
    for id in cycle.iter().skip(1) {
        diag = diag.with_related(id.to_string());
    }
    diag
}

/// Creates an N101 diagnostic for an artifact whose type disappeared.
pub fn type_removed(id: &ArtifactId) -> Diagnostic {
    Diagnostic::note(
        N101,
        format!("type '{}' was removed; its equality artifact is gone", id.type_name()),
    )
    .with_subject(id.to_string())
}

/// Creates an N102 diagnostic for an artifact whose annotation was removed.
pub fn annotation_removed(id: &ArtifactId) -> Diagnostic {
    Diagnostic::note(
        N102,
        format!(
            "type '{}' no longer requests an equality artifact",
            id.type_name()
        ),
    )
    .with_subject(id.to_string())
}
