//! Where the engine records anomalies that do not fail the call that met them.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use parking_lot::Mutex;

/// Diagnostics a provider accumulates across notifications.
///
/// A dependency cycle, a retired artifact, or a rejected identifier is
/// recorded here and the operation carries on. Hosts drain the sink with
/// [`take_all`](Self::take_all) when they want to render or forward it.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        self.diagnostics.lock().push(diag);
    }

    /// Records diagnostics drained from another sink, keeping their order.
    pub fn extend(&self, diags: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.lock().extend(diags);
    }

    /// Number of recorded diagnostics at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Returns `true` if an error-severity diagnostic is recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Recorded diagnostics carrying `code`, oldest first.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.code == code)
            .cloned()
            .collect()
    }

    /// Drains the sink.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    /// A snapshot of everything recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }
}
