// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Non-fatal conditions raised while parsing.

use serde::Serialize;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Category of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Row with the wrong number of cells (padded or truncated)
    Alignment,
    /// Unknown or unsupported coordinate system (ICRS assumed)
    CoordinateSystem,
    /// Unknown or unsupported time system (uncorrected JD used)
    TimeSystem,
    /// Parse stopped early (cancellation, truncated stream)
    Truncation,
    /// Table aborted by a format error
    Format,
    /// Error or overflow reported by the server
    Server,
    /// Progress or informational message
    Info,
}

/// A message delivered to [`RecordSink::on_diagnostic`](crate::io::RecordSink::on_diagnostic).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, DiagnosticKind::Info, message)
    }

    /// Mirror this diagnostic to `tracing` at the matching level.
    pub fn log(&self) {
        match self.severity {
            Severity::Info => tracing::info!(kind = ?self.kind, "{}", self.message),
            Severity::Warning => tracing::warn!(kind = ?self.kind, "{}", self.message),
            Severity::Error => tracing::error!(kind = ?self.kind, "{}", self.message),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.severity, self.kind, self.message)
    }
}
