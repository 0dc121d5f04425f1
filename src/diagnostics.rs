//! Structured diagnostics collected during a conversion.

use std::fmt;

use serde::Serialize;

use crate::error::{Violation, ViolationCategory};

/// A single recorded violation with its location in the input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub category: ViolationCategory,
    pub code: &'static str,
    /// JSON Pointer into the input (e.g., "/devices/0x0130/elProperties/0x80/data")
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Append-only collector threaded through the conversion.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation found at `path`.
    pub fn push(&mut self, path: &str, violation: Violation) {
        tracing::warn!(path, code = violation.code(), "{}", violation);
        self.items.push(Diagnostic {
            category: violation.category(),
            code: violation.code(),
            path: path.to_string(),
            message: violation.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// Append one JSON Pointer segment, escaping `~` and `/`.
pub fn join_path(base: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{}/{}", base, escaped)
}
