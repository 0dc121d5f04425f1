//! Error types for ECHONET Lite to Digital Twin conversion.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::types::AccessTriple;

/// Fatal errors that abort a whole conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Document errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("device description has no \"{member}\" object")]
    MissingMember { member: String },

    #[error("failed to serialize output: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::FileNotFound { .. }
            | ConvertError::ReadError { .. }
            | ConvertError::WriteError { .. } => 3,
            #[cfg(feature = "remote")]
            ConvertError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// The two classes of recoverable problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationCategory {
    /// The input breaks a rule of the device description dialect.
    StructuralViolation,
    /// A recognized data type has no mapping in the target schema.
    UnsupportedShape,
}

/// A recoverable problem found while converting one unit of the input.
///
/// The converter records it as a [`Diagnostic`](crate::Diagnostic), skips the
/// smallest enclosing unit and continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("unknown member \"{member}\"")]
    UnknownMember { member: String },

    #[error("expected {expected}, got {actual}")]
    UnexpectedType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown data type \"{value}\"")]
    UnknownDataType { value: String },

    #[error("unknown number format \"{value}\"")]
    UnknownNumberFormat { value: String },

    #[error("data type already set to {existing}")]
    KindAlreadySet { existing: &'static str },

    #[error("{collection} already populated")]
    AlreadyPopulated { collection: &'static str },

    #[error("enum is not supported on {kind} data")]
    EnumNotSupported { kind: &'static str },

    #[error("numeric enum needs a preceding \"format\"")]
    MissingNumberFormat,

    #[error("{collection} ignored on {kind} data")]
    MisplacedCollection {
        collection: &'static str,
        kind: &'static str,
    },

    #[error("reference \"{reference}\" does not point into #/definitions")]
    MalformedReference { reference: String },

    #[error("undefined reference \"{reference}\"")]
    UndefinedReference { reference: String },

    #[error("circular reference \"{reference}\"")]
    CircularReference { reference: String },

    #[error("nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("unsupported access rule combination {access}")]
    UnsupportedAccess { access: AccessTriple },

    #[error("no schema mapping for {kind} data")]
    UnsupportedShape { kind: &'static str },
}

impl Violation {
    pub fn category(&self) -> ViolationCategory {
        match self {
            Violation::UnsupportedShape { .. } => ViolationCategory::UnsupportedShape,
            _ => ViolationCategory::StructuralViolation,
        }
    }

    /// Stable short code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            Violation::UnknownMember { .. } => "S001",
            Violation::UnexpectedType { .. } => "S002",
            Violation::UnknownDataType { .. } => "S003",
            Violation::UnknownNumberFormat { .. } => "S004",
            Violation::KindAlreadySet { .. } => "S005",
            Violation::AlreadyPopulated { .. } => "S006",
            Violation::EnumNotSupported { .. } => "S007",
            Violation::MissingNumberFormat => "S008",
            Violation::MisplacedCollection { .. } => "S009",
            Violation::MalformedReference { .. } => "S010",
            Violation::UndefinedReference { .. } => "S011",
            Violation::CircularReference { .. } => "S012",
            Violation::DepthExceeded { .. } => "S013",
            Violation::UnsupportedAccess { .. } => "S014",
            Violation::UnsupportedShape { .. } => "U001",
        }
    }
}
