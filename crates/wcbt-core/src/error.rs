//! The closed error-kind taxonomy from the design's error handling section,
//! plus the wrapper type pipeline code constructs on fatal paths.
//!
//! Pipelines return `anyhow::Result<T>`; callers that need to translate a
//! failure into an exit code downcast the returned `anyhow::Error` to
//! [`WcbtError`] and match on its [`ErrorKind`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsafePath,
    CrossDeviceStage,
    CaseCollision,
    Locked,
    Unreadable,
    HashMismatch,
    SizeMismatch,
    IoError,
    SchemaUnsupported,
    ManifestInvalid,
    IncompleteRun,
    Cancelled,
    PromotionFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnsafePath => "unsafe_path",
            ErrorKind::CrossDeviceStage => "cross_device_stage",
            ErrorKind::CaseCollision => "case_collision",
            ErrorKind::Locked => "locked",
            ErrorKind::Unreadable => "unreadable",
            ErrorKind::HashMismatch => "hash_mismatch",
            ErrorKind::SizeMismatch => "size_mismatch",
            ErrorKind::IoError => "io_error",
            ErrorKind::SchemaUnsupported => "schema_unsupported",
            ErrorKind::ManifestInvalid => "manifest_invalid",
            ErrorKind::IncompleteRun => "incomplete_run",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::PromotionFailed => "promotion_failed",
        }
    }

    /// Exit code for a *fatal* occurrence of this kind, per the CLI surface
    /// table. Non-fatal occurrences (e.g. `unreadable` recorded in a backup
    /// journal) never reach this, the pipeline's outcome status governs
    /// the exit code instead.
    pub fn fatal_exit_code(self) -> i32 {
        match self {
            ErrorKind::SchemaUnsupported | ErrorKind::ManifestInvalid => 2,
            ErrorKind::Locked => 3,
            ErrorKind::CrossDeviceStage | ErrorKind::CaseCollision => 5,
            ErrorKind::UnsafePath
            | ErrorKind::Unreadable
            | ErrorKind::HashMismatch
            | ErrorKind::SizeMismatch
            | ErrorKind::IoError
            | ErrorKind::IncompleteRun
            | ErrorKind::Cancelled
            | ErrorKind::PromotionFailed => 7,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct WcbtError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl WcbtError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for WcbtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for WcbtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience for pipeline code: `Err(kind.into_err("..."))?`.
pub trait IntoWcbtError {
    fn into_err(self, message: impl Into<String>) -> WcbtError;
}

impl IntoWcbtError for ErrorKind {
    fn into_err(self, message: impl Into<String>) -> WcbtError {
        WcbtError::new(self, message)
    }
}
