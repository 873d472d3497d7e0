//! Error handling
//!
//! Provides typed errors for store, tag, upload and authorization operations
//! with descriptive messages and a coarse category telling the caller whether
//! to retry, fix its input, or stop.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::codec::CodecError;

/// What a caller should do about a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Transient or environmental failure; the same call may succeed later
    Retry,
    /// The request itself is wrong and must be corrected
    FixInput,
    /// The request cannot succeed as asked
    Stop,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Retry => "retry",
            ErrorCategory::FixInput => "fix-input",
            ErrorCategory::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record exists for the slug
    #[error("Post not found: '{slug}'")]
    NotFound { slug: String },

    /// Create was asked for a slug that is already taken
    #[error("Post already exists: '{slug}'")]
    AlreadyExists { slug: String },

    /// Rename target is already taken by a different record
    #[error("Cannot rename: a post already exists at '{slug}'")]
    Conflict { slug: String },

    /// Record file exists but cannot be decoded
    #[error("Malformed post file '{path}': {source}")]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Bad slug, tag, or metadata shape
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Caller is missing or is not the administrator
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upload exceeds the size limit
    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Upload is not an image
    #[error("Unsupported upload type '{mime}': only images are accepted")]
    UnsupportedMediaType { mime: String },

    /// Failed to create a storage directory
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Create an error from a write-side I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => StoreError::DiskFull {
                path,
                source: error,
            },
            _ => StoreError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Create an error from a read-side I/O error with path context
    pub fn from_read(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            _ => StoreError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    /// Classify the error for the caller
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::NotFound { .. }
            | StoreError::AlreadyExists { .. }
            | StoreError::Conflict { .. }
            | StoreError::Unauthorized(_) => ErrorCategory::Stop,
            StoreError::MalformedRecord { .. }
            | StoreError::Validation(_)
            | StoreError::PayloadTooLarge { .. }
            | StoreError::UnsupportedMediaType { .. } => ErrorCategory::FixInput,
            StoreError::CreateDirectory { .. }
            | StoreError::PermissionDenied { .. }
            | StoreError::DiskFull { .. }
            | StoreError::ReadError { .. }
            | StoreError::WriteError { .. }
            | StoreError::AtomicWriteFailed { .. } => ErrorCategory::Retry,
        }
    }

    /// Check if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Retry
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DiskFull { .. } => Some("Free up disk space and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions of the content directory.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::MalformedRecord { .. } => {
                Some("Fix the frontmatter block at the top of the file by hand.")
            }
            StoreError::Conflict { .. } | StoreError::AlreadyExists { .. } => {
                Some("Choose a different title or slug.")
            }
            StoreError::Unauthorized(_) => {
                Some("Sign in as the configured admin identity (see `admin_identity`).")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
