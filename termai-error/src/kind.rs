//! Error kinds for termai operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide whether a failure is fatal at
/// startup, recoverable within a turn, or just worth printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Invalid configuration file or value
    ConfigInvalid,

    /// No API credential was supplied
    CredentialMissing,

    // =========================================================================
    // Model errors
    // =========================================================================
    /// The model endpoint could not be reached or answered with a failure status
    ModelTransport,

    /// The model endpoint answered successfully but without the expected reply field
    MalformedResponse,

    // =========================================================================
    // Execution errors
    // =========================================================================
    /// A shell command could not be started or exited unsuccessfully
    ExecutionFailed,

    /// The requested program does not exist
    CommandNotFound,

    /// A `!` command was used with arguments it cannot accept
    InvalidUsage,

    /// The feature backing a `!` command is turned off
    FeatureDisabled,

    // =========================================================================
    // Update errors
    // =========================================================================
    /// Downloaded content did not match the published checksum
    ChecksumMismatch,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input
    ParseFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",

            // Configuration
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::CredentialMissing => "CredentialMissing",

            // Model
            ErrorKind::ModelTransport => "ModelTransport",
            ErrorKind::MalformedResponse => "MalformedResponse",

            // Execution
            ErrorKind::ExecutionFailed => "ExecutionFailed",
            ErrorKind::CommandNotFound => "CommandNotFound",
            ErrorKind::InvalidUsage => "InvalidUsage",
            ErrorKind::FeatureDisabled => "FeatureDisabled",

            // Update
            ErrorKind::ChecksumMismatch => "ChecksumMismatch",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ModelTransport | ErrorKind::IoFailed)
    }

    /// Check if this error kind should stop the program before the REPL starts
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, ErrorKind::ConfigInvalid | ErrorKind::CredentialMissing)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
