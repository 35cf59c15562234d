//! # termai-error
//!
//! Unified error handling for termai.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., CredentialMissing, ModelTransport)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use termai_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::CredentialMissing, "no API key configured")
//!         .with_operation("config::require_api_key")
//!         .with_context("env", "TERMAI_API_KEY"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible library functions return `Result<T, termai_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using termai Error
pub type Result<T> = std::result::Result<T, Error>;
