//! termai core error helpers
//!
//! Re-exports termai-error and adds constructors for core-specific failures.

pub use termai_error::{Error, ErrorKind, ErrorStatus, Result};

/// Config file exists but could not be read or parsed
pub fn config_unreadable(path: impl Into<String>, reason: impl Into<String>) -> Error {
    let path = path.into();
    Error::config_invalid(format!("cannot load '{}': {}", path, reason.into()))
        .with_operation("config::load")
        .with_context("path", path)
}

/// HTTP client could not be constructed
pub fn client_build_failed(reason: impl Into<String>) -> Error {
    Error::new(ErrorKind::Unexpected, reason).with_operation("provider::new")
}

/// The shell program itself could not be spawned
pub fn spawn_failed(shell: impl Into<String>, reason: impl Into<String>) -> Error {
    let shell = shell.into();
    Error::new(ErrorKind::ExecutionFailed, format!("cannot spawn '{}': {}", shell, reason.into()))
        .with_operation("exec::spawn")
        .with_context("shell", shell)
}

/// The program, or the shell itself, does not exist
pub fn command_not_found(program: impl Into<String>) -> Error {
    let program = program.into();
    Error::new(ErrorKind::CommandNotFound, format!("Command not found: {}", program))
        .with_operation("exec::run")
        .with_context("program", program)
}
