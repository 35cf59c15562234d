//! # termai core
//!
//! Building blocks for a terminal assistant that lets a language model
//! propose shell commands and then explain what they printed.
//!
//! ## Core Concepts
//! - **Transcript**: append-only conversation log with a bounded context window
//! - **Requests**: system instruction + context window + user text, as chat messages
//! - **Provider**: trait-based model access (OpenAI-compatible HTTP)
//! - **Extractor**: finds the `<CMD>...</CMD>` span in a model reply
//! - **Executor**: runs a command through the shell, stdout and stderr kept apart
//! - **Config**: immutable settings built once at startup

pub mod config;
pub mod confirm;
pub mod error;
pub mod exec;
pub mod extract;
pub mod provider;
pub mod request;
pub mod system;
pub mod transcript;

pub use config::{
    Config, ExecutionPolicy, Features, PackageManagerFeature, SelfUpdaterFeature, Toggle,
    TaskSchedulerFeature, API_KEY_VARS, DEFAULT_CONFIG_FILE,
};
pub use confirm::{AlwaysApprove, Confirmer, StdinConfirmer};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use exec::{ExecutionResult, Executor, ShellExecutor};
pub use extract::{extract_command, CommandSpan, ModelReply, CLOSE_TAG, OPEN_TAG};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, ModelError, OpenAIProvider,
    ProviderConfig, Role, Usage,
};
pub use request::{ModelRequest, RequestBuilder, DEFAULT_SYSTEM_INSTRUCTION};
pub use system::SystemSnapshot;
pub use transcript::{Speaker, Transcript, TranscriptEntry, DEFAULT_CONTEXT_WINDOW};
