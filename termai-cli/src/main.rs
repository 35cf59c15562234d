//! # termai CLI
//!
//! Interactive terminal assistant: type a question, the model answers or
//! proposes a shell command, the command runs and the model explains what
//! it printed.
//!
//! Usage:
//!   termai
//!   termai --config ~/.config/termai.json
//!   termai -y --model meta-llama/Llama-3.3-70B-Instruct
//!
//! Inside the REPL:
//!   You: how much free space do I have?
//!   You: !help
//!   You: exit
//!
//! Ctrl-D and Ctrl-C end the session. Lines are kept in an in-memory history
//! for arrow-key recall.

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use termai_agent::{Assistant, LineOutcome};
use termai_core::{
    Config, Confirmer, ExecutionPolicy, Executor, LlmProvider, OpenAIProvider, StdinConfirmer,
    DEFAULT_CONFIG_FILE,
};
use termai_error::{Error, ErrorKind};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "termai")]
#[command(author, version, about = "termai - ask your terminal, let the model drive the shell")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run suggested commands without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Model id, overriding config and environment
    #[arg(long)]
    model: Option<String>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,termai=debug,termai_core=debug,termai_agent=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> termai_error::Result<Config> {
    let mut config = Config::load(&cli.config)?;
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if cli.yes {
        config.execution = ExecutionPolicy::Auto;
    }
    Ok(config)
}

fn fatal(err: &Error) -> ExitCode {
    debug!("{:?}", err);
    eprintln!("Error: {}", err.message());
    ExitCode::FAILURE
}

// ============================================================================
// REPL
// ============================================================================

const PROMPT: &str = "You: ";

/// Where REPL lines come from
trait LineSource {
    fn read_line(&mut self, prompt: &str) -> std::result::Result<String, ReadlineError>;

    /// Keep `line` for recall; no-op by default
    fn remember(&mut self, _line: &str) {}
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> std::result::Result<String, ReadlineError> {
        self.readline(prompt)
    }

    fn remember(&mut self, line: &str) {
        self.add_history_entry(line).ok();
    }
}

/// Why the REPL stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplEnd {
    /// `exit` or `quit`
    Exit,
    /// Ctrl-D
    Eof,
    /// Ctrl-C
    Interrupted,
    InputFailed,
}

impl ReplEnd {
    fn succeeded(self) -> bool {
        !matches!(self, ReplEnd::InputFailed)
    }
}

/// Read lines from `source` until exit, EOF, Ctrl-C or an input error.
///
/// Assistant output goes to `out`. Failures of a single line are reported on
/// `err` as `[unexpected] ...` and the loop carries on.
async fn run_repl<P, E, C, S, W, V>(
    assistant: &mut Assistant<'_, P, E, C>,
    source: &mut S,
    out: &mut W,
    err: &mut V,
) -> ReplEnd
where
    P: LlmProvider,
    E: Executor,
    C: Confirmer,
    S: LineSource,
    W: Write,
    V: Write,
{
    loop {
        let line = match source.read_line(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => {
                let _ = writeln!(out);
                return ReplEnd::Eof;
            }
            Err(ReadlineError::Interrupted) => {
                let _ = writeln!(out, "Interrupted.");
                return ReplEnd::Interrupted;
            }
            Err(e) => {
                error!(error = %e, "cannot read input");
                let _ = writeln!(err, "Error reading input: {}", e);
                return ReplEnd::InputFailed;
            }
        };

        if !line.trim().is_empty() {
            source.remember(line.trim());
        }

        match assistant.handle_line(&line, out).await {
            Ok(LineOutcome::Exit) => return ReplEnd::Exit,
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "turn failed");
                let _ = writeln!(err, "[unexpected] {}", e.message());
            }
        }
        let _ = out.flush();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return fatal(&e),
    };
    let provider = match config.provider_config().and_then(OpenAIProvider::new) {
        Ok(provider) => provider,
        Err(e) => return fatal(&e),
    };
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            let err = Error::new(ErrorKind::IoFailed, "cannot start line editor")
                .with_operation("repl")
                .with_context("reason", e.to_string());
            return fatal(&err);
        }
    };

    println!(
        "termai ready ({} via {}). Type !help for commands, exit to quit.",
        provider.default_model(),
        provider.name()
    );
    if config.execution == ExecutionPolicy::Auto {
        println!("Suggested commands run without confirmation.");
    }

    let executor = config.executor();
    let mut assistant = Assistant::new(&config, provider, executor, StdinConfirmer);

    let end = run_repl(&mut assistant, &mut editor, &mut io::stdout(), &mut io::stderr()).await;

    debug!(?end, entries = assistant.transcript().len(), "session finished");
    if end.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use termai_core::{
        AlwaysApprove, CompletionRequest, CompletionResponse, ExecutionResult, ModelError,
    };

    struct Offline;

    impl LlmProvider for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn default_model(&self) -> &str {
            "none"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ModelError> {
            Err(ModelError::network("offline"))
        }
    }

    struct NoShell;

    impl Executor for NoShell {
        async fn execute(&self, command: &str) -> ExecutionResult {
            ExecutionResult::not_found(command)
        }
    }

    /// Lines handed out in order, then EOF
    #[derive(Default)]
    struct Script {
        lines: VecDeque<std::result::Result<String, ReadlineError>>,
        history: Vec<String>,
    }

    impl Script {
        fn lines(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| Ok(l.to_string())).collect(),
                history: Vec::new(),
            }
        }
    }

    impl LineSource for Script {
        fn read_line(&mut self, _prompt: &str) -> std::result::Result<String, ReadlineError> {
            self.lines.pop_front().unwrap_or(Err(ReadlineError::Eof))
        }

        fn remember(&mut self, line: &str) {
            self.history.push(line.to_string());
        }
    }

    /// Writer whose every write fails
    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_exit_ends_session_successfully() {
        let config = Config::default();
        let mut assistant = Assistant::new(&config, Offline, NoShell, AlwaysApprove);
        let mut source = Script::lines(&["", "exit", "never read"]);

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let end = run_repl(&mut assistant, &mut source, &mut out, &mut err).await;

        assert_eq!(end, ReplEnd::Exit);
        assert!(end.succeeded());
        assert_eq!(source.lines.len(), 1);
        assert_eq!(source.history, vec!["exit".to_string()]);
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn test_eof_ends_session_successfully() {
        let config = Config::default();
        let mut assistant = Assistant::new(&config, Offline, NoShell, AlwaysApprove);
        let mut source = Script::lines(&["hello"]);

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let end = run_repl(&mut assistant, &mut source, &mut out, &mut err).await;

        assert_eq!(end, ReplEnd::Eof);
        assert!(end.succeeded());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("AI: Error communicating with the model API: offline"));
        assert_eq!(assistant.transcript().len(), 2);
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_ends_session() {
        let config = Config::default();
        let mut assistant = Assistant::new(&config, Offline, NoShell, AlwaysApprove);
        let mut source = Script::default();
        source.lines.push_back(Err(ReadlineError::Interrupted));
        source.lines.push_back(Ok("hello".into()));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let end = run_repl(&mut assistant, &mut source, &mut out, &mut err).await;

        assert_eq!(end, ReplEnd::Interrupted);
        assert!(end.succeeded());
        assert!(assistant.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_input_error_fails_session() {
        let config = Config::default();
        let mut assistant = Assistant::new(&config, Offline, NoShell, AlwaysApprove);
        let mut source = Script::default();
        source
            .lines
            .push_back(Err(ReadlineError::Io(io::Error::other("terminal gone"))));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let end = run_repl(&mut assistant, &mut source, &mut out, &mut err).await;

        assert_eq!(end, ReplEnd::InputFailed);
        assert!(!end.succeeded());
        assert!(String::from_utf8(err).unwrap().starts_with("Error reading input:"));
    }

    #[tokio::test]
    async fn test_failed_line_is_reported_and_loop_continues() {
        let config = Config::default();
        let mut assistant = Assistant::new(&config, Offline, NoShell, AlwaysApprove);
        let mut source = Script::lines(&["!help", "!help", "quit"]);

        let mut err = Vec::new();
        let end = run_repl(&mut assistant, &mut source, &mut Closed, &mut err).await;

        // both failing lines are reported and the session still reaches `quit`
        assert_eq!(end, ReplEnd::Exit);
        let err = String::from_utf8(err).unwrap();
        assert_eq!(err.matches("[unexpected] ").count(), 2);
        assert!(err.contains("stdout closed"));
        assert_eq!(source.history, vec!["!help", "!help", "quit"]);
    }
}
