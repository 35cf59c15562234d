//! Assistant implementation - orchestrates the model <-> shell loop

use crate::commands::{self, Builtin, CommandRegistry};
use std::io::Write;
use termai_core::{
    extract_command, Config, Confirmer, ExecutionPolicy, ExecutionResult, Executor, LlmProvider,
    ModelError, ModelRequest, RequestBuilder, Transcript, TranscriptEntry,
};
use termai_error::Result;
use tracing::{debug, info, warn};

/// Where a turn is in its life cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// First model call with the user's text
    RequestingSuggestion,
    /// Reply carried no command span
    NoCommand { reply: String },
    /// Reply carried a command span
    HasCommand { reply: String, command: String },
    /// Command approved, about to run
    Executing { reply: String, command: String },
    /// Second model call about what the command printed
    RequestingInterpretation {
        reply: String,
        command: String,
        result: ExecutionResult,
    },
    /// Turn finished
    Done(TurnOutcome),
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Plain conversational reply
    Answered { reply: String },
    /// A command ran; `interpretation` is `None` when it printed nothing
    Executed {
        command: String,
        result: ExecutionResult,
        interpretation: Option<std::result::Result<String, ModelError>>,
    },
    /// Confirmation was refused
    Cancelled { command: String },
    /// The first model call failed
    Failed(ModelError),
}

/// What the REPL should do after a line was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// `exit` / `quit`
    Exit,
    /// Blank line, nothing happened
    Skipped,
    /// A `!` command ran (or was rejected)
    Command,
    /// A conversational turn completed
    Turn(TurnOutcome),
}

const CANCELLED: &str = "Command execution cancelled.";

/// The assistant - owns the transcript, borrows the configuration
pub struct Assistant<'a, P, E, C> {
    config: &'a Config,
    provider: P,
    executor: E,
    confirmer: C,
    requests: RequestBuilder,
    registry: CommandRegistry,
    transcript: Transcript,
}

impl<'a, P, E, C> Assistant<'a, P, E, C>
where
    P: LlmProvider,
    E: Executor,
    C: Confirmer,
{
    pub fn new(config: &'a Config, provider: P, executor: E, confirmer: C) -> Self {
        Self {
            config,
            provider,
            executor,
            confirmer,
            requests: RequestBuilder::from_config(config),
            registry: CommandRegistry::from_features(&config.features),
            transcript: Transcript::new(),
        }
    }

    /// Swap the request builder (custom instruction or window)
    pub fn with_requests(mut self, requests: RequestBuilder) -> Self {
        self.requests = requests;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Handle one line of user input
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<LineOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Skipped);
        }
        if is_exit(line) {
            return Ok(LineOutcome::Exit);
        }
        if line.starts_with('!') {
            self.run_builtin(line, out).await?;
            return Ok(LineOutcome::Command);
        }
        let outcome = self.run_turn(line, out).await?;
        Ok(LineOutcome::Turn(outcome))
    }

    /// Run one conversational turn to completion.
    ///
    /// Model and command failures are part of the outcome, not errors; the
    /// `Err` path is only for failures writing to `out`.
    pub async fn run_turn<W: Write>(&mut self, input: &str, out: &mut W) -> Result<TurnOutcome> {
        // window is taken before this turn's user entry lands
        let context = self.requests.context(&self.transcript);
        self.transcript.append(TranscriptEntry::user(input));

        let mut state = TurnState::RequestingSuggestion;
        loop {
            debug!(state = state_name(&state), "turn step");
            state = match state {
                TurnState::RequestingSuggestion => {
                    let request = self.requests.suggestion(&context, input);
                    match self.call(&request).await {
                        Ok(reply) => match extract_command(&reply) {
                            Some(span) => TurnState::HasCommand {
                                reply,
                                command: span.command,
                            },
                            None => TurnState::NoCommand { reply },
                        },
                        Err(err) => {
                            self.record_model_failure(&err, out)?;
                            TurnState::Done(TurnOutcome::Failed(err))
                        }
                    }
                }

                TurnState::NoCommand { reply } => {
                    writeln!(out, "AI: {}", reply)?;
                    self.transcript.append(TranscriptEntry::assistant(&reply));
                    TurnState::Done(TurnOutcome::Answered { reply })
                }

                TurnState::HasCommand { reply, command } => {
                    writeln!(out, "AI: {}", reply)?;
                    writeln!(out, "AI: I'm about to execute: `{}`", command)?;
                    out.flush()?;

                    if self.approve(&command) {
                        TurnState::Executing { reply, command }
                    } else {
                        writeln!(out, "{}", CANCELLED)?;
                        self.transcript
                            .append(TranscriptEntry::assistant(cancelled_entry(&reply)));
                        TurnState::Done(TurnOutcome::Cancelled { command })
                    }
                }

                TurnState::Executing { reply, command } => {
                    let result = self.executor.execute(&command).await;
                    print_result(&result, out)?;

                    if result.is_silent() {
                        writeln!(out, "Command produced no output.")?;
                        self.transcript.append(TranscriptEntry::assistant(composite_entry(
                            &reply, &command, &result, None,
                        )));
                        TurnState::Done(TurnOutcome::Executed {
                            command,
                            result,
                            interpretation: None,
                        })
                    } else {
                        TurnState::RequestingInterpretation {
                            reply,
                            command,
                            result,
                        }
                    }
                }

                TurnState::RequestingInterpretation {
                    reply,
                    command,
                    result,
                } => {
                    let request = self.requests.interpretation(&context, &command, &result);
                    let interpretation = self.call(&request).await;

                    let entry = match &interpretation {
                        Ok(text) => {
                            writeln!(out, "AI: {}", text)?;
                            TranscriptEntry::assistant(composite_entry(
                                &reply,
                                &command,
                                &result,
                                Some(text.as_str()),
                            ))
                        }
                        Err(err) => {
                            let message = err.user_message();
                            warn!(error = %err, "interpretation call failed");
                            writeln!(out, "AI: {}", message)?;
                            TranscriptEntry::assistant_error(composite_entry(
                                &reply,
                                &command,
                                &result,
                                Some(message.as_str()),
                            ))
                        }
                    };
                    self.transcript.append(entry);

                    TurnState::Done(TurnOutcome::Executed {
                        command,
                        result,
                        interpretation: Some(interpretation),
                    })
                }

                TurnState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn call(&self, request: &ModelRequest) -> std::result::Result<String, ModelError> {
        self.provider
            .reply(request.to_messages(), self.config.max_tokens, self.config.temperature)
            .await
    }

    fn approve(&self, command: &str) -> bool {
        match self.config.execution {
            ExecutionPolicy::Auto => true,
            ExecutionPolicy::Confirm => {
                let approved = self.confirmer.confirm("Execute this command?");
                info!(command, approved, "execution confirmation");
                approved
            }
        }
    }

    fn record_model_failure<W: Write>(&mut self, err: &ModelError, out: &mut W) -> Result<()> {
        let message = err.user_message();
        warn!(error = %err, "model call failed");
        writeln!(out, "AI: {}", message)?;
        self.transcript.append(TranscriptEntry::assistant_error(message));
        Ok(())
    }

    async fn run_builtin<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let (name, args) = commands::split_invocation(line);

        let builtin = match self.registry.resolve(name) {
            Some(builtin) => builtin,
            None => {
                let message = match Builtin::from_name(name) {
                    Some(_) => termai_error::Error::feature_disabled(format!("!{}", name))
                        .message()
                        .to_string(),
                    None => format!(
                        "Unknown command '!{}'. Type !help for available commands.",
                        name
                    ),
                };
                writeln!(out, "{}", message)?;
                return Ok(());
            }
        };

        info!(command = builtin.name(), "dispatching builtin");
        let result = match builtin {
            Builtin::Help => Ok(self.registry.help()),
            Builtin::Suggest => commands::suggest::run(&self.provider, self.config, args).await,
            Builtin::Pkg => {
                commands::pkg::run(
                    &self.executor,
                    &self.confirmer,
                    &self.config.features.package_manager,
                    args,
                )
                .await
            }
            Builtin::Schedule => {
                commands::schedule::schedule(
                    &self.executor,
                    &self.config.features.task_scheduler,
                    args,
                )
                .await
            }
            Builtin::Cron => commands::schedule::list(&self.executor).await,
            Builtin::Update => {
                commands::update::run(&self.config.features.self_updater, self.config.timeout_secs)
                    .await
            }
        };

        match result {
            Ok(text) => writeln!(out, "{}", text)?,
            Err(err) => {
                warn!(error = %err, command = builtin.name(), "builtin failed");
                writeln!(out, "{}", err.message())?;
            }
        }
        Ok(())
    }
}

pub(crate) fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

fn print_result<W: Write>(result: &ExecutionResult, out: &mut W) -> Result<()> {
    if result.has_output() {
        writeln!(out, "Command Output:\n{}", result.stdout.trim_end())?;
    }
    if result.has_error() {
        writeln!(out, "Command Error:\n{}", result.stderr.trim_end())?;
    }
    Ok(())
}

/// Single transcript entry for an executed command, led by the model's full reply
fn composite_entry(
    reply: &str,
    command: &str,
    result: &ExecutionResult,
    interpretation: Option<&str>,
) -> String {
    let mut text = format!("Reply: {} Executed `{}`.", reply, command);
    if result.has_output() {
        text.push_str(&format!(" Output: {}.", result.stdout.trim()));
    }
    if result.has_error() {
        text.push_str(&format!(" Error: {}.", result.stderr.trim()));
    }
    match interpretation {
        Some(answer) => text.push_str(&format!(" Response: {}", answer)),
        None => text.push_str(" No output."),
    }
    text
}

fn cancelled_entry(reply: &str) -> String {
    format!("Reply: {} {}", reply, CANCELLED)
}

fn state_name(state: &TurnState) -> &'static str {
    match state {
        TurnState::RequestingSuggestion => "requesting_suggestion",
        TurnState::NoCommand { .. } => "no_command",
        TurnState::HasCommand { .. } => "has_command",
        TurnState::Executing { .. } => "executing",
        TurnState::RequestingInterpretation { .. } => "requesting_interpretation",
        TurnState::Done(_) => "done",
    }
}
