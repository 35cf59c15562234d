//! # Request assembly
//!
//! Every model call is a system message, an optional context message built
//! from the transcript window, and the user message. An empty window means
//! no context message at all, never an empty one.

use crate::config::Config;
use crate::exec::ExecutionResult;
use crate::system::SystemSnapshot;
use crate::provider::ChatMessage;
use crate::transcript::Transcript;
use tracing::debug;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an AI assistant operating inside a terminal shell environment. \
Your primary goal is to help the user by providing information, answering questions, \
and suggesting shell commands to accomplish tasks. \
When suggesting a shell command, always wrap it in <CMD>...</CMD> tags, and suggest at most one command per reply. \
If you need more information from the user or the terminal, ask for it. \
Be concise and directly answer questions or provide commands. \
If a command is executed, you will be given its output to interpret.";

/// One model call, before it is turned into chat messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub system_instruction: String,
    /// May be empty
    pub context_text: String,
    pub user_text: String,
}

impl ModelRequest {
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(3);
        messages.push(ChatMessage::system(&self.system_instruction));
        if !self.context_text.trim().is_empty() {
            messages.push(ChatMessage::user(format!("Previous context:\n{}", self.context_text)));
        }
        messages.push(ChatMessage::user(&self.user_text));
        messages
    }
}

/// Builds [`ModelRequest`]s with a fixed system instruction and window size
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    system_instruction: String,
    window: usize,
}

impl RequestBuilder {
    pub fn new(system_instruction: impl Into<String>, window: usize) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            window,
        }
    }

    /// System instruction from config (custom prompt and optional system snapshot)
    pub fn from_config(config: &Config) -> Self {
        let mut instruction = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string());

        if config.include_system_context {
            instruction.push_str("\n\n");
            instruction.push_str(&SystemSnapshot::capture(&config.shell).render());
        }

        Self::new(instruction, config.context_window)
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Render the transcript's context window
    pub fn context(&self, transcript: &Transcript) -> String {
        transcript.windowed(self.window)
    }

    /// First call of a turn: the user's text as-is
    pub fn suggestion(&self, context: &str, user_text: &str) -> ModelRequest {
        debug!(context_len = context.len(), "building suggestion request");
        ModelRequest {
            system_instruction: self.system_instruction.clone(),
            context_text: context.to_string(),
            user_text: user_text.to_string(),
        }
    }

    /// Follow-up call asking the model to interpret what `command` printed
    pub fn interpretation(
        &self,
        context: &str,
        command: &str,
        result: &ExecutionResult,
    ) -> ModelRequest {
        let has_output = result.has_output();
        let has_error = result.has_error();

        let mut user_text = String::new();
        let mut context_text = context.to_string();

        if has_output {
            user_text.push_str(&format!(
                "The command `{}` produced the following output:\n{}\n\n",
                command, result.stdout
            ));
            push_line(&mut context_text, &format!("Command Output: {}", result.stdout));
        }
        if has_error {
            user_text.push_str(&format!(
                "The command `{}` produced the following error:\n{}\n\n",
                command, result.stderr
            ));
            push_line(&mut context_text, &format!("Command Error: {}", result.stderr));
        }

        user_text.push_str(match (has_output, has_error) {
            (true, true) => "Please summarize the output, then explain the error or suggest a fix.",
            (false, true) => "Please explain this error or suggest a fix.",
            _ => "Please summarize this output or provide further assistance based on it.",
        });

        debug!(command, has_output, has_error, "building interpretation request");
        ModelRequest {
            system_instruction: self.system_instruction.clone(),
            context_text,
            user_text,
        }
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;
    use crate::transcript::TranscriptEntry;

    fn builder() -> RequestBuilder {
        RequestBuilder::new("SYSTEM", 4)
    }

    #[test]
    fn test_empty_context_omits_context_message() {
        let request = builder().suggestion("", "list files");
        let messages = request.to_messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("SYSTEM"));
        assert_eq!(messages[1], ChatMessage::user("list files"));
    }

    #[test]
    fn test_whitespace_context_is_treated_as_empty() {
        let request = builder().suggestion("  \n", "hi");
        assert_eq!(request.to_messages().len(), 2);
    }

    #[test]
    fn test_context_message_sits_between_system_and_user() {
        let mut transcript = Transcript::new();
        transcript.append(TranscriptEntry::user("what is termux"));
        transcript.append(TranscriptEntry::assistant("A terminal emulator."));

        let b = builder();
        let request = b.suggestion(&b.context(&transcript), "thanks");
        let messages = request.to_messages();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[1].content,
            "Previous context:\nUser: what is termux\nAI: A terminal emulator."
        );
        assert_eq!(messages[2].content, "thanks");
    }

    #[test]
    fn test_context_respects_window() {
        let mut transcript = Transcript::new();
        for i in 0..6 {
            transcript.append(TranscriptEntry::user(format!("m{}", i)));
        }
        let context = RequestBuilder::new("S", 2).context(&transcript);
        assert_eq!(context, "User: m4\nUser: m5");
    }

    #[test]
    fn test_interpretation_of_output() {
        let result = ExecutionResult::success("a.txt\nb.txt\n");
        let request = builder().interpretation("", "ls", &result);

        assert!(request
            .user_text
            .contains("The command `ls` produced the following output:\na.txt"));
        assert!(request.user_text.ends_with("provide further assistance based on it."));
        assert!(!request.user_text.contains("error"));
        assert_eq!(request.context_text, "Command Output: a.txt\nb.txt\n");
    }

    #[test]
    fn test_interpretation_of_error_extends_context() {
        let result = ExecutionResult::not_found("foo");
        let request = builder().interpretation("User: run foo", "foo", &result);

        assert!(request
            .user_text
            .contains("produced the following error:\nCommand not found: foo"));
        assert!(request.user_text.ends_with("Please explain this error or suggest a fix."));
        assert_eq!(request.context_text, "User: run foo\nCommand Error: Command not found: foo");
        assert_eq!(request.to_messages().len(), 3);
    }

    #[test]
    fn test_interpretation_of_both_streams() {
        let result = ExecutionResult {
            stdout: "partial".into(),
            stderr: "warning".into(),
            exit_failed: false,
            exit_code: Some(0),
        };
        let request = builder().interpretation("", "make", &result);
        assert!(request.user_text.contains("output:\npartial"));
        assert!(request.user_text.contains("error:\nwarning"));
        assert!(request.user_text.ends_with("suggest a fix."));
    }

    #[test]
    fn test_from_config_custom_prompt_and_snapshot() {
        let config = Config {
            system_prompt: Some("Be terse. Wrap commands in <CMD></CMD>.".into()),
            include_system_context: true,
            context_window: 6,
            ..Config::default()
        };
        let b = RequestBuilder::from_config(&config);
        assert!(b.system_instruction().starts_with("Be terse."));
        assert!(b.system_instruction().contains("[System Context]"));
        assert_eq!(b.window(), 6);
    }

    #[test]
    fn test_default_instruction_mandates_tags() {
        let b = RequestBuilder::from_config(&Config::default());
        assert!(b.system_instruction().contains("<CMD>...</CMD>"));
        assert!(!b.system_instruction().contains("[System Context]"));
    }
}
