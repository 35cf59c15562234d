//! # Command extraction
//!
//! The model asks for execution by wrapping a command in `<CMD>` / `</CMD>`.
//! This is a two-token scan, not a markup parser: the first opening tag and
//! the first closing tag decide everything. Tags are case-sensitive and do
//! not nest; a reply carrying several spans only ever yields the first.

/// Opening command delimiter
pub const OPEN_TAG: &str = "<CMD>";

/// Closing command delimiter
pub const CLOSE_TAG: &str = "</CMD>";

/// A command found inside a model reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpan {
    pub command: String,
}

/// Raw model reply; the command span is derived on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub raw_text: String,
}

impl ModelReply {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    pub fn command(&self) -> Option<CommandSpan> {
        extract_command(&self.raw_text)
    }
}

/// Return the trimmed text between the first `<CMD>` and the first `</CMD>`.
///
/// `None` when either tag is missing, when the first closing tag comes
/// before the first opening tag, or when the enclosed text is blank.
pub fn extract_command(reply: &str) -> Option<CommandSpan> {
    let open = reply.find(OPEN_TAG)?;
    let close = reply.find(CLOSE_TAG)?;

    let start = open + OPEN_TAG.len();
    if close < start {
        return None;
    }

    let command = reply[start..close].trim();
    if command.is_empty() {
        return None;
    }

    Some(CommandSpan {
        command: command.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(reply: &str) -> Option<String> {
        extract_command(reply).map(|span| span.command)
    }

    #[test]
    fn test_extracts_enclosed_command() {
        assert_eq!(cmd("Sure: <CMD>ls</CMD>"), Some("ls".into()));
        assert_eq!(cmd("<CMD>ls -la</CMD>"), Some("ls -la".into()));
    }

    #[test]
    fn test_trims_and_ignores_surrounding_text() {
        let reply = "To see disk usage run\n<CMD>  df -h /  </CMD>\nIt lists mounted filesystems.";
        assert_eq!(cmd(reply), Some("df -h /".into()));
    }

    #[test]
    fn test_only_first_span_is_honored() {
        let reply = "<CMD>pwd</CMD> and then <CMD>ls</CMD>";
        assert_eq!(cmd(reply), Some("pwd".into()));
    }

    #[test]
    fn test_missing_tags_yield_nothing() {
        assert_eq!(cmd("Termux is a terminal emulator for Android."), None);
        assert_eq!(cmd("<CMD>ls"), None);
        assert_eq!(cmd("ls</CMD>"), None);
    }

    #[test]
    fn test_closing_before_opening_yields_nothing() {
        assert_eq!(cmd("</CMD> oops <CMD>ls"), None);
        assert_eq!(cmd("</CMD>x<CMD>ls</CMD>"), None);
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(cmd("<cmd>ls</cmd>"), None);
        assert_eq!(cmd("<Cmd>ls</CMD>"), None);
    }

    #[test]
    fn test_blank_span_is_not_a_command() {
        assert_eq!(cmd("<CMD>   </CMD>"), None);
        assert_eq!(cmd("<CMD></CMD>"), None);
    }

    #[test]
    fn test_multiline_command_kept_verbatim() {
        let reply = "<CMD>for f in *; do\n  echo $f\ndone</CMD>";
        assert_eq!(cmd(reply), Some("for f in *; do\n  echo $f\ndone".into()));
    }

    #[test]
    fn test_model_reply_derives_span() {
        let reply = ModelReply::new("Try <CMD>uname -a</CMD>");
        assert_eq!(reply.command().unwrap().command, "uname -a");
        assert!(ModelReply::new("nothing to run").command().is_none());
    }
}
