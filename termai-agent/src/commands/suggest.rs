//! `!suggest`: ask the model for a few candidate commands

use regex::Regex;
use std::sync::LazyLock;
use termai_core::{ChatMessage, Config, LlmProvider};
use termai_error::{Error, Result};

const USAGE: &str = "Usage: !suggest <query>";
const EMPTY: &str = "No suggestions: Try a different query";

fn prompt(query: &str) -> String {
    format!(
        "Suggest 3 terminal commands for: '{}'.\n\
         Format response as:\n\
         - `command1`: explanation\n\
         - `command2`: explanation",
        query
    )
}

static SUGGESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- `(.+?)`: (.+)").expect("suggestion pattern is valid"));

/// Pull ``- `cmd`: explanation`` pairs out of a reply
pub fn parse_suggestions(text: &str) -> Vec<(String, String)> {
    SUGGESTION
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

pub fn render(suggestions: &[(String, String)]) -> String {
    if suggestions.is_empty() {
        return EMPTY.to_string();
    }
    suggestions
        .iter()
        .map(|(cmd, why)| format!("{}: {}", cmd, why))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run<P: LlmProvider>(provider: &P, config: &Config, query: &str) -> Result<String> {
    if query.trim().is_empty() {
        return Err(Error::invalid_usage(USAGE));
    }

    let messages = vec![ChatMessage::user(prompt(query.trim()))];
    let reply = provider
        .reply(messages, config.max_tokens, config.temperature)
        .await
        .map_err(|e| Error::from(e).with_operation("suggest"))?;

    Ok(render(&parse_suggestions(&reply)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suggestions() {
        let reply = "Here you go:\n\
                     - `ls -la`: list everything\n\
                     - `du -sh *`: sizes per entry\n\
                     not a suggestion";
        let parsed = parse_suggestions(reply);
        assert_eq!(
            parsed,
            vec![
                ("ls -la".to_string(), "list everything".to_string()),
                ("du -sh *".to_string(), "sizes per entry".to_string()),
            ]
        );
    }

    #[test]
    fn test_unparseable_reply_gives_fallback() {
        assert_eq!(render(&parse_suggestions("try ls")), EMPTY);
    }

    #[test]
    fn test_render_pairs() {
        let text = render(&[("pwd".into(), "where am I".into())]);
        assert_eq!(text, "pwd: where am I");
    }

    #[test]
    fn test_prompt_mentions_query() {
        assert!(prompt("free disk").contains("'free disk'"));
    }
}
