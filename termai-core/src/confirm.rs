//! Human-in-the-loop confirmation before running model-suggested commands.

use std::io::{self, BufRead, Write};

/// Asks whether an action may proceed
pub trait Confirmer: Send + Sync {
    /// `prompt` is shown as-is; `true` means go ahead
    fn confirm(&self, prompt: &str) -> bool;
}

/// Prompts on stdout and reads one line from stdin. Anything other than
/// `y` / `yes` (case-insensitive) is a refusal, including EOF.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N]: ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&input),
        }
    }
}

/// Approves everything; used when the execution policy is `auto`
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

impl Confirmer for AlwaysApprove {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative("  YES "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }

    #[test]
    fn test_always_approve() {
        assert!(AlwaysApprove.confirm("rm -rf build"));
    }
}
