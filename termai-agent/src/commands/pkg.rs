//! `!pkg`: thin wrapper over apt

use super::shell_quote;
use termai_core::{Confirmer, Executor, PackageManagerFeature};
use termai_error::{Error, Result};
use tracing::info;

const USAGE: &str = "Usage: !pkg [install|remove|search|update] [target]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkgAction {
    Install,
    Remove,
    Search,
    Update,
}

impl PkgAction {
    pub const ALL: [PkgAction; 4] = [
        PkgAction::Install,
        PkgAction::Remove,
        PkgAction::Search,
        PkgAction::Update,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PkgAction::Install => "install",
            PkgAction::Remove => "remove",
            PkgAction::Search => "search",
            PkgAction::Update => "update",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    fn base_command(&self) -> &'static str {
        match self {
            PkgAction::Install => "apt install -y",
            PkgAction::Remove => "apt purge -y",
            PkgAction::Search => "apt search",
            PkgAction::Update => "apt update && apt upgrade -y",
        }
    }

    fn needs_target(&self) -> bool {
        !matches!(self, PkgAction::Update)
    }

    /// Shell command line for this action
    pub fn command(&self, target: &str) -> String {
        if target.is_empty() {
            return self.base_command().to_string();
        }
        let quoted: Vec<String> = target.split_whitespace().map(shell_quote).collect();
        format!("{} {}", self.base_command(), quoted.join(" "))
    }
}

/// Parse `action [target...]`
pub fn parse_args(args: &str) -> Result<(PkgAction, String)> {
    let mut words = args.split_whitespace();
    let action = words.next().ok_or_else(|| Error::invalid_usage(USAGE))?;
    let target = words.collect::<Vec<_>>().join(" ");

    let action = PkgAction::parse(action).ok_or_else(|| {
        let valid: Vec<&str> = PkgAction::ALL.iter().map(|a| a.name()).collect();
        Error::invalid_usage(format!("Invalid action. Choose from: {}", valid.join(", ")))
    })?;

    if action.needs_target() && target.is_empty() {
        return Err(Error::invalid_usage(USAGE));
    }
    Ok((action, target))
}

pub async fn run<E: Executor, C: Confirmer>(
    executor: &E,
    confirmer: &C,
    feature: &PackageManagerFeature,
    args: &str,
) -> Result<String> {
    let (action, target) = parse_args(args)?;

    if action == PkgAction::Remove
        && feature.confirm_destructive
        && !confirmer.confirm(&format!("Confirm {} {}?", action.name(), target))
    {
        return Ok("Action cancelled".to_string());
    }

    let command = action.command(&target);
    info!(action = action.name(), %target, "package operation");
    let result = executor.execute(&command).await;

    Ok(if !result.stdout.trim().is_empty() {
        result.stdout.trim_end().to_string()
    } else if !result.stderr.trim().is_empty() {
        result.stderr.trim_end().to_string()
    } else {
        "Action completed".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use termai_core::{ErrorKind, ExecutionResult};

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
        reply: ExecutionResult,
    }

    impl Executor for Recorder {
        async fn execute(&self, command: &str) -> ExecutionResult {
            self.commands.lock().unwrap().push(command.to_string());
            self.reply.clone()
        }
    }

    struct Answer(bool);

    impl Confirmer for Answer {
        fn confirm(&self, _prompt: &str) -> bool {
            self.0
        }
    }

    #[test]
    fn test_command_lines() {
        assert_eq!(PkgAction::Install.command("git"), "apt install -y 'git'");
        assert_eq!(PkgAction::Remove.command("vim nano"), "apt purge -y 'vim' 'nano'");
        assert_eq!(PkgAction::Search.command("python"), "apt search 'python'");
        assert_eq!(PkgAction::Update.command(""), "apt update && apt upgrade -y");
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(
            parse_args("install git").unwrap(),
            (PkgAction::Install, "git".to_string())
        );
        assert_eq!(parse_args("update").unwrap(), (PkgAction::Update, String::new()));

        let err = parse_args("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUsage);
        assert_eq!(err.message(), USAGE);

        let err = parse_args("install").unwrap_err();
        assert_eq!(err.message(), USAGE);

        let err = parse_args("upgrade git").unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid action. Choose from: install, remove, search, update"
        );
    }

    #[tokio::test]
    async fn test_remove_declined_runs_nothing() {
        let exec = Recorder::default();
        let out = run(&exec, &Answer(false), &PackageManagerFeature::default(), "remove git")
            .await
            .unwrap();
        assert_eq!(out, "Action cancelled");
        assert!(exec.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_without_confirmation_when_disabled() {
        let exec = Recorder::default();
        let feature = PackageManagerFeature {
            enabled: true,
            confirm_destructive: false,
        };
        let out = run(&exec, &Answer(false), &feature, "remove git").await.unwrap();
        assert_eq!(out, "Action completed");
        assert_eq!(*exec.commands.lock().unwrap(), vec!["apt purge -y 'git'".to_string()]);
    }

    #[tokio::test]
    async fn test_output_preference() {
        let exec = Recorder {
            reply: ExecutionResult::failure("E: Unable to locate package nope\n", Some(100)),
            ..Default::default()
        };
        let out = run(&exec, &Answer(true), &PackageManagerFeature::default(), "install nope")
            .await
            .unwrap();
        assert_eq!(out, "E: Unable to locate package nope");

        let exec = Recorder {
            reply: ExecutionResult::success("git/stable 2.43\n"),
            ..Default::default()
        };
        let out = run(&exec, &Answer(true), &PackageManagerFeature::default(), "search git")
            .await
            .unwrap();
        assert_eq!(out, "git/stable 2.43");
    }
}
