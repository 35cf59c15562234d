//! `!schedule` and `!cron`: cron jobs kept as one file per job under
//! `cron_dir`, installed together as the user's crontab.

use super::shell_quote;
use std::path::{Path, PathBuf};
use termai_core::{Executor, TaskSchedulerFeature};
use termai_error::{Error, Result};
use tracing::{debug, info};

const USAGE: &str = "Usage: !schedule \"*/5 * * * *\" \"command\"";
const CRON_FIELDS: usize = 5;

/// A parsed `!schedule` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronJob {
    pub expr: String,
    pub command: String,
}

impl CronJob {
    /// Accepts `"<expr>" "<command>"`, `<expr> "<command>"`, or the
    /// unquoted `<5 fields> <command>` / `@daily <command>` forms
    pub fn parse(args: &str) -> Result<Self> {
        let args = args.trim();
        let (expr, command) = if args.contains('"') {
            parse_quoted(args)?
        } else {
            parse_unquoted(args)?
        };

        let expr = expr.split_whitespace().collect::<Vec<_>>().join(" ");
        let command = command.trim().to_string();
        if command.is_empty() || !valid_expr(&expr) {
            return Err(Error::invalid_usage(USAGE));
        }
        Ok(Self { expr, command })
    }

    /// Line written to the job file
    pub fn line(&self) -> String {
        format!("{} {}\n", self.expr, self.command)
    }
}

fn parse_quoted(args: &str) -> Result<(String, String)> {
    let segments: Vec<&str> = args.split('"').collect();
    // odd indices are inside quotes
    let quoted: Vec<&str> = segments.iter().skip(1).step_by(2).copied().collect();
    if segments.len() < 3 {
        return Err(Error::invalid_usage(USAGE));
    }

    let leading = segments[0].trim();
    if leading.is_empty() {
        match quoted.as_slice() {
            [expr, command, ..] => Ok((expr.to_string(), command.to_string())),
            _ => Err(Error::invalid_usage(USAGE)),
        }
    } else {
        Ok((leading.to_string(), quoted[0].to_string()))
    }
}

fn parse_unquoted(args: &str) -> Result<(String, String)> {
    let words: Vec<&str> = args.split_whitespace().collect();
    let fields = if words.first().is_some_and(|w| w.starts_with('@')) {
        1
    } else {
        CRON_FIELDS
    };
    if words.len() <= fields {
        return Err(Error::invalid_usage(USAGE));
    }
    Ok((words[..fields].join(" "), words[fields..].join(" ")))
}

fn valid_expr(expr: &str) -> bool {
    if expr.starts_with('@') {
        return !expr.contains(' ');
    }
    expr.split(' ').count() == CRON_FIELDS
}

fn job_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "cron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// First `job_<n>.cron` not already taken
fn next_job_path(dir: &Path) -> Result<PathBuf> {
    let mut n = job_files(dir)?.len() + 1;
    loop {
        let path = dir.join(format!("job_{}.cron", n));
        if !path.exists() {
            return Ok(path);
        }
        n += 1;
    }
}

pub async fn schedule<E: Executor>(
    executor: &E,
    feature: &TaskSchedulerFeature,
    args: &str,
) -> Result<String> {
    let job = CronJob::parse(args)?;
    let dir = &feature.cron_dir;

    std::fs::create_dir_all(dir).map_err(|e| {
        Error::from(e)
            .with_operation("schedule")
            .with_context("dir", dir.display().to_string())
    })?;
    let path = next_job_path(dir)?;
    std::fs::write(&path, job.line())?;
    debug!(path = %path.display(), "wrote job file");

    let install = format!(
        "cat {}/*.cron | crontab -",
        shell_quote(&dir.display().to_string())
    );
    let result = executor.execute(&install).await;
    if result.exit_failed {
        return Err(Error::execution_failed("crontab", result.stderr.trim())
            .with_operation("schedule"));
    }

    info!(expr = %job.expr, command = %job.command, "scheduled job");
    Ok(format!("Scheduled: '{}' at {}", job.command, job.expr))
}

pub async fn list<E: Executor>(executor: &E) -> Result<String> {
    let result = executor.execute("crontab -l").await;
    let stdout = result.stdout.trim();
    if result.exit_failed || stdout.is_empty() {
        Ok("No scheduled tasks".to_string())
    } else {
        Ok(stdout.to_string())
    }
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

    #[test]
    fn test_parse_fully_quoted() {
        let job = CronJob::parse("\"*/5 * * * *\" \"echo hi > /tmp/x\"").unwrap();
        assert_eq!(job.expr, "*/5 * * * *");
        assert_eq!(job.command, "echo hi > /tmp/x");
        assert_eq!(job.line(), "*/5 * * * * echo hi > /tmp/x\n");
    }

    #[test]
    fn test_parse_quoted_command_only() {
        let job = CronJob::parse("0 9 * * 1 \"backup.sh --full\"").unwrap();
        assert_eq!(job.expr, "0 9 * * 1");
        assert_eq!(job.command, "backup.sh --full");
    }

    #[test]
    fn test_parse_unquoted() {
        let job = CronJob::parse("0 * * * * termux-battery-status").unwrap();
        assert_eq!(job.expr, "0 * * * *");
        assert_eq!(job.command, "termux-battery-status");

        let job = CronJob::parse("@daily apt update").unwrap();
        assert_eq!(job.expr, "@daily");
        assert_eq!(job.command, "apt update");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for args in ["", "ls", "* * * ls", "\"* * *\" \"ls\"", "\"* * * * *\""] {
            let err = CronJob::parse(args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUsage, "args: {}", args);
            assert_eq!(err.message(), USAGE);
        }
    }

    #[tokio::test]
    async fn test_schedule_writes_numbered_jobs_and_installs() {
        let dir = tempfile::tempdir().unwrap();
        let feature = TaskSchedulerFeature {
            enabled: true,
            cron_dir: dir.path().join("jobs"),
        };
        let exec = Recorder::default();

        let out = schedule(&exec, &feature, "\"*/5 * * * *\" \"date\"").await.unwrap();
        assert_eq!(out, "Scheduled: 'date' at */5 * * * *");
        schedule(&exec, &feature, "@hourly uptime").await.unwrap();

        let first = std::fs::read_to_string(feature.cron_dir.join("job_1.cron")).unwrap();
        let second = std::fs::read_to_string(feature.cron_dir.join("job_2.cron")).unwrap();
        assert_eq!(first, "*/5 * * * * date\n");
        assert_eq!(second, "@hourly uptime\n");

        let commands = exec.commands.lock().unwrap();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("cat '"));
        assert!(commands[0].ends_with("/jobs'/*.cron | crontab -"));
    }

    #[tokio::test]
    async fn test_schedule_reports_crontab_failure() {
        let dir = tempfile::tempdir().unwrap();
        let feature = TaskSchedulerFeature {
            enabled: true,
            cron_dir: dir.path().to_path_buf(),
        };
        let exec = Recorder {
            reply: ExecutionResult::not_found("crontab"),
            ..Default::default()
        };
        let err = schedule(&exec, &feature, "@daily ls").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(err.message(), "Command not found: crontab");
    }

    #[tokio::test]
    async fn test_list() {
        let exec = Recorder {
            reply: ExecutionResult::success("@daily ls\n"),
            ..Default::default()
        };
        assert_eq!(list(&exec).await.unwrap(), "@daily ls");

        let exec = Recorder {
            reply: ExecutionResult::failure("no crontab for u0_a123", Some(1)),
            ..Default::default()
        };
        assert_eq!(list(&exec).await.unwrap(), "No scheduled tasks");
    }
}
