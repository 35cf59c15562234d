//! Snapshot of the machine the assistant runs on, folded into the system
//! instruction when `include_system_context` is set.

use serde::Serialize;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const TERMUX_PREFIX: &str = "/data/data/com.termux";

#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub os: String,
    pub arch: String,
    pub termux: bool,
    pub cwd: String,
    pub shell: String,
    /// Seconds since the Unix epoch
    pub time: u64,
}

impl SystemSnapshot {
    pub fn capture(shell: &str) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            termux: Path::new(TERMUX_PREFIX).exists(),
            cwd: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            shell: shell.to_string(),
            time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// `[System Context]` block appended to the system instruction
    pub fn render(&self) -> String {
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        format!("[System Context]\n{}", json)
    }
}
