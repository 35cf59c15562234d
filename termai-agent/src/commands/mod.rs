//! # `!` commands
//!
//! Lines starting with `!` bypass the conversation entirely. Each command is
//! registered only when its feature is enabled; `!help` is always present.
//! Results are plain text for the REPL to print and never touch the
//! transcript.

pub mod pkg;
pub mod schedule;
pub mod suggest;
pub mod update;

use std::collections::HashMap;
use termai_core::Features;

/// Every `!` command the assistant knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Help,
    Suggest,
    Pkg,
    Schedule,
    Cron,
    Update,
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Help,
        Builtin::Suggest,
        Builtin::Pkg,
        Builtin::Schedule,
        Builtin::Cron,
        Builtin::Update,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Help => "help",
            Builtin::Suggest => "suggest",
            Builtin::Pkg => "pkg",
            Builtin::Schedule => "schedule",
            Builtin::Cron => "cron",
            Builtin::Update => "update",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn usage(&self) -> &'static str {
        match self {
            Builtin::Help => "!help",
            Builtin::Suggest => "!suggest <query>",
            Builtin::Pkg => "!pkg [install|remove|search|update] [target]",
            Builtin::Schedule => "!schedule \"*/5 * * * *\" \"command\"",
            Builtin::Cron => "!cron",
            Builtin::Update => "!update",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Builtin::Help => "Show this help",
            Builtin::Suggest => "Get command suggestions",
            Builtin::Pkg => "Package management",
            Builtin::Schedule => "Schedule tasks",
            Builtin::Cron => "List scheduled jobs",
            Builtin::Update => "Update the assistant",
        }
    }
}

/// Commands enabled for this session
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Builtin>,
}

impl CommandRegistry {
    pub fn from_features(features: &Features) -> Self {
        let mut commands = HashMap::new();
        let mut add = |builtin: Builtin| {
            commands.insert(builtin.name(), builtin);
        };

        add(Builtin::Help);
        if features.command_suggest.enabled {
            add(Builtin::Suggest);
        }
        if features.package_manager.enabled {
            add(Builtin::Pkg);
        }
        if features.task_scheduler.enabled {
            add(Builtin::Schedule);
            add(Builtin::Cron);
        }
        if features.self_updater.enabled {
            add(Builtin::Update);
        }

        Self { commands }
    }

    pub fn resolve(&self, name: &str) -> Option<Builtin> {
        self.commands.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Enabled commands in display order
    pub fn enabled(&self) -> Vec<Builtin> {
        Builtin::ALL
            .iter()
            .copied()
            .filter(|b| self.commands.contains_key(b.name()))
            .collect()
    }

    pub fn help(&self) -> String {
        let mut text = String::from("Available commands:");
        for builtin in self.enabled() {
            text.push_str(&format!("\n  {:<48} {}", builtin.usage(), builtin.summary()));
        }
        text.push_str(&format!("\n  {:<48} {}", "exit | quit", "Leave the assistant"));
        text
    }
}

/// Split `!name args` into `("name", "args")`
pub fn split_invocation(line: &str) -> (&str, &str) {
    let body = line.trim().trim_start_matches('!');
    match body.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (body, ""),
    }
}

/// Single-quote `s` for a POSIX shell
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
