//! Types for the orchestrator module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::batch::{Command, Job, OptionSet};
use crate::dispatcher::DispatchFailure;

/// How a command's jobs were run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchMode {
    Sequential,
    Parallel { workers: usize },
}

/// Why a command was not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The command had no items.
    Empty,
    /// The item list matches the last successful run.
    Unchanged,
}

/// One command's resolved work, ready to run.
#[derive(Debug, Clone)]
pub struct DispatchUnit {
    pub command: Command,
    pub items: Vec<Job>,
    /// Global options overlaid with the command's own.
    pub options: OptionSet,
    pub fingerprint: String,
    /// 0 selects sequential execution.
    pub workers: usize,
}

impl DispatchUnit {
    pub fn mode(&self) -> DispatchMode {
        if self.workers > 0 {
            DispatchMode::Parallel {
                workers: self.workers.min(self.items.len()),
            }
        } else {
            DispatchMode::Sequential
        }
    }

    pub fn tracks_progress(&self) -> bool {
        self.options.progress_enabled()
    }
}

/// Result of planning one batch entry.
#[derive(Debug, Clone)]
pub enum PlannedCommand {
    Dispatch(DispatchUnit),
    Skip { command: Command, reason: SkipReason },
}

/// What happened to a command during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    Executed {
        completed: usize,
        mode: DispatchMode,
    },
    Skipped {
        reason: SkipReason,
    },
    /// Only recorded when the run continues past failures.
    Failed {
        completed: usize,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReport {
    pub command: Command,
    #[serde(flatten)]
    pub outcome: CommandOutcome,
}

/// Summary of an orchestrator run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Per-command outcomes, in batch order.
    pub commands: Vec<CommandReport>,
    /// Batch keys that were not recognized commands.
    pub ignored: Vec<String>,
}

impl RunReport {
    pub fn outcome(&self, command: Command) -> Option<&CommandOutcome> {
        self.commands
            .iter()
            .find(|r| r.command == command)
            .map(|r| &r.outcome)
    }

    /// Jobs that completed across every command.
    pub fn total_completed(&self) -> usize {
        self.commands
            .iter()
            .map(|r| match r.outcome {
                CommandOutcome::Executed { completed, .. }
                | CommandOutcome::Failed { completed, .. } => completed,
                CommandOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn executed(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands
            .iter()
            .filter(|r| matches!(r.outcome, CommandOutcome::Executed { .. }))
            .map(|r| r.command)
    }

    pub fn skipped(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands
            .iter()
            .filter(|r| matches!(r.outcome, CommandOutcome::Skipped { .. }))
            .map(|r| r.command)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandReport> + '_ {
        self.commands
            .iter()
            .filter(|r| matches!(r.outcome, CommandOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Errors returned by an orchestrator run.
#[derive(Debug, Error)]
pub enum RunError {
    /// A command failed and the run stopped there.
    #[error(transparent)]
    CommandFailed(#[from] DispatchFailure),

    /// The run continued past failures; the report lists them.
    #[error("{} of {} command(s) failed", .report.failures().count(), .report.commands.len())]
    Incomplete { report: Box<RunReport> },

    /// A blocking runtime could not be started.
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl RunError {
    /// The command that failed, when there is exactly one.
    pub fn command(&self) -> Option<Command> {
        match self {
            RunError::CommandFailed(failure) => Some(failure.command),
            _ => None,
        }
    }
}
