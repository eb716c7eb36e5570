use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{DependencyWarning, ImportError};

pub const DEFAULT_NOTIFICATION_GROUP: &str = "OSGi Bnd Notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A user-visible message of one import cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub group: String,
    pub title: String,
    pub severity: Severity,
    pub lines: Vec<String>,
}

impl Notification {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Keeps every notification it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    received: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

/// Everything a cycle has to tell the user, merged into one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    lines: Vec<String>,
    has_errors: bool,
}

impl CycleReport {
    /// Record a unit's own error or warning list.
    pub fn unit_messages(&mut self, unit: &str, messages: &[String], errors: bool) {
        if messages.is_empty() {
            return;
        }
        self.has_errors |= errors;
        self.lines
            .extend(messages.iter().map(|message| format!("{unit}: {message}")));
    }

    pub fn dependency_warnings(&mut self, unit: &str, warnings: &[DependencyWarning]) {
        self.lines
            .extend(warnings.iter().map(|warning| format!("{unit}: {warning}")));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn severity(&self) -> Option<Severity> {
        if self.lines.is_empty() {
            None
        } else if self.has_errors {
            Some(Severity::Error)
        } else {
            Some(Severity::Warning)
        }
    }
}

/// Where problems of an import end up.
#[derive(Clone)]
pub enum Reporter {
    /// Notifications on `sink` under `group`.
    Notify {
        group: String,
        sink: Arc<dyn NotificationSink>,
    },
    /// Any problem fails the import.
    Strict,
}

impl Reporter {
    pub fn notify(sink: Arc<dyn NotificationSink>) -> Self {
        Reporter::Notify {
            group: DEFAULT_NOTIFICATION_GROUP.to_string(),
            sink,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Reporter::Strict)
    }

    /// Report that `unit` could not be prepared and return the error that
    /// aborts the cycle.
    pub(crate) fn preparation_failed(&self, unit: &str, message: String) -> ImportError {
        if let Reporter::Notify { group, sink } = self {
            tracing::warn!(
                target = "bndsync.import",
                unit,
                error = %message,
                "cannot prepare project"
            );
            sink.notify(Notification {
                group: group.clone(),
                title: "Bnd import failed".to_string(),
                severity: Severity::Error,
                lines: vec![format!("Cannot resolve project '{unit}': {message}")],
            });
        }
        ImportError::UnitPreparation {
            unit: unit.to_string(),
            message,
        }
    }

    /// Strict reporters fail as soon as anything was reported.
    pub(crate) fn check(&self, report: &CycleReport) -> Result<(), ImportError> {
        match self {
            Reporter::Strict if !report.is_empty() => Err(ImportError::Reported {
                messages: report.lines().to_vec(),
            }),
            _ => Ok(()),
        }
    }

    /// Emit the cycle's aggregate.
    pub(crate) fn finish(&self, report: &CycleReport) -> Result<(), ImportError> {
        let Some(severity) = report.severity() else {
            return Ok(());
        };
        match self {
            Reporter::Notify { group, sink } => {
                tracing::warn!(
                    target = "bndsync.import",
                    %severity,
                    problems = report.lines().len(),
                    "Bnd import reported problems"
                );
                sink.notify(Notification {
                    group: group.clone(),
                    title: "Bnd import problems".to_string(),
                    severity,
                    lines: report.lines().to_vec(),
                });
                Ok(())
            }
            Reporter::Strict => self.check(report),
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reporter::Notify { group, .. } => {
                f.debug_struct("Notify").field("group", group).finish()
            }
            Reporter::Strict => f.write_str("Strict"),
        }
    }
}
