//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Project, ReportExport, ReportExportFormat, ScheduleExecution};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Project {
    fn pretty_print(&self) -> String {
        let uri = self.uri().unwrap_or("-");
        let divider = "─".repeat(uri.len().max(30));

        let mut lines = vec![
            format!("Project: {}", uri),
            divider,
            format!("Title:          {}", self.title()),
            format!("State:          {}", self.state()),
        ];

        if let Some(ref summary) = self.meta.summary {
            if !summary.is_empty() {
                lines.push(format!("Summary:        {}", summary));
            }
        }

        if let Some(ref driver) = self.content.driver {
            lines.push(format!("Driver:         {}", driver));
        }

        if let Some(ref environment) = self.content.environment {
            lines.push(format!("Environment:    {}", environment));
        }

        if let Some(ref created) = self.meta.created {
            lines.push(format!("Created:        {}", created));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for ScheduleExecution {
    fn pretty_print(&self) -> String {
        let uri = self.uri().unwrap_or("-");
        let divider = "─".repeat(uri.len().max(30));

        let mut lines = vec![
            format!("Execution: {}", uri),
            divider,
            format!("Status:         {}", self.status),
        ];

        if let Some(ref trigger) = self.trigger {
            lines.push(format!("Trigger:        {}", trigger));
        }

        if let Some(ref started) = self.start_time {
            lines.push(format!("Started:        {}", started.format("%Y-%m-%d %H:%M:%S UTC")));
        }

        if let Some(ref ended) = self.end_time {
            lines.push(format!("Ended:          {}", ended.format("%Y-%m-%d %H:%M:%S UTC")));
        }

        if let Some(duration) = self.duration() {
            lines.push(format!("Duration:       {}s", duration.num_seconds()));
        }

        if let Some(ref log) = self.links.execution_log {
            lines.push(format!("Log:            {}", log));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for ReportExport {
    fn pretty_print(&self) -> String {
        format!("Exported {} bytes as {}", self.len(), self.format)
    }
}

/// Where an exported report was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub format: ReportExportFormat,
    pub bytes: usize,
    pub path: PathBuf,
}

impl ExportSummary {
    pub fn new(export: &ReportExport, path: &Path) -> Self {
        Self {
            format: export.format,
            bytes: export.len(),
            path: path.to_path_buf(),
        }
    }
}

impl PrettyPrint for ExportSummary {
    fn pretty_print(&self) -> String {
        format!(
            "Exported {} bytes as {} to {}",
            self.bytes,
            self.format,
            self.path.display()
        )
    }
}
