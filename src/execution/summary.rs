//! Run Summary
//!
//! What a run did with each input file, returned by the engine and
//! printed by the CLI.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::monitoring::ExecutionTimeline;

/// Final outcome of one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Output written to the given path
    Written(PathBuf),
    /// Existing output left alone
    Skipped(PathBuf),
    /// Processing failed with the given message
    Failed(String),
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workflow: String,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    /// Input files with their outcomes, in processing order
    pub outcomes: Vec<(PathBuf, FileOutcome)>,
    pub timeline: ExecutionTimeline,
}

impl RunSummary {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            started_at: Local::now(),
            elapsed: Duration::ZERO,
            outcomes: Vec::new(),
            timeline: ExecutionTimeline::new(),
        }
    }

    /// Adds the outcome for `file`.
    pub fn record(&mut self, file: PathBuf, outcome: FileOutcome) {
        self.outcomes.push((file, outcome));
    }

    /// Number of input files handled.
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Written(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped(_)))
    }

    /// Failed input files with their messages.
    pub fn failures(&self) -> Vec<(&PathBuf, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(file, outcome)| match outcome {
                FileOutcome::Failed(message) => Some((file, message.as_str())),
                _ => None,
            })
            .collect()
    }

    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }

    /// Plain-text report of the run.
    pub fn report(&self) -> String {
        let mut output = format!(
            "Workflow '{}' started {}\n",
            self.workflow,
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        );
        output.push_str(&format!(
            "Processed {} file(s) in {:.2?}: {} written, {} skipped, {} failed\n",
            self.processed(),
            self.elapsed,
            self.written(),
            self.skipped(),
            self.failures().len()
        ));

        for (file, message) in self.failures() {
            output.push_str(&format!("  {}: {}\n", file.display(), message));
        }

        output.push_str(&self.timeline.chart());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = RunSummary::new("wf");
        assert_eq!(summary.processed(), 0);
        assert!(summary.is_success());
        assert!(summary.report().contains("Processed 0 file(s)"));
    }

    #[test]
    fn test_counts_and_failures() {
        let mut summary = RunSummary::new("wf");
        summary.record("in/a".into(), FileOutcome::Written("out/a".into()));
        summary.record("in/b".into(), FileOutcome::Skipped("out/b".into()));
        summary.record("in/c".into(), FileOutcome::Failed("boom".into()));

        assert_eq!(summary.processed(), 3);
        assert_eq!(summary.written(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(!summary.is_success());

        let failures = summary.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1, "boom");

        let report = summary.report();
        assert!(report.contains("1 written, 1 skipped, 1 failed"));
        assert!(report.contains("boom"));
    }
}
