//! Execution Timeline
//!
//! Tracks each input file's progress through its processing states for
//! the run summary and the per-file timing chart.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use log::debug;

/// Where a file is in its processing.
///
/// ```text
/// Pending -> Parsing -> Stepping(0) -> ... -> Stepping(n) -> Formatting -> Written
///    |                      |
///    +------> Skipped <-----+          any non-terminal state -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Discovered, nothing done yet
    Pending,
    /// Reading and decoding the input
    Parsing,
    /// Running the step at this index
    Stepping(usize),
    /// Serialising the final value
    Formatting,
    /// Output written
    Written,
    /// Output already existed for a skip-existing step
    Skipped,
    /// Processing stopped with an error
    Failed,
}

impl FileState {
    /// Returns true for states a file never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileState::Written | FileState::Skipped | FileState::Failed)
    }

    /// Returns true if moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: FileState) -> bool {
        use FileState::*;

        if self.is_terminal() {
            return false;
        }
        match (*self, next) {
            (_, Failed) => true,
            (Pending, Parsing) | (Pending, Skipped) => true,
            (Parsing, Stepping(0)) | (Parsing, Formatting) => true,
            (Stepping(i), Stepping(j)) => j == i + 1,
            (Stepping(_), Skipped) | (Stepping(_), Formatting) => true,
            (Formatting, Written) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Pending => write!(f, "pending"),
            FileState::Parsing => write!(f, "parsing"),
            FileState::Stepping(index) => write!(f, "step {}", index + 1),
            FileState::Formatting => write!(f, "formatting"),
            FileState::Written => write!(f, "written"),
            FileState::Skipped => write!(f, "skipped"),
            FileState::Failed => write!(f, "failed"),
        }
    }
}

/// A single state change.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    /// File name of the input
    pub file: String,
    /// State entered
    pub state: FileState,
    /// When the state was entered
    pub timestamp: Instant,
}

/// Records state changes for every file in a run.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    events: Vec<TimelineEvent>,
    current: HashMap<String, FileState>,
    start_time: Instant,
}

impl ExecutionTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            current: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Registers a file in the `Pending` state.
    pub fn begin(&mut self, file: impl Into<String>) {
        let file = file.into();
        self.current.insert(file.clone(), FileState::Pending);
        self.events.push(TimelineEvent {
            file,
            state: FileState::Pending,
            timestamp: Instant::now(),
        });
    }

    /// Moves `file` into `state`.
    ///
    /// Invalid transitions are ignored and reported as `false`.
    pub fn record(&mut self, file: &str, state: FileState) -> bool {
        let from = self.current.get(file).copied().unwrap_or(FileState::Pending);
        if !from.can_transition_to(state) {
            debug!("Ignoring transition {} -> {} for {}", from, state, file);
            return false;
        }

        self.current.insert(file.to_string(), state);
        self.events.push(TimelineEvent {
            file: file.to_string(),
            state,
            timestamp: Instant::now(),
        });
        true
    }

    /// Current state of `file`.
    pub fn state_of(&self, file: &str) -> Option<FileState> {
        self.current.get(file).copied()
    }

    /// Returns all recorded events.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Returns the total elapsed time since timeline creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of files currently in `state`.
    pub fn count(&self, state: FileState) -> usize {
        self.current.values().filter(|s| **s == state).count()
    }

    /// Time from each file's first event to its terminal event, in
    /// milliseconds. Files that never finished are left out.
    pub fn durations(&self) -> HashMap<String, u128> {
        let mut starts: HashMap<&str, Instant> = HashMap::new();
        let mut durations = HashMap::new();

        for event in &self.events {
            let start = *starts.entry(event.file.as_str()).or_insert(event.timestamp);
            if event.state.is_terminal() {
                durations.insert(
                    event.file.clone(),
                    event.timestamp.duration_since(start).as_millis(),
                );
            }
        }

        durations
    }

    /// ASCII chart with one bar per file, scaled to the run length.
    pub fn chart(&self) -> String {
        let mut output = String::from("\nFile Timeline:\n\n");

        let total_time = self.elapsed().as_millis();
        if total_time == 0 {
            return output;
        }

        // Scale to 50 characters width
        let scale = 50.0 / total_time as f64;

        let mut spans: HashMap<&str, (u128, u128, FileState)> = HashMap::new();
        for event in &self.events {
            let elapsed = event.timestamp.duration_since(self.start_time).as_millis();
            spans
                .entry(event.file.as_str())
                .and_modify(|span| {
                    span.1 = elapsed;
                    span.2 = event.state;
                })
                .or_insert((elapsed, elapsed, event.state));
        }

        let mut sorted: Vec<_> = spans.into_iter().collect();
        sorted.sort_by_key(|(file, (start, _, _))| (*start, *file));

        for (file, (start, end, state)) in sorted {
            let start_pos = (start as f64 * scale) as usize;
            let width = ((end - start) as f64 * scale).max(1.0) as usize;

            let mut bar = " ".repeat(start_pos);
            bar.push_str(&"#".repeat(width));

            output.push_str(&format!(
                "{:16} |{:50}| {} ({} ms)\n",
                truncate(file, 16),
                bar,
                state,
                end - start
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", total_time));
        output
    }

    /// One-paragraph summary of final states followed by the chart.
    pub fn report(&self) -> String {
        let mut output = format!(
            "Files: {} written, {} skipped, {} failed",
            self.count(FileState::Written),
            self.count(FileState::Skipped),
            self.count(FileState::Failed)
        );

        let unfinished = self.current.values().filter(|s| !s.is_terminal()).count();
        if unfinished > 0 {
            output.push_str(&format!(", {} unfinished", unfinished));
        }
        output.push('\n');
        output.push_str(&self.chart());
        output
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Pads or truncates a label to exactly `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
