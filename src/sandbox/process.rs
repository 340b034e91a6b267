//! Harness Process Supervision
//!
//! Launches the harness, drains stdout and stderr on helper threads and
//! polls the child for exit or deadline expiry. Diagnostic lines are
//! forwarded to the logger while the process is still running.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, Level};

use super::harness::LOG_TAG;
use crate::error::FlowError;
use crate::logging::Logger;

/// How often the child is polled while no stderr output arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How the harness process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Process exited; `None` when it was terminated by a signal
    Code(Option<i32>),
    /// Deadline expired and the process was killed
    TimedOut,
}

/// Everything collected from one harness run.
#[derive(Debug, Clone)]
pub struct HarnessOutput {
    pub exit: Exit,
    /// Primary channel, verbatim
    pub stdout: String,
    /// Untagged stderr lines, in order
    pub detail: Vec<String>,
}

/// Splits a tagged diagnostic line into its level and message.
///
/// Returns `None` for lines that do not carry [`LOG_TAG`].
pub fn parse_diagnostic(line: &str) -> Option<(Level, &str)> {
    let rest = line.strip_prefix(LOG_TAG)?.trim_start();
    let (level, message) = rest.split_once(' ').unwrap_or((rest, ""));

    let level = match level {
        "error" => Level::Error,
        "warn" => Level::Warn,
        "debug" | "trace" => Level::Debug,
        _ => Level::Info,
    };
    Some((level, message))
}

struct StderrRouter<'a> {
    label: &'a str,
    logger: &'a dyn Logger,
    detail: Vec<String>,
}

impl StderrRouter<'_> {
    fn route(&mut self, line: String) {
        match parse_diagnostic(&line) {
            Some((level, message)) => {
                self.logger.log(level, &format!("[{}] {}", self.label, message));
            }
            None => self.detail.push(line),
        }
    }

    fn drain(&mut self, rx: &Receiver<String>) {
        for line in rx.try_iter() {
            self.route(line);
        }
    }
}

/// Runs `command` to completion, or until `deadline` expires.
///
/// `label` prefixes re-emitted diagnostics in the log.
pub fn run_supervised(
    mut command: Command,
    deadline: Option<Duration>,
    label: &str,
    logger: &dyn Logger,
) -> Result<HarnessOutput, FlowError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| FlowError::io("failed to start script runtime", e))?;

    let started = Instant::now();

    let stdout = child.stdout.take();
    let stdout_reader = thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(stdout) = stdout {
            let _ = BufReader::new(stdout).read_to_string(&mut buffer);
        }
        buffer
    });

    let (tx, rx) = channel::<String>();
    let stderr = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        if let Some(stderr) = stderr {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
    });

    let mut router = StderrRouter {
        label,
        logger,
        detail: Vec::new(),
    };

    let exit = loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => router.route(line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => thread::sleep(POLL_INTERVAL),
        }

        let status = child
            .try_wait()
            .map_err(|e| FlowError::io("failed to poll script process", e))?;
        if let Some(status) = status {
            break Exit::Code(status.code());
        }

        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                debug!("Deadline of {:?} expired for {}; killing process", limit, label);
                let _ = child.kill();
                let _ = child.wait();
                break Exit::TimedOut;
            }
        }
    };

    let _ = stderr_reader.join();
    router.drain(&rx);
    let stdout = stdout_reader.join().unwrap_or_default();

    debug!(
        "{} finished in {:?} with {:?}",
        label,
        started.elapsed(),
        exit
    );

    Ok(HarnessOutput {
        exit,
        stdout,
        detail: router.detail,
    })
}
