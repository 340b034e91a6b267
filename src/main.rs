//! fileflow CLI Entry Point
//!
//! # Usage
//!
//! ```bash
//! # Run a workflow
//! fileflow run --config project/workflow.json
//!
//! # Overwrite existing outputs and keep going past failed files
//! fileflow run --config project/workflow.json --force
//!
//! # Only keep going, with a 30 second deadline per script
//! fileflow run --config project/workflow.yaml --keep-going --timeout 30
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use log::info;

use fileflow::environment::{runtime_version, NODE_PATH};
use fileflow::execution::{run_with_policy, RunPolicy, RunSummary};
use fileflow::logging::FacadeLogger;
use fileflow::{FlowError, APP_NAME, VERSION};

/// Default workflow file used when `--config` is not given.
const DEFAULT_WORKFLOW: &str = "workflow.json";

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum Command {
    Run(Config),
    Help,
    Version,
}

/// Why the CLI stopped with a failure.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Bad command line; usage is shown after the message
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Run(#[from] FlowError),
}

/// Options of the `run` subcommand.
#[derive(Debug, PartialEq)]
struct Config {
    workflow_path: PathBuf,
    force: bool,
    overwrite: bool,
    keep_going: bool,
    timeout: Option<Duration>,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workflow_path: PathBuf::from(DEFAULT_WORKFLOW),
            force: false,
            overwrite: false,
            keep_going: false,
            timeout: None,
            verbose: false,
        }
    }
}

impl Config {
    fn policy(&self) -> RunPolicy {
        let base = RunPolicy::from_force(self.force);
        base.with_overwrite(base.overwrite_existing || self.overwrite)
            .with_continue_on_error(base.continue_on_error || self.keep_going)
            .with_default_timeout(self.timeout)
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: fileflow run [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config PATH       Workflow file, JSON or YAML (default: {})", DEFAULT_WORKFLOW);
    println!("  --force             Same as --overwrite --keep-going");
    println!("  --overwrite         Ignore skip_existing and rewrite outputs");
    println!("  --keep-going        Log failed files and continue with the rest");
    println!("  --timeout SECONDS   Deadline for scripts without their own");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  fileflow run --config project/workflow.json");
    println!("  fileflow run --config project/workflow.yaml --force --timeout 30");
}

/// Parses command-line arguments.
fn parse_arguments(args: &[String]) -> Result<Command, String> {
    let mut config = Config::default();
    let mut saw_run = false;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "run" if !saw_run => saw_run = true,
            "--force" => config.force = true,
            "--overwrite" => config.overwrite = true,
            "--keep-going" => config.keep_going = true,
            "--verbose" | "-v" => config.verbose = true,
            "--config" | "-c" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "--config requires a path argument".to_string())?;
                config.workflow_path = PathBuf::from(value);
            }
            "--timeout" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "--timeout requires a number of seconds".to_string())?;
                let seconds: f64 = value
                    .parse()
                    .map_err(|_| format!("Invalid timeout value: {}", value))?;
                if !seconds.is_finite() || seconds <= 0.0 {
                    return Err(format!("Timeout must be positive: {}", value));
                }
                config.timeout = Some(Duration::from_secs_f64(seconds));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => return Err(format!("Unexpected argument: {}", arg)),
        }
        i += 1;
    }

    if !saw_run {
        return Err("Missing command: run".to_string());
    }

    Ok(Command::Run(config))
}

/// Prints the colored end-of-run summary.
fn print_summary(summary: &RunSummary) {
    println!();
    let failed = summary.failures();
    let headline = format!(
        "Workflow '{}': {} written, {} skipped, {} failed",
        summary.workflow,
        summary.written(),
        summary.skipped(),
        failed.len()
    );
    if failed.is_empty() {
        println!("{}", headline.green());
    } else {
        println!("{}", headline.yellow());
        for (file, message) in failed {
            println!("  {} {}: {}", "x".red(), file.display(), message);
        }
    }
    println!("Total execution time: {:.2?}", summary.elapsed);
    print!("{}", summary.timeline.chart());
}

/// Main application entry point.
fn run() -> Result<(), CliError> {
    let args: Vec<String> = env::args().collect();

    let config = match parse_arguments(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Ok(Command::Version) => {
            println!("{} {}", APP_NAME, VERSION);
            return Ok(());
        }
        Err(e) => return Err(CliError::Usage(e)),
    };

    setup_logging(config.verbose);
    print_banner();

    match runtime_version(&NODE_PATH) {
        Some(version) => info!("Script runtime: {} ({})", NODE_PATH.display(), version),
        None => info!("Script runtime not available; transform steps will fail"),
    }

    let policy = config.policy();
    info!(
        "Policy: overwrite={}, keep-going={}, timeout={:?}",
        policy.overwrite_existing, policy.continue_on_error, policy.default_timeout
    );

    let summary = run_with_policy(&config.workflow_path, policy, Arc::new(FacadeLogger))?;
    print_summary(&summary);

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let CliError::Usage(_) = e {
                eprintln!();
                print_usage();
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("fileflow")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_run_defaults() {
        let command = parse_arguments(&args(&["run"])).unwrap();
        assert_eq!(command, Command::Run(Config::default()));
    }

    #[test]
    fn test_parse_run_options() {
        let command = parse_arguments(&args(&[
            "run", "--config", "wf.yaml", "--keep-going", "--timeout", "1.5", "-v",
        ]))
        .unwrap();

        let Command::Run(config) = command else {
            panic!("expected run command");
        };
        assert_eq!(config.workflow_path, PathBuf::from("wf.yaml"));
        assert!(config.keep_going);
        assert!(!config.overwrite);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert!(config.verbose);
    }

    #[test]
    fn test_force_sets_both_switches() {
        let Command::Run(config) = parse_arguments(&args(&["run", "--force"])).unwrap() else {
            panic!("expected run command");
        };
        let policy = config.policy();
        assert!(policy.overwrite_existing);
        assert!(policy.continue_on_error);
    }

    #[test]
    fn test_individual_switches() {
        let Command::Run(config) = parse_arguments(&args(&["run", "--overwrite"])).unwrap() else {
            panic!("expected run command");
        };
        let policy = config.policy();
        assert!(policy.overwrite_existing);
        assert!(!policy.continue_on_error);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse_arguments(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(parse_arguments(&args(&["run", "-V"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_usage_error_message_is_bare() {
        let message = parse_arguments(&args(&["run", "--bogus"])).unwrap_err();
        let error = CliError::Usage(message);
        assert_eq!(error.to_string(), "Unknown option: --bogus");
        assert!(!error.to_string().contains("Error:"));
    }

    #[test]
    fn test_run_error_wraps_flow_error() {
        let error = CliError::from(FlowError::UnknownStepType("map".to_string()));
        assert!(matches!(error, CliError::Run(_)));
        assert!(error.to_string().contains("unknown step type 'map'"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_arguments(&args(&[])).is_err());
        assert!(parse_arguments(&args(&["run", "--config"])).is_err());
        assert!(parse_arguments(&args(&["run", "--timeout", "soon"])).is_err());
        assert!(parse_arguments(&args(&["run", "--timeout", "0"])).is_err());
        assert!(parse_arguments(&args(&["run", "--bogus"])).is_err());
        assert!(parse_arguments(&args(&["run", "extra"])).is_err());
    }
}
