//! ados CLI - Command-line interface for ados-mouse
//!
//! Commands:
//! - record: Capture a session from NDJSON events on stdin
//! - extract: Compute the five metrics for a session
//! - profile: Derive acceptance intervals from baseline sessions
//! - score: Verify a live session against baseline sessions

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use ados_mouse::capture;
use ados_mouse::{
    extract_all, verify, BaselineProfiler, BaselineSessionStore, Event, Metric, Session,
    VerificationReport, VerifierConfig, VERSION,
};

/// ados - Pointer-dynamics user verification
#[derive(Parser)]
#[command(name = "ados")]
#[command(version = VERSION)]
#[command(about = "Verify users by how they move and click the mouse", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a session from NDJSON pointer events on stdin
    Record {
        /// Capture duration in seconds (defaults to the configured baseline or live duration)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Use the live capture duration instead of the baseline one
        #[arg(long)]
        live: bool,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Append the session to a baseline sessions file instead of writing it alone
        #[arg(long)]
        append: bool,

        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute metrics for a single session
    Extract {
        /// Session file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Print only this metric
        #[arg(long)]
        metric: Option<String>,
    },

    /// Derive acceptance intervals from baseline sessions
    Profile {
        /// Baseline sessions file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Standard-deviation multiplier (overrides the configuration file)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Verify a live session against baseline sessions
    Score {
        /// Baseline sessions file path
        #[arg(short, long)]
        baseline: PathBuf,

        /// Live session file path (use - for stdin)
        #[arg(short, long)]
        live: PathBuf,

        /// Standard-deviation multiplier (overrides the configuration file)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(command: Commands) -> Result<(), AdosCliError> {
    match command {
        Commands::Record {
            duration,
            live,
            output,
            append,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let duration = match (duration, live) {
                (Some(secs), _) => Duration::from_secs(secs),
                (None, true) => config.live_duration(),
                (None, false) => config.baseline_duration(),
            };
            cmd_record(duration, &output, append)
        }

        Commands::Extract { input, metric } => cmd_extract(&input, metric.as_deref()),

        Commands::Profile {
            input,
            tolerance,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?.with_tolerance(tolerance)?;
            cmd_profile(&input, config.tolerance, &output)
        }

        Commands::Score {
            baseline,
            live,
            tolerance,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?.with_tolerance(tolerance)?;
            cmd_score(&baseline, &live, config.tolerance, json)
        }
    }
}

fn cmd_record(duration: Duration, output: &Path, append: bool) -> Result<(), AdosCliError> {
    let (sink, handle) = capture::channel();

    // The reader stays blocked on stdin after the deadline; it is left behind
    // and ends with the process.
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(trimmed) {
                Ok(event) => {
                    if !sink.send(event) {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "skipping malformed event"),
            }
        }
    });

    let session = handle.collect_for(duration);
    eprintln!("Data collection complete. {} events captured.", session.len());

    if append {
        if is_stdio(output) {
            return Err(AdosCliError::Usage(
                "--append needs a file path for --output".to_string(),
            ));
        }
        let mut store = if output.exists() {
            BaselineSessionStore::from_json(&fs::read_to_string(output)?)?
        } else {
            BaselineSessionStore::new()
        };
        store.push(session);
        fs::write(output, store.to_json()?)?;
        return Ok(());
    }

    write_output(output, &serde_json::to_string_pretty(&session)?)
}

fn cmd_extract(input: &Path, metric: Option<&str>) -> Result<(), AdosCliError> {
    let session: Session = serde_json::from_str(&read_input(input)?)?;
    let values = extract_all(&session);

    match metric {
        Some(name) => println!("{}", values.get_by_name(name)?),
        None => println!("{}", serde_json::to_string_pretty(&values)?),
    }
    Ok(())
}

fn cmd_profile(input: &Path, tolerance: f64, output: &Path) -> Result<(), AdosCliError> {
    let store = BaselineSessionStore::from_json(&read_input(input)?)?;
    if store.session_count() == 0 {
        return Err(AdosCliError::NoSessions);
    }

    let baseline = BaselineProfiler::new(tolerance).profile(store.sessions())?;
    write_output(output, &serde_json::to_string_pretty(&baseline)?)
}

fn cmd_score(
    baseline: &Path,
    live: &Path,
    tolerance: f64,
    json: bool,
) -> Result<(), AdosCliError> {
    let store = BaselineSessionStore::from_json(&fs::read_to_string(baseline)?)?;
    if store.session_count() == 0 {
        return Err(AdosCliError::NoSessions);
    }
    let live: Session = serde_json::from_str(&read_input(live)?)?;

    let report = verify(store.sessions(), &live, tolerance)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.is_match() {
        Ok(())
    } else {
        Err(AdosCliError::Rejected(report.match_ratio))
    }
}

// Helper functions

fn print_report(report: &VerificationReport) {
    println!("Verification Report");
    println!("===================");
    println!(
        "Baseline sessions: {} (tolerance {})",
        report.sessions_in_baseline, report.tolerance
    );
    println!("\nDynamic thresholds:");
    for (metric, interval) in report.baseline.intervals.iter() {
        println!("  {}: {:.2} - {:.2}", metric, interval.lower, interval.upper);
    }

    println!("\nSession metrics:");
    for verdict in &report.verdicts {
        let status = if verdict.in_range { "[OK]" } else { "[OUT]" };
        println!(
            "  {} {}: {:.2} (Threshold: {:.2} - {:.2})",
            status, verdict.metric, verdict.value, verdict.lower, verdict.upper
        );
    }

    if !report.quality_flags.is_empty() {
        let flags: Vec<&str> = report.quality_flags.iter().map(|f| f.as_str()).collect();
        println!("\nQuality flags: {}", flags.join(", "));
    }

    println!(
        "\nMatched {}/{} metrics (ratio {:.2})",
        report.matched_metrics,
        Metric::ALL.len(),
        report.match_ratio
    );
    if report.is_match() {
        println!("The user's behavior matches the expected pattern.");
    } else {
        println!("The user's behavior does not match the expected pattern.");
    }
}

fn load_config(path: Option<&Path>) -> Result<VerifierConfig, AdosCliError> {
    match path {
        Some(path) => Ok(VerifierConfig::load(path)?),
        None => Ok(VerifierConfig::default()),
    }
}

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(input: &Path) -> Result<String, AdosCliError> {
    if is_stdio(input) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), AdosCliError> {
    if is_stdio(output) {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum AdosCliError {
    Io(io::Error),
    Compute(ados_mouse::ComputeError),
    Json(serde_json::Error),
    NoSessions,
    Usage(String),
    Rejected(f64),
}

impl From<io::Error> for AdosCliError {
    fn from(e: io::Error) -> Self {
        AdosCliError::Io(e)
    }
}

impl From<ados_mouse::ComputeError> for AdosCliError {
    fn from(e: ados_mouse::ComputeError) -> Self {
        AdosCliError::Compute(e)
    }
}

impl From<serde_json::Error> for AdosCliError {
    fn from(e: serde_json::Error) -> Self {
        AdosCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AdosCliError> for CliError {
    fn from(e: AdosCliError) -> Self {
        match e {
            AdosCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AdosCliError::Compute(e) => {
                let hint = match &e {
                    ados_mouse::ComputeError::UnknownMetric(_) => format!(
                        "Known metrics: {}",
                        Metric::ALL.map(|m| m.as_str()).join(", ")
                    ),
                    ados_mouse::ComputeError::InvalidConfig(_) => {
                        "Check the configuration file values".to_string()
                    }
                    _ => "Ensure sessions are arrays of move/click/scroll events".to_string(),
                };
                CliError {
                    code: "COMPUTE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint),
                }
            }
            AdosCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AdosCliError::NoSessions => CliError {
                code: "NO_SESSIONS".to_string(),
                message: "No baseline sessions found in input".to_string(),
                hint: Some(
                    "Record at least one baseline session with 'ados record --append'".to_string(),
                ),
            },
            AdosCliError::Usage(msg) => CliError {
                code: "USAGE_ERROR".to_string(),
                message: msg,
                hint: None,
            },
            AdosCliError::Rejected(ratio) => CliError {
                code: "BEHAVIOR_MISMATCH".to_string(),
                message: format!("Only {:.0}% of metrics matched the baseline", ratio * 100.0),
                hint: None,
            },
        }
    }
}
