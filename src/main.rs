//! Audit Trail CLI - operational tool for the day-partitioned audit log.
//!
//! Queries the log, runs retention sweeps on demand, or runs the scheduled
//! retention sweeper as a long-lived process.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use audit_trail::config::Settings;
use audit_trail::error::AuditError;
use audit_trail::mask::SensitiveDataMasker;
use audit_trail::query::{AuditLogQueryEngine, QueryCriteria};
use audit_trail::record::AuditRecord;
use audit_trail::recorder::{AuditLogRecorder, RetentionSweeper};
use audit_trail::store::AuditFileStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let config_path = get_config_path(&args);

    let settings = match Settings::load(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    let store = Arc::new(AuditFileStore::new(settings.storage.dir.clone()));

    match find_command(&args) {
        Some("record") => run_record(&settings, store),
        Some("query") => run_query(&args, store),
        Some("sweep") => run_sweep(&settings, store),
        Some("run") => run_sweeper(&settings, store),
        Some(other) => {
            eprintln!("Unknown command '{}'. See --help.", other);
            ExitCode::FAILURE
        }
        None => {
            print_help();
            ExitCode::FAILURE
        }
    }
}

/// Append one record, read as JSON from stdin, masked per configuration.
fn run_record(settings: &Settings, store: Arc<AuditFileStore>) -> ExitCode {
    use std::io::Read;

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("Error reading record from stdin: {}", e);
        return ExitCode::FAILURE;
    }

    let record: AuditRecord = match serde_json::from_str(&input) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Invalid record JSON: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let recorder = AuditLogRecorder::new(store, SensitiveDataMasker::from_config(&settings.masking));
    match recorder.record(record) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Failed to append audit record");
            ExitCode::FAILURE
        }
    }
}

/// Execute one query and print the response as JSON.
fn run_query(args: &[String], store: Arc<AuditFileStore>) -> ExitCode {
    let criteria = match parse_criteria(args) {
        Ok(c) => c,
        Err(message) => {
            eprintln!("Invalid query arguments: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let engine = AuditLogQueryEngine::new(store);
    match engine.query_response(&criteria) {
        Ok(response) => {
            match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!(error = %e, "Failed to encode query response");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e @ AuditError::Query { .. }) => {
            eprintln!("Query rejected: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Query failed");
            ExitCode::FAILURE
        }
    }
}

/// Run one retention sweep and print the count of files removed.
fn run_sweep(settings: &Settings, store: Arc<AuditFileStore>) -> ExitCode {
    let sweeper = RetentionSweeper::new(
        store,
        settings.retention.days,
        settings.retention.cleanup_hour_utc,
    );
    match sweeper.sweep() {
        Some(removed) => {
            println!("Removed {} expired audit file(s)", removed);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Retention sweep already in progress");
            ExitCode::FAILURE
        }
    }
}

/// Run the scheduled retention sweeper until SIGTERM/SIGINT.
fn run_sweeper(settings: &Settings, store: Arc<AuditFileStore>) -> ExitCode {
    info!("Starting {} v{}", NAME, VERSION);
    info!("Audit directory: {}", settings.storage.dir.display());
    info!(
        "Retention: {} days, daily sweep at {:02}:00 UTC",
        settings.retention.days, settings.retention.cleanup_hour_utc
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        let sweeper = Arc::new(RetentionSweeper::new(
            store,
            settings.retention.days,
            settings.retention.cleanup_hour_utc,
        ));
        let handle = sweeper.start();

        shutdown_signal().await;
        info!("Shutdown signal received, stopping retention sweeper");
        sweeper.stop();
        let _ = handle.await;
    });

    info!("Stopped");
    ExitCode::SUCCESS
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Build query criteria from `--flag value` pairs.
fn parse_criteria(args: &[String]) -> Result<QueryCriteria, String> {
    let mut criteria = QueryCriteria::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--operator" => criteria.operator = Some(flag_value(args, i)?.to_string()),
            "--path" => criteria.path = Some(flag_value(args, i)?.to_string()),
            "--page" => criteria.page = Some(flag_value(args, i)?.to_string()),
            "--action" => criteria.action = Some(flag_value(args, i)?.to_string()),
            "--method" => criteria.method = Some(flag_value(args, i)?.parse()?),
            "--status" => {
                criteria.status_code = Some(
                    flag_value(args, i)?
                        .parse()
                        .map_err(|_| "status must be a number".to_string())?,
                )
            }
            "--start" => criteria.start_date = Some(parse_date(flag_value(args, i)?)?),
            "--end" => criteria.end_date = Some(parse_date(flag_value(args, i)?)?),
            "--limit" => {
                criteria.limit = Some(
                    flag_value(args, i)?
                        .parse()
                        .map_err(|_| "limit must be a number".to_string())?,
                )
            }
            "--offset" => {
                criteria.offset = Some(
                    flag_value(args, i)?
                        .parse()
                        .map_err(|_| "offset must be a non-negative number".to_string())?,
                )
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    Ok(criteria)
}

/// The first free-standing argument, skipping flags and their values.
fn find_command(args: &[String]) -> Option<&str> {
    let mut skip_next = false;
    for arg in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--config" || arg == "-c" {
            skip_next = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return Some(arg.as_str());
    }
    None
}

/// The value following a `--flag` argument.
fn flag_value(args: &[String], i: usize) -> Result<&str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", args[i]))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Get configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> String {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    "/etc/audit-trail/config.toml".to_string()
}

/// Initialize logging based on settings.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Operational tool for the day-partitioned audit log.

USAGE:
    {} [OPTIONS] <COMMAND>

COMMANDS:
    record   Append one audit record, read as JSON from stdin
    query    Query audit records and print the JSON response
             [--operator S] [--path S] [--page S] [--action S]
             [--method POST|PUT|PATCH|DELETE] [--status N]
             [--start YYYY-MM-DD] [--end YYYY-MM-DD]
             [--limit N] [--offset N]
    sweep    Run one retention sweep now
    run      Run the scheduled daily retention sweeper

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: /etc/audit-trail/config.toml]
    -h, --help             Print help information
    -V, --version          Print version information
"#,
        NAME, VERSION, NAME
    );
}
