//! carbon-window entry point: CLI wiring and config-driven planning.

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use carbon_window::config::ScenarioConfig;
use carbon_window::io::export::export_windows_csv;
use carbon_window::runner;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    start_override: Option<DateTime<Utc>>,
    forecast_csv: Option<PathBuf>,
    windows_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("carbon-window: find the lowest-carbon start for a delayable job");
    eprintln!();
    eprintln!("Usage: carbon-window [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override synthetic forecast seed");
    eprintln!("  --start <rfc3339>        Override reference start instant");
    eprintln!("  --forecast-csv <path>    Read the forecast from a timestamp,intensity CSV");
    eprintln!("  --windows-out <path>     Export every candidate window to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after planning");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostic output on stderr.");
}

/// Returns the value following a flag, exiting if it is missing.
fn flag_value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        start_override: None,
        forecast_csv: None,
        windows_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, "--scenario", "path").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "name").to_string());
            }
            "--seed" => {
                i += 1;
                let raw = flag_value(&args, i, "--seed", "u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--start" => {
                i += 1;
                let raw = flag_value(&args, i, "--start", "RFC 3339 timestamp");
                match DateTime::parse_from_rfc3339(raw) {
                    Ok(t) => cli.start_override = Some(t.with_timezone(&Utc)),
                    Err(e) => {
                        eprintln!("error: --start value \"{raw}\" is not RFC 3339: {e}");
                        process::exit(1);
                    }
                }
            }
            "--forecast-csv" => {
                i += 1;
                cli.forecast_csv = Some(PathBuf::from(flag_value(&args, i, "--forecast-csv", "path")));
            }
            "--windows-out" => {
                i += 1;
                cli.windows_out = Some(flag_value(&args, i, "--windows-out", "path").to_string());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = flag_value(&args, i, "--port", "u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply overrides
    if let Some(seed) = cli.seed_override {
        scenario.forecast.seed = seed;
    }
    if let Some(start) = cli.start_override {
        scenario.search.start = Some(start);
    }
    if let Some(path) = cli.forecast_csv {
        scenario.forecast.source = "csv".to_string();
        scenario.forecast.path = Some(path);
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let start = runner::resolve_start(&scenario);
    let samples = runner::load_samples(&scenario, start).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    let report = runner::plan(&scenario, &samples, start).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    println!("{report}");

    // Export CSV if requested
    if let Some(ref path) = cli.windows_out {
        let exported = runner::build_averager(&scenario, &samples, start)
            .map_err(io::Error::other)
            .and_then(|averager| export_windows_csv(&averager, Path::new(path)));
        if let Err(e) = exported {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Windows written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = carbon_window::api::AppState::build(scenario, samples, start)
            .unwrap_or_else(|e| {
                eprintln!("error: {e}");
                process::exit(1);
            });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(carbon_window::api::serve(Arc::new(state), addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
