//! krypton-boundary-orchestrator — gate jobs on Krypton entropy health
//!
//! Usage:
//!   krypton-boundary-orchestrator health [--strict]        Show one health snapshot
//!   krypton-boundary-orchestrator run-once [--job <id>]    Run one gated iteration
//!   krypton-boundary-orchestrator loop [--job <id>] ...    Run repeatedly and summarize
//!   krypton-boundary-orchestrator jobs                     List registered jobs

use std::path::PathBuf;
use std::time::Duration;

use krypton_boundary_orchestrator::telemetry::{self, LoopOptions};
use krypton_boundary_orchestrator::{jobs, Gate, KryptonClient, OrchestratorConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    init_tracing();

    match args[1].as_str() {
        "health" => cmd_health(&args[2..]),
        "run-once" => cmd_run_once(&args[2..]),
        "loop" => cmd_loop(&args[2..]),
        "jobs" => cmd_jobs(&args[2..]),
        "version" | "--version" | "-V" => cmd_version(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"krypton-boundary-orchestrator — gate jobs on Krypton entropy health

USAGE:
    krypton-boundary-orchestrator <COMMAND> [OPTIONS]

COMMANDS:
    health [--strict]                   Fetch a single Krypton health snapshot
    run-once [--job <id>]               Run one gated iteration (default job: dummy)
    loop [--job <id>] [--iterations N] [--interval <secs>]
                                        Run repeatedly and print a summary
    jobs                                List registered jobs
    version                             Show version information
    help                                Show this help message

OPTIONS:
    --config <path>                     Config file (default: boundary-orchestrator.toml)

ENVIRONMENT:
    BOUNDARY_ORCHESTRATOR_CONFIG        Config file path
    RUST_LOG                            Log filter for stderr diagnostics (default: warn)"#
    );
}

fn cmd_version() {
    println!("krypton-boundary-orchestrator v{}", env!("CARGO_PKG_VERSION"));
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for (i, arg) in args.iter().enumerate() {
        if arg == flag {
            match args.get(i + 1) {
                Some(value) => return Some(value.as_str()),
                None => {
                    eprintln!("Error: {flag} requires a value");
                    std::process::exit(1);
                }
            }
        }
    }
    None
}

fn parsed_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).map(|raw| match raw.parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Error: invalid value for {flag}: '{raw}'");
            std::process::exit(1);
        }
    })
}

fn load_config(args: &[String]) -> OrchestratorConfig {
    let explicit = flag_value(args, "--config").map(PathBuf::from);
    let path = OrchestratorConfig::resolve_path(explicit.as_deref());
    match OrchestratorConfig::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match krypton_boundary_orchestrator::render_json(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error: failed to render output: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_health(args: &[String]) {
    let cfg = load_config(args);
    let client = KryptonClient::new(cfg.krypton);

    let snapshot = if args.iter().any(|a| a == "--strict") {
        match client.try_acquire() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {} ({e})", client.endpoint());
                std::process::exit(1);
            }
        }
    } else {
        client.acquire()
    };
    print_json(&snapshot);
}

fn cmd_run_once(args: &[String]) {
    let cfg = load_config(args);
    let job = flag_value(args, "--job").unwrap_or(jobs::DUMMY_JOB);
    let registry = jobs::builtin_registry(&cfg.jobs);
    let gate = Gate::new(KryptonClient::new(cfg.krypton.clone()));

    match gate.run_by_name(job, &registry, &cfg.scheduler) {
        Ok(outcome) => print_json(&outcome),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_loop(args: &[String]) {
    let cfg = load_config(args);
    let job = flag_value(args, "--job").unwrap_or(jobs::DUMMY_JOB);
    let defaults = LoopOptions::default();
    let iterations = parsed_flag::<u64>(args, "--iterations").unwrap_or(defaults.iterations);
    let interval = match parsed_flag::<f64>(args, "--interval") {
        Some(secs) => match Duration::try_from_secs_f64(secs) {
            Ok(d) => d,
            Err(_) => {
                eprintln!("Error: --interval must be a non-negative number of seconds");
                std::process::exit(1);
            }
        },
        None => defaults.interval,
    };

    let registry = jobs::builtin_registry(&cfg.jobs);
    let gate = Gate::new(KryptonClient::new(cfg.krypton.clone()));
    let opts = LoopOptions {
        iterations,
        interval,
    };

    match telemetry::drive(&gate, job, &registry, &cfg.scheduler, &opts) {
        Ok(summary) => print_json(&summary),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_jobs(args: &[String]) {
    let cfg = load_config(args);
    let registry = jobs::builtin_registry(&cfg.jobs);
    for id in registry.ids() {
        println!("{id}");
    }
}
