use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use boltwatch::config::Config;
use boltwatch::controller::Monitor;
use boltwatch::view::Presenter;

/// Thunderbolt topology, fabric network throughput and hardware inventory.
#[derive(Parser)]
#[command(name = "boltwatch", version, about)]
struct Args {
    /// Refresh interval in seconds (overrides the config file).
    #[arg(short, long)]
    interval: Option<u64>,

    /// Print a single snapshot and exit.
    #[arg(long)]
    once: bool,

    /// Emit snapshots as JSON.
    #[arg(long)]
    json: bool,

    /// Config file (default: ~/.boltwatch/config.json).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(args: &Args) -> io::Result<Option<WorkerGuard>> {
    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("boltwatch={}", level)));

    match &args.log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log file has no name"))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(false)
                .init();
            Ok(None)
        }
    }
}

fn print_snapshot(monitor: &Monitor, json: bool, out: &mut impl Write) -> io::Result<()> {
    let Some(data) = monitor.last_data.as_ref() else {
        return Ok(());
    };
    if json {
        let text = Presenter::render_json(data).map_err(io::Error::other)?;
        writeln!(out, "{}", text)?;
    } else {
        writeln!(out, "{}", Presenter::render_text(data))?;
    }
    out.flush()
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("boltwatch: cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "config rejected");
            eprintln!("boltwatch: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(secs) = args.interval {
        config.interval_secs = secs.max(1);
    }

    let should_quit = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&should_quit)) {
            error!(signal, error = %e, "cannot install signal handler");
        }
    }

    let mut monitor = Monitor::new(&config);
    let mut stdout = io::stdout();
    info!(interval = config.interval_secs, "sampling started");

    loop {
        let tick = Instant::now();
        monitor.update();

        if !args.once && !args.json {
            if let Err(e) = Presenter::clear_screen(&mut stdout) {
                error!(error = %e, "cannot clear terminal");
            }
        }
        if let Err(e) = print_snapshot(&monitor, args.json, &mut stdout) {
            // Broken pipe: nobody is reading any more.
            error!(error = %e, "cannot write snapshot");
            return ExitCode::FAILURE;
        }
        if args.once {
            break;
        }

        while tick.elapsed() < config.interval() {
            if should_quit.load(Ordering::Relaxed) {
                info!("sampling stopped");
                return ExitCode::SUCCESS;
            }
            thread::sleep(Duration::from_millis(100));
        }
    }

    ExitCode::SUCCESS
}
