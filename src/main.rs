use anyhow::{Context, Result};
use clap::Parser;
use parkspot::view::live_tile;
use parkspot::{ParkspotApp, ParkspotConfig, PollOutcome, RunMode, Zone};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "parkspot")]
#[command(about = "Terminal client for parking occupancy and zone reservations")]
#[command(version)]
#[command(long_about = "Polls a parking service endpoint for the proximity sensor reading of a \
monitored space and lets you reserve or release it for one of the parking zones. Runs as an \
interactive terminal view by default, or headless for logging only.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "parkspot.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Log file used in interactive mode
    #[arg(long, value_name = "PATH", default_value = "parkspot.log")]
    log_file: String,

    /// Poll the endpoint once, print the reading and exit
    #[arg(long)]
    poll_once: bool,

    /// Run without the terminal view; log readings instead
    #[arg(long)]
    headless: bool,

    /// Zone to open on startup (A, B or C)
    #[arg(long, value_parser = parse_zone)]
    zone: Option<Zone>,
}

fn parse_zone(input: &str) -> std::result::Result<Zone, String> {
    Zone::parse(input).ok_or_else(|| format!("unknown zone '{}', expected A, B or C", input))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let interactive = !(args.headless || args.poll_once || args.validate_config);
    let log_guard = init_logging(&args, interactive)?;

    info!("Starting parkspot v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = ParkspotConfig::load_from_file(&args.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    if args.poll_once {
        let app = ParkspotApp::new(config, RunMode::Headless)?;
        let outcome = app.poll_once().await;
        let tile = live_tile(&app.state().snapshot());

        return match outcome {
            PollOutcome::Updated(reading) | PollOutcome::Unchanged(reading) => {
                println!("proximity_value={} -> {} ({})", reading, tile.label, tile.color);
                Ok(())
            }
            PollOutcome::Failed(e) => {
                eprintln!("✗ Poll failed: {}", e);
                std::process::exit(1);
            }
            PollOutcome::Skipped => {
                eprintln!("✗ Poll skipped, another request was in flight");
                std::process::exit(1);
            }
        };
    }

    let mode = if interactive {
        RunMode::Interactive
    } else {
        RunMode::Headless
    };

    let mut app = ParkspotApp::new(config, mode).map_err(|e| {
        error!("Failed to create client: {}", e);
        e
    })?;
    app.set_initial_zone(args.zone);

    app.initialize().await?;

    app.start().await.map_err(|e| {
        error!("Failed to start client: {}", e);
        e
    })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("Client error during execution: {}", e);
        e
    })?;

    info!("Parkspot exited with code: {}", exit_code);
    // Flush file logs; process::exit skips destructors
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args, interactive: bool) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parkspot={}", log_level)));

    // The terminal view owns stdout/stderr in interactive mode
    let (writer, guard, ansi) = if interactive {
        let path = std::path::Path::new(&args.log_file);
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let file_name = path
            .file_name()
            .context("log file path has no file name")?;

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        (BoxMakeWriter::new(non_blocking), Some(guard), false)
    } else {
        (BoxMakeWriter::new(std::io::stderr), None, true)
    };

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    let rendered = toml::to_string_pretty(&ParkspotConfig::default())
        .context("failed to render default configuration")?;

    println!("# Parkspot Configuration File");
    println!("# Environment overrides use PARKSPOT_<SECTION>__<KEY>, e.g. PARKSPOT_POLL__INTERVAL_MS");
    println!();
    println!("{}", rendered);
    Ok(())
}
