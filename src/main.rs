use anyhow::{Context, Result};
use clap::Parser;
use hwsens::config::{AppConfig, OutputFormat};
use hwsens::output::{render_inactive, render_snapshot, RenderOptions};
use hwsens::{PollEvent, Poller, ReadingSelector};
use hwsens_core::{CancelFlag, DataSource, ReaderOptions, SegmentProvider, SegmentState, SnapshotReader};
use hwsens_sources::{save_dump, DumpProvider, HwinfoSource, SensorService};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// hwsens - Inspect the HWiNFO shared memory sensor segment
#[derive(Parser, Debug, Clone)]
#[command(name = "hwsens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keep polling and print every snapshot until interrupted
    #[arg(short = 'w', long = "watch")]
    watch: bool,

    /// Print JSON instead of text
    #[arg(short = 'j', long = "json")]
    json: bool,

    /// Print original sensor names and labels instead of user-assigned ones
    #[arg(long = "original-labels")]
    original_labels: bool,

    /// Read a segment dump instead of the live segment
    #[arg(long = "dump", value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Save the raw copy of the segment to a file
    #[arg(long = "save-dump", value_name = "FILE")]
    save_dump: Option<PathBuf>,

    /// Only print the sensor with this id (sensor_id * 100 + instance)
    #[arg(short = 's', long = "sensor", value_name = "ID")]
    sensor: Option<String>,

    /// Follow one reading (e.g. 10000:7) and print its values
    #[arg(short = 'f', long = "follow", value_name = "SENSOR:READING")]
    follow: Option<ReadingSelector>,

    /// Upper bound on waiting for the segment mutex, in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Time between snapshots in watch mode, in milliseconds
    #[arg(long = "interval-ms", value_name = "MS")]
    interval_ms: Option<u64>,

    /// Configuration file to use instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long = "write-config")]
    write_config: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting hwsens v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }),
    };
    Ok(apply_flags(cli, config))
}

fn apply_flags(cli: &Cli, mut config: AppConfig) -> AppConfig {
    // Command line flags take precedence over the file
    if let Some(timeout_ms) = cli.timeout_ms {
        config.poll.mutex_timeout_ms = timeout_ms;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poll.interval_ms = interval_ms;
    }
    if cli.json {
        config.output.format = OutputFormat::Json;
    }
    if cli.original_labels {
        config.output.user_labels = false;
    }
    config
}

fn open_provider(cli: &Cli) -> Result<Box<dyn SegmentProvider>> {
    match &cli.dump {
        Some(path) => Ok(Box::new(DumpProvider::open(path)?)),
        None => hwsens_sources::live_provider(),
    }
}

fn write_config(cli: &Cli, config: &AppConfig) -> Result<()> {
    let path = match &cli.config {
        Some(path) => {
            config.save_to_path(path)?;
            path.clone()
        }
        None => {
            config.save()?;
            AppConfig::config_path()?
        }
    };
    info!("Wrote configuration to {}", path.display());
    println!("{}", path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = match (&cli.config, cli.write_config) {
        // The file is about to be created
        (Some(path), true) if !path.exists() => apply_flags(&cli, AppConfig::default()),
        _ => load_config(&cli)?,
    };
    if cli.write_config {
        return write_config(&cli, &config);
    }
    let provider = open_provider(&cli)?;
    info!("Reading {}", provider.describe());

    let cancel = CancelFlag::new();
    let reader = SnapshotReader::with_options(
        provider,
        ReaderOptions {
            mutex_timeout: config.poll.mutex_timeout(),
            cancel: Some(cancel.clone()),
        },
    );
    let options = RenderOptions {
        format: config.output.format,
        user_labels: config.output.user_labels,
        sensor: cli.sensor.clone(),
    };

    let service = Arc::new(SensorService::new());
    let mut follow = cli.follow.as_ref().map(|selector| {
        let mut source_config = selector.to_source_config();
        source_config.use_user_labels = config.output.user_labels;
        HwinfoSource::with_config(Arc::clone(&service), source_config)
    });

    if let Some(path) = &cli.save_dump {
        let raw = reader.capture()?;
        save_dump(&raw, path)?;
        if !cli.watch {
            let state = raw.decode()?;
            return print_state(state, &service, follow.as_mut(), &options);
        }
    }

    if !cli.watch {
        let state = reader.read()?;
        return print_state(state, &service, follow.as_mut(), &options);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(watch(reader, service, follow, options, config.poll.interval(), cancel))
}

fn print_state(
    state: SegmentState,
    service: &SensorService,
    follow: Option<&mut HwinfoSource>,
    options: &RenderOptions,
) -> Result<()> {
    match state {
        SegmentState::Active(snapshot) => {
            let rendered = render_snapshot(&snapshot, false, options)?;
            service.apply(SegmentState::Active(snapshot));
            match follow {
                Some(source) => print_followed(source, options.format),
                None => {
                    print!("{}", rendered);
                    Ok(())
                }
            }
        }
        SegmentState::Inactive { signature } => {
            print!("{}", render_inactive(signature, options.format)?);
            Ok(())
        }
    }
}

fn print_followed(source: &mut HwinfoSource, format: OutputFormat) -> Result<()> {
    source.update()?;
    let values = source.get_values();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&values)?),
        OutputFormat::Text => match values.get("value") {
            Some(value) => println!(
                "{}: {} {}",
                values.get("caption").and_then(|v| v.as_str()).unwrap_or_default(),
                value,
                values.get("unit").and_then(|v| v.as_str()).unwrap_or_default()
            ),
            None => println!("{}: not available", source.metadata().name),
        },
    }
    Ok(())
}

async fn watch(
    reader: SnapshotReader<Box<dyn SegmentProvider>>,
    service: Arc<SensorService>,
    mut follow: Option<HwinfoSource>,
    options: RenderOptions,
    interval: std::time::Duration,
    cancel: CancelFlag,
) -> Result<()> {
    let poller = Poller::new(reader, service, interval);
    let (mut rx, handle) = poller.spawn(4);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    PollEvent::Snapshot { snapshot, stale } => match follow.as_mut() {
                        Some(source) => print_followed(source, options.format)?,
                        None => print!("{}", render_snapshot(&snapshot, stale, &options)?),
                    },
                    PollEvent::Inactive { signature } => {
                        print!("{}", render_inactive(signature, options.format)?)
                    }
                    PollEvent::Failed(e) if e.is_transient() => warn!("{}", e),
                    PollEvent::Failed(e) => error!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                cancel.cancel();
                break;
            }
        }
    }

    drop(rx);
    handle.await.context("Poller task failed")?;
    Ok(())
}
