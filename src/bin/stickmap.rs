use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

use stickmap::backends::hid::HidBackend;
use stickmap::{
    resolve, AppConfig, DefinitionRegistry, DeviceEnumerator, EventFilter, JsonLinesListener,
    Session, ShutdownFlag, TracingListener,
};

#[derive(Parser, Debug)]
#[command(
    name = "stickmap",
    version,
    about = "Decode HID input reports into named stick/button/status events",
    disable_help_subcommand = true
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the <vendor>/<configuration> definition tree
    #[arg(long, global = true)]
    definitions: Option<PathBuf>,

    /// Override the definition's vendor id (decimal or 0x-prefixed hex)
    #[arg(long, global = true, value_parser = parse_u16)]
    vendor_id: Option<u16>,

    /// Override the definition's product id (decimal or 0x-prefixed hex)
    #[arg(long, global = true, value_parser = parse_u16)]
    product_id: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List attached HID devices
    List,
    /// Print the configuration that would be used for a device
    Resolve {
        /// Vendor name or <vendor>/<configuration>
        device: Option<String>,
    },
    /// Decode reports and print one JSON event per line
    Watch {
        /// Vendor name or <vendor>/<configuration>
        device: Option<String>,
        /// Stop after this many decoded reports
        #[arg(long)]
        frames: Option<u64>,
        /// Also log each event
        #[arg(long)]
        log_events: bool,
    },
}

fn parse_u16(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid id `{s}`: {e}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.definitions {
        cfg.definitions_dir = dir;
    }
    if cli.vendor_id.is_some() {
        cfg.vendor_id = cli.vendor_id;
    }
    if cli.product_id.is_some() {
        cfg.product_id = cli.product_id;
    }

    let backend = HidBackend::new()?.with_read_timeout(cfg.read_timeout_ms);

    match cli.command {
        Commands::List => {
            for dev in backend.attached()? {
                println!("{dev}");
            }
        }
        Commands::Resolve { device } => {
            let registry = DefinitionRegistry::load_dir(&cfg.definitions_dir)?;
            let identifier = pick_device(device, &cfg)?;
            let id = resolve(&registry, &identifier, &backend.attached_ids()?)?;
            println!("{id}");
        }
        Commands::Watch {
            device,
            frames,
            log_events,
        } => {
            let registry = DefinitionRegistry::load_dir(&cfg.definitions_dir)?;
            let identifier = pick_device(device, &cfg)?;
            let mut session = Session::connect(
                &registry,
                &identifier,
                &backend,
                cfg.overrides(),
                cfg.session_options(),
            )?;
            session.add_listener(JsonLinesListener::new(io::stdout()), EventFilter::All, None)?;
            if log_events {
                let name = session.id().to_string();
                session.add_listener(TracingListener::new(name), EventFilter::All, None)?;
            }

            let shutdown = ShutdownFlag::new();
            stop_on_ctrl_c(shutdown.clone())?;
            session.run_until(&shutdown, frames)?;
            info!(frames = session.frames(), "done");
            session.close();
        }
    }
    Ok(())
}

/// Trigger `shutdown` on the first Ctrl-C so the watch loop can return and close the device.
fn stop_on_ctrl_c(shutdown: ShutdownFlag) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;
    std::thread::spawn(move || match runtime.block_on(tokio::signal::ctrl_c()) {
        Ok(()) => {
            info!("interrupted, stopping");
            shutdown.trigger();
        }
        Err(err) => warn!(error = %err, "cannot listen for Ctrl-C"),
    });
    Ok(())
}

fn pick_device(arg: Option<String>, cfg: &AppConfig) -> Result<String> {
    arg.or_else(|| cfg.device.clone())
        .context("no device given (pass one or set `device` in the config file)")
}
