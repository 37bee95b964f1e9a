//! Clevo/Tuxedo WMI daemon
//!
//! Attaches to the laptop firmware, forwards the airplane-mode hotkey to a
//! virtual input device, drives the keyboard backlight from its hotkeys
//! and serves the control surface until stopped.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info};

use tuxedo_wmi::acpid::AcpidListener;
use tuxedo_wmi::backlight::{Color, DmiIdentity, SUPPORTED_MODELS};
use tuxedo_wmi::config::{Config, Paths};
use tuxedo_wmi::platform::{Hardware, Platform};
use tuxedo_wmi::{IdleDimmer, LoadMonitor};
use tuxedo_wmi::transport::protocol::{EMAIL_GUID, EVENT_GUID, GET_GUID};
use tuxedo_wmi::transport::{SysfsWmiBus, WmiBus};

// CLI definitions
mod cli;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config
    info!("Loading config from {:?}", cli.config);
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply(&cli.overrides.to_overrides());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, cli.overrides.dry_run).await,
        Commands::Detect => {
            detect(&config.paths);
            Ok(())
        }
        Commands::Models => {
            models();
            Ok(())
        }
        Commands::Colors => {
            colors();
            Ok(())
        }
    }
}

/// Attach, serve, detach
async fn run(config: Config, dry_run: bool) -> Result<()> {
    // Fail on a bad config before any hardware is opened
    let settings = config.resolve()?;

    // Set up Ctrl-C / SIGTERM handler before anything needs tearing down
    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = Arc::clone(&shutdown);
    ctrlc::set_handler(move || shutdown_signal.notify_one())
        .context("installing signal handler")?;

    let hardware = if dry_run {
        info!("Dry run: firmware calls are logged, not made");
        Hardware::simulated(&config.paths)
    } else {
        Hardware::open(&config.paths)?
    };
    let platform = Arc::new(Platform::attach(&config, hardware)?);

    let load = if settings.load.is_enabled() && platform.backlight().is_some() {
        match LoadMonitor::spawn(
            Arc::clone(&platform),
            settings.load.clone(),
            &settings.paths.proc_dir,
            settings.backlight.colors,
        ) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                error!("Could not start load monitor: {e}");
                None
            }
        }
    } else {
        None
    };
    let dimmer = Arc::new(IdleDimmer::new(Arc::clone(&platform), settings.dim_delay));

    let acpid = if dry_run {
        None
    } else {
        let notified = Arc::clone(&platform);
        match AcpidListener::connect(&config.paths.acpid_socket, move |value| {
            notified.notify(value)
        }) {
            Ok(listener) => Some(listener),
            Err(e) => {
                error!(
                    "Could not connect to acpid at {}: {e}; only polling the hotkey",
                    config.paths.acpid_socket.display()
                );
                None
            }
        }
    };

    #[cfg(feature = "dbus")]
    let bus = match tuxedo_wmi::dbus::serve(Arc::clone(&platform)).await {
        Ok(conn) => {
            let resume = tokio::spawn(tuxedo_wmi::dbus::watch_resume(
                conn.clone(),
                Arc::clone(&platform),
            ));
            let idle = (settings.dim_delay > 0).then(|| {
                let (conn, dimmer) = (conn.clone(), Arc::clone(&dimmer));
                tokio::spawn(async move {
                    if let Err(e) = tuxedo_wmi::dbus::watch_idle(conn, dimmer).await {
                        tracing::warn!("Idle dimming unavailable: {e}");
                    }
                })
            });
            Some((conn, resume, idle))
        }
        Err(e) => {
            tracing::warn!("D-Bus unavailable, running without control surface: {e}");
            None
        }
    };

    info!("Ready. Ctrl+C to stop.");
    shutdown.notified().await;

    // Cleanup
    info!("Shutting down");
    #[cfg(feature = "dbus")]
    {
        if let Some((conn, resume, idle)) = bus {
            resume.abort();
            if let Some(idle) = idle {
                idle.abort();
            }
            drop(conn);
        }
    }
    dimmer.active();
    if let Some(monitor) = load {
        monitor.stop();
    }
    platform.detach();
    if let Some(listener) = acpid {
        listener.stop();
    }
    Ok(())
}

fn detect(paths: &Paths) {
    match DmiIdentity::read_from(&paths.dmi_dir) {
        Ok(identity) => {
            println!("Vendor:  {}", identity.sys_vendor);
            println!("Product: {}", identity.product_name);
            match identity.identify() {
                Some(model) => println!("Model:   {} ({})", model.ident, model.dialect),
                None => println!("Model:   not supported (no keyboard backlight)"),
            }
        }
        Err(e) => println!("DMI:     unreadable ({e})"),
    }

    let bus = SysfsWmiBus::new(&paths.wmi_bus);
    for (name, guid) in [("event", EVENT_GUID), ("email", EMAIL_GUID), ("get", GET_GUID)] {
        let present = if bus.has_guid(guid) { "present" } else { "missing" };
        println!("WMI {name:<5}  {guid}  {present}");
    }
}

fn models() {
    println!("{:<26} {:<10} {:<16} Dialect", "Model", "Vendor", "Product");
    for model in SUPPORTED_MODELS {
        println!(
            "{:<26} {:<10} {:<16} {}",
            model.ident, model.sys_vendor, model.product_name, model.dialect
        );
    }
}

fn colors() {
    for color in Color::ALL {
        let rgb = color.rgb();
        println!(
            "{}  {:<8} #{:02X}{:02X}{:02X}",
            color.index(),
            color.name(),
            rgb.r,
            rgb.g,
            rgb.b
        );
    }
}
