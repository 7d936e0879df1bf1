//! InputMorph - smooth scrolling, gesture and keystroke emulation for
//! external mice and keyboards on macOS.

mod config;
mod engine;
mod interceptor;
mod model;
mod platform;
mod registry;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;

/// InputMorph - smooth scrolling and gesture emulation for external input
/// devices
#[derive(Parser)]
#[command(name = "inputmorph")]
#[command(author = "InputMorph Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Smooth scroll, gesture and keystroke emulation for external mice and keyboards", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interceptor in the foreground
    Run,

    /// Show or generate configuration
    Config {
        /// Generate a sample configuration instead of showing the active one
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List currently attached HID mice and keyboards
    Devices,

    /// Report accessibility permission and tap health
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    match cli.command {
        Commands::Run => run(config).await?,
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config();
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Devices => list_devices().await?,
        Commands::Doctor => run_doctor(),
    }

    Ok(())
}

/// Start the interceptor in the foreground: wires the settings bridge, the
/// device registry, the frontmost-app tracker and the event taps together,
/// then blocks until Ctrl+C (§4.1, §4.2).
#[cfg(target_os = "macos")]
async fn run(config: Config) -> anyhow::Result<()> {
    use interceptor::{DevicePresence, Interceptor};
    use platform::macos::{ActivationObserver, FrontmostAppTracker};
    use registry::{DeviceRegistry, IoKitDeviceSource};
    use settings::SettingsBridge;

    if !platform::macos::has_accessibility_permission() {
        tracing::warn!("accessibility permission not granted; prompting");
        platform::macos::request_accessibility_permission();
        anyhow::bail!(
            "accessibility permission required. Grant it in System Settings > Privacy & \
             Security > Accessibility, then run again."
        );
    }

    let settings = Arc::new(SettingsBridge::new(config));
    let presence = Arc::new(DevicePresence::default());

    let mut registry = DeviceRegistry::new(IoKitDeviceSource::new());
    let mut registry_events = registry.take_event_receiver().expect("fresh registry");
    registry.start().await?;

    {
        let devices = registry.connected_devices().await;
        *presence.external_mouse.write().unwrap() =
            devices.iter().any(|d| d.kind == registry::DeviceKind::Mouse && !d.first_party);
        *presence.external_keyboard.write().unwrap() =
            devices.iter().any(|d| d.kind == registry::DeviceKind::Keyboard && !d.first_party);
    }

    let presence_for_watcher = presence.clone();
    tokio::spawn(async move {
        while let Some(registry::RegistryEvent::DevicesChanged(devices)) = registry_events.recv().await {
            let mouse = devices.iter().any(|d| d.kind == registry::DeviceKind::Mouse && !d.first_party);
            let keyboard = devices.iter().any(|d| d.kind == registry::DeviceKind::Keyboard && !d.first_party);
            *presence_for_watcher.external_mouse.write().unwrap() = mouse;
            *presence_for_watcher.external_keyboard.write().unwrap() = keyboard;
            tracing::info!(mouse, keyboard, "external device presence changed");
        }
    });

    let frontmost = FrontmostAppTracker::new();
    let observer = ActivationObserver::register(frontmost.clone());

    let screen_size = platform::macos::main_display_size();

    let mut interceptor = Interceptor::new();
    interceptor.start(settings.clone(), presence.clone(), frontmost, screen_size)?;

    println!("InputMorph running. Press Ctrl+C to stop.");
    tracing::info!("interceptor started, screen {}x{}", screen_size.0, screen_size.1);

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    interceptor.stop()?;
    registry.stop().await?;
    observer.unregister();

    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn run(_config: Config) -> anyhow::Result<()> {
    anyhow::bail!("inputmorph only supports macOS");
}

#[cfg(target_os = "macos")]
async fn list_devices() -> anyhow::Result<()> {
    use registry::{DeviceRegistry, IoKitDeviceSource};

    let mut registry = DeviceRegistry::new(IoKitDeviceSource::new());
    registry.start().await?;
    // Give the IOKit matching callback one scheduler tick to fire before
    // reading back the snapshot it populates.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let devices = registry.connected_devices().await;
    if devices.is_empty() {
        println!("No HID mice or keyboards detected.");
    } else {
        println!("{:<10} {:<10} {:<20} {:<24} {:<10} {}", "Vendor", "Product", "Vendor name", "Product name", "Kind", "First-party");
        for d in &devices {
            println!(
                "{:<10#x} {:<10#x} {:<20} {:<24} {:<10?} {}",
                d.vendor_id, d.product_id, d.vendor_name, d.product_name, d.kind, d.first_party
            );
        }
    }

    registry.stop().await?;
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn list_devices() -> anyhow::Result<()> {
    anyhow::bail!("inputmorph only supports macOS");
}

#[cfg(target_os = "macos")]
fn run_doctor() {
    println!("InputMorph Doctor");
    println!("=================\n");

    let trusted = platform::macos::has_accessibility_permission();
    println!("Accessibility permission: {}", if trusted { "granted" } else { "NOT granted" });
    if !trusted {
        println!("  Grant it in System Settings > Privacy & Security > Accessibility.");
    }

    let screen = platform::macos::main_display_size();
    println!("Main display: {}x{}", screen.0, screen.1);
    println!("Managed spaces (reported): {}", platform::macos::managed_space_count());

    match config::Config::default_path() {
        Some(path) => println!("Config path: {} (exists: {})", path.display(), path.exists()),
        None => println!("Config path: unavailable (no config directory on this system)"),
    }
}

#[cfg(not(target_os = "macos"))]
fn run_doctor() {
    println!("inputmorph only supports macOS");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["inputmorph", "doctor"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn run_is_default_style_subcommand() {
        let cli = Cli::try_parse_from(["inputmorph", "run", "--verbose"]);
        assert!(cli.is_ok());
    }
}
