//! # WL Playground
//!
//! Connects to the Wayland compositor named by the environment, opens a
//! 640x480 window and fades its background between black and white.
//! Left click drags the window, right click closes it.

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::Path;

use wl_playground::{wayland, PlaygroundConfig};

#[derive(Parser)]
#[command(name = "wl-playground")]
#[command(about = "A minimal Wayland client that animates a grayscale shared-memory surface")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/wl-playground/config.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Override the window title
    #[arg(short, long)]
    title: Option<String>,
}

/// Load the config file, falling back to defaults when it is missing or invalid
fn load_config(path: &str) -> PlaygroundConfig {
    match PlaygroundConfig::load(path) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", path);
            config
        }
        Err(e) => {
            if Path::new(path).exists() {
                error!("❌ Failed to load configuration: {:#}", e);
            }
            info!("📝 Using default configuration");
            PlaygroundConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting WL Playground");
    info!(
        "📄 Version: {} (built {} for {})",
        wl_playground::VERSION,
        env!("BUILD_DATE"),
        env!("TARGET_TRIPLE")
    );

    let mut config = load_config(&cli.config);
    if let Some(title) = cli.title {
        config.window.title = title;
    }

    wayland::run(&config)?;

    info!("👋 WL Playground shutting down");
    Ok(())
}
