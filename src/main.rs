mod app;
mod clipboard;
mod config;
mod controller;
mod error;
#[cfg(test)]
mod fakes;
mod logger;
mod page_event;
mod panel;
mod permission;
mod system_clipboard;
mod toast;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::clipboard::GuardedClipboard;
use crate::config::DemoConfig;
use crate::controller::Controller;
use crate::permission::LocalPermissions;
use crate::system_clipboard::SystemClipboard;

/// Clipboard Demo - copy, paste, watch the clipboard and manage clipboard permissions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (permission descriptors, initial states, timings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clipboard polling period in milliseconds; 0 disables change notifications
    #[arg(long)]
    watch_interval_ms: Option<u64>,

    /// How long a toast stays visible, in milliseconds
    #[arg(long)]
    toast_timeout_ms: Option<u64>,

    /// Log at debug level
    #[arg(long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<DemoConfig, error::ConfigError> {
    let mut config = match &args.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    if let Some(ms) = args.watch_interval_ms {
        config.watch_interval_ms = ms;
    }
    if let Some(ms) = args.toast_timeout_ms {
        config.toast_timeout_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    let args = Args::parse();
    logger::init(args.verbose);
    tracing::info!("===== Clipboard Demo started =====");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    tracing::debug!("config: {:?}", config);

    let permissions = Arc::new(LocalPermissions::new(config.initial_states.clone()));
    let system = Arc::new(SystemClipboard::new(config.watch_interval()));
    let clipboard = Arc::new(GuardedClipboard::new(system, permissions.clone()));
    let controller = Controller::new(clipboard, permissions);

    if let Err(e) = app::run(config, controller) {
        tracing::error!("GUI exited with error: {}", e);
        eprintln!("Error running GUI: {}", e);
        std::process::exit(1);
    }
}
