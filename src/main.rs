// Camera Wi-Fi Setup - Main Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Camera Wi-Fi Setup
//!
//! Register IP cameras and push Wi-Fi credentials to them from a Linux
//! machine, using NetworkManager to see the networks in range.
//!
//! This is the main entry point for the console application.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;

mod application;
mod dbus_client;
mod models;
mod network_utils;
mod services;
mod storage;
mod ui;

use application::Application;
use dbus_client::NmWifiPlatform;
use models::{Error, Result};
use services::{Provisioner, SimulatedProvisioner, SimulatedWifiPlatform};
use storage::PreferenceStore;
use ui::Console;

/// Human-readable application name.
pub const APP_NAME: &str = "Camera Wi-Fi Setup";

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print version information and exit.
fn print_version() {
    println!("{} {}", APP_NAME, VERSION);
    println!("Copyright (C) 2026 Christos A. Daggas");
    println!("License: MIT");
    println!();
    println!("Register IP cameras and push Wi-Fi credentials to them from Linux.");
}

/// Print help information and exit.
fn print_help() {
    println!(
        "Usage: {} [OPTIONS]",
        env::args().next().unwrap_or_else(|| "camera-wifi-setup".to_string())
    );
    println!();
    println!("Register IP cameras and push Wi-Fi credentials to them from Linux.");
    println!();
    println!("Options:");
    println!("  -h, --help       Show this help message and exit");
    println!("  -v, --version    Show version information and exit");
    println!("  -d, --debug      Enable debug logging");
    println!("      --simulate   Use a simulated Wi-Fi platform instead of NetworkManager");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG         Set log level (trace, debug, info, warn, error)");
}

async fn run(simulate: bool) -> Result<()> {
    let store = Arc::new(PreferenceStore::new());
    let config = store.settings();
    let provisioner: Arc<dyn Provisioner> = Arc::new(SimulatedProvisioner::new(config.connect_delay()));
    let input = BufReader::new(tokio::io::stdin());

    if simulate {
        tracing::info!("Using the simulated Wi-Fi platform");
        let platform = Arc::new(SimulatedWifiPlatform::demo());
        let app = Application::new(store, platform, provisioner);
        Console::new(app, std::io::stdout()).run(input).await
    } else {
        let platform = NmWifiPlatform::connect(config.poll_interval()).await?;
        let app = Application::new(store, platform, provisioner);
        Console::new(app, std::io::stdout()).run(input).await
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut debug_mode = false;
    let mut simulate = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            "-d" | "--debug" => {
                debug_mode = true;
            }
            "--simulate" => {
                simulate = true;
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Try '--help' for more information.");
                return ExitCode::FAILURE;
            }
        }
    }

    // Settings are read before logging is up so the configured level applies
    let config = PreferenceStore::load_config().unwrap_or_default();
    let log_level = if debug_mode {
        tracing::Level::DEBUG
    } else {
        config.tracing_level()
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level.into()),
        )
        .init();

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(simulate));
    // Stdin reads cannot be cancelled; do not wait for them.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            if e.is_bus_unavailable() || matches!(e, Error::NetworkManagerDbus(_)) {
                eprintln!("NetworkManager is not reachable. Try '--simulate' to explore without it.");
            }
            ExitCode::FAILURE
        }
    }
}
