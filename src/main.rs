//! scene-bridge: loopback TCP bridge for AI-assisted control of a live
//! 3D modelling session.
//!
//! This binary serves the in-memory reference host so clients can be
//! developed and exercised without the real modelling application. Inside
//! the application itself, the extension embeds [`BridgeServer`] directly
//! and drives [`BridgeServer::tick`] from the host's own timer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use scene_bridge::bridge::server::BridgeServer;
use scene_bridge::config;
use scene_bridge::host::memory::{MemoryHost, MemoryModel};
use scene_bridge::host::{BoundingBox, EntityKind};

/// Loopback TCP bridge exposing a live 3D modelling session to AI
/// assistants.
///
/// Serves the in-memory reference host; a demo scene is open so the
/// describe and export tools have something to work on.
#[derive(Parser, Debug)]
#[command(name = "scene-bridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,

    /// Start with no model open instead of the demo scene
    #[arg(long)]
    empty: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the demo scene served by default: a small table.
fn demo_host() -> MemoryHost {
    let mut model = MemoryModel::new("demo table");
    model.add_entity(
        EntityKind::Group,
        Some("top"),
        BoundingBox::new([0.0, 0.0, 700.0], [1200.0, 600.0, 730.0]),
    );
    for (i, x) in [20.0, 1140.0].iter().enumerate() {
        for (j, y) in [20.0, 540.0].iter().enumerate() {
            model.add_entity(
                EntityKind::Component,
                Some(&format!("leg {}", i * 2 + j + 1)),
                BoundingBox::new([*x, *y, 0.0], [*x + 40.0, *y + 40.0, 700.0]),
            );
        }
    }
    MemoryHost::with_model(model)
}

/// Entry point for the scene-bridge dev server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "scene-bridge {}  Copyright (C) 2026  The scene-bridge Authors",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting scene-bridge dev server"
    );

    let host = if args.empty {
        MemoryHost::new()
    } else {
        demo_host()
    };

    let mut server = BridgeServer::new(cfg, host);

    // Run the server
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(server.run());

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
