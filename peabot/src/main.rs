/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use peabot::config::Config;
use peabot::dispatcher::EventDispatcher;
use peabot::factory::GaitFactory;
use peabot::robot::ServoBank;
use peabot::scheduler::KeyframeScheduler;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Peabot quadruped controller.
///
/// Example:
///   peabot --config peabot.yaml -e reset -e walk:2 -e delay:1.5 -e elevate:0.8
#[derive(Debug, Parser)]
#[command(
    name = "peabot",
    about = "Peabot quadruped controller – event dispatcher and keyframe scheduler",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML robot configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Command to run at startup, as name[:arg] (repeatable, run in order).
    #[arg(short = 'e', long = "command", value_name = "NAME[:ARG]")]
    commands: Vec<String>,

    /// Disable synthesized transitions between keyframes.
    #[arg(long = "no-transitions", default_value_t = false)]
    no_transitions: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    info!("Peabot starting up...");

    let cli = Cli::parse();

    info!(
        config         = ?cli.config,
        commands       = cli.commands.len(),
        no_transitions = cli.no_transitions,
        "Configuration"
    );

    // ── Load robot configuration ──────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load robot configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using default robot settings");
            Config::default()
        }
    };
    if cli.no_transitions {
        config.transitions.enabled = false;
    }
    let config = Arc::new(config);

    // ── Wire up the pipeline ──────────────────────────────────────────────────
    let servos = Arc::new(ServoBank::new(&config));
    let factory = Arc::new(GaitFactory::new(config.gait.clone()));
    let scheduler = Arc::new(KeyframeScheduler::new(
        Arc::clone(&config),
        factory,
        servos.clone(),
    ));

    if let Err(e) = scheduler.start() {
        error!("Failed to start keyframe scheduler: {e}");
        process::exit(1);
    }

    let dispatcher = EventDispatcher::new(Arc::clone(&scheduler), config.logging, config.tick());
    if let Err(e) = dispatcher.start() {
        error!("Failed to start event dispatcher: {e}");
        scheduler.stop();
        process::exit(1);
    }

    for command in &cli.commands {
        if !dispatcher.enqueue_command(command) {
            warn!(command = %command, "Ignoring unrecognised command");
        }
    }

    info!("Peabot running, press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
    }

    // ── Orderly shutdown ──────────────────────────────────────────────────────
    info!("Shutting down...");
    dispatcher.stop();
    scheduler.stop();

    info!(
        pending = scheduler.pending(),
        ticks = ?servos.ticks(),
        "Peabot stopped"
    );
}
