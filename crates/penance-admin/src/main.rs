//! Operator tool for the Penance penalty document.
//!
//! Validates the document, inspects and edits the pending-death list, and
//! dry-runs a death against an in-memory sandbox so operators can see what
//! a configuration change will cost players before reloading it.
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); command output goes to
//! stdout.

mod commands;
mod sandbox;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use penance_types::ParticipantId;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::commands::Simulation;

#[derive(Debug, Parser)]
#[command(name = "penance-admin")]
#[command(about = "Inspect and validate the Penance death penalty document")]
struct Cli {
    /// Path of the penalty document
    #[arg(
        long,
        global = true,
        env = "PENANCE_CONFIG",
        default_value = "penance-config.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the document and print the penalty summary
    Check,
    /// List participants with a pending death
    Pending {
        /// Print a JSON array instead of one id per line
        #[arg(long)]
        json: bool,
    },
    /// Clear a pending death without applying penalties (server must be stopped)
    Forgive {
        /// Participant UUID
        participant: ParticipantId,
    },
    /// Write the default document if none exists
    Init,
    /// Simulate one death and respawn without touching the document
    Simulate {
        /// Starting balance
        #[arg(long, default_value = "100")]
        balance: Decimal,
        /// Starting experience
        #[arg(long, default_value_t = 100)]
        xp: u32,
        /// The respawn world keeps inventory on death
        #[arg(long)]
        keep_inventory: bool,
        /// Run without an economy provider
        #[arg(long)]
        no_economy: bool,
        /// Die to another player instead of the environment
        #[arg(long)]
        pvp: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli.config.as_path();
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Check => commands::check(path, &mut out),
        Command::Pending { json } => commands::pending(path, json, &mut out),
        Command::Forgive { participant } => commands::forgive(path, participant, &mut out),
        Command::Init => commands::init(path, &mut out),
        Command::Simulate {
            balance,
            xp,
            keep_inventory,
            no_economy,
            pvp,
        } => commands::simulate(
            path,
            Simulation {
                balance,
                experience: xp,
                keep_inventory,
                no_economy,
                pvp,
            },
            &mut out,
        ),
    }
}
