//! Command-line interface (spec §6, "CLI surface").
//!
//! A thin wrapper around the core: parse arguments, load and validate
//! config, call into `autodj::run_generate`, translate the result into an
//! exit code. No retry logic lives here or anywhere else in the core.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Mode;

#[derive(Debug, Parser)]
#[command(name = "autodj", author, version, about = "Offline headless algorithmic DJ", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build one mix and emit its playlist and plan artifacts.
    Generate {
        /// Path to a TOML configuration document.
        #[arg(long)]
        config: PathBuf,

        /// Target mix length in minutes (overrides `mix.target_duration_minutes`).
        #[arg(long)]
        target_minutes: Option<u32>,

        /// Seed track id to start from. Picked at random from the library when omitted.
        #[arg(long)]
        seed: Option<String>,

        /// Selection strategy.
        #[arg(long, value_enum, default_value = "balanced")]
        mode: Mode,

        /// Directory the playlist and plan artifacts are written into.
        #[arg(long)]
        output_dir: PathBuf,

        /// Path to the SQLite metadata store.
        #[arg(long)]
        store: PathBuf,
    },
}
