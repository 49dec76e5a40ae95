//! `autodj` CLI entry point.
//!
//! Thin wrapper: parse arguments, load config, call into the core, map the
//! result to an exit code (spec §6). No retry logic lives here (spec §9).
//!
//! Exit codes: `0` success, `1` fatal error, `2` CLI usage error (clap's
//! own `Parser::parse` already exits with this code before `main` runs),
//! `130` user interrupt (the default SIGINT disposition, since no handler
//! is installed here).

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use autodj::cli::{Args, Command};
use autodj::config::Config;
use autodj::store::SqliteStore;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FATAL: u8 = 1;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Generate {
            config,
            target_minutes,
            seed,
            mode,
            output_dir,
            store,
        } => {
            let mut cfg = Config::load(&config).with_context(|| format!("loading config from {}", config.display()))?;

            if let Some(minutes) = target_minutes {
                cfg.mix.target_duration_minutes = minutes;
                cfg.validate().context("validating --target-minutes override")?;
            }

            let metadata_store =
                SqliteStore::open(&store).with_context(|| format!("opening metadata store at {}", store.display()))?;

            let outcome = autodj::run_generate(
                &metadata_store,
                &cfg,
                mode.into(),
                seed.as_deref(),
                None,
                &output_dir,
            )
            .context("generating mix")?;

            println!("playlist: {}", outcome.playlist_path.display());
            println!("plan:     {}", outcome.plan_path.display());
            for warning in &outcome.warnings {
                eprintln!("warning: usage record failed for '{}': {}", warning.track_id, warning.message);
            }

            Ok(())
        }
    }
}
