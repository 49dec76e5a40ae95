//! Offline, headless algorithmic DJ: greedy playlist builder and
//! transition planner.
//!
//! The crate is organized leaf-first:
//! - [`camelot`] - Harmonic-mixing wheel: key parsing and compatibility.
//! - [`energy`] - Per-track energy estimation and candidate scoring.
//! - [`selector`] - Stateful greedy playlist builder with pluggable strategies.
//! - [`planner`] - Transition planning and artifact emission.
//!
//! ### Supporting modules
//!
//! - [`track`] - Core data model (`Track`, `UsageRecord`, `LibrarySnapshot`).
//! - [`store`] - Metadata store contract and SQLite implementation.
//! - [`clock`] - Injectable time source for deterministic tests.
//! - [`config`] - TOML configuration loading and bound validation.
//! - [`error`] - Structured core error type.
//! - [`cli`] - Command-line argument definitions.
//!
//! Everything upstream of the Library Snapshot (MIR feature extraction) and
//! everything downstream of the Mix Plan (DSP rendering) is out of scope;
//! this crate only implements the Generate phase.

pub mod camelot;
pub mod clock;
pub mod cli;
pub mod config;
pub mod energy;
pub mod error;
pub mod planner;
pub mod selector;
pub mod store;
pub mod track;

use rand::seq::IteratorRandom;
use rand::SeedableRng;

use clock::{Clock, SystemClock};
use config::Config;
use error::{CoreError, Result};
use planner::{GenerateOutcome, Planner};
use selector::{Selector, Strategy};
use store::MetadataStore;

/// Run one full generate call: snapshot the library, pick a seed, build a
/// playlist, plan transitions, and emit artifacts. This is the single
/// entry point the CLI wrapper calls into (spec §2 data flow).
pub fn run_generate(
    store: &dyn MetadataStore,
    config: &Config,
    strategy: Strategy,
    seed_track_id: Option<&str>,
    random_seed: Option<u64>,
    output_dir: &std::path::Path,
) -> Result<GenerateOutcome> {
    let clock = SystemClock;
    run_generate_with_clock(store, config, strategy, seed_track_id, random_seed, output_dir, &clock)
}

/// Same as [`run_generate`] but with an injectable clock, so tests can fix
/// `now` and assert deterministic `generated_at` / `used_at` values (spec §9).
pub fn run_generate_with_clock(
    store: &dyn MetadataStore,
    config: &Config,
    strategy: Strategy,
    seed_track_id: Option<&str>,
    random_seed: Option<u64>,
    output_dir: &std::path::Path,
    clock: &dyn Clock,
) -> Result<GenerateOutcome> {
    let library = store.list_tracks()?;
    if library.is_empty() {
        return Err(CoreError::LibraryEmpty);
    }

    let seed_id = match seed_track_id {
        Some(id) => id.to_string(),
        None => pick_random_seed(&library, random_seed)?,
    };

    let selector = Selector::new(store, clock, config.selection_constraints(), strategy);
    let outcome = selector.build_playlist(
        &library,
        &seed_id,
        config.target_duration_seconds(),
        config.mix.max_playlist_tracks,
    )?;

    let planner = Planner::new(store, clock);
    planner.generate(
        &library,
        &outcome.playlist,
        None,
        config.render.crossfade_duration_seconds,
        output_dir,
    )
}

/// Choose a seed track id at random, using an explicit, reproducible PRNG
/// when `random_seed` is given (spec §4.3 "Determinism": no randomness
/// except at seed selection, and only from an explicit seeded source).
fn pick_random_seed(library: &track::LibrarySnapshot, random_seed: Option<u64>) -> Result<String> {
    let chosen = match random_seed {
        Some(seed_value) => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed_value);
            library.iter().choose(&mut rng)
        }
        None => {
            let mut rng = rand::thread_rng();
            library.iter().choose(&mut rng)
        }
    };
    chosen
        .map(|t| t.track_id.clone())
        .ok_or(CoreError::LibraryEmpty)
}
