//! Energy Model (component C2, spec §4.2).
//!
//! Every track resolves to a scalar energy in `[0.0, 1.0]` through a
//! priority-ordered fallback chain, then candidates are scored against a
//! target by a weighted blend of distance-to-target and lookahead variance.

use crate::track::Track;

/// Linear mapping bounds for the BPM and loudness fallbacks (spec §4.2).
const BPM_MIN: f64 = 80.0;
const BPM_MAX: f64 = 180.0;
const LOUDNESS_MIN_DB: f64 = -40.0;
const LOUDNESS_MAX_DB: f64 = 0.0;

/// Energy assigned when every fallback in the chain is absent.
const NEUTRAL_ENERGY: f64 = 0.5;

/// Weight of distance-to-target vs. lookahead variance in [`score`].
const DISTANCE_WEIGHT: f64 = 0.7;
const VARIANCE_WEIGHT: f64 = 0.3;

/// Resolve a track's energy via the fallback chain: explicit `energy`,
/// then `cue_in_energy`, then `cue_out_energy`, then `loudness_db` linearly
/// mapped, then `bpm` linearly mapped, then the neutral midpoint.
#[must_use]
pub fn estimate_energy(track: &Track) -> f64 {
    if let Some(e) = track.energy {
        return clamp_unit(e);
    }
    if let Some(e) = track.cue_in_energy {
        return clamp_unit(e);
    }
    if let Some(e) = track.cue_out_energy {
        return clamp_unit(e);
    }
    if let Some(db) = track.loudness_db {
        return clamp_unit(linear_map(db, LOUDNESS_MIN_DB, LOUDNESS_MAX_DB));
    }
    if let Some(bpm) = track.bpm {
        return clamp_unit(linear_map(bpm, BPM_MIN, BPM_MAX));
    }
    NEUTRAL_ENERGY
}

fn linear_map(value: f64, lo: f64, hi: f64) -> f64 {
    (value - lo) / (hi - lo)
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Absolute distance between a candidate's energy and a target, in `[0, 1]`.
#[must_use]
pub fn distance(candidate_energy: f64, target_energy: f64) -> f64 {
    (candidate_energy - target_energy).abs()
}

/// Population standard deviation of a short lookahead window of energies,
/// used to penalize picks that would make the near-future energy
/// trajectory choppy.
///
/// Returns `0.0` for an empty or single-element window (spec §4.2: "`0` if
/// fewer than 2 items").
#[must_use]
pub fn lookahead_variance(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance = window.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / window.len() as f64;
    variance.sqrt()
}

/// Weighted candidate score: lower is better. Combines distance-to-target
/// (0.7) with the lookahead variance the pick would introduce (0.3), per
/// spec §4.2.
#[must_use]
pub fn score(candidate_energy: f64, target_energy: f64, lookahead_window: &[f64]) -> f64 {
    DISTANCE_WEIGHT * distance(candidate_energy, target_energy)
        + VARIANCE_WEIGHT * lookahead_variance(lookahead_window)
}
