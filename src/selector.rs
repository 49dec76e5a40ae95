//! Selector (component C3, spec §4.3).
//!
//! Builds a playlist by stateful greedy extension from a seed: enumerate
//! the remaining library, apply a boolean candidate filter, then let the
//! active `Strategy` order the survivors and take the first. No
//! backtracking — once a track is appended it is never reconsidered.

use crate::camelot;
use crate::clock::Clock;
use crate::energy;
use crate::error::{CoreError, Result};
use crate::store::MetadataStore;
use crate::track::{LibrarySnapshot, Track};

/// Policy bounds on constraint values, validated once at construction
/// (spec §3, §6).
#[derive(Debug, Clone, Copy)]
pub struct SelectionConstraints {
    pub bpm_tolerance_percent: f64,
    pub energy_window_size: usize,
    pub min_track_duration_seconds: f64,
    pub max_track_duration_seconds: f64,
    pub max_repeat_decay_hours: f64,
}

impl SelectionConstraints {
    /// Construct with validation; fails with `ConfigInvalid` on the first
    /// out-of-bound field.
    pub fn new(
        bpm_tolerance_percent: f64,
        energy_window_size: usize,
        min_track_duration_seconds: f64,
        max_track_duration_seconds: f64,
        max_repeat_decay_hours: f64,
    ) -> Result<Self> {
        bound_check(
            "constraints.bpm_tolerance_percent",
            bpm_tolerance_percent,
            2.0,
            10.0,
        )?;
        bound_check(
            "constraints.energy_window_size",
            energy_window_size as f64,
            2.0,
            5.0,
        )?;
        bound_check(
            "constraints.min_track_duration_seconds",
            min_track_duration_seconds,
            60.0,
            300.0,
        )?;
        bound_check(
            "constraints.max_track_duration_seconds",
            max_track_duration_seconds,
            300.0,
            3600.0,
        )?;
        bound_check(
            "constraints.max_repeat_decay_hours",
            max_repeat_decay_hours,
            24.0,
            720.0,
        )?;
        Ok(Self {
            bpm_tolerance_percent,
            energy_window_size,
            min_track_duration_seconds,
            max_track_duration_seconds,
            max_repeat_decay_hours,
        })
    }
}

impl Default for SelectionConstraints {
    fn default() -> Self {
        Self {
            bpm_tolerance_percent: 4.0,
            energy_window_size: 3,
            min_track_duration_seconds: 120.0,
            max_track_duration_seconds: 1200.0,
            max_repeat_decay_hours: 168.0,
        }
    }
}

fn bound_check(key: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    if value < lo || value > hi {
        return Err(CoreError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            bound: format!("[{lo}, {hi}]"),
        });
    }
    Ok(())
}

/// Pluggable ordering of filtered candidates (spec §9: "Strategy as a
/// first-class variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First-valid pick in library insertion order.
    Balanced,
    /// Rank by distance to a target-energy-curve function of mix progress.
    EnergyCurve,
}

/// The target energy for the Energy-Curve strategy at a given mix
/// progress `p = elapsed / target_duration` (spec §4.3).
#[must_use]
pub fn target_energy_curve(p: f64) -> f64 {
    let p = p.clamp(0.0, f64::MAX);
    if p < 0.3 {
        0.3 + (p / 0.3) * 0.2
    } else if p < 0.5 {
        0.5 + ((p - 0.3) / 0.2) * 0.3
    } else if p < 0.7 {
        0.8
    } else {
        let p = p.min(1.0);
        0.8 - ((p - 0.7) / 0.3) * 0.4
    }
}

/// Observability record for one selection step (spec §4.3).
#[derive(Debug, Clone)]
pub struct SelectionHint {
    pub position: usize,
    pub chosen_track_id: String,
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub valid_candidate_count: usize,
    pub strategy_score: Option<f64>,
}

/// Result of a build: the ordered track ids plus per-step hints. Early
/// termination with `|playlist| >= 2` is reported here, not as an error.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub playlist: Vec<String>,
    pub hints: Vec<SelectionHint>,
}

/// Stateful greedy builder (spec §4.3). Holds no mutable state itself;
/// all state lives in the `Vec<String>` accumulated across `build_playlist`.
pub struct Selector<'a> {
    store: &'a dyn MetadataStore,
    clock: &'a dyn Clock,
    constraints: SelectionConstraints,
    strategy: Strategy,
}

impl<'a> Selector<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn MetadataStore,
        clock: &'a dyn Clock,
        constraints: SelectionConstraints,
        strategy: Strategy,
    ) -> Self {
        Self {
            store,
            clock,
            constraints,
            strategy,
        }
    }

    /// Build a playlist from `seed` until `target_duration_seconds` of
    /// accumulated track duration is reached, `max_playlist_tracks` is hit,
    /// or no compatible successor remains.
    pub fn build_playlist(
        &self,
        library: &LibrarySnapshot,
        seed_track_id: &str,
        target_duration_seconds: f64,
        max_playlist_tracks: usize,
    ) -> Result<SelectionOutcome> {
        if library.is_empty() {
            return Err(CoreError::LibraryEmpty);
        }

        let seed = library
            .find(seed_track_id)
            .ok_or_else(|| CoreError::SeedNotFound {
                id: seed_track_id.to_string(),
            })?;

        if seed.duration_seconds < self.constraints.min_track_duration_seconds {
            return Err(CoreError::SeedTooShort {
                id: seed_track_id.to_string(),
                duration: seed.duration_seconds,
            });
        }

        let mut playlist: Vec<String> = vec![seed.track_id.clone()];
        let mut hints = Vec::new();
        let mut elapsed = seed.duration_seconds;
        let mut current = seed;

        loop {
            if elapsed >= target_duration_seconds || playlist.len() >= max_playlist_tracks {
                break;
            }

            let candidates = self.filter_candidates(library, current, &playlist)?;
            if candidates.is_empty() {
                break;
            }

            let progress = elapsed / target_duration_seconds;
            let (chosen, score) = self.rank(current, &candidates, progress);

            hints.push(SelectionHint {
                position: playlist.len(),
                chosen_track_id: chosen.track_id.clone(),
                bpm: chosen.bpm,
                key: chosen.key.clone(),
                valid_candidate_count: candidates.len(),
                strategy_score: score,
            });

            playlist.push(chosen.track_id.clone());
            elapsed += chosen.duration_seconds;
            current = chosen;
        }

        if playlist.len() < 2 {
            return Err(CoreError::InsufficientCandidates {
                seed: seed_track_id.to_string(),
            });
        }

        Ok(SelectionOutcome { playlist, hints })
    }

    /// Boolean candidate filter, independent of strategy (spec §4.3).
    fn filter_candidates<'t>(
        &self,
        library: &'t LibrarySnapshot,
        current: &Track,
        used_in_set: &[String],
    ) -> Result<Vec<&'t Track>> {
        let current_key = camelot::resolve(current.key.as_deref());
        let now = self.clock.now();
        let mut out = Vec::new();

        for candidate in library.iter() {
            if used_in_set.iter().any(|id| id == &candidate.track_id) {
                continue;
            }
            if candidate.duration_seconds < self.constraints.min_track_duration_seconds {
                continue;
            }
            if !bpm_compatible(current.bpm, candidate.bpm, self.constraints.bpm_tolerance_percent) {
                continue;
            }
            let candidate_key = camelot::resolve(candidate.key.as_deref());
            if !camelot::compatible(current_key, candidate_key) {
                continue;
            }
            let recent = self
                .store
                .recent_usage(&candidate.track_id, self.constraints.max_repeat_decay_hours, now)?;
            if !recent.is_empty() {
                continue;
            }
            out.push(candidate);
        }

        Ok(out)
    }

    /// Order survivors per the active strategy and return the winner plus
    /// its strategy-specific score, if any.
    fn rank<'t>(&self, current: &Track, candidates: &[&'t Track], progress: f64) -> (&'t Track, Option<f64>) {
        match self.strategy {
            Strategy::Balanced => (candidates[0], None),
            Strategy::EnergyCurve => {
                // Ranking key is energy distance to the target curve (spec §4.3
                // Strategy table). `current` is unused here: the curve target
                // depends only on mix progress, not on the outgoing track.
                let _ = current;
                let target = target_energy_curve(progress);
                let mut best_idx = 0;
                let mut best_distance = f64::MAX;
                for (idx, candidate) in candidates.iter().enumerate() {
                    let candidate_energy = energy::estimate_energy(candidate);
                    let distance = energy::distance(candidate_energy, target);
                    if distance < best_distance {
                        best_distance = distance;
                        best_idx = idx;
                    }
                }
                (candidates[best_idx], Some(best_distance))
            }
        }
    }
}

/// BPM compatibility: `|next - cur| <= cur * tolerance_percent / 100`, or at
/// least one side absent (spec §4.1 constraint, §8 boundary behavior:
/// strict inequality at the bound means the comparison is `<=`, tested
/// with an exact-equality case at 126 BPM / 4%).
#[must_use]
pub fn bpm_compatible(current: Option<f64>, next: Option<f64>, tolerance_percent: f64) -> bool {
    match (current, next) {
        (Some(c), Some(n)) => (n - c).abs() <= c * tolerance_percent / 100.0,
        _ => true,
    }
}
