//! Planner (component C4, spec §4.4).
//!
//! Converts an ordered track sequence into a transition plan and emits two
//! artifacts — a Playlist Manifest (`.m3u`) and a Mix Plan (`.json`) —
//! atomically with respect to observability: both land in a temp directory
//! first, then are renamed into place together.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::store::MetadataStore;
use crate::track::LibrarySnapshot;

/// One per track in the final playlist (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEdge {
    pub track_index: usize,
    pub track_id: String,
    pub entry_cue: String,
    pub hold_duration_bars: u32,
    pub target_bpm: Option<f64>,
    pub exit_cue: String,
    pub mix_out_seconds: f64,
    pub effect: String,
    pub next_track_id: Option<String>,
}

/// The renderer-neutral description of a whole mix (spec §3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixPlan {
    pub playlist_id: String,
    pub mix_duration_seconds: i64,
    pub generated_at: String,
    pub transitions: Vec<TransitionEdge>,
}

/// Fixed musical unit for a held mix-out, independent of BPM (spec §4.4).
const HOLD_DURATION_BARS: u32 = 16;

const MIX_OUT_MIN_SECONDS: f64 = 2.0;
const MIX_OUT_MAX_SECONDS: f64 = 8.0;

/// Non-fatal warning surfaced alongside a successful generation (spec §7).
#[derive(Debug, Clone, PartialEq)]
pub struct UsageWarning {
    pub track_id: String,
    pub message: String,
}

/// The two artifact paths plus the in-memory plan and any non-fatal
/// warnings from post-emission usage recording.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub playlist_path: PathBuf,
    pub plan_path: PathBuf,
    pub plan: MixPlan,
    pub warnings: Vec<UsageWarning>,
}

pub struct Planner<'a> {
    store: &'a dyn MetadataStore,
    clock: &'a dyn Clock,
}

impl<'a> Planner<'a> {
    #[must_use]
    pub fn new(store: &'a dyn MetadataStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Build transitions for `playlist`, emit both artifacts into
    /// `output_dir`, then record usage. `crossfade_duration_seconds` comes
    /// from `render.crossfade_duration_seconds` in config and is clamped
    /// into `[2, 8]` here (defense in depth; config validation already
    /// enforces the bound).
    pub fn generate(
        &self,
        library: &LibrarySnapshot,
        playlist: &[String],
        playlist_id: Option<String>,
        crossfade_duration_seconds: f64,
        output_dir: &Path,
    ) -> Result<GenerateOutcome> {
        let now = self.clock.now();
        let playlist_id = playlist_id.unwrap_or_else(|| default_playlist_id(now));

        let transitions = self.build_transitions(library, playlist, crossfade_duration_seconds)?;
        let mix_duration_seconds: i64 = playlist
            .iter()
            .filter_map(|id| library.find(id))
            .map(|t| t.duration_seconds as i64)
            .sum();

        let plan = MixPlan {
            playlist_id: playlist_id.clone(),
            mix_duration_seconds,
            generated_at: format_timestamp(now),
            transitions,
        };

        let (playlist_path, plan_path) = self.write_artifacts(library, playlist, &plan, output_dir)?;

        let mut warnings = Vec::new();
        for (position, track_id) in playlist.iter().enumerate() {
            if let Err(e) = self.store.append_usage(track_id, &playlist_id, position, now) {
                log::warn!("usage record append failed for '{track_id}': {e}");
                warnings.push(UsageWarning {
                    track_id: track_id.clone(),
                    message: e.to_string(),
                });
            }
        }

        Ok(GenerateOutcome {
            playlist_path,
            plan_path,
            plan,
            warnings,
        })
    }

    fn build_transitions(
        &self,
        library: &LibrarySnapshot,
        playlist: &[String],
        crossfade_duration_seconds: f64,
    ) -> Result<Vec<TransitionEdge>> {
        let mix_out_seconds = crossfade_duration_seconds.clamp(MIX_OUT_MIN_SECONDS, MIX_OUT_MAX_SECONDS);
        let mut edges = Vec::with_capacity(playlist.len());

        for (idx, track_id) in playlist.iter().enumerate() {
            let track = library
                .find(track_id)
                .ok_or_else(|| CoreError::SeedNotFound { id: track_id.clone() })?;
            let next_track_id = playlist.get(idx + 1).cloned();
            let next_key = next_track_id.as_deref().and_then(|id| library.find(id)).and_then(|t| t.key.as_deref());

            edges.push(TransitionEdge {
                track_index: idx,
                track_id: track.track_id.clone(),
                entry_cue: "cue_in".to_string(),
                hold_duration_bars: HOLD_DURATION_BARS,
                target_bpm: track.bpm,
                exit_cue: "cue_out".to_string(),
                mix_out_seconds,
                effect: choose_effect(track.key.as_deref(), next_key),
                next_track_id,
            });
        }

        Ok(edges)
    }

    /// Write both artifacts to a temp directory under `output_dir`, then
    /// rename both into place. If either write fails, remove whatever was
    /// already written and propagate `ArtifactWriteFailed`.
    fn write_artifacts(
        &self,
        library: &LibrarySnapshot,
        playlist: &[String],
        plan: &MixPlan,
        output_dir: &Path,
    ) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(output_dir)?;
        let staging = output_dir.join(format!(".{}-staging", plan.playlist_id));
        fs::create_dir_all(&staging)?;

        let m3u_name = format!("{}.m3u", plan.playlist_id);
        let json_name = format!("{}.json", plan.playlist_id);
        let staged_m3u = staging.join(&m3u_name);
        let staged_json = staging.join(&json_name);

        let write_result = self
            .write_m3u(&staged_m3u, library, playlist)
            .and_then(|()| self.write_plan_json(&staged_json, plan));

        if let Err(_e) = write_result {
            let _ = fs::remove_dir_all(&staging);
            return Err(CoreError::ArtifactWriteFailed {
                path: staged_json.display().to_string(),
            });
        }

        let final_m3u = output_dir.join(&m3u_name);
        let final_json = output_dir.join(&json_name);
        fs::rename(&staged_m3u, &final_m3u).map_err(|_| CoreError::ArtifactWriteFailed {
            path: final_m3u.display().to_string(),
        })?;
        if let Err(_e) = fs::rename(&staged_json, &final_json) {
            let _ = fs::remove_file(&final_m3u);
            return Err(CoreError::ArtifactWriteFailed {
                path: final_json.display().to_string(),
            });
        }
        let _ = fs::remove_dir_all(&staging);

        Ok((final_m3u, final_json))
    }

    fn write_m3u(&self, path: &Path, library: &LibrarySnapshot, playlist: &[String]) -> Result<()> {
        let mut file = fs::File::create(path)?;
        writeln!(file, "#EXTM3U")?;
        for track_id in playlist {
            let track = library
                .find(track_id)
                .ok_or_else(|| CoreError::SeedNotFound { id: track_id.clone() })?;
            let label = Path::new(&track.file_path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| track.track_id.clone());
            writeln!(file, "#EXT-INF:{},{}", track.duration_seconds as i64, label)?;
            writeln!(file, "{}", track.file_path)?;
        }
        file.flush()?;
        Ok(())
    }

    fn write_plan_json(&self, path: &Path, plan: &MixPlan) -> Result<()> {
        let json = serde_json::to_string_pretty(plan)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// `smart_crossfade` today; reserved dispatch point for `filter_swap`
/// (distant-but-parallel transitions) and `loop_roll` (spec §4.4, §9).
fn choose_effect(_current_key: Option<&str>, _next_key: Option<&str>) -> String {
    "smart_crossfade".to_string()
}

fn default_playlist_id(now: DateTime<Utc>) -> String {
    format!("autodj-{}", now.format("%Y%m%d-%H%M%S"))
}

fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
