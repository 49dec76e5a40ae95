//! Core data model: `Track` and `UsageRecord` (spec §3).
//!
//! Tracks are read-only to the core — they are created and updated by the
//! upstream MIR job (out of scope, spec §1) and only ever queried here.

use chrono::{DateTime, Utc};

/// An immutable library entry, as produced by the upstream analysis job.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: String,
    pub file_path: String,
    pub duration_seconds: f64,
    pub bpm: Option<f64>,
    /// Camelot key token (`"{1..12}{A|B}"`), the sentinel `"unknown"`, or
    /// absent entirely. Parsing into a [`crate::camelot::CamelotKey`] happens
    /// at the point of use, not at construction.
    pub key: Option<String>,
    pub cue_in_frames: Option<u64>,
    pub cue_out_frames: Option<u64>,
    pub loop_start_frames: Option<u64>,
    pub loop_length_bars: Option<u32>,
    pub energy: Option<f64>,
    pub cue_in_energy: Option<f64>,
    pub cue_out_energy: Option<f64>,
    pub loudness_db: Option<f64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl Track {
    /// Convenience constructor for a track identified only by the fields the
    /// selector and planner actually reason about. Intended for tests and for
    /// callers building a snapshot without the full descriptor set.
    #[must_use]
    pub fn minimal(track_id: impl Into<String>, file_path: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            track_id: track_id.into(),
            file_path: file_path.into(),
            duration_seconds,
            bpm: None,
            key: None,
            cue_in_frames: None,
            cue_out_frames: None,
            loop_start_frames: None,
            loop_length_bars: None,
            energy: None,
            cue_in_energy: None,
            cue_out_energy: None,
            loudness_db: None,
            title: None,
            artist: None,
            album: None,
        }
    }

    #[must_use]
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = Some(bpm);
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }
}

/// An append-only history entry: one per `(track_id, playlist_id, position)`.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub track_id: String,
    pub playlist_id: String,
    pub position: usize,
    pub used_at: DateTime<Utc>,
}

/// An immutable, caller-owned, order-preserving view of the metadata store's
/// track universe for the duration of one generation call (spec §5).
///
/// Insertion order is load-bearing: the Balanced strategy's "first valid
/// candidate wins" tie-break (spec §9 Open Questions) depends on the store
/// presenting tracks in a stable order across a single snapshot.
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    tracks: Vec<Track>,
}

impl LibrarySnapshot {
    #[must_use]
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    #[must_use]
    pub fn find(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }
}
