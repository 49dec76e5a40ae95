//! Structured error types for the autodj core.
//!
//! The core never swallows an error at its boundary (spec §7): every fatal
//! condition in config loading, selection, or planning surfaces as a
//! `CoreError` variant the caller can match on. The CLI wrapper is free to
//! wrap these with `anyhow` context when presenting them to a human.

use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, CoreError>;

/// All fatal (and the one non-fatal) error kinds the core can produce.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration value fell outside its documented bound.
    #[error("config key '{key}' has value {value} outside allowed bound {bound}")]
    ConfigInvalid {
        key: String,
        value: String,
        bound: String,
    },

    /// The library snapshot contained no tracks at all.
    #[error("library snapshot is empty")]
    LibraryEmpty,

    /// The requested seed track id is not present in the library snapshot.
    #[error("seed track '{id}' not found in library")]
    SeedNotFound { id: String },

    /// The seed track is shorter than `min_track_duration_seconds`.
    #[error("seed track '{id}' is too short ({duration}s)")]
    SeedTooShort { id: String, duration: f64 },

    /// No library track can legally follow the seed under the active
    /// constraints.
    #[error("no compatible successor found for seed '{seed}'")]
    InsufficientCandidates { seed: String },

    /// The metadata store could not service a read.
    #[error("metadata store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    /// Artifact emission failed before the atomic rename; both artifacts
    /// have been cleaned up and the playlist was not returned.
    #[error("failed to write artifact at {path}")]
    ArtifactWriteFailed { path: String },

    /// Post-emission usage recording failed. Non-fatal: callers receive this
    /// as a warning alongside a successful `GenerateOutcome`, never as `Err`.
    #[error("failed to record usage for track '{track_id}'")]
    UsageRecordFailed { track_id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
