//! Configuration loading and bound validation (spec §6).
//!
//! Values are loaded from a TOML document and validated once at startup;
//! an out-of-range value fails fast, naming the offending key and its
//! allowed range, before any generation work begins.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::selector::{SelectionConstraints, Strategy};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub target_duration_minutes: u32,
    pub max_playlist_tracks: usize,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            target_duration_minutes: 60,
            max_playlist_tracks: 90,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConstraintsConfig {
    pub bpm_tolerance_percent: f64,
    pub energy_window_size: usize,
    pub min_track_duration_seconds: f64,
    pub max_track_duration_seconds: f64,
    pub max_repeat_decay_hours: f64,
}

impl Default for ConstraintsConfig {
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

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub crossfade_duration_seconds: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            crossfade_duration_seconds: 4.0,
        }
    }
}

/// The full validated configuration document (spec §6 table).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub mix: MixConfig,
    pub constraints: ConstraintsConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Load and validate a TOML document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse and validate a TOML document already in memory.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every bound in the spec.md §6 table. Called once by
    /// [`Config::parse`] at load time, and again by callers (e.g. the CLI)
    /// after applying an override, so an out-of-range override fails the
    /// same way an out-of-range config file value would.
    pub fn validate(&self) -> Result<()> {
        bound_u32("mix.target_duration_minutes", self.mix.target_duration_minutes, 30, 120)?;
        bound_usize("mix.max_playlist_tracks", self.mix.max_playlist_tracks, 10, 150)?;
        bound_f64(
            "constraints.bpm_tolerance_percent",
            self.constraints.bpm_tolerance_percent,
            2.0,
            10.0,
        )?;
        bound_usize(
            "constraints.energy_window_size",
            self.constraints.energy_window_size,
            2,
            5,
        )?;
        bound_f64(
            "constraints.min_track_duration_seconds",
            self.constraints.min_track_duration_seconds,
            60.0,
            300.0,
        )?;
        bound_f64(
            "constraints.max_track_duration_seconds",
            self.constraints.max_track_duration_seconds,
            300.0,
            3600.0,
        )?;
        bound_f64(
            "constraints.max_repeat_decay_hours",
            self.constraints.max_repeat_decay_hours,
            24.0,
            720.0,
        )?;
        bound_f64(
            "render.crossfade_duration_seconds",
            self.render.crossfade_duration_seconds,
            2.0,
            8.0,
        )?;
        Ok(())
    }

    /// Build the [`SelectionConstraints`] this config describes. Infallible:
    /// bounds were already checked by [`Config::validate`] at load time.
    #[must_use]
    pub fn selection_constraints(&self) -> SelectionConstraints {
        SelectionConstraints::new(
            self.constraints.bpm_tolerance_percent,
            self.constraints.energy_window_size,
            self.constraints.min_track_duration_seconds,
            self.constraints.max_track_duration_seconds,
            self.constraints.max_repeat_decay_hours,
        )
        .expect("config was already validated at load time")
    }

    #[must_use]
    pub fn target_duration_seconds(&self) -> f64 {
        f64::from(self.mix.target_duration_minutes) * 60.0
    }
}

/// CLI `--mode` selects which strategy `generate` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Mode {
    Balanced,
    EnergyCurve,
}

impl From<Mode> for Strategy {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Balanced => Strategy::Balanced,
            Mode::EnergyCurve => Strategy::EnergyCurve,
        }
    }
}

fn bound_u32(key: &str, value: u32, lo: u32, hi: u32) -> Result<()> {
    if value < lo || value > hi {
        return Err(CoreError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            bound: format!("[{lo}, {hi}]"),
        });
    }
    Ok(())
}

fn bound_usize(key: &str, value: usize, lo: usize, hi: usize) -> Result<()> {
    if value < lo || value > hi {
        return Err(CoreError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            bound: format!("[{lo}, {hi}]"),
        });
    }
    Ok(())
}

fn bound_f64(key: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    if value < lo || value > hi {
        return Err(CoreError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            bound: format!("[{lo}, {hi}]"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = Config::default();
        assert_eq!(config.mix.target_duration_minutes, 60);
        assert_eq!(config.mix.max_playlist_tracks, 90);
        assert_eq!(config.constraints.bpm_tolerance_percent, 4.0);
        assert_eq!(config.constraints.energy_window_size, 3);
        assert_eq!(config.constraints.min_track_duration_seconds, 120.0);
        assert_eq!(config.constraints.max_track_duration_seconds, 1200.0);
        assert_eq!(config.constraints.max_repeat_decay_hours, 168.0);
        assert_eq!(config.render.crossfade_duration_seconds, 4.0);
    }

    #[test]
    fn parses_a_partial_document_with_defaults_filled_in() {
        let config = Config::parse("[mix]\ntarget_duration_minutes = 45\n").unwrap();
        assert_eq!(config.mix.target_duration_minutes, 45);
        assert_eq!(config.constraints.bpm_tolerance_percent, 4.0);
    }

    #[test]
    fn rejects_out_of_range_values_naming_the_key() {
        let err = Config::parse("[mix]\ntarget_duration_minutes = 200\n").unwrap_err();
        match err {
            CoreError::ConfigInvalid { key, .. } => assert_eq!(key, "mix.target_duration_minutes"),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bpm_tolerance_below_floor() {
        let err = Config::parse("[constraints]\nbpm_tolerance_percent = 1.0\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }
}
