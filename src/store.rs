//! Metadata store contract and a SQLite-backed implementation (spec §6).
//!
//! The core treats the store as an external collaborator: it only ever
//! calls the three operations below. `list_tracks` must return tracks in a
//! stable, insertion-by-analysis-time order across one call — the Balanced
//! strategy's first-valid tie-break depends on that stability (spec §9).

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::track::{LibrarySnapshot, Track, UsageRecord};

/// The upstream metadata store's query contract.
pub trait MetadataStore {
    /// All tracks currently known to the store, in stable insertion order.
    fn list_tracks(&self) -> Result<LibrarySnapshot>;

    /// Usage history for one track within the last `since_hours` counted
    /// back from `now`, newest first. `now` is caller-supplied (rather than
    /// sampled here) so the repeat-decay window is governed by the same
    /// injectable clock as every other timestamp in a generation call
    /// (spec §9 "Time source").
    fn recent_usage(&self, track_id: &str, since_hours: f64, now: DateTime<Utc>) -> Result<Vec<UsageRecord>>;

    /// Append one usage record. Called only from the Planner's post-emission step.
    fn append_usage(
        &self,
        track_id: &str,
        playlist_id: &str,
        position: usize,
        used_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// A local, embedded SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if absent) the store at `path` and ensure its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// An in-memory store, for tests and benchmarks.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tracks (
                rowid_order      INTEGER PRIMARY KEY AUTOINCREMENT,
                track_id         TEXT NOT NULL UNIQUE,
                file_path        TEXT NOT NULL,
                duration_seconds REAL NOT NULL,
                bpm              REAL,
                key              TEXT,
                cue_in_frames    INTEGER,
                cue_out_frames   INTEGER,
                loop_start_frames INTEGER,
                loop_length_bars INTEGER,
                energy           REAL,
                cue_in_energy    REAL,
                cue_out_energy   REAL,
                loudness_db      REAL,
                title            TEXT,
                artist           TEXT,
                album            TEXT
            );
            CREATE TABLE IF NOT EXISTS usage (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                track_id    TEXT NOT NULL,
                playlist_id TEXT NOT NULL,
                position    INTEGER NOT NULL,
                used_at     TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_usage_track ON usage(track_id, used_at);
            ",
        )?;
        Ok(())
    }

    /// Insert or replace a track row. Used by tests and by the (out of
    /// scope) upstream analysis job's write path.
    pub fn upsert_track(&self, track: &Track) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tracks (
                track_id, file_path, duration_seconds, bpm, key,
                cue_in_frames, cue_out_frames, loop_start_frames, loop_length_bars,
                energy, cue_in_energy, cue_out_energy, loudness_db,
                title, artist, album
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)
            ON CONFLICT(track_id) DO UPDATE SET
                file_path=excluded.file_path,
                duration_seconds=excluded.duration_seconds,
                bpm=excluded.bpm,
                key=excluded.key,
                cue_in_frames=excluded.cue_in_frames,
                cue_out_frames=excluded.cue_out_frames,
                loop_start_frames=excluded.loop_start_frames,
                loop_length_bars=excluded.loop_length_bars,
                energy=excluded.energy,
                cue_in_energy=excluded.cue_in_energy,
                cue_out_energy=excluded.cue_out_energy,
                loudness_db=excluded.loudness_db,
                title=excluded.title,
                artist=excluded.artist,
                album=excluded.album",
            params![
                track.track_id,
                track.file_path,
                track.duration_seconds,
                track.bpm,
                track.key,
                track.cue_in_frames.map(|v| v as i64),
                track.cue_out_frames.map(|v| v as i64),
                track.loop_start_frames.map(|v| v as i64),
                track.loop_length_bars.map(|v| v as i64),
                track.energy,
                track.cue_in_energy,
                track.cue_out_energy,
                track.loudness_db,
                track.title,
                track.artist,
                track.album,
            ],
        )?;
        Ok(())
    }
}

impl MetadataStore for SqliteStore {
    fn list_tracks(&self) -> Result<LibrarySnapshot> {
        let mut stmt = self.conn.prepare(
            "SELECT track_id, file_path, duration_seconds, bpm, key,
                    cue_in_frames, cue_out_frames, loop_start_frames, loop_length_bars,
                    energy, cue_in_energy, cue_out_energy, loudness_db,
                    title, artist, album
             FROM tracks ORDER BY rowid_order ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Track {
                track_id: row.get(0)?,
                file_path: row.get(1)?,
                duration_seconds: row.get(2)?,
                bpm: row.get(3)?,
                key: row.get(4)?,
                cue_in_frames: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
                cue_out_frames: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
                loop_start_frames: row.get::<_, Option<i64>>(7)?.map(|v| v as u64),
                loop_length_bars: row.get::<_, Option<i64>>(8)?.map(|v| v as u32),
                energy: row.get(9)?,
                cue_in_energy: row.get(10)?,
                cue_out_energy: row.get(11)?,
                loudness_db: row.get(12)?,
                title: row.get(13)?,
                artist: row.get(14)?,
                album: row.get(15)?,
            })
        })?;
        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(row?);
        }
        Ok(LibrarySnapshot::new(tracks))
    }

    fn recent_usage(&self, track_id: &str, since_hours: f64, now: DateTime<Utc>) -> Result<Vec<UsageRecord>> {
        let cutoff = now - chrono::Duration::seconds((since_hours * 3600.0) as i64);
        let mut stmt = self.conn.prepare(
            "SELECT track_id, playlist_id, position, used_at
             FROM usage WHERE track_id = ?1 AND used_at >= ?2
             ORDER BY used_at DESC",
        )?;
        let rows = stmt.query_map(params![track_id, cutoff.to_rfc3339()], |row| {
            let used_at: String = row.get(3)?;
            Ok(UsageRecord {
                track_id: row.get(0)?,
                playlist_id: row.get(1)?,
                position: row.get::<_, i64>(2)? as usize,
                used_at: DateTime::parse_from_rfc3339(&used_at)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).unwrap()),
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn append_usage(
        &self,
        track_id: &str,
        playlist_id: &str,
        position: usize,
        used_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO usage (track_id, playlist_id, position, used_at) VALUES (?1,?2,?3,?4)",
            params![track_id, playlist_id, position as i64, used_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_tracks_in_insertion_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_track(&Track::minimal("c", "/c.flac", 200.0)).unwrap();
        store.upsert_track(&Track::minimal("a", "/a.flac", 200.0)).unwrap();
        store.upsert_track(&Track::minimal("b", "/b.flac", 200.0)).unwrap();

        let snapshot = store.list_tracks().unwrap();
        let ids: Vec<&str> = snapshot.iter().map(|t| t.track_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn recent_usage_reflects_appended_records() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
        store.append_usage("a", "pl-1", 0, now).unwrap();

        let usage = store.recent_usage("a", 168.0, now).unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].playlist_id, "pl-1");

        let usage_other = store.recent_usage("b", 168.0, now).unwrap();
        assert!(usage_other.is_empty());
    }

    #[test]
    fn recent_usage_respects_the_decay_window() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
        let old = now - chrono::Duration::hours(200);
        store.append_usage("a", "pl-1", 0, old).unwrap();

        let usage = store.recent_usage("a", 168.0, now).unwrap();
        assert!(usage.is_empty());
    }

    #[test]
    fn recent_usage_is_governed_by_the_supplied_now_not_wall_clock_time() {
        // A single record, timestamped once, falls inside or outside the
        // decay window purely as a function of which `now` is passed in —
        // proof that the window is evaluated against the caller-supplied
        // `now`, not `Utc::now()` sampled inside the store.
        let store = SqliteStore::open_in_memory().unwrap();
        let recorded_at: DateTime<Utc> = "2030-06-01T00:00:00Z".parse().unwrap();
        store.append_usage("a", "pl-1", 0, recorded_at).unwrap();

        // 200 hours after recording: outside a 168-hour window.
        let now_far = recorded_at + chrono::Duration::hours(200);
        assert!(store.recent_usage("a", 168.0, now_far).unwrap().is_empty());

        // 1 hour after recording: still inside a 168-hour window.
        let now_near = recorded_at + chrono::Duration::hours(1);
        assert_eq!(store.recent_usage("a", 168.0, now_near).unwrap().len(), 1);
    }
}
