use super::models::{LoadResult, RankedEntry, TableCounts};
use super::{Database, Result};
use crate::track::{EnrichedTrack, NO_ARTIST};
use rusqlite::{params, Connection};

impl Database {
    /// Load enriched tracks into every table in a single transaction.
    ///
    /// Each row is inserted only if its key is absent, so loading the same
    /// records again changes nothing. Any failure rolls back the whole batch.
    pub fn load_tracks(&self, records: &[EnrichedTrack]) -> Result<LoadResult> {
        let tx = self.conn.unchecked_transaction()?;
        let mut result = LoadResult::default();

        for t in records {
            Self::load_one(&tx, t, &mut result)?;
            result.records += 1;
        }

        tx.commit()?;
        log::info!(
            "Loaded {} records ({} new tracks, {} new users, {} new artists, {} new genres)",
            result.records, result.tracks, result.users, result.artists, result.genres
        );
        Ok(result)
    }

    /// Insert one record's rows (used within a transaction).
    fn load_one(conn: &Connection, t: &EnrichedTrack, result: &mut LoadResult) -> Result<()> {
        result.users += insert_user(conn, &t.user_id, &t.user_name)?;
        result.tracks += insert_track(conn, t)?;

        for (artist_id, artist_name) in t.artist_pairs() {
            result.artists += insert_artist(conn, artist_id, artist_name)?;
            result.track_artists += conn
                .prepare_cached(
                    "INSERT INTO track_artists (track_id, artist_id) VALUES (?1, ?2)
                     ON CONFLICT(track_id, artist_id) DO NOTHING",
                )?
                .execute(params![t.track_id, artist_id])?;
        }

        for genre in &t.genres {
            let (genre_id, inserted) = ensure_genre(conn, genre)?;
            result.genres += inserted;
            result.track_genres += conn
                .prepare_cached(
                    "INSERT INTO track_genres (track_id, genre_id) VALUES (?1, ?2)
                     ON CONFLICT(track_id, genre_id) DO NOTHING",
                )?
                .execute(params![t.track_id, genre_id])?;
        }

        result.user_tracks += conn
            .prepare_cached(
                "INSERT INTO user_tracks (user_id, track_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id, track_id) DO NOTHING",
            )?
            .execute(params![t.user_id, t.track_id])?;

        Ok(())
    }

    /// Number of rows in the tracks table.
    pub fn count_tracks(&self) -> Result<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Row counts for every table.
    pub fn table_counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<i64> {
            let n = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n)
        };

        Ok(TableCounts {
            users: count("users")?,
            tracks: count("tracks")?,
            artists: count("artists")?,
            genres: count("genres")?,
            track_artists: count("track_artists")?,
            track_genres: count("track_genres")?,
            user_tracks: count("user_tracks")?,
        })
    }

    /// Genres ranked by the number of tracks tagged with them.
    pub fn top_genres(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.genre_name, COUNT(DISTINCT tg.track_id) AS n
             FROM genres g
             JOIN track_genres tg ON tg.genre_id = g.genre_id
             GROUP BY g.genre_id
             ORDER BY n DESC, g.genre_name ASC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RankedEntry {
                    name: row.get(0)?,
                    track_count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Artists ranked by the number of tracks crediting them.
    /// Unmatched artists are excluded.
    pub fn top_artists(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.artist_name, COUNT(DISTINCT ta.track_id) AS n
             FROM artists a
             JOIN track_artists ta ON ta.artist_id = a.artist_id
             WHERE a.artist_id != ?1
             GROUP BY a.artist_id
             ORDER BY n DESC, a.artist_name ASC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![NO_ARTIST, limit as i64], |row| {
                Ok(RankedEntry {
                    name: row.get(0)?,
                    track_count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn insert_user(conn: &Connection, user_id: &str, user_name: &str) -> Result<usize> {
    let n = conn
        .prepare_cached(
            "INSERT INTO users (user_id, user_name) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO NOTHING",
        )?
        .execute(params![user_id, user_name])?;
    Ok(n)
}

fn insert_track(conn: &Connection, t: &EnrichedTrack) -> Result<usize> {
    let n = conn
        .prepare_cached(
            "INSERT INTO tracks (track_id, track_name, track_album, track_duration, added_by)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(track_id) DO NOTHING",
        )?
        .execute(params![
            t.track_id,
            t.track_name,
            t.album_name,
            t.duration_ms as i64,
            t.user_id,
        ])?;
    Ok(n)
}

fn insert_artist(conn: &Connection, artist_id: &str, artist_name: &str) -> Result<usize> {
    let n = conn
        .prepare_cached(
            "INSERT INTO artists (artist_id, artist_name) VALUES (?1, ?2)
             ON CONFLICT(artist_id) DO NOTHING",
        )?
        .execute(params![artist_id, artist_name])?;
    Ok(n)
}

/// Get the id for a genre name, inserting it on first sight.
/// Returns the id and 1 if the genre was new, 0 otherwise.
fn ensure_genre(conn: &Connection, genre_name: &str) -> Result<(i64, usize)> {
    let inserted = conn
        .prepare_cached(
            "INSERT INTO genres (genre_name) VALUES (?1)
             ON CONFLICT(genre_name) DO NOTHING",
        )?
        .execute(params![genre_name])?;

    if inserted > 0 {
        return Ok((conn.last_insert_rowid(), inserted));
    }

    let id = conn
        .prepare_cached("SELECT genre_id FROM genres WHERE genre_name = ?1")?
        .query_row(params![genre_name], |row| row.get(0))?;
    Ok((id, 0))
}
