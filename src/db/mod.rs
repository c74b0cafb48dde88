pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.migrate()?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if version > SCHEMA_VERSION {
            return Err(DbError::Migration(format!(
                "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
            )));
        }
        if version < 1 {
            self.migrate_v1()?;
        }

        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// V1: users, tracks, artists, genres and their junction tables
    fn migrate_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                user_id     TEXT PRIMARY KEY,
                user_name   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tracks (
                track_id        TEXT PRIMARY KEY,
                track_name      TEXT NOT NULL,
                track_album     TEXT NOT NULL,
                track_duration  INTEGER NOT NULL,
                added_by        TEXT NOT NULL REFERENCES users(user_id)
            );
            CREATE INDEX IF NOT EXISTS idx_tracks_added_by ON tracks(added_by);

            CREATE TABLE IF NOT EXISTS artists (
                artist_id   TEXT PRIMARY KEY,
                artist_name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS genres (
                genre_id    INTEGER PRIMARY KEY AUTOINCREMENT,
                genre_name  TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS track_artists (
                track_id    TEXT NOT NULL REFERENCES tracks(track_id),
                artist_id   TEXT NOT NULL REFERENCES artists(artist_id),
                PRIMARY KEY (track_id, artist_id)
            );
            CREATE INDEX IF NOT EXISTS idx_track_artists_artist ON track_artists(artist_id);

            CREATE TABLE IF NOT EXISTS track_genres (
                track_id    TEXT NOT NULL REFERENCES tracks(track_id),
                genre_id    INTEGER NOT NULL REFERENCES genres(genre_id),
                PRIMARY KEY (track_id, genre_id)
            );
            CREATE INDEX IF NOT EXISTS idx_track_genres_genre ON track_genres(genre_id);

            CREATE TABLE IF NOT EXISTS user_tracks (
                user_id     TEXT NOT NULL REFERENCES users(user_id),
                track_id    TEXT NOT NULL REFERENCES tracks(track_id),
                PRIMARY KEY (user_id, track_id)
            );
            ",
        )?;
        Ok(())
    }
}

const SCHEMA_VERSION: i32 = 1;
