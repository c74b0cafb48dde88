use std::fmt;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::db::Database;

/// Where the next fetch should resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// `loaded` tracks are already in the database, covering playlist
    /// positions `0..loaded`.
    Resume { loaded: u64 },
    /// The database could not be read; fetch from the start.
    Unavailable { reason: String },
}

impl Cursor {
    /// Last playlist position already loaded, for the fetcher's
    /// strictly-greater filter. `None` means fetch everything.
    pub fn last_track_index(&self) -> Option<u64> {
        match self {
            Cursor::Resume { loaded } if *loaded > 0 => Some(loaded - 1),
            _ => None,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Resume { loaded: 0 } => write!(f, "empty database, fetching from the start"),
            Cursor::Resume { loaded } => write!(f, "{loaded} tracks loaded, resuming at position {loaded}"),
            Cursor::Unavailable { reason } => write!(f, "unavailable ({reason}), fetching from the start"),
        }
    }
}

/// Count the tracks already loaded into the database at `db_path`.
///
/// Never creates the database. Any failure is logged and reported as
/// `Cursor::Unavailable` rather than returned as an error.
pub fn resolve_cursor(db_path: &Path) -> Cursor {
    match count_loaded(db_path) {
        Ok(loaded) => {
            log::info!("Cursor: {loaded} tracks already loaded");
            Cursor::Resume { loaded }
        }
        Err(e) => {
            log::warn!("Could not read track count from {}: {e}", db_path.display());
            Cursor::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

fn count_loaded(db_path: &Path) -> crate::db::Result<u64> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let db = Database { conn };
    let count = db.count_tracks()?;
    Ok(count.max(0) as u64)
}
