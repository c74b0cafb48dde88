//! Cursor, fetch, enrich, cache and load, in that order.
//!
//! The cache append happens before the load, so a failed load can be
//! replayed later with `load_cache` without calling the API again.

use std::path::Path;

use thiserror::Error;

use crate::cache::{self, CacheError};
use crate::cursor::{resolve_cursor, Cursor};
use crate::db::models::LoadResult;
use crate::db::{Database, DbError};
use crate::enrich::enrich_tracks;
use crate::fetch::fetch_tracks;
use crate::spotify::{ApiError, MusicApi};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Spotify request failed")]
    Api(#[from] ApiError),
    #[error("Cache file failed")]
    Cache(#[from] CacheError),
    #[error("Database load failed")]
    Db(#[from] DbError),
}

#[derive(Debug, Default, Clone)]
pub struct SyncOptions {
    /// Ignore the cursor and fetch the whole playlist.
    pub full: bool,
    /// Stop after appending to the cache.
    pub skip_load: bool,
}

#[derive(Debug)]
pub struct SyncResult {
    pub cursor: Cursor,
    pub fetched: usize,
    pub cached: usize,
    /// `None` when nothing new was fetched or loading was skipped.
    pub load: Option<LoadResult>,
}

/// Run one incremental sync of `playlist_id`.
pub fn sync<A: MusicApi + ?Sized>(
    api: &mut A,
    playlist_id: &str,
    db_path: &Path,
    cache_path: &Path,
    options: &SyncOptions,
) -> Result<SyncResult, SyncError> {
    let cursor = resolve_cursor(db_path);
    let last_track_index = if options.full {
        log::info!("Full sync requested, ignoring cursor");
        None
    } else {
        cursor.last_track_index()
    };
    println!("Cursor: {cursor}");

    let raw = fetch_tracks(api, playlist_id, last_track_index)?;
    println!("Fetched {} new tracks", raw.len());
    if raw.is_empty() {
        return Ok(SyncResult {
            cursor,
            fetched: 0,
            cached: 0,
            load: None,
        });
    }

    let enriched = enrich_tracks(api, &raw)?;
    let cached = cache::append_records(cache_path, &enriched)?;
    println!("Appended {} records to {}", cached, cache_path.display());

    let load = if options.skip_load {
        log::info!("Skipping database load");
        None
    } else {
        let db = Database::open(db_path)?;
        let result = db.load_tracks(&enriched)?;
        print_load_result(&result);
        Some(result)
    };

    Ok(SyncResult {
        cursor,
        fetched: raw.len(),
        cached,
        load,
    })
}

/// Replay every record of the cache at `cache_path` into the database.
pub fn load_cache(db_path: &Path, cache_path: &Path) -> Result<LoadResult, SyncError> {
    let records = cache::read_records(cache_path)?;
    log::info!("Read {} records from {}", records.len(), cache_path.display());
    let db = Database::open(db_path)?;
    let result = db.load_tracks(&records)?;
    print_load_result(&result);
    Ok(result)
}

fn print_load_result(result: &LoadResult) {
    println!(
        "Load complete: {} records, {} users, {} tracks, {} artists, {} genres inserted",
        result.records, result.users, result.tracks, result.artists, result.genres
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::fake::FakeApi;

    fn playlist(n: usize) -> FakeApi {
        FakeApi::new()
            .with_tracks(n)
            .with_user("u1", Some("Alice"))
            .with_artist("A", "idA", &["pop", "rock"])
    }

    #[test]
    fn test_first_sync_fetches_everything() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mixtape.db");
        let cache_path = dir.path().join("cache.csv");
        let mut api = playlist(3);

        let result = sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap();
        assert!(matches!(result.cursor, Cursor::Unavailable { .. }));
        assert_eq!(result.fetched, 3);
        assert_eq!(result.cached, 3);
        let load = result.load.unwrap();
        assert_eq!(load.tracks, 3);
        assert_eq!(load.users, 1);
        assert_eq!(load.artists, 1);
        assert_eq!(load.genres, 2);
        assert_eq!(cache::read_records(&cache_path).unwrap().len(), 3);
    }

    #[test]
    fn test_second_sync_is_incremental() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mixtape.db");
        let cache_path = dir.path().join("cache.csv");

        let mut api = playlist(2);
        sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap();

        let mut api = api.with_track("t2", &["A"], "u1");
        let result = sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap();
        assert_eq!(result.cursor, Cursor::Resume { loaded: 2 });
        assert_eq!(result.fetched, 1);
        assert_eq!(result.load.unwrap().tracks, 1);

        let records = cache::read_records(&cache_path).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.track_id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn test_nothing_new_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mixtape.db");
        let cache_path = dir.path().join("cache.csv");

        let mut api = playlist(2);
        sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap();
        let before = std::fs::read_to_string(&cache_path).unwrap();

        let user_calls = api.user_calls;
        let result = sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap();
        assert_eq!(result.fetched, 0);
        assert!(result.load.is_none());
        assert_eq!(api.user_calls, user_calls);
        assert_eq!(std::fs::read_to_string(&cache_path).unwrap(), before);
    }

    #[test]
    fn test_skip_load_then_replay_cache() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mixtape.db");
        let cache_path = dir.path().join("cache.csv");
        let mut api = playlist(2);

        let options = SyncOptions {
            skip_load: true,
            ..Default::default()
        };
        let result = sync(&mut api, "p", &db_path, &cache_path, &options).unwrap();
        assert_eq!(result.cached, 2);
        assert!(result.load.is_none());
        assert!(!db_path.exists());

        let load = load_cache(&db_path, &cache_path).unwrap();
        assert_eq!(load.records, 2);
        assert_eq!(load.tracks, 2);

        // Replaying the same cache inserts nothing new.
        let again = load_cache(&db_path, &cache_path).unwrap();
        assert_eq!(again.records, 2);
        assert_eq!(again.tracks, 0);
        assert_eq!(again.user_tracks, 0);
    }

    #[test]
    fn test_full_sync_ignores_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mixtape.db");
        let cache_path = dir.path().join("cache.csv");

        let mut api = playlist(2);
        sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap();

        let options = SyncOptions {
            full: true,
            ..Default::default()
        };
        let result = sync(&mut api, "p", &db_path, &cache_path, &options).unwrap();
        assert_eq!(result.fetched, 2);
        assert_eq!(result.load.unwrap().tracks, 0);
    }

    #[test]
    fn test_api_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mixtape.db");
        let cache_path = dir.path().join("cache.csv");
        let mut api = FakeApi::new().with_tracks(1);

        let err = sync(&mut api, "p", &db_path, &cache_path, &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Api(_)));
        assert!(!cache_path.exists());
        assert!(!db_path.exists());
    }

    #[test]
    fn test_load_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cache(&dir.path().join("mixtape.db"), &dir.path().join("none.csv")).unwrap_err();
        assert!(matches!(err, SyncError::Cache(_)));
    }
}
