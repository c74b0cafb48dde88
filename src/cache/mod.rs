pub mod literal;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::track::EnrichedTrack;
use literal::LiteralError;

/// Column order of the cache file.
pub const HEADER: [&str; 9] = [
    "track_id",
    "track_name",
    "track_album",
    "artist_id",
    "artist_name",
    "track_duration",
    "genres",
    "user_id",
    "user_name",
];

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unexpected cache header: {found}")]
    Header { found: String },
    #[error("Row {row}, column {column}: {source}")]
    Literal {
        row: usize,
        column: &'static str,
        #[source]
        source: LiteralError,
    },
    #[error("Row {row}: {ids} artist ids but {names} artist names")]
    ArtistMismatch { row: usize, ids: usize, names: usize },
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// One cache row. Field order must match `HEADER`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    track_id: String,
    track_name: String,
    track_album: String,
    artist_id: String,
    artist_name: String,
    track_duration: u64,
    genres: String,
    user_id: String,
    user_name: String,
}

impl From<&EnrichedTrack> for CacheRecord {
    fn from(t: &EnrichedTrack) -> Self {
        Self {
            track_id: t.track_id.clone(),
            track_name: t.track_name.clone(),
            track_album: t.album_name.clone(),
            artist_id: literal::encode_optional_list(&t.artist_ids),
            artist_name: literal::encode_list(t.artist_names.iter().map(String::as_str)),
            track_duration: t.duration_ms,
            genres: literal::encode_list(t.genres.iter().map(String::as_str)),
            user_id: t.user_id.clone(),
            user_name: t.user_name.clone(),
        }
    }
}

impl CacheRecord {
    /// Decode the collection columns. `row` is the 1-based line number, for errors.
    fn into_track(self, row: usize) -> Result<EnrichedTrack> {
        let literal_err = |column| move |source| CacheError::Literal { row, column, source };

        let artist_ids =
            literal::parse_optional_list(&self.artist_id).map_err(literal_err("artist_id"))?;
        let artist_names = literal::parse_list(&self.artist_name).map_err(literal_err("artist_name"))?;
        let genres = literal::parse_set(&self.genres).map_err(literal_err("genres"))?;

        if artist_ids.len() != artist_names.len() {
            return Err(CacheError::ArtistMismatch {
                row,
                ids: artist_ids.len(),
                names: artist_names.len(),
            });
        }

        Ok(EnrichedTrack {
            track_id: self.track_id,
            track_name: self.track_name,
            album_name: self.track_album,
            artist_ids,
            artist_names,
            duration_ms: self.track_duration,
            genres,
            user_id: self.user_id,
            user_name: self.user_name,
        })
    }
}

/// Append records to the cache at `path`.
///
/// A missing or empty file gets the header first; an existing file only
/// gets new rows. Returns the number of rows written.
pub fn append_records(path: &Path, records: &[EnrichedTrack]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let is_new = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => return Err(e.into()),
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    if is_new {
        log::debug!("Creating cache file {}", path.display());
        wtr.write_record(HEADER)?;
    }
    for t in records {
        wtr.serialize(CacheRecord::from(t))?;
    }
    wtr.flush()?;

    log::info!("Appended {} rows to {}", records.len(), path.display());
    Ok(records.len())
}

/// Read every record from the cache at `path`, in file order.
pub fn read_records(path: &Path) -> Result<Vec<EnrichedTrack>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = rdr.headers()?;
    if !headers.iter().eq(HEADER) {
        return Err(CacheError::Header {
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut tracks = Vec::new();
    for (i, row) in rdr.deserialize::<CacheRecord>().enumerate() {
        // Line 1 is the header
        tracks.push(row?.into_track(i + 2)?);
    }

    log::debug!("Read {} rows from {}", tracks.len(), path.display());
    Ok(tracks)
}
