/// Rows actually inserted by one load, per table.
/// Rows that already existed are not counted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub records: usize,
    pub users: usize,
    pub tracks: usize,
    pub artists: usize,
    pub genres: usize,
    pub track_artists: usize,
    pub track_genres: usize,
    pub user_tracks: usize,
}

/// Row counts for every table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableCounts {
    pub users: i64,
    pub tracks: i64,
    pub artists: i64,
    pub genres: i64,
    pub track_artists: i64,
    pub track_genres: i64,
    pub user_tracks: i64,
}

/// A genre or artist with the number of playlist tracks it appears on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub name: String,
    pub track_count: i64,
}
