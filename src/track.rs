use std::collections::BTreeSet;

/// Artist id persisted when a credited artist name has no search match.
pub const NO_ARTIST: &str = "No Artist";

/// A playlist entry as listed by the API, before any lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrack {
    pub track_id: String,
    pub track_name: String,
    pub album_name: String,
    pub artist_names: Vec<String>,
    pub duration_ms: u64,
    pub added_by_user_id: String,
}

/// A track with its adding user and credited artists resolved.
///
/// `artist_ids` runs parallel to `artist_names`; `None` means the name had no
/// match, which is distinct from the track having no artists at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedTrack {
    pub track_id: String,
    pub track_name: String,
    pub album_name: String,
    pub artist_ids: Vec<Option<String>>,
    pub artist_names: Vec<String>,
    pub duration_ms: u64,
    pub genres: BTreeSet<String>,
    pub user_id: String,
    pub user_name: String,
}

impl EnrichedTrack {
    /// `(artist_id, artist_name)` pairs with the sentinel substituted for
    /// unmatched artists.
    pub fn artist_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.artist_ids
            .iter()
            .zip(&self.artist_names)
            .map(|(id, name)| (id.as_deref().unwrap_or(NO_ARTIST), name.as_str()))
    }
}
