pub mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::SpotifyClient;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("Token request failed: {0}")]
    Token(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// The three Web API lookups the pipeline needs.
pub trait MusicApi {
    /// One page of playlist items starting at `offset`.
    fn playlist_page(&mut self, playlist_id: &str, offset: u64, limit: u64) -> Result<PlaylistPage>;

    /// Public profile of a user.
    fn user_profile(&mut self, user_id: &str) -> Result<UserProfile>;

    /// Artists matching `name`, best match first.
    fn search_artists(&mut self, name: &str) -> Result<Vec<ArtistCandidate>>;
}

/// A page of `GET /playlists/{id}/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
    /// URL of the next page, absent on the last one.
    pub next: Option<String>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// Null for items added before collaborative playlists tracked it.
    pub added_by: Option<UserRef>,
    /// Null for tracks removed from the catalog.
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    /// Null for local files.
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtistCandidate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Extract a playlist id from a bare id, a `spotify:playlist:` URI, or an
/// `open.spotify.com` share link.
pub fn parse_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();

    let id = if let Some(rest) = input.strip_prefix("spotify:playlist:") {
        rest
    } else if input.contains("open.spotify.com/") {
        let (_, rest) = input.split_once("/playlist/")?;
        rest.split(['?', '#', '/']).next().unwrap_or_default()
    } else {
        input
    };

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(id.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_id() {
        let id = Some("5dhJsu6RdBTBH1XycaO1PA".to_string());
        assert_eq!(parse_playlist_id("5dhJsu6RdBTBH1XycaO1PA"), id);
        assert_eq!(parse_playlist_id("spotify:playlist:5dhJsu6RdBTBH1XycaO1PA"), id);
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/5dhJsu6RdBTBH1XycaO1PA?si=e03ba6ec72394ddf"),
            id
        );
        assert_eq!(parse_playlist_id("  https://open.spotify.com/playlist/5dhJsu6RdBTBH1XycaO1PA  "), id);
        assert_eq!(parse_playlist_id("https://open.spotify.com/album/1A2B"), None);
        assert_eq!(parse_playlist_id(""), None);
        assert_eq!(parse_playlist_id("not a playlist"), None);
    }

    #[test]
    fn test_playlist_page_deserialize() {
        let json = r#"{
            "items": [
                {
                    "added_by": {"id": "u1", "type": "user"},
                    "track": {
                        "id": "t1",
                        "name": "Idioteque",
                        "duration_ms": 309000,
                        "album": {"name": "Kid A"},
                        "artists": [{"name": "Radiohead"}]
                    }
                },
                {"added_by": null, "track": null},
                {"added_by": {"id": "u2"}, "track": {"id": null, "name": "local.mp3", "duration_ms": 1000, "album": null, "artists": []}}
            ],
            "next": null,
            "total": 3
        }"#;
        let page: PlaylistPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.next.is_none());
        let first = page.items[0].track.as_ref().unwrap();
        assert_eq!(first.album.as_ref().unwrap().name, "Kid A");
        assert!(page.items[1].track.is_none());
        assert!(page.items[2].track.as_ref().unwrap().id.is_none());
    }

    #[test]
    fn test_artist_candidate_without_genres() {
        let a: ArtistCandidate = serde_json::from_str(r#"{"id": "a1", "name": "A"}"#).unwrap();
        assert!(a.genres.is_empty());
    }
}
