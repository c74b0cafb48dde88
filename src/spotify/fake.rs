//! Scripted `MusicApi` for tests. Counts every call it receives.

use std::collections::HashMap;

use super::{
    AlbumRef, ApiError, ArtistCandidate, ArtistRef, MusicApi, PlaylistItem, PlaylistPage, Result,
    TrackObject, UserProfile, UserRef,
};

#[derive(Default)]
pub struct FakeApi {
    pub items: Vec<PlaylistItem>,
    pub users: HashMap<String, UserProfile>,
    pub artists: HashMap<String, Vec<ArtistCandidate>>,
    pub page_calls: usize,
    pub user_calls: usize,
    pub search_calls: usize,
    /// Searches for this artist name fail with HTTP 500.
    pub failing_artist: Option<String>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a playlist item added by `user_id`.
    pub fn with_track(mut self, track_id: &str, artists: &[&str], user_id: &str) -> Self {
        self.items.push(PlaylistItem {
            added_by: Some(UserRef {
                id: user_id.to_string(),
            }),
            track: Some(TrackObject {
                id: Some(track_id.to_string()),
                name: format!("Song {track_id}"),
                duration_ms: 200_000,
                album: Some(AlbumRef {
                    name: format!("Album {track_id}"),
                }),
                artists: artists
                    .iter()
                    .map(|name| ArtistRef {
                        name: name.to_string(),
                    })
                    .collect(),
            }),
        });
        self
    }

    /// Append `n` tracks `t0..tn` by artist "A", added by "u1".
    pub fn with_tracks(mut self, n: usize) -> Self {
        for i in 0..n {
            self = self.with_track(&format!("t{i}"), &["A"], "u1");
        }
        self
    }

    pub fn with_user(mut self, user_id: &str, display_name: Option<&str>) -> Self {
        self.users.insert(
            user_id.to_string(),
            UserProfile {
                id: user_id.to_string(),
                display_name: display_name.map(str::to_string),
            },
        );
        self
    }

    pub fn with_artist(mut self, name: &str, artist_id: &str, genres: &[&str]) -> Self {
        self.artists.insert(
            name.to_string(),
            vec![ArtistCandidate {
                id: artist_id.to_string(),
                name: name.to_string(),
                genres: genres.iter().map(|g| g.to_string()).collect(),
            }],
        );
        self
    }
}

fn status_error(url: &str, code: u16) -> ApiError {
    ApiError::Request {
        url: url.to_string(),
        source: ureq::Error::StatusCode(code),
    }
}

impl MusicApi for FakeApi {
    fn playlist_page(&mut self, _playlist_id: &str, offset: u64, limit: u64) -> Result<PlaylistPage> {
        self.page_calls += 1;
        let total = self.items.len() as u64;
        let start = offset.min(total) as usize;
        let end = (offset + limit).min(total) as usize;
        let next = (offset + limit < total).then(|| format!("fake://page?offset={}", offset + limit));
        Ok(PlaylistPage {
            items: self.items[start..end].to_vec(),
            next,
            total,
        })
    }

    fn user_profile(&mut self, user_id: &str) -> Result<UserProfile> {
        self.user_calls += 1;
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| status_error(&format!("fake://users/{user_id}"), 404))
    }

    fn search_artists(&mut self, name: &str) -> Result<Vec<ArtistCandidate>> {
        self.search_calls += 1;
        if self.failing_artist.as_deref() == Some(name) {
            return Err(status_error("fake://search", 500));
        }
        Ok(self.artists.get(name).cloned().unwrap_or_default())
    }
}
