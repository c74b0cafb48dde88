use std::collections::{BTreeSet, HashMap};

use indicatif::{ProgressBar, ProgressStyle};

use crate::spotify::{MusicApi, Result, UserProfile};
use crate::track::{EnrichedTrack, RawTrack};

/// Outcome of one artist-name search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistMatch {
    /// Id of the first candidate, `None` when the search found nothing.
    pub id: Option<String>,
    pub genres: Vec<String>,
}

/// Memoized user and artist lookups for one run.
#[derive(Default)]
pub struct LookupCache {
    users: HashMap<String, UserProfile>,
    artists: HashMap<String, ArtistMatch>,
    hits: usize,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookups answered without calling the API.
    pub fn hits(&self) -> usize {
        self.hits
    }

    fn user<A: MusicApi + ?Sized>(&mut self, api: &mut A, user_id: &str) -> Result<UserProfile> {
        if let Some(profile) = self.users.get(user_id) {
            self.hits += 1;
            return Ok(profile.clone());
        }
        log::debug!("Looking up user {user_id}");
        let profile = api.user_profile(user_id)?;
        self.users.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    fn artist<A: MusicApi + ?Sized>(&mut self, api: &mut A, name: &str) -> Result<ArtistMatch> {
        if let Some(found) = self.artists.get(name) {
            self.hits += 1;
            return Ok(found.clone());
        }
        log::debug!("Searching artist {name}");
        let found = match api.search_artists(name)?.into_iter().next() {
            Some(candidate) => ArtistMatch {
                id: Some(candidate.id),
                genres: candidate.genres,
            },
            None => {
                log::debug!("No artist match for {name}");
                ArtistMatch {
                    id: None,
                    genres: Vec::new(),
                }
            }
        };
        self.artists.insert(name.to_string(), found.clone());
        Ok(found)
    }
}

/// Resolve the adding user and every credited artist for each track.
///
/// Output order matches input order. The first failed lookup aborts the
/// whole pass.
pub fn enrich_tracks<A: MusicApi + ?Sized>(api: &mut A, tracks: &[RawTrack]) -> Result<Vec<EnrichedTrack>> {
    let mut cache = LookupCache::new();
    let mut enriched = Vec::with_capacity(tracks.len());

    let pb = ProgressBar::new(tracks.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tracks ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    for raw in tracks {
        pb.set_message(raw.track_name.clone());
        match enrich_track(api, &mut cache, raw) {
            Ok(track) => enriched.push(track),
            Err(e) => {
                pb.abandon_with_message(format!("failed on {}", raw.track_id));
                return Err(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    log::info!(
        "Processed {} tracks ({} lookups served from cache)",
        enriched.len(),
        cache.hits()
    );
    Ok(enriched)
}

/// Enrich a single track, sharing `cache` with earlier tracks of the run.
pub fn enrich_track<A: MusicApi + ?Sized>(
    api: &mut A,
    cache: &mut LookupCache,
    raw: &RawTrack,
) -> Result<EnrichedTrack> {
    let user = cache.user(api, &raw.added_by_user_id)?;

    let mut artist_ids = Vec::with_capacity(raw.artist_names.len());
    let mut genres = BTreeSet::new();
    for name in &raw.artist_names {
        let found = cache.artist(api, name)?;
        artist_ids.push(found.id);
        genres.extend(found.genres);
    }

    let user_name = user.display_name.unwrap_or_else(|| user.id.clone());
    Ok(EnrichedTrack {
        track_id: raw.track_id.clone(),
        track_name: raw.track_name.clone(),
        album_name: raw.album_name.clone(),
        artist_ids,
        artist_names: raw.artist_names.clone(),
        duration_ms: raw.duration_ms,
        genres,
        user_id: user.id,
        user_name,
    })
}
