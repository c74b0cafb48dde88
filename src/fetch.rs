use crate::spotify::{MusicApi, PlaylistItem, Result};
use crate::track::RawTrack;

/// Playlist items requested per page.
pub const PAGE_SIZE: u64 = 100;

/// Fetch the playlist's tracks in playlist order.
///
/// With `last_track_index = Some(n)`, items at positions `<= n` are treated
/// as already loaded and skipped; positions count continuously across pages.
/// API errors abort the fetch.
pub fn fetch_tracks<A: MusicApi + ?Sized>(
    api: &mut A,
    playlist_id: &str,
    last_track_index: Option<u64>,
) -> Result<Vec<RawTrack>> {
    let mut tracks = Vec::new();
    let mut offset = 0;

    loop {
        log::info!("Gathering tracks with offset {offset}...");
        let page = api.playlist_page(playlist_id, offset, PAGE_SIZE)?;
        if page.items.is_empty() {
            break;
        }

        for (i, item) in page.items.into_iter().enumerate() {
            let index = offset + i as u64;
            if last_track_index.is_some_and(|last| index <= last) {
                continue;
            }
            match raw_track(item) {
                Some(track) => tracks.push(track),
                None => log::warn!("Skipping playlist item {index}: no track id or no adding user"),
            }
        }
        log::info!("Gathered {} tracks", tracks.len());

        if page.next.is_none() {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(tracks)
}

fn raw_track(item: PlaylistItem) -> Option<RawTrack> {
    let added_by = item.added_by?;
    let track = item.track?;
    let track_id = track.id.filter(|id| !id.is_empty())?;

    Some(RawTrack {
        track_id,
        track_name: track.name,
        album_name: track.album.map(|a| a.name).unwrap_or_default(),
        artist_names: track.artists.into_iter().map(|a| a.name).collect(),
        duration_ms: track.duration_ms,
        added_by_user_id: added_by.id,
    })
}
