use std::time::{Duration, Instant};

use base64::{engine::general_purpose, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ApiError, ArtistCandidate, MusicApi, PlaylistPage, Result, UserProfile};
use crate::config::Credentials;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Refresh the access token this long before Spotify says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Paging<ArtistCandidate>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Blocking Spotify Web API client.
///
/// Authenticates with the client-credentials grant, or with the
/// refresh-token grant when a refresh token is configured (needed for
/// private playlists).
pub struct SpotifyClient {
    agent: ureq::Agent,
    credentials: Credentials,
    token: Option<AccessToken>,
}

impl SpotifyClient {
    /// Build a client and fetch the first access token.
    pub fn connect(credentials: Credentials) -> Result<Self> {
        let mut client = Self {
            agent: ureq::Agent::new_with_defaults(),
            credentials,
            token: None,
        };
        client.refresh_token()?;
        log::info!("Spotify client initialized");
        Ok(client)
    }

    fn refresh_token(&mut self) -> Result<()> {
        let basic = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let form: Vec<(&str, &str)> = match &self.credentials.refresh_token {
            Some(token) => vec![("grant_type", "refresh_token"), ("refresh_token", token.as_str())],
            None => vec![("grant_type", "client_credentials")],
        };

        let response: TokenResponse = self
            .agent
            .post(TOKEN_URL)
            .header("Authorization", format!("Basic {basic}").as_str())
            .send_form(form)
            .map_err(|e| ApiError::Token(e.to_string()))?
            .body_mut()
            .read_json()
            .map_err(|e| ApiError::Token(format!("unreadable token response: {e}")))?;

        log::debug!("Obtained access token valid for {}s", response.expires_in);
        self.token = Some(AccessToken {
            value: response.access_token,
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        });
        Ok(())
    }

    fn bearer(&mut self) -> Result<String> {
        let stale = match &self.token {
            Some(token) => Instant::now() + TOKEN_EXPIRY_MARGIN >= token.expires_at,
            None => true,
        };
        if stale {
            self.refresh_token()?;
        }
        match &self.token {
            Some(token) => Ok(format!("Bearer {}", token.value)),
            None => Err(ApiError::Token("no access token".to_string())),
        }
    }

    fn get_json<T: DeserializeOwned>(&mut self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let auth = self.bearer()?;
        log::debug!("GET {url} {query:?}");

        let mut request = self.agent.get(url).header("Authorization", auth.as_str());
        for (key, value) in query {
            request = request.query(key, value);
        }

        let body = request
            .call()
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?
            .body_mut()
            .read_json()
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(body)
    }
}

impl MusicApi for SpotifyClient {
    fn playlist_page(&mut self, playlist_id: &str, offset: u64, limit: u64) -> Result<PlaylistPage> {
        let url = format!("{API_BASE}/playlists/{}/tracks", encode_path_segment(playlist_id));
        self.get_json(
            &url,
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("additional_types", "track".to_string()),
            ],
        )
    }

    fn user_profile(&mut self, user_id: &str) -> Result<UserProfile> {
        let url = format!("{API_BASE}/users/{}", encode_path_segment(user_id));
        self.get_json(&url, &[])
    }

    fn search_artists(&mut self, name: &str) -> Result<Vec<ArtistCandidate>> {
        let url = format!("{API_BASE}/search");
        let response: SearchResponse = self.get_json(
            &url,
            &[("q", format!("artist:{name}")), ("type", "artist".to_string())],
        )?;
        Ok(response.artists.items)
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
