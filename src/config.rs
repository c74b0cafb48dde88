use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::spotify::parse_playlist_id;

pub const ENV_CLIENT_ID: &str = "SPOTIPY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIPY_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "SPOTIPY_REFRESH_TOKEN";
pub const ENV_PLAYLIST: &str = "PLAYLIST_URI";
pub const ENV_DB_PATH: &str = "MIXTAPE_DB_PATH";
pub const ENV_CACHE_PATH: &str = "MIXTAPE_CACHE_PATH";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {setting}: set {env} in the environment, .env, or config file")]
    Missing {
        setting: &'static str,
        env: &'static str,
    },
    #[error("Not a Spotify playlist id, URI, or link: {0}")]
    InvalidPlaylist(String),
}

/// Application configuration loaded from TOML config file, then
/// overridden by environment variables. Every field is optional here;
/// commands that need a value ask for it through the accessors below.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Custom database path (overrides XDG default).
    pub db_path: Option<PathBuf>,
    /// Custom cache file path (overrides XDG default).
    pub cache_path: Option<PathBuf>,
    /// Playlist to sync: bare id, `spotify:playlist:` URI, or share link.
    pub playlist: Option<String>,
    /// Spotify Web API credentials.
    pub spotify: SpotifyConfig,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// User refresh token; enables private playlists.
    pub refresh_token: Option<String>,
}

/// Credentials needed to build an API client.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
}

impl AppConfig {
    /// Load config from `~/.config/mixtape/config.toml`, then apply `.env`
    /// and process environment overrides.
    /// Returns default config if the file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::from_toml(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("Failed to load .env: {e}"),
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Override fields with values from `lookup` (normally the process
    /// environment). Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_CLIENT_ID) {
            self.spotify.client_id = Some(v);
        }
        if let Some(v) = get(ENV_CLIENT_SECRET) {
            self.spotify.client_secret = Some(v);
        }
        if let Some(v) = get(ENV_REFRESH_TOKEN) {
            self.spotify.refresh_token = Some(v);
        }
        if let Some(v) = get(ENV_PLAYLIST) {
            self.playlist = Some(v);
        }
        if let Some(v) = get(ENV_DB_PATH) {
            self.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_CACHE_PATH) {
            self.cache_path = Some(PathBuf::from(v));
        }
    }

    /// API credentials, or which one is missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let client_id = non_blank(&self.spotify.client_id).ok_or(ConfigError::Missing {
            setting: "Spotify client id",
            env: ENV_CLIENT_ID,
        })?;
        let client_secret = non_blank(&self.spotify.client_secret).ok_or(ConfigError::Missing {
            setting: "Spotify client secret",
            env: ENV_CLIENT_SECRET,
        })?;

        Ok(Credentials {
            client_id,
            client_secret,
            refresh_token: non_blank(&self.spotify.refresh_token),
        })
    }

    /// The configured playlist, normalized to a bare id.
    pub fn playlist_id(&self) -> Result<String, ConfigError> {
        let raw = non_blank(&self.playlist).ok_or(ConfigError::Missing {
            setting: "playlist",
            env: ENV_PLAYLIST,
        })?;
        parse_playlist_id(&raw).ok_or(ConfigError::InvalidPlaylist(raw))
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the default database path using XDG data directory.
pub fn default_db_path() -> PathBuf {
    data_file("mixtape.db")
}

/// Resolve the default cache path using XDG data directory.
pub fn default_cache_path() -> PathBuf {
    data_file("playlist_cache.csv")
}

fn data_file(name: &str) -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).ok();
        data_dir.join(name)
    } else {
        // Fallback: current directory
        PathBuf::from(name)
    }
}
