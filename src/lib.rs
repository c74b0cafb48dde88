pub mod cache;
pub mod config;
pub mod cursor;
pub mod db;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod spotify;
pub mod track;

/// Application name for XDG paths
pub const APP_NAME: &str = "mixtape";
