use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::db::DbError;
use crate::spotify::ApiError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_API: u8 = 3;
pub const EXIT_DB: u8 = 4;
pub const EXIT_CACHE: u8 = 5;

/// Process exit code for an error, from the first typed cause in its chain.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return EXIT_CONFIG;
        }
        if cause.is::<ApiError>() {
            return EXIT_API;
        }
        if cause.is::<DbError>() {
            return EXIT_DB;
        }
        if cause.is::<CacheError>() {
            return EXIT_CACHE;
        }
    }
    EXIT_FAILURE
}
