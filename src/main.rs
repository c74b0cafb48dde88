use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mixtape::cursor::{resolve_cursor, Cursor};
use mixtape::db::models::RankedEntry;
use mixtape::pipeline::SyncOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mixtape", version, about = "Collaborative playlist sync into SQLite")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Path to the CSV cache file
    #[arg(long, global = true)]
    cache_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum Ranking {
    Genres,
    Artists,
}

impl Ranking {
    fn label(&self) -> &'static str {
        match self {
            Self::Genres => "Genre",
            Self::Artists => "Artist",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new playlist tracks, enrich them, append to the cache and load
    Sync {
        /// Ignore the cursor and fetch the whole playlist
        #[arg(long)]
        full: bool,

        /// Stop after appending to the cache
        #[arg(long)]
        skip_load: bool,
    },

    /// Replay a cache file into the database
    Load {
        /// Cache file (defaults to the configured cache path)
        cache: Option<PathBuf>,
    },

    /// Show the cursor and per-table row counts
    Status,

    /// Rank genres or artists by number of tracks
    Top {
        /// What to rank
        #[arg(value_enum)]
        ranking: Ranking,

        /// Number of results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(mixtape::error::exit_code(&e))
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Config file, then .env and environment
    let config = mixtape::config::AppConfig::load();

    // Resolve paths: CLI > env > config > XDG default
    let db_path = cli
        .db_path
        .or(config.db_path.clone())
        .unwrap_or_else(mixtape::config::default_db_path);
    let cache_path = cli
        .cache_path
        .or(config.cache_path.clone())
        .unwrap_or_else(mixtape::config::default_cache_path);
    log::info!("Database: {}", db_path.display());
    log::info!("Cache: {}", cache_path.display());

    match cli.command {
        Commands::Sync { full, skip_load } => {
            let credentials = config.credentials()?;
            let playlist_id = config.playlist_id()?;
            log::info!("Playlist: {playlist_id}");

            let mut client = mixtape::spotify::SpotifyClient::connect(credentials)
                .context("Failed to authenticate with Spotify")?;
            let options = SyncOptions { full, skip_load };
            let result = mixtape::pipeline::sync(&mut client, &playlist_id, &db_path, &cache_path, &options)
                .context("Sync failed")?;

            if result.fetched == 0 {
                println!("Already up to date.");
            } else if result.load.is_none() {
                println!("(load skipped; run `mixtape load` to load the cache)");
            }
        }

        Commands::Load { cache } => {
            let cache_path = cache.unwrap_or(cache_path);
            mixtape::pipeline::load_cache(&db_path, &cache_path)
                .with_context(|| format!("Failed to load {}", cache_path.display()))?;
        }

        Commands::Status => {
            let cursor = resolve_cursor(&db_path);
            println!("Database: {}", db_path.display());
            println!("Cache:    {}", cache_path.display());
            println!("Cursor:   {cursor}");

            if let Cursor::Resume { .. } = cursor {
                let db = mixtape::db::Database::open(&db_path)
                    .context("Failed to open database")?;
                let counts = db.table_counts().context("Failed to count rows")?;
                println!();
                println!("Table            Rows");
                println!("{}", "-".repeat(22));
                println!("{:<16} {:>5}", "users", counts.users);
                println!("{:<16} {:>5}", "tracks", counts.tracks);
                println!("{:<16} {:>5}", "artists", counts.artists);
                println!("{:<16} {:>5}", "genres", counts.genres);
                println!("{:<16} {:>5}", "track_artists", counts.track_artists);
                println!("{:<16} {:>5}", "track_genres", counts.track_genres);
                println!("{:<16} {:>5}", "user_tracks", counts.user_tracks);
            }
        }

        Commands::Top { ranking, limit } => {
            let db = mixtape::db::Database::open(&db_path)
                .context("Failed to open database")?;
            let results = match ranking {
                Ranking::Genres => db.top_genres(limit),
                Ranking::Artists => db.top_artists(limit),
            }
            .context("Query failed")?;

            if results.is_empty() {
                println!("No results found. Run `mixtape sync` first.");
                return Ok(());
            }

            println!("Top {} {}:", results.len(), ranking.label().to_lowercase() + "s");
            println!();
            print_ranking(&results, &ranking);
        }
    }

    Ok(())
}

/// Print a ranking with a proportional bar per entry.
fn print_ranking(entries: &[RankedEntry], ranking: &Ranking) {
    println!("{:>3}  {:<30} {:>6}", "#", ranking.label(), "Tracks");
    println!("{}", "-".repeat(62));

    let max = entries.iter().map(|e| e.track_count).max().unwrap_or(1).max(1);
    for (i, e) in entries.iter().enumerate() {
        // Truncate long names
        let name: String = if e.name.chars().count() > 30 {
            format!("{}...", e.name.chars().take(27).collect::<String>())
        } else {
            e.name.clone()
        };
        let bar = "#".repeat((e.track_count * 20 / max) as usize);
        println!("{:>3}  {:<30} {:>6}  {}", i + 1, name, e.track_count, bar);
    }
}
