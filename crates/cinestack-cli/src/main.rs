use clap::{ArgAction, Parser, Subcommand};
use cinestack_models::{MediaType, WatchStatus};
use commands::{auth, catalog, clear, config, playlist};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinestack")]
#[command(about = "CineStack - Curate playlists of movies and series and track what you've watched")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to a daily rotated file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the API token
    Login {
        /// Account username (prompted if omitted)
        #[arg(long)]
        username: Option<String>,
    },
    /// Create an account, then sign in
    Register {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored API token
    Logout,
    /// Search the catalog
    Search {
        query: String,

        /// movie or series
        #[arg(long = "type", default_value = "movie")]
        media_type: MediaType,

        /// Pages to load (capped by feeds.page_limit)
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Popular titles
    Popular {
        #[arg(long = "type", default_value = "movie")]
        media_type: MediaType,

        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Materialize a catalog title as a local movie record
    Resolve {
        /// Catalog (TMDB) id
        external_id: u64,

        #[arg(long = "type", default_value = "movie")]
        media_type: MediaType,
    },
    /// Manage playlists and their items
    Playlist {
        #[command(subcommand)]
        cmd: PlaylistCommands,
    },
    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear cached data
    #[command(long_about = "Clear cached data or stored credentials. Use --cache to clear resolved movie records, --credentials to clear the stored token, or --all to clear everything.")]
    Clear {
        /// Clear cache and credentials
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear resolved movie records
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[derive(Subcommand)]
pub enum PlaylistCommands {
    /// List playlists with their progress
    List,
    /// Show a playlist and its items
    Show { id: u64 },
    /// Create a playlist
    Create {
        title: String,

        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a playlist
    Delete {
        id: u64,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Resolve a catalog title and add it to a playlist
    Add {
        playlist: u64,

        /// Catalog (TMDB) id
        external_id: u64,

        #[arg(long = "type", default_value = "movie")]
        media_type: MediaType,

        /// to_watch, watching or watched
        #[arg(long, default_value = "to_watch")]
        status: WatchStatus,
    },
    /// Set the watch status of an item
    Status {
        playlist: u64,

        /// Local movie id
        movie: u64,

        /// to_watch, watching or watched
        status: String,
    },
    /// Remove an item from a playlist
    Remove {
        playlist: u64,

        /// Local movie id
        movie: u64,
    },
    /// List the episodes of a series in a playlist
    Episodes {
        playlist: u64,

        /// Local movie id of the series
        movie: u64,

        /// Season number (defaults to the first regular season)
        #[arg(long)]
        season: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Login { username } => auth::run_login(username, &output).await,
        Commands::Register { username, email } => auth::run_register(username, email, &output).await,
        Commands::Logout => auth::run_logout(&output).await,
        Commands::Search { query, media_type, pages } => {
            catalog::run_search(query, media_type, pages, &output).await
        }
        Commands::Popular { media_type, pages } => catalog::run_popular(media_type, pages, &output).await,
        Commands::Resolve { external_id, media_type } => {
            catalog::run_resolve(external_id, media_type, &output).await
        }
        Commands::Playlist { cmd } => playlist::run_playlist(cmd, &output).await,
        Commands::Config { cmd } => config::run_config(cmd.unwrap_or(ConfigCommands::Show), &output).await,
        Commands::Clear { all, cache, credentials } => clear::run_clear(all, cache, credentials, &output).await,
    }
}
