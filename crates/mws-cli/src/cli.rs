use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "mws")]
#[command(about = "Browse and review restaurants, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local mirror database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Restaurant reviews API origin (default: MWS_API_BASE_URL or http://localhost:1337)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Do not contact the network; read from the mirror and queue writes
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List restaurants
    #[command(alias = "ls")]
    Restaurants {
        /// Only restaurants serving this cuisine
        #[arg(long)]
        cuisine: Option<String>,
        /// Only restaurants in this neighborhood
        #[arg(long)]
        neighborhood: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a restaurant with its reviews
    Show {
        /// Restaurant ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List reviews of a restaurant
    Reviews {
        /// Restaurant ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark or unmark a restaurant as favorite
    Favorite {
        /// Restaurant ID
        id: i64,
        /// Remove the favorite mark instead of setting it
        #[arg(long)]
        unset: bool,
    },
    /// Submit a review
    Review {
        /// Restaurant ID
        restaurant_id: i64,
        /// Reviewer name
        #[arg(long)]
        name: String,
        /// Rating from 1 to 5
        #[arg(long)]
        rating: u8,
        /// Review text (joined with spaces)
        comments: Vec<String>,
    },
    /// List distinct neighborhoods
    Neighborhoods,
    /// List distinct cuisines
    Cuisines,
    /// Replay queued writes now
    Flush,
    /// Show writes waiting to be replayed
    Queue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
