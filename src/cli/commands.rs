use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "socra", version, about = "Socratic Tutoring Session Server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Manage tutoring sessions directly against the store
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List an owner's sessions
    List {
        #[arg(short, long)]
        owner: String,
    },

    /// Print a session's transcript and study plan
    Show {
        #[arg(short, long)]
        owner: String,
        id: Uuid,
    },

    /// Delete a session
    Delete {
        #[arg(short, long)]
        owner: String,
        id: Uuid,
    },

    /// Export a session transcript to a .txt file
    Export {
        #[arg(short, long)]
        owner: String,
        id: Uuid,
        /// The path to the output file (optional)
        #[arg(short, long)]
        path: Option<String>,
    },
}
