mod users;

pub use users::UserCommands;

use clap::{Parser, Subcommand};

/// Authgate - basic and session authentication server
#[derive(Parser)]
#[command(name = "authgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the /api/v1 API guarded by AUTH_TYPE (default)
    Api,

    /// Serve the user authentication service
    Service,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),
}
