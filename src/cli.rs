use clap::{Parser, Subcommand};

/// DBLink — Database Access Gateway for AI Agents
#[derive(Parser)]
#[command(name = "dblink", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind (overrides DBLINK_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect and manage platform databases
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// List databases in the organization
    List,

    /// Create a new database
    Create {
        #[arg(long)]
        name: String,
    },

    /// Mint a scoped token for a database
    Token {
        #[arg(long)]
        database: String,
        /// Permission level: full-access or read-only
        #[arg(long, default_value = "read-only")]
        permission: String,
    },
}
