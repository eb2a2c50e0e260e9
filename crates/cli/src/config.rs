//! Command-line options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_FILE: &str = "datafiles/test.database";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Parser)]
#[command(
    name = "userdb",
    version,
    about = "Tiny user database with a terminal prompt and a TCP front end"
)]
pub struct Cli {
    #[arg(long, default_value = DEFAULT_FILE, help = "Path of the database file")]
    pub file: PathBuf,

    #[arg(
        long,
        default_value = DEFAULT_ADDR,
        help = "Address the TCP server listens on"
    )]
    pub listen: String,

    #[arg(long, help = "Serve the local prompt only")]
    pub no_server: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Attach the terminal to a running server.
    Connect {
        #[arg(default_value = DEFAULT_ADDR, help = "Server address")]
        addr: String,
    },
}
