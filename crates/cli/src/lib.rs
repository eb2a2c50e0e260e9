//! Interactive user database: a terminal prompt and a TCP front end over one
//! append-and-snapshot storage file.

pub mod client;
pub mod config;
pub mod db;
pub mod display;
pub mod server;
pub mod session;

use anyhow::Result;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Cli, Command};
use db::{lock, Database};
use session::Session;

/// Logs go to stderr so they never mix with the prompt.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Connect { addr }) => client::pipe(addr.as_str(), io::stdin(), io::stdout()),
        None => run_local(&cli),
    }
}

/// Serves the local prompt (and the TCP server unless disabled), then saves
/// the final snapshot.
fn run_local(cli: &Cli) -> Result<()> {
    let db = Arc::new(Mutex::new(Database::open(&cli.file)?));

    if !cli.no_server {
        server::spawn(cli.listen.as_str(), Arc::clone(&db))?;
    }

    let session = Session::new(io::stdin().lock(), io::stdout().lock(), Arc::clone(&db)).run();
    let closed = lock(&db)?.close();
    info!("bye");

    session?;
    closed
}
