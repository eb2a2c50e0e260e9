//! TCP front end: every connection gets its own prompt session.

use anyhow::Result;
use std::io::{self, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

use crate::db::Database;
use crate::session::Session;

/// Binds `addr` and serves connections on a background thread.
///
/// Connections are handled one at a time, in accept order. Returns the bound
/// address, which differs from `addr` when port 0 was requested.
pub fn spawn<A: ToSocketAddrs>(addr: A, db: Arc<Mutex<Database>>) -> io::Result<SocketAddr> {
    let listener = TcpListener::bind(addr)?;
    let local = listener.local_addr()?;
    info!(addr = %local, "listening");

    thread::Builder::new()
        .name("userdb-server".into())
        .spawn(move || serve(listener, db))?;
    Ok(local)
}

fn serve(listener: TcpListener, db: Arc<Mutex<Database>>) {
    for conn in listener.incoming() {
        let stream = match conn {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "failed to accept a connection");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".into());

        info!(%peer, "connection opened");
        match handle(stream, Arc::clone(&db)) {
            Ok(()) => info!(%peer, "connection closed"),
            Err(err) => warn!(%peer, error = %format!("{err:#}"), "connection failed"),
        }
    }
}

fn handle(stream: TcpStream, db: Arc<Mutex<Database>>) -> Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    Session::new(reader, &stream, db).run()
}
