//! Terminal client for a remote session.

use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::thread;
use tracing::{debug, warn};

/// Connects to `addr` and pipes `input` to the server and the server's
/// replies to `output`.
///
/// Once `input` runs dry the write half is shut down; the call returns after
/// the server closes the connection.
pub fn pipe<A, R, W>(addr: A, mut input: R, mut output: W) -> Result<()>
where
    A: ToSocketAddrs,
    R: Read,
    W: Write + Send,
{
    let stream = TcpStream::connect(addr).context("failed to connect to server")?;
    debug!(peer = %stream.peer_addr()?, "connected");
    let mut upstream = stream.try_clone()?;
    let mut downstream = &stream;

    thread::scope(|s| {
        let replies = s.spawn(move || -> io::Result<u64> {
            let n = io::copy(&mut downstream, &mut output)?;
            output.flush()?;
            Ok(n)
        });

        if let Err(err) = io::copy(&mut input, &mut upstream) {
            warn!(error = %err, "failed to forward input");
        }
        if let Err(err) = upstream.shutdown(Shutdown::Write) {
            debug!(error = %err, "shutdown after input");
        }

        match replies.join() {
            Ok(copied) => copied.map(|_| ()).context("failed to read from server"),
            Err(_) => anyhow::bail!("reply thread panicked"),
        }
    })
}
