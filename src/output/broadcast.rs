//! Line-oriented TCP broadcast of frames.
//!
//! The listener is non-blocking.  New clients are picked up on every poll
//! tick, so they start receiving frames within one dispatch cycle instead
//! of waiting for the next frame to arrive.  Clients are write-only: each
//! frame goes out as a `*HEX;` line.
//!
//! A client that is slow to read keeps a bounded backlog of whole lines.
//! While the backlog is full, new frames are skipped for that client only;
//! it is dropped only when a write fails outright.

use std::io::{self, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use super::registry::{Sink, SinkError};
use crate::queue::Frame;

/// Unsent bytes held per client before frames are skipped.
const MAX_BACKLOG: usize = 64 * 1024;

struct Client {
    stream: TcpStream,
    peer: SocketAddr,
    backlog: Vec<u8>,
    skipped: u64,
}

impl Client {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            backlog: Vec::new(),
            skipped: 0,
        }
    }

    /// Queue `line` behind any backlog, then write what the socket accepts.
    fn send(&mut self, line: &[u8]) -> io::Result<()> {
        if self.backlog.len() + line.len() <= MAX_BACKLOG {
            self.backlog.extend_from_slice(line);
        } else {
            self.skipped += 1;
            if self.skipped.is_power_of_two() {
                log::warn!(
                    "broadcast: client {} is not reading, {} frame(s) skipped",
                    self.peer,
                    self.skipped
                );
            }
        }
        self.flush()
    }

    /// Write as much backlog as possible without blocking.  `Err` means the
    /// connection is gone.
    fn flush(&mut self) -> io::Result<()> {
        while !self.backlog.is_empty() {
            match self.stream.write(&self.backlog) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.backlog.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Emit + poll sink serving frames to any number of TCP clients.
pub struct BroadcastSink {
    listener: TcpListener,
    clients: Vec<Client>,
}

impl BroadcastSink {
    /// Listen on all interfaces at `port` (`0` picks a free port).
    pub fn bind(port: u16) -> Result<Self, SinkError> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    pub fn bind_addr(addr: SocketAddr) -> Result<Self, SinkError> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        log::info!("broadcast: listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            clients: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SinkError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Accept every pending connection without blocking.
    fn accept_pending(&mut self) -> Result<(), SinkError> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(true)?;
                    // Small AVR lines; don't let Nagle hold them back.
                    stream.set_nodelay(true)?;
                    log::info!("broadcast: client {peer} connected");
                    self.clients.push(Client::new(stream, peer));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn keep_client(client: &Client, result: io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::info!("broadcast: dropping client {}: {e}", client.peer);
            false
        }
    }
}

impl Sink for BroadcastSink {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn handle(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let line = format!("*{};\n", frame.to_hex());
        self.clients.retain_mut(|client| {
            let sent = client.send(line.as_bytes());
            keep_client(client, sent)
        });
        Ok(())
    }

    fn tick(&mut self) -> Result<(), SinkError> {
        self.clients.retain_mut(|client| {
            let flushed = client.flush();
            keep_client(client, flushed)
        });
        self.accept_pending()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
