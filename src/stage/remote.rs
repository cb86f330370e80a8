//! Live receiver feed: reads AVR lines from a networked receiver.
//!
//! Reads use a short timeout so a stop request is noticed within
//! [`READ_POLL`] even when the receiver is quiet.  [`stop`] additionally
//! shuts the socket down, which wakes a blocked read immediately.
//!
//! [`stop`]: PipelineStage::stop

use std::io::{BufRead, BufReader, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::avr::LineDecoder;
use super::engine::{PipelineStage, StageError};
use crate::queue::SharedFrameQueue;

/// Upper bound on how long a read may block before the stop flag is checked.
pub const READ_POLL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// RemoteStage
// ---------------------------------------------------------------------------

/// Pipeline stage backed by a receiver's AVR feed.
pub struct RemoteStage {
    addr: String,
    stream: Mutex<Option<TcpStream>>,
    /// Second handle on the socket, used by `stop` to interrupt reads.
    control: TcpStream,
    queue: SharedFrameQueue,
    output_all: bool,
    stop: AtomicBool,
}

impl RemoteStage {
    /// Connect to the receiver at `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// [`StageError::Connect`] when the receiver is unreachable.
    pub fn connect(
        addr: &str,
        queue: SharedFrameQueue,
        output_all: bool,
    ) -> Result<Self, StageError> {
        let connect_err = |source| StageError::Connect {
            addr: addr.to_string(),
            source,
        };

        let stream = TcpStream::connect(addr).map_err(connect_err)?;
        stream.set_read_timeout(Some(READ_POLL))?;
        let control = stream.try_clone().map_err(connect_err)?;

        log::info!("remote: connected to {addr}");

        Ok(Self {
            addr: addr.to_string(),
            stream: Mutex::new(Some(stream)),
            control,
            queue,
            output_all,
            stop: AtomicBool::new(false),
        })
    }
}

impl RemoteStage {
    fn push_line(&self, decoder: &mut LineDecoder, line: &[u8]) {
        if let Some(frame) = decoder.decode(&String::from_utf8_lossy(line)) {
            self.queue.push(frame);
        }
    }
}

impl PipelineStage for RemoteStage {
    fn name(&self) -> &str {
        "remote"
    }

    fn run(&self) -> Result<(), StageError> {
        let Some(stream) = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            log::warn!("remote: feed from {} already consumed", self.addr);
            return Ok(());
        };

        let mut reader = BufReader::new(stream);
        let mut decoder = LineDecoder::new(self.output_all);
        // Partial lines survive read timeouts: `read_until` keeps whatever
        // it appended before the error.
        let mut buf = Vec::with_capacity(64);

        while !self.stop.load(Ordering::Relaxed) {
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    // A line cut short by a timeout and never terminated.
                    if !buf.is_empty() {
                        self.push_line(&mut decoder, &buf);
                    }
                    log::info!("remote: {} closed the feed", self.addr);
                    break;
                }
                Ok(_) => {
                    self.push_line(&mut decoder, &buf);
                    buf.clear();
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue;
                }
                Err(e) if self.stop.load(Ordering::Relaxed) => {
                    log::debug!("remote: read interrupted by stop: {e}");
                    break;
                }
                Err(e) => return Err(StageError::Io(e)),
            }
        }

        log::info!(
            "remote: {} frames queued, {} lines skipped",
            decoder.accepted(),
            decoder.skipped()
        );
        Ok(())
    }

    fn stop(&self) {
        if !self.stop.swap(true, Ordering::Relaxed) {
            // Already-closed sockets report NotConnected; nothing to undo.
            let _ = self.control.shutdown(Shutdown::Both);
        }
    }

    /// The feed carries decoded frames only; tuning belongs to the receiver.
    fn retune(&self, frequency_hz: f64) -> bool {
        log::debug!("remote: {} cannot be retuned to {frequency_hz} Hz", self.addr);
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::queue::FrameQueue;

    const LONG: &str = "8D4840D6202CC371C32CE0576098";

    fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[test]
    fn reads_frames_until_peer_closes() {
        let (listener, addr) = listener();
        let feeder = std::thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            write!(peer, "*{LONG};\n*DEAD;\n*{LONG};\n").unwrap();
        });

        let queue = Arc::new(FrameQueue::unbounded());
        let stage = RemoteStage::connect(&addr, Arc::clone(&queue), false).unwrap();
        feeder.join().unwrap();

        stage.run().unwrap();
        assert_eq!(queue.try_pop_all().len(), 2);
    }

    #[test]
    fn unterminated_last_line_split_by_timeout_is_decoded() {
        let (listener, addr) = listener();
        let feeder = std::thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            write!(peer, "*{LONG};\n*{}", &LONG[..10]).unwrap();
            peer.flush().unwrap();
            // Let the reader time out holding the partial line.
            std::thread::sleep(READ_POLL * 2);
            write!(peer, "{};", &LONG[10..]).unwrap();
            peer.flush().unwrap();
            std::thread::sleep(READ_POLL * 2);
        });

        let queue = Arc::new(FrameQueue::unbounded());
        let stage = RemoteStage::connect(&addr, Arc::clone(&queue), false).unwrap();
        stage.run().unwrap();
        feeder.join().unwrap();

        let frames = queue.try_pop_all();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].to_hex(), LONG);
    }

    #[test]
    fn stop_interrupts_a_quiet_feed() {
        let (listener, addr) = listener();
        let queue = Arc::new(FrameQueue::unbounded());
        let stage = Arc::new(RemoteStage::connect(&addr, queue, false).unwrap());
        // Keep the peer open and silent.
        let (_peer, _) = listener.accept().unwrap();

        let runner = {
            let stage = Arc::clone(&stage);
            std::thread::spawn(move || stage.run())
        };

        std::thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        stage.stop();
        stage.stop();

        runner.join().unwrap().unwrap();
        assert!(started.elapsed() < READ_POLL * 4);
    }

    #[test]
    fn unreachable_receiver_is_connect_error() {
        // Bind then drop to get a port nobody listens on.
        let (listener, addr) = listener();
        drop(listener);

        let queue = Arc::new(FrameQueue::unbounded());
        let result = RemoteStage::connect(&addr, queue, false);
        assert!(matches!(result, Err(StageError::Connect { .. })));
    }

    #[test]
    fn retune_is_rejected() {
        let (_listener, addr) = listener();
        let queue = Arc::new(FrameQueue::unbounded());
        let stage = RemoteStage::connect(&addr, queue, false).unwrap();
        assert!(!stage.retune(1090e6));
    }
}
