//! stdin reader thread.
//!
//! Raw-mode input arrives byte-by-byte; something has to block on stdin
//! without blocking event processing and rendering. A dedicated thread reads
//! chunks and forwards them over a channel; the engine's single logical task
//! consumes from the channel, so decoding, dispatch, and painting all stay
//! strictly ordered.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Message from the reader thread.
pub enum StdinMessage {
    /// Raw bytes from stdin.
    Data(Vec<u8>),
    /// stdin closed or errored.
    Closed,
}

/// Handle to the reader thread.
pub struct StdinReader {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl StdinReader {
    /// Spawn the reader. Returns the handle and the receiving end.
    pub fn spawn() -> io::Result<(Self, Receiver<StdinMessage>)> {
        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::Builder::new()
            .name("promptline-stdin".to_string())
            .spawn(move || read_loop(running_clone, tx))?;

        Ok((Self { handle: Some(handle), running }, rx))
    }

    /// Ask the thread to stop after its current read returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// A reader fed from fixed chunks instead of stdin. The channel stays
    /// open after the chunks so consumers see timeouts, not a close.
    #[cfg(test)]
    pub(crate) fn scripted(chunks: &[&[u8]]) -> (Self, Receiver<StdinMessage>) {
        let (tx, rx) = mpsc::channel();
        for chunk in chunks {
            let _ = tx.send(StdinMessage::Data(chunk.to_vec()));
        }
        let running = Arc::new(AtomicBool::new(true));
        let handle = thread::spawn(move || {
            let _tx = tx;
            thread::park();
        });
        (Self { handle: Some(handle), running }, rx)
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
        // The thread may be parked in a blocking read; detach rather than
        // join so teardown never hangs on a silent terminal.
        drop(self.handle.take());
    }
}

fn read_loop(running: Arc<AtomicBool>, tx: Sender<StdinMessage>) {
    let stdin = io::stdin();
    let mut buf = [0u8; 256];

    while running.load(Ordering::SeqCst) {
        match stdin.lock().read(&mut buf) {
            Ok(0) => {
                let _ = tx.send(StdinMessage::Closed);
                break;
            }
            Ok(n) => {
                if tx.send(StdinMessage::Data(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                let _ = tx.send(StdinMessage::Closed);
                break;
            }
        }
    }
}
