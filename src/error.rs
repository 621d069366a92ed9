//! Crate-wide error type.
//!
//! Decode failures are deliberately NOT represented here: the input decoders
//! return `Option`/empty vectors and the caller keeps buffering or discards.
//! Errors cover terminal I/O, cancellation, and session misuse.

use std::io;

/// Errors produced by a prompt session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Terminal I/O failed (raw-mode toggle, escape-sequence write, size query).
    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),

    /// The user cancelled the prompt (Escape or Ctrl-C).
    ///
    /// Not a failure: a first-class outcome the flow orchestrator handles by
    /// restoring the terminal and aborting remaining steps.
    #[error("prompt cancelled")]
    Cancelled,

    /// stdin closed while a prompt was still waiting for input.
    #[error("input stream closed")]
    InputClosed,

    /// A bus listener reported a failure. Dispatch itself continues; this
    /// variant exists so listeners have something typed to return.
    #[error("listener failed: {0}")]
    Listener(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
