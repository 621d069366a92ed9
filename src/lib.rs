//! promptline - interactive terminal prompts without a framework.
//!
//! A single-threaded prompt engine: raw-mode terminal control, hand-rolled
//! keyboard and mouse escape-sequence decoders, a debounced renderer, and a
//! small set of prompt state machines (select, multiselect, text, password,
//! confirm) that can be chained into flows with conditional steps.
//!
//! # Architecture
//!
//! ```text
//! stdin bytes                                    terminal writes
//!     │                                                ▲
//!     ▼                                                │
//! KeyboardDecoder ──┬─► Event ─► EventBus          RenderScheduler
//!     │ unclaimed   │              │ listeners         ▲ debounced
//!     ▼ CSI seqs    │              ▼                   │
//! MouseDecoder ─────┘           Engine ─► Prompt state machine
//!                                  │         (lines out)
//!                                  ▼
//!                              Outcome ─► flow / answers
//! ```
//!
//! The engine owns the terminal for the session: one blocking stdin reader
//! thread feeds bytes over a channel, and everything else (decode, dispatch,
//! paint) runs on the caller's thread.
//!
//! # Quick start
//!
//! ```no_run
//! use promptline::prompts::{confirm, select, text, SelectOption};
//!
//! let answers = promptline::flow(vec![
//!     text("name", "Project name").required(true).into(),
//!     select("kind", "Template", vec![
//!         SelectOption::new("lib", "Library"),
//!         SelectOption::new("bin", "Binary"),
//!     ])
//!     .into(),
//!     confirm("git", "Initialize git repo?", true).into(),
//! ])?;
//! # Ok::<(), promptline::Error>(())
//! ```

pub mod bus;
pub mod engine;
pub mod error;
pub mod flow;
pub mod input;
pub mod prompts;
pub mod render;
pub mod terminal;
pub mod theme;

pub use bus::{EventBus, Subscription};
pub use engine::{Engine, SessionOptions};
pub use error::{Error, Result};
pub use flow::{ask, flow, flow_with_options, run_flow, INTERRUPTED_EXIT_CODE};
pub use input::{Event, Key, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
pub use prompts::{Answer, Answers, PromptConfig, PromptResult};
pub use terminal::{CaptureTerminal, StdTerminal, Terminal};
pub use theme::{Theme, ThemeOverride};
