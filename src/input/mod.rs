//! Input decoding: raw bytes → typed events.
//!
//! ```text
//! stdin bytes → KeyboardDecoder ──┬─→ KeyEvent
//!                  │ (hand-off)   ├─→ CursorReport
//!                  └→ MouseDecoder ─→ MouseEvent
//! ```
//!
//! One byte stream feeds both decoders: the keyboard parser owns the buffer
//! and offers escape sequences it cannot claim to the mouse decoder.

pub mod capabilities;
pub mod events;
pub mod keyboard;
pub mod mouse;
pub mod reader;

pub use capabilities::MouseCapabilities;
pub use events::{Event, Key, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use keyboard::KeyboardDecoder;
pub use mouse::{MouseDecode, MouseDecoder, DEFAULT_DRAG_THRESHOLD};
pub use reader::{StdinMessage, StdinReader};
