//! System-wide hotkey registration and polling.
//!
//! This crate lets an application register modifier+key combinations and
//! detect them no matter which window currently has input focus. Triggered
//! combinations accumulate in a bounded queue and are drained by polling,
//! so the caller keeps control of its own event loop.
//!
//! Only registered exact combinations are reported; this is not a
//! keystroke transcript and not a remapper.
//!
//! ```no_run
//! use std::time::Duration;
//! use system_hotkey::{Hotkey, HotkeyContext, Key, Modifiers};
//!
//! # fn main() -> system_hotkey::Result<()> {
//! let ctx = HotkeyContext::new()?;
//! ctx.register(Hotkey::new(Modifiers::CONTROL | Modifiers::SHIFT, Key::A))?;
//!
//! loop {
//!     for hotkey in ctx.poll()? {
//!         println!("triggered: {hotkey}");
//!     }
//!     std::thread::sleep(Duration::from_millis(50));
//! }
//! # }
//! ```
//!
//! On macOS and Windows the thread that creates the context must be
//! running an event loop (e.g. `tao`) for key events to be delivered; see
//! the `system-hotkey-cli` crate for the canonical setup.

pub mod error;

mod context;
mod hook;
mod hotkey;
mod key;
mod queue;
mod registry;

pub use context::HotkeyContext;
pub use error::{Error, Result};
pub use hotkey::Hotkey;
pub use key::{Key, Modifiers};
pub use queue::Event;
