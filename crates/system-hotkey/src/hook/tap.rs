//! Filter-style hook adapter.
//!
//! The second platform registration style: a single application-installed
//! tap observes every raw key-down descriptor and filters in-process
//! against the registration table. Nothing is registered per combination
//! with the OS, so `watch`/`unwatch` are no-ops. Raw descriptors that do
//! not map into the engine's key space are ignored, not errors; most
//! keystrokes are not hotkeys.
//!
//! This adapter is also the seam the test suite drives synthetic key
//! events through.

use std::sync::{Arc, Mutex};

use tracing::trace;

use super::{HookAdapter, Shared};
use crate::error::{Error, Result};
use crate::{Hotkey, Key, Modifiers};

/// Handle through which raw key-down descriptors reach an installed tap.
///
/// Cloneable; events delivered while no tap is installed are dropped on
/// the floor, matching a hook that is not present.
#[derive(Clone, Default)]
pub(crate) struct TapHandle {
    shared: Arc<Mutex<Option<Arc<Shared>>>>,
}

impl TapHandle {
    /// Deliver one raw key-down descriptor: a modifier bitmask and a
    /// numeric key code.
    ///
    /// This runs in the callback context: translate, filter, push,
    /// return. Errors never propagate out of here.
    pub fn key_down(&self, modifier_bits: u32, key_code: u32) {
        let guard = self.shared.lock().unwrap();
        let Some(shared) = guard.as_ref() else {
            return;
        };
        let Some(key) = Key::from_code(key_code) else {
            trace!(key_code, "unmapped key code, ignoring");
            return;
        };
        let Some(modifiers) = Modifiers::from_bits(modifier_bits) else {
            trace!(modifier_bits, "unmapped modifier bits, ignoring");
            return;
        };
        let hotkey = Hotkey::new(modifiers, key);
        if shared.registry.is_active(&hotkey) {
            shared.queue.push(hotkey);
        }
    }
}

pub(crate) struct TapHook {
    handle: TapHandle,
    /// Simulates a platform refusing the hook (missing permission or a
    /// hook limit).
    refuse_install: bool,
}

impl TapHook {
    pub fn new() -> Self {
        Self {
            handle: TapHandle::default(),
            refuse_install: false,
        }
    }

    /// An adapter whose install always fails.
    #[cfg(test)]
    pub fn refusing() -> Self {
        Self {
            handle: TapHandle::default(),
            refuse_install: true,
        }
    }

    /// The event-injection side of this tap.
    pub fn handle(&self) -> TapHandle {
        self.handle.clone()
    }
}

impl HookAdapter for TapHook {
    fn install(&mut self, shared: Arc<Shared>) -> Result<()> {
        if self.refuse_install {
            return Err(Error::HookInstallFailed(
                "hook refused by platform".to_string(),
            ));
        }
        *self.handle.shared.lock().unwrap() = Some(shared);
        Ok(())
    }

    fn uninstall(&mut self) -> Result<()> {
        *self.handle.shared.lock().unwrap() = None;
        Ok(())
    }

    fn watch(&mut self, _hotkey: Hotkey) -> Result<()> {
        // The tap already observes every key event.
        Ok(())
    }

    fn unwatch(&mut self, _hotkey: Hotkey) -> Result<()> {
        Ok(())
    }
}
