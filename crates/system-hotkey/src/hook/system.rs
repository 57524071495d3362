//! Registration-style hook adapter.
//!
//! On Windows, macOS and X11 the OS offers an explicit "register this
//! exact combination" API (RegisterHotKey, RegisterEventHotKey,
//! XGrabKey), reached here through the `global-hotkey` crate. Each
//! watched combination is registered individually, and a duplicate
//! registration held by another process surfaces as
//! `AlreadyRegisteredSystemWide`.
//!
//! Delivery runs on a dedicated listener thread draining the crate's
//! event channel. That thread is the engine's side of the OS callback
//! boundary: it filters against the registration table, pushes matches
//! onto the queue, and never calls back into hook installation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::{debug, trace};

use super::{native, HookAdapter, Shared};
use crate::error::{Error, Result};
use crate::Hotkey;

/// How long the listener waits for an event before rechecking the
/// shutdown flag.
const LISTEN_TICK: Duration = Duration::from_millis(100);

pub(crate) struct SystemHook {
    manager: Option<GlobalHotKeyManager>,
    /// Native registration id -> engine identity, read by the listener.
    watched: Arc<RwLock<HashMap<u32, Hotkey>>>,
    running: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

impl SystemHook {
    pub fn new() -> Self {
        Self {
            manager: None,
            watched: Arc::new(RwLock::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
            listener: None,
        }
    }
}

impl HookAdapter for SystemHook {
    fn install(&mut self, shared: Arc<Shared>) -> Result<()> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| Error::HookInstallFailed(e.to_string()))?;
        self.manager = Some(manager);
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let watched = self.watched.clone();
        let listener = std::thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || listen(shared, watched, running))
            .map_err(|e| Error::HookInstallFailed(e.to_string()))?;
        self.listener = Some(listener);

        debug!("system hook installed");
        Ok(())
    }

    fn uninstall(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(listener) = self.listener.take() {
            if listener.join().is_err() {
                return Err(Error::HookUninstallFailed(
                    "listener thread panicked".to_string(),
                ));
            }
        }
        self.watched.write().unwrap().clear();
        // Dropping the manager releases any remaining OS registrations.
        self.manager = None;
        debug!("system hook uninstalled");
        Ok(())
    }

    fn watch(&mut self, hotkey: Hotkey) -> Result<()> {
        let manager = self
            .manager
            .as_ref()
            .ok_or_else(|| Error::HookInstallFailed("hook not installed".to_string()))?;
        let native = native::to_native(hotkey);
        manager.register(native).map_err(|e| match e {
            global_hotkey::Error::AlreadyRegistered(_) => {
                Error::AlreadyRegisteredSystemWide(hotkey)
            }
            other => Error::HookInstallFailed(other.to_string()),
        })?;
        self.watched.write().unwrap().insert(native.id(), hotkey);
        Ok(())
    }

    fn unwatch(&mut self, hotkey: Hotkey) -> Result<()> {
        let manager = self
            .manager
            .as_ref()
            .ok_or_else(|| Error::HookUninstallFailed("hook not installed".to_string()))?;
        let native = native::to_native(hotkey);
        self.watched.write().unwrap().remove(&native.id());
        manager
            .unregister(native)
            .map_err(|e| Error::HookUninstallFailed(e.to_string()))
    }
}

/// Listener loop for one installed hook.
///
/// Events on the channel arrive in OS delivery order; the queue
/// preserves that order for poll. Ids not in the watched table belong
/// to another context in this process, or were unwatched after the OS
/// queued the event; both are ignored.
fn listen(shared: Arc<Shared>, watched: Arc<RwLock<HashMap<u32, Hotkey>>>, running: Arc<AtomicBool>) {
    let receiver = GlobalHotKeyEvent::receiver();
    while running.load(Ordering::SeqCst) {
        let event = match receiver.recv_timeout(LISTEN_TICK) {
            Ok(event) => event,
            Err(_) => continue,
        };
        if event.state != HotKeyState::Pressed {
            continue;
        }
        let hotkey = match watched.read().unwrap().get(&event.id) {
            Some(&hotkey) => hotkey,
            None => {
                trace!(id = event.id, "event for unwatched id, ignoring");
                continue;
            }
        };
        if !shared.registry.is_active(&hotkey) {
            continue;
        }
        debug!(%hotkey, "hotkey triggered");
        shared.queue.push(hotkey);
    }
}
