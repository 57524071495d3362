use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::Hotkey;

/// A single active registration
#[derive(Debug, Clone, Copy)]
struct Entry {
    /// Monotonic token distinguishing successive registrations of the
    /// same identity
    token: u64,
}

/// Thread-safe table of active registrations; the single source of truth
/// for what the hook should report.
///
/// `is_active` is called from the hook callback for every candidate key
/// event, so the read path takes only a shared lock around a hash lookup.
/// Writes happen on the caller's thread during register/unregister and
/// are comparatively rare.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: RwLock<HashMap<Hotkey, Entry>>,
    next_token: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an active entry for the identity, returning a fresh token.
    /// At most one active entry may exist per identity; a second
    /// registration fails instead of silently replacing the first.
    pub fn register(&self, hotkey: Hotkey) -> Result<u64> {
        let mut entries = self.entries.write().unwrap();
        if entries.contains_key(&hotkey) {
            return Err(Error::AlreadyRegistered(hotkey));
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        entries.insert(hotkey, Entry { token });
        Ok(token)
    }

    /// Remove the active entry, returning the token it was registered
    /// under.
    pub fn unregister(&self, hotkey: &Hotkey) -> Result<u64> {
        let mut entries = self.entries.write().unwrap();
        match entries.remove(hotkey) {
            Some(entry) => Ok(entry.token),
            None => Err(Error::NotRegistered(*hotkey)),
        }
    }

    /// Roll back a registration whose downstream OS call failed. Unlike
    /// [`Registry::unregister`], removing a missing entry is not an error.
    pub fn discard(&self, hotkey: &Hotkey) {
        self.entries.write().unwrap().remove(hotkey);
    }

    /// Hot-path check performed per key event inside the hook callback.
    pub fn is_active(&self, hotkey: &Hotkey) -> bool {
        self.entries.read().unwrap().contains_key(hotkey)
    }

    /// All currently active identities, linearizable with respect to
    /// register/unregister.
    pub fn snapshot(&self) -> Vec<Hotkey> {
        self.entries.read().unwrap().keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}
