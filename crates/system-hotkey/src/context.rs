use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::hook::{self, HookAdapter, HookState, Shared};
use crate::queue::Event;
use crate::{Hotkey, Key, Modifiers};

/// A process-local hotkey engine context.
///
/// Owns one registration table, one event queue and one platform hook.
/// The hook is installed lazily on the first registration and released
/// when the last registration is removed or the context is shut down.
/// Multiple contexts in one process each install their own hook; whether
/// that works concurrently is a platform constraint, not an engine one.
///
/// All operations are bounded synchronous calls; [`HotkeyContext::poll`]
/// never blocks waiting for events.
pub struct HotkeyContext {
    shared: Arc<Shared>,
    inner: Mutex<Inner>,
    closed: AtomicBool,
}

struct Inner {
    adapter: Box<dyn HookAdapter>,
    state: HookState,
}

impl HotkeyContext {
    /// Create a context with the hook adapter for the running platform.
    ///
    /// On macOS and Windows the creating thread must run an event loop
    /// for key events to be delivered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlatformUnsupported`] when no adapter exists for
    /// the running OS.
    pub fn new() -> Result<Self> {
        Ok(Self::with_adapter(hook::platform_adapter()?))
    }

    pub(crate) fn with_adapter(adapter: Box<dyn HookAdapter>) -> Self {
        Self {
            shared: Shared::new(),
            inner: Mutex::new(Inner {
                adapter,
                state: HookState::Uninstalled,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a hotkey, installing the platform hook first if this is
    /// the initial registration.
    ///
    /// Returns a monotonic registration token. Failures are reported
    /// here, at call time, never deferred to poll.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRegistered`] if this context already owns the
    ///   identity
    /// - [`Error::AlreadyRegisteredSystemWide`] if another process owns
    ///   the combination at the OS level
    /// - [`Error::HookInstallFailed`] if the hook could not be installed;
    ///   the context then stays permanently unusable for registration
    /// - [`Error::ContextClosed`] after shutdown
    pub fn register(&self, hotkey: Hotkey) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        self.ensure_open()?;

        if inner.state == HookState::InstallFailed {
            return Err(Error::HookInstallFailed(
                "hook install failed earlier".to_string(),
            ));
        }

        let token = self.shared.registry.register(hotkey)?;

        if inner.state == HookState::Uninstalled {
            inner.state = HookState::Installing;
            match inner.adapter.install(self.shared.clone()) {
                Ok(()) => {
                    inner.state = HookState::Installed;
                    debug!("hook installed");
                }
                Err(e) => {
                    inner.state = HookState::InstallFailed;
                    self.shared.registry.discard(&hotkey);
                    warn!(error = %e, "hook install failed");
                    return Err(e);
                }
            }
        }

        if let Err(e) = inner.adapter.watch(hotkey) {
            self.shared.registry.discard(&hotkey);
            // A hook installed for a registration that never took effect
            // must not outlive it.
            if self.shared.registry.is_empty() && inner.state == HookState::Installed {
                inner.state = HookState::Uninstalling;
                if let Err(uninstall_err) = inner.adapter.uninstall() {
                    warn!(error = %uninstall_err, "failed to release hook after failed registration");
                }
                inner.state = HookState::Uninstalled;
                debug!("hook released after failed registration");
            }
            return Err(e);
        }

        debug!(%hotkey, token, "hotkey registered");
        Ok(token)
    }

    /// Convenience form of [`HotkeyContext::register`] taking the parts
    /// of the identity directly.
    pub fn register_keys(&self, modifiers: Modifiers, key: Key) -> Result<u64> {
        self.register(Hotkey::new(modifiers, key))
    }

    /// Unregister a hotkey. Removing the last registration releases the
    /// platform hook.
    ///
    /// # Errors
    ///
    /// - [`Error::NotRegistered`] if the identity is not active
    /// - [`Error::HookUninstallFailed`] if the OS would not release its
    ///   side of the registration
    /// - [`Error::ContextClosed`] after shutdown
    pub fn unregister(&self, hotkey: Hotkey) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        self.ensure_open()?;

        let token = self.shared.registry.unregister(&hotkey)?;
        let unwatched = inner.adapter.unwatch(hotkey);

        if self.shared.registry.is_empty() && inner.state == HookState::Installed {
            inner.state = HookState::Uninstalling;
            let uninstalled = inner.adapter.uninstall();
            inner.state = HookState::Uninstalled;
            uninstalled?;
            debug!("hook released after last registration");
        }

        unwatched?;
        debug!(%hotkey, token, "hotkey unregistered");
        Ok(())
    }

    /// Convenience form of [`HotkeyContext::unregister`].
    pub fn unregister_keys(&self, modifiers: Modifiers, key: Key) -> Result<()> {
        self.unregister(Hotkey::new(modifiers, key))
    }

    /// Drain triggered hotkeys, oldest first. Non-blocking; returns an
    /// empty vec when nothing fired. Safe to call at any cadence, events
    /// accumulate up to the queue bound in between.
    pub fn poll(&self) -> Result<Vec<Hotkey>> {
        Ok(self.poll_events()?.into_iter().map(|e| e.hotkey).collect())
    }

    /// Like [`HotkeyContext::poll`], with the timestamp each press was
    /// observed at.
    pub fn poll_events(&self) -> Result<Vec<Event>> {
        self.ensure_open()?;
        Ok(self.shared.queue.drain_all())
    }

    /// Number of triggered events discarded because the queue overflowed
    /// between polls. Diagnostics only.
    pub fn dropped_events(&self) -> u64 {
        self.shared.queue.dropped()
    }

    /// Whether [`HotkeyContext::shutdown`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Unregister everything, release the platform hook and invalidate
    /// the context. Every later operation fails with
    /// [`Error::ContextClosed`]; calling `shutdown` again returns `Ok`.
    ///
    /// Blocks until any in-flight install or uninstall completes rather
    /// than racing it.
    ///
    /// # Errors
    ///
    /// [`Error::HookUninstallFailed`] if an OS handle could not be
    /// released. The context is closed regardless; a leaked handle is
    /// surfaced, not swallowed.
    pub fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut first_error = None;
        for hotkey in self.shared.registry.snapshot() {
            self.shared.registry.discard(&hotkey);
            if let Err(e) = inner.adapter.unwatch(hotkey) {
                warn!(%hotkey, error = %e, "failed to release hotkey during shutdown");
                first_error.get_or_insert(e);
            }
        }

        if inner.state == HookState::Installed {
            inner.state = HookState::Uninstalling;
            let uninstalled = inner.adapter.uninstall();
            inner.state = HookState::Uninstalled;
            if let Err(e) = uninstalled {
                warn!(error = %e, "failed to release hook during shutdown");
                first_error.get_or_insert(e);
            }
        }

        self.shared.queue.clear();
        info!("hotkey context shut down");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::ContextClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for HotkeyContext {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.shutdown() {
                warn!(error = %e, "shutdown during drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::hook::tap::{TapHandle, TapHook};

    const NONE: u32 = 0;
    const CTRL: u32 = 0x1;
    const SHIFT: u32 = 0x2;

    fn tap_context() -> (HotkeyContext, TapHandle) {
        let hook = TapHook::new();
        let handle = hook.handle();
        (HotkeyContext::with_adapter(Box::new(hook)), handle)
    }

    /// Installs fine but every combination is held by another process.
    struct ContendedHook {
        installs: Arc<AtomicUsize>,
        uninstalls: Arc<AtomicUsize>,
    }

    impl HookAdapter for ContendedHook {
        fn install(&mut self, _shared: Arc<Shared>) -> Result<()> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn uninstall(&mut self) -> Result<()> {
            self.uninstalls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn watch(&mut self, hotkey: Hotkey) -> Result<()> {
            Err(Error::AlreadyRegisteredSystemWide(hotkey))
        }

        fn unwatch(&mut self, _hotkey: Hotkey) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let (ctx, _handle) = tap_context();
        let hotkey = Hotkey::new(Modifiers::CONTROL | Modifiers::SHIFT, Key::A);

        ctx.register(hotkey).unwrap();
        assert!(matches!(
            ctx.register(hotkey),
            Err(Error::AlreadyRegistered(_))
        ));

        // Same identity built in a different modifier order
        assert!(matches!(
            ctx.register(Hotkey::new(Modifiers::SHIFT | Modifiers::CONTROL, Key::A)),
            Err(Error::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_tokens_increase() {
        let (ctx, _handle) = tap_context();
        let hotkey = Hotkey::new(Modifiers::CONTROL, Key::A);

        let first = ctx.register(hotkey).unwrap();
        ctx.unregister(hotkey).unwrap();
        let second = ctx.register(hotkey).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_unregister_unknown_fails() {
        let (ctx, _handle) = tap_context();
        assert!(matches!(
            ctx.unregister(Hotkey::new(Modifiers::empty(), Key::F5)),
            Err(Error::NotRegistered(_))
        ));
    }

    #[test]
    fn test_poll_with_no_events_is_empty() {
        let (ctx, _handle) = tap_context();
        assert!(ctx.poll().unwrap().is_empty());

        ctx.register(Hotkey::new(Modifiers::empty(), Key::F1)).unwrap();
        assert!(ctx.poll().unwrap().is_empty());
    }

    #[test]
    fn test_end_to_end_f9() {
        let (ctx, handle) = tap_context();
        let f9 = Hotkey::new(Modifiers::empty(), Key::F9);

        ctx.register(f9).unwrap();
        assert!(matches!(ctx.register(f9), Err(Error::AlreadyRegistered(_))));

        handle.key_down(NONE, Key::F9.code());
        assert_eq!(ctx.poll().unwrap(), vec![f9]);

        ctx.unregister(f9).unwrap();
        handle.key_down(NONE, Key::F9.code());
        assert_eq!(ctx.poll().unwrap(), Vec::<Hotkey>::new());
    }

    #[test]
    fn test_events_preserve_delivery_order() {
        let (ctx, handle) = tap_context();
        let ctrl_shift_a = Hotkey::new(Modifiers::CONTROL | Modifiers::SHIFT, Key::A);
        let ctrl_b = Hotkey::new(Modifiers::CONTROL, Key::B);

        ctx.register(ctrl_shift_a).unwrap();
        ctx.register(ctrl_b).unwrap();

        handle.key_down(CTRL | SHIFT, Key::A.code());
        handle.key_down(CTRL, Key::B.code());
        handle.key_down(CTRL | SHIFT, Key::A.code());
        // Not registered: wrong modifiers, wrong key, unmapped code
        handle.key_down(SHIFT, Key::A.code());
        handle.key_down(CTRL, Key::C.code());
        handle.key_down(CTRL, 999);

        assert_eq!(
            ctx.poll().unwrap(),
            vec![ctrl_shift_a, ctrl_b, ctrl_shift_a]
        );
    }

    #[test]
    fn test_poll_events_carry_timestamps() {
        let (ctx, handle) = tap_context();
        let f2 = Hotkey::new(Modifiers::empty(), Key::F2);
        ctx.register(f2).unwrap();

        handle.key_down(NONE, Key::F2.code());
        handle.key_down(NONE, Key::F2.code());

        let events = ctx.poll_events().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].at <= events[1].at);
        assert_eq!(events[0].hotkey, f2);
    }

    #[test]
    fn test_queue_overflow_keeps_newest() {
        let (ctx, handle) = tap_context();
        let f3 = Hotkey::new(Modifiers::empty(), Key::F3);
        ctx.register(f3).unwrap();

        let capacity = crate::queue::DEFAULT_CAPACITY;
        for _ in 0..capacity + 6 {
            handle.key_down(NONE, Key::F3.code());
        }

        assert_eq!(ctx.poll().unwrap().len(), capacity);
        assert_eq!(ctx.dropped_events(), 6);
    }

    #[test]
    fn test_hook_released_after_last_unregister() {
        let (ctx, handle) = tap_context();
        let f4 = Hotkey::new(Modifiers::empty(), Key::F4);

        ctx.register(f4).unwrap();
        ctx.unregister(f4).unwrap();

        // Hook is gone: events are not observed at all
        handle.key_down(NONE, Key::F4.code());
        assert!(ctx.poll().unwrap().is_empty());

        // A new registration reinstalls the hook
        ctx.register(f4).unwrap();
        handle.key_down(NONE, Key::F4.code());
        assert_eq!(ctx.poll().unwrap(), vec![f4]);
    }

    #[test]
    fn test_install_failure_fails_register() {
        let ctx = HotkeyContext::with_adapter(Box::new(TapHook::refusing()));
        let hotkey = Hotkey::new(Modifiers::CONTROL, Key::A);

        assert!(matches!(
            ctx.register(hotkey),
            Err(Error::HookInstallFailed(_))
        ));

        // The failure is terminal, even for other identities
        assert!(matches!(
            ctx.register(Hotkey::new(Modifiers::CONTROL, Key::B)),
            Err(Error::HookInstallFailed(_))
        ));

        // The failed registration left no entry behind
        assert!(matches!(
            ctx.unregister(hotkey),
            Err(Error::NotRegistered(_))
        ));
    }

    #[test]
    fn test_watch_failure_releases_hook() {
        let installs = Arc::new(AtomicUsize::new(0));
        let uninstalls = Arc::new(AtomicUsize::new(0));
        let ctx = HotkeyContext::with_adapter(Box::new(ContendedHook {
            installs: installs.clone(),
            uninstalls: uninstalls.clone(),
        }));
        let hotkey = Hotkey::new(Modifiers::CONTROL, Key::A);

        assert!(matches!(
            ctx.register(hotkey),
            Err(Error::AlreadyRegisteredSystemWide(_))
        ));
        // The hook does not outlive the registration that installed it
        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert_eq!(uninstalls.load(Ordering::SeqCst), 1);

        // No entry was left behind, and a later attempt reinstalls
        assert!(matches!(
            ctx.unregister(hotkey),
            Err(Error::NotRegistered(_))
        ));
        assert!(matches!(
            ctx.register(hotkey),
            Err(Error::AlreadyRegisteredSystemWide(_))
        ));
        assert_eq!(installs.load(Ordering::SeqCst), 2);
        assert_eq!(uninstalls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shutdown_closes_the_context() {
        let (ctx, handle) = tap_context();
        let f6 = Hotkey::new(Modifiers::empty(), Key::F6);
        ctx.register(f6).unwrap();

        ctx.shutdown().unwrap();
        assert!(ctx.is_closed());

        assert!(matches!(ctx.register(f6), Err(Error::ContextClosed)));
        assert!(matches!(ctx.unregister(f6), Err(Error::ContextClosed)));
        assert!(matches!(ctx.poll(), Err(Error::ContextClosed)));

        // The OS may still send raw events; none are delivered
        handle.key_down(NONE, Key::F6.code());
        assert!(matches!(ctx.poll(), Err(Error::ContextClosed)));

        // Shutdown is idempotent
        ctx.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_discards_queued_events() {
        let (ctx, handle) = tap_context();
        let f7 = Hotkey::new(Modifiers::empty(), Key::F7);
        ctx.register(f7).unwrap();
        handle.key_down(NONE, Key::F7.code());

        ctx.shutdown().unwrap();
        assert!(matches!(ctx.poll(), Err(Error::ContextClosed)));
    }

    #[test]
    fn test_fresh_context_after_shutdown() {
        let (first, _handle) = tap_context();
        first
            .register(Hotkey::new(Modifiers::CONTROL, Key::A))
            .unwrap();
        first.shutdown().unwrap();

        let (second, handle) = tap_context();
        let ctrl_a = Hotkey::new(Modifiers::CONTROL, Key::A);
        second.register(ctrl_a).unwrap();
        handle.key_down(CTRL, Key::A.code());
        assert_eq!(second.poll().unwrap(), vec![ctrl_a]);
    }

    #[test]
    fn test_register_keys_convenience() {
        let (ctx, handle) = tap_context();

        ctx.register_keys(Modifiers::CONTROL | Modifiers::SHIFT, Key::A)
            .unwrap();
        handle.key_down(CTRL | SHIFT, Key::A.code());
        assert_eq!(
            ctx.poll().unwrap(),
            vec![Hotkey::new(Modifiers::CONTROL | Modifiers::SHIFT, Key::A)]
        );

        ctx.unregister_keys(Modifiers::CONTROL | Modifiers::SHIFT, Key::A)
            .unwrap();
        assert!(matches!(
            ctx.unregister_keys(Modifiers::CONTROL | Modifiers::SHIFT, Key::A),
            Err(Error::NotRegistered(_))
        ));
    }

    #[test]
    fn test_drop_shuts_down() {
        let hook = TapHook::new();
        let handle = hook.handle();
        {
            let ctx = HotkeyContext::with_adapter(Box::new(hook));
            ctx.register(Hotkey::new(Modifiers::empty(), Key::F8)).unwrap();
        }
        // The tap was uninstalled by drop; injecting is a silent no-op
        handle.key_down(NONE, Key::F8.code());
    }
}
