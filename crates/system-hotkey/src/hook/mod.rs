//! Platform hook adapters.
//!
//! One adapter variant exists per platform registration style, behind a
//! single capability interface. The context selects an adapter once at
//! creation time; shared logic never branches on platform identity.

mod native;
pub(crate) mod system;
#[cfg_attr(not(test), allow(dead_code))]
pub(crate) mod tap;

use std::sync::Arc;

use crate::error::Result;
use crate::queue::EventQueue;
use crate::registry::Registry;
use crate::Hotkey;

/// State shared between the engine context and the hook callback thread.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub registry: Registry,
    pub queue: EventQueue,
}

impl Shared {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Installation state of a hook adapter. `InstallFailed` is terminal:
/// a context whose hook failed to install stays unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HookState {
    Uninstalled,
    Installing,
    Installed,
    Uninstalling,
    InstallFailed,
}

/// Capability interface over the platform hook APIs.
///
/// Implementations are driven exclusively from the caller's thread; none
/// of these methods is ever invoked from the hook callback context.
pub(crate) trait HookAdapter: Send {
    /// Install the system-wide hook and start delivering matching events
    /// into `shared.queue`.
    fn install(&mut self, shared: Arc<Shared>) -> Result<()>;

    /// Release every OS handle held by the hook.
    fn uninstall(&mut self) -> Result<()>;

    /// Tell the OS to intercept one combination. A no-op for
    /// filter-style hooks that already observe every key event.
    fn watch(&mut self, hotkey: Hotkey) -> Result<()>;

    /// Reverse of [`HookAdapter::watch`].
    fn unwatch(&mut self, hotkey: Hotkey) -> Result<()>;
}

/// Select the adapter for the running platform.
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub(crate) fn platform_adapter() -> Result<Box<dyn HookAdapter>> {
    Ok(Box::new(system::SystemHook::new()))
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
pub(crate) fn platform_adapter() -> Result<Box<dyn HookAdapter>> {
    Err(crate::error::Error::PlatformUnsupported(
        std::env::consts::OS,
    ))
}
