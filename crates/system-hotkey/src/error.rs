use thiserror::Error;

use crate::Hotkey;

/// The main error type for system-hotkey operations
#[derive(Error, Debug)]
pub enum Error {
    /// Error parsing or validating a key combination
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The combination is already registered on this context
    #[error("Hotkey already registered: {0}")]
    AlreadyRegistered(Hotkey),

    /// The OS reports the combination is held by another process. Only
    /// raised on platforms with OS-level exclusive registration.
    #[error("Hotkey already registered system-wide: {0}")]
    AlreadyRegisteredSystemWide(Hotkey),

    /// Unregister of a combination that is not currently active
    #[error("Hotkey not registered: {0}")]
    NotRegistered(Hotkey),

    /// The platform keyboard hook could not be installed
    #[error("Failed to install keyboard hook: {0}")]
    HookInstallFailed(String),

    /// The platform keyboard hook could not be fully released. The
    /// context is still considered closed afterwards.
    #[error("Failed to release keyboard hook: {0}")]
    HookUninstallFailed(String),

    /// No hook adapter exists for the running OS
    #[error("Platform not supported: {0}")]
    PlatformUnsupported(&'static str),

    /// Operation on a context that has been shut down
    #[error("Hotkey context has been shut down")]
    ContextClosed,
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;
