use anyhow::Result;
use tracing::debug;

/// Launch-at-login setting owned by the OS rather than the config store.
pub trait StartupManager {
    fn is_enabled(&self) -> Result<bool>;
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

/// Used where the OS has no supported login-item mechanism; the menu hides
/// the item there.
#[derive(Debug, Default)]
pub struct Unsupported;

impl StartupManager for Unsupported {
    fn is_enabled(&self) -> Result<bool> {
        Ok(false)
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        debug!(enabled, "launch at login is not supported on this OS");
        Ok(())
    }
}
