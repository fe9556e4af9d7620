use std::{env, fmt, path::Path, process::Command, str::FromStr};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::menu::startup::StartupManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    MacOs,
    Windows,
    Linux,
}

impl Os {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Linux
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Linux => "linux",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Os {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "macos" | "mac" | "darwin" => Ok(Os::MacOs),
            "windows" | "win" => Ok(Os::Windows),
            "linux" => Ok(Os::Linux),
            other => Err(anyhow!(
                "Unknown platform '{other}'. Expected macos, windows or linux."
            )),
        }
    }
}

/// Host identity that decides the menu's shape. Fixed for the life of the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub os: Os,
    pub development: bool,
}

impl PlatformProfile {
    pub fn new(os: Os, development: bool) -> Self {
        Self { os, development }
    }

    pub fn current() -> Self {
        let development = cfg!(debug_assertions)
            || env::var("CAPRINE_DEV").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        Self::new(Os::current(), development)
    }

    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }
}

/// One-shot OS calls. Failures are reported to the caller, which logs them
/// and moves on.
pub trait Shell {
    fn open_path(&mut self, path: &Path) -> Result<()>;
    fn open_url(&mut self, url: &str) -> Result<()>;
    fn trash(&mut self, path: &Path) -> Result<()>;
    /// Starts a fresh instance and quits this one.
    fn relaunch(&mut self) -> Result<()>;
    fn quit(&mut self);
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
pub(crate) mod win32;

#[derive(Debug, Default)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn open_path(&mut self, path: &Path) -> Result<()> {
        open::that(path).with_context(|| format!("open {}", path.display()))
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("open {url}"))
    }

    fn trash(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        #[cfg(target_os = "macos")]
        {
            return macos::trash(path);
        }

        #[cfg(target_os = "windows")]
        {
            return win32::trash(path);
        }

        #[cfg(target_os = "linux")]
        {
            return linux::trash(path);
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            anyhow::bail!("Moving {} to trash is unsupported on this OS", path.display());
        }
    }

    fn relaunch(&mut self) -> Result<()> {
        let exe = env::current_exe().context("current_exe")?;
        let args = env::args_os().skip(1).collect::<Vec<_>>();
        info!(exe = %exe.display(), "relaunching");
        Command::new(&exe)
            .args(args)
            .spawn()
            .with_context(|| format!("spawn {}", exe.display()))?;
        self.quit();
        Ok(())
    }

    fn quit(&mut self) {
        info!("quitting");
        std::process::exit(0);
    }
}

/// Login-item manager for the current OS.
pub fn startup_manager() -> Box<dyn StartupManager> {
    #[cfg(target_os = "macos")]
    {
        return Box::new(macos::LaunchAgent);
    }

    #[cfg(target_os = "windows")]
    {
        return Box::new(win32::RunKey);
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Box::new(crate::menu::startup::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_os() {
        assert_eq!("macOS".parse::<Os>().unwrap(), Os::MacOs);
        assert_eq!("win".parse::<Os>().unwrap(), Os::Windows);
        assert_eq!("linux".parse::<Os>().unwrap(), Os::Linux);
        assert!("beos".parse::<Os>().is_err());
    }

    #[test]
    fn test_profile_predicates() {
        let mac = PlatformProfile::new(Os::MacOs, false);
        assert!(mac.is_macos());
        assert!(!mac.is_linux());
        let linux = PlatformProfile::new(Os::Linux, true);
        assert!(linux.is_linux());
        assert!(linux.development);
    }
}
