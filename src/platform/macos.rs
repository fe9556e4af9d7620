use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::menu::startup::StartupManager;

const LABEL: &str = "com.sindresorhus.caprine";

pub fn trash(path: &Path) -> Result<()> {
    let home = env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
    let trash_dir = PathBuf::from(home).join(".Trash");
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("No file name in {}", path.display()))?;

    let mut dest = trash_dir.join(name);
    let mut n = 1;
    while dest.exists() {
        dest = trash_dir.join(format!("{} {n}", name.to_string_lossy()));
        n += 1;
    }

    fs::rename(path, &dest)
        .with_context(|| format!("move {} to {}", path.display(), dest.display()))?;
    info!(from = %path.display(), to = %dest.display(), "moved to trash");
    Ok(())
}

/// Login item backed by a per-user LaunchAgent plist.
#[derive(Debug, Default)]
pub struct LaunchAgent;

impl StartupManager for LaunchAgent {
    fn is_enabled(&self) -> Result<bool> {
        Ok(plist_path()?.exists())
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            install()
        } else {
            uninstall()
        }
    }
}

fn install() -> Result<()> {
    let path = plist_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let exe = env::current_exe().context("current_exe")?;
    let plist = launch_agent_plist(&exe, LABEL);
    fs::write(&path, plist.as_bytes()).with_context(|| format!("write {}", path.display()))?;

    let domain = format!("gui/{}", gui_uid());

    // Unload any previous instance first; failure just means none was loaded.
    let _ = launchctl(&["bootout", &domain, &path.to_string_lossy()]);
    launchctl(&["bootstrap", &domain, &path.to_string_lossy()]).context("launchctl bootstrap")?;
    let _ = launchctl(&["enable", &format!("{domain}/{LABEL}")]);

    debug!(path = %path.display(), "launch agent installed");
    Ok(())
}

fn uninstall() -> Result<()> {
    let path = plist_path()?;
    if !path.exists() {
        return Ok(());
    }

    let domain = format!("gui/{}", gui_uid());
    let _ = launchctl(&["disable", &format!("{domain}/{LABEL}")]);
    let _ = launchctl(&["bootout", &domain, &path.to_string_lossy()]);

    fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    debug!(path = %path.display(), "launch agent removed");
    Ok(())
}

fn plist_path() -> Result<PathBuf> {
    let home = env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
    Ok(PathBuf::from(home)
        .join("Library")
        .join("LaunchAgents")
        .join(format!("{LABEL}.plist")))
}

fn gui_uid() -> u32 {
    unsafe { libc::getuid() }
}

fn launch_agent_plist(exe: &Path, label: &str) -> String {
    let exe = exe.display().to_string();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key><string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{exe}</string>
  </array>
  <key>RunAtLoad</key><true/>
  <key>ProcessType</key><string>Interactive</string>
</dict>
</plist>
"#
    )
}

fn launchctl(args: &[&str]) -> Result<()> {
    let out = Command::new("launchctl")
        .args(args)
        .output()
        .with_context(|| format!("running launchctl {}", args.join(" ")))?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(anyhow!(
            "launchctl failed (exit={}): {}",
            out.status,
            stderr.trim()
        ));
    }
    Ok(())
}
