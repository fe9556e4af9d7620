use std::{path::Path, process::Command};

use anyhow::{anyhow, Context, Result};
use tracing::info;

pub fn trash(path: &Path) -> Result<()> {
    let out = Command::new("gio")
        .arg("trash")
        .arg(path)
        .output()
        .with_context(|| format!("running gio trash {}", path.display()))?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(anyhow!(
            "gio trash failed (exit={}): {}",
            out.status,
            stderr.trim()
        ));
    }
    info!(path = %path.display(), "moved to trash");
    Ok(())
}
