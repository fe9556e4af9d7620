use std::{fs, path::Path};

use anyhow::{Context, Result};
use url::Url;

use crate::platform::PlatformProfile;

const NEW_ISSUE_URL: &str = "https://github.com/sindresorhus/caprine/issues/new";

pub const CUSTOM_STYLES_FILE: &str = "custom.css";

pub const CUSTOM_STYLES_TEMPLATE: &str = "/*
This is the custom styles file where you can add anything you want.
The styles here will be injected into Caprine and will override default styles.
If you want to disable styles but keep the config, just comment the lines that you don't want to be used.

Press Command/Ctrl+R in Caprine to see your changes.
*/
";

pub fn debug_info(platform: &PlatformProfile) -> String {
    format!(
        "Caprine {}\n{} {}",
        env!("CARGO_PKG_VERSION"),
        platform.os,
        std::env::consts::ARCH
    )
}

pub fn issue_body(platform: &PlatformProfile) -> String {
    format!(
        "<!-- Please succinctly describe your issue and steps to reproduce it. -->\n\n\n---\n\n{}",
        debug_info(platform)
    )
}

pub fn new_issue_url(platform: &PlatformProfile) -> Result<String> {
    let url = Url::parse_with_params(NEW_ISSUE_URL, &[("body", issue_body(platform))])
        .context("build issue url")?;
    Ok(url.into())
}

pub fn about_text(platform: &PlatformProfile) -> String {
    format!(
        "Caprine\n\nElegant Facebook Messenger desktop app\n\n{}",
        debug_info(platform)
    )
}

/// Seeds the stylesheet with the commented template unless it already exists.
pub fn ensure_custom_styles(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, CUSTOM_STYLES_TEMPLATE).with_context(|| format!("write {}", path.display()))
}
