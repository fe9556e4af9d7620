#![cfg_attr(windows, windows_subsystem = "windows")]

use anyhow::{Context, Result};

use caprine_menu::{
    config::{self, JsonFileStore},
    logging,
    menu::{self, actions::LogDispatcher, host::MenuHost, model::MenuModel},
    platform::{self, PlatformProfile, SystemShell},
};

fn main() -> Result<()> {
    logging::init("info");

    let path = config::resolve_config_path()
        .context("No config path: set CAPRINE_CONFIG, APPDATA or HOME")?;
    let user_data = config::user_data_dir(&path);
    let profile = PlatformProfile::current();
    tracing::info!(config = %path.display(), os = %profile.os, dev = profile.development, "starting");

    menu::platform::run(|installer, prompt| {
        let model = MenuModel::new(
            Box::new(JsonFileStore::open(&path)),
            platform::startup_manager(),
            profile,
            user_data,
        );
        Ok(MenuHost::new(
            model,
            Box::new(LogDispatcher),
            prompt,
            Box::new(SystemShell),
            installer,
        ))
    })
}
