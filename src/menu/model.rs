use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ConfigStore, SHOW_TRAY_ICON, USE_WORK_CHAT};
use crate::menu::actions::Action;
use crate::menu::commands::{self, Command, FollowUp, Toggle};
use crate::menu::common;
use crate::menu::confirm::{ConfirmationResponse, Gate, PendingConfirmation};
use crate::menu::startup::StartupManager;
use crate::platform::PlatformProfile;
use crate::snapshot::ConfigSnapshot;

const AUTO_HIDE_NOTICE: &str = "Press the Alt key to toggle the menu bar.";
const LAUNCH_MINIMIZED_NOTICE: &str =
    "Caprine will now start in the tray. Use the tray icon to bring the window back.";

/// Side effects the host performs after a click, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Relaunch,
    OpenPath(PathBuf),
    OpenUrl(String),
    TrashPath(PathBuf),
    Notice(String),
    /// Offer to restart now; declining keeps the change for the next launch.
    RestartPrompt(String),
    About,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelUpdate {
    pub refresh_menu: bool,
    pub actions: Vec<Action>,
    pub effects: Vec<Effect>,
    /// A checkbox the native layer already flipped that must read unchecked
    /// again, without a rebuild.
    pub uncheck: Option<String>,
    /// An id owned by an externally supplied submenu.
    pub external: Option<String>,
}

impl ModelUpdate {
    fn refresh() -> Self {
        Self {
            refresh_menu: true,
            ..Default::default()
        }
    }

    fn effect(effect: Effect) -> Self {
        Self {
            effects: vec![effect],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(ModelUpdate),
    /// Nothing has changed yet; show the request and pass the answer to
    /// [`MenuModel::resolve`].
    Confirm(PendingConfirmation),
}

/// Modifier state captured with a click.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub shift: bool,
}

impl ClickEvent {
    pub fn shifted() -> Self {
        Self { shift: true }
    }
}

pub struct MenuModel {
    store: Box<dyn ConfigStore>,
    startup: Box<dyn StartupManager>,
    platform: PlatformProfile,
    user_data: PathBuf,
}

impl MenuModel {
    pub fn new(
        store: Box<dyn ConfigStore>,
        startup: Box<dyn StartupManager>,
        platform: PlatformProfile,
        user_data: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            startup,
            platform,
            user_data: user_data.into(),
        }
    }

    pub fn platform(&self) -> &PlatformProfile {
        &self.platform
    }

    pub fn store(&self) -> &dyn ConfigStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn ConfigStore {
        &mut *self.store
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        let open_at_login = self.startup.is_enabled().unwrap_or_else(|e| {
            warn!(error = %e, "reading launch-at-login state failed");
            false
        });
        ConfigSnapshot::capture(&*self.store, open_at_login)
    }

    pub fn handle(&mut self, cmd: Command, click: ClickEvent) -> Result<Outcome> {
        debug!(?cmd, shift = click.shift, "handle");
        let update = match cmd {
            Command::Dispatch(action) => ModelUpdate {
                actions: vec![action],
                ..Default::default()
            },
            Command::Choose { group, value } => {
                self.store
                    .set(group.key, Value::String(value.to_string()))
                    .with_context(|| format!("set {}", group.key))?;
                ModelUpdate {
                    refresh_menu: true,
                    actions: vec![group.dispatch],
                    ..Default::default()
                }
            }
            Command::Toggle(toggle) => return self.toggle(toggle, click),
            Command::ToggleLoginItem => {
                let next = !self
                    .startup
                    .is_enabled()
                    .context("read launch-at-login state")?;
                self.startup
                    .set_enabled(next)
                    .context("update launch-at-login state")?;
                ModelUpdate::refresh()
            }
            Command::SwitchWorkChat(enabled) => {
                self.store.set_bool(USE_WORK_CHAT, enabled)?;
                ModelUpdate::effect(Effect::Relaunch)
            }
            Command::Restart => ModelUpdate::effect(Effect::Relaunch),
            Command::CustomStyles => {
                let path = self.user_data.join(common::CUSTOM_STYLES_FILE);
                common::ensure_custom_styles(&path)?;
                ModelUpdate::effect(Effect::OpenPath(path))
            }
            Command::OpenUrl(url) => ModelUpdate::effect(Effect::OpenUrl(url.to_string())),
            Command::ReportIssue => {
                ModelUpdate::effect(Effect::OpenUrl(common::new_issue_url(&self.platform)?))
            }
            Command::About => ModelUpdate::effect(Effect::About),
            Command::ShowSettings => match self.store.backing_file()? {
                Some(path) => ModelUpdate::effect(Effect::OpenPath(path)),
                None => {
                    debug!("config store has no backing file");
                    ModelUpdate::default()
                }
            },
            Command::ShowAppData => ModelUpdate::effect(Effect::OpenPath(self.user_data.clone())),
            Command::DeleteSettings => {
                self.store.clear().context("clear settings")?;
                ModelUpdate {
                    refresh_menu: true,
                    effects: vec![Effect::Relaunch],
                    ..Default::default()
                }
            }
            Command::DeleteAppData => ModelUpdate {
                effects: vec![Effect::TrashPath(self.user_data.clone()), Effect::Relaunch],
                ..Default::default()
            },
            Command::External(id) => ModelUpdate {
                external: Some(id),
                ..Default::default()
            },
        };

        Ok(Outcome::Done(update))
    }

    /// Completes a gated toggle. The "ask again" flag is written for every
    /// answer; the feature only changes on the affirmative one.
    pub fn resolve(
        &mut self,
        pending: PendingConfirmation,
        response: ConfirmationResponse,
    ) -> Result<ModelUpdate> {
        let gate = pending.gate;
        self.store
            .set_bool(gate.prompt_key(), !response.suppress_checked)
            .with_context(|| format!("set {}", gate.prompt_key()))?;

        if response.is_affirmative() {
            self.flip(gated_toggle(gate))
        } else {
            debug!(?gate, choice = ?response.choice, "confirmation declined");
            Ok(ModelUpdate {
                uncheck: Some(pending.item_id),
                ..Default::default()
            })
        }
    }

    fn toggle(&mut self, toggle: &'static Toggle, click: ClickEvent) -> Result<Outcome> {
        if let Some(gate) = toggle.gate {
            let enabled = self.store.get_bool(gate.feature_key());
            let ask = self.store.get_bool(gate.prompt_key());
            if !enabled && ask && click.shift {
                return Ok(Outcome::Confirm(PendingConfirmation {
                    gate,
                    item_id: toggle.id.to_string(),
                    request: gate.request(),
                }));
            }
        }

        self.flip(toggle).map(Outcome::Done)
    }

    fn flip(&mut self, toggle: &Toggle) -> Result<ModelUpdate> {
        let mut update = ModelUpdate::default();
        let next = !self.store.get_bool(toggle.key);

        if toggle.persist {
            self.store
                .set_bool(toggle.key, next)
                .with_context(|| format!("set {}", toggle.key))?;
            update.refresh_menu = true;
        }
        update.actions.extend(toggle.dispatch);

        match toggle.follow_up {
            FollowUp::None => {}
            FollowUp::RestartPrompt(message) => {
                update.effects.push(Effect::RestartPrompt(message.to_string()));
            }
            FollowUp::AutoHideNotice => {
                if next {
                    update.effects.push(Effect::Notice(AUTO_HIDE_NOTICE.to_string()));
                }
            }
            FollowUp::LaunchMinimized => {
                if next {
                    if !self.store.get_bool(SHOW_TRAY_ICON) {
                        self.store.set_bool(SHOW_TRAY_ICON, true)?;
                        update.actions.push(Action::ToggleTrayIcon);
                    }
                    update
                        .effects
                        .push(Effect::Notice(LAUNCH_MINIMIZED_NOTICE.to_string()));
                }
            }
        }

        Ok(update)
    }
}

fn gated_toggle(gate: Gate) -> &'static Toggle {
    match gate {
        Gate::AlwaysOnTop => &commands::ALWAYS_ON_TOP,
        Gate::PrivateMode => &commands::PRIVATE_MODE,
    }
}
