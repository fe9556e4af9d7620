//! Owns the installed menu and runs the click loop: decode, update the
//! model, rebuild from config, reinstall.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::menu::actions::ActionDispatcher;
use crate::menu::builder::{ExternalSubmenus, MenuBuilder};
use crate::menu::commands;
use crate::menu::common;
use crate::menu::confirm::{ConfirmationPrompt, ConfirmationRequest};
use crate::menu::model::{ClickEvent, Effect, MenuModel, ModelUpdate, Outcome};
use crate::menu::node::MenuNode;
use crate::platform::Shell;
use crate::snapshot::ConfigSnapshot;

/// Hands a finished tree to the native menu bar. Installing replaces the
/// previous menu as a whole.
pub trait MenuInstaller {
    fn install(&mut self, root: &MenuNode) -> Result<()>;
}

/// Supplies the emoji-style and spell-checker-language submenus and handles
/// clicks on their items.
pub trait SubmenuProvider {
    fn submenus(&self, _snapshot: &ConfigSnapshot) -> ExternalSubmenus {
        ExternalSubmenus::default()
    }

    /// Returns true when the menu needs rebuilding.
    fn handle(&mut self, id: &str, _store: &mut dyn ConfigStore) -> Result<bool> {
        debug!(id, "no handler for menu item");
        Ok(false)
    }
}

#[derive(Debug, Default)]
pub struct NoSubmenus;

impl SubmenuProvider for NoSubmenus {}

pub struct MenuHost {
    model: MenuModel,
    dispatcher: Box<dyn ActionDispatcher>,
    prompt: Box<dyn ConfirmationPrompt>,
    shell: Box<dyn Shell>,
    installer: Box<dyn MenuInstaller>,
    submenus: Box<dyn SubmenuProvider>,
    installed: Option<MenuNode>,
}

impl MenuHost {
    pub fn new(
        model: MenuModel,
        dispatcher: Box<dyn ActionDispatcher>,
        prompt: Box<dyn ConfirmationPrompt>,
        shell: Box<dyn Shell>,
        installer: Box<dyn MenuInstaller>,
    ) -> Self {
        Self {
            model,
            dispatcher,
            prompt,
            shell,
            installer,
            submenus: Box::new(NoSubmenus),
            installed: None,
        }
    }

    pub fn with_submenus(mut self, submenus: Box<dyn SubmenuProvider>) -> Self {
        self.submenus = submenus;
        self
    }

    pub fn model(&self) -> &MenuModel {
        &self.model
    }

    pub fn installed(&self) -> Option<&MenuNode> {
        self.installed.as_ref()
    }

    /// Builds a tree from the current config without installing it.
    pub fn build(&self) -> MenuNode {
        let snap = self.model.snapshot();
        MenuBuilder::new(*self.model.platform())
            .with_external(self.submenus.submenus(&snap))
            .build(&snap)
    }

    /// Rebuilds and installs. The previously installed tree stays current
    /// when installation fails.
    pub fn refresh(&mut self) -> Result<()> {
        let root = self.build();
        self.installer.install(&root).context("install menu")?;
        self.installed = Some(root);
        Ok(())
    }

    pub fn click(&mut self, id: &str, event: ClickEvent) -> Result<()> {
        let command = commands::decode(id);
        let update = match self.model.handle(command, event)? {
            Outcome::Done(update) => update,
            Outcome::Confirm(pending) => {
                let response = self.prompt.show(&pending.request);
                debug!(id, choice = ?response.choice, "confirmation answered");
                self.model.resolve(pending, response)?
            }
        };
        self.apply(update)
    }

    fn apply(&mut self, update: ModelUpdate) -> Result<()> {
        for action in &update.actions {
            self.dispatcher.send(*action);
        }

        // The model has already committed its change, so effects run even
        // when the menu cannot be reinstalled.
        let result = self.sync_menu(&update);

        for effect in update.effects {
            self.run(effect);
        }
        result
    }

    fn sync_menu(&mut self, update: &ModelUpdate) -> Result<()> {
        let mut refresh = update.refresh_menu;
        if let Some(id) = &update.external {
            refresh |= self.submenus.handle(id, self.model.store_mut())?;
        }

        if refresh {
            self.refresh()?;
        } else if let Some(id) = &update.uncheck {
            if let Some(tree) = self.installed.as_mut() {
                if tree.set_checked(id, false) {
                    self.installer.install(tree).context("install menu")?;
                }
            }
        }
        Ok(())
    }

    fn run(&mut self, effect: Effect) {
        let platform = *self.model.platform();
        let result = match &effect {
            Effect::Relaunch => self.shell.relaunch(),
            Effect::OpenPath(path) => self.shell.open_path(path),
            Effect::OpenUrl(url) => self.shell.open_url(url),
            Effect::TrashPath(path) => self.shell.trash(path),
            Effect::Notice(message) => {
                self.prompt.notify(message);
                Ok(())
            }
            Effect::About => {
                self.prompt.notify(&common::about_text(&platform));
                Ok(())
            }
            Effect::RestartPrompt(message) => {
                let request = ConfirmationRequest::new(message.as_str(), ["Restart", "Ignore"]);
                if self.prompt.show(&request).is_affirmative() {
                    self.shell.relaunch()
                } else {
                    info!("restart postponed");
                    Ok(())
                }
            }
        };

        if let Err(e) = result {
            warn!(?effect, error = %e, "menu effect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryStore, ALWAYS_ON_TOP};
    use crate::menu::actions::Action;
    use crate::menu::confirm::{Choice, ConfirmationResponse, ScriptedPrompt};
    use crate::menu::startup::Unsupported;
    use crate::platform::{Os, PlatformProfile};
    use serde_json::json;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder(Log);

    impl ActionDispatcher for Recorder {
        fn send(&mut self, action: Action) {
            self.0.borrow_mut().push(format!("action:{action}"));
        }
    }

    impl Shell for Recorder {
        fn open_path(&mut self, path: &Path) -> Result<()> {
            self.0.borrow_mut().push(format!("open:{}", path.display()));
            Ok(())
        }

        fn open_url(&mut self, url: &str) -> Result<()> {
            self.0.borrow_mut().push(format!("url:{url}"));
            Ok(())
        }

        fn trash(&mut self, path: &Path) -> Result<()> {
            self.0.borrow_mut().push(format!("trash:{}", path.display()));
            Ok(())
        }

        fn relaunch(&mut self) -> Result<()> {
            self.0.borrow_mut().push("relaunch".to_string());
            Ok(())
        }

        fn quit(&mut self) {
            self.0.borrow_mut().push("quit".to_string());
        }
    }

    #[derive(Default)]
    struct Installs {
        trees: Vec<MenuNode>,
        fail: bool,
    }

    struct FakeInstaller(Rc<RefCell<Installs>>);

    impl MenuInstaller for FakeInstaller {
        fn install(&mut self, root: &MenuNode) -> Result<()> {
            let mut installs = self.0.borrow_mut();
            if installs.fail {
                anyhow::bail!("native menu rejected");
            }
            installs.trees.push(root.clone());
            Ok(())
        }
    }

    struct Harness {
        host: MenuHost,
        log: Log,
        installs: Rc<RefCell<Installs>>,
        transcript: Log,
    }

    fn harness(store: MemoryStore, answers: Vec<ConfirmationResponse>) -> Harness {
        let log = Log::default();
        let installs = Rc::new(RefCell::new(Installs::default()));
        let prompt = ScriptedPrompt::new(answers);
        let transcript = prompt.transcript();
        let model = MenuModel::new(
            Box::new(store),
            Box::new(Unsupported),
            PlatformProfile::new(Os::Windows, false),
            "/tmp/caprine-host",
        );
        let mut host = MenuHost::new(
            model,
            Box::new(Recorder(Rc::clone(&log))),
            Box::new(prompt),
            Box::new(Recorder(Rc::clone(&log))),
            Box::new(FakeInstaller(Rc::clone(&installs))),
        );
        host.refresh().unwrap();
        Harness {
            host,
            log,
            installs,
            transcript,
        }
    }

    fn checked(host: &MenuHost, id: &str) -> Option<bool> {
        host.installed()?.find(id)?.checked()
    }

    #[test]
    fn test_choice_click_reinstalls_with_new_check() {
        let mut h = harness(MemoryStore::new(), vec![]);
        h.host.click("theme-light", ClickEvent::default()).unwrap();

        assert_eq!(h.installs.borrow().trees.len(), 2);
        assert_eq!(checked(&h.host, "theme-light"), Some(true));
        assert_eq!(checked(&h.host, "theme-system"), Some(false));
        assert_eq!(*h.log.borrow(), vec!["action:set-theme"]);
    }

    #[test]
    fn test_groups_stay_exclusive_across_clicks() {
        use crate::menu::commands::{GROUPS, SIDEBAR_GROUP, THEME_GROUP};

        let mut h = harness(MemoryStore::new(), vec![]);
        for id in [
            "theme-dark",
            "sidebar-narrow",
            "theme-light",
            "sidebar-hidden",
            "sidebar-hidden",
            "vibrancy-full",
            "theme-system",
        ] {
            h.host.click(id, ClickEvent::default()).unwrap();

            let snap = h.host.model().snapshot();
            let tree = h.host.installed().unwrap();
            for group in GROUPS {
                let checked = group
                    .entries
                    .iter()
                    .filter(|e| tree.find(e.id).and_then(MenuNode::checked) == Some(true))
                    .map(|e| e.value)
                    .collect::<Vec<_>>();
                assert_eq!(checked, vec![snap.choice(group)], "after {id}");
            }
        }

        let store = h.host.model().store();
        assert_eq!(store.get(THEME_GROUP.key), Some(json!("system")));
        assert_eq!(store.get(SIDEBAR_GROUP.key), Some(json!("hidden")));
    }

    #[test]
    fn test_confirmed_always_on_top() {
        let mut h = harness(
            MemoryStore::new(),
            vec![ConfirmationResponse::new(Choice::Affirmative, false)],
        );
        h.host.click("always-on-top", ClickEvent::shifted()).unwrap();

        assert_eq!(h.transcript.borrow().len(), 1);
        assert!(h.host.model().store().get_bool(ALWAYS_ON_TOP));
        assert_eq!(checked(&h.host, "always-on-top"), Some(true));
        assert_eq!(*h.log.borrow(), vec!["action:set-always-on-top"]);
    }

    #[test]
    fn test_declined_always_on_top_unchecks_item() {
        let mut h = harness(
            MemoryStore::new(),
            vec![ConfirmationResponse::new(Choice::Negative, false)],
        );
        // The native layer flips the checkbox before the handler runs.
        h.host
            .installed
            .as_mut()
            .unwrap()
            .set_checked("always-on-top", true);

        h.host.click("always-on-top", ClickEvent::shifted()).unwrap();

        assert!(!h.host.model().store().get_bool(ALWAYS_ON_TOP));
        assert_eq!(checked(&h.host, "always-on-top"), Some(false));
        assert!(h.log.borrow().is_empty());
        assert_eq!(h.installs.borrow().trees.len(), 2);
    }

    #[test]
    fn test_switching_off_skips_prompt() {
        let mut h = harness(MemoryStore::with([(ALWAYS_ON_TOP, json!(true))]), vec![]);
        h.host.click("always-on-top", ClickEvent::shifted()).unwrap();
        assert!(h.transcript.borrow().is_empty());
        assert!(!h.host.model().store().get_bool(ALWAYS_ON_TOP));
    }

    #[test]
    fn test_restart_prompt_relaunches_on_accept() {
        let mut h = harness(
            MemoryStore::new(),
            vec![ConfirmationResponse::new(Choice::Affirmative, false)],
        );
        h.host.click("hardware-acceleration", ClickEvent::default()).unwrap();
        assert_eq!(*h.log.borrow(), vec!["relaunch"]);
    }

    #[test]
    fn test_restart_prompt_ignored() {
        let mut h = harness(MemoryStore::new(), vec![]);
        h.host.click("hardware-acceleration", ClickEvent::default()).unwrap();
        assert!(h.log.borrow().is_empty());
        assert!(!h.host.model().store().get_bool("hardwareAcceleration"));
    }

    #[test]
    fn test_failed_install_keeps_previous_tree() {
        let mut h = harness(MemoryStore::new(), vec![]);
        h.installs.borrow_mut().fail = true;

        assert!(h.host.click("theme-dark", ClickEvent::default()).is_err());
        assert_eq!(checked(&h.host, "theme-system"), Some(true));
        assert_eq!(h.installs.borrow().trees.len(), 1);
    }

    #[test]
    fn test_effects_run_when_install_fails() {
        let mut h = harness(MemoryStore::with([(ALWAYS_ON_TOP, json!(true))]), vec![]);
        h.installs.borrow_mut().fail = true;

        let result = h.host.click(commands::DELETE_SETTINGS, ClickEvent::default());

        assert!(result.is_err());
        assert!(h.host.model().store().entries().is_empty());
        assert_eq!(*h.log.borrow(), vec!["relaunch"]);
    }

    #[test]
    fn test_open_url_and_about() {
        let mut h = harness(MemoryStore::new(), vec![]);
        h.host.click(commands::DONATE, ClickEvent::default()).unwrap();
        h.host.click(commands::ABOUT, ClickEvent::default()).unwrap();

        assert_eq!(
            *h.log.borrow(),
            vec![format!("url:{}", commands::DONATE_URL)]
        );
        assert!(h.transcript.borrow()[0].starts_with("Caprine"));
    }

    #[test]
    fn test_external_click_reaches_provider() {
        struct Emoji;

        impl SubmenuProvider for Emoji {
            fn submenus(&self, snapshot: &ConfigSnapshot) -> ExternalSubmenus {
                let style = snapshot.text("emojiStyle").unwrap_or("native");
                ExternalSubmenus {
                    emoji_style: vec![
                        MenuNode::checkbox("emoji-native", "Native", style == "native"),
                        MenuNode::checkbox("emoji-facebook", "Facebook", style == "facebook"),
                    ],
                    ..Default::default()
                }
            }

            fn handle(&mut self, id: &str, store: &mut dyn ConfigStore) -> Result<bool> {
                let style = id.trim_start_matches("emoji-");
                store.set("emojiStyle", json!(style))?;
                Ok(true)
            }
        }

        let mut h = harness(MemoryStore::new(), vec![]);
        h.host = h.host.with_submenus(Box::new(Emoji));
        h.host.refresh().unwrap();
        assert_eq!(checked(&h.host, "emoji-native"), Some(true));

        h.host.click("emoji-facebook", ClickEvent::default()).unwrap();
        assert_eq!(checked(&h.host, "emoji-facebook"), Some(true));
        assert_eq!(checked(&h.host, "emoji-native"), Some(false));
    }
}
