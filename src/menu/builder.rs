//! Builds the application menu tree from a config snapshot.
//!
//! Construction is pure: the same snapshot and platform always produce the
//! same tree. Installing it is the host's job.

use crate::config::{LAUNCH_MINIMIZED, SPELL_CHECKER, USE_WORK_CHAT};
use crate::menu::commands::{
    self, ChoiceGroup, Leaf, Show, Toggle, CONVERSATION_LEAVES, MESSAGE_BUTTONS, PREFERENCE_TOGGLES,
    PRIVACY_TOGGLES, PRIVATE_MODE, SHOW_TRAY_ICON_TOGGLE, SIDEBAR_GROUP, THEME_GROUP,
    TRAILING_PREFERENCE_TOGGLES, VIBRANCY_GROUP, VIEW_SWITCH_LEAVES, ZOOM_LEAVES,
};
use crate::menu::node::{MenuNode, Role};
use crate::platform::PlatformProfile;
use crate::snapshot::ConfigSnapshot;

/// Submenus whose contents come from collaborators outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalSubmenus {
    pub emoji_style: Vec<MenuNode>,
    pub spell_checker_languages: Vec<MenuNode>,
}

#[derive(Debug, Clone)]
pub struct MenuBuilder {
    platform: PlatformProfile,
    external: ExternalSubmenus,
}

impl MenuBuilder {
    pub fn new(platform: PlatformProfile) -> Self {
        Self {
            platform,
            external: ExternalSubmenus::default(),
        }
    }

    pub fn with_external(mut self, external: ExternalSubmenus) -> Self {
        self.external = external;
        self
    }

    pub fn build(&self, snap: &ConfigSnapshot) -> MenuNode {
        let mut top = if self.platform.is_macos() {
            self.macos_template(snap)
        } else {
            self.default_template(snap)
        };

        if self.platform.development {
            top.push(diagnostics_submenu());
        }

        MenuNode::root(top)
    }

    fn macos_template(&self, snap: &ConfigSnapshot) -> Vec<MenuNode> {
        let mut app = vec![
            MenuNode::role(Role::About),
            MenuNode::separator(),
            MenuNode::submenu("preferences", "Caprine Preferences", self.preferences(snap)),
            leaf_node(&commands::MAC_MESSENGER_PREFERENCES),
            MenuNode::separator(),
        ];
        app.extend(switch_items(snap));
        app.extend([
            MenuNode::separator(),
            MenuNode::action(commands::RESTART, "Restart Caprine"),
            MenuNode::separator(),
            MenuNode::role(Role::Services),
            MenuNode::separator(),
            MenuNode::role(Role::Hide),
            MenuNode::role(Role::HideOthers),
            MenuNode::role(Role::Unhide),
            MenuNode::separator(),
            MenuNode::role(Role::Quit).with_label("Quit Caprine"),
        ]);

        vec![
            MenuNode::role(Role::AppMenu).with_children(app),
            MenuNode::role(Role::FileMenu).with_children(vec![
                leaf_node(&commands::NEW_CONVERSATION),
                leaf_node(&commands::NEW_ROOM),
                MenuNode::separator(),
                MenuNode::role(Role::Close),
            ]),
            MenuNode::role(Role::EditMenu),
            MenuNode::role(Role::ViewMenu).with_children(self.view(snap)),
            MenuNode::submenu("conversation", "Conversation", self.conversation(snap)),
            MenuNode::role(Role::WindowMenu),
            MenuNode::role(Role::Help).with_children(self.help()),
        ]
    }

    fn default_template(&self, snap: &ConfigSnapshot) -> Vec<MenuNode> {
        let mut file = vec![
            leaf_node(&commands::NEW_CONVERSATION),
            leaf_node(&commands::NEW_ROOM),
            MenuNode::separator(),
            MenuNode::submenu("preferences", "Caprine Settings", self.preferences(snap)),
            leaf_node(&commands::MESSENGER_SETTINGS),
            MenuNode::separator(),
        ];
        file.extend(switch_items(snap));
        file.extend([
            MenuNode::separator(),
            MenuNode::action(commands::RESTART, "Restart Caprine"),
            MenuNode::role(Role::Quit),
        ]);

        vec![
            MenuNode::role(Role::FileMenu).with_children(file),
            MenuNode::role(Role::EditMenu),
            MenuNode::role(Role::ViewMenu).with_children(self.view(snap)),
            MenuNode::submenu("conversation", "Conversation", self.conversation(snap)),
            MenuNode::role(Role::Help).with_children(self.help()),
        ]
    }

    fn preferences(&self, snap: &ConfigSnapshot) -> Vec<MenuNode> {
        let mut items = vec![
            MenuNode::submenu("privacy", "Privacy", self.toggles(PRIVACY_TOGGLES, snap))
                .visible(Show::DevOnly.visible(&self.platform)),
            MenuNode::submenu(
                "emoji-style",
                "Emoji Style",
                self.external.emoji_style.clone(),
            ),
        ];
        items.extend(self.toggles(PREFERENCE_TOGGLES, snap));
        items.push(
            MenuNode::checkbox(
                commands::LAUNCH_AT_LOGIN,
                "Launch at Login",
                snap.open_at_login(),
            )
            .visible(Show::NotLinux.visible(&self.platform)),
        );

        for toggle in TRAILING_PREFERENCE_TOGGLES {
            let mut node = self.toggle(toggle, snap);
            if toggle.id == SHOW_TRAY_ICON_TOGGLE.id {
                node = node.enabled(!self.platform.is_macos() && !snap.flag(LAUNCH_MINIMIZED));
            }
            items.push(node);
        }

        items.extend([
            MenuNode::separator(),
            MenuNode::submenu(
                "advanced",
                "Advanced",
                vec![MenuNode::action(commands::CUSTOM_STYLES, "Custom Styles")],
            ),
        ]);
        items
    }

    fn view(&self, snap: &ConfigSnapshot) -> Vec<MenuNode> {
        let mut items = leaf_nodes(ZOOM_LEAVES);
        items.extend([
            MenuNode::separator(),
            MenuNode::submenu("theme", "Theme", group_nodes(&THEME_GROUP, snap)),
            MenuNode::submenu("vibrancy", "Vibrancy", group_nodes(&VIBRANCY_GROUP, snap))
                .visible(self.platform.is_macos()),
            MenuNode::separator(),
            self.toggle(&PRIVATE_MODE, snap),
            MenuNode::separator(),
            MenuNode::submenu("sidebar", "Sidebar", group_nodes(&SIDEBAR_GROUP, snap)),
            self.toggle(&MESSAGE_BUTTONS, snap),
            MenuNode::separator(),
        ]);
        items.extend(leaf_nodes(VIEW_SWITCH_LEAVES));
        items
    }

    fn conversation(&self, snap: &ConfigSnapshot) -> Vec<MenuNode> {
        let mut items = leaf_nodes(CONVERSATION_LEAVES);
        items.extend([
            MenuNode::separator(),
            MenuNode::submenu(
                "spell-checker-language",
                "Spell Checker Language",
                self.external.spell_checker_languages.clone(),
            )
            .visible(!self.platform.is_macos() && snap.flag(SPELL_CHECKER)),
        ]);
        items
    }

    fn help(&self) -> Vec<MenuNode> {
        let mut items = vec![
            MenuNode::action(commands::WEBSITE, "Website"),
            MenuNode::action(commands::SOURCE_CODE, "Source Code"),
            MenuNode::action(commands::DONATE, "Donate…"),
            MenuNode::action(commands::REPORT_ISSUE, "Report an Issue…"),
        ];
        if !self.platform.is_macos() {
            items.extend([
                MenuNode::separator(),
                MenuNode::action(commands::ABOUT, "About Caprine"),
            ]);
        }
        items
    }

    fn toggles(&self, toggles: &[Toggle], snap: &ConfigSnapshot) -> Vec<MenuNode> {
        toggles.iter().map(|t| self.toggle(t, snap)).collect()
    }

    fn toggle(&self, toggle: &Toggle, snap: &ConfigSnapshot) -> MenuNode {
        MenuNode::checkbox(toggle.id, toggle.label, snap.flag(toggle.key))
            .with_accelerator(toggle.accelerator)
            .visible(toggle.show.visible(&self.platform))
    }
}

fn switch_items(snap: &ConfigSnapshot) -> Vec<MenuNode> {
    let work_chat = snap.flag(USE_WORK_CHAT);
    vec![
        MenuNode::action(commands::SWITCH_TO_WORK_CHAT, "Switch to Workplace Chat")
            .with_accelerator(Some("CommandOrControl+Shift+2"))
            .visible(!work_chat),
        MenuNode::action(commands::SWITCH_TO_MESSENGER, "Switch to Messenger")
            .with_accelerator(Some("CommandOrControl+Shift+1"))
            .visible(work_chat),
        leaf_node(&commands::LOG_OUT),
    ]
}

fn diagnostics_submenu() -> MenuNode {
    MenuNode::submenu(
        "diagnostics",
        "Debug",
        vec![
            MenuNode::action(commands::SHOW_SETTINGS, "Show Settings"),
            MenuNode::action(commands::SHOW_APP_DATA, "Show App Data"),
            MenuNode::separator(),
            MenuNode::action(commands::DELETE_SETTINGS, "Delete Settings"),
            MenuNode::action(commands::DELETE_APP_DATA, "Delete App Data"),
        ],
    )
}

/// Exactly one entry is checked: the one whose value the snapshot resolves
/// the group's key to.
fn group_nodes(group: &ChoiceGroup, snap: &ConfigSnapshot) -> Vec<MenuNode> {
    let current = snap.choice(group);
    group
        .entries
        .iter()
        .map(|e| {
            MenuNode::checkbox(e.id, e.label, e.value == current).with_accelerator(e.accelerator)
        })
        .collect()
}

fn leaf_node(leaf: &Leaf) -> MenuNode {
    MenuNode::action(leaf.id, leaf.label).with_accelerator(leaf.accelerator)
}

fn leaf_nodes(leaves: &[Leaf]) -> Vec<MenuNode> {
    leaves.iter().map(leaf_node).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::menu::commands::GROUPS;
    use crate::menu::node::NodeKind;
    use crate::platform::Os;
    use serde_json::json;

    fn build(os: Os, dev: bool, store: &MemoryStore) -> MenuNode {
        let snap = ConfigSnapshot::capture(store, false);
        MenuBuilder::new(PlatformProfile::new(os, dev)).build(&snap)
    }

    fn top_roles(root: &MenuNode) -> Vec<Option<Role>> {
        root.children.iter().map(MenuNode::role_of).collect()
    }

    fn checked_in_group(root: &MenuNode, group: &ChoiceGroup) -> Vec<&'static str> {
        group
            .entries
            .iter()
            .filter(|e| root.find(e.id).and_then(MenuNode::checked) == Some(true))
            .map(|e| e.value)
            .collect()
    }

    #[test]
    fn test_macos_template_shape() {
        let root = build(Os::MacOs, false, &MemoryStore::new());
        assert_eq!(
            top_roles(&root),
            vec![
                Some(Role::AppMenu),
                Some(Role::FileMenu),
                Some(Role::EditMenu),
                Some(Role::ViewMenu),
                None,
                Some(Role::WindowMenu),
                Some(Role::Help),
            ]
        );
        let app = &root.children[0];
        assert!(app.find("preferences").is_some());
        assert!(app.children.iter().any(|c| c.role_of() == Some(Role::Quit)));
        assert!(root.find(commands::ABOUT).is_none());
    }

    #[test]
    fn test_windows_template_inlines_quit() {
        let root = build(Os::Windows, false, &MemoryStore::new());
        let roles = top_roles(&root);
        assert!(!roles.contains(&Some(Role::WindowMenu)));
        assert!(!roles.contains(&Some(Role::AppMenu)));

        let file = &root.children[0];
        assert_eq!(file.role_of(), Some(Role::FileMenu));
        assert_eq!(file.children.last().unwrap().role_of(), Some(Role::Quit));
        assert!(file.find("preferences").is_some());
        assert!(root.find(commands::ABOUT).is_some());
    }

    #[test]
    fn test_diagnostics_only_in_development() {
        let store = MemoryStore::new();
        for os in [Os::MacOs, Os::Windows, Os::Linux] {
            let dev = build(os, true, &store);
            assert_eq!(dev.children.last().unwrap().id, "diagnostics");

            let release = build(os, false, &store);
            assert!(release.find("diagnostics").is_none());
        }
    }

    #[test]
    fn test_groups_check_exactly_one() {
        let store = MemoryStore::with([
            ("theme", json!("light")),
            ("vibrancy", json!("full")),
            ("sidebar", json!("narrow")),
        ]);
        let root = build(Os::MacOs, false, &store);
        assert_eq!(checked_in_group(&root, &THEME_GROUP), vec!["light"]);
        assert_eq!(checked_in_group(&root, &VIBRANCY_GROUP), vec!["full"]);
        assert_eq!(checked_in_group(&root, &SIDEBAR_GROUP), vec!["narrow"]);

        let defaults = build(Os::MacOs, false, &MemoryStore::new());
        for group in GROUPS {
            assert_eq!(checked_in_group(&defaults, group), vec![group.default]);
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let store = MemoryStore::with([("privateMode", json!(true)), ("theme", json!("dark"))]);
        for os in [Os::MacOs, Os::Windows, Os::Linux] {
            assert_eq!(build(os, true, &store), build(os, true, &store));
        }
    }

    #[test]
    fn test_switch_items_follow_work_chat() {
        let root = build(Os::Linux, false, &MemoryStore::new());
        assert!(root.find(commands::SWITCH_TO_WORK_CHAT).unwrap().visible);
        assert!(!root.find(commands::SWITCH_TO_MESSENGER).unwrap().visible);

        let store = MemoryStore::with([("useWorkChat", json!(true))]);
        let root = build(Os::Linux, false, &store);
        assert!(!root.find(commands::SWITCH_TO_WORK_CHAT).unwrap().visible);
        assert!(root.find(commands::SWITCH_TO_MESSENGER).unwrap().visible);
    }

    #[test]
    fn test_platform_visibility_filters() {
        let store = MemoryStore::new();
        let mac = build(Os::MacOs, false, &store);
        assert!(mac.find("bounce-dock-on-message").unwrap().visible);
        assert!(mac.find("vibrancy").unwrap().visible);
        assert!(!mac.find("auto-hide-menu-bar").unwrap().visible);
        assert!(!mac.find("spell-checker-language").unwrap().visible);
        assert!(!mac.find("show-tray-icon").unwrap().enabled);
        assert!(!mac.find("privacy").unwrap().visible);

        let linux = build(Os::Linux, false, &store);
        assert!(!linux.find(commands::LAUNCH_AT_LOGIN).unwrap().visible);
        assert!(!linux.find("vibrancy").unwrap().visible);
        assert!(linux.find("spell-checker-language").unwrap().visible);
        assert!(linux.find("launch-minimized").unwrap().visible);
        assert!(linux.find("show-tray-icon").unwrap().enabled);

        let win_dev = build(Os::Windows, true, &store);
        assert!(win_dev.find(commands::LAUNCH_AT_LOGIN).unwrap().visible);
        assert!(win_dev.find("privacy").unwrap().visible);
        assert!(win_dev.find("video-autoplay").unwrap().visible);
    }

    #[test]
    fn test_tray_icon_disabled_while_launch_minimized() {
        let store = MemoryStore::with([("launchMinimized", json!(true))]);
        let root = build(Os::Windows, false, &store);
        assert!(!root.find("show-tray-icon").unwrap().enabled);
    }

    #[test]
    fn test_spell_checker_language_hidden_when_disabled() {
        let store = MemoryStore::with([("isSpellCheckerEnabled", json!(false))]);
        let root = build(Os::Windows, false, &store);
        assert!(!root.find("spell-checker-language").unwrap().visible);
    }

    #[test]
    fn test_external_submenus_are_inlined() {
        let external = ExternalSubmenus {
            emoji_style: vec![MenuNode::checkbox("emoji-native", "Native", true)],
            spell_checker_languages: vec![MenuNode::checkbox("lang-en-US", "English", true)],
        };
        let snap = ConfigSnapshot::capture(&MemoryStore::new(), false);
        let root = MenuBuilder::new(PlatformProfile::new(Os::Linux, false))
            .with_external(external)
            .build(&snap);
        assert!(root.find("emoji-style").unwrap().find("emoji-native").is_some());
        assert!(root.find("lang-en-US").is_some());
    }

    #[test]
    fn test_gated_toggles_carry_accelerators() {
        let root = build(Os::MacOs, false, &MemoryStore::new());
        let aot = root.find("always-on-top").unwrap();
        assert_eq!(aot.kind, NodeKind::Checkbox { checked: false });
        assert_eq!(aot.accelerator.as_deref(), Some("CommandOrControl+Shift+T"));
        let private = root.find("private-mode").unwrap();
        assert_eq!(private.accelerator.as_deref(), Some("CommandOrControl+Shift+N"));
    }
}
