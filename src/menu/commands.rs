//! Declarative table of every clickable item and the command it resolves to.

use crate::config::{LAUNCH_MINIMIZED, SHOW_TRAY_ICON, SPELL_CHECKER};
use crate::menu::actions::Action;
use crate::menu::confirm::Gate;
use crate::platform::PlatformProfile;

pub const SWITCH_TO_WORK_CHAT: &str = "switch-to-work-chat";
pub const SWITCH_TO_MESSENGER: &str = "switch-to-messenger";
pub const RESTART: &str = "restart";
pub const LAUNCH_AT_LOGIN: &str = "launch-at-login";
pub const CUSTOM_STYLES: &str = "custom-styles";
pub const WEBSITE: &str = "website";
pub const SOURCE_CODE: &str = "source-code";
pub const DONATE: &str = "donate";
pub const REPORT_ISSUE: &str = "report-issue";
pub const ABOUT: &str = "about";
pub const SHOW_SETTINGS: &str = "show-settings";
pub const SHOW_APP_DATA: &str = "show-app-data";
pub const DELETE_SETTINGS: &str = "delete-settings";
pub const DELETE_APP_DATA: &str = "delete-app-data";

pub const WEBSITE_URL: &str = "https://github.com/sindresorhus/caprine";
pub const SOURCE_CODE_URL: &str = "https://github.com/sindresorhus/caprine";
pub const DONATE_URL: &str = "https://github.com/sindresorhus/caprine?sponsor=1";

/// Platform and build-mode visibility filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    Always,
    MacOnly,
    NotMac,
    NotLinux,
    DevOnly,
}

impl Show {
    pub fn visible(self, platform: &PlatformProfile) -> bool {
        match self {
            Show::Always => true,
            Show::MacOnly => platform.is_macos(),
            Show::NotMac => !platform.is_macos(),
            Show::NotLinux => !platform.is_linux(),
            Show::DevOnly => platform.development,
        }
    }
}

/// Extra work after a boolean flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    None,
    RestartPrompt(&'static str),
    /// Tell the user how to bring the hidden menu bar back.
    AutoHideNotice,
    /// Launching minimized needs the tray icon to reach the window.
    LaunchMinimized,
}

/// A standalone checkbox bound to one boolean config key.
#[derive(Debug, PartialEq, Eq)]
pub struct Toggle {
    pub id: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub accelerator: Option<&'static str>,
    pub show: Show,
    /// False when the receiver of `dispatch` owns the state.
    pub persist: bool,
    pub dispatch: Option<Action>,
    pub gate: Option<Gate>,
    pub follow_up: FollowUp,
}

impl Toggle {
    const fn new(id: &'static str, key: &'static str, label: &'static str) -> Self {
        Self {
            id,
            key,
            label,
            accelerator: None,
            show: Show::Always,
            persist: true,
            dispatch: None,
            gate: None,
            follow_up: FollowUp::None,
        }
    }

    const fn show(mut self, show: Show) -> Self {
        self.show = show;
        self
    }

    const fn dispatch(mut self, action: Action) -> Self {
        self.dispatch = Some(action);
        self
    }

    const fn accelerator(mut self, accelerator: &'static str) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    const fn gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    const fn follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = follow_up;
        self
    }

    const fn unpersisted(mut self) -> Self {
        self.persist = false;
        self
    }
}

pub const BLOCK_CHAT_SEEN: Toggle =
    Toggle::new("block-chat-seen", "block.chatSeen", "Block Seen Indicator");
pub const BLOCK_TYPING: Toggle = Toggle::new(
    "block-typing-indicator",
    "block.typingIndicator",
    "Block Typing Indicator",
);
pub const BLOCK_DELIVERY: Toggle = Toggle::new(
    "block-delivery-receipts",
    "block.deliveryReceipt",
    "Block Delivery Receipts",
);

pub const PRIVACY_TOGGLES: &[Toggle] = &[BLOCK_CHAT_SEEN, BLOCK_TYPING, BLOCK_DELIVERY];

pub const ALWAYS_ON_TOP: Toggle = Toggle::new("always-on-top", "alwaysOnTop", "Always on Top")
    .accelerator("CommandOrControl+Shift+T")
    .gate(Gate::AlwaysOnTop)
    .dispatch(Action::SetAlwaysOnTop);

pub const SHOW_TRAY_ICON_TOGGLE: Toggle =
    Toggle::new("show-tray-icon", SHOW_TRAY_ICON, "Show Tray Icon").dispatch(Action::ToggleTrayIcon);

/// Preferences checkboxes that precede the launch-at-login item.
pub const PREFERENCE_TOGGLES: &[Toggle] = &[
    Toggle::new(
        "bounce-dock-on-message",
        "bounceDockOnMessage",
        "Bounce Dock on Message",
    )
    .show(Show::MacOnly),
    Toggle::new("video-autoplay", "autoplayVideos", "Autoplay Videos")
        .show(Show::DevOnly)
        .dispatch(Action::ToggleVideoAutoplay),
    Toggle::new(
        "notification-message-preview",
        "notificationMessagePreview",
        "Show Message Preview in Notifications",
    )
    .show(Show::DevOnly),
    Toggle::new(
        "mute-notifications",
        "notificationsMuted",
        "Mute Notifications",
    )
    .show(Show::DevOnly)
    .unpersisted()
    .dispatch(Action::ToggleMuteNotifications),
    Toggle::new("mute-call-ringtone", "callRingtoneMuted", "Mute Call Ringtone"),
    Toggle::new("show-unread-badge", "showUnreadBadge", "Show Unread Badge")
        .show(Show::DevOnly)
        .dispatch(Action::Reload),
    Toggle::new("spell-checker", SPELL_CHECKER, "Spell Checking").follow_up(
        FollowUp::RestartPrompt("Caprine needs to be restarted to enable or disable the spell checker."),
    ),
    Toggle::new(
        "hardware-acceleration",
        "hardwareAcceleration",
        "Hardware Acceleration",
    )
    .follow_up(FollowUp::RestartPrompt(
        "Caprine needs to be restarted to change hardware acceleration.",
    )),
    Toggle::new("menu-bar-mode", "menuBarMode", "Show Menu Bar Icon")
        .show(Show::MacOnly)
        .dispatch(Action::ToggleMenuBarMode),
    ALWAYS_ON_TOP,
];

/// Preferences checkboxes that follow the launch-at-login item.
pub const TRAILING_PREFERENCE_TOGGLES: &[Toggle] = &[
    Toggle::new("auto-hide-menu-bar", "autoHideMenuBar", "Auto Hide Menu Bar")
        .show(Show::NotMac)
        .dispatch(Action::SetAutoHideMenuBar)
        .follow_up(FollowUp::AutoHideNotice),
    Toggle::new("auto-update", "autoUpdate", "Auto Updates"),
    Toggle::new(
        "flash-window-on-message",
        "flashWindowOnMessage",
        "Flash Window on Message",
    )
    .show(Show::DevOnly),
    SHOW_TRAY_ICON_TOGGLE,
    Toggle::new("launch-minimized", LAUNCH_MINIMIZED, "Launch Minimized")
        .show(Show::NotMac)
        .follow_up(FollowUp::LaunchMinimized),
    Toggle::new("quit-on-window-close", "quitOnWindowClose", "Quit on Window Close"),
];

pub const PRIVATE_MODE: Toggle = Toggle::new("private-mode", "privateMode", "Hide Names and Avatars")
    .accelerator("CommandOrControl+Shift+N")
    .gate(Gate::PrivateMode)
    .dispatch(Action::SetPrivateMode);

pub const MESSAGE_BUTTONS: Toggle = Toggle::new(
    "show-message-buttons",
    "showMessageButtons",
    "Show Message Buttons",
)
.dispatch(Action::ToggleMessageButtons);

const TOGGLE_TABLES: &[&[Toggle]] = &[
    PRIVACY_TOGGLES,
    PREFERENCE_TOGGLES,
    TRAILING_PREFERENCE_TOGGLES,
    &[PRIVATE_MODE, MESSAGE_BUTTONS],
];

#[derive(Debug, PartialEq, Eq)]
pub struct ChoiceEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub value: &'static str,
    pub accelerator: Option<&'static str>,
}

/// Mutually exclusive checkboxes over one string key.
#[derive(Debug, PartialEq, Eq)]
pub struct ChoiceGroup {
    pub key: &'static str,
    pub default: &'static str,
    pub dispatch: Action,
    pub entries: &'static [ChoiceEntry],
}

impl ChoiceGroup {
    pub fn entry(&self, value: &str) -> Option<&'static ChoiceEntry> {
        self.entries.iter().find(|e| e.value == value)
    }
}

const fn choice(id: &'static str, label: &'static str, value: &'static str) -> ChoiceEntry {
    ChoiceEntry {
        id,
        label,
        value,
        accelerator: None,
    }
}

pub const THEME_GROUP: ChoiceGroup = ChoiceGroup {
    key: crate::config::THEME,
    default: "system",
    dispatch: Action::SetTheme,
    entries: &[
        choice("theme-system", "Follow System Appearance", "system"),
        choice("theme-light", "Light Mode", "light"),
        choice("theme-dark", "Dark Mode", "dark"),
    ],
};

pub const VIBRANCY_GROUP: ChoiceGroup = ChoiceGroup {
    key: crate::config::VIBRANCY,
    default: "sidebar",
    dispatch: Action::UpdateVibrancy,
    entries: &[
        choice("vibrancy-none", "No Vibrancy", "none"),
        choice("vibrancy-sidebar", "Sidebar-only Vibrancy", "sidebar"),
        choice("vibrancy-full", "Full-window Vibrancy", "full"),
    ],
};

pub const SIDEBAR_GROUP: ChoiceGroup = ChoiceGroup {
    key: crate::config::SIDEBAR,
    default: "default",
    dispatch: Action::UpdateSidebar,
    entries: &[
        choice("sidebar-default", "Adaptive Sidebar", "default"),
        ChoiceEntry {
            id: "sidebar-hidden",
            label: "Hide Sidebar",
            value: "hidden",
            accelerator: Some("CommandOrControl+Shift+S"),
        },
        choice("sidebar-narrow", "Narrow Sidebar", "narrow"),
        choice("sidebar-wide", "Wide Sidebar", "wide"),
    ],
};

pub const GROUPS: &[&ChoiceGroup] = &[&THEME_GROUP, &VIBRANCY_GROUP, &SIDEBAR_GROUP];

/// A plain item that only dispatches.
#[derive(Debug, PartialEq, Eq)]
pub struct Leaf {
    pub id: &'static str,
    pub label: &'static str,
    pub accelerator: Option<&'static str>,
    pub action: Action,
}

const fn leaf(
    id: &'static str,
    label: &'static str,
    accelerator: Option<&'static str>,
    action: Action,
) -> Leaf {
    Leaf {
        id,
        label,
        accelerator,
        action,
    }
}

pub const NEW_CONVERSATION: Leaf = leaf(
    "new-conversation",
    "New Conversation",
    Some("CommandOrControl+N"),
    Action::NewConversation,
);
pub const NEW_ROOM: Leaf = leaf(
    "new-room",
    "New Room",
    Some("CommandOrControl+O"),
    Action::NewRoom,
);
pub const LOG_OUT: Leaf = leaf("log-out", "Log Out", None, Action::LogOut);
pub const MAC_MESSENGER_PREFERENCES: Leaf = leaf(
    "messenger-preferences",
    "Messenger Preferences…",
    Some("Command+,"),
    Action::ShowPreferences,
);
pub const MESSENGER_SETTINGS: Leaf = leaf(
    "messenger-settings",
    "Messenger Settings",
    Some("Control+,"),
    Action::ShowPreferences,
);

pub const ZOOM_LEAVES: &[Leaf] = &[
    leaf(
        "zoom-reset",
        "Reset Text Size",
        Some("CommandOrControl+0"),
        Action::ZoomReset,
    ),
    leaf(
        "zoom-in",
        "Increase Text Size",
        Some("CommandOrControl+="),
        Action::ZoomIn,
    ),
    leaf(
        "zoom-out",
        "Decrease Text Size",
        Some("CommandOrControl+-"),
        Action::ZoomOut,
    ),
];

pub const VIEW_SWITCH_LEAVES: &[Leaf] = &[
    leaf("show-chats-view", "Show Main Chats", None, Action::ShowChatsView),
    leaf(
        "show-marketplace-view",
        "Show Marketplace Chats",
        None,
        Action::ShowMarketplaceView,
    ),
    leaf(
        "show-requests-view",
        "Show Message Requests",
        None,
        Action::ShowRequestsView,
    ),
    leaf(
        "show-archive-view",
        "Show Archived Chats",
        None,
        Action::ShowArchiveView,
    ),
];

pub const CONVERSATION_LEAVES: &[Leaf] = &[
    leaf(
        "mute-conversation",
        "Mute Conversation",
        Some("CommandOrControl+Shift+M"),
        Action::MuteConversation,
    ),
    leaf(
        "archive-conversation",
        "Archive Conversation",
        Some("CommandOrControl+Shift+H"),
        Action::ArchiveConversation,
    ),
    leaf(
        "delete-conversation",
        "Delete Conversation",
        Some("CommandOrControl+Shift+D"),
        Action::DeleteConversation,
    ),
    leaf(
        "next-conversation",
        "Select Next Conversation",
        Some("Control+Tab"),
        Action::NextConversation,
    ),
    leaf(
        "previous-conversation",
        "Select Previous Conversation",
        Some("Control+Shift+Tab"),
        Action::PreviousConversation,
    ),
    leaf(
        "find",
        "Find Conversation",
        Some("CommandOrControl+K"),
        Action::Find,
    ),
    leaf(
        "search",
        "Search in Conversation",
        Some("CommandOrControl+F"),
        Action::Search,
    ),
    leaf(
        "insert-gif",
        "Insert GIF",
        Some("CommandOrControl+G"),
        Action::InsertGif,
    ),
    leaf(
        "insert-sticker",
        "Insert Sticker",
        Some("CommandOrControl+S"),
        Action::InsertSticker,
    ),
    leaf(
        "insert-emoji",
        "Insert Emoji",
        Some("CommandOrControl+E"),
        Action::InsertEmoji,
    ),
    leaf(
        "attach-files",
        "Attach Files",
        Some("CommandOrControl+T"),
        Action::AttachFiles,
    ),
    leaf(
        "focus-text-input",
        "Focus Text Input",
        Some("CommandOrControl+I"),
        Action::FocusTextInput,
    ),
];

const LEAF_TABLES: &[&[Leaf]] = &[
    &[
        NEW_CONVERSATION,
        NEW_ROOM,
        LOG_OUT,
        MAC_MESSENGER_PREFERENCES,
        MESSENGER_SETTINGS,
    ],
    ZOOM_LEAVES,
    VIEW_SWITCH_LEAVES,
    CONVERSATION_LEAVES,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Action),
    Choose {
        group: &'static ChoiceGroup,
        value: &'static str,
    },
    Toggle(&'static Toggle),
    ToggleLoginItem,
    SwitchWorkChat(bool),
    Restart,
    CustomStyles,
    OpenUrl(&'static str),
    ReportIssue,
    About,
    ShowSettings,
    ShowAppData,
    DeleteSettings,
    DeleteAppData,
    /// An item from an externally supplied submenu.
    External(String),
}

pub fn decode(id: &str) -> Command {
    for table in LEAF_TABLES {
        if let Some(leaf) = table.iter().find(|l| l.id == id) {
            return Command::Dispatch(leaf.action);
        }
    }

    for group in GROUPS {
        if let Some(entry) = group.entries.iter().find(|e| e.id == id) {
            return Command::Choose {
                group: *group,
                value: entry.value,
            };
        }
    }

    if let Some(toggle) = find_toggle(id) {
        return Command::Toggle(toggle);
    }

    match id {
        SWITCH_TO_WORK_CHAT => Command::SwitchWorkChat(true),
        SWITCH_TO_MESSENGER => Command::SwitchWorkChat(false),
        RESTART => Command::Restart,
        LAUNCH_AT_LOGIN => Command::ToggleLoginItem,
        CUSTOM_STYLES => Command::CustomStyles,
        WEBSITE => Command::OpenUrl(WEBSITE_URL),
        SOURCE_CODE => Command::OpenUrl(SOURCE_CODE_URL),
        DONATE => Command::OpenUrl(DONATE_URL),
        REPORT_ISSUE => Command::ReportIssue,
        ABOUT => Command::About,
        SHOW_SETTINGS => Command::ShowSettings,
        SHOW_APP_DATA => Command::ShowAppData,
        DELETE_SETTINGS => Command::DeleteSettings,
        DELETE_APP_DATA => Command::DeleteAppData,
        other => Command::External(other.to_string()),
    }
}

pub fn find_toggle(id: &str) -> Option<&'static Toggle> {
    TOGGLE_TABLES
        .iter()
        .flat_map(|table| table.iter())
        .find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_decode_leaf() {
        assert_eq!(
            decode("new-conversation"),
            Command::Dispatch(Action::NewConversation)
        );
        assert_eq!(decode("zoom-in"), Command::Dispatch(Action::ZoomIn));
    }

    #[test]
    fn test_decode_choice() {
        match decode("theme-dark") {
            Command::Choose { group, value } => {
                assert_eq!(group.key, "theme");
                assert_eq!(value, "dark");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_toggle_and_fixed() {
        assert!(matches!(decode("always-on-top"), Command::Toggle(t) if t.gate == Some(Gate::AlwaysOnTop)));
        assert_eq!(decode(LAUNCH_AT_LOGIN), Command::ToggleLoginItem);
        assert_eq!(decode(DONATE), Command::OpenUrl(DONATE_URL));
        assert_eq!(
            decode("emoji-native"),
            Command::External("emoji-native".to_string())
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = HashSet::new();
        let leaf_ids = LEAF_TABLES.iter().flat_map(|t| t.iter()).map(|l| l.id);
        let toggle_ids = TOGGLE_TABLES.iter().flat_map(|t| t.iter()).map(|t| t.id);
        let choice_ids = GROUPS.iter().flat_map(|g| g.entries.iter()).map(|e| e.id);
        let fixed = [
            SWITCH_TO_WORK_CHAT,
            SWITCH_TO_MESSENGER,
            RESTART,
            LAUNCH_AT_LOGIN,
            CUSTOM_STYLES,
            WEBSITE,
            SOURCE_CODE,
            DONATE,
            REPORT_ISSUE,
            ABOUT,
            SHOW_SETTINGS,
            SHOW_APP_DATA,
            DELETE_SETTINGS,
            DELETE_APP_DATA,
        ];
        for id in leaf_ids
            .chain(toggle_ids)
            .chain(choice_ids)
            .chain(fixed)
        {
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }

    #[test]
    fn test_group_defaults_are_entries() {
        for group in GROUPS {
            assert!(group.entry(group.default).is_some());
        }
    }

    #[test]
    fn test_show_filters() {
        use crate::platform::Os;
        let mac = PlatformProfile::new(Os::MacOs, false);
        let linux = PlatformProfile::new(Os::Linux, true);
        assert!(Show::MacOnly.visible(&mac));
        assert!(!Show::NotMac.visible(&mac));
        assert!(!Show::NotLinux.visible(&linux));
        assert!(Show::DevOnly.visible(&linux));
        assert!(!Show::DevOnly.visible(&mac));
    }
}
