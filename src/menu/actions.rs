use std::fmt;

use tracing::info;

/// Named events delivered to the active window or web view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NewConversation,
    NewRoom,
    LogOut,
    ShowPreferences,
    UpdateVibrancy,
    SetTheme,
    UpdateSidebar,
    ToggleVideoAutoplay,
    ToggleMuteNotifications,
    Reload,
    ZoomReset,
    ZoomIn,
    ZoomOut,
    SetPrivateMode,
    ToggleMessageButtons,
    ShowChatsView,
    ShowMarketplaceView,
    ShowRequestsView,
    ShowArchiveView,
    MuteConversation,
    ArchiveConversation,
    DeleteConversation,
    NextConversation,
    PreviousConversation,
    Find,
    Search,
    InsertGif,
    InsertSticker,
    InsertEmoji,
    AttachFiles,
    FocusTextInput,
    // Window-level; the receiver reads the new value from the config store.
    SetAlwaysOnTop,
    SetAutoHideMenuBar,
    ToggleTrayIcon,
    ToggleMenuBarMode,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::NewConversation => "new-conversation",
            Action::NewRoom => "new-room",
            Action::LogOut => "log-out",
            Action::ShowPreferences => "show-preferences",
            Action::UpdateVibrancy => "update-vibrancy",
            Action::SetTheme => "set-theme",
            Action::UpdateSidebar => "update-sidebar",
            Action::ToggleVideoAutoplay => "toggle-video-autoplay",
            Action::ToggleMuteNotifications => "toggle-mute-notifications",
            Action::Reload => "reload",
            Action::ZoomReset => "zoom-reset",
            Action::ZoomIn => "zoom-in",
            Action::ZoomOut => "zoom-out",
            Action::SetPrivateMode => "set-private-mode",
            Action::ToggleMessageButtons => "toggle-message-buttons",
            Action::ShowChatsView => "show-chats-view",
            Action::ShowMarketplaceView => "show-marketplace-view",
            Action::ShowRequestsView => "show-requests-view",
            Action::ShowArchiveView => "show-archive-view",
            Action::MuteConversation => "mute-conversation",
            Action::ArchiveConversation => "archive-conversation",
            Action::DeleteConversation => "delete-conversation",
            Action::NextConversation => "next-conversation",
            Action::PreviousConversation => "previous-conversation",
            Action::Find => "find",
            Action::Search => "search",
            Action::InsertGif => "insert-gif",
            Action::InsertSticker => "insert-sticker",
            Action::InsertEmoji => "insert-emoji",
            Action::AttachFiles => "attach-files",
            Action::FocusTextInput => "focus-text-input",
            Action::SetAlwaysOnTop => "set-always-on-top",
            Action::SetAutoHideMenuBar => "set-auto-hide-menu-bar",
            Action::ToggleTrayIcon => "toggle-tray-icon",
            Action::ToggleMenuBarMode => "toggle-menu-bar-mode",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fire-and-forget delivery of [`Action`]s.
pub trait ActionDispatcher {
    fn send(&mut self, action: Action);
}

/// Dispatcher for hosts without a web view attached: records the action in
/// the log only.
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl ActionDispatcher for LogDispatcher {
    fn send(&mut self, action: Action) {
        info!(action = action.name(), "dispatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_are_kebab_case() {
        for action in [
            Action::NewConversation,
            Action::ToggleMuteNotifications,
            Action::SetPrivateMode,
            Action::SetAlwaysOnTop,
        ] {
            let name = action.name();
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
            assert_eq!(action.to_string(), name);
        }
    }
}
