//! Native menu bar installers and the event loops that drive them.

use anyhow::Result;
use tracing::warn;

use crate::menu::confirm::ConfirmationPrompt;
use crate::menu::host::{MenuHost, MenuInstaller};

#[cfg(target_os = "macos")]
mod macos;
#[cfg(windows)]
mod win32;

pub use muda::accelerator::{Accelerator, Code, Modifiers};

/// Parses an accelerator such as `CommandOrControl+Shift+T`.
/// `CommandOrControl` resolves to Command on macOS and Control elsewhere.
pub fn parse_accelerator(s: &str) -> Option<Accelerator> {
    match s.parse::<Accelerator>() {
        Ok(acc) => Some(acc),
        Err(e) => {
            warn!(accelerator = s, error = %e, "ignoring accelerator");
            None
        }
    }
}

/// True when the accelerator needs the Command (Windows) key.
pub fn uses_command(acc: &Accelerator) -> bool {
    acc.modifiers().intersects(Modifiers::META | Modifiers::SUPER)
}

/// The character a key produces without modifiers: uppercase letters,
/// digits, `,` `=` `-` `.` and tab.
pub fn key_char(code: Code) -> Option<char> {
    let name = code.to_string();
    if let Some(rest) = name
        .strip_prefix("Key")
        .or_else(|| name.strip_prefix("Digit"))
    {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };
    }
    match code {
        Code::Comma => Some(','),
        Code::Equal => Some('='),
        Code::Minus => Some('-'),
        Code::Period => Some('.'),
        Code::Tab => Some('\t'),
        _ => None,
    }
}

/// Text shown after a tab in a Windows menu item, e.g. `Ctrl+Shift+T`.
pub fn windows_label(acc: &Accelerator) -> Option<String> {
    let mods = acc.modifiers();
    let mut parts = Vec::new();
    if mods.contains(Modifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if uses_command(acc) {
        parts.push("Win".to_string());
    }
    if mods.contains(Modifiers::ALT) {
        parts.push("Alt".to_string());
    }
    if mods.contains(Modifiers::SHIFT) {
        parts.push("Shift".to_string());
    }
    parts.push(match key_char(acc.key())? {
        '\t' => "Tab".to_string(),
        c => c.to_string(),
    });
    Some(parts.join("+"))
}

/// Runs the native menu bar until the user quits. `make_host` receives the
/// platform's installer and dialog implementation.
pub fn run<F>(make_host: F) -> Result<()>
where
    F: FnOnce(Box<dyn MenuInstaller>, Box<dyn ConfirmationPrompt>) -> Result<MenuHost>,
{
    #[cfg(target_os = "macos")]
    {
        return macos::run(make_host);
    }

    #[cfg(windows)]
    {
        return win32::run(make_host);
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    {
        let _ = make_host;
        anyhow::bail!("The native menu bar is only supported on macOS and Windows");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::menu::builder::MenuBuilder;
    use crate::platform::{Os, PlatformProfile};
    use crate::snapshot::ConfigSnapshot;

    #[test]
    fn test_parse_accelerator() {
        let acc = parse_accelerator("Control+Shift+T").unwrap();
        assert!(acc.modifiers().contains(Modifiers::CONTROL | Modifiers::SHIFT));
        assert_eq!(acc.key(), Code::KeyT);
        assert_eq!(windows_label(&acc).as_deref(), Some("Ctrl+Shift+T"));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_command_or_control_is_control_off_macos() {
        let acc = parse_accelerator("CommandOrControl+Shift+T").unwrap();
        assert!(!uses_command(&acc));
        assert_eq!(windows_label(&acc).as_deref(), Some("Ctrl+Shift+T"));
    }

    #[test]
    fn test_punctuation_and_named_keys() {
        let label = |s| windows_label(&parse_accelerator(s).unwrap());
        assert_eq!(label("Control+,").as_deref(), Some("Ctrl+,"));
        assert_eq!(label("Control+=").as_deref(), Some("Ctrl+="));
        assert_eq!(label("Control+-").as_deref(), Some("Ctrl+-"));
        assert_eq!(label("Control+0").as_deref(), Some("Ctrl+0"));
        assert_eq!(label("Control+Shift+Tab").as_deref(), Some("Ctrl+Shift+Tab"));
        assert!(uses_command(&parse_accelerator("Command+,").unwrap()));
    }

    #[test]
    fn test_parse_rejects_unknown_modifier() {
        assert!(parse_accelerator("Banana+K").is_none());
    }

    #[test]
    fn test_every_menu_accelerator_maps_to_a_key() {
        let store = MemoryStore::new();
        let snap = ConfigSnapshot::capture(&store, false);
        for os in [Os::MacOs, Os::Windows, Os::Linux] {
            let root = MenuBuilder::new(PlatformProfile::new(os, true)).build(&snap);
            for node in root.walk() {
                if let Some(text) = &node.accelerator {
                    let acc = parse_accelerator(text)
                        .unwrap_or_else(|| panic!("{} has bad accelerator {text}", node.id));
                    assert!(key_char(acc.key()).is_some(), "{text}");
                }
            }
        }
    }
}
