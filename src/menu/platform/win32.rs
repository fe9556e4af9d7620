use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Input::KeyboardAndMouse::{
                GetFocus, GetKeyState, VK_OEM_COMMA, VK_OEM_MINUS, VK_OEM_PERIOD, VK_OEM_PLUS,
                VK_SHIFT, VK_TAB,
            },
            WindowsAndMessaging::{
                AppendMenuW, CreateAcceleratorTableW, CreateMenu, CreatePopupMenu, CreateWindowExW, DefWindowProcW,
                DestroyAcceleratorTable, DestroyMenu, DestroyWindow, DispatchMessageW, DrawMenuBar, GetMessageW,
                GetWindowLongPtrW, MessageBoxW, PostQuitMessage, RegisterClassW, SendMessageW,
                SetMenu, SetWindowLongPtrW, ShowWindow, TranslateAcceleratorW, TranslateMessage,
                ACCEL, ACCEL_VIRT_FLAGS, CW_USEDEFAULT, FALT, FCONTROL, FSHIFT, FVIRTKEY,
                GWLP_USERDATA, HACCEL, HMENU, IDNO, IDYES, MB_ICONINFORMATION, MB_ICONQUESTION, MB_OK,
                MB_YESNO, MENU_ITEM_FLAGS, MF_CHECKED, MF_GRAYED, MF_POPUP, MF_SEPARATOR,
                MF_STRING, MSG, SW_MINIMIZE, SW_SHOWNORMAL, WM_CLEAR, WM_COMMAND, WM_COPY,
                WM_CUT, WM_DESTROY, WM_NCDESTROY, WM_PASTE, WM_UNDO, WNDCLASSW,
                WS_OVERLAPPEDWINDOW,
            },
        },
    },
};

use super::{key_char, parse_accelerator, uses_command, windows_label, Accelerator, Modifiers};
use crate::menu::confirm::{ConfirmationPrompt, ConfirmationRequest, ConfirmationResponse};
use crate::menu::host::{MenuHost, MenuInstaller};
use crate::menu::model::ClickEvent;
use crate::menu::node::{MenuNode, NodeKind, Role};
use crate::platform::win32::wide;

const CMD_BASE: usize = 1000;

/// What a WM_COMMAND id stands for in the installed menu.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Item(String),
    Edit(u32),
    Minimize,
    Close,
    Quit,
}

type Slots = Rc<RefCell<Vec<Slot>>>;

/// Command slots and keyboard shortcuts collected while building one menu.
#[derive(Default)]
struct Table {
    slots: Vec<Slot>,
    accels: Vec<ACCEL>,
}

struct State {
    host: MenuHost,
    slots: Slots,
}

pub(super) fn run<F>(make_host: F) -> Result<()>
where
    F: FnOnce(Box<dyn MenuInstaller>, Box<dyn ConfirmationPrompt>) -> Result<MenuHost>,
{
    unsafe {
        let hinstance = HINSTANCE(GetModuleHandleW(None).context("GetModuleHandleW")?.0);

        let class_name = w!("caprine.menu-window");
        let wc = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: hinstance,
            lpszClassName: class_name,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(anyhow!("RegisterClassW failed"));
        }

        let hwnd = CreateWindowExW(
            Default::default(),
            class_name,
            w!("Caprine"),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            960,
            640,
            None,
            None,
            Some(hinstance),
            None,
        )
        .context("CreateWindowExW")?;

        let slots = Slots::default();
        let accel = Rc::new(Cell::new(HACCEL::default()));
        let installer = NativeMenu {
            hwnd,
            slots: Rc::clone(&slots),
            accel: Rc::clone(&accel),
            current: None,
        };
        let mut host = make_host(Box::new(installer), Box::new(MessageBoxPrompt { hwnd }))?;
        host.refresh().context("install application menu")?;

        // The window owns the state from here on and frees it on WM_NCDESTROY.
        let state = Box::into_raw(Box::new(State { host, slots }));
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, state as isize);

        let _ = ShowWindow(hwnd, SW_SHOWNORMAL);
        info!("menu bar running");

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).into() {
            let table = accel.get();
            if table.is_invalid() || TranslateAcceleratorW(hwnd, table, &msg) == 0 {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
    Ok(())
}

/// Builds a fresh HMENU tree and accelerator table per install and swaps
/// both onto the window.
struct NativeMenu {
    hwnd: HWND,
    slots: Slots,
    accel: Rc<Cell<HACCEL>>,
    current: Option<HMENU>,
}

impl MenuInstaller for NativeMenu {
    fn install(&mut self, root: &MenuNode) -> Result<()> {
        let mut table = Table::default();
        unsafe {
            let bar = CreateMenu().context("CreateMenu")?;
            if let Err(e) = append_children(bar, &root.children, &mut table) {
                let _ = DestroyMenu(bar);
                return Err(e);
            }

            let accel = if table.accels.is_empty() {
                HACCEL::default()
            } else {
                match CreateAcceleratorTableW(&table.accels) {
                    Ok(accel) => accel,
                    Err(e) => {
                        let _ = DestroyMenu(bar);
                        return Err(e).context("CreateAcceleratorTableW");
                    }
                }
            };

            if let Err(e) = SetMenu(self.hwnd, Some(bar)) {
                let _ = DestroyMenu(bar);
                if !accel.is_invalid() {
                    let _ = DestroyAcceleratorTable(accel);
                }
                return Err(e).context("SetMenu");
            }
            let _ = DrawMenuBar(self.hwnd);

            if let Some(old) = self.current.replace(bar) {
                let _ = DestroyMenu(old);
            }
            let old = self.accel.replace(accel);
            if !old.is_invalid() {
                let _ = DestroyAcceleratorTable(old);
            }
        }
        *self.slots.borrow_mut() = table.slots;
        Ok(())
    }
}

unsafe fn append_children(menu: HMENU, children: &[MenuNode], table: &mut Table) -> Result<()> {
    for node in children.iter().filter(|n| n.visible) {
        match &node.kind {
            NodeKind::Separator => {
                AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null())
                    .context("AppendMenuW(separator)")?;
            }
            NodeKind::Submenu => append_popup(menu, &node.label, &node.children, table)?,
            NodeKind::Action | NodeKind::Checkbox { .. } => {
                let mut flags = MF_STRING;
                if node.checked() == Some(true) {
                    flags |= MF_CHECKED;
                }
                if !node.enabled {
                    flags |= MF_GRAYED;
                }
                let acc = node.accelerator.as_deref().and_then(parse_accelerator);
                let label = item_label(&node.label, acc.as_ref());
                let cmd = append_slot(menu, flags, &label, Slot::Item(node.id.clone()), table)?;
                // Disabled items keep their label hint but not the shortcut.
                if let Some(entry) = acc.filter(|_| node.enabled).and_then(|a| accel_entry(&a, cmd)) {
                    table.accels.push(entry);
                }
            }
            NodeKind::Role { role } => append_role(menu, node, *role, table)?,
        }
    }
    Ok(())
}

unsafe fn append_role(
    menu: HMENU,
    node: &MenuNode,
    role: Role,
    table: &mut Table,
) -> Result<()> {
    match role {
        Role::Quit => {
            // Alt+F4 reaches the window through the system menu.
            let label = format!("{}\tAlt+F4", node.label);
            append_slot(menu, MF_STRING, &label, Slot::Quit, table).map(drop)
        }
        Role::Close => append_slot(menu, MF_STRING, &node.label, Slot::Close, table).map(drop),
        Role::EditMenu if node.children.is_empty() => {
            let popup = CreatePopupMenu().context("CreatePopupMenu")?;
            for (label, msg) in [
                ("Undo\tCtrl+Z", WM_UNDO),
                ("Cut\tCtrl+X", WM_CUT),
                ("Copy\tCtrl+C", WM_COPY),
                ("Paste\tCtrl+V", WM_PASTE),
                ("Delete\tDel", WM_CLEAR),
            ] {
                append_slot(popup, MF_STRING, label, Slot::Edit(msg), table)?;
            }
            append_popup_handle(menu, popup, &node.label)
        }
        Role::WindowMenu if node.children.is_empty() => {
            let popup = CreatePopupMenu().context("CreatePopupMenu")?;
            append_slot(popup, MF_STRING, "Minimize", Slot::Minimize, table)?;
            append_slot(popup, MF_STRING, "Close", Slot::Close, table)?;
            append_popup_handle(menu, popup, &node.label)
        }
        Role::AppMenu
        | Role::FileMenu
        | Role::EditMenu
        | Role::ViewMenu
        | Role::WindowMenu
        | Role::Help => append_popup(menu, &node.label, &node.children, table),
        // Application-level roles with no Win32 counterpart.
        Role::About | Role::Services | Role::Hide | Role::HideOthers | Role::Unhide => Ok(()),
    }
}

unsafe fn append_popup(
    menu: HMENU,
    label: &str,
    children: &[MenuNode],
    table: &mut Table,
) -> Result<()> {
    let popup = CreatePopupMenu().context("CreatePopupMenu")?;
    append_children(popup, children, table)?;
    append_popup_handle(menu, popup, label)
}

unsafe fn append_popup_handle(menu: HMENU, popup: HMENU, label: &str) -> Result<()> {
    let wlabel = wide(label);
    AppendMenuW(
        menu,
        MF_STRING | MF_POPUP,
        popup.0 as usize,
        PCWSTR::from_raw(wlabel.as_ptr()),
    )
    .with_context(|| format!("AppendMenuW(popup:{label})"))
}

unsafe fn append_slot(
    menu: HMENU,
    flags: MENU_ITEM_FLAGS,
    label: &str,
    slot: Slot,
    table: &mut Table,
) -> Result<u16> {
    let cmd = CMD_BASE + table.slots.len();
    let id = u16::try_from(cmd).context("too many menu items")?;
    let wlabel = wide(label);
    AppendMenuW(menu, flags, cmd, PCWSTR::from_raw(wlabel.as_ptr()))
        .with_context(|| format!("AppendMenuW({label})"))?;
    table.slots.push(slot);
    Ok(id)
}

fn item_label(label: &str, accelerator: Option<&Accelerator>) -> String {
    match accelerator.and_then(windows_label) {
        Some(hint) => format!("{label}\t{hint}"),
        None => label.to_string(),
    }
}

fn virtual_key(acc: &Accelerator) -> Option<u16> {
    let key = match key_char(acc.key())? {
        c @ ('A'..='Z' | '0'..='9') => c as u16,
        ',' => VK_OEM_COMMA.0,
        '=' => VK_OEM_PLUS.0,
        '-' => VK_OEM_MINUS.0,
        '.' => VK_OEM_PERIOD.0,
        '\t' => VK_TAB.0,
        _ => return None,
    };
    Some(key)
}

/// A WM_COMMAND shortcut for `cmd`. Chords that need the Windows key are
/// left to the shell.
fn accel_entry(acc: &Accelerator, cmd: u16) -> Option<ACCEL> {
    if uses_command(acc) {
        return None;
    }
    let mods = acc.modifiers();
    let mut flags = FVIRTKEY.0;
    if mods.contains(Modifiers::CONTROL) {
        flags |= FCONTROL.0;
    }
    if mods.contains(Modifiers::SHIFT) {
        flags |= FSHIFT.0;
    }
    if mods.contains(Modifiers::ALT) {
        flags |= FALT.0;
    }
    Some(ACCEL {
        fVirt: ACCEL_VIRT_FLAGS(flags),
        key: virtual_key(acc)?,
        cmd,
    })
}

struct MessageBoxPrompt {
    hwnd: HWND,
}

impl ConfirmationPrompt for MessageBoxPrompt {
    // MessageBoxW offers neither custom button titles nor a suppression
    // checkbox; Yes/No stand in for the two buttons.
    fn show(&mut self, request: &ConfirmationRequest) -> ConfirmationResponse {
        let mut text = request.message.clone();
        if let Some(detail) = &request.detail {
            text.push_str("\n\n");
            text.push_str(detail);
        }
        let wtext = wide(&text);
        let answer = unsafe {
            MessageBoxW(
                Some(self.hwnd),
                PCWSTR::from_raw(wtext.as_ptr()),
                w!("Caprine"),
                MB_YESNO | MB_ICONQUESTION,
            )
        };
        let index = if answer == IDYES {
            Some(0)
        } else if answer == IDNO {
            Some(1)
        } else {
            None
        };
        ConfirmationResponse::from_button(index, false)
    }

    fn notify(&mut self, message: &str) {
        let wtext = wide(message);
        unsafe {
            let _ = MessageBoxW(
                Some(self.hwnd),
                PCWSTR::from_raw(wtext.as_ptr()),
                w!("Caprine"),
                MB_OK | MB_ICONINFORMATION,
            );
        }
    }
}

unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_COMMAND => {
            let state = get_state(hwnd);
            if state.is_null() {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            }
            let state = &mut *state;

            let cmd = wparam.0 & 0xffff;
            let slot = cmd
                .checked_sub(CMD_BASE)
                .and_then(|i| state.slots.borrow().get(i).cloned());
            if let Some(slot) = slot {
                handle_slot(hwnd, state, slot);
                return LRESULT(0);
            }
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            return LRESULT(0);
        }
        WM_NCDESTROY => {
            let state = get_state(hwnd);
            if !state.is_null() {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                drop(Box::from_raw(state));
            }
        }
        _ => {}
    }

    DefWindowProcW(hwnd, msg, wparam, lparam)
}

unsafe fn handle_slot(hwnd: HWND, state: &mut State, slot: Slot) {
    match slot {
        Slot::Item(id) => {
            let event = ClickEvent {
                shift: GetKeyState(VK_SHIFT.0 as i32) < 0,
            };
            if let Err(e) = state.host.click(&id, event) {
                warn!(id = %id, error = %e, "menu click failed");
            }
        }
        Slot::Edit(msg) => {
            let focus = GetFocus();
            if !focus.is_invalid() {
                let _ = SendMessageW(focus, msg, None, None);
            }
        }
        Slot::Minimize => {
            let _ = ShowWindow(hwnd, SW_MINIMIZE);
        }
        Slot::Close | Slot::Quit => {
            let _ = DestroyWindow(hwnd);
        }
    }
}

fn get_state(hwnd: HWND) -> *mut State {
    unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut State }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_label_appends_accelerator() {
        let acc = parse_accelerator("CommandOrControl+Shift+T");
        assert_eq!(
            item_label("Always on Top", acc.as_ref()),
            "Always on Top\tCtrl+Shift+T"
        );
        assert_eq!(item_label("Log Out", None), "Log Out");
    }

    #[test]
    fn test_accel_entry_matches_chord() {
        let acc = parse_accelerator("CommandOrControl+Shift+T").unwrap();
        let entry = accel_entry(&acc, 1007).unwrap();
        assert_eq!(entry.key, u16::from(b'T'));
        assert_eq!(entry.cmd, 1007);
        assert_eq!(entry.fVirt.0, FVIRTKEY.0 | FCONTROL.0 | FSHIFT.0);

        let zoom = accel_entry(&parse_accelerator("CommandOrControl+=").unwrap(), 1).unwrap();
        assert_eq!(zoom.key, VK_OEM_PLUS.0);
        let tab = accel_entry(&parse_accelerator("Control+Shift+Tab").unwrap(), 2).unwrap();
        assert_eq!(tab.key, VK_TAB.0);
    }

    #[test]
    fn test_windows_key_chords_are_skipped() {
        let acc = parse_accelerator("Command+,").unwrap();
        assert!(accel_entry(&acc, 1).is_none());
    }
}
