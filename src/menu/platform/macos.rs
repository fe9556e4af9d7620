use std::{
    ffi::{c_void, CStr},
    os::raw::c_char,
    ptr,
    sync::Once,
};

use anyhow::{Context, Result};
use cocoa::{
    appkit::{NSApp, NSApplication, NSApplicationActivationPolicyRegular},
    base::{id, nil},
    foundation::{NSAutoreleasePool, NSInteger, NSString, NSUInteger},
};
use objc::{
    class,
    declare::ClassDecl,
    msg_send,
    runtime::{Class, Object, Sel, NO, YES},
    sel, sel_impl,
};
use tracing::{info, warn};

use super::{key_char, parse_accelerator, uses_command, Modifiers};
use crate::menu::confirm::{ConfirmationPrompt, ConfirmationRequest, ConfirmationResponse};
use crate::menu::host::{MenuHost, MenuInstaller};
use crate::menu::model::ClickEvent;
use crate::menu::node::{MenuNode, NodeKind, Role};

const TARGET_CLASS: &str = "CaprineMenuTarget";

const MENU_STATE_OFF: NSInteger = 0;
const MENU_STATE_ON: NSInteger = 1;

const SHIFT_MASK: NSUInteger = 1 << 17;
const CONTROL_MASK: NSUInteger = 1 << 18;
const OPTION_MASK: NSUInteger = 1 << 19;
const COMMAND_MASK: NSUInteger = 1 << 20;

const ALERT_FIRST_BUTTON: NSInteger = 1000;
const ALERT_SECOND_BUTTON: NSInteger = 1001;

struct State {
    host: MenuHost,
}

pub(super) fn run<F>(make_host: F) -> Result<()>
where
    F: FnOnce(Box<dyn MenuInstaller>, Box<dyn ConfirmationPrompt>) -> Result<MenuHost>,
{
    unsafe {
        let _pool = NSAutoreleasePool::new(nil);

        let app = NSApp();
        app.setActivationPolicy_(NSApplicationActivationPolicyRegular);

        let target = new_target();
        let mut host = make_host(Box::new(NativeMenu { target }), Box::new(AlertPrompt))?;
        host.refresh().context("install application menu")?;

        let mut state = Box::new(State { host });
        (*target).set_ivar("state_ptr", &mut *state as *mut State as *mut c_void);

        info!("menu bar running");
        app.activateIgnoringOtherApps_(YES);
        app.run();

        (*target).set_ivar("state_ptr", ptr::null_mut::<c_void>());
        drop(state);
    }

    Ok(())
}

/// Replaces the application's main menu with a freshly built NSMenu.
struct NativeMenu {
    target: id,
}

impl MenuInstaller for NativeMenu {
    fn install(&mut self, root: &MenuNode) -> Result<()> {
        unsafe {
            // Objects built here are autoreleased; NSApp retains what it keeps.
            let pool = NSAutoreleasePool::new(nil);
            let menu = build_menu(&root.children, "Caprine", self.target);
            let app = NSApp();
            let _: () = msg_send![app, setMainMenu: menu];
            pool.drain();
        }
        Ok(())
    }
}

unsafe fn nsstring(s: &str) -> id {
    NSString::alloc(nil).init_str(s).autorelease()
}

unsafe fn rust_string(ns: id) -> Option<String> {
    if ns == nil {
        return None;
    }
    let bytes: *const c_char = msg_send![ns, UTF8String];
    if bytes.is_null() {
        return None;
    }
    Some(CStr::from_ptr(bytes).to_string_lossy().into_owned())
}

unsafe fn new_menu(title: &str) -> id {
    let menu: id = msg_send![class!(NSMenu), alloc];
    let menu: id = msg_send![menu, initWithTitle: nsstring(title)];
    let _: () = msg_send![menu, setAutoenablesItems: NO];
    menu.autorelease()
}

unsafe fn build_menu(children: &[MenuNode], title: &str, target: id) -> id {
    let menu = new_menu(title);
    for node in children.iter().filter(|n| n.visible) {
        let item = match &node.kind {
            NodeKind::Separator => msg_send![class!(NSMenuItem), separatorItem],
            NodeKind::Submenu => {
                submenu_item(&node.label, build_menu(&node.children, &node.label, target))
            }
            NodeKind::Role { role } => role_item(node, *role, target),
            NodeKind::Action | NodeKind::Checkbox { .. } => command_item(node, target),
        };
        let _: () = msg_send![menu, addItem: item];
    }
    menu
}

unsafe fn submenu_item(title: &str, submenu: id) -> id {
    let item: id = msg_send![class!(NSMenuItem), alloc];
    let no_action = Sel::from_ptr(ptr::null());
    let item: id =
        msg_send![item, initWithTitle: nsstring(title) action: no_action keyEquivalent: nsstring("")];
    let _: () = msg_send![item, setSubmenu: submenu];
    item.autorelease()
}

unsafe fn command_item(node: &MenuNode, target: id) -> id {
    let (key, mask) = key_equivalent(node.accelerator.as_deref());
    let item: id = msg_send![class!(NSMenuItem), alloc];
    let item: id = msg_send![
        item,
        initWithTitle: nsstring(&node.label)
        action: sel!(onMenuItem:)
        keyEquivalent: nsstring(&key)
    ];
    let _: () = msg_send![item, setKeyEquivalentModifierMask: mask];
    let _: () = msg_send![item, setTarget: target];
    let _: () = msg_send![item, setRepresentedObject: nsstring(&node.id)];
    let _: () = msg_send![item, setEnabled: if node.enabled { YES } else { NO }];

    if let Some(checked) = node.checked() {
        let state = if checked { MENU_STATE_ON } else { MENU_STATE_OFF };
        let _: () = msg_send![item, setState: state];
    }
    item.autorelease()
}

/// An item whose selector travels the responder chain.
unsafe fn standard_item(title: &str, action: Sel, key: &str, mask: NSUInteger) -> id {
    let item: id = msg_send![class!(NSMenuItem), alloc];
    let item: id =
        msg_send![item, initWithTitle: nsstring(title) action: action keyEquivalent: nsstring(key)];
    let _: () = msg_send![item, setKeyEquivalentModifierMask: mask];
    item.autorelease()
}

unsafe fn role_item(node: &MenuNode, role: Role, target: id) -> id {
    let app = NSApp();
    match role {
        Role::About => standard_item(&node.label, sel!(orderFrontStandardAboutPanel:), "", 0),
        Role::Hide => standard_item(&node.label, sel!(hide:), "h", COMMAND_MASK),
        Role::HideOthers => standard_item(
            &node.label,
            sel!(hideOtherApplications:),
            "h",
            COMMAND_MASK | OPTION_MASK,
        ),
        Role::Unhide => standard_item(&node.label, sel!(unhideAllApplications:), "", 0),
        Role::Close => standard_item(&node.label, sel!(performClose:), "w", COMMAND_MASK),
        Role::Quit => standard_item(&node.label, sel!(terminate:), "q", COMMAND_MASK),
        Role::Services => {
            let services = new_menu(&node.label);
            let _: () = msg_send![app, setServicesMenu: services];
            submenu_item(&node.label, services)
        }
        Role::EditMenu if node.children.is_empty() => submenu_item(&node.label, edit_menu()),
        Role::WindowMenu if node.children.is_empty() => {
            let menu = window_menu();
            let _: () = msg_send![app, setWindowsMenu: menu];
            submenu_item(&node.label, menu)
        }
        Role::Help => {
            let menu = build_menu(&node.children, &node.label, target);
            let _: () = msg_send![app, setHelpMenu: menu];
            submenu_item(&node.label, menu)
        }
        Role::AppMenu
        | Role::FileMenu
        | Role::EditMenu
        | Role::ViewMenu
        | Role::WindowMenu => submenu_item(
            &node.label,
            build_menu(&node.children, &node.label, target),
        ),
    }
}

unsafe fn edit_menu() -> id {
    let menu = new_menu("Edit");
    let items = [
        standard_item("Undo", sel!(undo:), "z", COMMAND_MASK),
        standard_item("Redo", sel!(redo:), "z", COMMAND_MASK | SHIFT_MASK),
        msg_send![class!(NSMenuItem), separatorItem],
        standard_item("Cut", sel!(cut:), "x", COMMAND_MASK),
        standard_item("Copy", sel!(copy:), "c", COMMAND_MASK),
        standard_item("Paste", sel!(paste:), "v", COMMAND_MASK),
        standard_item("Select All", sel!(selectAll:), "a", COMMAND_MASK),
    ];
    for item in items {
        let _: () = msg_send![menu, addItem: item];
    }
    menu
}

unsafe fn window_menu() -> id {
    let menu = new_menu("Window");
    let items = [
        standard_item("Minimize", sel!(performMiniaturize:), "m", COMMAND_MASK),
        standard_item("Zoom", sel!(performZoom:), "", 0),
        msg_send![class!(NSMenuItem), separatorItem],
        standard_item("Bring All to Front", sel!(arrangeInFront:), "", 0),
    ];
    for item in items {
        let _: () = msg_send![menu, addItem: item];
    }
    menu
}

fn key_equivalent(accelerator: Option<&str>) -> (String, NSUInteger) {
    let Some(acc) = accelerator.and_then(parse_accelerator) else {
        return (String::new(), 0);
    };
    let Some(key) = key_char(acc.key()) else {
        return (String::new(), 0);
    };

    let mods = acc.modifiers();
    let mut mask = 0;
    if uses_command(&acc) {
        mask |= COMMAND_MASK;
    }
    if mods.contains(Modifiers::CONTROL) {
        mask |= CONTROL_MASK;
    }
    if mods.contains(Modifiers::ALT) {
        mask |= OPTION_MASK;
    }
    if mods.contains(Modifiers::SHIFT) {
        mask |= SHIFT_MASK;
    }
    (key.to_lowercase().to_string(), mask)
}

struct AlertPrompt;

impl ConfirmationPrompt for AlertPrompt {
    fn show(&mut self, request: &ConfirmationRequest) -> ConfirmationResponse {
        unsafe {
            let alert: id = msg_send![class!(NSAlert), new];
            let alert = alert.autorelease();
            let _: () = msg_send![alert, setMessageText: nsstring(&request.message)];
            if let Some(detail) = &request.detail {
                let _: () = msg_send![alert, setInformativeText: nsstring(detail)];
            }
            for title in &request.buttons {
                let _: id = msg_send![alert, addButtonWithTitle: nsstring(title)];
            }
            if let Some(label) = &request.suppress_label {
                let _: () = msg_send![alert, setShowsSuppressionButton: YES];
                let button: id = msg_send![alert, suppressionButton];
                let _: () = msg_send![button, setTitle: nsstring(label)];
            }

            let response: NSInteger = msg_send![alert, runModal];
            let index = match response {
                ALERT_FIRST_BUTTON => Some(0),
                ALERT_SECOND_BUTTON => Some(1),
                _ => None,
            };

            let suppress_checked = if request.suppress_label.is_some() {
                let button: id = msg_send![alert, suppressionButton];
                let state: NSInteger = msg_send![button, state];
                state == MENU_STATE_ON
            } else {
                false
            };

            ConfirmationResponse::from_button(index, suppress_checked)
        }
    }

    fn notify(&mut self, message: &str) {
        unsafe {
            let alert: id = msg_send![class!(NSAlert), new];
            let alert = alert.autorelease();
            let _: () = msg_send![alert, setMessageText: nsstring(message)];
            let _: id = msg_send![alert, addButtonWithTitle: nsstring("OK")];
            let _: NSInteger = msg_send![alert, runModal];
        }
    }
}

fn target_class() -> *const Class {
    static ONCE: Once = Once::new();
    static mut CLS: *const Class = ptr::null();

    ONCE.call_once(|| unsafe {
        let cls = match ClassDecl::new(TARGET_CLASS, class!(NSObject)) {
            Some(mut decl) => {
                decl.add_ivar::<*mut c_void>("state_ptr");
                decl.add_method(
                    sel!(onMenuItem:),
                    on_menu_item as extern "C" fn(&Object, Sel, id),
                );
                decl.register() as *const Class
            }
            None => Class::get(TARGET_CLASS).map_or(ptr::null(), |c| c as *const Class),
        };
        CLS = cls;
    });

    unsafe { CLS }
}

fn new_target() -> id {
    unsafe {
        let cls = target_class();
        let obj: id = msg_send![cls, new];
        (*obj).set_ivar("state_ptr", ptr::null_mut::<c_void>());
        obj
    }
}

extern "C" fn on_menu_item(this: &Object, _cmd: Sel, sender: id) {
    unsafe {
        let state_ptr: *mut c_void = *this.get_ivar("state_ptr");
        if state_ptr.is_null() {
            return;
        }
        let state = &mut *(state_ptr as *mut State);

        let represented: id = msg_send![sender, representedObject];
        let Some(item_id) = rust_string(represented) else {
            return;
        };
        let flags: NSUInteger = msg_send![class!(NSEvent), modifierFlags];
        let event = ClickEvent {
            shift: flags & SHIFT_MASK != 0,
        };

        if let Err(e) = state.host.click(&item_id, event) {
            warn!(id = %item_id, error = %e, "menu click failed");
        }
    }
}
