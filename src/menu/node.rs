use serde::Serialize;

/// Menu roles the native layer fills in itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    AppMenu,
    FileMenu,
    EditMenu,
    ViewMenu,
    WindowMenu,
    Help,
    About,
    Services,
    Hide,
    HideOthers,
    Unhide,
    Close,
    Quit,
}

impl Role {
    pub fn default_label(self) -> &'static str {
        match self {
            Role::AppMenu => "Caprine",
            Role::FileMenu => "File",
            Role::EditMenu => "Edit",
            Role::ViewMenu => "View",
            Role::WindowMenu => "Window",
            Role::Help => "Help",
            Role::About => "About Caprine",
            Role::Services => "Services",
            Role::Hide => "Hide Caprine",
            Role::HideOthers => "Hide Others",
            Role::Unhide => "Show All",
            Role::Close => "Close Window",
            Role::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Action,
    Checkbox { checked: bool },
    Separator,
    Submenu,
    Role { role: Role },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub enabled: bool,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerator: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            enabled: true,
            visible: true,
            accelerator: None,
            children: Vec::new(),
        }
    }

    pub fn root(children: Vec<MenuNode>) -> Self {
        Self::new("root", "", NodeKind::Submenu).with_children(children)
    }

    pub fn action(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, NodeKind::Action)
    }

    pub fn checkbox(id: impl Into<String>, label: impl Into<String>, checked: bool) -> Self {
        Self::new(id, label, NodeKind::Checkbox { checked })
    }

    pub fn separator() -> Self {
        Self::new("", "", NodeKind::Separator)
    }

    pub fn submenu(
        id: impl Into<String>,
        label: impl Into<String>,
        children: Vec<MenuNode>,
    ) -> Self {
        Self::new(id, label, NodeKind::Submenu).with_children(children)
    }

    pub fn role(role: Role) -> Self {
        Self::new("", role.default_label(), NodeKind::Role { role })
    }

    pub fn with_accelerator(mut self, accelerator: Option<&str>) -> Self {
        self.accelerator = accelerator.map(str::to_string);
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_separator(&self) -> bool {
        self.kind == NodeKind::Separator
    }

    pub fn role_of(&self) -> Option<Role> {
        match self.kind {
            NodeKind::Role { role } => Some(role),
            _ => None,
        }
    }

    pub fn checked(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Checkbox { checked } => Some(checked),
            _ => None,
        }
    }

    /// Only meaningful for checkboxes; returns false when `id` is not one.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        match self.find_mut(id) {
            Some(node) => match &mut node.kind {
                NodeKind::Checkbox { checked: c } => {
                    *c = checked;
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    pub fn find(&self, id: &str) -> Option<&MenuNode> {
        if !id.is_empty() && self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut MenuNode> {
        if !id.is_empty() && self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Depth-first walk over this node and all descendants.
    pub fn walk(&self) -> Vec<&MenuNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    /// Ids of every clickable item that is visible on screen.
    pub fn clickable_ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_clickable(self, &mut out);
        out
    }
}

fn collect_clickable<'a>(node: &'a MenuNode, out: &mut Vec<&'a str>) {
    if !node.visible {
        return;
    }
    if matches!(node.kind, NodeKind::Action | NodeKind::Checkbox { .. }) && !node.id.is_empty() {
        out.push(&node.id);
    }
    for child in &node.children {
        collect_clickable(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MenuNode {
        MenuNode::root(vec![MenuNode::submenu(
            "view",
            "View",
            vec![
                MenuNode::action("zoom-in", "Zoom In"),
                MenuNode::separator(),
                MenuNode::checkbox("private-mode", "Hide Names", true),
                MenuNode::checkbox("hidden", "Hidden", false).visible(false),
            ],
        )])
    }

    #[test]
    fn test_set_checked_only_on_checkbox() {
        let mut root = sample();
        assert!(root.set_checked("private-mode", false));
        assert_eq!(root.find("private-mode").unwrap().checked(), Some(false));
        assert!(!root.set_checked("zoom-in", true));
        assert!(!root.set_checked("missing", true));
    }

    #[test]
    fn test_find_ignores_blank_ids() {
        let root = sample();
        assert!(root.find("").is_none());
    }

    #[test]
    fn test_clickable_ids_skip_hidden() {
        let root = sample();
        assert_eq!(root.clickable_ids(), vec!["zoom-in", "private-mode"]);
    }

    #[test]
    fn test_serializes_kind_inline() {
        let node = MenuNode::checkbox("x", "X", true);
        let v = serde_json::to_value(&node).unwrap();
        assert_eq!(v["type"], "checkbox");
        assert_eq!(v["checked"], true);
        assert!(v.get("children").is_none());
    }
}
