use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tracing::info;

use crate::config::{ALWAYS_ON_TOP, PRIVATE_MODE, SHOW_ALWAYS_ON_TOP_PROMPT, SHOW_PRIVATE_MODE_PROMPT};

const DONT_ASK_AGAIN: &str = "Don't ask again";

/// Features whose switch-on asks first when reached through the shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    AlwaysOnTop,
    PrivateMode,
}

impl Gate {
    pub fn feature_key(self) -> &'static str {
        match self {
            Gate::AlwaysOnTop => ALWAYS_ON_TOP,
            Gate::PrivateMode => PRIVATE_MODE,
        }
    }

    pub fn prompt_key(self) -> &'static str {
        match self {
            Gate::AlwaysOnTop => SHOW_ALWAYS_ON_TOP_PROMPT,
            Gate::PrivateMode => SHOW_PRIVATE_MODE_PROMPT,
        }
    }

    pub fn request(self) -> ConfirmationRequest {
        match self {
            Gate::AlwaysOnTop => ConfirmationRequest::new(
                "Are you sure you want the window to stay on top of other windows?",
                ["Display on Top", "Don't Display on Top"],
            )
            .detail("This was triggered by Command/Control+Shift+T.")
            .suppressible(DONT_ASK_AGAIN),
            Gate::PrivateMode => ConfirmationRequest::new(
                "Are you sure you want to hide names and avatars?",
                ["Hide", "Don't Hide"],
            )
            .detail("This was triggered by Command/Control+Shift+N.")
            .suppressible(DONT_ASK_AGAIN),
        }
    }
}

/// A modal with two buttons. Index 0 is the affirmative button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub message: String,
    pub detail: Option<String>,
    pub buttons: [String; 2],
    pub default_index: usize,
    pub cancel_index: usize,
    pub suppress_label: Option<String>,
}

impl ConfirmationRequest {
    pub fn new(message: impl Into<String>, buttons: [&str; 2]) -> Self {
        Self {
            message: message.into(),
            detail: None,
            buttons: buttons.map(str::to_string),
            default_index: 0,
            cancel_index: 1,
            suppress_label: None,
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn suppressible(mut self, label: impl Into<String>) -> Self {
        self.suppress_label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Affirmative,
    Negative,
    /// Closed without picking a button.
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationResponse {
    pub choice: Choice,
    pub suppress_checked: bool,
}

impl ConfirmationResponse {
    pub fn new(choice: Choice, suppress_checked: bool) -> Self {
        Self {
            choice,
            suppress_checked,
        }
    }

    /// Maps a pressed button index; anything but 0 and 1 counts as dismissal.
    pub fn from_button(index: Option<usize>, suppress_checked: bool) -> Self {
        let choice = match index {
            Some(0) => Choice::Affirmative,
            Some(1) => Choice::Negative,
            _ => Choice::Dismissed,
        };
        Self::new(choice, suppress_checked)
    }

    pub fn is_affirmative(&self) -> bool {
        self.choice == Choice::Affirmative
    }
}

/// A confirmation the model is waiting on. Resume with
/// [`MenuModel::resolve`](crate::menu::model::MenuModel::resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub gate: Gate,
    pub item_id: String,
    pub request: ConfirmationRequest,
}

pub trait ConfirmationPrompt {
    fn show(&mut self, request: &ConfirmationRequest) -> ConfirmationResponse;

    /// Informational message with a single OK button.
    fn notify(&mut self, message: &str) {
        info!(message, "notice");
    }
}

/// Answers prompts from a queue; an empty queue dismisses. Every request
/// and notice is recorded in the shared transcript.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<ConfirmationResponse>,
    transcript: Rc<RefCell<Vec<String>>>,
    echo: bool,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = ConfirmationResponse>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            transcript: Rc::default(),
            echo: false,
        }
    }

    /// Also prints each request and notice to stdout.
    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    fn record(&self, line: &str) {
        if self.echo {
            println!("{line}");
        }
        self.transcript.borrow_mut().push(line.to_string());
    }

    pub fn transcript(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.transcript)
    }
}

impl ConfirmationPrompt for ScriptedPrompt {
    fn show(&mut self, request: &ConfirmationRequest) -> ConfirmationResponse {
        self.record(&request.message);
        let response = self
            .answers
            .pop_front()
            .unwrap_or(ConfirmationResponse::new(Choice::Dismissed, false));
        if self.echo {
            println!("  -> {:?}", response.choice);
        }
        response
    }

    fn notify(&mut self, message: &str) {
        self.record(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_button() {
        assert_eq!(
            ConfirmationResponse::from_button(Some(0), true),
            ConfirmationResponse::new(Choice::Affirmative, true)
        );
        assert_eq!(
            ConfirmationResponse::from_button(Some(1), false).choice,
            Choice::Negative
        );
        assert_eq!(
            ConfirmationResponse::from_button(None, false).choice,
            Choice::Dismissed
        );
        assert_eq!(
            ConfirmationResponse::from_button(Some(7), false).choice,
            Choice::Dismissed
        );
    }

    #[test]
    fn test_gate_requests_are_suppressible() {
        for gate in [Gate::AlwaysOnTop, Gate::PrivateMode] {
            let req = gate.request();
            assert_eq!(req.default_index, 0);
            assert_eq!(req.cancel_index, 1);
            assert!(req.suppress_label.is_some());
            assert!(req.detail.is_some());
        }
    }

    #[test]
    fn test_scripted_prompt_dismisses_when_exhausted() {
        let mut prompt =
            ScriptedPrompt::new([ConfirmationResponse::new(Choice::Affirmative, false)]);
        let req = Gate::PrivateMode.request();
        assert!(prompt.show(&req).is_affirmative());
        assert_eq!(prompt.show(&req).choice, Choice::Dismissed);
        assert_eq!(prompt.transcript().borrow().len(), 2);
    }
}
