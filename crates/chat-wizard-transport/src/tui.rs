//! Terminal input bridge for ratatui front-ends.

use chat_wizard_core::{Entry, OptionKind, SelectOption, Selection, SurfaceEvent};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// What a key press means to the chat front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Type a character into the input line.
    Char(char),
    /// Delete the last character.
    Backspace,
    /// Submit the input line, or pick the highlighted option when empty.
    Submit,
    /// Highlight the next option.
    NextOption,
    /// Highlight the previous option.
    PrevOption,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Quit,
}

/// Convert a crossterm key event to an action.
#[must_use]
pub fn key_to_action(key: &KeyEvent) -> Option<InputAction> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputAction::Quit)
        }
        KeyCode::Char(c)
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
        {
            Some(InputAction::Char(c))
        }
        KeyCode::Enter => Some(InputAction::Submit),
        KeyCode::Backspace => Some(InputAction::Backspace),
        KeyCode::Tab | KeyCode::Right => Some(InputAction::NextOption),
        KeyCode::BackTab | KeyCode::Left => Some(InputAction::PrevOption),
        KeyCode::Up => Some(InputAction::ScrollUp),
        KeyCode::Down => Some(InputAction::ScrollDown),
        KeyCode::PageUp => Some(InputAction::PageUp),
        KeyCode::PageDown => Some(InputAction::PageDown),
        _ => None,
    }
}

/// Convert a crossterm event to an action.
#[must_use]
pub fn event_to_action(event: &Event) -> Option<InputAction> {
    match event {
        Event::Key(key) => key_to_action(key),
        _ => None,
    }
}

/// Highlight state over the most recent option set.
#[derive(Debug, Clone, Default)]
pub struct OptionPicker {
    kind: Option<OptionKind>,
    options: Vec<SelectOption>,
    highlighted: usize,
}

impl OptionPicker {
    /// Replace the option set. The first option is highlighted.
    pub fn set(&mut self, kind: OptionKind, options: Vec<SelectOption>) {
        self.kind = Some(kind);
        self.options = options;
        self.highlighted = 0;
    }

    /// Follow the rendered transcript.
    ///
    /// A new option set becomes live. Any later message, from either side,
    /// retires it: options always follow the reply that asked for them.
    pub fn observe(&mut self, event: &SurfaceEvent) {
        match event {
            SurfaceEvent::Appended(Entry::Options { kind, options, .. }) => {
                self.set(*kind, options.clone());
            }
            SurfaceEvent::Appended(Entry::Message { .. }) => self.clear(),
            SurfaceEvent::Appended(Entry::Pending { .. }) | SurfaceEvent::Removed { .. } => {}
        }
    }

    /// Drop the option set.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Options currently on offer.
    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// Index of the highlighted option.
    #[must_use]
    pub const fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn next(&mut self) {
        if !self.options.is_empty() {
            self.highlighted = (self.highlighted + 1) % self.options.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.options.is_empty() {
            self.highlighted = self
                .highlighted
                .checked_sub(1)
                .unwrap_or(self.options.len() - 1);
        }
    }

    /// Pick the highlighted option.
    #[must_use]
    pub fn pick(&self) -> Option<Selection> {
        let kind = self.kind?;
        self.options
            .get(self.highlighted)
            .map(|option| Selection::new(kind, option))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(&ctrl_c), Some(InputAction::Quit));

        let upper = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(&upper), Some(InputAction::Char('A')));

        let alt = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(key_to_action(&alt), None);

        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(key_to_action(&tab), Some(InputAction::NextOption));

        assert_eq!(event_to_action(&Event::Resize(80, 24)), None);
    }

    #[test]
    fn test_picker_wraps_and_picks_value() {
        let mut picker = OptionPicker::default();
        assert!(picker.pick().is_none());

        picker.set(
            OptionKind::Date,
            vec![
                SelectOption {
                    value: "2024-06-01".into(),
                    label: "Sat, Jun 1".into(),
                },
                SelectOption {
                    value: "2024-06-03".into(),
                    label: "Mon, Jun 3".into(),
                },
            ],
        );
        picker.prev();
        assert_eq!(picker.highlighted(), 1);
        picker.next();
        assert_eq!(picker.highlighted(), 0);

        let selection = picker.pick().unwrap();
        assert_eq!(selection.kind, OptionKind::Date);
        assert_eq!(selection.into_submission(), "2024-06-01");

        picker.clear();
        assert!(picker.options().is_empty());
    }

    fn options_event(kind: OptionKind, values: &[&str]) -> SurfaceEvent {
        SurfaceEvent::Appended(Entry::Options {
            prompt: "Pick one:".into(),
            kind,
            options: values.iter().copied().map(SelectOption::plain).collect(),
        })
    }

    #[test]
    fn test_picker_follows_transcript() {
        let mut picker = OptionPicker::default();
        picker.observe(&options_event(OptionKind::Time, &["09:00", "10:00"]));
        picker.next();
        assert_eq!(picker.pick().unwrap().into_submission(), "10:00");

        // The pending placeholder coming and going leaves options live.
        picker.observe(&SurfaceEvent::Appended(Entry::Pending { id: "p".into() }));
        picker.observe(&SurfaceEvent::Removed { id: "p".into() });
        assert_eq!(picker.options().len(), 2);
    }

    #[test]
    fn test_bot_message_retires_options() {
        use chat_wizard_core::Role;

        let mut picker = OptionPicker::default();
        picker.observe(&options_event(OptionKind::Date, &["2024-06-01"]));

        // e.g. the wizard apology after a failed step
        picker.observe(&SurfaceEvent::Appended(Entry::Message {
            role: Role::Bot,
            text: "Sorry, please try again.".into(),
        }));
        assert!(picker.pick().is_none());
        assert!(picker.options().is_empty());
    }
}
