use iced::keyboard::{self, Key, Modifiers};
use iced::{window, Event};

/// Window-level events that make the controller re-inspect the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    WindowFocused,
    Copy,
    Cut,
}

/// Map a raw runtime event to a page event.
///
/// Only `window::Event::Focused` counts as focus: moving focus between widgets
/// inside the window never produces a window event.
pub fn classify(event: &Event) -> Option<PageEvent> {
    match event {
        Event::Window(window::Event::Focused) => Some(PageEvent::WindowFocused),
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            shortcut(key, *modifiers)
        }
        _ => None,
    }
}

fn shortcut(key: &Key, modifiers: Modifiers) -> Option<PageEvent> {
    if !modifiers.command() {
        return None;
    }
    match key {
        Key::Character(c) if c.eq_ignore_ascii_case("c") => Some(PageEvent::Copy),
        Key::Character(c) if c.eq_ignore_ascii_case("x") => Some(PageEvent::Cut),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::mouse;

    #[test]
    fn test_window_focus_triggers() {
        let event = Event::Window(window::Event::Focused);
        assert_eq!(classify(&event), Some(PageEvent::WindowFocused));
    }

    #[test]
    fn test_other_events_ignored() {
        assert_eq!(classify(&Event::Window(window::Event::Unfocused)), None);
        assert_eq!(classify(&Event::Mouse(mouse::Event::CursorEntered)), None);
    }

    #[test]
    fn test_copy_and_cut_shortcuts() {
        let c = Key::Character("c".into());
        let x = Key::Character("X".into());
        assert_eq!(shortcut(&c, Modifiers::COMMAND), Some(PageEvent::Copy));
        assert_eq!(shortcut(&x, Modifiers::COMMAND), Some(PageEvent::Cut));
    }

    #[test]
    fn test_plain_keys_ignored() {
        let c = Key::Character("c".into());
        let v = Key::Character("v".into());
        assert_eq!(shortcut(&c, Modifiers::empty()), None);
        assert_eq!(shortcut(&v, Modifiers::COMMAND), None);
        assert_eq!(
            shortcut(&Key::Named(keyboard::key::Named::Tab), Modifiers::COMMAND),
            None
        );
    }
}
