use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::domain::{Message, RosterConfig, RosterError};
use crate::model::Model;

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: i32 = 3;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &RosterConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, RosterError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(self.map_event(event::read()?, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn map_event(&self, event: Event, raw_keys: bool) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if raw_keys {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('h') | KeyCode::Left, _) => Some(Message::MoveLeft),
            (KeyCode::Char('l') | KeyCode::Right, _) => Some(Message::MoveRight),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => Some(Message::MovePageDown),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => Some(Message::MovePageUp),
            (KeyCode::Char('g') | KeyCode::Home, _) => Some(Message::MoveBeginning),
            (KeyCode::Char('G') | KeyCode::End, _) => Some(Message::MoveEnd),
            (KeyCode::Char('s'), _) => Some(Message::ToggleSort),
            (KeyCode::Char('m'), _) => Some(Message::PickColumn),
            (KeyCode::Char('y'), _) => Some(Message::CopyCell),
            (KeyCode::Char('Y'), _) => Some(Message::CopyRow),
            (KeyCode::Char(':'), _) => Some(Message::GotoRow),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, mouse: MouseEvent) -> Option<Message> {
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Message::PointerDown(x, y)),
            MouseEventKind::Drag(MouseButton::Left) => Some(Message::PointerMove(x, y)),
            MouseEventKind::Up(MouseButton::Left) => Some(Message::PointerUp(x, y)),
            MouseEventKind::ScrollDown => Some(Message::ScrollLines(WHEEL_LINES)),
            MouseEventKind::ScrollUp => Some(Message::ScrollLines(-WHEEL_LINES)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyEvent, KeyEventKind, KeyEventState};

    fn controller() -> Controller {
        Controller::new(&RosterConfig::default())
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn maps_table_keys() {
        let c = controller();
        assert_eq!(c.map_event(press(KeyCode::Char('q')), false), Some(Message::Quit));
        assert_eq!(c.map_event(press(KeyCode::Char('s')), false), Some(Message::ToggleSort));
        assert_eq!(c.map_event(press(KeyCode::Char('m')), false), Some(Message::PickColumn));
        assert_eq!(c.map_event(press(KeyCode::Esc), false), Some(Message::Exit));
        assert_eq!(c.map_event(press(KeyCode::Char('x')), false), None);
    }

    #[test]
    fn raw_mode_passes_keys_through() {
        let c = controller();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(c.map_event(Event::Key(key), true), Some(Message::RawKey(key)));
    }

    #[test]
    fn ignores_key_release() {
        let c = controller();
        let key = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(c.map_event(Event::Key(key), false), None);
    }

    #[test]
    fn maps_pointer_gesture_and_wheel() {
        let c = controller();
        assert_eq!(
            c.map_event(mouse(MouseEventKind::Down(MouseButton::Left), 4, 0), false),
            Some(Message::PointerDown(4, 0))
        );
        assert_eq!(
            c.map_event(mouse(MouseEventKind::Drag(MouseButton::Left), 9, 0), false),
            Some(Message::PointerMove(9, 0))
        );
        assert_eq!(
            c.map_event(mouse(MouseEventKind::Up(MouseButton::Left), 9, 0), false),
            Some(Message::PointerUp(9, 0))
        );
        assert_eq!(
            c.map_event(mouse(MouseEventKind::ScrollDown, 0, 5), false),
            Some(Message::ScrollLines(WHEEL_LINES))
        );
        assert_eq!(
            c.map_event(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1), false),
            None
        );
    }

    #[test]
    fn maps_resize() {
        let c = controller();
        assert_eq!(
            c.map_event(Event::Resize(120, 40), false),
            Some(Message::Resize(120, 40))
        );
    }
}
