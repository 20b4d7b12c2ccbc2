use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line editor behind the command prompt.
pub struct Inputter {
    prompt: &'static str,
    current_input: String,
    cursor_pos: usize,
    accept: fn(char) -> bool,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub prompt: &'static str,
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Default for Inputter {
    fn default() -> Self {
        Self {
            prompt: "",
            current_input: String::new(),
            cursor_pos: 0,
            accept: |_| true,
            finished: false,
            canceled: false,
        }
    }
}

impl Inputter {
    /// Resets the editor for a new prompt that only takes chars passing `accept`.
    pub fn start(&mut self, prompt: &'static str, accept: fn(char) -> bool) {
        self.clear();
        self.prompt = prompt;
        self.accept = accept;
    }

    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (kc, _) => self.key(kc),
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            prompt: self.prompt,
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn key(&mut self, code: KeyCode) -> InputResult {
        match code.as_char() {
            Some(chr) if (self.accept)(chr) => {
                let at = self.byte_pos();
                self.current_input.insert(at, chr);
                self.cursor_pos += 1;
            }
            Some(chr) => trace!("Prompt '{}' rejected {chr:?}", self.prompt),
            None => {}
        }
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
