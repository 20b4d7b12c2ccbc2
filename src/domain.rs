use chrono::{Local, NaiveDate};
use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const HELP_TEXT: &str = "\
Navigation
  j / Down, k / Up      move one row
  PageDown / PageUp     move one page
  g / G                 first / last row
  h / Left, l / Right   move one column
  Mouse wheel           scroll

Sorting
  s                     toggle sort of the current column (asc, desc, none)
  Click header          toggle sort of the clicked column

Column order
  m                     pick up the current column
  Left / Right          choose the drop target while dragging
  Enter                 drop before the target column
  Esc                   cancel the drag
  Drag header           drop onto another header to move the column

Other
  y / Y                 copy cell / copy row
  :                     go to row
  ?                     this help
  q                     quit";

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' is not sortable")]
    NotSortable(String),

    #[error("Column '{0}' is defined more than once")]
    DuplicateColumn(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct RosterConfig {
    pub event_poll_time: u64,
    pub record_count: u32,
    pub seed: u64,
    /// Terminal lines per table row.
    pub row_height: u16,
    /// Rows materialized above and below the visible window.
    pub overscan: usize,
    pub max_column_width: usize,
    /// Reference date for every date derived column.
    pub today: NaiveDate,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            record_count: 500,
            seed: 42,
            row_height: 1,
            overscan: 10,
            max_column_width: 40,
            today: Local::now().date_naive(),
        }
    }
}

impl RosterConfig {
    pub fn validate(self) -> Result<Self, RosterError> {
        if self.row_height == 0 {
            return Err(RosterError::Config(
                "row height must be at least one line".into(),
            ));
        }
        // With taller rows a partly scrolled bottom row is only drawn from the overscan.
        if self.row_height > 1 && self.overscan == 0 {
            return Err(RosterError::Config(
                "rows taller than one line need an overscan of at least one".into(),
            ));
        }
        if self.max_column_width < 3 {
            return Err(RosterError::Config(format!(
                "max column width {} is too small",
                self.max_column_width
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    GotoRow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    MoveLeft,
    MoveRight,
    ScrollLines(i32),
    ToggleSort,
    PickColumn,
    PointerDown(u16, u16),
    PointerMove(u16, u16),
    PointerUp(u16, u16),
    CopyCell,
    CopyRow,
    Help,
    GotoRow,
    Enter,
    Exit,
    RawKey(KeyEvent),
    Resize(usize, usize),
}
