use arboard::Clipboard;
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace};

use crate::columns::{person_columns, CellContext, ColumnDef, ColumnId, ColumnSet};
use crate::domain::{CMDMode, HELP_TEXT, Message, RosterConfig, RosterError};
use crate::inputter::{InputResult, Inputter};
use crate::order::{ColumnOrder, DragState};
use crate::record::{Person, RecordSource};
use crate::table::{self, SortDirection, SortState};
use crate::ui::{CMDLINE_HEIGHT, COLUMN_WIDTH_MARGIN, SCROLLBAR_WIDTH, TABLE_HEADER_HEIGHT};
use crate::window::{RowWindowing, ScrollSurface, Viewport};

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    Popup,
    CmdInput,
}

/// A header pressed with the pointer, not yet known to be a click or a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeaderPress {
    column: ColumnId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub id: ColumnId,
    pub label: String,
    pub x: u16,
    pub width: u16,
    pub sort: Option<SortDirection>,
    pub selected: bool,
    pub dragged: bool,
    pub drop_target: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    /// Position in the sorted row sequence.
    pub position: usize,
    /// Top line relative to the body area, negative or past the end for overscan rows.
    pub y: i64,
    pub cells: Vec<String>,
    pub selected: bool,
}

pub struct UIData {
    pub name: String,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub nrows: usize,
    pub row_height: u16,
    pub scroll_offset: u32,
    pub total_height: u64,
    pub selected_row: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            nrows: 0,
            row_height: 1,
            scroll_offset: 0,
            total_height: 0,
            selected_row: 0,
            show_popup: false,
            popup_message: String::new(),
            layout: UILayout::default(),
            cmdinput: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            last_update: Instant::now(),
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    /// Lines available for data rows, below the header.
    pub table_height: usize,
    pub statusline_width: usize,
    pub statusline_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width: ui_width.saturating_sub(SCROLLBAR_WIDTH),
            table_height: ui_height.saturating_sub(CMDLINE_HEIGHT + TABLE_HEADER_HEIGHT),
            statusline_width: ui_width,
            statusline_height: CMDLINE_HEIGHT,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: RosterConfig,
    pub status: Status,
    modus: Modus,
    records: Vec<Person>,
    columns: ColumnSet,
    order: ColumnOrder,
    sort: SortState,
    rows: Vec<usize>,
    windowing: RowWindowing,
    ctx: CellContext,
    scroll_offset: u32,
    cursor_row: usize,
    cursor_column: usize,
    offset_column: usize,
    drag: DragState,
    press: Option<HeaderPress>,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &RosterConfig,
        source: &mut impl RecordSource,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, RosterError> {
        let columns = person_columns()?;
        let order = ColumnOrder::from_set(&columns);
        let windowing = RowWindowing::new(config.row_height as u32, config.overscan)?;
        let ctx = CellContext {
            today: config.today,
        };

        let start_time = Instant::now();
        let records = source.records();
        let sort = SortState::none();
        let rows = table::sorted_rows(&records, &columns, &sort, &ctx)?;
        info!(
            "Loaded {} records in {}ms",
            records.len(),
            start_time.elapsed().as_millis()
        );
        for def in columns.ids().filter_map(|id| columns.get(id)) {
            debug!("Column: {def:?}");
        }

        let mut model = Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Table,
            records,
            columns,
            order,
            sort,
            rows,
            windowing,
            ctx,
            scroll_offset: 0,
            cursor_row: 0,
            cursor_column: 0,
            offset_column: 0,
            drag: DragState::Idle,
            press: None,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: None,
            input: Inputter::default(),
            cmd_mode: None,
            status_message: String::new(),
        };
        model.set_status_message(format!(
            "{} people, press ? for help",
            model.records.len()
        ));
        model.update_table_data();
        Ok(model)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn column_order(&self) -> &[ColumnId] {
        self.order.ids()
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CmdInput
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.scroll_offset, self.uilayout.table_height as u32)
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    fn current_column(&self) -> Option<ColumnId> {
        self.order.get(self.cursor_column)
    }

    fn display_width(&self, def: &ColumnDef) -> usize {
        // Room for the sort arrow next to the label.
        let label = def.label.chars().count() + 2;
        std::cmp::max(def.width, label).min(self.config.max_column_width)
    }

    /// Order positions that fit the table width, starting at `offset_column`,
    /// as (position, x, width). The last one may be cut.
    fn fit_columns(&self) -> Vec<(usize, usize, usize)> {
        let table_width = self.uilayout.table_width;
        let mut fitted = Vec::new();
        let mut x = 0;
        for (pos, id) in self.order.ids().iter().enumerate().skip(self.offset_column) {
            let Some(def) = self.columns.get(*id) else {
                error!("Column {id} is ordered but not defined!");
                continue;
            };
            let width = self.display_width(def);
            if x + width <= table_width {
                fitted.push((pos, x, width));
                x += width + COLUMN_WIDTH_MARGIN;
            } else {
                if x < table_width {
                    fitted.push((pos, x, table_width - x));
                }
                break;
            }
        }
        fitted
    }

    fn header_at(&self, x: u16) -> Option<ColumnId> {
        self.uidata
            .headers
            .iter()
            .find(|h| x >= h.x && x < h.x.saturating_add(h.width))
            .map(|h| h.id)
    }

    fn get_visible_name(name: &str, width: usize) -> String {
        if width < 3 {
            return String::new();
        }
        if name.chars().count() > width {
            let mut reduced: String = name.chars().take(width - 3).collect();
            reduced.push_str("...");
            reduced
        } else {
            name.to_string()
        }
    }

    /// Rebuilds the render snapshot from the current state.
    fn update_table_data(&mut self) {
        let fitted = self.fit_columns();
        let dragged = self.drag.source();
        let drop_target = self.drag.target();

        let headers: Vec<HeaderView> = fitted
            .iter()
            .filter_map(|&(pos, x, width)| {
                let id = self.order.get(pos)?;
                let def = self.columns.get(id)?;
                Some(HeaderView {
                    id,
                    label: Self::get_visible_name(def.label, width.saturating_sub(2)),
                    x: x as u16,
                    width: width as u16,
                    sort: self.sort.direction_of(id),
                    selected: pos == self.cursor_column,
                    dragged: dragged == Some(id),
                    drop_target: drop_target == Some(id) && dragged != Some(id),
                })
            })
            .collect();

        let window = self.windowing.window(self.rows.len(), &self.viewport());
        let defs: Vec<&ColumnDef> = headers
            .iter()
            .filter_map(|h| self.columns.get(h.id))
            .collect();
        let rows: Vec<RowView> = window
            .rows
            .iter()
            .map(|vrow| {
                let person = &self.records[self.rows[vrow.index]];
                RowView {
                    position: vrow.index,
                    y: vrow.offset as i64 - self.scroll_offset as i64,
                    cells: defs.iter().map(|d| d.render(person, &self.ctx)).collect(),
                    selected: vrow.index == self.cursor_row,
                }
            })
            .collect();

        trace!(
            "Table: Cr {}, Cc {}, So {}, Oc {}, visible {:?}, rendered {}, headers {}",
            self.cursor_row,
            self.cursor_column,
            self.scroll_offset,
            self.offset_column,
            window.visible,
            rows.len(),
            headers.len()
        );

        self.uidata = UIData {
            name: format!("People [{}]", self.rows.len()),
            headers,
            rows,
            nrows: self.rows.len(),
            row_height: self.config.row_height,
            scroll_offset: self.scroll_offset,
            total_height: window.total_height,
            selected_row: self.cursor_row,
            show_popup: self.modus == Modus::Popup,
            popup_message: if self.modus == Modus::Popup {
                HELP_TEXT.to_string()
            } else {
                String::new()
            },
            layout: self.uilayout.clone(),
            cmdinput: self.input.get(),
            active_cmdinput: self.modus == Modus::CmdInput,
            status_message: self.status_message.clone(),
            last_update: Instant::now(),
        };
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.clamp_scroll();
        self.reveal_cursor_row();
        self.reveal_cursor_column();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), RosterError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        match self.modus {
            Modus::Table => match msg {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_row_by(1),
                Message::MoveUp => self.move_row_by(-1),
                Message::MovePageDown => self.move_row_by(self.page_rows() as i64),
                Message::MovePageUp => self.move_row_by(-(self.page_rows() as i64)),
                Message::MoveBeginning => self.move_row_to(0),
                Message::MoveEnd => self.move_row_to(self.rows.len().saturating_sub(1)),
                Message::MoveLeft => self.move_column_by(-1),
                Message::MoveRight => self.move_column_by(1),
                Message::ScrollLines(lines) => self.scroll_by(lines),
                Message::ToggleSort => {
                    if self.drag.is_dragging() {
                        self.set_status_message("Drop or cancel the column move before sorting");
                    } else if let Some(id) = self.current_column() {
                        self.toggle_sort(id)?;
                    }
                }
                Message::PickColumn => self.pick_column(),
                Message::Enter => self.drop_column()?,
                Message::PointerDown(x, y) => self.pointer_down(x, y),
                Message::PointerMove(x, y) => self.pointer_move(x, y),
                Message::PointerUp(x, y) => self.pointer_up(x, y)?,
                Message::CopyCell => self.copy_table_cell(),
                Message::CopyRow => self.copy_table_row(),
                Message::Help => self.show_help(),
                Message::GotoRow => self.enter_cmd_mode(CMDMode::GotoRow),
                Message::Exit => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::RawKey(_) => (),
            },
            Modus::Popup => match msg {
                Message::Quit => self.quit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::Enter | Message::Help => self.exit(),
                _ => (),
            },
            Modus::CmdInput => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }

        self.update_table_data();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn exit(&mut self) {
        match self.modus {
            Modus::Popup | Modus::CmdInput => self.modus = Modus::Table,
            Modus::Table => {
                if self.drag.is_dragging() {
                    self.drag.cancel();
                    self.press = None;
                    self.set_status_message("Column move canceled");
                }
            }
        }
    }

    fn show_help(&mut self) {
        self.modus = Modus::Popup;
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Enter command mode {mode:?}");
        self.cmd_mode = Some(mode);
        match mode {
            CMDMode::GotoRow => self.input.start("Go to row: ", |c| c.is_ascii_digit()),
        }
        self.modus = Modus::CmdInput;
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        let result = self.input.read(key);
        if !result.finished {
            return;
        }
        self.modus = Modus::Table;
        if !result.canceled {
            match self.cmd_mode {
                Some(CMDMode::GotoRow) => self.goto_row(&result.input),
                None => (),
            }
        }
        self.cmd_mode = None;
        self.input.clear();
    }

    fn goto_row(&mut self, input: &str) {
        match input.parse::<usize>() {
            Ok(row) if row >= 1 && row <= self.rows.len() => {
                self.move_row_to(row - 1);
                self.set_status_message(format!("Row {row}"));
            }
            _ => self.set_status_message(format!(
                "No row '{input}', the table has {} rows",
                self.rows.len()
            )),
        }
    }

    fn page_rows(&self) -> usize {
        self.windowing
            .rows_per_viewport(self.uilayout.table_height as u32)
            .max(1)
    }

    fn move_row_by(&mut self, delta: i64) {
        if self.rows.is_empty() {
            return;
        }
        let target = (self.cursor_row as i64 + delta).clamp(0, self.rows.len() as i64 - 1);
        self.move_row_to(target as usize);
    }

    fn move_row_to(&mut self, position: usize) {
        if self.rows.is_empty() {
            return;
        }
        self.cursor_row = position.min(self.rows.len() - 1);
        self.reveal_cursor_row();
    }

    fn reveal_cursor_row(&mut self) {
        if self.rows.is_empty() {
            self.scroll_offset = 0;
            return;
        }
        self.scroll_offset = self
            .windowing
            .scroll_to_reveal(self.cursor_row, &self.viewport());
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self
            .windowing
            .max_scroll(self.rows.len(), self.uilayout.table_height as u32);
        self.scroll_offset = self.scroll_offset.min(max);
    }

    fn scroll_by(&mut self, lines: i32) {
        let next = self.scroll_offset as i64 + lines as i64;
        self.scroll_offset = next.clamp(0, u32::MAX as i64) as u32;
        self.clamp_scroll();
        trace!("Scrolled to {}", self.viewport().scroll_offset());
    }

    fn move_column_by(&mut self, delta: i64) {
        if self.order.is_empty() {
            return;
        }
        let last = self.order.len() as i64 - 1;
        self.cursor_column = (self.cursor_column as i64 + delta).clamp(0, last) as usize;
        self.reveal_cursor_column();
        if let Some(id) = self.current_column() {
            self.drag.hover(id);
        }
    }

    fn reveal_cursor_column(&mut self) {
        if self.cursor_column < self.offset_column {
            self.offset_column = self.cursor_column;
            return;
        }
        while self.offset_column < self.cursor_column {
            let fully_visible = self.fit_columns().iter().any(|&(pos, _, width)| {
                pos == self.cursor_column
                    && self
                        .order
                        .get(pos)
                        .and_then(|id| self.columns.get(id))
                        .is_some_and(|def| width == self.display_width(def))
            });
            if fully_visible {
                break;
            }
            self.offset_column += 1;
        }
    }

    #[instrument(skip(self))]
    fn toggle_sort(&mut self, id: ColumnId) -> Result<(), RosterError> {
        let (label, sortable) = {
            let def = self.columns.require(id)?;
            (def.label, def.is_sortable())
        };
        if !sortable {
            self.set_status_message(format!("{label} is not sortable"));
            return Ok(());
        }

        let anchor = self.rows.get(self.cursor_row).copied();
        self.sort = self.sort.toggled(id);
        self.rows = table::sorted_rows(&self.records, &self.columns, &self.sort, &self.ctx)?;

        if let Some(record) = anchor {
            self.cursor_row = self.rows.iter().position(|&r| r == record).unwrap_or(0);
        }
        self.reveal_cursor_row();

        let message = match self.sort.direction_of(id) {
            Some(SortDirection::Ascending) => format!("Sorted by {label} ascending"),
            Some(SortDirection::Descending) => format!("Sorted by {label} descending"),
            None => "Sort cleared".to_string(),
        };
        self.set_status_message(message);
        Ok(())
    }

    fn pick_column(&mut self) {
        let Some(id) = self.current_column() else {
            return;
        };
        if self.drag.begin(id) {
            self.set_status_message(format!(
                "Moving {id}, choose a target with Left/Right and press Enter"
            ));
        } else {
            self.set_status_message("A column is already being moved");
        }
    }

    fn drop_column(&mut self) -> Result<(), RosterError> {
        if !self.drag.is_dragging() {
            return Ok(());
        }
        if let Some(id) = self.current_column() {
            self.drag.hover(id);
        }
        self.finish_drag()
    }

    /// Resolves the drag gesture, applying the reorder if there is one.
    #[instrument(skip(self))]
    fn finish_drag(&mut self) -> Result<(), RosterError> {
        match self.drag.release() {
            Some(drop) => {
                let changed = self.order.reorder(drop.source, drop.target)?;
                if let Some(pos) = self.order.position(drop.source) {
                    self.cursor_column = pos;
                }
                self.reveal_cursor_column();
                let message = if changed {
                    format!("Moved {} before {}", drop.source, drop.target)
                } else {
                    format!("{} stays in place", drop.source)
                };
                self.set_status_message(message);
            }
            None => self.set_status_message("Column move canceled"),
        }
        Ok(())
    }

    fn pointer_down(&mut self, x: u16, y: u16) {
        if (y as usize) < TABLE_HEADER_HEIGHT {
            if let Some(column) = self.header_at(x) {
                self.press = Some(HeaderPress { column });
                if let Some(pos) = self.order.position(column) {
                    self.cursor_column = pos;
                }
            }
            return;
        }
        let line = y as usize - TABLE_HEADER_HEIGHT;
        if line >= self.uilayout.table_height {
            return;
        }
        let content_line = self.scroll_offset as u64 + line as u64;
        let position = (content_line / self.windowing.row_height() as u64) as usize;
        if position < self.rows.len() {
            self.cursor_row = position;
        }
    }

    /// Header under the pointer, if the pointer is on the header row.
    fn header_under(&self, x: u16, y: u16) -> Option<ColumnId> {
        if (y as usize) < TABLE_HEADER_HEIGHT {
            self.header_at(x)
        } else {
            None
        }
    }

    fn pointer_move(&mut self, x: u16, y: u16) {
        let Some(press) = self.press else {
            return;
        };
        let Some(target) = self.header_under(x, y) else {
            self.drag.leave();
            return;
        };
        if !self.drag.is_dragging() {
            if target == press.column {
                return;
            }
            if !self.drag.begin(press.column) {
                return;
            }
        }
        self.drag.hover(target);
    }

    fn pointer_up(&mut self, x: u16, y: u16) -> Result<(), RosterError> {
        let press = self.press.take();
        if self.drag.is_dragging() {
            // Only a header under the pointer accepts the drop.
            let Some(target) = self.header_under(x, y) else {
                self.drag.cancel();
                self.set_status_message("Column move canceled");
                return Ok(());
            };
            self.drag.hover(target);
            return self.finish_drag();
        }
        // Press and release on the same header without dragging is a click.
        if let Some(press) = press
            && self.header_under(x, y) == Some(press.column)
        {
            self.toggle_sort(press.column)?;
        }
        Ok(())
    }

    fn clipboard(&mut self) -> Option<&mut Clipboard> {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => error!("Clipboard unavailable: {e:?}"),
            }
        }
        self.clipboard.as_mut()
    }

    fn copy_text(&mut self, text: String, what: &str) {
        trace!("Copy {what}: {text}");
        let result = match self.clipboard() {
            Some(clipboard) => clipboard.set_text(text).map_err(|e| format!("{e}")),
            None => Err("no clipboard".to_string()),
        };
        match result {
            Ok(_) => self.set_status_message(format!("Copied {what} to clipboard")),
            Err(e) => {
                error!("Error copying to clipboard: {e}");
                self.set_status_message(format!("Could not copy {what}: {e}"));
            }
        }
    }

    fn current_person(&self) -> Option<&Person> {
        self.rows
            .get(self.cursor_row)
            .and_then(|&r| self.records.get(r))
    }

    fn copy_table_cell(&mut self) {
        let cell = self.current_person().zip(self.current_column()).and_then(|(p, id)| {
            self.columns.get(id).map(|def| def.render(p, &self.ctx))
        });
        if let Some(cell) = cell {
            self.copy_text(cell, "cell");
        }
    }

    fn copy_table_row(&mut self) {
        let row = self.current_person().map(|p| {
            self.order
                .ids()
                .iter()
                .filter_map(|id| self.columns.get(*id))
                .map(|def| def.render(p, &self.ctx))
                .collect::<Vec<_>>()
                .join("\t")
        });
        if let Some(row) = row {
            self.copy_text(row, "row");
        }
    }
}
