use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Widget, Wrap,
    },
};

use crate::domain::RosterConfig;
use crate::model::{HeaderView, Model, RowView, UIData};

pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const CMDLINE_HEIGHT: usize = 1;
pub const SCROLLBAR_WIDTH: usize = 1;
/// Spacer between two columns.
pub const COLUMN_WIDTH_MARGIN: usize = 1;

const POPUP_WIDTH: u16 = 86;

#[derive(Debug)]
pub struct TableUI {
    header_style: Style,
    selected_style: Style,
    dragged_style: Style,
    drop_target_style: Style,
    zebra_style: Style,
}

impl TableUI {
    pub fn new(_config: &RosterConfig) -> Self {
        Self {
            header_style: Style::default().bg(Color::DarkGray).fg(Color::White).bold(),
            selected_style: Style::default().bg(Color::Blue).fg(Color::White),
            dragged_style: Style::default()
                .bg(Color::DarkGray)
                .fg(Color::Gray)
                .add_modifier(Modifier::DIM | Modifier::ITALIC),
            drop_target_style: Style::default().bg(Color::Cyan).fg(Color::Black).bold(),
            zebra_style: Style::default().bg(Color::Rgb(30, 30, 36)),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let data = model.get_uidata();
        let area = frame.area();

        let [header_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(TABLE_HEADER_HEIGHT as u16),
            Constraint::Fill(1),
            Constraint::Length(CMDLINE_HEIGHT as u16),
        ])
        .areas(area);
        let [table_area, scrollbar_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(SCROLLBAR_WIDTH as u16),
        ])
        .areas(body_area);

        self.render_header(data, header_area, frame.buffer_mut());
        self.render_rows(data, table_area, frame.buffer_mut());
        self.render_scrollbar(data, scrollbar_area, frame);
        self.render_statusline(data, status_area, frame);

        if data.show_popup {
            self.render_popup(data, area, frame);
        }
    }

    fn header_style(&self, header: &HeaderView) -> Style {
        if header.drop_target {
            self.drop_target_style
        } else if header.dragged {
            self.dragged_style
        } else if header.selected {
            self.header_style.underlined()
        } else {
            self.header_style
        }
    }

    fn render_header(&self, data: &UIData, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.header_style);
        for header in data.headers.iter() {
            let x = area.x.saturating_add(header.x);
            if x >= area.right() {
                continue;
            }
            let width = header.width.min(area.right() - x);
            let cell = Rect::new(x, area.y, width, 1);
            buf.set_style(cell, self.header_style(header));

            let mut label = header.label.clone();
            if let Some(direction) = header.sort {
                label.push(' ');
                label.push_str(direction.arrow());
            }
            buf.set_stringn(x, area.y, label, width as usize, self.header_style(header));
        }
    }

    fn row_style(&self, row: &RowView) -> Style {
        if row.selected {
            self.selected_style
        } else if row.position % 2 == 1 {
            self.zebra_style
        } else {
            Style::default()
        }
    }

    /// Places every materialized row at its offset, overscan rows fall outside the area.
    fn render_rows(&self, data: &UIData, area: Rect, buf: &mut Buffer) {
        let row_height = data.row_height.max(1) as i64;
        for row in data.rows.iter() {
            if row.y + row_height <= 0 || row.y >= area.height as i64 {
                continue;
            }
            let top = row.y.max(0) as u16;
            let bottom = ((row.y + row_height).min(area.height as i64)) as u16;
            let style = self.row_style(row);
            buf.set_style(
                Rect::new(area.x, area.y + top, area.width, bottom - top),
                style,
            );

            // Cell text sits on the first line of the row.
            if row.y < 0 {
                continue;
            }
            let y = area.y + row.y as u16;
            for (header, cell) in data.headers.iter().zip(row.cells.iter()) {
                let x = area.x.saturating_add(header.x);
                if x >= area.right() {
                    continue;
                }
                let width = header.width.min(area.right() - x) as usize;
                buf.set_stringn(x, y, cell, width, style);
            }
        }
    }

    fn render_scrollbar(&self, data: &UIData, area: Rect, frame: &mut Frame) {
        let content = data.total_height.saturating_sub(data.layout.table_height as u64) as usize;
        let mut state = ScrollbarState::new(content)
            .position(data.scroll_offset as usize)
            .viewport_content_length(data.layout.table_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None);
        frame.render_stateful_widget(scrollbar, area, &mut state);
    }

    fn render_statusline(&self, data: &UIData, area: Rect, frame: &mut Frame) {
        if data.active_cmdinput {
            let input = &data.cmdinput;
            let line = Line::from(vec![
                Span::from(input.prompt).bold(),
                Span::from(input.input.as_str()),
            ]);
            Paragraph::new(line).render(area, frame.buffer_mut());
            let cursor_x = area.x + (input.prompt.chars().count() + input.cursor_pos) as u16;
            frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let position = if data.nrows == 0 {
            "0/0".to_string()
        } else {
            format!("{}/{}", data.selected_row + 1, data.nrows)
        };
        let line = Line::from(vec![
            Span::from(format!(" {} ", data.name)).reversed(),
            Span::from(format!(" {position} ")).yellow(),
            Span::from(data.status_message.as_str()),
        ]);
        Paragraph::new(line).render(area, frame.buffer_mut());
    }

    fn render_popup(&self, data: &UIData, area: Rect, frame: &mut Frame) {
        let lines = data.popup_message.lines().count() as u16 + 2;
        let [popup] = Layout::horizontal([Constraint::Length(POPUP_WIDTH)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::vertical([Constraint::Length(lines)])
            .flex(Flex::Center)
            .areas(popup);

        frame.render_widget(Clear, popup);
        let block = Block::bordered().title(Line::from(" Help ".bold()).centered());
        Paragraph::new(data.popup_message.as_str())
            .wrap(Wrap { trim: false })
            .block(block)
            .render(popup, frame.buffer_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::tests::person;
    use crate::domain::Message;
    use chrono::NaiveDate;
    use ratatui::{Terminal, backend::TestBackend};

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn setup(width: u16, height: u16, people: usize) -> (Terminal<TestBackend>, Model, TableUI) {
        let cfg = RosterConfig::default()
            .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .with_overscan(3);
        let mut source: Vec<_> = (1..=people as u32)
            .map(|id| person(id, &format!("F{id}"), &format!("L{id}"), cfg.today))
            .collect();
        let model = Model::init(&cfg, &mut source, width as usize, height as usize).unwrap();
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        (terminal, model, TableUI::new(&cfg))
    }

    #[test]
    fn draws_header_in_column_order() {
        let (mut terminal, model, mut ui) = setup(160, 10, 3);
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let header = line(terminal.backend().buffer(), 0);
        let id = header.find("ID").unwrap();
        let first = header.find("First Name").unwrap();
        let dsr = header.find("Days Since").unwrap();
        assert!(id < first && first < dsr);
    }

    #[test]
    fn draws_rows_below_header() {
        let (mut terminal, model, mut ui) = setup(160, 10, 3);
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let buf = terminal.backend().buffer();
        assert!(line(buf, 1).contains("F1"));
        assert!(line(buf, 2).contains("F2"));
        assert!(line(buf, 3).contains("F3"));
        assert!(line(buf, 9).contains("1/3"));
    }

    #[test]
    fn draws_sort_arrow_and_reordered_header() {
        let (mut terminal, mut model, mut ui) = setup(160, 10, 3);
        model.update(Some(Message::ToggleSort)).unwrap();
        model.update(Some(Message::ToggleSort)).unwrap();
        model.update(Some(Message::MoveRight)).unwrap();
        model.update(Some(Message::MoveRight)).unwrap();
        model.update(Some(Message::PickColumn)).unwrap();
        model.update(Some(Message::MoveLeft)).unwrap();
        model.update(Some(Message::MoveLeft)).unwrap();
        model.update(Some(Message::Enter)).unwrap();

        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let buf = terminal.backend().buffer();
        let header = line(buf, 0);
        assert!(header.contains("ID ↓"));
        assert!(header.find("Last Name").unwrap() < header.find("ID").unwrap());
        // Descending by id puts the last record first.
        assert!(line(buf, 1).contains("F3"));
    }

    #[test]
    fn scrolled_table_only_shows_visible_rows() {
        let (mut terminal, mut model, mut ui) = setup(160, 10, 200);
        model.update(Some(Message::ScrollLines(100))).unwrap();
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let buf = terminal.backend().buffer();
        assert!(line(buf, 1).contains("F101"));
        assert!(!line(buf, 1).contains("F100 "));
        assert!(line(buf, 8).contains("F108"));
    }

    #[test]
    fn empty_table_draws_header_only() {
        let (mut terminal, model, mut ui) = setup(160, 6, 0);
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let buf = terminal.backend().buffer();
        assert!(line(buf, 0).contains("Email"));
        assert!(line(buf, 1).chars().take(150).all(|c| c == ' '));
        assert!(line(buf, 5).contains("0/0"));
    }

    #[test]
    fn help_popup_is_drawn() {
        let (mut terminal, mut model, mut ui) = setup(120, 40, 3);
        model.update(Some(Message::Help)).unwrap();
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let buf = terminal.backend().buffer();
        let all: String = (0..buf.area.height).map(|y| line(buf, y)).collect();
        assert!(all.contains("Help"));
        assert!(all.contains("pick up the current column"));
    }
}
