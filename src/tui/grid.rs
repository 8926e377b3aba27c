use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Block;

use crate::metronome::BEATS_PER_BAR;

const CELLS: usize = BEATS_PER_BAR as usize;

// one lamp per beat in the bar; the downbeat flashes in a different color,
// and a muted scheduler shows its pulse dimmed instead of lit
pub fn draw_beat_row(frame: &mut Frame, area: Rect, lit: Option<u32>, muted: bool) {
    let col_constraints = [Constraint::Ratio(1, CELLS as u32); CELLS];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(col_constraints)
        .split(area);

    for (idx, cell_area) in cols.iter().enumerate() {
        let is_lit = lit == Some(idx as u32);
        let style = if is_lit && muted {
            Style::default().fg(Color::Gray).bg(Color::DarkGray)
        } else if is_lit && idx == 0 {
            Style::default().fg(Color::LightRed).bg(Color::Red)
        } else if is_lit {
            Style::default().fg(Color::LightMagenta).bg(Color::Magenta)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default().border_style(style).style(style);
        frame.render_widget(block, *cell_area);
    }
}
