use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::player::PlaybackState;
use crate::shared::DisplayState;

use super::grid;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // now playing panel
            Constraint::Length(4), // bar counter + beat lamps
            Constraint::Min(5),    // playlist
            Constraint::Length(1), // status / key help
        ])
        .split(area);

    draw_now_playing(frame, sections[0], state);
    draw_beat(frame, sections[1], state);
    draw_playlist(frame, sections[2], state);
    draw_status(frame, sections[3], state);
}

fn draw_now_playing(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let state_label = match state.state {
        PlaybackState::Playing if state.muted => "playing (silenced)",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::Stopped => "stopped",
    };

    let mut title_spans = Vec::new();
    if !state.song_no.is_empty() {
        title_spans.push(Span::raw(format!("{}. ", state.song_no)));
    }
    title_spans.push(Span::styled(
        state.song_title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let mut info_spans = vec![Span::raw(state.song_bpm.clone())];
    for extra in [&state.song_infos, &state.progress] {
        if !extra.is_empty() {
            info_spans.push(Span::raw("   "));
            info_spans.push(Span::raw(extra.clone()));
        }
    }

    let settings_line = format!(
        "tone {}   pitch {}   autoplay {}   auto-stop/silence {}",
        state.tone.label(),
        state.pitch.label(),
        on_off(state.autoplay),
        on_off(state.thresholds),
    );

    let lines = vec![
        Line::from(title_spans),
        Line::from(info_spans),
        Line::styled(settings_line, Style::default().fg(Color::DarkGray)),
    ];
    let block = Block::default().borders(Borders::ALL).title(state_label);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_beat(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(8)])
        .split(area);

    let bar = Paragraph::new(vec![
        Line::styled("bar", Style::default().fg(Color::DarkGray)),
        Line::styled(
            state.bar_text.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(bar, cols[0]);
    grid::draw_beat_row(frame, cols[1], state.beat_cell, state.muted);
}

fn draw_playlist(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines = Vec::with_capacity(state.rows.len());
    for (idx, row) in state.rows.iter().enumerate() {
        let playing = state.now_playing == Some(idx);
        let cursor = if idx == state.cursor { '>' } else { ' ' };
        let marker = if playing { '*' } else { ' ' };
        let style = if playing {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else if idx == state.cursor {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut text = format!(
            "{cursor}{marker} {:>3}  {:<32} {:>8}",
            row.no, row.title, row.bpm_label
        );
        if !row.auto_label.is_empty() {
            text.push_str("  ");
            text.push_str(&row.auto_label);
        }
        lines.push(Line::styled(text, style));
    }

    // keep the cursor inside the bordered window
    let visible = area.height.saturating_sub(2) as usize;
    let offset = state.cursor.saturating_sub(visible.saturating_sub(1).max(1)) as u16;

    let title = format!("{}  [{}]", state.playlist_title, state.playlist_subtitle);
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let (text, style) = if state.status.is_empty() {
        (
            "space play/pause  s stop  n/p song  enter play  t tone  g pitch  [ ] tempo  a autoplay  x auto  r reload  q quit"
                .to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (state.status.clone(), Style::default().fg(Color::Yellow))
    };
    frame.render_widget(Paragraph::new(Line::styled(text, style)), area);
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
