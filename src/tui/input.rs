use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::InputEvent;

// poll for input; the timeout doubles as the scheduler tick interval, so
// the main loop wakes at the tick rate even when no key arrives
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPause],
        KeyCode::Char('s') => vec![InputEvent::Stop],

        // transport navigation
        KeyCode::Char('n') | KeyCode::Right => vec![InputEvent::NextSong],
        KeyCode::Char('p') | KeyCode::Left => vec![InputEvent::PrevSong],

        // list cursor
        KeyCode::Up | KeyCode::Char('k') => vec![InputEvent::CursorUp],
        KeyCode::Down | KeyCode::Char('j') => vec![InputEvent::CursorDown],
        KeyCode::Enter => vec![InputEvent::PlaySelected],

        // sound settings
        KeyCode::Char('t') => vec![InputEvent::CycleTone],
        KeyCode::Char('g') => vec![InputEvent::CyclePitch],
        KeyCode::Char('[') => vec![InputEvent::NudgeBpm(-5)],
        KeyCode::Char(']') => vec![InputEvent::NudgeBpm(5)],

        KeyCode::Char('a') => vec![InputEvent::ToggleAutoplay],
        KeyCode::Char('x') => vec![InputEvent::ToggleThresholds],
        KeyCode::Char('r') => vec![InputEvent::ReloadPlaylist],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_keys_resolve_to_semantic_events() {
        assert_eq!(handle_key(KeyCode::Char(' ')), vec![InputEvent::PlayPause]);
        assert_eq!(handle_key(KeyCode::Char('s')), vec![InputEvent::Stop]);
        assert_eq!(handle_key(KeyCode::Right), vec![InputEvent::NextSong]);
        assert_eq!(handle_key(KeyCode::Char('[')), vec![InputEvent::NudgeBpm(-5)]);
        assert_eq!(handle_key(KeyCode::Esc), vec![InputEvent::Quit]);
        assert!(handle_key(KeyCode::Char('?')).is_empty());
    }
}
