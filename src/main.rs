mod audio;
mod audio_api;
mod error;
mod metronome;
mod middle;
mod pipeline;
mod player;
mod shared;
mod tui;

use std::path::PathBuf;
use std::time::Duration;

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use middle::Middle;
use pipeline::persistence;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let mut audio = audio::start_audio()?;

    let settings_dir = std::env::current_dir().unwrap_or_default();
    let (settings, settings_status) = match persistence::load_settings(&settings_dir) {
        Ok(Some(settings)) => (settings, None),
        Ok(None) => (persistence::Settings::default(), None),
        Err(e) => (
            persistence::Settings::default(),
            Some(format!("settings not restored: {e:#}")),
        ),
    };
    let mut middle = Middle::with_settings(settings);
    if let Some(status) = settings_status {
        middle.set_status(status);
    }

    // a playlist file on the command line replaces whatever was persisted
    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        middle.load_playlist_file(&path);
    }

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    // the input poll timeout is also the scheduler tick interval
    let tick_rate = Duration::from_millis(metronome::TICK_INTERVAL_MS);

    loop {
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds);
        })?;

        let events = tui::input::poll_input(tick_rate)?;
        for event in events {
            if event == InputEvent::Quit {
                // save before quitting
                let _ = persistence::save_settings(&settings_dir, &middle.settings());
                drop(term);
                drop(audio);
                return Ok(());
            }
            middle.handle_input(event, &mut audio);
        }

        middle.tick(&mut audio);

        // settings are written on every change, not only at quit
        if middle.take_dirty() {
            if let Err(e) = persistence::save_settings(&settings_dir, &middle.settings()) {
                middle.set_status(format!("settings not saved: {e:#}"));
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
