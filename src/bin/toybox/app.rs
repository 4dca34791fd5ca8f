//! Host loop: poll the instrument's timers, redraw, forward input.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event;
use ratatui::DefaultTerminal;

use crate::ui::{Flow, Screen};

/// Upper bound on how late a sequencer tick can be noticed.
const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// ~60fps
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Run until the screen asks to quit. The instrument is torn down before
/// this returns, whatever the outcome.
pub fn run(terminal: &mut DefaultTerminal, screen: &mut dyn Screen) -> EyreResult<()> {
    let result = event_loop(terminal, screen);
    screen.shutdown();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, screen: &mut dyn Screen) -> EyreResult<()> {
    let mut last_draw: Option<Instant> = None;

    loop {
        let now = Instant::now();
        screen.tick(now);

        if last_draw.map_or(true, |drawn| now.duration_since(drawn) >= FRAME_INTERVAL) {
            terminal.draw(|frame| screen.render(frame))?;
            last_draw = Some(now);
        }

        if event::poll(POLL_INTERVAL)? {
            let event = event::read()?;
            if let Flow::Quit = screen.handle_event(event, Instant::now()) {
                return Ok(());
            }
            // Show the effect of input right away
            last_draw = None;
        }
    }
}
