//! TUI screens for the two instruments.

pub mod grid;
pub mod touchpad;
mod transport;

use std::time::Instant;

use crossterm::event::Event;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub enum Flow {
    Continue,
    Quit,
}

/// One instrument's UI.
pub trait Screen {
    fn handle_event(&mut self, event: Event, now: Instant) -> Flow;

    /// Called on every pass of the host loop.
    fn tick(&mut self, _now: Instant) {}

    fn render(&mut self, frame: &mut Frame);

    /// Stop sound and release the device.
    fn shutdown(&mut self);
}

/// Dim one-line key reference at the bottom of a screen.
pub fn render_help(frame: &mut Frame, area: Rect, text: &str) {
    let help = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}
