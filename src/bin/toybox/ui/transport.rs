//! Transport bar widget - shows BPM, play state, playhead and device

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use toybox::sequencing::{clock::STEPS_PER_BEAT, STEPS};

pub struct Transport {
    pub bpm: u32,
    pub running: bool,
    pub step: usize,
    /// None when no output device could be opened
    pub sample_rate: Option<f32>,
}

pub fn render_transport(frame: &mut Frame, area: Rect, transport: &Transport, status: &str) {
    let block = Block::default().title(" toybox · drums ").borders(Borders::ALL);

    let play_symbol = if transport.running { "▶" } else { "⏸" };
    let play_state = if transport.running { "Playing" } else { "Stopped" };
    let beat = transport.step / STEPS_PER_BEAT as usize + 1;

    let device = match transport.sample_rate {
        Some(rate) => Span::styled(
            format!("{:.1}kHz  ", rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        None => Span::styled("no device  ", Style::default().fg(Color::Red)),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" BPM: {}  ", transport.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{} {}  ", play_symbol, play_state),
            Style::default().fg(if transport.running {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("Step {:>2}/{} | Beat {}  ", transport.step + 1, STEPS, beat),
            Style::default().fg(Color::White),
        ),
        device,
        Span::styled(status.to_string(), Style::default().fg(Color::Magenta)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
