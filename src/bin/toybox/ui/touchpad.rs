//! Touch pad screen for the chord synth.
//!
//! The pad is the bordered area in the middle; the mouse drives it like a
//! finger. Each horizontal band is labelled with the chord it plays.

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use toybox::{
    instruments::{chords::CHORD_NAMES, chord_index, PointerEvent, Surface},
    ChordTouchSynth,
};

use super::{render_help, Flow, Screen};

const REVERB_STEP: f32 = 0.05;
const DELAY_STEP: f32 = 0.05;

pub struct SynthScreen {
    synth: ChordTouchSynth,
    /// Pad area from the last frame, in terminal cells.
    pad: Rect,
    status: String,
}

impl SynthScreen {
    pub fn new(synth: ChordTouchSynth) -> Self {
        Self {
            synth,
            pad: Rect::default(),
            status: "press i or touch the pad to start".to_string(),
        }
    }

    /// The pad as a surface whose far edges are the last cell row/column.
    fn surface(&self) -> Surface {
        Surface::new(
            self.pad.x as f32,
            self.pad.y as f32,
            self.pad.width.saturating_sub(1).max(1) as f32,
            self.pad.height.saturating_sub(1).max(1) as f32,
        )
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('i') => {
                self.status = match self.synth.initialize() {
                    Ok(()) => "running".to_string(),
                    Err(err) => err.to_string(),
                };
            }
            KeyCode::Char('w') => {
                let waveform = self.synth.settings().waveform.next();
                self.synth.set_waveform(waveform);
            }
            KeyCode::Char('[') => {
                let amount = self.synth.settings().reverb_amount - REVERB_STEP;
                self.synth.set_reverb_amount(amount);
            }
            KeyCode::Char(']') => {
                let amount = self.synth.settings().reverb_amount + REVERB_STEP;
                self.synth.set_reverb_amount(amount);
            }
            KeyCode::Char('-') => {
                let seconds = self.synth.settings().delay_time - DELAY_STEP;
                self.synth.set_delay_time(seconds);
            }
            KeyCode::Char('=') | KeyCode::Char('+') => {
                let seconds = self.synth.settings().delay_time + DELAY_STEP;
                self.synth.set_delay_time(seconds);
            }
            _ => {}
        }
        Flow::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let surface = self.surface();
        let event = PointerEvent::mouse(mouse.column as f32, mouse.row as f32);
        let inside = surface.contains(event.client_x, event.client_y);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if inside => {
                self.synth.pointer_down(event, &surface);
            }
            // A held drag clamps at the edge; hovering off the pad is a leave
            MouseEventKind::Drag(MouseButton::Left) => {
                self.synth.pointer_move(event, &surface);
            }
            MouseEventKind::Moved if inside => {
                self.synth.pointer_move(event, &surface);
            }
            MouseEventKind::Moved => self.synth.pointer_leave(),
            MouseEventKind::Up(MouseButton::Left) => self.synth.pointer_up(),
            _ => {}
        }
        if let Some(err) = self.synth.error() {
            self.status = err.to_string();
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" toybox · synth ").borders(Borders::ALL);
        let settings = self.synth.settings();

        let (state, color) = if self.synth.is_ready() {
            if self.synth.is_sounding() {
                ("● Playing", Color::Green)
            } else {
                ("○ Ready", Color::Green)
            }
        } else if self.synth.is_disabled() {
            ("✕ Disabled", Color::Red)
        } else {
            ("○ Idle", Color::Yellow)
        };

        let line = Line::from(vec![
            Span::styled(format!(" {state}  "), Style::default().fg(color)),
            Span::styled(
                format!("Wave: {}  ", settings.waveform),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("Reverb: {:.2}  ", settings.reverb_amount),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("Delay: {:.2}s  ", settings.delay_time),
                Style::default().fg(Color::White),
            ),
            Span::styled(self.status.clone(), Style::default().fg(Color::Magenta)),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_pad(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" pad ").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.pad = inner;

        // Label the first row of every chord band
        let rows = inner.height.saturating_sub(1).max(1) as f32;
        let mut previous = None;
        let labels: Vec<Line> = (0..inner.height)
            .map(|row| {
                let index = chord_index(1.0 - row as f32 / rows);
                if previous == Some(index) {
                    Line::default()
                } else {
                    previous = Some(index);
                    Line::styled(CHORD_NAMES[index], Style::default().fg(Color::DarkGray))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(labels), inner);

        if let Some(indicator) = self.synth.indicator() {
            let x = inner.x + (indicator.x_px.round() as u16).min(inner.width.saturating_sub(1));
            let y = inner.y + (indicator.y_px.round() as u16).min(inner.height.saturating_sub(1));
            let (r, g, b) = indicator.color.to_rgb();
            let dot = Paragraph::new(Span::styled("●", Style::default().fg(Color::Rgb(r, g, b))));
            frame.render_widget(dot, Rect::new(x, y, 1, 1).intersection(inner));
        }
    }
}

impl Screen for SynthScreen {
    fn handle_event(&mut self, event: Event, _now: Instant) -> Flow {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key.code),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Pad
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);
        self.render_pad(frame, chunks[1]);
        render_help(
            frame,
            chunks[2],
            " [Mouse] Play  [I] Start  [W] Waveform  [ [ ] ] Reverb  [-/=] Delay  [Q] Quit",
        );
    }

    fn shutdown(&mut self) {
        self.synth.teardown();
    }
}
