//! Step grid screen for the drum sequencer.

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use toybox::{
    sequencing::STEPS,
    voices::Voice,
    DrumSequencer,
};

use super::{
    render_help,
    transport::{render_transport, Transport},
    Flow, Screen,
};

const LABEL_WIDTH: u16 = 7;
const CELL_WIDTH: u16 = 3;
const BPM_COARSE_STEP: u32 = 10;

pub struct DrumScreen {
    sequencer: DrumSequencer,
    /// (voice row, step)
    cursor: (usize, usize),
    /// Cell rows from the last frame, without the header line.
    grid: Rect,
    status: String,
}

impl DrumScreen {
    pub fn new(sequencer: DrumSequencer) -> Self {
        let status = if sequencer.has_device() {
            String::new()
        } else {
            "audio device unavailable".to_string()
        };
        Self {
            sequencer,
            cursor: (0, 0),
            grid: Rect::default(),
            status,
        }
    }

    fn toggle(&mut self, row: usize, step: usize) {
        if let Some(&voice) = Voice::ALL.get(row) {
            self.sequencer.toggle_step(voice, step);
        }
    }

    fn nudge_bpm(&mut self, delta: i64, now: Instant) {
        let bpm = (self.sequencer.bpm() as i64 + delta).max(0) as u32;
        self.sequencer.set_bpm(bpm, now);
    }

    fn handle_key(&mut self, code: KeyCode, now: Instant) -> Flow {
        let (row, step) = self.cursor;
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Left => self.cursor.1 = (step + STEPS - 1) % STEPS,
            KeyCode::Right => self.cursor.1 = (step + 1) % STEPS,
            KeyCode::Up => self.cursor.0 = (row + Voice::COUNT - 1) % Voice::COUNT,
            KeyCode::Down => self.cursor.0 = (row + 1) % Voice::COUNT,
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle(row, step),
            KeyCode::Char('p') => {
                self.status = match self.sequencer.toggle_playback(now) {
                    Ok(_) => String::new(),
                    Err(err) => err.to_string(),
                };
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_bpm(1, now),
            KeyCode::Char('-') => self.nudge_bpm(-1, now),
            KeyCode::PageUp => self.nudge_bpm(BPM_COARSE_STEP as i64, now),
            KeyCode::PageDown => self.nudge_bpm(-(BPM_COARSE_STEP as i64), now),
            _ => {}
        }
        Flow::Continue
    }

    /// Grid cell under a terminal position, if any.
    fn cell_at(&self, column: u16, row: u16) -> Option<(usize, usize)> {
        let first_cell = self.grid.x + LABEL_WIDTH;
        if row < self.grid.y || column < first_cell {
            return None;
        }
        let voice = (row - self.grid.y) as usize;
        let step = ((column - first_cell) / CELL_WIDTH) as usize;
        (voice < Voice::COUNT && step < STEPS).then_some((voice, step))
    }

    fn render_grid(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" pattern ").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let playhead = self.sequencer.current_step();
        let mut header = vec![Span::raw(" ".repeat(LABEL_WIDTH as usize))];
        header.extend((0..STEPS).map(|step| {
            let style = if step % 4 == 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!("{:>2} ", step + 1), style)
        }));

        let mut lines = vec![Line::from(header)];
        for (row, voice) in Voice::ALL.into_iter().enumerate() {
            let mut spans = vec![Span::styled(
                format!("{:<width$}", voice.name(), width = LABEL_WIDTH as usize),
                Style::default().fg(Color::Cyan),
            )];
            for (step, &active) in self.sequencer.pattern().row(voice).iter().enumerate() {
                let color = if step == playhead && self.sequencer.is_running() {
                    Color::Red
                } else if active {
                    Color::Blue
                } else {
                    Color::DarkGray
                };
                let mut style = Style::default().fg(color);
                if self.cursor == (row, step) {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let glyph = if active { "[■]" } else { "[ ]" };
                spans.push(Span::styled(glyph, style));
            }
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines), inner);

        self.grid = Rect {
            y: inner.y + 1,
            height: inner.height.saturating_sub(1),
            ..inner
        };
    }
}

impl Screen for DrumScreen {
    fn handle_event(&mut self, event: Event, now: Instant) -> Flow {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key.code, now),
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    if let Some((row, step)) = self.cell_at(mouse.column, mouse.row) {
                        self.cursor = (row, step);
                        self.toggle(row, step);
                    }
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn tick(&mut self, now: Instant) {
        self.sequencer.poll(now);
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                        // Transport bar
                Constraint::Length(Voice::COUNT as u16 + 3), // Grid
                Constraint::Min(0),
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        let transport = Transport {
            bpm: self.sequencer.bpm(),
            running: self.sequencer.is_running(),
            step: self.sequencer.current_step(),
            sample_rate: self.sequencer.context().map(|ctx| ctx.sample_rate()),
        };
        render_transport(frame, chunks[0], &transport, &self.status);
        self.render_grid(frame, chunks[1]);
        render_help(
            frame,
            chunks[3],
            " [Arrows] Move  [Space] Toggle  [Click] Toggle  [P] Play/Stop  [+/-] BPM  [PgUp/PgDn] BPM ±10  [Q] Quit",
        );
    }

    fn shutdown(&mut self) {
        self.sequencer.teardown();
    }
}
