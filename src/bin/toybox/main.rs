//! toybox - terminal host for the toy instruments
//!
//! Run with: cargo run -- synth
//!       or: cargo run -- drums --bpm 100

mod app;
mod ui;

use std::{fs::File, io::stdout, path::Path, path::PathBuf, sync::Mutex};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use tracing_subscriber::EnvFilter;

use toybox::{
    device::CpalBackend, dsp::Waveform, ChordTouchSynth, DeviceConfig, DrumSequencer,
    SequencerSettings, SynthSettings,
};

use ui::{grid::DrumScreen, touchpad::SynthScreen, Screen};

#[derive(Parser)]
#[command(name = "toybox")]
#[command(author, version, about = "Chord pad and drum machine in the terminal", long_about = None)]
struct Cli {
    /// Log destination; the terminal itself is taken by the UI
    #[arg(long, global = true, default_value = "toybox.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    instrument: Instrument,
}

#[derive(Subcommand)]
enum Instrument {
    /// Chord touch pad: x picks the root, y the chord
    Synth(SynthArgs),

    /// Sixteen-step kick/snare/hihat sequencer
    Drums(DrumArgs),
}

#[derive(Args)]
struct SynthArgs {
    /// Oscillator waveform (sine, square, sawtooth, triangle)
    #[arg(short, long, default_value_t = Waveform::Sine)]
    waveform: Waveform,

    /// Reverb amount, 0..1
    #[arg(short, long, default_value_t = 0.3)]
    reverb: f32,

    /// Delay time in seconds, 0..1
    #[arg(short, long, default_value_t = 0.3)]
    delay: f32,
}

#[derive(Args)]
struct DrumArgs {
    /// Tempo, 60..180
    #[arg(short, long, default_value_t = 120)]
    bpm: u32,
}

fn init_logging(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("toybox=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let mut screen: Box<dyn Screen> = match cli.instrument {
        Instrument::Synth(args) => {
            let settings = SynthSettings::default()
                .waveform(args.waveform)
                .reverb_amount(args.reverb)
                .delay_time(args.delay);
            tracing::info!(?settings, "starting chord synth");
            Box::new(SynthScreen::new(ChordTouchSynth::new(
                CpalBackend::new(),
                DeviceConfig::default(),
                settings,
            )))
        }
        Instrument::Drums(args) => {
            let settings = SequencerSettings::default().bpm(args.bpm);
            tracing::info!(?settings, "starting drum sequencer");
            Box::new(DrumScreen::new(DrumSequencer::new(
                CpalBackend::new(),
                DeviceConfig::default(),
                settings,
            )))
        }
    };

    let mut terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .wrap_err("failed to enable mouse capture")
        .and_then(|_| app::run(&mut terminal, screen.as_mut()));

    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}
