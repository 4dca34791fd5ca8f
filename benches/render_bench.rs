//! Benchmarks for the render path.
//!
//! Run with: cargo bench
//!
//! Every device callback renders whole 128-frame quanta, so a quantum is the
//! unit that has to fit the real-time deadline:
//!   - 128 frames @ 48kHz = 2.67ms
//!
//! Benchmark groups:
//!   - dsp/*        Primitives (oscillator, convolver)
//!   - scenarios/*  Full graphs (synth chord through the effect chain, drum hits)

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use toybox::{
    device::OfflineBackend,
    dsp::{convolver::PartitionedConvolver, impulse::ImpulseResponse, oscillator::PhaseOscillator, Waveform},
    graph::{AudioContext, AudioGraph},
    ramp::ParameterRamp,
    voices::{trigger, Voice},
    DeviceConfig, GraphSettings, RENDER_QUANTUM,
};

const SAMPLE_RATE: f32 = 48_000.0;

fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let mut buffer = vec![0.0f32; RENDER_QUANTUM];

    for waveform in Waveform::ALL {
        let mut osc = PhaseOscillator::new(waveform);
        group.bench_function(waveform.name(), |b| {
            b.iter(|| osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE))
        });
    }

    group.finish();
}

fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolver");
    let input: Vec<f32> = (0..RENDER_QUANTUM).map(|i| (i as f32 * 0.1).sin()).collect();
    let mut output = vec![0.0f32; RENDER_QUANTUM];

    // Impulse lengths in seconds; 0.5 s is what the effect chain uses
    for seconds in [0.1f32, 0.5, 2.0] {
        let impulse = ImpulseResponse::noise(SAMPLE_RATE, seconds, 1.0, 7);
        let mut convolver = PartitionedConvolver::new(impulse.channel(0), RENDER_QUANTUM, 1.0);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{seconds}s")),
            &seconds,
            |b, _| b.iter(|| convolver.process(black_box(&input), black_box(&mut output))),
        );
    }

    group.finish();
}

fn bench_chord_graph(c: &mut Criterion) {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let Ok(mut graph) = AudioGraph::initialize(&backend, &DeviceConfig::default(), &GraphSettings::default()) else {
        return;
    };
    for frequency in [440.0, 550.0, 660.0] {
        let ctx = graph.context_mut();
        let osc = ctx.create_oscillator(Waveform::Sawtooth, frequency);
        ctx.start(osc, 0.0);
        graph.add_source(osc);
    }
    graph.set_wet_mix(0.5);

    c.bench_function("scenarios/chord_quantum", |b| {
        b.iter(|| black_box(backend.render(RENDER_QUANTUM)))
    });
}

fn bench_drum_hits(c: &mut Criterion) {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let Ok(mut ctx) = AudioContext::open(&backend, &DeviceConfig::default()) else {
        return;
    };

    c.bench_function("scenarios/all_voices_hit", |b| {
        b.iter(|| {
            for voice in Voice::ALL {
                let now = ctx.current_time();
                trigger(&mut ctx, voice, now);
            }
            black_box(backend.render(RENDER_QUANTUM))
        })
    });
}

criterion_group!(
    benches,
    bench_oscillator,
    bench_convolver,
    bench_chord_graph,
    bench_drum_hits,
);
criterion_main!(benches);
