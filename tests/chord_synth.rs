use toybox::{
    device::OfflineBackend,
    dsp::Waveform,
    graph::{AudioGraph, Endpoint},
    instruments::{chord_synth::PLAY_LEVEL, PointerEvent, Surface, CHORDS},
    ramp::ParameterRamp,
    AudioError, ChordTouchSynth, DeviceConfig, GraphSettings, SynthSettings, RENDER_QUANTUM,
};

const SAMPLE_RATE: f32 = 48_000.0;

fn surface() -> Surface {
    Surface::new(0.0, 0.0, 100.0, 100.0)
}

fn synth(backend: &OfflineBackend) -> ChordTouchSynth {
    ChordTouchSynth::new(backend.clone(), DeviceConfig::default(), SynthSettings::default())
}

fn peak(frames: &[[f32; 2]]) -> f32 {
    frames
        .iter()
        .flat_map(|frame| frame.iter())
        .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
}

#[test]
fn first_touch_opens_the_device_and_plays() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    assert!(!backend.is_open());

    let indicator = synth.pointer_down(PointerEvent::mouse(50.0, 90.0), &surface());
    assert!(indicator.is_some());
    assert!(synth.is_ready());
    assert!(synth.is_sounding());
    assert_eq!(backend.streams_opened(), 1);

    let frames = backend.render_seconds(1.0);
    assert!(peak(&frames) > 0.01);
    assert!(frames.iter().flatten().all(|sample| sample.is_finite()));

    // Chain (5 nodes) plus three oscillators
    assert_eq!(backend.inspect(|r| r.node_count()), Some(8));
}

#[test]
fn pointer_position_picks_root_and_chord() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);

    // x = 0.5 → 600 Hz root; y = 0.1 (near the bottom) → major
    synth.pointer_down(PointerEvent::mouse(50.0, 90.0), &surface());
    backend.render_seconds(1.0);

    let oscillators = synth.oscillators().expect("synth is ready");
    let expected = [600.0, 750.0, 900.0];
    for (osc, target) in oscillators.iter().zip(expected) {
        let frequency = backend
            .inspect(|r| r.param_value(osc.frequency()))
            .flatten()
            .expect("oscillator is live");
        assert!((frequency - target).abs() < 0.5, "{frequency} != {target}");
    }

    let master = synth.graph().expect("synth is ready").master_gain();
    let level = backend.inspect(|r| r.param_value(master.gain())).flatten();
    assert!(level.is_some_and(|level| (level - PLAY_LEVEL).abs() < 1e-3));
}

#[test]
fn release_fades_the_master_gain_out() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.pointer_down(PointerEvent::mouse(20.0, 20.0), &surface());
    backend.render_seconds(0.5);

    synth.pointer_up();
    assert!(!synth.is_sounding());
    backend.render_seconds(1.5);

    let master = synth.graph().expect("synth is ready").master_gain();
    let level = backend.inspect(|r| r.param_value(master.gain())).flatten();
    assert_eq!(level, Some(0.0));

    // Oscillators keep running silently
    assert_eq!(backend.inspect(|r| r.node_count()), Some(8));
}

#[test]
fn drag_past_the_edge_keeps_sounding_at_the_edge() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.pointer_down(PointerEvent::mouse(99.0, 50.0), &surface());
    backend.render_seconds(0.1);

    let indicator = synth
        .pointer_move(PointerEvent::mouse(101.0, 50.0), &surface())
        .expect("clamped onto the right edge");
    assert_eq!(indicator.x_px, 100.0);
    assert!(synth.is_sounding());
    backend.render_seconds(1.0);

    // x = 1 → 1100 Hz root; y = 0.5 → third chord
    let expected = CHORDS[2].frequencies(1100.0);
    let oscillators = synth.oscillators().expect("synth is ready");
    for (osc, target) in oscillators.iter().zip(expected) {
        let frequency = backend
            .inspect(|r| r.param_value(osc.frequency()))
            .flatten()
            .expect("oscillator is live");
        assert!((frequency - target).abs() < 0.5, "{frequency} != {target}");
    }

    let master = synth.graph().expect("synth is ready").master_gain();
    let level = backend.inspect(|r| r.param_value(master.gain())).flatten();
    assert!(level.is_some_and(|level| (level - PLAY_LEVEL).abs() < 1e-3));
}

#[test]
fn touches_outside_the_surface_clamp() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);

    let indicator = synth
        .pointer_down(PointerEvent::mouse(-5.0, 50.0), &surface())
        .expect("clamped onto the left edge");
    assert_eq!(indicator.x_px, 0.0);
    assert!(synth.is_ready());
    assert!(synth.is_sounding());
    assert_eq!(backend.streams_opened(), 1);
}

#[test]
fn non_finite_positions_are_ignored() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);

    assert!(synth
        .pointer_down(PointerEvent::mouse(f32::NAN, 50.0), &surface())
        .is_none());
    assert!(!synth.is_ready());
    assert_eq!(backend.streams_opened(), 0);
}

#[test]
fn pointer_leave_releases() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.pointer_down(PointerEvent::mouse(50.0, 50.0), &surface());
    assert!(synth.is_sounding());

    synth.pointer_leave();
    assert!(!synth.is_sounding());
    synth.pointer_leave();
    backend.render_seconds(1.5);

    let master = synth.graph().expect("synth is ready").master_gain();
    let level = backend.inspect(|r| r.param_value(master.gain())).flatten();
    assert_eq!(level, Some(0.0));
}

#[test]
fn missing_device_disables_the_synth() {
    let backend = OfflineBackend::unavailable();
    let mut synth = synth(&backend);

    assert!(synth
        .pointer_down(PointerEvent::mouse(50.0, 50.0), &surface())
        .is_none());
    assert!(synth.is_disabled());
    assert!(matches!(synth.error(), Some(AudioError::DeviceUnavailable(_))));

    // Further gestures do nothing until an explicit initialize
    synth.pointer_move(PointerEvent::mouse(40.0, 40.0), &surface());
    assert!(synth.is_disabled());
    assert!(!synth.is_sounding());
    assert!(synth.initialize().is_err());
}

#[test]
fn reinitialize_replaces_the_session() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.initialize().expect("device available");
    synth.initialize().expect("device available");

    assert_eq!(backend.streams_opened(), 2);
    assert!(backend.is_open());
    backend.render(256);
    assert_eq!(backend.inspect(|r| r.node_count()), Some(8));
}

#[test]
fn teardown_closes_the_device_and_is_repeatable() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.pointer_down(PointerEvent::mouse(50.0, 50.0), &surface());
    assert!(backend.is_open());

    synth.teardown();
    synth.teardown();
    assert!(!synth.is_ready());
    assert!(!backend.is_open());
    assert!(synth.oscillators().is_none());
    assert!(peak(&backend.render(512)) == 0.0);
}

#[test]
fn dropping_the_synth_closes_the_device() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    {
        let mut synth = synth(&backend);
        synth.initialize().expect("device available");
        assert!(backend.is_open());
    }
    assert!(!backend.is_open());
}

#[test]
fn waveform_switch_reaches_every_oscillator() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.initialize().expect("device available");

    synth.set_waveform(Waveform::Square);
    backend.render(128);

    assert_eq!(synth.settings().waveform, Waveform::Square);
    for osc in synth.oscillators().expect("synth is ready") {
        assert_eq!(
            backend.inspect(|r| r.waveform(osc.id())).flatten(),
            Some(Waveform::Square)
        );
    }
}

#[test]
fn reverb_amount_is_clamped_and_crossfades() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);
    synth.initialize().expect("device available");

    synth.set_reverb_amount(3.0);
    assert_eq!(synth.settings().reverb_amount, 1.0);
    backend.render_seconds(0.2);

    let graph = synth.graph().expect("synth is ready");
    let wet = backend.inspect(|r| r.param_value(graph.wet_gain().gain())).flatten();
    let dry = backend.inspect(|r| r.param_value(graph.dry_gain().gain())).flatten();
    assert_eq!(wet, Some(1.0));
    assert_eq!(dry, Some(0.0));

    // Still one path per gain to the output
    assert_eq!(
        backend.inspect(|r| r.is_connected(graph.wet_gain().id(), Endpoint::Destination)),
        Some(true)
    );
}

#[derive(Clone, Copy)]
enum Branch {
    Wet,
    Dry,
}

/// One second of a sawtooth through the effect chain at `wet_mix`,
/// optionally with one of the two output gains unplugged.
fn render_through_chain(wet_mix: f32, unplug: Option<Branch>) -> Vec<[f32; 2]> {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let settings = GraphSettings::default().wet_mix(wet_mix);
    let mut graph =
        AudioGraph::initialize(&backend, &DeviceConfig::default(), &settings).expect("device available");

    let master = graph.master_gain();
    let ctx = graph.context_mut();
    let osc = ctx.create_oscillator(Waveform::Sawtooth, 330.0);
    ctx.start(osc, 0.0);
    ctx.set_immediate(master.gain(), 0.5, 0.0);
    graph.add_source(osc);

    if let Some(branch) = unplug {
        let gain = match branch {
            Branch::Wet => graph.wet_gain(),
            Branch::Dry => graph.dry_gain(),
        };
        graph.context_mut().disconnect_from(gain, Endpoint::Destination);
    }

    backend.render_seconds(1.0)
}

#[test]
fn no_reverb_means_the_convolver_is_not_heard() {
    let full = render_through_chain(0.0, None);
    let without_wet = render_through_chain(0.0, Some(Branch::Wet));

    assert!(peak(&full) > 0.01);
    assert_eq!(full, without_wet);
}

#[test]
fn full_reverb_means_the_dry_path_is_not_heard() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let settings = GraphSettings::default().wet_mix(1.0);
    let mut graph =
        AudioGraph::initialize(&backend, &DeviceConfig::default(), &settings).expect("device available");
    let master = graph.master_gain();
    let ctx = graph.context_mut();
    let osc = ctx.create_oscillator(Waveform::Sawtooth, 330.0);
    ctx.start(osc, 0.0);
    ctx.set_immediate(master.gain(), 0.5, 0.0);
    graph.add_source(osc);

    let (wet, dry) = (graph.wet_gain().id(), graph.dry_gain().id());
    let mut wet_heard = false;
    for _ in 0..(SAMPLE_RATE as usize / RENDER_QUANTUM) {
        backend.render(RENDER_QUANTUM);
        let (dry_peak, output_is_wet, wet_peak) = backend
            .inspect(|r| {
                let dry_peak = r.node_output(dry).map(|block| block.peak());
                let wet_block = r.node_output(wet);
                (
                    dry_peak,
                    wet_block == Some(r.last_quantum()),
                    wet_block.map_or(0.0, |block| block.peak()),
                )
            })
            .expect("device open");
        assert_eq!(dry_peak, Some(0.0));
        assert!(output_is_wet);
        wet_heard |= wet_peak > 0.0;
    }
    assert!(wet_heard);
}

#[test]
fn settings_persist_across_teardown() {
    let backend = OfflineBackend::new(SAMPLE_RATE);
    let mut synth = synth(&backend);

    synth.set_delay_time(0.75);
    synth.set_waveform(Waveform::Triangle);
    synth.initialize().expect("device available");
    backend.render(128);

    let graph = synth.graph().expect("synth is ready");
    let delay = backend
        .inspect(|r| r.param_value(graph.delay().delay_time()))
        .flatten()
        .expect("delay is live");
    assert!((delay - 0.75).abs() < 1e-6);

    let osc = synth.oscillators().expect("synth is ready")[0];
    assert_eq!(
        backend.inspect(|r| r.waveform(osc.id())).flatten(),
        Some(Waveform::Triangle)
    );
}
