use ambient_visualizer::audio::{
    extract, signal_channel, SpectrumAnalyser, SpectrumFrame, StaticPlayback,
};
use ambient_visualizer::config::AnalyserConfig;
use ambient_visualizer::effects::SessionTable;
use ambient_visualizer::{Engine, EngineConfig};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| 0.5 * (2.0 * std::f32::consts::PI * 3.0 * n as f32 / 128.0).sin())
        .collect()
}

fn frame_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame");

    let frame = SpectrumFrame::from_bins((0..64).map(|i| (i * 4) as u8).collect());
    group.bench_function("extract_bands", |b| b.iter(|| extract(black_box(&frame))));

    let mut analyser = SpectrumAnalyser::new(&AnalyserConfig::default());
    let samples = tone(128);
    let mut out = SpectrumFrame::zeroed(analyser.bin_count());
    group.bench_function("analyse_spectrum", |b| {
        b.iter(|| analyser.analyse_into(black_box(&samples), &mut out))
    });

    let mut engine = Engine::new(EngineConfig::default(), SessionTable::default(), "session1")
        .expect("default engine");
    let (feed, handle) = signal_channel(44_100);
    engine.attach_signal(handle);
    let playback = StaticPlayback::new("session1", true);
    let block = tone(735);
    group.bench_function("engine_frame", |b| {
        b.iter(|| {
            feed.push(block.clone());
            engine.frame(black_box(&playback), 1.0 / 60.0)
        })
    });

    group.finish();
}

criterion_group!(benches, frame_benchmark);
criterion_main!(benches);
