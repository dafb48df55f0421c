use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ambient_visualizer::audio::{signal_channel, BandEnergies, StaticPlayback};
use ambient_visualizer::effects::{SessionTable, UniformSet};
use ambient_visualizer::interaction::InteractionEvent;
use ambient_visualizer::{Engine, EngineConfig};

#[derive(Parser)]
#[command(name = "uniform-dump")]
#[command(about = "Run a WAV file through the visualization engine and log every frame's uniforms")]
struct Args {
    /// WAV file to analyse
    #[arg()]
    input_file: PathBuf,

    /// Output file for JSON lines (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write each frame's packed 64-byte shader block to this file
    #[arg(long)]
    packed: Option<PathBuf>,

    #[arg(short, long, default_value = "session1")]
    session: String,

    /// JSON lines of { "at_seconds": f32, "event": InteractionEvent }
    #[arg(long)]
    events: Option<PathBuf>,

    #[arg(long, default_value = "60")]
    fps: u32,

    /// Seconds to keep rendering after the audio ends
    #[arg(long, default_value = "0")]
    tail: f32,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    sessions: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ScriptedEvent {
    at_seconds: f32,
    event: InteractionEvent,
}

#[derive(Serialize)]
struct DumpLine {
    frame: u64,
    bands: BandEnergies,
    uniforms: UniformSet,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Uniform dump: {:?}", args.input_file);

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let sessions = match &args.sessions {
        Some(path) => SessionTable::load(path)?,
        None => SessionTable::default(),
    };
    if args.fps == 0 {
        bail!("fps must be positive");
    }

    let (samples, sample_rate) = read_mono(&args.input_file)?;
    info!(
        "Read {} samples at {}Hz ({:.2}s)",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    let mut script = match &args.events {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    script.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
    let mut script = script.into_iter().peekable();

    let mut engine = Engine::new(config, sessions, &args.session)?;
    let input = engine.input();
    let (feed, handle) = signal_channel(sample_rate);
    engine.attach_signal(handle);
    let mut playback = StaticPlayback::new(args.session.clone(), true);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut packed = match &args.packed {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let dt = 1.0 / args.fps as f32;
    let chunk = (sample_rate / args.fps).max(1) as usize;
    let audio_frames = samples.len().div_ceil(chunk);
    let tail_frames = (args.tail.max(0.0) * args.fps as f32).round() as usize;
    let mut chunks = samples.chunks(chunk);

    for frame in 0..audio_frames + tail_frames {
        let now = frame as f32 * dt;
        while let Some(scripted) = script.next_if(|s| s.at_seconds <= now) {
            // The engine owns the receiver for the whole run
            let _ = input.send(scripted.event);
        }

        match chunks.next() {
            Some(block) => {
                feed.push(block.to_vec());
            }
            None if playback.playing => {
                playback.playing = false;
                feed.set_live(false);
                info!("Audio ended at frame {}", frame);
            }
            None => {}
        }

        let Some(uniforms) = engine.frame(&playback, dt) else {
            break;
        };

        let line = DumpLine {
            frame: frame as u64,
            bands: engine.band_energies(),
            uniforms,
        };
        writeln!(out, "{}", serde_json::to_string(&line)?)?;

        if let Some(packed) = packed.as_mut() {
            packed.write_all(bytemuck::bytes_of(&uniforms.to_shader()))?;
        }
    }

    out.flush()?;
    if let Some(mut packed) = packed {
        packed.flush()?;
    }
    engine.teardown();
    info!("Wrote {} frames", audio_frames + tail_frames);
    Ok(())
}

/// Decode a WAV file into mono f32 samples.
fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

fn load_script(path: &Path) -> Result<Vec<ScriptedEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ScriptedEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping event script line {}: {}", number + 1, e),
        }
    }

    info!("Loaded {} scripted events", events.len());
    Ok(events)
}
