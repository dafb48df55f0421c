use anyhow::Result;
use clap::Parser;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

use ambient_visualizer::audio::{AudioPlayback, PlaybackStatus, Playlist};
use ambient_visualizer::effects::SessionTable;
use ambient_visualizer::interaction::{InteractionEvent, Viewport};
use ambient_visualizer::{Engine, EngineConfig};

/// Seconds between attempts to open the audio output after a failure
const ACQUIRE_RETRY_SECONDS: f32 = 5.0;

#[derive(Parser)]
#[command(name = "ambient-player")]
#[command(about = "Ambient audio player driving an audio-reactive visualization engine")]
struct Args {
    /// Playlist JSON: an array of { id, title, url }
    #[arg()]
    playlist: PathBuf,

    /// Session (track id) to start with
    #[arg(short, long, default_value = "session1")]
    session: String,

    /// Engine configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session profile table JSON
    #[arg(long)]
    sessions: Option<PathBuf>,

    /// Animation frames per second
    #[arg(long, default_value = "60")]
    fps: f32,

    /// Move on to the next session when a track ends
    #[arg(long)]
    advance: bool,

    /// Print every frame's uniforms to stdout as JSON lines
    #[arg(long)]
    emit_json: bool,

    /// Read interaction events (JSON lines) from stdin
    #[arg(long)]
    events_stdin: bool,

    #[arg(long, default_value = "1.0")]
    volume: f32,

    /// Canvas size used to map event coordinates
    #[arg(long, default_value = "1200")]
    width: f32,

    #[arg(long, default_value = "800")]
    height: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Starting ambient player");

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let sessions = match &args.sessions {
        Some(path) => SessionTable::load(path)?,
        None => SessionTable::default(),
    };
    let playlist = Playlist::load(&args.playlist)?;
    info!("Loaded playlist with {} tracks", playlist.tracks().len());

    // rodio's output stream is not Send; keep everything on one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args, config, sessions, playlist))
}

async fn run(
    args: Args,
    config: EngineConfig,
    sessions: SessionTable,
    playlist: Playlist,
) -> Result<()> {
    let fps = args.fps.max(1.0);
    let mut playback = AudioPlayback::new(playlist, &args.session, config.analyser.tap_block)?;
    playback.set_volume(args.volume);

    let mut engine = Engine::new(config, sessions, playback.active_session_id())?;
    engine.set_viewport(Viewport::new(args.width, args.height));

    if args.events_stdin {
        spawn_event_reader(engine.input());
    }

    let mut attached = engine.attach_from(&mut playback).await;
    if attached {
        playback.play();
        info!("▶️  Playing '{}'", playback.track_title());
    }

    let retry_frames = (ACQUIRE_RETRY_SECONDS * fps).max(1.0) as u64;
    let mut ticker = tokio::time::interval(Duration::from_secs_f32(1.0 / fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout().lock();
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        if !attached && engine.frame_count() % retry_frames == 0 {
            attached = engine.attach_from(&mut playback).await;
            if attached {
                playback.play();
            }
        }

        if playback.poll() {
            if !args.advance {
                info!("Track finished");
                break;
            }
            advance_session(&mut playback, &mut engine).await;
        }

        let Some(uniforms) = engine.frame(&playback, dt) else {
            break;
        };
        if args.emit_json {
            writeln!(stdout, "{}", serde_json::to_string(&uniforms)?)?;
        }
    }

    engine.teardown();
    playback.pause();
    info!("Ambient player stopped");
    Ok(())
}

async fn advance_session(playback: &mut AudioPlayback, engine: &mut Engine) {
    let Some(next) = playback
        .playlist()
        .next_after(playback.active_session_id())
        .map(str::to_string)
    else {
        return;
    };

    match playback.switch_session(&next).await {
        Ok(Some(signal)) => {
            engine.attach_signal(signal);
            playback.play();
            info!("▶️  Playing '{}'", playback.track_title());
        }
        Ok(None) => {}
        Err(e) => warn!("⚠️  Could not switch to '{}': {}", next, e),
    }
}

fn spawn_event_reader(input: Sender<InteractionEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InteractionEvent>(&line) {
                Ok(event) => {
                    if input.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Ignoring malformed event {:?}: {}", line, e),
            }
        }
    });
}
