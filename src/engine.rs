use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};

use crate::audio::{
    BandEnergies, BandLayout, FrequencySampler, PlaybackStatus, SignalHandle, SignalSource,
};
use crate::config::EngineConfig;
use crate::effects::{FrameInputs, FrameState, SessionTable, UniformController, UniformSet};
use crate::interaction::{InteractionEvent, InteractionMachine, Viewport, ZoomTarget};

/// Frames between periodic debug summaries
const DEBUG_LOG_INTERVAL: u64 = 120;

/// The audio-reactive visualization engine.
///
/// Drive it with one `frame` call per display refresh. Input events may be queued from
/// anywhere through the sender returned by `input`; they are applied at the start of the
/// next frame.
pub struct Engine {
    config: EngineConfig,
    sessions: SessionTable,
    sampler: FrequencySampler,
    layout: BandLayout,
    interaction: InteractionMachine,
    zoom: ZoomTarget,
    controller: UniformController,
    events_tx: Sender<InteractionEvent>,
    events_rx: Receiver<InteractionEvent>,
    session_id: String,
    bands: BandEnergies,
    frame_count: u64,
    running: bool,
}

impl Engine {
    pub fn new(config: EngineConfig, sessions: SessionTable, initial_session: &str) -> Result<Self> {
        config.validate()?;

        if !sessions.contains(initial_session) {
            debug!(
                "No profile for session '{}', using '{}'",
                initial_session,
                sessions.default_id()
            );
        }
        let controller = UniformController::new(
            sessions.lookup(initial_session),
            config.smoothing.clone(),
            config.motion.clone(),
        );
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        let engine = Self {
            sampler: FrequencySampler::new(&config.analyser),
            layout: BandLayout::default(),
            interaction: InteractionMachine::new(&config),
            zoom: ZoomTarget::new(&config.interaction),
            controller,
            events_tx,
            events_rx,
            session_id: initial_session.to_string(),
            bands: BandEnergies::SILENT,
            frame_count: 0,
            running: true,
            config,
            sessions,
        };
        info!("🚀 Engine started with session '{}'", engine.session_id);
        Ok(engine)
    }

    /// Sender for pointer/touch/resize events.
    pub fn input(&self) -> Sender<InteractionEvent> {
        self.events_tx.clone()
    }

    pub fn attach_signal(&mut self, signal: SignalHandle) {
        self.sampler.attach(signal);
    }

    /// Detach the signal and return interaction to IDLE. Ticking continues on silence.
    pub fn detach_signal(&mut self) {
        self.sampler.detach();
        self.interaction.reset();
    }

    /// Attach whatever signal `playback` currently exposes. Returns false if it has none.
    pub fn attach_current(&mut self, playback: &dyn PlaybackStatus) -> bool {
        match playback.current_signal() {
            Some(signal) => {
                self.attach_signal(signal);
                true
            }
            None => false,
        }
    }

    /// Acquire a signal from `source` and attach it.
    ///
    /// Failure leaves the engine running on silence; the caller may retry.
    pub async fn attach_from<S: SignalSource + ?Sized>(&mut self, source: &mut S) -> bool {
        match source.acquire().await {
            Ok(signal) => {
                self.attach_signal(signal);
                true
            }
            Err(e) => {
                warn!("⚠️  Could not acquire signal from {}: {}", source.source_name(), e);
                false
            }
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.interaction.set_viewport(viewport);
    }

    /// Run one tick of `dt` seconds. Returns `None` once the engine is torn down.
    pub fn frame(&mut self, playback: &dyn PlaybackStatus, dt: f32) -> Option<UniformSet> {
        if !self.running {
            return None;
        }

        self.sync_session(playback.active_session_id());
        self.drain_events();

        self.bands = self.layout.extract(self.sampler.sample());
        let is_playing = playback.is_playing() && self.sampler.is_live();

        let inputs = FrameInputs {
            bands: self.bands,
            is_playing,
            profile: self.sessions.lookup(&self.session_id),
            touch: self.interaction.touch(),
            target_scale: self.zoom.value(),
            drag: self.interaction.take_drag(),
        };
        let uniforms = self.controller.tick(&inputs, dt);

        self.frame_count += 1;
        if self.frame_count % DEBUG_LOG_INTERVAL == 0 {
            debug!(
                "Frame {}: bass {:.2} mid {:.2} high {:.2} | touch {:.2} scale {:.2} | playing {}",
                self.frame_count,
                uniforms.bass_amplitude,
                uniforms.mid_amplitude,
                uniforms.high_amplitude,
                uniforms.touch_strength,
                uniforms.scale,
                uniforms.is_playing
            );
        }

        Some(uniforms)
    }

    fn sync_session(&mut self, session_id: &str) {
        if session_id == self.session_id {
            return;
        }
        info!("🎨 Session '{}' -> '{}'", self.session_id, session_id);
        if !self.sessions.contains(session_id) {
            debug!("No profile for session '{}', using default", session_id);
        }
        self.session_id = session_id.to_string();
    }

    fn drain_events(&mut self) {
        let profile = self.sessions.lookup(&self.session_id);
        let pick_radius = profile.bounding_radius() * self.controller.state().scale;

        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(delta) = self.interaction.handle(&event, pick_radius) {
                self.zoom.apply(delta);
            }
        }
    }

    /// Band energies extracted on the most recent frame, before smoothing.
    pub fn band_energies(&self) -> BandEnergies {
        self.bands
    }

    pub fn state(&self) -> &FrameState {
        self.controller.state()
    }

    pub fn target_scale(&self) -> f32 {
        self.zoom.value()
    }

    pub fn interaction(&self) -> &InteractionMachine {
        &self.interaction
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop ticking: detach the signal, drop queued input and return interaction to IDLE.
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.sampler.detach();
        self.interaction.reset();
        while self.events_rx.try_recv().is_ok() {}
        info!("Engine stopped after {} frames", self.frame_count);
    }

    /// Start again from rest after `teardown`. The clock restarts at zero.
    pub fn restart(&mut self) {
        self.interaction.reset();
        self.zoom.reset();
        self.bands = BandEnergies::SILENT;
        self.controller.reset(self.sessions.lookup(&self.session_id));
        self.frame_count = 0;
        self.running = true;
        info!("🚀 Engine restarted with session '{}'", self.session_id);
    }
}
