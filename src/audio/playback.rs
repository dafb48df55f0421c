use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use log::{info, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;

use super::{signal_channel, Playlist, SignalFeed, SignalHandle, SignalSource, TapSource};

/// What the visualization engine observes of playback. It never commands playback.
pub trait PlaybackStatus {
    /// Signal of the loaded track, if any
    fn current_signal(&self) -> Option<SignalHandle>;

    fn is_playing(&self) -> bool;

    fn active_session_id(&self) -> &str;
}

/// Fixed playback state, for offline rendering and tests.
#[derive(Clone)]
pub struct StaticPlayback {
    pub playing: bool,
    pub session: String,
    pub signal: Option<SignalHandle>,
}

impl StaticPlayback {
    pub fn new(session: impl Into<String>, playing: bool) -> Self {
        Self {
            playing,
            session: session.into(),
            signal: None,
        }
    }
}

impl PlaybackStatus for StaticPlayback {
    fn current_signal(&self) -> Option<SignalHandle> {
        self.signal.clone()
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn active_session_id(&self) -> &str {
        &self.session
    }
}

/// rodio-backed player for a playlist, one track per session.
///
/// The output device is opened lazily on first acquisition. Every loaded track is
/// wrapped in a `TapSource` so the sampler sees what is actually being played.
pub struct AudioPlayback {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    feed: Option<SignalFeed>,
    signal: Option<SignalHandle>,
    playlist: Playlist,
    current_session: String,
    tap_block: usize,
    volume: f32,
}

impl AudioPlayback {
    pub fn new(playlist: Playlist, initial_session: &str, tap_block: usize) -> Result<Self> {
        let current_session = playlist
            .resolve_session(initial_session)
            .ok_or_else(|| anyhow!("playlist is empty"))?
            .to_string();

        if current_session != initial_session {
            warn!(
                "Session '{}' not in playlist, starting with '{}'",
                initial_session, current_session
            );
        }

        Ok(Self {
            output: None,
            sink: None,
            feed: None,
            signal: None,
            playlist,
            current_session,
            tap_block,
            volume: 1.0,
        })
    }

    fn output_handle(&mut self) -> Result<OutputStreamHandle> {
        if self.output.is_none() {
            let (stream, handle) = OutputStream::try_default()?;
            info!("✅ Audio output opened");
            self.output = Some((stream, handle));
        }
        match &self.output {
            Some((_, handle)) => Ok(handle.clone()),
            None => bail!("audio output unavailable"),
        }
    }

    /// Decode the current session's track into a fresh, paused sink.
    async fn load_current(&mut self) -> Result<SignalHandle> {
        let handle = self.output_handle()?;
        let track = self
            .playlist
            .find(&self.current_session)
            .ok_or_else(|| anyhow!("no track for session '{}'", self.current_session))?
            .clone();

        let bytes = tokio::fs::read(&track.url).await?;
        let decoder = Decoder::new(Cursor::new(bytes))?;
        let sample_rate = decoder.sample_rate();

        let (feed, signal) = signal_channel(sample_rate);
        feed.set_live(false);
        let source = TapSource::new(decoder.convert_samples::<f32>(), feed.clone(), self.tap_block);

        let sink = Sink::try_new(&handle)?;
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.feed = Some(feed);
        self.signal = Some(signal.clone());

        info!("Loaded '{}' ({:?}, {}Hz)", track.title, track.url, sample_rate);
        Ok(signal)
    }

    pub fn play(&self) {
        if let (Some(sink), Some(feed)) = (&self.sink, &self.feed) {
            sink.play();
            feed.set_live(true);
            info!("Audio playback started");
        }
    }

    pub fn pause(&self) {
        if let (Some(sink), Some(feed)) = (&self.sink, &self.feed) {
            sink.pause();
            feed.set_live(false);
            info!("Audio playback paused");
        }
    }

    pub fn toggle_play(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, |sink| sink.empty())
    }

    /// Mark the signal silent once the sink has run dry. Returns true on the tick the
    /// track ends.
    pub fn poll(&mut self) -> bool {
        let ended = self.is_finished() && self.feed.as_ref().map_or(false, |f| f.is_live());
        if ended {
            if let Some(feed) = &self.feed {
                feed.set_live(false);
            }
            info!("Track '{}' ended", self.current_session);
        }
        ended
    }

    /// Switch to another session's track, resuming playback if it was playing.
    ///
    /// Returns the new signal, or `None` if nothing changed.
    pub async fn switch_session(&mut self, session: &str) -> Result<Option<SignalHandle>> {
        if session == self.current_session {
            return Ok(None);
        }
        if self.playlist.find(session).is_none() {
            warn!("Ignoring switch to unknown session '{}'", session);
            return Ok(None);
        }

        let was_playing = self.is_playing();
        self.pause();
        self.current_session = session.to_string();

        let signal = self.load_current().await?;
        if was_playing {
            self.play();
        }
        Ok(Some(signal))
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn track_title(&self) -> &str {
        self.playlist
            .find(&self.current_session)
            .map_or("", |t| t.title.as_str())
    }
}

impl PlaybackStatus for AudioPlayback {
    fn current_signal(&self) -> Option<SignalHandle> {
        self.signal.clone()
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .map_or(false, |sink| !sink.is_paused() && !sink.empty())
    }

    fn active_session_id(&self) -> &str {
        &self.current_session
    }
}

#[async_trait(?Send)]
impl SignalSource for AudioPlayback {
    async fn acquire(&mut self) -> Result<SignalHandle> {
        if let Some(signal) = &self.signal {
            return Ok(signal.clone());
        }
        self.load_current().await
    }

    fn source_name(&self) -> &str {
        "audio output"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Track;

    #[test]
    fn test_static_playback_reports_state() {
        let playback = StaticPlayback::new("session2", true);
        assert!(playback.is_playing());
        assert_eq!(playback.active_session_id(), "session2");
        assert!(playback.current_signal().is_none());
    }

    #[test]
    fn test_unknown_initial_session_uses_first_track() {
        let playlist = Playlist::new(vec![Track {
            id: "session1".into(),
            title: "Dawn".into(),
            url: "dawn.mp3".into(),
        }]);
        let playback = AudioPlayback::new(playlist, "nonexistent", 256).unwrap();
        assert_eq!(playback.active_session_id(), "session1");
        assert!(!playback.is_playing());
        assert!(playback.is_finished());
    }

    #[test]
    fn test_empty_playlist_is_rejected() {
        assert!(AudioPlayback::new(Playlist::default(), "session1", 256).is_err());
    }
}
