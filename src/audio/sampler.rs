use anyhow::Result;
use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{SpectrumAnalyser, SpectrumFrame};
use crate::config::AnalyserConfig;

/// Blocks in flight between the audio thread and the sampler before new ones are dropped
const SIGNAL_QUEUE_BLOCKS: usize = 32;

/// Reading end of a live mono signal.
///
/// Whole sample blocks cross the thread boundary by value, so a reader never sees a
/// partially written block. The `live` flag is cleared by the owner while paused.
#[derive(Clone)]
pub struct SignalHandle {
    pub(crate) blocks: Receiver<Vec<f32>>,
    live: Arc<AtomicBool>,
    sample_rate: u32,
}

/// Writing end handed to whatever produces samples (usually the audio thread).
#[derive(Clone)]
pub struct SignalFeed {
    blocks: Sender<Vec<f32>>,
    live: Arc<AtomicBool>,
}

/// Create a connected feed/handle pair for a signal at `sample_rate`.
pub fn signal_channel(sample_rate: u32) -> (SignalFeed, SignalHandle) {
    let (tx, rx) = crossbeam_channel::bounded(SIGNAL_QUEUE_BLOCKS);
    let live = Arc::new(AtomicBool::new(true));
    (
        SignalFeed {
            blocks: tx,
            live: Arc::clone(&live),
        },
        SignalHandle {
            blocks: rx,
            live,
            sample_rate,
        },
    )
}

impl SignalFeed {
    /// Hand a block to the reader. Never blocks; returns false if the block was dropped.
    pub fn push(&self, block: Vec<f32>) -> bool {
        self.blocks.try_send(block).is_ok()
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl SignalHandle {
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Anything that can (possibly asynchronously) hand over a signal to sample from.
///
/// Acquisition may fail transiently, e.g. no output device yet; callers keep running
/// on silence and may try again later.
#[async_trait(?Send)]
pub trait SignalSource {
    async fn acquire(&mut self) -> Result<SignalHandle>;

    fn source_name(&self) -> &str;
}

/// Produces one spectrum per animation tick from an attached signal.
///
/// With no signal attached, or while the signal is paused, every call yields an
/// all-zero frame of the configured length.
pub struct FrequencySampler {
    analyser: SpectrumAnalyser,
    signal: Option<SignalHandle>,
    window: VecDeque<f32>,
    scratch: Vec<f32>,
    frame: SpectrumFrame,
    disconnected: bool,
}

impl FrequencySampler {
    pub fn new(config: &AnalyserConfig) -> Self {
        let analyser = SpectrumAnalyser::new(config);
        let fft_size = analyser.fft_size();
        let bins = analyser.bin_count();

        Self {
            analyser,
            signal: None,
            window: VecDeque::with_capacity(fft_size),
            scratch: Vec::with_capacity(fft_size),
            frame: SpectrumFrame::zeroed(bins),
            disconnected: false,
        }
    }

    pub fn attach(&mut self, signal: SignalHandle) {
        info!("🎧 Signal attached ({}Hz)", signal.sample_rate());
        self.signal = Some(signal);
        self.disconnected = false;
        self.window.clear();
        self.analyser.reset();
    }

    pub fn detach(&mut self) {
        if self.signal.take().is_some() {
            info!("Signal detached");
        }
        self.window.clear();
        self.analyser.reset();
        self.frame.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.signal.is_some()
    }

    /// True while a signal is attached and not paused.
    pub fn is_live(&self) -> bool {
        self.signal.as_ref().map_or(false, |s| s.is_live())
    }

    pub fn bin_count(&self) -> usize {
        self.frame.len()
    }

    /// Sample the signal for this tick. Never blocks.
    pub fn sample(&mut self) -> &SpectrumFrame {
        let Some(live) = self.signal.as_ref().map(|s| s.is_live()) else {
            return self.silence();
        };

        self.drain_signal();

        if !live {
            return self.silence();
        }

        let fft_size = self.analyser.fft_size();
        self.scratch.clear();
        self.scratch.extend(self.window.iter().copied());
        if self.scratch.len() < fft_size {
            let missing = fft_size - self.scratch.len();
            self.scratch.splice(0..0, std::iter::repeat(0.0).take(missing));
        }

        self.analyser.analyse_into(&self.scratch, &mut self.frame);
        &self.frame
    }

    fn silence(&mut self) -> &SpectrumFrame {
        self.frame.clear();
        self.analyser.reset();
        &self.frame
    }

    fn drain_signal(&mut self) {
        let Some(signal) = &self.signal else {
            return;
        };

        let fft_size = self.analyser.fft_size();
        loop {
            match signal.blocks.try_recv() {
                Ok(block) => {
                    let skip = block.len().saturating_sub(fft_size);
                    self.window.extend(block.into_iter().skip(skip));
                    while self.window.len() > fft_size {
                        self.window.pop_front();
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        debug!("Signal feed closed; holding last window");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
    }
}
