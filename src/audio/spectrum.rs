use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::Arc;

use crate::config::AnalyserConfig;

/// One tick's one-sided magnitude spectrum, byte-normalized.
///
/// The length is fixed when the sampler is created. Silence is an all-zero frame of
/// the same length, never an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumFrame {
    bins: Vec<u8>,
}

impl SpectrumFrame {
    pub const MAX_VALUE: u8 = u8::MAX;

    pub fn zeroed(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.bins.iter().all(|&b| b == 0)
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub(crate) fn bins_mut(&mut self) -> &mut [u8] {
        &mut self.bins
    }

    pub fn clear(&mut self) {
        self.bins.fill(0);
    }
}

/// Windowed FFT that turns the latest time-domain window into a byte spectrum.
///
/// Magnitudes are smoothed per bin over time, converted to decibels and mapped linearly
/// from `[min_db, max_db]` onto `0..=255`.
pub struct SpectrumAnalyser {
    fft_size: usize,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing_time_constant: f32,
    min_db: f32,
    max_db: f32,
}

impl SpectrumAnalyser {
    pub fn new(config: &AnalyserConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft_size,
            fft,
            window: Self::blackman_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            smoothing_time_constant: config.smoothing_time_constant,
            min_db: config.min_db,
            max_db: config.max_db,
        }
    }

    fn blackman_window(size: usize) -> Vec<f32> {
        let a0 = 0.42;
        let a1 = 0.5;
        let a2 = 0.08;
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
            })
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyse `samples` (oldest first; shorter input is zero-padded at the front) into `out`.
    pub fn analyse_into(&mut self, samples: &[f32], out: &mut SpectrumFrame) {
        let take = samples.len().min(self.fft_size);
        let offset = self.fft_size - take;
        let recent = &samples[samples.len() - take..];

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < offset { 0.0 } else { recent[i - offset] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.smoothing_time_constant;
        let scale = 255.0 / (self.max_db - self.min_db);
        let n = self.fft_size as f32;

        for (k, byte) in out.bins_mut().iter_mut().enumerate().take(self.smoothed.len()) {
            let magnitude = self.buffer[k].norm() / n;
            let smoothed = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = smoothed;

            *byte = if smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                ((db - self.min_db) * scale).floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }

    /// Forget the temporal smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}
