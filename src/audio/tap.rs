use rodio::Source;
use std::time::Duration;

use super::SignalFeed;

/// Pass-through `Source` that copies the samples it yields into a `SignalFeed`.
///
/// Interleaved frames are mixed down to mono and shipped in blocks of `block_len`
/// samples. Runs on the audio thread, so it never blocks: full queues drop blocks.
pub struct TapSource<S>
where
    S: Source<Item = f32>,
{
    inner: S,
    feed: SignalFeed,
    block: Vec<f32>,
    block_len: usize,
    channels: u16,
    frame_sum: f32,
    frame_pos: u16,
}

impl<S> TapSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, feed: SignalFeed, block_len: usize) -> Self {
        let channels = inner.channels().max(1);
        let block_len = block_len.max(1);
        Self {
            inner,
            feed,
            block: Vec::with_capacity(block_len),
            block_len,
            channels,
            frame_sum: 0.0,
            frame_pos: 0,
        }
    }

    fn record(&mut self, sample: f32) {
        self.frame_sum += sample;
        self.frame_pos += 1;

        if self.frame_pos >= self.channels {
            self.block.push(self.frame_sum / self.channels as f32);
            self.frame_sum = 0.0;
            self.frame_pos = 0;

            if self.block.len() >= self.block_len {
                let block = std::mem::replace(&mut self.block, Vec::with_capacity(self.block_len));
                // Dropped blocks only cost visual latency
                self.feed.push(block);
            }
        }
    }
}

impl<S> Iterator for TapSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        self.record(sample);
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> Source for TapSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::signal_channel;
    use rodio::buffer::SamplesBuffer;

    #[test]
    fn test_tap_passes_samples_through_and_mixes_to_mono() {
        let (feed, handle) = signal_channel(8000);
        let stereo: Vec<f32> = (0..8).flat_map(|i| [i as f32, -(i as f32) + 1.0]).collect();
        let source = SamplesBuffer::new(2, 8000, stereo.clone());

        let tap = TapSource::new(source, feed, 4);
        let played: Vec<f32> = tap.collect();
        assert_eq!(played, stereo);

        let mut mono = Vec::new();
        while let Ok(block) = handle.blocks.try_recv() {
            assert_eq!(block.len(), 4);
            mono.extend(block);
        }
        assert_eq!(mono.len(), 8);
        assert!(mono.iter().all(|&m| (m - 0.5).abs() < 1e-6));
    }
}
