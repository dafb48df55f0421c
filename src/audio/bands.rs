use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::SpectrumFrame;

/// Normalized low/mid/high energies, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandEnergies {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

impl BandEnergies {
    pub const SILENT: BandEnergies = BandEnergies {
        bass: 0.0,
        mid: 0.0,
        high: 0.0,
    };
}

/// Bin index ranges of the three bands.
///
/// Ranges are disjoint and ordered low to high. A range that runs past the end of a
/// frame is clamped to the frame's length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandLayout {
    pub bass: Range<usize>,
    pub mid: Range<usize>,
    pub high: Range<usize>,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self {
            bass: 0..8,
            mid: 8..24,
            high: 24..64,
        }
    }
}

impl BandLayout {
    pub fn extract(&self, frame: &SpectrumFrame) -> BandEnergies {
        let bins = frame.bins();
        BandEnergies {
            bass: Self::normalized_sum(bins, &self.bass),
            mid: Self::normalized_sum(bins, &self.mid),
            high: Self::normalized_sum(bins, &self.high),
        }
    }

    fn normalized_sum(bins: &[u8], range: &Range<usize>) -> f32 {
        let end = range.end.min(bins.len());
        if range.start >= end {
            return 0.0;
        }

        let sum: u32 = bins[range.start..end].iter().map(|&b| b as u32).sum();
        let max = (end - range.start) as f32 * SpectrumFrame::MAX_VALUE as f32;
        (sum as f32 / max).clamp(0.0, 1.0)
    }
}

/// Reduce a spectrum to bass/mid/high energies with the default layout.
pub fn extract(frame: &SpectrumFrame) -> BandEnergies {
    BandLayout::default().extract(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_frame() {
        let energies = extract(&SpectrumFrame::zeroed(64));
        assert_eq!(energies, BandEnergies::SILENT);
    }

    #[test]
    fn test_saturated_frame() {
        let energies = extract(&SpectrumFrame::from_bins(vec![255; 64]));
        assert_eq!(energies.bass, 1.0);
        assert_eq!(energies.mid, 1.0);
        assert_eq!(energies.high, 1.0);
    }

    #[test]
    fn test_bands_are_independent() {
        let mut bins = vec![0u8; 64];
        bins[..8].fill(255);
        let energies = extract(&SpectrumFrame::from_bins(bins));
        assert_eq!(energies.bass, 1.0);
        assert_eq!(energies.mid, 0.0);
        assert_eq!(energies.high, 0.0);

        let mut bins = vec![0u8; 64];
        bins[30] = 255;
        let energies = extract(&SpectrumFrame::from_bins(bins));
        assert!((energies.high - 1.0 / 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_frame_clamps_ranges() {
        // High band clamps to 24..32, mid is whole, bass is whole
        let energies = extract(&SpectrumFrame::from_bins(vec![255; 32]));
        assert_eq!(energies.high, 1.0);
        assert_eq!(energies.mid, 1.0);

        // High and part of mid vanish entirely
        let energies = extract(&SpectrumFrame::from_bins(vec![255; 12]));
        assert_eq!(energies.bass, 1.0);
        assert_eq!(energies.mid, 1.0);
        assert_eq!(energies.high, 0.0);

        let energies = extract(&SpectrumFrame::from_bins(Vec::new()));
        assert_eq!(energies, BandEnergies::SILENT);
    }

    #[test]
    fn test_outputs_stay_in_unit_range() {
        let mut seed = 0x2545_f491u32;
        for _ in 0..200 {
            let bins: Vec<u8> = (0..64)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 17;
                    seed ^= seed << 5;
                    (seed & 0xff) as u8
                })
                .collect();
            let e = extract(&SpectrumFrame::from_bins(bins));
            for v in [e.bass, e.mid, e.high] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
