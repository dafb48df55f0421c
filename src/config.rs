use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::effects::smoothing;

/// Exponential smoothing factors, one per parameter class.
///
/// Each factor is a per-call blend weight in (0, 1]. Touch is fast and color is slow;
/// band energies and scale sit in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub scale: f32,
    pub touch: f32,
    pub color: f32,
    pub bass: f32,
    pub mid: f32,
    pub high: f32,

    /// Rescale every factor by the tick's elapsed time instead of applying it once per call
    pub frame_rate_compensation: bool,
    /// Tick rate the factors were tuned for
    pub reference_fps: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            scale: 0.10,
            touch: 0.20,
            color: 0.05,
            bass: 0.15,
            mid: 0.12,
            high: 0.10,
            frame_rate_compensation: false,
            reference_fps: 60.0,
        }
    }
}

impl SmoothingConfig {
    /// Effective blend factor for a tick of `dt` seconds.
    pub fn factor(&self, alpha: f32, dt: f32) -> f32 {
        if self.frame_rate_compensation {
            smoothing::compensate(alpha, dt, self.reference_fps)
        } else {
            alpha
        }
    }

    fn factors(&self) -> [(&'static str, f32); 6] {
        [
            ("scale", self.scale),
            ("touch", self.touch),
            ("color", self.color),
            ("bass", self.bass),
            ("mid", self.mid),
            ("high", self.high),
        ]
    }
}

/// Autonomous and input-driven rotation rates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Idle rotation only runs while touch strength is below this
    pub idle_threshold: f32,
    pub idle_spin_x: f32,      // rad/s
    pub idle_spin_y: f32,      // rad/s
    pub bass_spin: f32,        // rad/s at full bass
    pub drag_sensitivity: f32, // rad per NDC unit
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            idle_threshold: 0.1,
            idle_spin_x: 0.02,
            idle_spin_y: 0.05,
            bass_spin: 0.2,
            drag_sensitivity: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub press_strength: f32,
    /// Scale delta per pixel of change in pinch distance
    pub pinch_sensitivity: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Multiplier from NDC to the z=0 plane when the pick ray misses the shape
    pub ripple_plane_scale: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            press_strength: 1.0,
            pinch_sensitivity: 0.01,
            min_scale: 0.5,
            max_scale: 2.0,
            ripple_plane_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Time-domain window; the spectrum has half as many bins
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_db: f32,
    pub max_db: f32,
    /// Mono samples per block handed from the audio thread
    pub tap_block: usize,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 128,
            smoothing_time_constant: 0.8,
            min_db: -100.0,
            max_db: -30.0,
            tap_block: 256,
        }
    }
}

impl AnalyserConfig {
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 4.5,
            fov_degrees: 45.0,
        }
    }
}

/// Every tunable of the engine. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: SmoothingConfig,
    pub motion: MotionConfig,
    pub interaction: InteractionConfig,
    pub analyser: AnalyserConfig,
    pub camera: CameraConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, alpha) in self.smoothing.factors() {
            if !(alpha > 0.0 && alpha <= 1.0) {
                bail!("smoothing factor '{}' must lie in (0, 1], got {}", name, alpha);
            }
        }
        if self.smoothing.reference_fps <= 0.0 {
            bail!("reference_fps must be positive");
        }

        let interaction = &self.interaction;
        if interaction.min_scale <= 0.0 || interaction.min_scale > interaction.max_scale {
            bail!(
                "invalid scale bounds [{}, {}]",
                interaction.min_scale,
                interaction.max_scale
            );
        }

        let analyser = &self.analyser;
        if analyser.fft_size < 32 || !analyser.fft_size.is_power_of_two() {
            bail!("fft_size must be a power of two >= 32, got {}", analyser.fft_size);
        }
        if !(0.0..1.0).contains(&analyser.smoothing_time_constant) {
            bail!("smoothing_time_constant must lie in [0, 1)");
        }
        if analyser.min_db >= analyser.max_db {
            bail!("min_db ({}) must be below max_db ({})", analyser.min_db, analyser.max_db);
        }
        if analyser.tap_block == 0 {
            bail!("tap_block must be non-zero");
        }

        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            bail!("fov_degrees must lie in (0, 180)");
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(EngineConfig::default().analyser.bin_count(), 64);
    }

    #[test]
    fn test_rejects_bad_smoothing_factor() {
        let mut config = EngineConfig::default();
        config.smoothing.color = 0.0;
        assert!(config.validate().is_err());

        config.smoothing.color = 1.5;
        assert!(config.validate().is_err());

        config.smoothing.color = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_scale_bounds() {
        let mut config = EngineConfig::default();
        config.interaction.min_scale = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "smoothing": { "touch": 0.3 } }"#).unwrap();
        assert_eq!(config.smoothing.touch, 0.3);
        assert_eq!(config.smoothing.color, 0.05);
        assert_eq!(config.analyser.fft_size, 128);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("ambient_visualizer_config_test.json");
        let mut config = EngineConfig::default();
        config.motion.bass_spin = 0.4;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.motion.bass_spin, 0.4);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_compensated_factor() {
        let mut smoothing = SmoothingConfig::default();
        assert_eq!(smoothing.factor(0.2, 0.5), 0.2);

        smoothing.frame_rate_compensation = true;
        assert!(smoothing.factor(0.2, 2.0 / 60.0) > 0.2);
    }
}
