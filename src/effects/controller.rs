use glam::{Vec2, Vec3};

use super::smoothing::lerp;
use super::{SessionProfile, UniformSet};
use crate::audio::BandEnergies;
use crate::config::{MotionConfig, SmoothingConfig};
use crate::interaction::TouchSnapshot;

/// Everything a tick reads. None of it is mutated by the tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub bands: BandEnergies,
    pub is_playing: bool,
    pub profile: &'a SessionProfile,
    pub touch: TouchSnapshot,
    pub target_scale: f32,
    /// Rotation impulse from dragging since the previous tick (x: yaw input, y: pitch input)
    pub drag: Vec2,
}

/// Animation state carried from tick to tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub time: f64,
    pub scale: f32,
    pub touch_strength: f32,
    pub touch_point: Vec3,
    pub hue_base: f32,
    pub hue_range: f32,
    pub saturation: f32,
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub rotation: Vec3,
    pub is_playing: bool,
}

impl FrameState {
    /// Resting state showing `profile`'s colors at unit scale.
    pub fn new(profile: &SessionProfile) -> Self {
        Self {
            time: 0.0,
            scale: 1.0,
            touch_strength: 0.0,
            touch_point: Vec3::ZERO,
            hue_base: profile.hue_base,
            hue_range: profile.hue_range,
            saturation: profile.saturation,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            rotation: Vec3::ZERO,
            is_playing: false,
        }
    }

    /// Compute the state one tick of `dt` seconds later.
    ///
    /// Steps run in a fixed order: clock, scale, touch, color, bands, rotation. Rotation
    /// depends on the touch strength and bass computed earlier in the same tick.
    pub fn advance(
        &self,
        inputs: &FrameInputs<'_>,
        smoothing: &SmoothingConfig,
        motion: &MotionConfig,
        dt: f32,
    ) -> FrameState {
        let dt = dt.max(0.0);
        let alpha = |a: f32| smoothing.factor(a, dt);
        let mut next = self.clone();

        // 1. Clock
        next.time += dt as f64;

        // 2. Scale
        next.scale = lerp(self.scale, inputs.target_scale, alpha(smoothing.scale));

        // 3. Touch: point follows only while pressed; strength always eases
        let touch_target = if inputs.touch.active {
            inputs.touch.strength
        } else {
            0.0
        };
        next.touch_strength = lerp(self.touch_strength, touch_target, alpha(smoothing.touch));
        next.touch_point = if inputs.touch.active {
            inputs.touch.point
        } else {
            Vec3::ZERO
        };

        // 4. Session colors cross-fade
        let color = alpha(smoothing.color);
        next.hue_base = lerp(self.hue_base, inputs.profile.hue_base, color);
        next.hue_range = lerp(self.hue_range, inputs.profile.hue_range, color);
        next.saturation = lerp(self.saturation, inputs.profile.saturation, color);

        // 5. Bands; not playing is silent input
        let bands = if inputs.is_playing {
            inputs.bands
        } else {
            BandEnergies::SILENT
        };
        next.bass = lerp(self.bass, bands.bass, alpha(smoothing.bass));
        next.mid = lerp(self.mid, bands.mid, alpha(smoothing.mid));
        next.high = lerp(self.high, bands.high, alpha(smoothing.high));
        next.is_playing = inputs.is_playing;

        // 6. Rotation
        next.rotation.y += inputs.drag.x;
        next.rotation.x += inputs.drag.y;
        if next.touch_strength < motion.idle_threshold {
            next.rotation.y += dt * motion.idle_spin_y;
            next.rotation.x += dt * motion.idle_spin_x;
        }
        if inputs.is_playing {
            next.rotation.y += dt * next.bass * motion.bass_spin;
        }

        next
    }

    pub fn uniforms(&self) -> UniformSet {
        UniformSet {
            time: self.time as f32,
            bass_amplitude: self.bass,
            mid_amplitude: self.mid,
            high_amplitude: self.high,
            is_playing: self.is_playing,
            hue_base: self.hue_base,
            hue_range: self.hue_range,
            saturation: self.saturation,
            scale: self.scale,
            touch_point: self.touch_point,
            touch_strength: self.touch_strength,
            rotation: self.rotation,
        }
    }
}

/// Sole owner of the per-frame animation state.
pub struct UniformController {
    state: FrameState,
    smoothing: SmoothingConfig,
    motion: MotionConfig,
}

impl UniformController {
    pub fn new(profile: &SessionProfile, smoothing: SmoothingConfig, motion: MotionConfig) -> Self {
        Self {
            state: FrameState::new(profile),
            smoothing,
            motion,
        }
    }

    /// Advance one tick and publish the resulting uniforms (step 7).
    pub fn tick(&mut self, inputs: &FrameInputs<'_>, dt: f32) -> UniformSet {
        self.state = self.state.advance(inputs, &self.smoothing, &self.motion, dt);
        self.state.uniforms()
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Restart from rest, e.g. on engine restart. The clock starts over.
    pub fn reset(&mut self, profile: &SessionProfile) {
        self.state = FrameState::new(profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn inputs(profile: &SessionProfile) -> FrameInputs<'_> {
        FrameInputs {
            bands: BandEnergies::SILENT,
            is_playing: false,
            profile,
            touch: TouchSnapshot::released(),
            target_scale: 1.0,
            drag: Vec2::ZERO,
        }
    }

    fn controller(profile: &SessionProfile) -> UniformController {
        UniformController::new(profile, SmoothingConfig::default(), MotionConfig::default())
    }

    #[test]
    fn test_idle_silent_scenario() {
        let profile = SessionProfile::icosahedron();
        let mut controller = controller(&profile);
        let input = inputs(&profile);

        let mut previous_rotation = Vec3::ZERO;
        for _ in 0..120 {
            let u = controller.tick(&input, DT);
            assert_eq!(u.bass_amplitude, 0.0);
            assert_eq!(u.mid_amplitude, 0.0);
            assert_eq!(u.high_amplitude, 0.0);
            assert_eq!(u.touch_strength, 0.0);
            assert_eq!(u.scale, 1.0);
            assert!(u.rotation.y > previous_rotation.y);
            assert!(u.rotation.x > previous_rotation.x);
            previous_rotation = u.rotation;
        }
        assert!((controller.state().time - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_touch_attack_and_release() {
        let profile = SessionProfile::icosahedron();
        let mut controller = controller(&profile);
        let mut input = inputs(&profile);
        input.touch = TouchSnapshot::pressed(Vec3::new(0.3, 0.2, 0.8), 1.0);

        let mut ticks = 0;
        while controller.state().touch_strength < 0.99 {
            controller.tick(&input, DT);
            ticks += 1;
            assert!(ticks <= 25, "touch never reached full strength");
        }
        assert_eq!(controller.state().touch_point, Vec3::new(0.3, 0.2, 0.8));

        // Staying pressed holds the steady state
        for _ in 0..10 {
            controller.tick(&input, DT);
            assert!(controller.state().touch_strength >= 0.99);
        }

        input.touch = TouchSnapshot::released();
        let mut previous = controller.state().touch_strength;
        let mut ticks = 0;
        while controller.state().touch_strength > 0.01 {
            let u = controller.tick(&input, DT);
            assert!(u.touch_strength < previous);
            assert_eq!(u.touch_point, Vec3::ZERO);
            previous = u.touch_strength;
            ticks += 1;
            assert!(ticks <= 25, "touch never decayed");
        }
    }

    #[test]
    fn test_session_switch_cross_fades() {
        let a = SessionProfile::icosahedron();
        let b = SessionProfile::torus_knot();
        let mut controller = controller(&a);
        for _ in 0..5 {
            controller.tick(&inputs(&a), DT);
        }

        let color = SmoothingConfig::default().color;
        let max_hue_step = (a.hue_base - b.hue_base).abs() * color + 1e-6;
        let max_sat_step = (a.saturation - b.saturation).abs() * color + 1e-6;

        let mut previous = controller.state().clone();
        for _ in 0..300 {
            let u = controller.tick(&inputs(&b), DT);
            assert!((u.hue_base - previous.hue_base).abs() <= max_hue_step);
            assert!((u.saturation - previous.saturation).abs() <= max_sat_step);
            previous = controller.state().clone();
        }
        assert!((previous.hue_base - b.hue_base).abs() < 1e-3);
        assert!((previous.hue_range - b.hue_range).abs() < 1e-3);
    }

    #[test]
    fn test_color_fades_slower_than_touch() {
        let a = SessionProfile::icosahedron();
        let b = SessionProfile::torus_knot();
        let mut controller = controller(&a);
        let mut input = inputs(&b);
        input.touch = TouchSnapshot::pressed(Vec3::ZERO, 1.0);

        for _ in 0..10 {
            controller.tick(&input, DT);
        }
        let state = controller.state();
        let touch_progress = state.touch_strength;
        let hue_progress = (a.hue_base - state.hue_base) / (a.hue_base - b.hue_base);
        assert!(touch_progress > hue_progress);
    }

    #[test]
    fn test_bands_follow_only_while_playing() {
        let profile = SessionProfile::icosahedron();
        let mut controller = controller(&profile);
        let mut input = inputs(&profile);
        input.bands = BandEnergies {
            bass: 1.0,
            mid: 0.5,
            high: 0.25,
        };

        // Not playing: identical to silence
        controller.tick(&input, DT);
        assert_eq!(controller.state().bass, 0.0);

        input.is_playing = true;
        for _ in 0..200 {
            controller.tick(&input, DT);
        }
        let state = controller.state();
        assert!((state.bass - 1.0).abs() < 1e-3);
        assert!((state.mid - 0.5).abs() < 1e-3);
        assert!((state.high - 0.25).abs() < 1e-3);

        // Pausing decays at the band rates rather than resetting
        input.is_playing = false;
        let u = controller.tick(&input, DT);
        assert!(u.bass_amplitude > 0.8);
        assert!(!u.is_playing);
        for _ in 0..300 {
            controller.tick(&input, DT);
        }
        assert!(controller.state().bass < 1e-3);
    }

    #[test]
    fn test_bass_spins_faster() {
        let profile = SessionProfile::icosahedron();
        let mut quiet = controller(&profile);
        let mut loud = controller(&profile);
        let mut quiet_input = inputs(&profile);
        quiet_input.is_playing = true;
        let mut loud_input = quiet_input;
        loud_input.bands.bass = 1.0;

        for _ in 0..60 {
            quiet.tick(&quiet_input, DT);
            loud.tick(&loud_input, DT);
        }
        assert!(loud.state().rotation.y > quiet.state().rotation.y);
        assert_eq!(loud.state().rotation.x, quiet.state().rotation.x);
    }

    #[test]
    fn test_idle_rotation_pauses_while_touched() {
        let profile = SessionProfile::icosahedron();
        let mut controller = controller(&profile);
        let mut input = inputs(&profile);
        input.touch = TouchSnapshot::pressed(Vec3::ZERO, 1.0);

        for _ in 0..20 {
            controller.tick(&input, DT);
        }
        let before = controller.state().rotation;
        controller.tick(&input, DT);
        assert_eq!(controller.state().rotation, before);
    }

    #[test]
    fn test_drag_rotates_object() {
        let profile = SessionProfile::icosahedron();
        let mut controller = controller(&profile);
        let mut input = inputs(&profile);
        input.drag = Vec2::new(0.5, -0.25);

        let u = controller.tick(&input, 0.0);
        assert_eq!(u.rotation, Vec3::new(-0.25, 0.5, 0.0));
    }

    #[test]
    fn test_scale_eases_toward_target() {
        let profile = SessionProfile::icosahedron();
        let mut controller = controller(&profile);
        let mut input = inputs(&profile);
        input.target_scale = 2.0;

        let first = controller.tick(&input, DT).scale;
        assert!((first - 1.1).abs() < 1e-6);
        for _ in 0..200 {
            controller.tick(&input, DT);
        }
        assert!((controller.state().scale - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_advance_is_pure() {
        let profile = SessionProfile::icosahedron();
        let state = FrameState::new(&profile);
        let input = inputs(&profile);
        let smoothing = SmoothingConfig::default();
        let motion = MotionConfig::default();

        let a = state.advance(&input, &smoothing, &motion, DT);
        let b = state.advance(&input, &smoothing, &motion, DT);
        assert_eq!(a, b);
        assert_eq!(state, FrameState::new(&profile));
    }
}
