use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The complete per-tick parameter set handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformSet {
    pub time: f32,
    pub bass_amplitude: f32,
    pub mid_amplitude: f32,
    pub high_amplitude: f32,
    pub is_playing: bool,
    pub hue_base: f32,
    pub hue_range: f32,
    pub saturation: f32,
    pub scale: f32,
    pub touch_point: Vec3,
    pub touch_strength: f32,
    /// Euler angles (radians) of the object
    pub rotation: Vec3,
}

/// GPU layout of `UniformSet`: four 16-byte rows, vec3s padded by a scalar.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShaderUniforms {
    pub time: f32,
    pub bass_amplitude: f32,
    pub mid_amplitude: f32,
    pub high_amplitude: f32,

    pub is_playing: f32,
    pub hue_base: f32,
    pub hue_range: f32,
    pub saturation: f32,

    pub touch_point: [f32; 3],
    pub touch_strength: f32,

    pub rotation: [f32; 3],
    pub scale: f32,
}

impl From<&UniformSet> for ShaderUniforms {
    fn from(u: &UniformSet) -> Self {
        Self {
            time: u.time,
            bass_amplitude: u.bass_amplitude,
            mid_amplitude: u.mid_amplitude,
            high_amplitude: u.high_amplitude,
            is_playing: if u.is_playing { 1.0 } else { 0.0 },
            hue_base: u.hue_base,
            hue_range: u.hue_range,
            saturation: u.saturation,
            touch_point: u.touch_point.to_array(),
            touch_strength: u.touch_strength,
            rotation: u.rotation.to_array(),
            scale: u.scale,
        }
    }
}

impl UniformSet {
    pub fn to_shader(&self) -> ShaderUniforms {
        ShaderUniforms::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_block_layout() {
        assert_eq!(std::mem::size_of::<ShaderUniforms>(), 64);

        let set = UniformSet {
            time: 2.0,
            bass_amplitude: 0.5,
            mid_amplitude: 0.25,
            high_amplitude: 0.125,
            is_playing: true,
            hue_base: 0.75,
            hue_range: 0.2,
            saturation: 0.7,
            scale: 1.5,
            touch_point: Vec3::new(1.0, 2.0, 3.0),
            touch_strength: 0.9,
            rotation: Vec3::new(0.1, 0.2, 0.0),
        };
        let shader = set.to_shader();
        let words: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&shader));

        assert_eq!(words[4], 1.0);
        assert_eq!(&words[8..12], &[1.0, 2.0, 3.0, 0.9]);
        assert_eq!(words[15], 1.5);
    }
}
