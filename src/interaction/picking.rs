use glam::{Vec2, Vec3};

use crate::config::CameraConfig;

/// Pixel size of the canvas receiving pointer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Screen pixels (origin top-left, y down) to normalized device coordinates.
    pub fn to_ndc(&self, screen: Vec2) -> Vec2 {
        let x = (screen.x / self.width) * 2.0 - 1.0;
        let y = -(screen.y / self.height) * 2.0 + 1.0;
        Vec2::new(x, y).clamp(Vec2::splat(-1.0), Vec2::splat(1.0))
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Perspective camera on the +z axis looking at the origin, used to turn a press into
/// a point on the object.
#[derive(Debug, Clone, Copy)]
pub struct PickCamera {
    position: Vec3,
    tan_half_fov: f32,
}

impl PickCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, config.distance),
            tan_half_fov: (config.fov_degrees.to_radians() * 0.5).tan(),
        }
    }

    pub fn ray(&self, ndc: Vec2, aspect: f32) -> (Vec3, Vec3) {
        let direction = Vec3::new(
            ndc.x * self.tan_half_fov * aspect,
            ndc.y * self.tan_half_fov,
            -1.0,
        )
        .normalize();
        (self.position, direction)
    }

    /// First hit of the ray through `ndc` with the origin-centered sphere of `radius`.
    pub fn pick_sphere(&self, ndc: Vec2, aspect: f32, radius: f32) -> Option<Vec3> {
        if radius <= 0.0 {
            return None;
        }
        let (origin, direction) = self.ray(ndc, aspect);

        let b = origin.dot(direction);
        let c = origin.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let t = if -b - root >= 0.0 { -b - root } else { -b + root };
        if t < 0.0 {
            return None;
        }
        Some(origin + direction * t)
    }
}
