/// Exponential blend of `current` toward `target` by `alpha`.
///
/// The result is clamped to the span between the two inputs so float rounding can
/// never push a value past its target. A non-finite target or factor leaves `current`
/// unchanged; a non-finite `current` is replaced by the target.
pub fn lerp(current: f32, target: f32, alpha: f32) -> f32 {
    if !target.is_finite() || !alpha.is_finite() {
        return current;
    }
    if !current.is_finite() {
        return target;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let (lo, hi) = if current <= target { (current, target) } else { (target, current) };
    (current + (target - current) * alpha).clamp(lo, hi)
}

/// Rescale a per-tick blend factor for a tick of `dt` seconds.
///
/// `alpha` is tuned for ticks at `reference_fps`; a tick that covers two reference
/// intervals blends as if two ticks had run.
pub fn compensate(alpha: f32, dt: f32, reference_fps: f32) -> f32 {
    if dt <= 0.0 || reference_fps <= 0.0 {
        return 0.0;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let intervals = dt * reference_fps;
    (1.0 - (1.0 - alpha).powf(intervals)).clamp(0.0, 1.0)
}

/// A scalar that follows its target frame-over-frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedParameter {
    value: f32,
    alpha: f32,
}

impl SmoothedParameter {
    pub fn new(initial: f32, alpha: f32) -> Self {
        Self {
            value: initial,
            alpha: alpha.clamp(f32::EPSILON, 1.0),
        }
    }

    /// Blend toward `target` with the parameter's own factor and return the new value.
    pub fn update(&mut self, target: f32) -> f32 {
        self.value = lerp(self.value, target, self.alpha);
        self.value
    }

    /// Blend with an externally supplied factor (e.g. one compensated for frame time).
    pub fn update_with(&mut self, target: f32, alpha: f32) -> f32 {
        self.value = lerp(self.value, target, alpha);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}
