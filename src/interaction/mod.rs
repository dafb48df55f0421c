pub mod picking;

pub use picking::{PickCamera, Viewport};

use glam::{Vec2, Vec3};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{EngineConfig, InteractionConfig};

/// Raw pointer/touch input in screen pixels. The caller marks events that start on
/// interactive chrome (buttons, seek bar, drawers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InteractionEvent {
    PressStart {
        position: Vec2,
        #[serde(default)]
        on_chrome: bool,
    },
    PressMove {
        position: Vec2,
    },
    PressEnd,
    TouchStart {
        contacts: Vec<Vec2>,
        #[serde(default)]
        on_chrome: bool,
    },
    TouchMove {
        contacts: Vec<Vec2>,
    },
    TouchEnd {
        /// Contacts still down after this one lifted
        remaining: usize,
    },
    Resize {
        width: f32,
        height: f32,
    },
}

/// The live press. Exists only while PRESSING.
#[derive(Debug, Clone)]
pub struct TouchState {
    pub point: Vec3,
    pub strength: f32,
    pub active: bool,
    pub started_at: Instant,
    pub updated_at: Instant,
}

/// What a tick reads from the interaction layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSnapshot {
    pub active: bool,
    pub point: Vec3,
    /// Target strength; the controller smooths toward it
    pub strength: f32,
}

impl TouchSnapshot {
    pub fn released() -> Self {
        Self {
            active: false,
            point: Vec3::ZERO,
            strength: 0.0,
        }
    }

    pub fn pressed(point: Vec3, strength: f32) -> Self {
        Self {
            active: true,
            point,
            strength,
        }
    }
}

/// Press/move/release and two-contact pinch tracking.
///
/// The press track is IDLE or PRESSING; the pinch track is PINCH_IDLE or PINCHING. They
/// are kept apart by contact count: a second contact turns a press into a pinch.
pub struct InteractionMachine {
    config: InteractionConfig,
    drag_sensitivity: f32,
    camera: PickCamera,
    viewport: Viewport,
    press: Option<TouchState>,
    last_ndc: Vec2,
    pinch_distance: Option<f32>,
    pending_drag: Vec2,
}

impl InteractionMachine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.interaction.clone(),
            drag_sensitivity: config.motion.drag_sensitivity,
            camera: PickCamera::new(&config.camera),
            viewport: Viewport::default(),
            press: None,
            last_ndc: Vec2::ZERO,
            pinch_distance: None,
            pending_drag: Vec2::ZERO,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Apply one event. Returns the scale delta when the event was a pinch move.
    ///
    /// `pick_radius` is the radius of the currently displayed shape, used to place the
    /// touch point on its surface.
    pub fn handle(&mut self, event: &InteractionEvent, pick_radius: f32) -> Option<f32> {
        match event {
            InteractionEvent::PressStart {
                position,
                on_chrome,
            } => {
                self.press_start(*position, *on_chrome, pick_radius);
                None
            }
            InteractionEvent::PressMove { position } => {
                self.press_move(*position, pick_radius);
                None
            }
            InteractionEvent::PressEnd => {
                self.press_end();
                None
            }
            InteractionEvent::TouchStart {
                contacts,
                on_chrome,
            } => {
                if *on_chrome {
                    return None;
                }
                match contacts.as_slice() {
                    [single] => {
                        self.press_start(*single, false, pick_radius);
                    }
                    [_, _] => {
                        self.pinch_start(contacts);
                    }
                    _ => debug!("Ignoring touch start with {} contacts", contacts.len()),
                }
                None
            }
            InteractionEvent::TouchMove { contacts } => match contacts.as_slice() {
                [_, _] => self.pinch_move(contacts),
                // Too few contacts for a running pinch is rejected by pinch_move
                [] | [_] if self.is_pinching() => self.pinch_move(contacts),
                [single] => {
                    self.press_move(*single, pick_radius);
                    None
                }
                _ => {
                    debug!("Ignoring touch move with {} contacts", contacts.len());
                    None
                }
            },
            InteractionEvent::TouchEnd { remaining } => {
                if *remaining < 2 {
                    self.pinch_end();
                }
                if *remaining == 0 {
                    self.press_end();
                }
                None
            }
            InteractionEvent::Resize { width, height } => {
                self.set_viewport(Viewport::new(*width, *height));
                None
            }
        }
    }

    /// IDLE → PRESSING. Returns false when the press was ignored.
    pub fn press_start(&mut self, screen: Vec2, on_chrome: bool, pick_radius: f32) -> bool {
        if on_chrome || self.is_pinching() {
            return false;
        }

        let ndc = self.viewport.to_ndc(screen);
        let point = self.resolve_point(ndc, pick_radius);
        let now = Instant::now();
        let strength = self.config.press_strength;

        match self.press.as_mut() {
            // Re-press keeps the running press
            Some(state) => {
                state.point = point;
                state.strength = strength;
                state.updated_at = now;
            }
            None => {
                self.press = Some(TouchState {
                    point,
                    strength,
                    active: true,
                    started_at: now,
                    updated_at: now,
                });
            }
        }
        self.last_ndc = ndc;
        true
    }

    /// PRESSING self-transition. Moves without a press (hover) are ignored.
    pub fn press_move(&mut self, screen: Vec2, pick_radius: f32) -> bool {
        if self.press.is_none() {
            return false;
        }

        let ndc = self.viewport.to_ndc(screen);
        let point = self.resolve_point(ndc, pick_radius);
        self.pending_drag += (ndc - self.last_ndc) * self.drag_sensitivity;
        self.last_ndc = ndc;

        if let Some(state) = self.press.as_mut() {
            state.point = point;
            state.updated_at = Instant::now();
        }
        true
    }

    /// PRESSING → IDLE. The strength target drops to zero at once.
    pub fn press_end(&mut self) -> bool {
        self.press.take().is_some()
    }

    pub fn pinch_start(&mut self, contacts: &[Vec2]) -> bool {
        let [a, b] = contacts else {
            return false;
        };
        if self.press.take().is_some() {
            debug!("Second contact turned press into pinch");
        }
        self.pinch_distance = Some(a.distance(*b));
        true
    }

    /// Scale delta for the change in contact distance since the previous sample.
    pub fn pinch_move(&mut self, contacts: &[Vec2]) -> Option<f32> {
        if contacts.len() < 2 {
            warn!("pinch_move needs two contacts, got {}", contacts.len());
            return None;
        }

        let distance = contacts[0].distance(contacts[1]);
        let delta = match self.pinch_distance {
            Some(previous) => (distance - previous) * self.config.pinch_sensitivity,
            None => 0.0,
        };
        if !distance.is_finite() || !delta.is_finite() {
            warn!("Ignoring pinch with non-finite contact distance {}", distance);
            return None;
        }
        self.press = None;
        self.pinch_distance = Some(distance);
        Some(delta)
    }

    pub fn pinch_end(&mut self) {
        self.pinch_distance = None;
    }

    pub fn touch(&self) -> TouchSnapshot {
        match &self.press {
            Some(state) => TouchSnapshot::pressed(state.point, state.strength),
            None => TouchSnapshot::released(),
        }
    }

    pub fn touch_state(&self) -> Option<&TouchState> {
        self.press.as_ref()
    }

    /// Rotation impulse accumulated by dragging since the last call.
    pub fn take_drag(&mut self) -> Vec2 {
        std::mem::take(&mut self.pending_drag)
    }

    pub fn is_pressing(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch_distance.is_some()
    }

    /// Back to IDLE / PINCH_IDLE with nothing pending.
    pub fn reset(&mut self) {
        self.press = None;
        self.pinch_distance = None;
        self.pending_drag = Vec2::ZERO;
    }

    fn resolve_point(&self, ndc: Vec2, pick_radius: f32) -> Vec3 {
        self.camera
            .pick_sphere(ndc, self.viewport.aspect(), pick_radius)
            .unwrap_or_else(|| (ndc * self.config.ripple_plane_scale).extend(0.0))
    }
}

/// Accumulated pinch zoom, clamped to the configured scale bounds.
#[derive(Debug, Clone, Copy)]
pub struct ZoomTarget {
    value: f32,
    min: f32,
    max: f32,
}

impl ZoomTarget {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            value: 1.0_f32.clamp(config.min_scale, config.max_scale),
            min: config.min_scale,
            max: config.max_scale,
        }
    }

    /// Add a pinch delta. Non-finite deltas are ignored.
    pub fn apply(&mut self, delta: f32) -> f32 {
        if !delta.is_finite() {
            return self.value;
        }
        self.value = (self.value + delta).clamp(self.min, self.max);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 1.0_f32.clamp(self.min, self.max);
    }
}
