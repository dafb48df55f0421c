use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Tube radius of the torus knot relative to a unit base size
pub const TORUS_KNOT_TUBE: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Icosahedron,
    TorusKnot,
}

/// Geometry and color profile bound to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub shape: ShapeKind,
    pub tessellation_detail: u32,
    pub base_size: f32,
    pub hue_base: f32,  // [0, 1)
    pub hue_range: f32,
    pub saturation: f32,
}

impl SessionProfile {
    pub fn icosahedron() -> Self {
        Self {
            shape: ShapeKind::Icosahedron,
            tessellation_detail: 32,
            base_size: 0.9,
            hue_base: 0.75, // violet
            hue_range: 0.2,
            saturation: 0.7,
        }
    }

    pub fn torus_knot() -> Self {
        Self {
            shape: ShapeKind::TorusKnot,
            tessellation_detail: 128,
            base_size: 0.6,
            hue_base: 0.55, // teal
            hue_range: 0.15,
            saturation: 0.65,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.hue_base) {
            bail!("hue_base must lie in [0, 1), got {}", self.hue_base);
        }
        if !(self.hue_range >= 0.0 && self.hue_range.is_finite()) {
            bail!("hue_range must be non-negative, got {}", self.hue_range);
        }
        if !(0.0..=1.0).contains(&self.saturation) {
            bail!("saturation must lie in [0, 1], got {}", self.saturation);
        }
        if !(self.base_size > 0.0 && self.base_size.is_finite()) {
            bail!("base_size must be positive, got {}", self.base_size);
        }
        Ok(())
    }

    /// Radius of a sphere enclosing the undisplaced, unscaled shape.
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            ShapeKind::Icosahedron => self.base_size,
            // A (2,3) knot's centerline reaches 1.5x the base radius
            ShapeKind::TorusKnot => self.base_size * 1.5 + TORUS_KNOT_TUBE,
        }
    }
}

/// Static session → profile mapping. Unknown sessions resolve to the default profile.
#[derive(Debug, Clone)]
pub struct SessionTable {
    profiles: HashMap<String, SessionProfile>,
    default_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionTableFile {
    default: String,
    sessions: HashMap<String, SessionProfile>,
}

impl Default for SessionTable {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("session1".to_string(), SessionProfile::icosahedron());
        profiles.insert("session2".to_string(), SessionProfile::torus_knot());

        Self {
            profiles,
            default_id: "session1".to_string(),
        }
    }
}

impl SessionTable {
    pub fn new(profiles: HashMap<String, SessionProfile>, default_id: &str) -> Result<Self> {
        if !profiles.contains_key(default_id) {
            bail!("default session '{}' has no profile", default_id);
        }
        for (id, profile) in &profiles {
            if let Err(e) = profile.validate() {
                bail!("session '{}': {}", id, e);
            }
        }
        Ok(Self {
            profiles,
            default_id: default_id.to_string(),
        })
    }

    /// Load `{ "default": id, "sessions": { id: profile, ... } }` from JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let file: SessionTableFile = serde_json::from_str(&json)?;
        Self::new(file.sessions, &file.default)
    }

    pub fn lookup(&self, session_id: &str) -> &SessionProfile {
        self.profiles
            .get(session_id)
            .unwrap_or_else(|| self.default_profile())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.profiles.contains_key(session_id)
    }

    pub fn default_profile(&self) -> &SessionProfile {
        // `new` and `default` both guarantee the default id is present
        &self.profiles[&self.default_id]
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }
}
