pub mod controller;
pub mod session;
pub mod smoothing;
pub mod uniforms;

pub use controller::{FrameInputs, FrameState, UniformController};
pub use session::{SessionProfile, SessionTable, ShapeKind};
pub use smoothing::{lerp, SmoothedParameter};
pub use uniforms::{ShaderUniforms, UniformSet};
