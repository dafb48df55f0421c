pub mod audio;
pub mod config;
pub mod effects;
pub mod engine;
pub mod interaction;

pub use config::EngineConfig;
pub use engine::Engine;
