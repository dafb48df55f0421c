pub mod bands;
pub mod playback;
pub mod playlist;
pub mod sampler;
pub mod spectrum;
pub mod tap;

pub use bands::{extract, BandEnergies, BandLayout};
pub use playback::{AudioPlayback, PlaybackStatus, StaticPlayback};
pub use playlist::{Playlist, Track};
pub use sampler::{signal_channel, FrequencySampler, SignalFeed, SignalHandle, SignalSource};
pub use spectrum::{SpectrumAnalyser, SpectrumFrame};
pub use tap::TapSource;
