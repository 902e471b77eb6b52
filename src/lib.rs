pub mod audio;
pub mod beatmap;
pub mod config;
pub mod error;
pub mod level;
pub mod rng;

pub use audio::pcm::PcmBuffer;
pub use audio::tempo::{estimate_bpm, estimate_tempo};
pub use beatmap::generator::{generate, Beatmap, GenerationStats};
pub use beatmap::note::NoteEvent;
pub use beatmap::params::GenerationParams;
pub use error::GenerateError;
