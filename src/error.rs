use thiserror::Error;

use crate::audio::spectrum::SpectrumError;

/// Invalid-input errors rejected before any analysis starts.
///
/// Degenerate results (no onsets, an empty beatmap, the tempo fallback) are
/// not errors and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("sample buffer is empty")]
    EmptySamples,

    #[error("channel count must be at least 1")]
    NoChannels,

    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("BPM must be a positive finite number, got {0}")]
    InvalidBpm(f64),

    #[error("FFT size must be a power of two greater than 1, got {0}")]
    InvalidFftSize(usize),

    #[error("hop size must be at least 1")]
    InvalidHopSize,

    #[error("lane count must be at least 1")]
    NoLanes,

    #[error("quantize divisions must be positive, got {0}")]
    InvalidQuantizeDivisions(f64),

    #[error("count-in would need {0:.0} grid notes; lower the tempo, divisions or count-in time")]
    CountInTooDense(f64),

    #[error("parameter `{name}` is out of range: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}
