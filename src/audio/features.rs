/// A detected onset: a candidate note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OnsetEvent {
    /// Frame start time in seconds
    pub time: f64,
    /// Onset strength, normalized (0.0-1.0) within one analysis run
    pub energy: f32,
}

/// Per-frame analysis of a mono buffer, before onset picking
#[derive(Clone, Debug, Default)]
pub struct FrameAnalysis {
    /// Magnitude spectra (fft_size/2 bins each)
    pub spectra: Vec<Vec<f32>>,
    /// Sum of magnitude bins per frame (linear, unnormalized)
    pub energies: Vec<f32>,
    /// Frame start times in seconds
    pub times: Vec<f64>,
}

impl FrameAnalysis {
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}
