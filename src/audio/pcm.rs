use crate::error::GenerateError;

/// Decoded, interleaved PCM handed to the generator.
#[derive(Clone, Copy, Debug)]
pub struct PcmBuffer<'a> {
    pub samples: &'a [f32],
    pub channels: usize,
    pub sample_rate: u32,
}

impl<'a> PcmBuffer<'a> {
    pub fn new(samples: &'a [f32], channels: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    pub fn mono(samples: &'a [f32], sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.channels == 0 {
            return Err(GenerateError::NoChannels);
        }
        if self.sample_rate == 0 {
            return Err(GenerateError::InvalidSampleRate(self.sample_rate));
        }
        if self.samples.len() < self.channels {
            return Err(GenerateError::EmptySamples);
        }
        Ok(())
    }

    /// Average all channels into a mono buffer. A trailing partial frame is dropped.
    pub fn downmix(&self) -> Vec<f32> {
        downmix(self.samples, self.channels)
    }
}

pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
