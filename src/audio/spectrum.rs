use rustfft::num_complex::Complex;
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    #[error("cannot transform an empty buffer")]
    EmptyBuffer,
    #[error("FFT length must be a power of two, got {0}")]
    NotPowerOfTwo(usize),
}

/// Hann window coefficients `0.5 * (1 - cos(2πi / (N-1)))`.
///
/// A single-sample window is `[1.0]`.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| (0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos())) as f32)
        .collect()
}

/// Multiply `buffer` in place by a Hann window of its own length.
pub fn apply_hann_window(buffer: &mut [f32]) -> Result<(), SpectrumError> {
    if buffer.is_empty() {
        return Err(SpectrumError::EmptyBuffer);
    }
    let window = hann_window(buffer.len());
    apply_window(buffer, &window);
    Ok(())
}

pub(crate) fn apply_window(buffer: &mut [f32], window: &[f32]) {
    for (sample, w) in buffer.iter_mut().zip(window) {
        *sample *= w;
    }
}

/// In-place iterative radix-2 decimation-in-time FFT.
pub fn fft(buffer: &mut [Complex<f64>]) -> Result<(), SpectrumError> {
    let n = buffer.len();
    if n == 0 {
        return Err(SpectrumError::EmptyBuffer);
    }
    if !n.is_power_of_two() {
        return Err(SpectrumError::NotPowerOfTwo(n));
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            buffer.swap(i, j);
        }
    }

    // Butterfly stages
    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        let step = Complex::new(angle.cos(), angle.sin());
        let half = len / 2;
        for start in (0..n).step_by(len) {
            let mut w = Complex::new(1.0, 0.0);
            for k in 0..half {
                let u = buffer[start + k];
                let v = buffer[start + k + half] * w;
                buffer[start + k] = u + v;
                buffer[start + k + half] = u - v;
                w *= step;
            }
        }
        len <<= 1;
    }

    Ok(())
}

/// Magnitudes of the first N/2 bins of the FFT of a real signal.
pub fn magnitude_spectrum(buffer: &[f32]) -> Result<Vec<f32>, SpectrumError> {
    let mut bins: Vec<Complex<f64>> = buffer
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    fft(&mut bins)?;
    Ok(bins[..buffer.len() / 2]
        .iter()
        .map(|c| c.norm() as f32)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::FftPlanner;

    #[test]
    fn hann_endpoints_and_center() {
        let w = hann_window(9);
        assert!(w[0].abs() < 1e-7);
        assert!(w[8].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hann_rejects_empty_and_keeps_single_sample() {
        let mut empty: [f32; 0] = [];
        assert_eq!(apply_hann_window(&mut empty), Err(SpectrumError::EmptyBuffer));

        let mut one = [0.75f32];
        apply_hann_window(&mut one).unwrap();
        assert_eq!(one, [0.75]);
    }

    #[test]
    fn rejects_non_power_of_two() {
        let buf = vec![0.0f32; 1000];
        assert_eq!(magnitude_spectrum(&buf), Err(SpectrumError::NotPowerOfTwo(1000)));
    }

    #[test]
    fn dc_signal_lands_in_bin_zero() {
        let buf = vec![1.0f32; 16];
        let mags = magnitude_spectrum(&buf).unwrap();
        assert_eq!(mags.len(), 8);
        assert!((mags[0] - 16.0).abs() < 1e-4);
        for &m in &mags[1..] {
            assert!(m.abs() < 1e-4);
        }
    }

    #[test]
    fn sine_peak_at_expected_bin() {
        let n = 1024;
        let sample_rate = 44100.0f64;
        for &freq in &[440.0f64, 1000.0, 5512.5, 9000.0] {
            let mut buf: Vec<f32> = (0..n)
                .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin() as f32)
                .collect();
            apply_hann_window(&mut buf).unwrap();
            let mags = magnitude_spectrum(&buf).unwrap();
            let peak = mags
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            let expected = (freq * n as f64 / sample_rate).round() as i64;
            assert!(
                (peak as i64 - expected).abs() <= 1,
                "freq {freq}: peak bin {peak}, expected {expected}"
            );
        }
    }

    #[test]
    fn matches_reference_fft() {
        let n = 512;
        let signal: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                ((2.0 * PI * 7.0 * t).sin() + 0.3 * (2.0 * PI * 61.0 * t).cos() + 0.05 * t) as f32
            })
            .collect();

        let ours = magnitude_spectrum(&signal).unwrap();

        let mut planner = FftPlanner::<f64>::new();
        let reference_fft = planner.plan_fft_forward(n);
        let mut reference: Vec<Complex<f64>> =
            signal.iter().map(|&s| Complex::new(s as f64, 0.0)).collect();
        reference_fft.process(&mut reference);

        for (k, (ours, theirs)) in ours.iter().zip(reference.iter()).enumerate() {
            let theirs = theirs.norm();
            let tolerance = 1e-4 * theirs.max(1.0);
            assert!(
                (*ours as f64 - theirs).abs() <= tolerance,
                "bin {k}: {ours} vs {theirs}"
            );
        }
    }
}
