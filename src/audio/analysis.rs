use super::features::{FrameAnalysis, OnsetEvent};
use super::flux::{adaptive_threshold, median_filter, normalize_by_peak, pick_peaks, spectral_flux};
use super::spectrum::{apply_window, hann_window, magnitude_spectrum, SpectrumError};

/// Radius of the median filter applied to the flux before peak picking.
const FLUX_SMOOTHING_RADIUS: usize = 3;

/// Length of the adaptive-threshold window, in seconds.
const THRESHOLD_WINDOW_SECS: f64 = 0.5;

// Fixed framing of the tempo detector.
const TEMPO_FFT_SIZE: usize = 1024;
const TEMPO_HOP_SIZE: usize = 1024;
const TEMPO_THRESHOLD_FRAMES: usize = 16;

/// Slide a Hann-windowed frame across `mono` and collect magnitude spectra.
///
/// Frames are taken while `pos + fft_size < len`, so a buffer no longer
/// than one frame yields nothing.
pub fn analyze_frames(
    mono: &[f32],
    sample_rate: u32,
    fft_size: usize,
    hop_size: usize,
) -> Result<FrameAnalysis, SpectrumError> {
    if fft_size == 0 {
        return Err(SpectrumError::EmptyBuffer);
    }
    if !fft_size.is_power_of_two() {
        return Err(SpectrumError::NotPowerOfTwo(fft_size));
    }

    let hop_size = hop_size.max(1);
    let window = hann_window(fft_size);
    let mut frame = vec![0.0f32; fft_size];
    let mut analysis = FrameAnalysis::default();

    let mut pos = 0;
    while pos + fft_size < mono.len() {
        frame.copy_from_slice(&mono[pos..pos + fft_size]);
        apply_window(&mut frame, &window);
        let spectrum = magnitude_spectrum(&frame)?;

        analysis.energies.push(spectrum.iter().sum());
        analysis.spectra.push(spectrum);
        analysis.times.push(pos as f64 / sample_rate as f64);
        pos += hop_size;
    }

    Ok(analysis)
}

/// Onsets for note generation.
///
/// Flux is median-smoothed and normalized; each onset carries the
/// normalized frame energy at its peak. Peaks later than `end_cutoff`
/// are dropped.
pub fn detect_onsets(
    mono: &[f32],
    sample_rate: u32,
    fft_size: usize,
    hop_size: usize,
    end_cutoff: Option<f64>,
) -> Result<Vec<OnsetEvent>, SpectrumError> {
    let FrameAnalysis {
        spectra,
        mut energies,
        times,
    } = analyze_frames(mono, sample_rate, fft_size, hop_size)?;

    let flux = spectral_flux(&spectra);
    // Spectra are not needed past this point.
    drop(spectra);

    let mut smoothed = median_filter(&flux, FLUX_SMOOTHING_RADIUS);
    normalize_by_peak(&mut smoothed);
    normalize_by_peak(&mut energies);

    let window_frames = (THRESHOLD_WINDOW_SECS * sample_rate as f64 / hop_size as f64).round() as usize;
    let threshold = adaptive_threshold(&smoothed, window_frames);
    let peaks = pick_peaks(&smoothed, &threshold);

    let onsets: Vec<OnsetEvent> = peaks
        .into_iter()
        .filter(|&f| end_cutoff.map_or(true, |cutoff| times[f] <= cutoff))
        .map(|f| OnsetEvent {
            time: times[f],
            energy: energies[f],
        })
        .collect();

    log::debug!(
        "Onset detection: {} frames, {} onsets (threshold window {} frames)",
        times.len(),
        onsets.len(),
        window_frames
    );

    Ok(onsets)
}

/// Onsets for tempo estimation.
///
/// Uses a fixed non-overlapping framing and raw (unsmoothed) flux; energy is
/// the flux at the peak normalized by the track's peak flux.
pub fn detect_tempo_onsets(mono: &[f32], sample_rate: u32) -> Result<Vec<OnsetEvent>, SpectrumError> {
    let analysis = analyze_frames(mono, sample_rate, TEMPO_FFT_SIZE, TEMPO_HOP_SIZE)?;
    let mut flux = spectral_flux(&analysis.spectra);
    let threshold = adaptive_threshold(&flux, TEMPO_THRESHOLD_FRAMES);
    let peaks = pick_peaks(&flux, &threshold);
    normalize_by_peak(&mut flux);

    Ok(peaks
        .into_iter()
        .map(|p| OnsetEvent {
            time: analysis.times[p],
            energy: flux[p],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst_track(sample_rate: u32, seconds: f64, period: f64) -> Vec<f32> {
        let n = (seconds * sample_rate as f64) as usize;
        let sigma = 0.015;
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                let k = (t / period).round().max(1.0);
                let c = k * period;
                let envelope = (-0.5 * ((t - c) / sigma).powi(2)).exp();
                ((2.0 * std::f64::consts::PI * 1000.0 * t).sin() * envelope) as f32
            })
            .collect()
    }

    #[test]
    fn frame_count_and_times() {
        let mono = vec![0.0f32; 4096];
        let analysis = analyze_frames(&mono, 1000, 1024, 512).unwrap();
        // pos = 0, 512, ..., 2560 (3072 + 1024 == len is excluded)
        assert_eq!(analysis.len(), 6);
        assert_eq!(analysis.spectra[0].len(), 512);
        assert_eq!(analysis.times[1], 0.512);
        assert!(analysis.energies.iter().all(|&e| e == 0.0));
    }

    #[test]
    fn short_buffer_yields_no_frames() {
        let mono = vec![0.5f32; 1024];
        let analysis = analyze_frames(&mono, 44100, 1024, 512).unwrap();
        assert!(analysis.is_empty());
        assert!(detect_onsets(&mono, 44100, 1024, 512, None).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_fft_size() {
        let mono = vec![0.0f32; 4096];
        assert_eq!(
            analyze_frames(&mono, 44100, 1000, 512).unwrap_err(),
            SpectrumError::NotPowerOfTwo(1000)
        );
    }

    #[test]
    fn silence_has_no_onsets() {
        let mono = vec![0.0f32; 44100];
        assert!(detect_onsets(&mono, 44100, 1024, 512, None).unwrap().is_empty());
        assert!(detect_tempo_onsets(&mono, 44100).unwrap().is_empty());
    }

    #[test]
    fn bursts_produce_ordered_normalized_onsets() {
        let mono = burst_track(44100, 5.0, 0.5);
        let onsets = detect_onsets(&mono, 44100, 1024, 512, None).unwrap();
        assert!(onsets.len() >= 6, "got {} onsets", onsets.len());
        for pair in onsets.windows(2) {
            assert!(pair[0].time < pair[1].time);
        }
        for onset in &onsets {
            assert!((0.0..=1.0).contains(&onset.energy));
        }
    }

    #[test]
    fn end_cutoff_drops_late_onsets() {
        let mono = burst_track(44100, 5.0, 0.5);
        let onsets = detect_onsets(&mono, 44100, 1024, 512, Some(2.0)).unwrap();
        assert!(!onsets.is_empty());
        assert!(onsets.iter().all(|o| o.time <= 2.0));
    }
}
