//! Onset-strength primitives: spectral flux, median smoothing, adaptive
//! thresholding and peak picking.

/// Scale applied to the local median when building the adaptive threshold.
pub const THRESHOLD_SCALE: f32 = 0.7;

/// Smallest divisor used when normalizing a series by its peak.
const NORMALIZE_FLOOR: f32 = 1e-6;

/// Sum of positive magnitude increases between consecutive spectra.
///
/// Frame 0 has no predecessor and gets a flux of 0.
pub fn spectral_flux(spectra: &[Vec<f32>]) -> Vec<f32> {
    let mut flux = vec![0.0f32; spectra.len()];
    for i in 1..spectra.len() {
        flux[i] = spectra[i]
            .iter()
            .zip(spectra[i - 1].iter())
            .map(|(cur, prev)| (cur - prev).max(0.0))
            .sum();
    }
    flux
}

/// Median of `data[i - radius ..= i + radius]`, clamped to the buffer.
pub fn median_filter(data: &[f32], radius: usize) -> Vec<f32> {
    let mut scratch = Vec::with_capacity(2 * radius + 1);
    (0..data.len())
        .map(|i| local_median(data, i, radius, &mut scratch))
        .collect()
}

/// Local median over a window of `window_frames` (radius `window_frames / 2`),
/// scaled by [`THRESHOLD_SCALE`].
pub fn adaptive_threshold(flux: &[f32], window_frames: usize) -> Vec<f32> {
    let radius = window_frames / 2;
    let mut scratch = Vec::with_capacity(2 * radius + 1);
    (0..flux.len())
        .map(|i| local_median(flux, i, radius, &mut scratch) * THRESHOLD_SCALE)
        .collect()
}

/// Indices of local maxima above the threshold.
///
/// Rising edge is strict, falling edge is not: a plateau of two equal
/// values reports only its first index. The first and last samples are
/// never peaks. Only indices covered by both slices are considered.
pub fn pick_peaks(flux: &[f32], threshold: &[f32]) -> Vec<usize> {
    let len = flux.len().min(threshold.len());
    if len < 3 {
        return Vec::new();
    }
    (1..len - 1)
        .filter(|&i| {
            flux[i] > threshold[i] && flux[i] > flux[i - 1] && flux[i] >= flux[i + 1]
        })
        .collect()
}

/// Divide every value by the series maximum (at least 1e-6).
pub fn normalize_by_peak(values: &mut [f32]) {
    let peak = values.iter().copied().fold(NORMALIZE_FLOOR, f32::max);
    for v in values.iter_mut() {
        *v /= peak;
    }
}

/// Upper median of the clamped window around `i`.
fn local_median(data: &[f32], i: usize, radius: usize, scratch: &mut Vec<f32>) -> f32 {
    let start = i.saturating_sub(radius);
    let end = (i + radius).min(data.len() - 1);
    scratch.clear();
    scratch.extend_from_slice(&data[start..=end]);
    scratch.sort_by(f32::total_cmp);
    scratch[scratch.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flux_counts_only_increases() {
        let spectra = vec![
            vec![1.0, 1.0, 1.0],
            vec![2.0, 0.0, 1.5],
            vec![2.0, 0.0, 1.5],
            vec![0.0, 3.0, 0.0],
        ];
        let flux = spectral_flux(&spectra);
        assert_eq!(flux.len(), 4);
        assert_eq!(flux[0], 0.0);
        assert!((flux[1] - 1.5).abs() < 1e-6);
        assert_eq!(flux[2], 0.0);
        assert!((flux[3] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn flux_of_empty_input() {
        assert!(spectral_flux(&[]).is_empty());
    }

    #[test]
    fn median_filter_removes_spikes() {
        let data = [0.0, 0.0, 0.0, 9.0, 0.0, 0.0, 0.0];
        assert_eq!(median_filter(&data, 1), vec![0.0; 7]);
    }

    #[test]
    fn median_filter_clamps_at_edges() {
        let data = [1.0, 5.0, 3.0, 4.0];
        // i=0 window [1,5] -> upper median 5
        // i=3 window [3,4] -> upper median 4
        assert_eq!(median_filter(&data, 1), vec![5.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn threshold_is_scaled_median() {
        let flux = [1.0, 1.0, 1.0, 1.0, 1.0];
        let thr = adaptive_threshold(&flux, 4);
        for t in thr {
            assert!((t - THRESHOLD_SCALE).abs() < 1e-6);
        }
    }

    #[test]
    fn plateau_reports_earlier_index() {
        let flux = [0.0, 0.2, 0.8, 0.8, 0.1, 0.0];
        let threshold = [0.1; 6];
        assert_eq!(pick_peaks(&flux, &threshold), vec![2]);
    }

    #[test]
    fn peaks_must_clear_threshold() {
        let flux = [0.0, 0.5, 0.0, 0.9, 0.0];
        let threshold = [0.6; 5];
        assert_eq!(pick_peaks(&flux, &threshold), vec![3]);
    }

    #[test]
    fn degenerate_flux_has_no_peaks() {
        assert!(pick_peaks(&[], &[]).is_empty());
        assert!(pick_peaks(&[1.0, 0.0], &[0.0, 0.0]).is_empty());
        let zeros = [0.0f32; 16];
        let thr = adaptive_threshold(&zeros, 8);
        assert!(pick_peaks(&zeros, &thr).is_empty());
    }

    #[test]
    fn endpoints_are_never_peaks() {
        let flux = [5.0, 1.0, 2.0, 1.0, 5.0];
        let threshold = [0.0; 5];
        assert_eq!(pick_peaks(&flux, &threshold), vec![2]);
    }

    #[test]
    fn short_threshold_limits_the_search() {
        let flux = [0.0, 3.0, 0.0, 4.0, 0.0];
        assert_eq!(pick_peaks(&flux, &[0.0; 3]), vec![1]);
        assert!(pick_peaks(&flux, &[0.0; 2]).is_empty());
    }

    #[test]
    fn normalization_uses_floor() {
        let mut zeros = [0.0f32; 3];
        normalize_by_peak(&mut zeros);
        assert_eq!(zeros, [0.0; 3]);

        let mut values = [2.0f32, 4.0, 1.0];
        normalize_by_peak(&mut values);
        assert_eq!(values, [0.5, 1.0, 0.25]);
    }
}
