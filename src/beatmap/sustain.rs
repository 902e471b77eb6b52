/// Scores above this mark an onset as part of a held sound.
pub const SUSTAIN_SCORE_LIMIT: f32 = 0.7;

const MIN_WINDOW_ENERGY: f64 = 1e-6;

/// How "held" the sound around `onset_time` is, in `[0, 1]`.
///
/// Compares the total squared-sample energy inside a window of
/// `window_secs` centered on the onset with the total absolute change of
/// that energy between neighbouring samples. Sharp attacks move a lot
/// relative to their energy and score low; steady tones score high. A
/// silent window scores 0.
pub fn sustain_score(mono: &[f32], sample_rate: u32, onset_time: f64, window_secs: f64) -> f32 {
    if mono.is_empty() {
        return 0.0;
    }

    let last = mono.len() as i64 - 1;
    let center = (onset_time * sample_rate as f64).round() as i64;
    let half = (window_secs * sample_rate as f64 * 0.5).round() as i64;
    let start = (center - half).clamp(0, last) as usize;
    let end = (center + half).clamp(0, last) as usize;

    let mut energy = 0.0f64;
    let mut variation = 0.0f64;
    for i in start..end.saturating_sub(1) {
        let e = (mono[i] as f64).powi(2);
        let next = (mono[i + 1] as f64).powi(2);
        energy += e;
        variation += (next - e).abs();
    }

    if energy <= MIN_WINDOW_ENERGY {
        return 0.0;
    }
    (1.0 - variation / energy).clamp(0.0, 1.0) as f32
}
