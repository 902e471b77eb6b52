use crate::audio::analysis::detect_onsets;
use crate::audio::features::OnsetEvent;
use crate::audio::pcm::PcmBuffer;
use crate::error::GenerateError;
use crate::rng::NoteRng;

use super::note::{
    drop_early_notes, quantize_notes, remove_exact_duplicates, remove_notes_after, sort_notes,
    NoteEvent,
};
use super::params::GenerationParams;
use super::sustain::{sustain_score, SUSTAIN_SCORE_LIMIT};

/// Sentinel for "no note emitted yet" in onset-time space.
const NO_PREVIOUS_NOTE: f64 = -999.0;

/// A finished beatmap and what happened while building it.
#[derive(Clone, Debug, PartialEq)]
pub struct Beatmap {
    /// Sorted by (time, lane), no repeated (time, lane) pairs
    pub notes: Vec<NoteEvent>,
    pub stats: GenerationStats,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationStats {
    pub duration: f64,
    pub onsets: usize,
    pub spacing_skips: usize,
    pub sustained_skips: usize,
    pub main_notes: usize,
    pub double_notes: usize,
    pub count_in_notes: usize,
    pub duplicates_removed: usize,
    pub end_filtered: usize,
    pub early_dropped: usize,
}

/// Turn decoded audio into a beatmap.
///
/// `identity` seeds the random source (a track name is enough), so the same
/// audio, parameters and identity always give the same notes. Invalid input
/// is rejected before any analysis; a track without onsets is not an error.
pub fn generate(
    pcm: &PcmBuffer,
    identity: &str,
    params: &GenerationParams,
) -> Result<Beatmap, GenerateError> {
    pcm.validate()?;
    params.validate()?;

    let mono = pcm.downmix();
    let sample_rate = pcm.sample_rate;
    let duration = mono.len() as f64 / sample_rate as f64;
    let end_cutoff = params
        .enable_end_filter
        .then(|| duration - params.seconds_before_end_to_stop);

    let onsets = detect_onsets(&mono, sample_rate, params.fft_size, params.hop_size, end_cutoff)?;

    let mut rng = NoteRng::from_identity(identity);
    let mut stats = GenerationStats {
        duration,
        onsets: onsets.len(),
        ..Default::default()
    };

    let mut notes = place_onset_notes(&onsets, &mono, sample_rate, params, &mut rng, &mut stats);
    let count_in = count_in_notes(params, &mut rng);
    stats.count_in_notes = count_in.len();
    notes.extend(count_in);

    quantize_notes(&mut notes, params.beat_interval());
    sort_notes(&mut notes);
    stats.duplicates_removed = remove_exact_duplicates(&mut notes);

    if let Some(cutoff) = end_cutoff {
        stats.end_filtered = remove_notes_after(&mut notes, cutoff);
        if stats.end_filtered > 0 {
            log::debug!("Removed {} notes past the end cutoff ({:.2}s)", stats.end_filtered, cutoff);
        }
    }

    stats.early_dropped = drop_early_notes(&mut notes, params.early_notes_to_drop);

    log::info!(
        "Beatmap generated: {} notes from {} onsets. BPM: {}. End cutoff: {}s",
        notes.len(),
        stats.onsets,
        params.bpm,
        if params.enable_end_filter { params.seconds_before_end_to_stop } else { 0.0 }
    );
    log::debug!("{:?}", stats);

    Ok(Beatmap { notes, stats })
}

/// Main and double notes for every onset that survives spacing and
/// sustain suppression.
///
/// Draw order per onset: sustain roll (only for sustained onsets), main
/// lane, double roll (only when eligible), double lane.
fn place_onset_notes(
    onsets: &[OnsetEvent],
    mono: &[f32],
    sample_rate: u32,
    params: &GenerationParams,
    rng: &mut NoteRng,
    stats: &mut GenerationStats,
) -> Vec<NoteEvent> {
    let mut notes = Vec::with_capacity(onsets.len() * 2);
    let mut last_note_time = NO_PREVIOUS_NOTE;

    for onset in onsets {
        if onset.time - last_note_time < params.min_note_spacing {
            stats.spacing_skips += 1;
            continue;
        }

        let score = sustain_score(mono, sample_rate, onset.time, params.sustained_energy_window);
        if score > SUSTAIN_SCORE_LIMIT && rng.next_unit() < params.sustained_suppress_factor {
            stats.sustained_skips += 1;
            continue;
        }

        let main = NoteEvent::new(
            (onset.time - params.fall_time).max(0.0),
            rng.next_index(params.lane_count),
        );
        notes.push(main);
        stats.main_notes += 1;

        if params.enable_double_notes
            && onset.energy as f64 > params.min_energy_for_double_notes
            && rng.next_unit() < params.double_note_probability
        {
            if let Some(lane) = other_lane(main.lane, params.lane_count, rng) {
                notes.push(NoteEvent::new(main.time, lane));
                stats.double_notes += 1;
            }
        }

        last_note_time = onset.time;
    }

    notes
}

/// A uniformly chosen lane other than `taken`, if one exists.
fn other_lane(taken: usize, lane_count: usize, rng: &mut NoteRng) -> Option<usize> {
    let others = lane_count.checked_sub(1).filter(|&n| n > 0)?;
    let pick = rng.next_index(others);
    Some(if pick >= taken { pick + 1 } else { pick })
}

/// Grid-aligned notes covering the count-in, one random lane each.
fn count_in_notes(params: &GenerationParams, rng: &mut NoteRng) -> Vec<NoteEvent> {
    let interval = params.beat_interval();
    let pre_start = params.count_in_time - params.fall_time;
    let mut notes = Vec::new();
    let mut index = 0usize;
    while index as f64 * interval < pre_start {
        notes.push(NoteEvent::new(index as f64 * interval, rng.next_index(params.lane_count)));
        index += 1;
    }
    notes
}
