use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One note of a beatmap: when it must be hit, and in which lane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Seconds from song start, already shifted by the fall time
    pub time: f64,
    pub lane: usize,
}

impl NoteEvent {
    pub fn new(time: f64, lane: usize) -> Self {
        Self { time, lane }
    }
}

/// Snap each time to the nearest multiple of `interval`, never below zero.
pub fn quantize_notes(notes: &mut [NoteEvent], interval: f64) {
    for note in notes.iter_mut() {
        let snapped = (note.time / interval).round() * interval;
        note.time = if snapped > 0.0 { snapped } else { 0.0 };
    }
}

/// Order by time, then lane.
pub fn sort_notes(notes: &mut [NoteEvent]) {
    notes.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.lane.cmp(&b.lane)));
}

/// Remove repeated (time, lane) pairs, keeping the first. Times are compared
/// at microsecond precision. Returns the number of notes removed.
pub fn remove_exact_duplicates(notes: &mut Vec<NoteEvent>) -> usize {
    let before = notes.len();
    let mut seen = HashSet::with_capacity(before);
    notes.retain(|note| seen.insert((micros(note.time), note.lane)));
    before - notes.len()
}

/// Remove notes later than `cutoff`. Returns the number removed.
pub fn remove_notes_after(notes: &mut Vec<NoteEvent>, cutoff: f64) -> usize {
    let before = notes.len();
    notes.retain(|note| note.time <= cutoff);
    before - notes.len()
}

/// Drop the first `count` notes; if there are not more than `count`, drop all.
/// Returns the number removed.
pub fn drop_early_notes(notes: &mut Vec<NoteEvent>, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let removed = count.min(notes.len());
    if notes.len() <= count {
        notes.clear();
    } else {
        notes.drain(..count);
    }
    removed
}

fn micros(time: f64) -> i64 {
    (time * 1e6).round() as i64
}
