//! On-disk custom levels: one folder per song key holding `info.json`,
//! `beatmap.json` and a copy of the track.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::beatmap::note::NoteEvent;

pub const INFO_FILE: &str = "info.json";
pub const BEATMAP_FILE: &str = "beatmap.json";
/// Name the level loader expects for the track, whatever its real format.
pub const SONG_FILE: &str = "song.mp3";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    #[serde(rename = "levelID")]
    pub level_id: String,
    #[serde(rename = "levelName")]
    pub level_name: String,
    #[serde(rename = "songName")]
    pub song_name: String,
    pub bpm: f64,
    pub duration: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BeatmapFile {
    pub notes: Vec<NoteEvent>,
}

/// Key identifying one generated level: song name, tempo, length and rate.
pub fn song_key(song_name: &str, bpm: f64, duration: f64, sample_rate: u32) -> String {
    format!("{}_{}_{:.2}_{}", song_name, bpm, duration, sample_rate)
}

/// File-system safe form of a song key.
pub fn level_id(song_key: &str) -> String {
    song_key.replace([' ', '.'], "_")
}

pub fn level_dir(root: &Path, level_id: &str) -> PathBuf {
    root.join(level_id)
}

/// Previously generated notes for this level, if any.
pub fn load_beatmap(dir: &Path) -> Result<Option<Vec<NoteEvent>>> {
    let path = dir.join(BEATMAP_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read beatmap: {}", path.display()))?;
    let file: BeatmapFile = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse beatmap: {}", path.display()))?;
    log::info!("Loaded cached beatmap: {} ({} notes)", path.display(), file.notes.len());
    Ok(Some(file.notes))
}

pub fn load_info(dir: &Path) -> Result<LevelInfo> {
    let path = dir.join(INFO_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read level info: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse level info: {}", path.display()))
}

/// Write `info.json` and `beatmap.json` into `dir` and copy the track in as
/// `song.mp3`. An existing song file is left alone.
///
/// An empty beatmap is not saved; returns whether anything was written.
pub fn save_level(dir: &Path, info: &LevelInfo, notes: &[NoteEvent], song: &Path) -> Result<bool> {
    if notes.is_empty() {
        log::warn!("No notes generated for '{}', level not saved", info.level_name);
        return Ok(false);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create level dir: {}", dir.display()))?;

    let info_path = dir.join(INFO_FILE);
    std::fs::write(&info_path, serde_json::to_string_pretty(info)?)
        .with_context(|| format!("Failed to write level info: {}", info_path.display()))?;

    let beatmap_path = dir.join(BEATMAP_FILE);
    let file = BeatmapFile {
        notes: notes.to_vec(),
    };
    std::fs::write(&beatmap_path, serde_json::to_string_pretty(&file)?)
        .with_context(|| format!("Failed to write beatmap: {}", beatmap_path.display()))?;

    let song_path = dir.join(SONG_FILE);
    if !song_path.exists() {
        std::fs::copy(song, &song_path).with_context(|| {
            format!("Failed to copy {} to {}", song.display(), song_path.display())
        })?;
    }

    log::info!("Level saved: {}", dir.display());
    Ok(true)
}
