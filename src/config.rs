use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::beatmap::params::{fall_time_from_motion, GenerationParams};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    #[serde(default = "default_min_note_spacing")]
    pub min_note_spacing: f64,
    #[serde(default = "default_peak_threshold_multiplier")]
    pub peak_threshold_multiplier: f64,
    #[serde(default = "default_sustained_suppress_factor")]
    pub sustained_suppress_factor: f64,
    #[serde(default = "default_sustained_energy_window")]
    pub sustained_energy_window: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_quantize_divisions")]
    pub quantize_divisions: f64,
    #[serde(default = "default_count_in_time")]
    pub count_in_time: f64,
    #[serde(default = "default_lane_count")]
    pub lane_count: usize,
    #[serde(default = "default_true")]
    pub enable_double_notes: bool,
    #[serde(default = "default_double_note_probability")]
    pub double_note_probability: f64,
    #[serde(default = "default_min_energy_for_double_notes")]
    pub min_energy_for_double_notes: f64,
    #[serde(default = "default_true")]
    pub enable_end_filter: bool,
    #[serde(default = "default_seconds_before_end_to_stop")]
    pub seconds_before_end_to_stop: f64,
    #[serde(default = "default_early_notes_to_drop")]
    pub early_notes_to_drop: usize,
    #[serde(default = "default_min_bpm")]
    pub min_bpm: f64,
    #[serde(default = "default_max_bpm")]
    pub max_bpm: f64,
    #[serde(default = "default_min_song_duration")]
    pub min_song_duration: f64,
    #[serde(default = "default_max_song_duration")]
    pub max_song_duration: f64,
}

/// How long a note travels before it must be hit. `fall_time` wins when
/// set; otherwise it is derived from distance and speed.
#[derive(Debug, Deserialize)]
pub struct NotesConfig {
    #[serde(default)]
    pub fall_time: Option<f64>,
    #[serde(default = "default_fall_distance")]
    pub fall_distance: f64,
    #[serde(default = "default_note_speed")]
    pub note_speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_levels_dir")]
    pub levels_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            hop_size: default_hop_size(),
            min_note_spacing: default_min_note_spacing(),
            peak_threshold_multiplier: default_peak_threshold_multiplier(),
            sustained_suppress_factor: default_sustained_suppress_factor(),
            sustained_energy_window: default_sustained_energy_window(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            quantize_divisions: default_quantize_divisions(),
            count_in_time: default_count_in_time(),
            lane_count: default_lane_count(),
            enable_double_notes: true,
            double_note_probability: default_double_note_probability(),
            min_energy_for_double_notes: default_min_energy_for_double_notes(),
            enable_end_filter: true,
            seconds_before_end_to_stop: default_seconds_before_end_to_stop(),
            early_notes_to_drop: default_early_notes_to_drop(),
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            min_song_duration: default_min_song_duration(),
            max_song_duration: default_max_song_duration(),
        }
    }
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            fall_time: None,
            fall_distance: default_fall_distance(),
            note_speed: default_note_speed(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            levels_dir: default_levels_dir(),
        }
    }
}

impl NotesConfig {
    pub fn resolved_fall_time(&self) -> f64 {
        self.fall_time
            .unwrap_or_else(|| fall_time_from_motion(self.fall_distance, self.note_speed))
    }
}

impl Config {
    /// Explicit parameters for one generation call at `bpm`.
    pub fn generation_params(&self, bpm: f64) -> GenerationParams {
        let a = &self.analysis;
        let g = &self.generation;
        GenerationParams {
            fft_size: a.fft_size,
            hop_size: a.hop_size,
            min_note_spacing: a.min_note_spacing,
            peak_threshold_multiplier: a.peak_threshold_multiplier,
            sustained_suppress_factor: a.sustained_suppress_factor,
            sustained_energy_window: a.sustained_energy_window,
            bpm,
            quantize_divisions: g.quantize_divisions,
            count_in_time: g.count_in_time,
            lane_count: g.lane_count,
            fall_time: self.notes.resolved_fall_time(),
            enable_double_notes: g.enable_double_notes,
            double_note_probability: g.double_note_probability,
            min_energy_for_double_notes: g.min_energy_for_double_notes,
            enable_end_filter: g.enable_end_filter,
            seconds_before_end_to_stop: g.seconds_before_end_to_stop,
            early_notes_to_drop: g.early_notes_to_drop,
        }
    }

    pub fn bpm_in_range(&self, bpm: f64) -> bool {
        bpm >= self.generation.min_bpm && bpm <= self.generation.max_bpm
    }

    /// Reject tracks outside the accepted length range. An unusual sample
    /// rate is only worth a warning.
    pub fn check_audio(&self, duration: f64, sample_rate: u32) -> Result<()> {
        let g = &self.generation;
        if duration < g.min_song_duration {
            anyhow::bail!(
                "Song is too short: {:.1}s (minimum {:.0}s)",
                duration,
                g.min_song_duration
            );
        }
        if duration > g.max_song_duration {
            anyhow::bail!(
                "Song is too long: {:.1}s (maximum {:.0}s)",
                duration,
                g.max_song_duration
            );
        }
        if !usual_sample_rate(sample_rate) {
            log::warn!("Unusual sample rate: {}Hz", sample_rate);
        }
        Ok(())
    }
}

pub fn usual_sample_rate(sample_rate: u32) -> bool {
    (8000..=192_000).contains(&sample_rate)
}

fn default_fft_size() -> usize { 1024 }
fn default_hop_size() -> usize { 512 }
fn default_min_note_spacing() -> f64 { 0.08 }
fn default_peak_threshold_multiplier() -> f64 { 1.4 }
fn default_sustained_suppress_factor() -> f64 { 0.6 }
fn default_sustained_energy_window() -> f64 { 0.25 }
fn default_quantize_divisions() -> f64 { 4.0 }
fn default_count_in_time() -> f64 { 2.0 }
fn default_lane_count() -> usize { 4 }
fn default_true() -> bool { true }
fn default_double_note_probability() -> f64 { 0.8 }
fn default_min_energy_for_double_notes() -> f64 { 0.1 }
fn default_seconds_before_end_to_stop() -> f64 { 6.0 }
fn default_early_notes_to_drop() -> usize { 4 }
fn default_min_bpm() -> f64 { 30.0 }
fn default_max_bpm() -> f64 { 500.0 }
fn default_min_song_duration() -> f64 { 10.0 }
fn default_max_song_duration() -> f64 { 900.0 }
fn default_fall_distance() -> f64 { 10.0 }
fn default_note_speed() -> f64 { 5.0 }
fn default_levels_dir() -> PathBuf { PathBuf::from("levels") }

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// `./beatforge.toml`, then `~/.config/beatforge/config.toml`, then the
/// platform config directory.
pub fn discover_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("beatforge.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("beatforge").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("beatforge").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tool() {
        let config = Config::default();
        let params = config.generation_params(128.0);
        assert_eq!(params.fft_size, 1024);
        assert_eq!(params.hop_size, 512);
        assert_eq!(params.lane_count, 4);
        assert_eq!(params.fall_time, 2.0);
        assert_eq!(params.early_notes_to_drop, 4);
        assert!(params.enable_double_notes);
        assert!(params.enable_end_filter);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            hop_size = 256

            [generation]
            lane_count = 6
            enable_double_notes = false

            [notes]
            fall_time = 1.25
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.hop_size, 256);
        assert_eq!(config.analysis.fft_size, 1024);
        assert_eq!(config.generation.lane_count, 6);
        assert!(!config.generation.enable_double_notes);
        assert!(config.generation.enable_end_filter);
        assert_eq!(config.notes.resolved_fall_time(), 1.25);
        assert_eq!(config.output.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn fall_time_from_distance_and_speed() {
        let config: Config = toml::from_str(
            r#"
            [notes]
            fall_distance = 12.0
            note_speed = 8.0
            "#,
        )
        .unwrap();
        assert_eq!(config.notes.resolved_fall_time(), 1.5);
    }

    #[test]
    fn song_length_limits() {
        let config = Config::default();
        assert!(config.check_audio(10.0, 44100).is_ok());
        assert!(config.check_audio(900.0, 48000).is_ok());
        assert!(config.check_audio(9.5, 44100).is_err());
        assert!(config.check_audio(900.5, 44100).is_err());
        // Odd rates are tolerated.
        assert!(config.check_audio(60.0, 4000).is_ok());

        let relaxed: Config = toml::from_str(
            r#"
            [generation]
            min_song_duration = 1.0
            max_song_duration = 20.0
            "#,
        )
        .unwrap();
        assert!(relaxed.check_audio(2.0, 44100).is_ok());
        assert!(relaxed.check_audio(30.0, 44100).is_err());
    }

    #[test]
    fn sample_rate_band() {
        assert!(usual_sample_rate(8000));
        assert!(usual_sample_rate(44100));
        assert!(usual_sample_rate(192_000));
        assert!(!usual_sample_rate(7999));
        assert!(!usual_sample_rate(384_000));
    }

    #[test]
    fn bpm_range() {
        let config = Config::default();
        assert!(config.bpm_in_range(30.0));
        assert!(config.bpm_in_range(500.0));
        assert!(!config.bpm_in_range(29.9));
        assert!(!config.bpm_in_range(501.0));
    }
}
