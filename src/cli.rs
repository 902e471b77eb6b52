use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "beatforge", about = "Rhythm-game beatmap generator for audio files")]
pub struct Cli {
    /// Input audio files (WAV, MP3, FLAC, OGG)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Root directory for generated level folders
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Tempo in BPM. Estimated from the audio when omitted.
    #[arg(long)]
    pub bpm: Option<f64>,

    /// Print the estimated BPM of each input and exit
    #[arg(long)]
    pub estimate_only: bool,

    /// Number of lanes
    #[arg(long)]
    pub lanes: Option<usize>,

    /// Seconds a note falls before it must be hit
    #[arg(long)]
    pub fall_time: Option<f64>,

    /// Seed identity for lane choices (defaults to the file stem)
    #[arg(long)]
    pub seed_key: Option<String>,

    /// Disable double notes
    #[arg(long)]
    pub no_doubles: bool,

    /// Keep notes up to the very end of the track
    #[arg(long)]
    pub no_end_filter: bool,

    /// Regenerate even if a beatmap already exists
    #[arg(long)]
    pub force: bool,

    /// Print the beatmap JSON instead of writing a level folder
    #[arg(long)]
    pub stdout: bool,

    /// Path to config file (default: ./beatforge.toml or ~/.config/beatforge/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
