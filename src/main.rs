mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use beatforge::audio::decode::{decode_audio, AudioData};
use beatforge::config::{self, Config};
use beatforge::level::{self, BeatmapFile, LevelInfo};
use beatforge::{estimate_bpm, generate};
use cli::Cli;

enum TrackOutcome {
    Cached { dir: PathBuf, notes: usize },
    Saved { dir: PathBuf, notes: usize },
    Empty,
    Printed(String),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match cli.config.clone().or_else(config::discover_config_path) {
        Some(path) => {
            let cfg = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    // CLI flags win over config values
    if let Some(ref dir) = cli.output_dir {
        cfg.output.levels_dir = dir.clone();
    }
    if let Some(lanes) = cli.lanes {
        cfg.generation.lane_count = lanes;
    }
    if let Some(fall_time) = cli.fall_time {
        cfg.notes.fall_time = Some(fall_time);
    }
    if cli.no_doubles {
        cfg.generation.enable_double_notes = false;
    }
    if cli.no_end_filter {
        cfg.generation.enable_end_filter = false;
    }

    if let Some(bpm) = cli.bpm {
        if !cfg.bpm_in_range(bpm) {
            anyhow::bail!(
                "BPM {} is outside the allowed range {}-{}",
                bpm,
                cfg.generation.min_bpm,
                cfg.generation.max_bpm
            );
        }
    }

    for input in &cli.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    if cli.estimate_only {
        return print_estimates(&cli.inputs);
    }

    log::info!("beatforge - beatmap generator");
    log::info!("Inputs: {}", cli.inputs.len());
    if !cli.stdout {
        log::info!("Levels: {}", cfg.output.levels_dir.display());
    }

    let pb = ProgressBar::new(cli.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tracks ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let results: Vec<(&PathBuf, Result<TrackOutcome>)> = cli
        .inputs
        .par_iter()
        .map(|input| {
            let result = process_track(input, &cli, &cfg);
            pb.inc(1);
            (input, result)
        })
        .collect();

    pb.finish_with_message("Generation complete");

    let mut failures = 0;
    for (input, result) in results {
        match result {
            Ok(TrackOutcome::Printed(json)) => println!("{}", json),
            Ok(TrackOutcome::Cached { dir, notes }) => {
                log::info!("{}: reused {} notes in {}", input.display(), notes, dir.display());
            }
            Ok(TrackOutcome::Saved { dir, notes }) => {
                log::info!("{}: wrote {} notes to {}", input.display(), notes, dir.display());
            }
            Ok(TrackOutcome::Empty) => {
                log::warn!("{}: no notes generated", input.display());
            }
            Err(err) => {
                failures += 1;
                log::error!("{}: {:#}", input.display(), err);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} tracks failed", failures, cli.inputs.len());
    }

    log::info!("Done!");
    Ok(())
}

fn print_estimates(inputs: &[PathBuf]) -> Result<()> {
    let estimates: Vec<(&PathBuf, Result<f64>)> = inputs
        .par_iter()
        .map(|input| {
            let bpm = decode_audio(input)
                .and_then(|audio| estimate_bpm(&audio.pcm()).map_err(Into::into));
            (input, bpm)
        })
        .collect();

    let mut failures = 0;
    for (input, bpm) in estimates {
        match bpm {
            Ok(bpm) => println!("{}\t{}", input.display(), bpm),
            Err(err) => {
                failures += 1;
                log::error!("{}: {:#}", input.display(), err);
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{} of {} tracks failed", failures, inputs.len());
    }
    Ok(())
}

fn process_track(input: &Path, cli: &Cli, cfg: &Config) -> Result<TrackOutcome> {
    let audio = decode_audio(input)?;
    cfg.check_audio(audio.duration(), audio.sample_rate)?;
    let pcm = audio.pcm();

    let bpm = match cli.bpm {
        Some(bpm) => bpm,
        None => estimate_bpm(&pcm).context("Tempo estimation failed")?,
    };

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Input file name is not valid UTF-8")?
        .to_string();
    let identity = cli.seed_key.clone().unwrap_or_else(|| stem.clone());

    let level_id = level::level_id(&level::song_key(&stem, bpm, audio.duration(), audio.sample_rate));
    let dir = level::level_dir(&cfg.output.levels_dir, &level_id);

    if !cli.force && !cli.stdout {
        if let Some(notes) = level::load_beatmap(&dir)? {
            return Ok(TrackOutcome::Cached {
                dir,
                notes: notes.len(),
            });
        }
    }

    let params = cfg.generation_params(bpm);
    let beatmap = generate(&pcm, &identity, &params)
        .with_context(|| format!("Beatmap generation failed for {}", input.display()))?;
    log::debug!("{}: {:?}", stem, beatmap.stats);

    if cli.stdout {
        let file = BeatmapFile {
            notes: beatmap.notes,
        };
        return Ok(TrackOutcome::Printed(serde_json::to_string_pretty(&file)?));
    }

    let info = level_info(input, &stem, level_id, bpm, &audio);
    if level::save_level(&dir, &info, &beatmap.notes, input)? {
        Ok(TrackOutcome::Saved {
            dir,
            notes: beatmap.notes.len(),
        })
    } else {
        Ok(TrackOutcome::Empty)
    }
}

fn level_info(input: &Path, stem: &str, level_id: String, bpm: f64, audio: &AudioData) -> LevelInfo {
    let song_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| stem.to_string());
    LevelInfo {
        level_id,
        level_name: stem.to_string(),
        song_name,
        bpm,
        duration: audio.duration(),
    }
}
