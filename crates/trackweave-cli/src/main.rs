//! Trackweave CLI - the `trackweave` command.
//!
//! Points the renderer at a working directory containing an instrument
//! catalog (`instruments.txt`), one or more score files, and the samples
//! they reference; writes one mixed WAV back into that directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use trackweave_core::{render, InstrumentBank, ScoreParser};

/// Name of the instrument catalog inside the working directory.
const CATALOG_FILE: &str = "instruments.txt";

/// Trackweave - render plain-text scores with sampled instruments
#[derive(Parser, Debug)]
#[command(name = "trackweave")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Render plain-text scores with sampled instruments", long_about = None)]
struct Args {
    /// Working directory with the instrument catalog and score files
    #[arg(value_name = "DIR")]
    directory: PathBuf,

    /// Output WAV file, written inside the working directory
    #[arg(short, long, default_value = "trackweave_output.wav")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let dir = &args.directory;
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut bank = InstrumentBank::from_catalog(dir.join(CATALOG_FILE))
        .with_context(|| format!("failed to load {} from {}", CATALOG_FILE, dir.display()))?;

    let scores =
        discover_scores(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    if scores.is_empty() {
        log::warn!("no score files found in {}", dir.display());
    }

    let mut insertions = Vec::new();
    for path in &scores {
        log::info!("parsing {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut parser = ScoreParser::new(&bank);
        parser.feed(&text);
        insertions.extend(parser.into_insertions());
    }

    let buffer = render(&mut bank, &insertions).context("render failed")?;

    let output = dir.join(&args.output);
    buffer
        .save(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!(
        "wrote {} ({} samples, {:.1}s)",
        output.display(),
        buffer.frame_count(),
        buffer.duration_seconds()
    );
    Ok(())
}

/// Score files are the `.txt` files whose lowercased name starts with
/// `track` or `score`, taken in sorted order so runs are deterministic.
fn discover_scores(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut scores = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if (name.starts_with("track") || name.starts_with("score")) && name.ends_with(".txt") {
            scores.push(entry.path());
        }
    }
    scores.sort();
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(8192i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_discover_scores_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "track2.txt",
            "Score_b.txt",
            "track1.txt",
            "notes.txt",
            "track3.wav",
            "instruments.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let scores = discover_scores(dir.path()).unwrap();
        let names: Vec<_> = scores
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Score_b.txt", "track1.txt", "track2.txt"]);
    }

    #[test]
    fn test_run_renders_directory_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("piano.wav"), 1000);
        fs::write(dir.path().join("instruments.txt"), "piano C4 piano.wav\n").unwrap();
        fs::write(dir.path().join("score.txt"), "C4 E4 G4\nC5\n").unwrap();

        run(Args {
            directory: dir.path().to_path_buf(),
            output: PathBuf::from("out.wav"),
        })
        .unwrap();

        let reader = hound::WavReader::open(dir.path().join("out.wav")).unwrap();
        assert_eq!(reader.spec().channels, 2);
        // Last insertion lands at one default jump; five seconds of grace
        // follow it.
        let expected_frames = 11025 + 5 * 44100;
        assert_eq!(reader.duration(), expected_frames);
    }

    #[test]
    fn test_run_fails_on_missing_directory() {
        assert!(run(Args {
            directory: PathBuf::from("/nonexistent/workdir"),
            output: PathBuf::from("out.wav"),
        })
        .is_err());
    }

    #[test]
    fn test_run_fails_without_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("score.txt"), "C4\n").unwrap();
        assert!(run(Args {
            directory: dir.path().to_path_buf(),
            output: PathBuf::from("out.wav"),
        })
        .is_err());
    }
}
