//! scoremix - render a JSON note score to a mono WAV file.
//!
//! # Usage
//!
//! ```bash
//! scoremix demo                 # assets/demo.json -> out/demo.wav
//! scoremix demo -o baba -s 1.9  # faster playback, written to out/baba.wav
//! scoremix --silence silence 3  # three seconds of silence in out/silence.wav
//! ```
//!
//! Set `RUST_LOG=debug` to see per-instrument progress.

use anyhow::{bail, Context, Result};
use scoremix::audio::write_silence;
use scoremix::{load_events, render_to_wav, InstrumentRegistry, RenderConfig};
use std::fs;
use std::path::PathBuf;

/// What the binary was asked to do.
enum Command {
    /// Render a score by name.
    Render {
        score: String,
        output: Option<String>,
    },
    /// Write a silent file.
    Silence { output: String, seconds: u32 },
}

/// Command-line options for the application.
struct CliOptions {
    command: Command,
    /// Optional JSON settings file, applied before the flags below.
    config: Option<PathBuf>,
    sample_rate: Option<u32>,
    speed: Option<f64>,
    assets_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

fn print_help(program: &str) {
    eprintln!("scoremix - Render a note score to a mono 16-bit WAV file");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <SCORE>", program);
    eprintln!("       {} [OPTIONS] --silence <NAME> <SECONDS>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output NAME      Output file name without extension (default: SCORE)");
    eprintln!("  -r, --sample-rate HZ   Sample rate (default: 44100)");
    eprintln!("  -s, --speed FACTOR     Playback speed coefficient (default: 1.0)");
    eprintln!("      --assets DIR       Directory score files are read from (default: assets)");
    eprintln!("      --out DIR          Directory WAV files are written to (default: out)");
    eprintln!("  -c, --config FILE      JSON file with default settings");
    eprintln!("  -h, --help             Print this help message");
}

/// Advances past `flag` and returns its argument.
fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    match args.get(*i) {
        Some(v) => Ok(v.as_str()),
        None => bail!("{} requires an argument", flag),
    }
}

impl CliOptions {
    /// Parses command-line arguments.
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let program = args.first().map(String::as_str).unwrap_or("scoremix");

        let mut score: Option<String> = None;
        let mut output: Option<String> = None;
        let mut silence: Option<(String, u32)> = None;
        let mut config = None;
        let mut sample_rate: Option<u32> = None;
        let mut speed: Option<f64> = None;
        let mut assets_dir = None;
        let mut output_dir = None;

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--output" | "-o" => {
                    output = Some(next_value(&args, &mut i, flag)?.to_string());
                }
                "--sample-rate" | "-r" => {
                    let v = next_value(&args, &mut i, flag)?;
                    sample_rate = Some(
                        v.parse()
                            .with_context(|| format!("Invalid sample rate: {}", v))?,
                    );
                }
                "--speed" | "-s" => {
                    let v = next_value(&args, &mut i, flag)?;
                    speed = Some(v.parse().with_context(|| format!("Invalid speed: {}", v))?);
                }
                "--assets" => {
                    assets_dir = Some(PathBuf::from(next_value(&args, &mut i, flag)?));
                }
                "--out" => {
                    output_dir = Some(PathBuf::from(next_value(&args, &mut i, flag)?));
                }
                "--config" | "-c" => {
                    config = Some(PathBuf::from(next_value(&args, &mut i, flag)?));
                }
                "--silence" => {
                    let name = next_value(&args, &mut i, flag)?.to_string();
                    let v = next_value(&args, &mut i, flag)?;
                    let seconds: u32 = v
                        .parse()
                        .with_context(|| format!("Invalid duration: {}", v))?;
                    silence = Some((name, seconds));
                }
                "--help" | "-h" => {
                    print_help(program);
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
                other => {
                    if score.is_some() {
                        bail!("Unexpected argument: {}", other);
                    }
                    score = Some(other.to_string());
                }
            }
            i += 1;
        }

        let command = match (silence, score) {
            (Some((output, seconds)), None) => Command::Silence { output, seconds },
            (None, Some(score)) => Command::Render { score, output },
            (Some(_), Some(_)) => bail!("--silence cannot be combined with a score"),
            (None, None) => {
                print_help(program);
                std::process::exit(1);
            }
        };

        Ok(Self {
            command,
            config,
            sample_rate,
            speed,
            assets_dir,
            output_dir,
        })
    }

    /// Builds the effective settings: defaults, then config file, then flags.
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RenderConfig::default(),
        };
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(dir) = &self.assets_dir {
            config.assets_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = cli.render_config()?;
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    match &cli.command {
        Command::Silence { output, seconds } => {
            let path = config.output_path(output);
            write_silence(&path, config.sample_rate, *seconds)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        Command::Render { score, output } => {
            let score_path = config.score_path(score);
            let events = load_events(&score_path)
                .with_context(|| format!("Failed to load score {}", score_path.display()))?;

            let registry = InstrumentRegistry::new();
            let output = output.as_deref().unwrap_or(score);
            let summary = render_to_wav(&events, &config, output, &registry)
                .context("Render failed")?;

            println!(
                "Wrote {} ({}s, {} instruments, {} samples)",
                summary.path.display(),
                summary.duration_secs,
                summary.instruments,
                summary.sample_count
            );
        }
    }

    Ok(())
}
