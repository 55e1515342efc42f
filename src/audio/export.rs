//! Score export to WAV.
//!
//! Renders a score through the instrument registry and writes the mixed
//! track as a mono 16-bit WAV file.

use super::render::{total_duration_secs, RenderError, RenderedTrack, Renderer};
use super::wav::{WavError, WavHeader, WavWriter};
use crate::config::{ConfigError, RenderConfig};
use crate::instrument::InstrumentRegistry;
use crate::score::NoteEvent;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Wav(#[from] WavError),
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Path of the written file.
    pub path: PathBuf,
    /// Track length in seconds.
    pub duration_secs: u32,
    /// Number of samples in the data chunk.
    pub sample_count: usize,
    /// Number of distinct instruments in the score.
    pub instruments: usize,
}

/// Writes a rendered track to `path`.
///
/// The writer is closed even when writing the samples fails; the first
/// error is returned.
///
/// # Errors
///
/// Returns error if the file cannot be created, written, or flushed
pub fn write_track<P: AsRef<Path>>(path: P, track: &RenderedTrack) -> Result<(), WavError> {
    let mut writer = WavWriter::create(path, track.sample_rate, track.duration_secs)?;
    let written = writer.write_samples(&track.samples);
    let closed = writer.close();
    written?;
    closed
}

/// Renders a score and writes it to `<output_dir>/<output_name>.wav`.
///
/// # Arguments
///
/// * `events` - The score
/// * `config` - Sample rate, speed, and output directory
/// * `output_name` - File name without extension
/// * `registry` - Instrument cache shared across renders
///
/// # Errors
///
/// Returns error if the config is invalid, the track is too long for the
/// WAV size fields, or the file cannot be written. Sizes are checked before
/// any sample buffer is allocated.
pub fn render_to_wav(
    events: &[NoteEvent],
    config: &RenderConfig,
    output_name: &str,
    registry: &InstrumentRegistry,
) -> Result<ExportSummary, ExportError> {
    config.validate()?;
    WavHeader::new(config.sample_rate, total_duration_secs(events, config.speed))?;

    let renderer = Renderer::new(registry, config.sample_rate, config.speed);
    let track = renderer.render(events)?;

    let path = config.output_path(output_name);
    write_track(&path, &track)?;
    tracing::info!("Exported {:?} ({}s)", path, track.duration_secs);

    Ok(ExportSummary {
        path,
        duration_secs: track.duration_secs,
        sample_count: track.samples.len(),
        instruments: track.instruments,
    })
}
