//! Offline rendering and WAV output.
//!
//! This module provides:
//! - Concurrent per-instrument rendering with a shared master buffer
//! - Track duration estimation
//! - A bit-exact mono 16-bit WAV encoder
//! - The score-to-file export entry point

pub mod export;
pub mod render;
pub mod wav;

pub use export::{render_to_wav, write_track, ExportError, ExportSummary};
pub use render::{
    group_by_instrument, merge_buffers, mix_into, total_duration_secs, RenderError,
    RenderedTrack, Renderer,
};
pub use wav::{write_silence, WavError, WavHeader, WavWriter, HEADER_LEN};
