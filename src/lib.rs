//! scoremix - an offline renderer that mixes a note score into a WAV file.
//!
//! Each instrument in the score is rendered on its own thread and mixed
//! into a single mono 16-bit track with wrapping arithmetic.

pub mod audio;
pub mod config;
pub mod instrument;
pub mod score;

// Re-export commonly used types
pub use audio::{render_to_wav, ExportError, ExportSummary, RenderedTrack, Renderer};
pub use config::RenderConfig;
pub use instrument::{Instrument, InstrumentKind, InstrumentRegistry};
pub use score::{load_events, NoteEvent};
