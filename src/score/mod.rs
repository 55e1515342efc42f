//! Score data structures.
//!
//! A score is an unordered list of note events. This module provides the
//! event type, JSON loading, and the score end time.

mod event;
mod load;

pub use event::NoteEvent;
pub use load::{load_events, parse_events, ScoreError};

/// Returns the latest end time in the score, in unscaled seconds.
///
/// An empty score ends at 0.0.
pub fn end_time(events: &[NoteEvent]) -> f64 {
    events.iter().map(NoteEvent::end).fold(0.0, f64::max)
}
