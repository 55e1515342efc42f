//! Note event representation.
//!
//! A note event is a single sounding note with timing in seconds,
//! pitch, velocity, and the name of the instrument that plays it.

use serde::{Deserialize, Serialize};

/// A single note in a score.
///
/// Events are immutable once read. Their order inside a score carries no
/// meaning: mixing is commutative, so any permutation renders the same audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Start time in seconds from the beginning of the track.
    pub start: f64,

    /// Duration in seconds.
    pub duration: f64,

    /// MIDI note number (0-127). 69 = A4 (440 Hz).
    pub note: u8,

    /// Note velocity (0-127). Used directly as a linear amplitude multiplier.
    pub velocity: u8,

    /// Name of the instrument that plays this note.
    pub instrument: String,
}

impl NoteEvent {
    /// Creates a new note event.
    ///
    /// # Arguments
    ///
    /// * `start` - Start time in seconds
    /// * `duration` - Duration in seconds
    /// * `note` - MIDI note number
    /// * `velocity` - Note velocity
    /// * `instrument` - Instrument name
    ///
    /// # Examples
    ///
    /// ```
    /// use scoremix::score::NoteEvent;
    ///
    /// // A one second kick drum at the start of the track
    /// let event = NoteEvent::new(0.0, 1.0, 0, 100, "kick");
    /// assert_eq!(event.end(), 1.0);
    /// ```
    pub fn new(
        start: f64,
        duration: f64,
        note: u8,
        velocity: u8,
        instrument: impl Into<String>,
    ) -> Self {
        Self {
            start,
            duration,
            note,
            velocity,
            instrument: instrument.into(),
        }
    }

    /// Returns the end time of this event (start + duration), unscaled.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Returns the start time on a timeline played `speed` times faster.
    pub fn scaled_start(&self, speed: f64) -> f64 {
        self.start / speed
    }

    /// Returns the duration on a timeline played `speed` times faster.
    pub fn scaled_duration(&self, speed: f64) -> f64 {
        self.duration / speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_end() {
        let event = NoteEvent::new(1.5, 0.25, 60, 90, "arp");
        assert_eq!(event.end(), 1.75);
    }

    #[test]
    fn test_speed_scaling() {
        let event = NoteEvent::new(2.0, 1.0, 60, 90, "arp");
        assert_eq!(event.scaled_start(2.0), 1.0);
        assert_eq!(event.scaled_duration(2.0), 0.5);
        assert_eq!(event.scaled_start(0.5), 4.0);
        assert_eq!(event.scaled_duration(0.5), 2.0);
    }

    #[test]
    fn test_field_names() {
        let json = r#"{"start":0.5,"duration":1.0,"note":69,"velocity":100,"instrument":"lead"}"#;
        let event: NoteEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, NoteEvent::new(0.5, 1.0, 69, 100, "lead"));
    }
}
