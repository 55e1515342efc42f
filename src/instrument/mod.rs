//! Instruments and their waveform generators.
//!
//! Instruments are selected by name prefix: names starting with `kick` get a
//! percussive synth, everything else (including `arp*`) gets a tonal synth.
//! Instances are shared through the [`InstrumentRegistry`], which hands out
//! exactly one instance per name.

mod registry;
mod synth;

pub use registry::{CreationListener, InstrumentCreated, InstrumentRegistry};
pub use synth::{
    kick_envelope, kick_frequency, render_kick, render_tonal, sample_count, sine, to_sample,
    tonal_frequency,
};

use std::fmt;

/// The sound-generating behavior of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Sine oscillator at equal-tempered pitch.
    Tonal,
    /// Decaying low sine ("kick").
    Percussive,
}

impl InstrumentKind {
    /// Renders one note into a fresh sample buffer.
    ///
    /// # Arguments
    ///
    /// * `note` - MIDI note number
    /// * `velocity` - Linear amplitude multiplier (0-127)
    /// * `duration` - Note length in seconds
    /// * `sample_rate` - Samples per second
    pub fn render(&self, note: u8, velocity: u8, duration: f64, sample_rate: u32) -> Vec<i16> {
        match self {
            InstrumentKind::Tonal => render_tonal(note, velocity, duration, sample_rate),
            InstrumentKind::Percussive => render_kick(note, velocity, duration, sample_rate),
        }
    }
}

/// How an instrument name was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Name starts with `kick`.
    Kick,
    /// Name starts with `arp`.
    Arp,
    /// Any other name; plays as a tonal synth.
    Fallback,
}

impl Classification {
    /// Returns the synth kind this classification plays with.
    pub fn kind(&self) -> InstrumentKind {
        match self {
            Classification::Kick => InstrumentKind::Percussive,
            Classification::Arp | Classification::Fallback => InstrumentKind::Tonal,
        }
    }

    /// Returns a short label for log output.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Kick => "kick",
            Classification::Arp => "arp",
            Classification::Fallback => "default",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies an instrument name by its prefix.
///
/// Matching is case-sensitive.
///
/// # Examples
///
/// ```
/// use scoremix::instrument::{classify, Classification};
///
/// assert_eq!(classify("kick2"), Classification::Kick);
/// assert_eq!(classify("arpeggio"), Classification::Arp);
/// assert_eq!(classify("lead"), Classification::Fallback);
/// ```
pub fn classify(name: &str) -> Classification {
    if name.starts_with("kick") {
        Classification::Kick
    } else if name.starts_with("arp") {
        Classification::Arp
    } else {
        Classification::Fallback
    }
}

/// A named instrument instance handed out by the registry.
///
/// Identity is the allocation itself: two handles refer to the same
/// instrument when `Arc::ptr_eq` holds, and then they also share `id`.
#[derive(Debug)]
pub struct Instrument {
    id: u64,
    name: String,
    classification: Classification,
}

impl Instrument {
    fn new(id: u64, name: &str, classification: Classification) -> Self {
        Self {
            id,
            name: name.to_string(),
            classification,
        }
    }

    /// Registry-assigned id, unique within one registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name this instrument was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn kind(&self) -> InstrumentKind {
        self.classification.kind()
    }

    /// Renders one note with this instrument's synth.
    pub fn render(&self, note: u8, velocity: u8, duration: f64, sample_rate: u32) -> Vec<i16> {
        self.kind().render(note, velocity, duration, sample_rate)
    }
}
