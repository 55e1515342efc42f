//! Waveform generators.
//!
//! Both generators are pure functions of their arguments. Velocity is a raw
//! linear multiplier on a unit sine, so a full-velocity note peaks at 127,
//! far below 16-bit full scale.

use std::f64::consts::PI;

/// Reference pitch for equal temperament (A4).
pub const A4_FREQUENCY: f64 = 440.0;

/// MIDI note number of A4.
pub const A4_NOTE: u8 = 69;

/// Base frequency of the kick drum at note 0.
pub const KICK_BASE_FREQUENCY: f64 = 40.0;

/// Decay rate of the kick envelope across the whole note.
const KICK_DECAY: f64 = 8.0;

/// Converts a floating-point sample value to a 16-bit sample.
///
/// Truncates toward zero, then keeps the low 16 bits. Values outside the
/// 16-bit range wrap around instead of saturating.
///
/// # Examples
///
/// ```
/// use scoremix::instrument::to_sample;
///
/// assert_eq!(to_sample(99.9), 99);
/// assert_eq!(to_sample(-99.9), -99);
/// assert_eq!(to_sample(40000.0), -25536);
/// ```
#[inline]
pub fn to_sample(value: f64) -> i16 {
    value as i64 as i16
}

/// Number of samples a note of `duration` seconds occupies.
#[inline]
pub fn sample_count(duration: f64, sample_rate: u32) -> usize {
    (duration * sample_rate as f64) as usize
}

/// Equal-tempered frequency of a MIDI note, with A4 at 440 Hz.
pub fn tonal_frequency(note: u8) -> f64 {
    A4_FREQUENCY * 2f64.powf((note as f64 - A4_NOTE as f64) / 12.0)
}

/// Kick drum frequency for a MIDI note.
///
/// Note 0 sounds at 40 Hz and each octave of note number doubles it.
pub fn kick_frequency(note: u8) -> f64 {
    KICK_BASE_FREQUENCY * 2f64.powf(note as f64 / 12.0)
}

/// Exponential decay envelope of the kick, spanning the full note.
#[inline]
pub fn kick_envelope(index: usize, num_samples: usize) -> f64 {
    (-KICK_DECAY * index as f64 / num_samples as f64).exp()
}

/// Sine oscillator scaled by `amplitude`.
///
/// Phase is the sample index itself, not wrapped to the period.
pub fn sine(frequency: f64, amplitude: f64, num_samples: usize, sample_rate: u32) -> Vec<i16> {
    let rate = sample_rate as f64;
    (0..num_samples)
        .map(|i| {
            let value = (2.0 * PI * frequency * i as f64 / rate).sin();
            to_sample(value * amplitude)
        })
        .collect()
}

/// Renders a tonal synth note: a plain sine at the note's equal-tempered pitch.
pub fn render_tonal(note: u8, velocity: u8, duration: f64, sample_rate: u32) -> Vec<i16> {
    let num_samples = sample_count(duration, sample_rate);
    sine(
        tonal_frequency(note),
        velocity as f64,
        num_samples,
        sample_rate,
    )
}

/// Renders a kick drum note: a low sine under an exponential decay.
pub fn render_kick(note: u8, velocity: u8, duration: f64, sample_rate: u32) -> Vec<i16> {
    let num_samples = sample_count(duration, sample_rate);
    let frequency = kick_frequency(note);
    let rate = sample_rate as f64;

    (0..num_samples)
        .map(|i| {
            let env = kick_envelope(i, num_samples);
            let value = (2.0 * PI * frequency * i as f64 / rate).sin() * env;
            to_sample(value * velocity as f64)
        })
        .collect()
}
