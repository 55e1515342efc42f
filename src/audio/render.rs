//! Concurrent multi-instrument rendering.
//!
//! The score is grouped by instrument name and each group is rendered on
//! its own thread into a private buffer. When a group is done, its buffer
//! is added into the shared master buffer under a lock. All additions use
//! 16-bit wrapping arithmetic, so the result does not depend on the order
//! in which groups finish.

use crate::instrument::InstrumentRegistry;
use crate::score::{self, NoteEvent};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while setting up a render.
///
/// Once the buffers are allocated, rendering is pure arithmetic and cannot fail.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The score is too long to hold in one sample buffer
    #[error("track of {duration_secs}s does not fit in a sample buffer")]
    TooLong { duration_secs: u64 },
    /// The worker pool for the instrument groups could not be started
    #[error("failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Computes the total track length in whole seconds.
///
/// This is the latest scaled end time, floored, plus one second. The
/// running maximum starts at zero, so an empty score is one second long.
/// Ends beyond the `u64` range saturate to `u64::MAX`.
///
/// # Examples
///
/// ```
/// use scoremix::audio::total_duration_secs;
/// use scoremix::score::NoteEvent;
///
/// let events = vec![
///     NoteEvent::new(0.0, 2.0, 36, 100, "kick"),
///     NoteEvent::new(1.0, 1.0, 60, 100, "arp"),
/// ];
/// assert_eq!(total_duration_secs(&events, 1.0), 3);
/// assert_eq!(total_duration_secs(&[], 1.0), 1);
/// ```
pub fn total_duration_secs(events: &[NoteEvent], speed: f64) -> u64 {
    let max_end = score::end_time(events) / speed;
    (max_end as u64).saturating_add(1)
}

/// Groups events by instrument name, keeping first-appearance order of
/// names and the original order of events inside each group.
pub fn group_by_instrument(events: &[NoteEvent]) -> Vec<(&str, Vec<&NoteEvent>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&NoteEvent>)> = Vec::new();

    for event in events {
        let name = event.instrument.as_str();
        match index.get(name) {
            Some(&i) => groups[i].1.push(event),
            None => {
                index.insert(name, groups.len());
                groups.push((name, vec![event]));
            }
        }
    }
    groups
}

/// Adds `samples` into `buffer` starting at `start`, wrapping on overflow.
///
/// Samples landing before index 0 or past the end are dropped.
pub fn mix_into(buffer: &mut [i16], samples: &[i16], start: i64) {
    for (offset, &sample) in samples.iter().enumerate() {
        let index = start + offset as i64;
        if index < 0 {
            continue;
        }
        match buffer.get_mut(index as usize) {
            Some(slot) => *slot = slot.wrapping_add(sample),
            None => break,
        }
    }
}

/// Adds `source` into `target` element-wise with wrapping arithmetic.
///
/// Scans the full length regardless of which region was touched.
pub fn merge_buffers(target: &mut [i16], source: &[i16]) {
    for (t, &s) in target.iter_mut().zip(source) {
        *t = t.wrapping_add(s);
    }
}

/// A fully mixed mono track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTrack {
    /// Mixed samples, `sample_rate * duration_secs` long.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Track length in whole seconds.
    pub duration_secs: u32,
    /// Number of distinct instruments that were rendered.
    pub instruments: usize,
}

/// Renders scores into a master buffer, one thread per instrument.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    registry: &'a InstrumentRegistry,
    sample_rate: u32,
    speed: f64,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer.
    ///
    /// # Arguments
    ///
    /// * `registry` - Source of instrument instances
    /// * `sample_rate` - Output sample rate in Hz
    /// * `speed` - Divides every start time and duration (2.0 plays twice as fast)
    pub fn new(registry: &'a InstrumentRegistry, sample_rate: u32, speed: f64) -> Self {
        Self {
            registry,
            sample_rate,
            speed,
        }
    }

    /// Renders all events of one instrument into a new buffer of `len` samples.
    fn render_group(&self, name: &str, events: &[&NoteEvent], len: usize) -> Vec<i16> {
        let instrument = self.registry.get_or_create(name);
        tracing::debug!(
            instrument = name,
            id = instrument.id(),
            events = events.len(),
            "Rendering instrument group"
        );

        let mut local = vec![0i16; len];
        for event in events {
            let start = event.scaled_start(self.speed);
            let duration = event.scaled_duration(self.speed);
            let samples = instrument.render(event.note, event.velocity, duration, self.sample_rate);
            let start_sample = (start * self.sample_rate as f64).floor() as i64;
            mix_into(&mut local, &samples, start_sample);
        }
        local
    }

    /// Renders and mixes the whole score.
    ///
    /// Blocks until every instrument group has been merged.
    ///
    /// # Errors
    ///
    /// Returns error if the track is too long to allocate or the worker
    /// threads cannot be started
    pub fn render(&self, events: &[NoteEvent]) -> Result<RenderedTrack, RenderError> {
        let total = total_duration_secs(events, self.speed);
        let duration_secs =
            u32::try_from(total).map_err(|_| RenderError::TooLong { duration_secs: total })?;
        let len = (self.sample_rate as usize)
            .checked_mul(duration_secs as usize)
            .ok_or(RenderError::TooLong { duration_secs: total })?;

        let groups = group_by_instrument(events);
        let master = Mutex::new(vec![0i16; len]);

        if !groups.is_empty() {
            // Dedicated pool sized to the instrument count, torn down on return
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(groups.len())
                .thread_name(|i| format!("scoremix-render-{}", i))
                .build()?;

            pool.scope(|scope| {
                for (name, group) in &groups {
                    let master = &master;
                    scope.spawn(move |_| {
                        let local = self.render_group(name, group, len);
                        let mut master = master.lock().unwrap_or_else(PoisonError::into_inner);
                        merge_buffers(&mut master, &local);
                    });
                }
            });
        }

        let samples = master.into_inner().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(
            "Rendered {} events on {} instruments into {} samples ({}s)",
            events.len(),
            groups.len(),
            samples.len(),
            duration_secs
        );

        Ok(RenderedTrack {
            samples,
            sample_rate: self.sample_rate,
            duration_secs,
            instruments: groups.len(),
        })
    }
}
