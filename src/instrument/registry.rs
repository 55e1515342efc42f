//! Name-keyed instrument cache.
//!
//! The registry creates an instrument the first time a name is requested
//! and returns that same instance for every later request. Entries are
//! never removed; a registry lives for a whole render session.

use super::{classify, Classification, Instrument, InstrumentKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Structured record of an instrument being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentCreated {
    /// Synth kind of the new instrument.
    pub kind: InstrumentKind,
    /// How the name was classified.
    pub classification: Classification,
    /// Requested name.
    pub name: String,
    /// Assigned id.
    pub id: u64,
}

/// Callback invoked once per created instrument.
pub type CreationListener = Box<dyn Fn(&InstrumentCreated) + Send + Sync>;

/// Entries plus the id counter; both change together under one lock.
#[derive(Debug)]
struct Entries {
    instruments: HashMap<String, Arc<Instrument>>,
    next_id: u64,
}

/// Thread-safe instrument cache.
///
/// Concurrent first requests for the same name create a single instance;
/// every caller observes that instance.
pub struct InstrumentRegistry {
    entries: Mutex<Entries>,
    listener: Option<CreationListener>,
}

impl Default for InstrumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InstrumentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentRegistry")
            .field("entries", &self.entries)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl InstrumentRegistry {
    /// Creates an empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                instruments: HashMap::new(),
                next_id: 1,
            }),
            listener: None,
        }
    }

    /// Creates an empty registry that reports every creation to `listener`.
    ///
    /// The listener runs while the registry lock is held, so it must not
    /// call back into the registry.
    pub fn with_listener<F>(listener: F) -> Self
    where
        F: Fn(&InstrumentCreated) + Send + Sync + 'static,
    {
        Self {
            listener: Some(Box::new(listener)),
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Nothing inside the critical section can leave the map half-updated
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the instrument for `name`, creating it on first use.
    ///
    /// Check and creation happen under one lock, so exactly one instance
    /// ever exists per name.
    pub fn get_or_create(&self, name: &str) -> Arc<Instrument> {
        let mut entries = self.lock();

        if let Some(instrument) = entries.instruments.get(name) {
            return Arc::clone(instrument);
        }

        let id = entries.next_id;
        entries.next_id += 1;

        let classification = classify(name);
        let instrument = Arc::new(Instrument::new(id, name, classification));
        entries
            .instruments
            .insert(name.to_string(), Arc::clone(&instrument));

        let event = InstrumentCreated {
            kind: classification.kind(),
            classification,
            name: name.to_string(),
            id,
        };
        tracing::info!(
            kind = ?event.kind,
            classification = %event.classification,
            name = %event.name,
            id = event.id,
            "Created instrument"
        );
        if let Some(listener) = &self.listener {
            listener(&event);
        }

        instrument
    }

    /// Returns the instrument for `name` if it has been created.
    pub fn get(&self, name: &str) -> Option<Arc<Instrument>> {
        self.lock().instruments.get(name).cloned()
    }

    /// Number of instruments created so far.
    pub fn len(&self) -> usize {
        self.lock().instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn recording_registry() -> (InstrumentRegistry, Arc<Mutex<Vec<InstrumentCreated>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let registry = InstrumentRegistry::with_listener(move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        (registry, events)
    }

    #[test]
    fn test_same_name_same_instance() {
        let (registry, events) = recording_registry();
        let first = registry.get_or_create("kickA");
        let second = registry.get_or_create("kickA");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), second.id());
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_classification_on_create() {
        let registry = InstrumentRegistry::new();
        assert_eq!(
            registry.get_or_create("kick1").kind(),
            InstrumentKind::Percussive
        );
        assert_eq!(registry.get_or_create("arp1").kind(), InstrumentKind::Tonal);
        assert_eq!(registry.get_or_create("lead").kind(), InstrumentKind::Tonal);
        assert_eq!(
            registry.get_or_create("lead").classification(),
            Classification::Fallback
        );
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (registry, events) = recording_registry();
        assert_eq!(registry.get_or_create("a").id(), 1);
        assert_eq!(registry.get_or_create("b").id(), 2);
        assert_eq!(registry.get_or_create("a").id(), 1);
        assert_eq!(registry.get_or_create("c").id(), 3);
        assert_eq!(registry.len(), 3);

        let events = events.lock().unwrap();
        let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(events[0].name, "a");
        assert_eq!(events[0].classification, Classification::Fallback);
    }

    #[test]
    fn test_get_does_not_create() {
        let registry = InstrumentRegistry::new();
        assert!(registry.get("kick").is_none());
        assert!(registry.is_empty());

        let created = registry.get_or_create("kick");
        let found = registry.get("kick").unwrap();
        assert!(Arc::ptr_eq(&created, &found));
    }

    #[test]
    fn test_concurrent_first_use() {
        const THREADS: usize = 16;
        let (registry, events) = recording_registry();
        let barrier = Barrier::new(THREADS);

        let instruments: Vec<Arc<Instrument>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        registry.get_or_create("kickA")
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for instrument in &instruments[1..] {
            assert!(Arc::ptr_eq(&instruments[0], instrument));
        }
        assert_eq!(events.lock().unwrap().len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
