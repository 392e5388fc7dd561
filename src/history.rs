//! Linear undo/redo over configuration snapshots.

use crate::config::{EmblemChange, EmblemConfiguration};
use crate::persist::{ConfigPersistence, MemoryPersistence};

/// Called with the current configuration whenever it changes.
pub type Listener = Box<dyn FnMut(&EmblemConfiguration) + Send>;

/// Holds the editor's configuration and every earlier one.
///
/// The current configuration is always `log[index]`. [`update`](Self::update)
/// discards anything after `index` before appending, so redo is only
/// possible straight after an undo. Undo and redo only move the index.
///
/// Every operation is total: a failed save is logged and the in-memory state
/// still advances.
pub struct EditorHistoryStore<P = MemoryPersistence> {
    log: Vec<EmblemConfiguration>,
    index: usize,
    persistence: P,
    listeners: Vec<Listener>,
}

impl EditorHistoryStore<MemoryPersistence> {
    /// Creates a store that persists nowhere but memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryPersistence::new())
    }
}

impl<P: ConfigPersistence> EditorHistoryStore<P> {
    /// Creates a store holding a single blank configuration.
    pub fn new(persistence: P) -> Self {
        Self {
            log: vec![EmblemConfiguration::default()],
            index: 0,
            persistence,
            listeners: Vec::new(),
        }
    }

    /// Restarts the history from the saved configuration (or a blank one if
    /// nothing is saved) and publishes it.
    pub fn connect(&mut self) -> &EmblemConfiguration {
        let restored = match self.persistence.load() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable saved editor state");
                EmblemConfiguration::default()
            }
        };
        self.log = vec![restored];
        self.index = 0;
        self.publish();
        self.current()
    }

    pub fn current(&self) -> &EmblemConfiguration {
        &self.log[self.index]
    }

    /// Merges `change` over the current configuration and makes the result
    /// current.
    pub fn update(&mut self, change: &EmblemChange) -> &EmblemConfiguration {
        let next = change.merged_over(self.current());

        self.log.truncate(self.index + 1);
        self.log.push(next);
        self.index += 1;

        if let Err(e) = self.persistence.save(self.current()) {
            tracing::warn!(error = %e, "failed to save editor state");
        }
        self.publish();
        self.current()
    }

    /// Steps back one entry. Returns false (and does nothing) at the start.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.index -= 1;
        self.publish();
        true
    }

    /// Steps forward one entry. Returns false (and does nothing) at the end.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        self.publish();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.log.len()
    }

    /// Number of snapshots in the log, including the current one.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Always false: the log holds at least the current configuration.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Registers a callback run after every update, undo, redo and connect.
    pub fn subscribe(&mut self, listener: impl FnMut(&EmblemConfiguration) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn publish(&mut self) {
        let current = &self.log[self.index];
        for listener in &mut self.listeners {
            listener(current);
        }
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for EditorHistoryStore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorHistoryStore")
            .field("len", &self.log.len())
            .field("index", &self.index)
            .field("persistence", &self.persistence)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
