//! Codec registry and priority arbitration (spec.md §4.9), grounded on
//! `dicom-transfer-syntax-registry`'s `TransferSyntaxRegistryImpl`: a table
//! keyed by transfer-syntax identifier, here extended with the freeze/thaw
//! snapshot discipline spec.md §9's Design Notes table calls for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{info, warn};

use crate::codec_trait::PixelDataCodec;

/// A binding from a transfer-syntax identifier to an implementation plus
/// its registration priority (spec.md §3 "Registered codec entry").
#[derive(Clone)]
pub struct RegisteredCodec {
    pub codec: Arc<dyn PixelDataCodec>,
    pub priority: i32,
}

type Table = HashMap<&'static str, RegisteredCodec>;

/// Full mapping plus a frozen snapshot for lock-free hot-path lookup
/// (spec.md §3 "Registry", §9 Design Notes "Registry freeze/thaw").
pub struct CodecRegistry {
    table: RwLock<Table>,
    snapshot: Mutex<Option<Arc<Table>>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self { table: RwLock::new(HashMap::new()), snapshot: Mutex::new(None) }
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `register(codec, priority)` (spec.md §4.9). A strictly-greater
    /// priority displaces the current entry; an equal or lesser priority
    /// is a deterministic no-op. Invalidates the frozen snapshot on any
    /// actual mutation.
    pub fn register(&self, codec: Arc<dyn PixelDataCodec>, priority: i32) {
        let transfer_syntax = codec.transfer_syntax();
        let mut table = self.table.write().unwrap();
        let replace = match table.get(transfer_syntax) {
            Some(existing) => priority > existing.priority,
            None => true,
        };
        if !replace {
            warn!(transfer_syntax, priority, existing_priority = table.get(transfer_syntax).map(|e| e.priority), "codec registration rejected: priority does not exceed the incumbent");
            return;
        }
        info!(transfer_syntax, priority, name = codec.name(), "codec registered");
        table.insert(transfer_syntax, RegisteredCodec { codec, priority });
        drop(table);
        *self.snapshot.lock().unwrap() = None;
    }

    /// `lookup(transfer_syntax) -> codec_or_none` (spec.md §4.9). Serves
    /// from the frozen snapshot if one exists; otherwise builds one under
    /// the write lock, per spec.md §8's "must not acquire any lock until
    /// the next register" testable property.
    pub fn lookup(&self, transfer_syntax: &str) -> Option<Arc<dyn PixelDataCodec>> {
        self.get_codec_info(transfer_syntax).map(|entry| entry.codec)
    }

    /// `get_codec_info(transfer_syntax) -> (name, priority, origin)`
    /// (spec.md §4.9); returns `None` if unregistered.
    pub fn get_codec_info(&self, transfer_syntax: &str) -> Option<RegisteredCodec> {
        {
            let snapshot = self.snapshot.lock().unwrap();
            if let Some(snap) = snapshot.as_ref() {
                return snap.get(transfer_syntax).cloned();
            }
        }
        self.freeze();
        let snapshot = self.snapshot.lock().unwrap();
        snapshot.as_ref().and_then(|snap| snap.get(transfer_syntax).cloned())
    }

    /// `get_priority(transfer_syntax) -> priority_or_none` (spec.md §4.9).
    pub fn get_priority(&self, transfer_syntax: &str) -> Option<i32> {
        self.get_codec_info(transfer_syntax).map(|entry| entry.priority)
    }

    /// Build an immutable snapshot from the mutable table under the write
    /// lock and publish it, if one isn't already published.
    fn freeze(&self) {
        let mut snapshot = self.snapshot.lock().unwrap();
        if snapshot.is_some() {
            return;
        }
        let table = self.table.read().unwrap();
        *snapshot = Some(Arc::new(table.clone()));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.table.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::codec_trait::RasterFrame;

    struct StubCodec {
        ts: &'static str,
        name: &'static str,
    }

    impl PixelDataCodec for StubCodec {
        fn transfer_syntax(&self) -> &'static str {
            self.ts
        }
        fn decode(&self, _input: &[u8]) -> Result<RasterFrame, CodecError> {
            unimplemented!("stub")
        }
        fn encode(&self, _frame: &RasterFrame) -> Result<Vec<u8>, CodecError> {
            unimplemented!("stub")
        }
        fn name(&self) -> &'static str {
            self.name
        }
    }

    const TS: &str = "1.2.840.10008.1.2.4.50";

    #[test]
    fn higher_priority_wins_and_user_override_beats_native() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(StubCodec { ts: TS, name: "native" }), 100);
        assert_eq!(registry.lookup(TS).unwrap().name(), "native");

        registry.register(Arc::new(StubCodec { ts: TS, name: "user-custom" }), 200);
        assert_eq!(registry.lookup(TS).unwrap().name(), "user-custom");

        registry.register(Arc::new(StubCodec { ts: TS, name: "pure-portable" }), 50);
        assert_eq!(registry.lookup(TS).unwrap().name(), "user-custom");
    }

    #[test]
    fn equal_priority_is_a_no_op() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(StubCodec { ts: TS, name: "first" }), 100);
        registry.register(Arc::new(StubCodec { ts: TS, name: "second" }), 100);
        assert_eq!(registry.lookup(TS).unwrap().name(), "first");
    }

    #[test]
    fn repeated_identical_registration_is_idempotent() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(StubCodec { ts: TS, name: "only" }), 100);
        registry.register(Arc::new(StubCodec { ts: TS, name: "only" }), 100);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregistered_lookup_is_none() {
        let registry = CodecRegistry::new();
        assert!(registry.lookup("unknown").is_none());
        assert!(registry.get_priority("unknown").is_none());
    }

    #[test]
    fn register_after_freeze_is_observed_on_next_lookup() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(StubCodec { ts: TS, name: "v1" }), 100);
        assert_eq!(registry.lookup(TS).unwrap().name(), "v1"); // freezes here
        registry.register(Arc::new(StubCodec { ts: TS, name: "v2" }), 200);
        assert_eq!(registry.lookup(TS).unwrap().name(), "v2"); // thaws, re-freezes
    }
}
