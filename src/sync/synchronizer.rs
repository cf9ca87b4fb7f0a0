use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::trace;

use crate::sync::key::KeyFn;
use crate::sync::policy::{DeltaPolicy, MergePolicy};

/// An opaque server-defined record.
pub type Record = Value;

/// Latest record per key.
pub type Collection = HashMap<String, Record>;

/// Normalizes a feed payload into a list of records.
///
/// Arrays yield their elements in order, `null` yields nothing, anything else
/// is a single record.
pub fn normalize(payload: Value) -> Vec<Record> {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

/// Maintains the keyed collection for one topic.
///
/// The current state is held as an `Arc<Collection>` frame inside a watch
/// channel. Readers get the frame by reference and may keep it as long as
/// they like; writers copy on write only when a frame is still held.
#[derive(Debug)]
pub struct Synchronizer {
    key: KeyFn,
    merge: MergePolicy,
    delta: DeltaPolicy,
    state: watch::Sender<Arc<Collection>>,
}

impl Synchronizer {
    pub fn new(key: KeyFn) -> Self {
        let (state, _) = watch::channel(Arc::new(Collection::new()));
        Self {
            key,
            merge: MergePolicy::default(),
            delta: DeltaPolicy::default(),
            state,
        }
    }

    pub fn with_merge_policy(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_delta_policy(mut self, delta: DeltaPolicy) -> Self {
        self.delta = delta;
        self
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge
    }

    pub fn delta_policy(&self) -> DeltaPolicy {
        self.delta
    }

    /// Replaces the whole collection with the records in `payload`.
    ///
    /// Keys absent from the snapshot are gone afterwards. Duplicate keys keep
    /// the last record in array order.
    pub fn apply_snapshot(&self, payload: Value) {
        let records = normalize(payload);
        let mut next = Collection::with_capacity(records.len());
        for record in records {
            if let Some(key) = self.keyed(&record) {
                next.insert(key, record);
            }
        }
        self.state.send_replace(Arc::new(next));
    }

    /// Upserts the records in `payload` under the configured policies.
    pub fn apply_delta(&self, payload: Value) {
        let records = normalize(payload);
        let merge = self.merge;
        match self.delta {
            DeltaPolicy::Upsert => {
                self.state.send_modify(|current| {
                    let collection = Arc::make_mut(current);
                    for record in records {
                        if let Some(key) = self.keyed(&record) {
                            upsert(collection, key, record, merge);
                        }
                    }
                });
            }
            DeltaPolicy::Authoritative => {
                self.state.send_modify(|current| {
                    let mut next = Collection::with_capacity(records.len());
                    for record in records {
                        if let Some(key) = self.keyed(&record) {
                            let record = match (next.remove(&key), current.get(&key)) {
                                (Some(earlier), _) => combine(earlier, record, merge),
                                (None, Some(previous)) => {
                                    combine(previous.clone(), record, merge)
                                }
                                (None, None) => record,
                            };
                            next.insert(key, record);
                        }
                    }
                    *current = Arc::new(next);
                });
            }
        }
    }

    /// The current collection frame.
    pub fn collection(&self) -> Arc<Collection> {
        self.state.borrow().clone()
    }

    /// Applies a local mutation, typically an optimistic edit awaiting
    /// confirmation. The next snapshot or delta for the same key wins.
    ///
    /// `update` runs while the collection is locked and must not call back
    /// into this synchronizer.
    pub fn set_collection(&self, update: impl FnOnce(&mut Collection)) {
        self.state.send_modify(|current| update(Arc::make_mut(current)));
    }

    /// A receiver notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Collection>> {
        self.state.subscribe()
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.state.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    fn keyed(&self, record: &Record) -> Option<String> {
        let key = self.key.key_of(record);
        if key.is_none() {
            trace!(record = %record, "dropping record without key");
        }
        key
    }
}

fn upsert(collection: &mut Collection, key: String, record: Record, merge: MergePolicy) {
    let record = match collection.remove(&key) {
        Some(previous) => combine(previous, record, merge),
        None => record,
    };
    collection.insert(key, record);
}

fn combine(previous: Record, record: Record, merge: MergePolicy) -> Record {
    match (merge, previous, record) {
        (MergePolicy::ShallowMerge, Value::Object(mut fields), Value::Object(update)) => {
            fields.extend(update);
            Value::Object(fields)
        }
        (_, _, record) => record,
    }
}
