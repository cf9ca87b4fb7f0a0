//! The `sync` module keeps the client-side view of one topic: a mapping from
//! record key to the latest record received for it.
//!
//! Snapshots replace the mapping wholesale, deltas upsert individual keys
//! under a [`MergePolicy`] and [`DeltaPolicy`], and every change is published
//! as an immutable frame that observers can hold while the next one is built.

pub mod key;
pub mod policy;
pub mod synchronizer;

pub use key::KeyFn;
pub use policy::{DeltaPolicy, MergePolicy};
pub use synchronizer::{Collection, Record, Synchronizer, normalize};
