//! Snapshot cache for reproducible lookups.
//!
//! Every successful provider response is stored with the time it was
//! observed. Replaying a lookup with a snapshot ceiling returns the same
//! responses even if the provider's live data has changed since.

pub mod path;
pub mod store;

pub use path::{PathOptions, snapshot_path};
pub use store::{DiskSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore};
