pub mod snapshot;

pub use snapshot::{snapshot_digest, SnapshotSink};
