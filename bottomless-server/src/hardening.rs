use std::time::Duration;

/// Minimum time between two accepted actions from the same owner (max 20 per second)
pub const MIN_ACTION_INTERVAL: Duration = Duration::from_millis(50);
/// Maximum size of a single frame on the wire in bytes
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;      // 4 MB per frame
/// Maximum number of entries accepted in one sync message
pub const MAX_SYNC_ENTRIES: usize = 65_536;
/// Maximum size of one encoded item descriptor in bytes
pub const MAX_DESCRIPTOR_BYTES: usize = 64 * 1024;       // 64 KB per descriptor
