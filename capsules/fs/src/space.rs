//! Free-space monitoring, grounded on `original_source/FileSys.c`'s
//! `MonitorSDCardFreeSpace`: below a low-water mark, compute how many
//! bytes a cleanup task needs to reclaim to reach the desired headroom.

/// Below this percentage of total capacity, cleanup is triggered.
pub const LOW_FREE_SPACE_PERCENT: u8 = 10;

/// Cleanup reclaims enough to bring free space back up to this percentage.
pub const DESIRED_FREE_SPACE_PERCENT: u8 = 25;

/// Checks a volume's free space against the low-water mark. Returns the
/// number of bytes a cleanup task should reclaim to reach
/// `DESIRED_FREE_SPACE_PERCENT`, or `None` if free space is already
/// healthy. `total_bytes == 0` is treated as healthy — there's nothing to
/// monitor.
pub fn bytes_to_reclaim(total_bytes: u64, free_bytes: u64) -> Option<u64> {
    if total_bytes == 0 {
        return None;
    }
    let free_percent = free_bytes.saturating_mul(100) / total_bytes;
    if free_percent >= LOW_FREE_SPACE_PERCENT as u64 {
        return None;
    }
    let desired_free_bytes = total_bytes * DESIRED_FREE_SPACE_PERCENT as u64 / 100;
    Some(desired_free_bytes.saturating_sub(free_bytes))
}
