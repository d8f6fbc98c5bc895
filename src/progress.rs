/// Advisory progress event, emitted once per transferred chunk and once on
/// completion of the small-file path. Dropped when no sink is configured;
/// there is no hidden global fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub bytes_transferred: u64,
    pub total_size: u64,
    /// `bytes_transferred / total_size * 100`, rounded to two decimals. A
    /// zero-byte upload reports 100.
    pub percent: f64,
}

impl Progress {
    pub fn new(bytes_transferred: u64, total_size: u64) -> Self {
        let percent = if total_size == 0 {
            100.0
        } else {
            let raw = bytes_transferred as f64 / total_size as f64 * 100.0;
            (raw * 100.0).round() / 100.0
        };
        Progress {
            bytes_transferred,
            total_size,
            percent,
        }
    }
}

/// Caller-supplied progress callback.
pub type ProgressSink = Box<dyn Fn(&Progress) + Send + Sync>;

/// Byte count as MiB with two decimals, e.g. `16777216` -> `"16.00"`.
pub fn bytes_to_mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}

/// Render a progress event the way the verbose CLI output wants it.
pub fn format_progress(progress: &Progress) -> String {
    format!(
        "{} MiB of {} MiB ({:.2}%)",
        bytes_to_mib(progress.bytes_transferred),
        bytes_to_mib(progress.total_size),
        progress.percent
    )
}
