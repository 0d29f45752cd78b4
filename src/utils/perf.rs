//! Performance measurement utilities for memory and timing analysis.
//!
//! Peak memory is read from /proc/self/status, so it is only available on Linux.
//! It is the peak of the whole process, which is why the scalability runner
//! measures one problem size per process when memory figures matter.

use std::time::Instant;

/// Wall-clock time and peak memory observed around a measured call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub time_s: f64,
    pub peak_rss_kb: u64,
}

/// Runs `f` and records its wall-clock time and the process peak RSS afterwards.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Measurement) {
    let start = Instant::now();
    let value = f();
    let time_s = start.elapsed().as_secs_f64();
    (
        value,
        Measurement {
            time_s,
            peak_rss_kb: get_peak_rss_kb(),
        },
    )
}

/// Reads the peak resident set size (VmPeak) from /proc/self/status on Linux.
///
/// # Returns
/// The peak memory usage in kilobytes (KB), or 0 if the value cannot be read.
#[cfg(target_os = "linux")]
pub fn get_peak_rss_kb() -> u64 {
    let status_content = match std::fs::read_to_string("/proc/self/status") {
        Ok(content) => content,
        Err(_) => return 0,
    };
    parse_vm_peak(&status_content).unwrap_or(0)
}

/// Peak RSS is not measured on this platform; always returns 0.
#[cfg(not(target_os = "linux"))]
pub fn get_peak_rss_kb() -> u64 {
    use std::sync::Once;
    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        log::warn!("Peak RSS measurement is only supported on Linux; returning 0.");
    });
    0
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_peak(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmPeak:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|value| value.parse().ok())
}
