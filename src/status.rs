//! Bot status report: process uptime and memory usage

use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Uptime formatted as `*D* day(s) *H* hour(s)`.
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let days = secs / (60 * 60 * 24);
    let hours = (secs % (60 * 60 * 24)) / (60 * 60);
    format!("*{days}* day(s) *{hours}* hour(s)")
}

/// Memory usage of this process, formatted as
/// `Sys: *X.X MB*, Heap: *X.X MB*` (virtual size and resident set).
pub fn memory_usage() -> String {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    let (sys_bytes, heap_bytes) = system
        .process(pid)
        .map_or((0, 0), |p| (p.virtual_memory(), p.memory()));

    format!(
        "Sys: *{:.1} MB*, Heap: *{:.1} MB*",
        bytes_to_mb(sys_bytes),
        bytes_to_mb(heap_bytes)
    )
}

/// Full status report for the `/status` command.
pub fn bot_status(started_at: Instant) -> String {
    format!(
        "Uptime: {}\nMemory Usage: {}",
        format_uptime(started_at.elapsed()),
        memory_usage()
    )
}

fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
