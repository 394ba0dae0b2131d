//! Host metrics for `GET /api/system/stats`.

use std::path::Path;
use std::thread;
use std::time::Instant;

use sysinfo::{
    CpuRefreshKind, Disks, MINIMUM_CPU_UPDATE_INTERVAL, MemoryRefreshKind, RefreshKind, System,
};

use crate::api::types::{CpuStats, DiskStats, MemoryStats, SystemStats};

/// Keeps one `System` alive so CPU usage is measured between consecutive
/// samples rather than from boot.
pub struct StatsSampler {
    sys: System,
    last_cpu_refresh: Instant,
}

impl Default for StatsSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSampler {
    pub fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        // Baseline for the first usage delta.
        sys.refresh_cpu_all();
        Self {
            sys,
            last_cpu_refresh: Instant::now(),
        }
    }

    /// CPU usage is the delta between two refreshes, so a refresh that
    /// comes too soon after the previous one waits out the gap first.
    fn refresh_cpu(&mut self) {
        let since = self.last_cpu_refresh.elapsed();
        if since < MINIMUM_CPU_UPDATE_INTERVAL {
            thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL - since);
        }
        self.sys.refresh_cpu_all();
        self.last_cpu_refresh = Instant::now();
    }

    pub fn sample(&mut self) -> SystemStats {
        self.refresh_cpu();
        self.sys.refresh_memory();

        let cpus = self.sys.cpus();
        let cpu = CpuStats {
            percent: round1(self.sys.global_cpu_usage() as f64),
            cores: cpus.len() as u32,
            frequency: cpus.first().map(|c| c.frequency() as f64).unwrap_or(0.0),
            per_core: cpus.iter().map(|c| round1(c.cpu_usage() as f64)).collect(),
        };

        let total = self.sys.total_memory();
        let used = self.sys.used_memory();
        let memory = MemoryStats {
            percent: percent_of(used, total),
            total,
            available: self.sys.available_memory(),
            used,
        };

        SystemStats {
            cpu,
            memory,
            disk: root_disk(),
        }
    }
}

/// Usage of the disk mounted at `/`, or of the first disk when there is no
/// such mount (Windows).
fn root_disk() -> DiskStats {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first());

    match disk {
        Some(d) => {
            let total = d.total_space();
            let free = d.available_space();
            let used = total.saturating_sub(free);
            DiskStats {
                percent: percent_of(used, total),
                total,
                used,
                free,
            }
        }
        None => DiskStats::default(),
    }
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
