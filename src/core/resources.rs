/// Host resource snapshot
///
/// Values are informational only and never judged against thresholds. A metric
/// the host could not provide is reported as one WARN Finding. The sampler
/// converts units, the collector reads the numbers from the host with sysinfo.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::finding::{Finding, Section};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Raw host metrics as supplied to the run. Any of them may be unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostMetrics {
    pub disk_free_bytes: Option<u64>,
    pub cpu_percent: Option<f32>,
    pub mem_percent: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub disk_free_gb: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub mem_percent: Option<f64>,
}

impl ResourceSnapshot {
    /// One WARN per metric the host did not provide, in report order
    pub fn findings(&self) -> Vec<Finding> {
        [
            ("disk_free", self.disk_free_gb.is_none()),
            ("cpu_percent", self.cpu_percent.is_none()),
            ("mem_percent", self.mem_percent.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(metric, _)| Finding::warn(Section::System, format!("{} unavailable", metric)))
        .collect()
    }
}

pub struct ResourceSampler {
    metrics: HostMetrics,
}

impl ResourceSampler {
    pub fn new(metrics: HostMetrics) -> Self {
        Self { metrics }
    }

    pub fn sample(&self) -> ResourceSnapshot {

        ResourceSnapshot {
            disk_free_gb: self.metrics.disk_free_bytes.map(|b| b as f64 / BYTES_PER_GB),
            cpu_percent: self.metrics.cpu_percent.map(f64::from),
            mem_percent: self.metrics.mem_percent.map(f64::from),
        }
    }
}

/// Read CPU, memory and free disk space for the filesystem holding `path`
pub async fn collect_host_metrics(path: PathBuf) -> HostMetrics {
    match tokio::task::spawn_blocking(move || read_host_metrics(&path)).await {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::warn!(error = %e, "Host metrics collection task failed");
            HostMetrics::default()
        }
    }
}

fn read_host_metrics(path: &Path) -> HostMetrics {
    use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

    let mut sys = System::new();

    // CPU usage needs two refreshes separated by the minimum interval
    sys.refresh_cpu();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();
    let cpu = sys.global_cpu_info().cpu_usage();

    sys.refresh_memory();
    let mem_percent = match sys.total_memory() {
        0 => None,
        total => Some((sys.used_memory() as f64 / total as f64 * 100.0) as f32),
    };

    let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let disks = Disks::new_with_refreshed_list();
    let disk_free_bytes = disks
        .list()
        .iter()
        .filter(|d| target.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| d.available_space());

    tracing::debug!(cpu, ?mem_percent, ?disk_free_bytes, "Collected host metrics");

    HostMetrics {
        disk_free_bytes,
        cpu_percent: cpu.is_finite().then_some(cpu),
        mem_percent,
    }
}
