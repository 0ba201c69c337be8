//! One-shot host metadata for the report header.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::system::ProcRoot;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub hostname: Option<String>,
    pub os: String,
    pub os_version: Option<String>,
    pub cpu_model: Option<String>,
    pub cpu_cores: Option<usize>,
    /// Total physical memory in bytes.
    pub memory_total: Option<u64>,
    pub is_wsl: bool,
}

/// Kernel release/version strings mention Microsoft under WSL.
pub fn is_wsl(release: Option<&str>, version: Option<&str>) -> bool {
    let release = release.unwrap_or_default().to_lowercase();
    let version = version.unwrap_or_default().to_lowercase();
    release.contains("microsoft") || release.contains("wsl") || version.contains("microsoft")
}

fn degrade<T>(field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Host {} unavailable: {}", field, e);
            None
        }
    }
}

impl HostSnapshot {
    /// Read host facts. A field that cannot be read is left empty.
    pub fn read(root: &ProcRoot) -> Self {
        let release = degrade("os release", root.read_kernel_value("sys/kernel/osrelease"));
        let version = degrade("os version", root.read_kernel_value("sys/kernel/version"));

        Self {
            hostname: degrade("hostname", root.read_kernel_value("sys/kernel/hostname")),
            os: std::env::consts::OS.to_string(),
            is_wsl: is_wsl(release.as_deref(), version.as_deref()),
            os_version: version,
            cpu_model: degrade("cpu model", root.read_cpu_model()),
            cpu_cores: degrade("cpu cores", root.read_cpu_core_count()),
            memory_total: degrade("memory total", root.read_memory_info().map(|m| m.total_bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_wsl() {
        assert!(is_wsl(Some("5.15.90.1-microsoft-standard-WSL2"), None));
        assert!(is_wsl(None, Some("#1 SMP Microsoft 2023")));
        assert!(!is_wsl(Some("6.8.0-31-generic"), Some("#31-Ubuntu SMP")));
        assert!(!is_wsl(None, None));
    }

    #[test]
    fn test_read_degrades_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sys/kernel")).unwrap();
        fs::write(dir.path().join("sys/kernel/hostname"), "devbox\n").unwrap();
        fs::write(dir.path().join("sys/kernel/osrelease"), "6.1.0-microsoft\n").unwrap();
        fs::write(
            dir.path().join("cpuinfo"),
            "processor\t: 0\nmodel name\t: Example CPU\nprocessor\t: 1\n",
        )
        .unwrap();

        let host = HostSnapshot::read(&ProcRoot::new(dir.path()));
        assert_eq!(host.hostname.as_deref(), Some("devbox"));
        assert_eq!(host.cpu_model.as_deref(), Some("Example CPU"));
        assert_eq!(host.cpu_cores, Some(2));
        assert_eq!(host.memory_total, None);
        assert_eq!(host.os_version, None);
        assert!(host.is_wsl);
        assert!(!host.os.is_empty());
    }
}
