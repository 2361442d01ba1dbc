//! Memory usage snapshots.

use sysinfo::{MemoryRefreshKind, System};

#[derive(Debug, Clone, Copy)]
pub struct MemoryUsage {
    /// Bytes in use.
    pub used: u64,
    /// Total installed bytes.
    pub total: u64,
}

impl MemoryUsage {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }
}

pub struct MemoryReader {
    sys: System,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    pub fn read(&mut self) -> MemoryUsage {
        self.sys
            .refresh_memory_specifics(MemoryRefreshKind::new().with_ram());
        MemoryUsage {
            used: self.sys.used_memory(),
            total: self.sys.total_memory(),
        }
    }
}

impl Default for MemoryReader {
    fn default() -> Self {
        Self::new()
    }
}
