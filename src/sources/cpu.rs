//! CPU usage snapshots.
//!
//! Usage is the delta since the previous refresh, so a reader keeps one
//! `System` alive across polls. Construction takes the first checkpoint;
//! values before the second refresh are meaningless.

use sysinfo::System;

pub struct CpuReader {
    sys: System,
}

impl CpuReader {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        Self { sys }
    }

    /// Take a new checkpoint. Call once per poll, then read the accessors.
    pub fn refresh(&mut self) {
        self.sys.refresh_cpu_usage();
    }

    /// Usage percent over all cores since the previous refresh.
    pub fn global_usage(&self) -> f32 {
        self.sys.global_cpu_usage()
    }

    /// Per-core usage percents since the previous refresh.
    pub fn per_core_usage(&self) -> Vec<f32> {
        self.sys.cpus().iter().map(|cpu| cpu.cpu_usage()).collect()
    }
}

impl Default for CpuReader {
    fn default() -> Self {
        Self::new()
    }
}
