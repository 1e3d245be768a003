// SPDX-License-Identifier: GPL-3.0-only

//! Planner tuning knobs
//!
//! The overhead factors and the EFI size tolerance are deployment-specific
//! values, so they live in configuration instead of being buried in the
//! decision logic.

use serde::Deserialize;

/// Safety factor applied to measured sizes to account for filesystem overhead
pub const DEFAULT_OVERHEAD_FACTOR: f64 = 1.1;

/// Slack tolerated between the needed and the actual EFI partition size.
///
/// Partitioning tools with "optimal" alignment may create the EFI partition
/// slightly smaller than the size they were asked for, so a shortfall of up
/// to 2 MiB does not force an enlargement.
pub const DEFAULT_EFI_SIZE_TOLERANCE_BYTES: u64 = 2_097_152;

/// Tunable planner settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Factor applied to the measured size of the preserved user data
    pub data_overhead_factor: f64,

    /// Factor applied to the raw size of the new system image
    pub system_overhead_factor: f64,

    /// Accepted EFI partition size shortfall in bytes
    pub efi_size_tolerance_bytes: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data_overhead_factor: DEFAULT_OVERHEAD_FACTOR,
            system_overhead_factor: DEFAULT_OVERHEAD_FACTOR,
            efi_size_tolerance_bytes: DEFAULT_EFI_SIZE_TOLERANCE_BYTES,
        }
    }
}

impl PlannerConfig {
    /// Parse a configuration from TOML, falling back to defaults for
    /// missing fields
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply the data overhead factor to a measured size
    pub fn enlarge_data_size(&self, measured_bytes: u64) -> u64 {
        (measured_bytes as f64 * self.data_overhead_factor) as u64
    }

    /// Apply the system overhead factor to a raw image size
    pub fn enlarge_system_size(&self, raw_bytes: u64) -> u64 {
        (raw_bytes as f64 * self.system_overhead_factor) as u64
    }
}
