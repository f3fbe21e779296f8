//! Configuration for the loader.
//!
//! Provides centralized configuration for the load pipeline with defaults
//! matching 32-bit x86 exports.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Pointer size of the default target platform, in bytes.
pub const DEFAULT_POINTER_SIZE: u32 = 4;

/// Master configuration for the load pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Size of a pointer on the target platform.
    pub pointer_size: u32,
    /// Drop symbols whose name starts with `case` (switch labels).
    pub skip_case_symbols: bool,
    /// Which call targets in the disassembly trace are skipped.
    pub call_targets: CallTargetConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            pointer_size: DEFAULT_POINTER_SIZE,
            skip_case_symbols: true,
            call_targets: CallTargetConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Rules for call targets that can never name a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallTargetConfig {
    /// Prefix of local code labels.
    pub local_label_prefix: String,
    /// Marker present in targets that list several possible destinations.
    pub multi_target_marker: String,
    /// Register operands of indirect calls.
    pub indirect_registers: Vec<String>,
}

impl Default for CallTargetConfig {
    fn default() -> Self {
        Self {
            local_label_prefix: "LAB_".to_string(),
            multi_target_marker: "=>".to_string(),
            indirect_registers: ["EAX", "EBX", "ECX", "EDX", "ESI", "EDI"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
        }
    }
}

impl CallTargetConfig {
    /// Whether a call target should be skipped without attempting resolution.
    pub fn is_skipped(&self, target: &str) -> bool {
        (!self.local_label_prefix.is_empty() && target.starts_with(&self.local_label_prefix))
            || (!self.multi_target_marker.is_empty() && target.contains(&self.multi_target_marker))
            || self.indirect_registers.iter().any(|r| r == target)
    }
}
