//! Configuration for kernel extraction

use serde::{Deserialize, Serialize};

use crate::error::{DistributeError, DistributeResult};

/// Knobs controlling how distribution and interchange rewrite the program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionConfig {
    /// Whether to replace degenerate kernels by the layout operation they perform
    pub optimize_kernels: bool,
    /// Whether to give fresh names to everything bound inside an emitted kernel
    pub rename_kernels: bool,
    /// Whether interchange copies arrays bound to unique parameters before a map.
    /// Turning this off produces programs that may violate uniqueness; debugging only.
    pub copy_consumed_inputs: bool,
    /// Whether to log every successful distribution with its targets
    pub trace_distribution: bool,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            optimize_kernels: true,
            rename_kernels: true,
            copy_consumed_inputs: true,
            trace_distribution: false,
        }
    }
}

impl DistributionConfig {
    /// Parses a configuration from a TOML fragment; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> DistributeResult<Self> {
        toml::from_str(content).map_err(|e| {
            tracing::error!("Failed to parse distribution config: {}", e);
            DistributeError::Config(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DistributionConfig::default();
        assert!(config.optimize_kernels);
        assert!(config.rename_kernels);
        assert!(config.copy_consumed_inputs);
        assert!(!config.trace_distribution);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DistributionConfig::from_toml_str("optimize_kernels = false\n").unwrap();
        assert!(!config.optimize_kernels);
        assert!(config.rename_kernels);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = DistributionConfig::from_toml_str("fuse_everything = true\n").unwrap_err();
        assert!(matches!(err, DistributeError::Config(_)));
    }
}
