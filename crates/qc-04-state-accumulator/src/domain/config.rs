//! Accumulator configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use qc_04_state_accumulator::domain::AccumulatorConfigBuilder;
//!
//! let config = AccumulatorConfigBuilder::new()
//!     .domain_tag(b"QC-04-TESTNET".to_vec())
//!     .parallel_threshold(128)
//!     .build()
//!     .expect("Valid config");
//! ```

use super::errors::AccumulatorError;
use super::parallel::PARALLEL_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Domain separation tag for state records. Changing it changes every
/// checksum, so it is effectively part of the ledger format.
pub const DEFAULT_DOMAIN_TAG: &[u8] = b"QC-04-STATE-ACCUMULATOR-V1_XOF:SHAKE256_R255MAP_RO_";

/// Current checksum envelope format.
pub const CHECKSUM_FORMAT_VERSION: u8 = 1;

/// Command queue depth for the accumulator task.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Accumulator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorConfig {
    /// Domain separation tag fed to hash-to-group
    pub domain_tag: Vec<u8>,
    /// Batches at or above this size are mapped with rayon
    pub parallel_threshold: usize,
    /// Bounded queue size for `AccumulatorTask`
    pub queue_capacity: usize,
    /// Envelope format version written on export
    pub format_version: u8,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            domain_tag: DEFAULT_DOMAIN_TAG.to_vec(),
            parallel_threshold: PARALLEL_THRESHOLD,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            format_version: CHECKSUM_FORMAT_VERSION,
        }
    }
}

impl AccumulatorConfig {
    pub fn validate(&self) -> Result<(), AccumulatorError> {
        if self.domain_tag.is_empty() {
            return Err(AccumulatorError::InvalidConfig(
                "domain_tag cannot be empty".to_string(),
            ));
        }

        if self.parallel_threshold == 0 {
            return Err(AccumulatorError::InvalidConfig(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(AccumulatorError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        if self.format_version != CHECKSUM_FORMAT_VERSION {
            return Err(AccumulatorError::UnsupportedFormatVersion(
                self.format_version,
            ));
        }

        Ok(())
    }

    /// Parse from JSON (node config files) and validate.
    pub fn from_json(json: &str) -> Result<Self, AccumulatorError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AccumulatorError::SerializationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_domain_tag(mut self, tag: impl Into<Vec<u8>>) -> Self {
        self.domain_tag = tag.into();
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Builder for AccumulatorConfig with validation
#[derive(Default)]
pub struct AccumulatorConfigBuilder {
    domain_tag: Option<Vec<u8>>,
    parallel_threshold: Option<usize>,
    queue_capacity: Option<usize>,
}

impl AccumulatorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_tag(mut self, tag: impl Into<Vec<u8>>) -> Self {
        self.domain_tag = Some(tag.into());
        self
    }

    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = Some(threshold);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Build the config, validating all parameters
    pub fn build(self) -> Result<AccumulatorConfig, AccumulatorError> {
        let defaults = AccumulatorConfig::default();

        let config = AccumulatorConfig {
            domain_tag: self.domain_tag.unwrap_or(defaults.domain_tag),
            parallel_threshold: self
                .parallel_threshold
                .unwrap_or(defaults.parallel_threshold),
            queue_capacity: self.queue_capacity.unwrap_or(defaults.queue_capacity),
            format_version: defaults.format_version,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AccumulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = AccumulatorConfigBuilder::new()
            .domain_tag(b"TAG".to_vec())
            .parallel_threshold(8)
            .queue_capacity(16)
            .build()
            .unwrap();

        assert_eq!(config.domain_tag, b"TAG".to_vec());
        assert_eq!(config.parallel_threshold, 8);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.format_version, CHECKSUM_FORMAT_VERSION);
    }

    #[test]
    fn test_rejects_empty_tag() {
        let result = AccumulatorConfigBuilder::new().domain_tag(Vec::new()).build();
        assert!(matches!(result, Err(AccumulatorError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_threshold_and_capacity() {
        assert!(AccumulatorConfigBuilder::new()
            .parallel_threshold(0)
            .build()
            .is_err());
        assert!(AccumulatorConfigBuilder::new()
            .queue_capacity(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "domain_tag": [81, 67],
            "parallel_threshold": 32,
            "queue_capacity": 8,
            "format_version": 1
        }"#;
        let config = AccumulatorConfig::from_json(json).unwrap();
        assert_eq!(config.domain_tag, b"QC".to_vec());
        assert_eq!(config.parallel_threshold, 32);
    }

    #[test]
    fn test_from_json_rejects_unknown_version() {
        let json = r#"{
            "domain_tag": [81, 67],
            "parallel_threshold": 32,
            "queue_capacity": 8,
            "format_version": 9
        }"#;
        assert!(matches!(
            AccumulatorConfig::from_json(json),
            Err(AccumulatorError::UnsupportedFormatVersion(9))
        ));
    }
}
