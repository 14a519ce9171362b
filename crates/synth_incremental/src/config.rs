//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Which session to drop when the manager is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Drop the session opened first, regardless of use.
    #[default]
    Insertion,
    /// Drop the session touched least recently.
    Lru,
}

/// Thresholds for choosing between incremental and full updates, and the
/// session cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncrementalConfig {
    /// Take the incremental path above this token reuse rate.
    pub reuse_rate_threshold: f64,
    /// Take the incremental path below this affected-token ratio.
    pub affected_ratio_threshold: f64,
    /// Documents larger than this many bytes use `large_document_affected_ratio`.
    pub large_document_bytes: usize,
    pub large_document_affected_ratio: f64,
    /// Maximum number of open sessions.
    pub max_sessions: usize,
    pub eviction: EvictionPolicy,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            reuse_rate_threshold: 0.7,
            affected_ratio_threshold: 0.3,
            large_document_bytes: 100_000,
            large_document_affected_ratio: 0.5,
            max_sessions: 100,
            eviction: EvictionPolicy::Insertion,
        }
    }
}

impl IncrementalConfig {
    /// Checks that ratios lie in `[0, 1]` and the session cap is positive.
    pub fn validate(&self) -> Result<(), String> {
        let ratios = [
            ("reuseRateThreshold", self.reuse_rate_threshold),
            ("affectedRatioThreshold", self.affected_ratio_threshold),
            (
                "largeDocumentAffectedRatio",
                self.large_document_affected_ratio,
            ),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be between 0 and 1, got {value}"));
            }
        }
        if self.max_sessions == 0 {
            return Err("maxSessions must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = IncrementalConfig::default();
        assert_eq!(config.reuse_rate_threshold, 0.7);
        assert_eq!(config.affected_ratio_threshold, 0.3);
        assert_eq!(config.large_document_bytes, 100_000);
        assert_eq!(config.max_sessions, 100);
        assert_eq!(config.eviction, EvictionPolicy::Insertion);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: IncrementalConfig =
            serde_json::from_str(r#"{ "maxSessions": 2, "eviction": "lru" }"#).unwrap();
        assert_eq!(config.max_sessions, 2);
        assert_eq!(config.eviction, EvictionPolicy::Lru);
        assert_eq!(config.reuse_rate_threshold, 0.7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = IncrementalConfig {
            affected_ratio_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("affectedRatioThreshold"));

        let config = IncrementalConfig {
            max_sessions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
