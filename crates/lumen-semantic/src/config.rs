//! Options for controlling the analysis.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Whether the files of a change set are built on the thread pool
    pub parallel_build: bool,

    /// Whether name, index and type reference occurrences are recorded
    pub index_name_exprs: bool,

    /// Whether return types of closures and files are inferred from their body
    pub infer_returns: bool,

    /// How many supertypes deep member lookup searches
    pub max_super_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel_build: true,
            index_name_exprs: true,
            infer_returns: true,
            max_super_depth: 16,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = AnalysisConfig::from_json(r#"{ "inferReturns": false, "maxSuperDepth": 4 }"#)
            .expect("valid config");

        assert!(!config.infer_returns);
        assert_eq!(config.max_super_depth, 4);
        assert!(config.parallel_build);
        assert!(config.index_name_exprs);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(AnalysisConfig::from_json(r#"{ "parallelBuild": "yes" }"#).is_err());
        assert_eq!(AnalysisConfig::from_json("{}").ok(), Some(AnalysisConfig::default()));
    }
}
