//! Cinegraph
//!
//! An in-memory movie/social graph analytics engine with:
//! - A typed property graph of people, movies and genres with derived collaborations
//! - BFS and Dijkstra shortest paths over a generic traversal kernel
//! - PageRank, betweenness and Louvain communities on collaboration projections
//! - Movie recommendations and descriptive insights

pub mod analytics;
pub mod error;
pub mod store;
pub mod traversal;

pub use analytics::{AnalyticsConfig, GraphAnalyticsEngine, RecommendationConfig};
pub use error::{GraphError, Result};
pub use store::{GraphStore, NodeId, NodeKind, RelKind, SharedGraph};

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub analytics: AnalyticsConfig,
    pub recommendation: RecommendationConfig,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Configuration after applying env var overrides to the YAML file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub recommendation: RecommendationConfig,
}

/// Parse an optional env var, failing on values that do not parse.
fn env_override<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "cinegraph.yaml" in CWD. A missing or
    /// unparsable file falls back to defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let yaml = Self::load_yaml(yaml_path);
        let mut analytics = yaml.analytics;

        // 2. Env var overrides
        if let Some(v) = env_override("CINEGRAPH_DAMPING")? {
            analytics.pagerank_damping = v;
        }
        if let Some(v) = env_override("CINEGRAPH_TOLERANCE")? {
            analytics.pagerank_tolerance = v;
        }
        if let Some(v) = env_override("CINEGRAPH_MAX_ITERATIONS")? {
            analytics.pagerank_max_iterations = v;
        }
        if let Some(v) = env_override("CINEGRAPH_MAX_PASSES")? {
            analytics.louvain_max_passes = v;
        }
        if let Some(v) = env_override("CINEGRAPH_PARALLEL_THRESHOLD")? {
            analytics.parallel_threshold = v;
        }

        let config = Self {
            analytics,
            recommendation: yaml.recommendation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters the algorithms cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let a = &self.analytics;
        anyhow::ensure!(
            a.pagerank_damping > 0.0 && a.pagerank_damping < 1.0,
            "pagerank_damping must be in (0, 1), got {}",
            a.pagerank_damping
        );
        anyhow::ensure!(
            a.pagerank_tolerance > 0.0,
            "pagerank_tolerance must be positive, got {}",
            a.pagerank_tolerance
        );
        anyhow::ensure!(
            a.louvain_resolution > 0.0,
            "louvain_resolution must be positive, got {}",
            a.louvain_resolution
        );
        Ok(())
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("cinegraph.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    const ENV_VARS: [&str; 5] = [
        "CINEGRAPH_DAMPING",
        "CINEGRAPH_TOLERANCE",
        "CINEGRAPH_MAX_ITERATIONS",
        "CINEGRAPH_MAX_PASSES",
        "CINEGRAPH_PARALLEL_THRESHOLD",
    ];

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
analytics:
  pagerank_damping: 0.9
  louvain_multilevel: true
  parallel_threshold: 1000

recommendation:
  genre_overlap: 0.5
  collaborator_signal: 0.5
  limit: 10
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.analytics.pagerank_damping - 0.9).abs() < f64::EPSILON);
        assert!(config.analytics.louvain_multilevel);
        assert_eq!(config.analytics.parallel_threshold, 1000);
        assert_eq!(config.analytics.pagerank_max_iterations, 100);
        assert_eq!(config.recommendation.limit, Some(10));
        assert_eq!(config.recommendation.influence, 0.0);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.analytics, AnalyticsConfig::default());
        assert_eq!(config.recommendation, RecommendationConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_damping() {
        let config = Config {
            analytics: AnalyticsConfig {
                pagerank_damping: 1.0,
                ..Default::default()
            },
            recommendation: RecommendationConfig::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pagerank_damping"), "got: {}", err);
    }

    /// Combined test for YAML file loading and env var overrides.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
analytics:
  pagerank_damping: 0.8
  louvain_max_passes: 5
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("cinegraph.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!((config.analytics.pagerank_damping - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.analytics.louvain_max_passes, 5);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("CINEGRAPH_DAMPING", "0.7");
        std::env::set_var("CINEGRAPH_MAX_PASSES", "3");
        std::env::set_var("CINEGRAPH_PARALLEL_THRESHOLD", "64");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!((config.analytics.pagerank_damping - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.analytics.louvain_max_passes, 3);
        assert_eq!(config.analytics.parallel_threshold, 64);

        // --- Phase 3: Unparsable env value is an error ---
        std::env::set_var("CINEGRAPH_MAX_ITERATIONS", "many");
        let err = Config::from_yaml_and_env(Some(&file_path)).unwrap_err();
        assert!(
            format!("{:#}", err).contains("CINEGRAPH_MAX_ITERATIONS"),
            "got: {:#}",
            err
        );
        clear_env();

        // --- Phase 4: Missing and malformed files fall back to defaults ---
        let missing = dir.path().join("missing.yaml");
        let config = Config::from_yaml_and_env(Some(&missing)).unwrap();
        assert_eq!(config.analytics, AnalyticsConfig::default());

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "analytics: [not, a, map").unwrap();
        let config = Config::from_yaml_and_env(Some(&broken)).unwrap();
        assert_eq!(config.analytics, AnalyticsConfig::default());
    }
}
