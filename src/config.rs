//! Engine and pipeline configuration.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! The snapping tolerance is quantized to an integer (nanometres, factor
//! 1e9) before hashing, so the parameter fingerprint does not depend on float
//! serialization details.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::TieBreak;
use crate::canonical::canonical_hash_hex;
use crate::error::{KernelError, Result};
use crate::geometry::{Snapper, DEFAULT_TOLERANCE};
use crate::output::OutputLayout;

/// Quantization factor for the tolerance (m → nm).
const TOLERANCE_QUANTIZATION_FACTOR: f64 = 1_000_000_000.0;

/// Parameters of one aggregation pass.
///
/// Passed explicitly into [`crate::AggregationEngine`]; there is no global
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Snapping grid size (m).
    pub tolerance: f64,
    /// Mode tie-break rule for spec and size.
    pub tie_break: TieBreak,
    /// Row order of the emitted record set.
    pub layout: OutputLayout,
}

#[derive(Debug, Clone, Serialize)]
struct QuantizedEngineParams {
    schema: &'static str,
    tolerance_nm: i64,
    tie_break: TieBreak,
    layout: OutputLayout,
}

impl EngineConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(KernelError::InvalidConfig(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Snapper for this tolerance.
    pub fn snapper(&self) -> Snapper {
        Snapper::new(self.tolerance)
    }

    /// Hash of the engine parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&QuantizedEngineParams {
            schema: crate::PIPE_RUN_SCHEMA_VERSION,
            tolerance_nm: (self.tolerance * TOLERANCE_QUANTIZATION_FACTOR).round() as i64,
            tie_break: self.tie_break,
            layout: self.layout,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            tie_break: TieBreak::default(),
            layout: OutputLayout::default(),
        }
    }
}

/// File-level settings for a batch run, read from a JSON config file.
///
/// ```json
/// {
///   "revit_export_path": "export.csv",
///   "processed_data_path": "processed.csv",
///   "engine": { "tolerance": 0.001, "tie_break": "lowest", "layout": "grouped" }
/// }
/// ```
///
/// Other keys in the file are ignored, so the same file can be shared with
/// the downstream importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Segment export to read.
    #[serde(rename = "revit_export_path", alias = "input_path")]
    pub input_path: PathBuf,
    /// Entity record set to write.
    #[serde(rename = "processed_data_path", alias = "output_path")]
    pub output_path: PathBuf,
    /// Engine parameters.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl PipelineConfig {
    /// Load from a JSON file. Relative paths inside the file are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| KernelError::io(path, e))?;
        let mut config = Self::from_json(&data).map_err(|e| KernelError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            config.input_path = resolve_relative(base, &config.input_path);
            config.output_path = resolve_relative(base, &config.output_path);
        }
        Ok(config)
    }

    /// Parse from a JSON string without touching the filesystem.
    pub fn from_json(data: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerance, 0.001);
        assert_eq!(config.tie_break, TieBreak::Lowest);
        assert_eq!(config.layout, OutputLayout::Grouped);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        for tolerance in [0.0, -0.001, f64::NAN, f64::INFINITY] {
            let config = EngineConfig { tolerance, ..EngineConfig::default() };
            assert!(matches!(config.validate(), Err(KernelError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_params_hash_determinism() {
        assert_eq!(EngineConfig::default().params_hash(), EngineConfig::default().params_hash());
    }

    #[test]
    fn test_params_hash_changes() {
        let a = EngineConfig::default();
        let b = EngineConfig { tolerance: 0.005, ..EngineConfig::default() };
        let c = EngineConfig { tie_break: TieBreak::FirstSeen, ..EngineConfig::default() };

        assert_ne!(a.params_hash(), b.params_hash());
        assert_ne!(a.params_hash(), c.params_hash());
    }

    #[test]
    fn test_pipeline_from_json() {
        let json = r#"{
            "revit_export_path": "in/export.csv",
            "processed_data_path": "out/processed.csv",
            "template_pipe_name": "ignored",
            "engine": { "tolerance": 0.002, "tie_break": "first_seen" }
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();

        assert_eq!(config.input_path, PathBuf::from("in/export.csv"));
        assert_eq!(config.output_path, PathBuf::from("out/processed.csv"));
        assert_eq!(config.engine.tolerance, 0.002);
        assert_eq!(config.engine.tie_break, TieBreak::FirstSeen);
        assert_eq!(config.engine.layout, OutputLayout::Grouped);
    }

    #[test]
    fn test_pipeline_aliases_and_defaults() {
        let json = r#"{ "input_path": "a.csv", "output_path": "b.csv" }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load(Path::new("/nonexistent/pipe_run/config.json")).unwrap_err();
        assert!(matches!(err, KernelError::Io { .. }));
    }
}
