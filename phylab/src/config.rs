//! # Experiment Configuration
//!
//! One YAML file describes one experiment. It is loaded once, validated, and
//! then passed by reference to every component that needs it; there is no
//! process-wide configuration object.
//!
//! ## Example Configuration
//!
//! ```yaml
//! experiment_id: baseline
//! num_experiments: 50
//! num_ut: 4
//! num_sym: 14
//! num_sc: 48
//! sinr_range: [0.0, 20.0]
//! bler_target: 0.1
//! mcs_table_index: 1
//! mcs_category: pdsch
//!
//! # optional
//! seed: 42
//! sinr_spread_db: 2.0
//! output_dir: results
//! link_adaptation: illa
//! olla_step_db: 0.5
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mcs::{McsCategory, McsTable};

/// Link adaptation algorithm driving MCS selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkAdaptationKind {
    /// Inner loop only: pick from the instantaneous SINR
    #[default]
    Illa,
    /// Inner loop plus a HARQ-driven SINR offset per UT
    Olla,
}

/// Parameters of one experiment run
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Name used for log lines and output file stems
    pub experiment_id: String,

    /// Number of independent trials
    pub num_experiments: usize,

    /// Number of user terminals
    pub num_ut: usize,

    /// OFDM symbols per slot
    pub num_sym: usize,

    /// Subcarriers allocated per UT
    pub num_sc: usize,

    /// Range of the per-UT base SINR in dB, `[low, high]`
    pub sinr_range: [f32; 2],

    /// Transport block error rate the link adaptation aims for
    pub bler_target: f32,

    /// MCS table (1, 2 or 3)
    pub mcs_table_index: u8,

    /// PUSCH or PDSCH
    pub mcs_category: McsCategory,

    /// Seed for all random draws of the run
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Standard deviation in dB of the per-resource-element perturbation
    #[serde(default = "default_sinr_spread_db")]
    pub sinr_spread_db: f32,

    /// Directory receiving `<experiment_id>.npz` and `<experiment_id>.png`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// MCS selection algorithm, `illa` or `olla`
    #[serde(default)]
    pub link_adaptation: LinkAdaptationKind,

    /// OLLA offset decrement applied on every NACK (dB)
    #[serde(default = "default_olla_step_db")]
    pub olla_step_db: f32,
}

fn default_seed() -> u64 {
    42
}

fn default_sinr_spread_db() -> f32 {
    2.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_olla_step_db() -> f32 {
    0.5
}

impl ExperimentConfig {
    /// Read, parse and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value against its valid range
    pub fn validate(&self) -> Result<()> {
        if self.experiment_id.trim().is_empty() {
            return Err(invalid("experiment_id must not be empty"));
        }
        if self.experiment_id.contains(['/', '\\']) || self.experiment_id == ".." {
            return Err(invalid(format!(
                "experiment_id '{}' must be a plain file stem",
                self.experiment_id
            )));
        }
        // Aggregating over zero trials has no defined mean or deviation
        if self.num_experiments == 0 {
            return Err(invalid("num_experiments must be at least 1"));
        }
        for (name, value) in [("num_ut", self.num_ut), ("num_sym", self.num_sym), ("num_sc", self.num_sc)] {
            if value == 0 {
                return Err(invalid(format!("{name} must be at least 1")));
            }
        }

        let [low, high] = self.sinr_range;
        if !low.is_finite() || !high.is_finite() {
            return Err(invalid("sinr_range bounds must be finite"));
        }
        if low > high {
            return Err(invalid(format!("sinr_range must be ordered, got [{low}, {high}]")));
        }

        if !(self.bler_target > 0.0 && self.bler_target < 1.0) {
            return Err(invalid(format!(
                "bler_target must lie in (0, 1), got {}",
                self.bler_target
            )));
        }
        if !(self.sinr_spread_db.is_finite() && self.sinr_spread_db >= 0.0) {
            return Err(invalid(format!(
                "sinr_spread_db must be non-negative, got {}",
                self.sinr_spread_db
            )));
        }
        if !(self.olla_step_db.is_finite() && self.olla_step_db > 0.0) {
            return Err(invalid(format!(
                "olla_step_db must be positive, got {}",
                self.olla_step_db
            )));
        }

        McsTable::new(self.mcs_table_index, self.mcs_category)?;
        Ok(())
    }

    /// The MCS table selected by `mcs_table_index` and `mcs_category`
    pub fn mcs_table(&self) -> Result<McsTable> {
        McsTable::new(self.mcs_table_index, self.mcs_category)
    }

    /// Resource elements per UT and slot
    pub fn num_re(&self) -> usize {
        self.num_sym * self.num_sc
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.npz", self.experiment_id))
    }

    pub fn chart_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.png", self.experiment_id))
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: &str = r#"
experiment_id: baseline
num_experiments: 20
num_ut: 4
num_sym: 14
num_sc: 48
sinr_range: [0.0, 20.0]
bler_target: 0.1
mcs_table_index: 1
mcs_category: 1
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = ExperimentConfig::from_yaml_str(BASELINE).unwrap();

        assert_eq!(config.experiment_id, "baseline");
        assert_eq!(config.num_experiments, 20);
        assert_eq!(config.sinr_range, [0.0, 20.0]);
        assert_eq!(config.mcs_category, McsCategory::Pdsch);
        assert_eq!(config.seed, 42);
        assert_eq!(config.sinr_spread_db, 2.0);
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert_eq!(config.link_adaptation, LinkAdaptationKind::Illa);
        assert_eq!(config.num_re(), 14 * 48);
        assert_eq!(config.summary_path(), PathBuf::from("results/baseline.npz"));
        assert_eq!(config.chart_path(), PathBuf::from("results/baseline.png"));
    }

    #[test]
    fn test_zero_experiments_rejected() {
        let yaml = BASELINE.replace("num_experiments: 20", "num_experiments: 0");
        let err = ExperimentConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "got {:?}", err);
    }

    #[test]
    fn test_range_checks() {
        let cases = [
            ("sinr_range: [0.0, 20.0]", "sinr_range: [20.0, 0.0]"),
            ("bler_target: 0.1", "bler_target: 1.0"),
            ("bler_target: 0.1", "bler_target: 0.0"),
            ("num_ut: 4", "num_ut: 0"),
            ("mcs_table_index: 1", "mcs_table_index: 7"),
            ("experiment_id: baseline", "experiment_id: ../escape"),
        ];
        for (from, to) in cases {
            let yaml = BASELINE.replace(from, to);
            assert!(
                ExperimentConfig::from_yaml_str(&yaml).is_err(),
                "'{}' should be rejected",
                to
            );
        }
    }

    #[test]
    fn test_degenerate_range_accepted() {
        let yaml = BASELINE.replace("sinr_range: [0.0, 20.0]", "sinr_range: [5.0, 5.0]");
        assert!(ExperimentConfig::from_yaml_str(&yaml).is_ok());
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        let yaml = BASELINE.replace("bler_target: 0.1\n", "");
        let err = ExperimentConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)), "got {:?}", err);
    }

    #[test]
    fn test_missing_file() {
        let err = ExperimentConfig::load("configs/does_not_exist.yaml").unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
        assert!(err.to_string().contains("configuration file not found"));
    }

    #[test]
    fn test_olla_selection() {
        let yaml = format!("{BASELINE}link_adaptation: olla\nolla_step_db: 1.0\n");
        let config = ExperimentConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.link_adaptation, LinkAdaptationKind::Olla);
        assert_eq!(config.olla_step_db, 1.0);
    }
}
