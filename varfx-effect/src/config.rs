use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

///
/// Options for effect prediction and loss-of-function classification.
///
/// The value is read-only once built and is passed explicitly to every
/// entry point. Missing keys in a TOML file take their default value.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
    /// Report variants on unknown chromosomes as errors and stop there.
    pub error_on_missing_chromosome: bool,
    /// Report variants that miss their chromosome's range.
    pub error_on_chromosome_miss: bool,
    /// Only regulatory features are of interest, use `NONE` instead of `INTERGENIC`.
    pub only_regulation: bool,
    pub treat_all_as_protein_coding: bool,

    pub lof_ignore_before: f64,
    pub lof_ignore_after: f64,
    pub lof_delete_fraction: f64,

    pub small_variant_size_threshold: u32,
    pub huge_variant_size_threshold: u32,
    pub huge_variant_ratio_threshold: f64,

    pub up_down_stream_length: u32,
    pub splice_site_size: u32,
    pub splice_region_exon_size: u32,
    pub splice_region_intron_min: u32,
    pub splice_region_intron_max: u32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            error_on_missing_chromosome: true,
            error_on_chromosome_miss: true,
            only_regulation: false,
            treat_all_as_protein_coding: false,
            lof_ignore_before: 0.05,
            lof_ignore_after: 0.95,
            lof_delete_fraction: 0.50,
            small_variant_size_threshold: 10,
            huge_variant_size_threshold: 1_000_000,
            huge_variant_ratio_threshold: 0.01,
            up_down_stream_length: 5000,
            splice_site_size: 2,
            splice_region_exon_size: 3,
            splice_region_intron_min: 3,
            splice_region_intron_max: 8,
        }
    }
}

impl PredictorConfig {
    ///
    /// Check value ranges that serde cannot express.
    ///
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("lof_ignore_before", self.lof_ignore_before),
            ("lof_ignore_after", self.lof_ignore_after),
            ("lof_delete_fraction", self.lof_delete_fraction),
            ("huge_variant_ratio_threshold", self.huge_variant_ratio_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: format!("{} is not a fraction in [0, 1]", value),
                });
            }
        }

        if self.lof_ignore_before > self.lof_ignore_after {
            return Err(ConfigError::InvalidValue {
                name: "lof_ignore_before",
                reason: "must not be larger than lof_ignore_after".to_string(),
            });
        }

        if self.splice_site_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "splice_site_size",
                reason: "must be at least one base".to_string(),
            });
        }

        if self.splice_region_intron_min > self.splice_region_intron_max {
            return Err(ConfigError::InvalidValue {
                name: "splice_region_intron_min",
                reason: "must not be larger than splice_region_intron_max".to_string(),
            });
        }

        Ok(())
    }
}

impl FromStr for PredictorConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: PredictorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&Path> for PredictorConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        toml_str.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use std::io::Write;
    use std::path::PathBuf;

    #[rstest]
    fn test_defaults() {
        let config = PredictorConfig::default();
        assert_eq!(config.lof_ignore_before, 0.05);
        assert_eq!(config.lof_ignore_after, 0.95);
        assert_eq!(config.lof_delete_fraction, 0.50);
        assert_eq!(config.up_down_stream_length, 5000);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn test_partial_toml_keeps_defaults() {
        let config: PredictorConfig = "only_regulation = true\nlof_delete_fraction = 0.3"
            .parse()
            .unwrap();
        assert_eq!(config.only_regulation, true);
        assert_eq!(config.lof_delete_fraction, 0.3);
        assert_eq!(config.splice_site_size, 2);
    }

    #[rstest]
    fn test_try_from_toml() {
        let path = PathBuf::from("tests/data/predictor.toml");
        let result = PredictorConfig::try_from(path.as_path());
        assert_eq!(result.is_ok(), true);
        assert_eq!(result.unwrap().error_on_chromosome_miss, false);
    }

    #[rstest]
    fn test_try_from_tempfile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "up_down_stream_length = 2000").unwrap();

        let config = PredictorConfig::try_from(file.path()).unwrap();
        assert_eq!(config.up_down_stream_length, 2000);
    }

    #[rstest]
    #[case("lof_delete_fraction = 1.5")]
    #[case("lof_ignore_before = 0.9\nlof_ignore_after = 0.1")]
    #[case("splice_region_intron_min = 9")]
    #[case("splice_site_size = 0")]
    fn test_invalid_values(#[case] toml_str: &str) {
        assert!(toml_str.parse::<PredictorConfig>().is_err());
    }

    #[rstest]
    fn test_missing_file() {
        let path = PathBuf::from("tests/data/does_not_exist.toml");
        let result = PredictorConfig::try_from(path.as_path());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
