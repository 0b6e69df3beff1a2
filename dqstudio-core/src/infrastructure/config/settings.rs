// dqstudio-core/src/infrastructure/config/settings.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::dataset::BlankPolicy;
use crate::domain::dataset::coerce::DEFAULT_BLANK_SENTINELS;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["dqstudio.yaml", "dq_config.yaml"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AssessmentConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[validate(length(min = 1, message = "output_dir cannot be empty"))]
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[validate(custom(function = "validate_sentinels"))]
    #[serde(default = "default_blank_sentinels")]
    pub blank_sentinels: Vec<String>,

    /// Minimum acceptable overall score; a run below it is reported as failed.
    #[validate(range(min = 0.0, max = 100.0, message = "fail_under must be within 0..=100"))]
    #[serde(default)]
    pub fail_under: Option<f64>,

    #[serde(default)]
    pub export_rulebook: bool,

    #[serde(default)]
    pub export_outcomes: bool,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            output_dir: default_output_dir(),
            blank_sentinels: default_blank_sentinels(),
            fail_under: None,
            export_rulebook: false,
            export_outcomes: false,
        }
    }
}

impl AssessmentConfig {
    pub fn blank_policy(&self) -> BlankPolicy {
        BlankPolicy::new(&self.blank_sentinels)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

fn default_name() -> String {
    "dqstudio".to_string()
}

fn default_output_dir() -> String {
    "dq_output".to_string()
}

fn default_blank_sentinels() -> Vec<String> {
    DEFAULT_BLANK_SENTINELS.iter().map(|s| s.to_string()).collect()
}

fn validate_sentinels(sentinels: &[String]) -> Result<(), validator::ValidationError> {
    if sentinels.iter().any(|s| s.trim().is_empty()) {
        return Err(validator::ValidationError::new("blank_sentinel_empty"));
    }
    Ok(())
}

// --- LOADER ---

/// Loads the assessment settings.
///
/// An explicit path must exist. Without one, the working directory is
/// searched for a known file name, and the defaults apply when none is found.
/// Environment overrides are layered last, then the result is validated.
#[instrument(skip_all)]
pub fn load_assessment_config(
    explicit: Option<&Path>,
    project_dir: &Path,
) -> Result<AssessmentConfig, InfrastructureError> {
    // 1. Découverte du fichier
    let config_path = match explicit {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(path) => return Err(InfrastructureError::ConfigNotFound(path.display().to_string())),
        None => find_config(project_dir),
    };

    // 2. Chargement YAML
    let mut config = match &config_path {
        Some(path) => {
            info!(path = ?path, "Loading assessment config");
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                AssessmentConfig::default()
            } else {
                serde_yaml::from_str(&content)?
            }
        }
        None => AssessmentConfig::default(),
    };

    // 3. Override via Variables d'Environnement
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    // 4. Validation
    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    Ok(config)
}

fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|filename| root.join(filename))
        .find(|p| p.is_file())
}

fn apply_env_overrides<F>(
    config: &mut AssessmentConfig,
    lookup: F,
) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DQ_OUTPUT_DIR") {
        info!(old = ?config.output_dir, new = ?val, "Overriding output dir via ENV");
        config.output_dir = val;
    }
    if let Some(val) = lookup("DQ_FAIL_UNDER") {
        let threshold: f64 = val.trim().parse().map_err(|_| {
            InfrastructureError::ConfigError(format!("DQ_FAIL_UNDER is not a number: '{}'", val))
        })?;
        info!(old = ?config.fail_under, new = threshold, "Overriding fail threshold via ENV");
        config.fail_under = Some(threshold);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_defaults_when_no_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let config = load_assessment_config(None, tmp.path())?;
        assert_eq!(config.output_dir, default_output_dir());
        assert!(config.blank_sentinels.contains(&"n/a".to_string()));
        Ok(())
    }

    #[test]
    fn test_discovered_file_is_loaded() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(
            tmp.path().join("dq_config.yaml"),
            "name: crm\nfail_under: 75\nblank_sentinels: ['-', '?']\nexport_outcomes: true\n",
        )?;
        let config = load_assessment_config(None, tmp.path())?;
        assert_eq!(config.name, "crm");
        assert_eq!(config.fail_under, Some(75.0));
        assert!(config.export_outcomes);
        assert!(config.blank_policy().is_blank("?"));
        assert!(!config.blank_policy().is_blank("null"));
        Ok(())
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err =
            load_assessment_config(Some(&tmp.path().join("nope.yaml")), tmp.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigNotFound(_)));
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("custom.yaml");
        fs::write(&path, "fail_under: 120\n")?;
        let err = load_assessment_config(Some(&path), tmp.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigError(msg) if msg.contains("fail_under")));
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AssessmentConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "DQ_OUTPUT_DIR" => Some("/tmp/reports".into()),
            "DQ_FAIL_UNDER" => Some(" 80 ".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.output_dir, "/tmp/reports");
        assert_eq!(config.fail_under, Some(80.0));

        let err = apply_env_overrides(&mut config, |key| {
            (key == "DQ_FAIL_UNDER").then(|| "high".into())
        });
        assert!(err.is_err());
    }
}
