//! Configuration Management
//!
//! This module loads azenv settings from JSON files and command-line overrides.
//!
//! # Configuration Locations
//! - Local: `.azenv/config.json` (team-shareable, per-project)
//! - Global: `~/.config/azenv/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Command-line flags (highest priority)
//! 2. Local config file (`.azenv/config.json`)
//! 3. Global config file (`~/.config/azenv/config.json`)
//! 4. Built-in defaults
//!
//! An explicit `--config <file>` replaces both the local and the global file.
//! Files are merged field by field; a field absent from a file does not reset it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::environment::ModelDeployments;
use crate::error::{AzenvError, Result};

/// Default snapshot path, relative to the working directory
pub const DEFAULT_OUTPUT_PATH: &str = ".env";

/// Default deployment-name markers of the provisioning template
pub const DEFAULT_TEMPLATE_MARKERS: [&str; 2] = ["azuredeploy", "Microsoft.Template"];

pub const DEFAULT_MODEL_DEPLOYMENT: &str = "gpt-4.1-mini";
pub const DEFAULT_EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
pub const DEFAULT_STORAGE_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Settings as stored in a config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    /// Where the snapshot is written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Substrings identifying the template's deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_markers: Option<Vec<String>>,

    /// Written as `MODEL_DEPLOYMENT_NAME` and `AZURE_OPENAI_DEPLOYMENT_NAME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_deployment_name: Option<String>,

    /// Written as `EMBEDDING_MODEL_DEPLOYMENT_NAME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_deployment_name: Option<String>,

    /// `EndpointSuffix` of the storage connection string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_endpoint_suffix: Option<String>,

    /// Azure CLI executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_path: Option<String>,
}

impl SettingsFile {
    /// Overlay `other` on top of `self`: fields set in `other` win
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_path: other.output_path.or(self.output_path),
            template_markers: other.template_markers.or(self.template_markers),
            model_deployment_name: other.model_deployment_name.or(self.model_deployment_name),
            embedding_deployment_name: other.embedding_deployment_name.or(self.embedding_deployment_name),
            storage_endpoint_suffix: other.storage_endpoint_suffix.or(self.storage_endpoint_suffix),
            az_path: other.az_path.or(self.az_path),
        }
    }
}

/// Effective settings of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_path: PathBuf,
    pub template_markers: Vec<String>,
    pub models: ModelDeployments,
    pub storage_endpoint_suffix: String,
    pub az_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            template_markers: DEFAULT_TEMPLATE_MARKERS.iter().map(|m| (*m).to_string()).collect(),
            models: ModelDeployments {
                chat: DEFAULT_MODEL_DEPLOYMENT.to_string(),
                embedding: DEFAULT_EMBEDDING_DEPLOYMENT.to_string(),
            },
            storage_endpoint_suffix: DEFAULT_STORAGE_ENDPOINT_SUFFIX.to_string(),
            az_path: "az".to_string(),
        }
    }
}

impl Settings {
    /// Apply a merged settings file over the defaults
    pub fn from_file(file: SettingsFile) -> Result<Self> {
        let defaults = Self::default();

        let template_markers = match file.template_markers {
            Some(markers) => {
                let markers: Vec<String> = markers
                    .into_iter()
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
                if markers.is_empty() {
                    return Err(AzenvError::config_error("template_markers must not be empty"));
                }
                markers
            }
            None => defaults.template_markers,
        };

        Ok(Self {
            output_path: file.output_path.unwrap_or(defaults.output_path),
            template_markers,
            models: ModelDeployments {
                chat: file.model_deployment_name.unwrap_or(defaults.models.chat),
                embedding: file.embedding_deployment_name.unwrap_or(defaults.models.embedding),
            },
            storage_endpoint_suffix: file.storage_endpoint_suffix.unwrap_or(defaults.storage_endpoint_suffix),
            az_path: file.az_path.unwrap_or(defaults.az_path),
        })
    }
}

/// Get path to local config file (`.azenv/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        AzenvError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".azenv").join("config.json"))
}

/// Get path to global config file (`~/.config/azenv/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AzenvError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("azenv").join("config.json"))
}

/// Load a settings file; a missing file yields empty settings
pub fn load_file(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AzenvError::config_error(format!("Could not read config file {}: {e}", path.display()))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        AzenvError::config_error(format!("Invalid config file {}: {e}", path.display()))
    })
}

/// Load and merge global then local settings files
pub fn load_with_precedence() -> Result<SettingsFile> {
    let global = match global_config_path() {
        Ok(path) => load_file(&path)?,
        // No config directory on this platform: nothing to merge
        Err(_) => SettingsFile::default(),
    };
    let local = load_file(&local_config_path()?)?;
    Ok(global.merge(local))
}

/// Resolve the effective settings
///
/// # Parameters
/// - `explicit_config`: a file replacing local/global discovery; it must exist.
/// - `overrides`: command-line values, applied last.
pub fn resolve_settings(explicit_config: Option<&Path>, overrides: SettingsFile) -> Result<Settings> {
    let file = match explicit_config {
        Some(path) => {
            if !path.exists() {
                return Err(AzenvError::config_error(format!(
                    "Config file {} not found",
                    path.display()
                )));
            }
            load_file(path)?
        }
        None => load_with_precedence()?,
    };
    Settings::from_file(file.merge(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.output_path, PathBuf::from(".env"));
        assert_eq!(settings.template_markers, vec!["azuredeploy", "Microsoft.Template"]);
        assert_eq!(settings.models.chat, "gpt-4.1-mini");
        assert_eq!(settings.models.embedding, "text-embedding-ada-002");
        assert_eq!(settings.storage_endpoint_suffix, "core.windows.net");
        assert_eq!(settings.az_path, "az");
    }

    #[test]
    fn test_merge_later_wins_per_field() {
        let global = SettingsFile {
            output_path: Some(PathBuf::from("/tmp/global.env")),
            model_deployment_name: Some("gpt-4o".into()),
            ..Default::default()
        };
        let local = SettingsFile {
            model_deployment_name: Some("gpt-4.1".into()),
            ..Default::default()
        };

        let merged = global.merge(local);
        assert_eq!(merged.output_path, Some(PathBuf::from("/tmp/global.env")));
        assert_eq!(merged.model_deployment_name.as_deref(), Some("gpt-4.1"));
    }

    #[test]
    fn test_from_file_rejects_empty_markers() {
        let file = SettingsFile {
            template_markers: Some(vec![" ".into()]),
            ..Default::default()
        };
        let err = Settings::from_file(file).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, SettingsFile::default());
    }

    #[test]
    fn test_load_file_roundtrip_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"output_path": "out/.env", "template_markers": ["main"], "az_path": "/usr/bin/az"}"#,
        )
        .unwrap();

        let settings = Settings::from_file(load_file(&path).unwrap()).unwrap();
        assert_eq!(settings.output_path, PathBuf::from("out/.env"));
        assert_eq!(settings.template_markers, vec!["main"]);
        assert_eq!(settings.az_path, "/usr/bin/az");
        assert_eq!(settings.models.chat, DEFAULT_MODEL_DEPLOYMENT);
    }

    #[test]
    fn test_load_file_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"outputs": ".env"}"#).unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = resolve_settings(Some(missing.as_path()), SettingsFile::default()).unwrap_err();
        assert!(err.message().contains("not found"));
    }

    #[test]
    fn test_explicit_config_with_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"output_path": "from-file.env", "model_deployment_name": "gpt-4o"}"#).unwrap();

        let overrides = SettingsFile {
            output_path: Some(PathBuf::from("from-cli.env")),
            ..Default::default()
        };
        let settings = resolve_settings(Some(path.as_path()), overrides).unwrap();
        assert_eq!(settings.output_path, PathBuf::from("from-cli.env"));
        assert_eq!(settings.models.chat, "gpt-4o");
    }
}
