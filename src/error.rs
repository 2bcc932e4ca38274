//! Error Handling Infrastructure
//!
//! This module defines the fatal error types used throughout azenv.
//! Every error maps to a stable error code for JSON output.
//!
//! # Error Categories
//! - `InvalidInput`: missing or invalid resource group / argument (fatal input error)
//! - `DiscoveryFailed`: deployment enumeration itself failed (fatal discovery error)
//! - `DeploymentNotFound`: no deployment carries a recognized template marker (fatal discovery error)
//! - `ControlPlane`: a control-plane call failed on a path declared fatal
//! - `SnapshotWrite`: the environment snapshot could not be written
//! - `ConfigError`: configuration file errors
//!
//! Soft resolution gaps are not errors. They are carried as
//! [`crate::control_plane::Lookup`] values and reported, never raised.

use thiserror::Error;

/// Main error type for azenv operations
#[derive(Error, Debug)]
pub enum AzenvError {
    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Listing deployments of the resource group failed
    #[error("Deployment discovery failed for resource group '{group}': {detail}")]
    DiscoveryFailed { group: String, detail: String },

    /// No deployment matched any template marker
    #[error("No deployment matching {markers:?} found in resource group '{group}'")]
    DeploymentNotFound { group: String, markers: Vec<String> },

    /// Control-plane invocation failed
    #[error("Control plane error: {0}")]
    ControlPlane(String),

    /// Writing the environment snapshot failed
    #[error("Could not write snapshot '{path}': {detail}")]
    SnapshotWrite { path: String, detail: String },

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AzenvError {
    /// Convert error to error code string for JSON output
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::DiscoveryFailed { .. } => "DISCOVERY_FAILED",
            Self::DeploymentNotFound { .. } => "DEPLOYMENT_NOT_FOUND",
            Self::ControlPlane(_) => "CONTROL_PLANE_ERROR",
            Self::SnapshotWrite { .. } => "SNAPSHOT_WRITE_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the error comes from the input side (bad group or argument)
    /// rather than from talking to the control plane.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ConfigError(_))
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a deployment discovery error
    pub fn discovery_failed(group: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DiscoveryFailed {
            group: group.into(),
            detail: detail.into(),
        }
    }

    /// Create a deployment-not-found error
    pub fn deployment_not_found(group: impl Into<String>, markers: &[String]) -> Self {
        Self::DeploymentNotFound {
            group: group.into(),
            markers: markers.to_vec(),
        }
    }

    /// Create a control-plane error
    pub fn control_plane(message: impl Into<String>) -> Self {
        Self::ControlPlane(message.into())
    }

    /// Create a snapshot write error
    pub fn snapshot_write(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SnapshotWrite {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for azenv operations
pub type Result<T> = std::result::Result<T, AzenvError>;
