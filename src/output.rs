//! Console Output
//!
//! The human-readable resolution summary and its `--json` counterpart.
//!
//! # Output Contract (`--json`)
//! - Success: `{"ok": true, "command": "resolve", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "command": "resolve", "error": {"code": "...", "message": "..."}}`
//!
//! Secret values never appear in either form; the report only says whether a key
//! was found.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::derive::{ArtifactKind, DerivedArtifacts};
use crate::error::AzenvError;
use crate::resolver::{GapField, Resolution, ResolutionGap};
use crate::resource::{ResolvedVia, ResourceKind};

/// Success envelope for operation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Command that was executed
    pub command: String,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self {
            ok: true,
            command: command.into(),
            data,
            meta,
        }
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Command that was attempted
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    pub fn new(command: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            command: command.into(),
            error,
        }
    }

    /// Create error envelope from AzenvError
    pub fn from_error(command: impl Into<String>, err: &AzenvError) -> Self {
        Self::new(command, ErrorInfo::new(err.error_code(), err.message()))
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "DEPLOYMENT_NOT_FOUND")
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,
}

impl Metadata {
    pub const fn new(execution_ms: u64) -> Self {
        Self { execution_ms }
    }
}

/// Per-kind line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub resolved_via: ResolvedVia,
    pub has_endpoint: bool,
    pub has_key: bool,
}

/// What one run resolved, derived and wrote
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub resource_group: String,
    pub deployment: String,
    pub output_path: String,
    pub resources: Vec<ResourceStatus>,
    /// Kinds no strategy could resolve
    pub missing: Vec<ResourceKind>,
    pub skipped_artifacts: Vec<ArtifactKind>,
    pub gaps: Vec<ResolutionGap>,
}

impl RunReport {
    #[must_use]
    pub fn new(resolution: &Resolution, artifacts: &DerivedArtifacts, output_path: &Path) -> Self {
        let resources = ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                let descriptor = resolution.descriptor(kind);
                ResourceStatus {
                    kind,
                    name: descriptor.name().map(str::to_string),
                    resolved_via: descriptor.resolved_via(),
                    has_endpoint: descriptor.endpoint.is_some(),
                    has_key: descriptor.primary_key.is_some(),
                }
            })
            .collect();

        Self {
            resource_group: resolution.group.clone(),
            deployment: resolution.deployment.clone(),
            output_path: output_path.display().to_string(),
            resources,
            missing: resolution.unresolved_kinds(),
            skipped_artifacts: artifacts.skipped(),
            gaps: resolution.gaps.clone(),
        }
    }

    /// True when any kind, endpoint, key or artifact is missing
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty() || !self.skipped_artifacts.is_empty() || !self.gaps.is_empty()
    }

    /// Human-readable summary for the console
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Resource group: {}", self.resource_group);
        let _ = writeln!(out, "Deployment:     {}", self.deployment);
        let _ = writeln!(out);

        for status in &self.resources {
            let label = format!("{}:", status.kind.display_name());
            match &status.name {
                Some(name) => {
                    let _ = writeln!(out, "  {label:<24} {name} ({})", status.resolved_via.as_str());
                }
                None => {
                    let _ = writeln!(out, "  {label:<24} NOT FOUND");
                }
            }
        }

        let soft: Vec<String> = self
            .gaps
            .iter()
            .filter(|gap| gap.field != GapField::Name)
            .map(|gap| {
                let field = match gap.field {
                    GapField::Endpoint => "endpoint",
                    GapField::Key | GapField::Name => "key",
                };
                format!("{} {field}", gap.kind.display_name())
            })
            .collect();
        if !soft.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Could not read: {}", soft.join(", "));
        }

        if !self.skipped_artifacts.is_empty() {
            let skipped: Vec<&str> = self.skipped_artifacts.iter().map(ArtifactKind::display_name).collect();
            let _ = writeln!(out, "Skipped (incomplete inputs): {}", skipped.join(", "));
        }

        if !self.missing.is_empty() {
            let missing: Vec<&str> = self.missing.iter().map(ResourceKind::display_name).collect();
            let _ = writeln!(out);
            let _ = writeln!(out, "WARNING: missing services: {}", missing.join(", "));
        }

        let _ = writeln!(out);
        let _ = write!(out, "Wrote {}", self.output_path);
        out
    }
}
