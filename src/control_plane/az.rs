//! Azure CLI Control Plane
//!
//! Implements [`ControlPlane`] by invoking the `az` command-line tool with JSON output.
//!
//! # Implementation Notes
//! - Each call spawns one `az` process and awaits it; calls never overlap
//! - Authentication is whatever `az login` established; nothing is cached here
//! - No timeout is imposed; a hung `az` hangs the run
//! - A non-zero exit reporting a missing resource maps to [`Lookup::NotFound`],
//!   every other failure to [`Lookup::TransientError`]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::process::Command;

use crate::control_plane::{
    ControlPlane, DeploymentSummary, Lookup, ResourceDetails, ResourceKeys, ResourceSummary,
};
use crate::error::{AzenvError, Result};
use crate::resource::ResourceKind;

/// `az`-backed control plane
#[derive(Debug, Clone)]
pub struct AzCli {
    program: String,
}

impl AzCli {
    /// Create a client invoking the given `az` executable
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Run `az <args> --output json` and parse stdout
    async fn run(&self, args: &[&str]) -> Lookup<Value> {
        tracing::debug!("{} {}", self.program, args.join(" "));

        let output = match Command::new(&self.program)
            .args(args)
            .args(["--output", "json"])
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => return Lookup::TransientError(format!("failed to run {}: {e}", self.program)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return classify_failure(stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_json(&stdout)
    }
}

impl ControlPlane for AzCli {
    async fn subscription_id(&self) -> Lookup<String> {
        match self.run(&["account", "show", "--query", "id"]).await {
            Lookup::Found(Value::String(id)) if !id.is_empty() => Lookup::Found(id),
            Lookup::Found(_) => Lookup::NotFound,
            other => other.map(|_| String::new()),
        }
    }

    async fn list_deployments(&self, group: &str) -> Result<Vec<DeploymentSummary>> {
        match self.run(&["deployment", "group", "list", "--resource-group", group]).await {
            Lookup::Found(value) => parse_deployments(&value),
            Lookup::NotFound => Ok(Vec::new()),
            Lookup::TransientError(detail) => Err(AzenvError::discovery_failed(group, detail)),
        }
    }

    async fn deployment_outputs(&self, group: &str, deployment: &str) -> Lookup<BTreeMap<String, String>> {
        let args = [
            "deployment",
            "group",
            "show",
            "--resource-group",
            group,
            "--name",
            deployment,
            "--query",
            "properties.outputs",
        ];
        match self.run(&args).await {
            Lookup::Found(value) => parse_outputs(&value),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::TransientError(detail) => Lookup::TransientError(detail),
        }
    }

    async fn list_resources_by_type(&self, group: &str, resource_type: &str) -> Lookup<Vec<ResourceSummary>> {
        let args = ["resource", "list", "--resource-group", group, "--resource-type", resource_type];
        match self.run(&args).await {
            Lookup::Found(value) => Lookup::Found(parse_resource_list(&value)),
            Lookup::NotFound => Lookup::Found(Vec::new()),
            Lookup::TransientError(detail) => Lookup::TransientError(detail),
        }
    }

    async fn show_resource(&self, group: &str, kind: ResourceKind, name: &str) -> Lookup<ResourceDetails> {
        let resource_type = kind.spec().resource_type;
        let args = [
            "resource",
            "show",
            "--resource-group",
            group,
            "--name",
            name,
            "--resource-type",
            resource_type,
        ];
        match self.run(&args).await {
            Lookup::Found(value) => parse_details(&value),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::TransientError(detail) => Lookup::TransientError(detail),
        }
    }

    async fn list_resource_keys(&self, group: &str, kind: ResourceKind, name: &str) -> Lookup<ResourceKeys> {
        let Some(command) = keys_command(kind) else {
            return Lookup::NotFound;
        };
        let mut args: Vec<&str> = command.to_vec();
        args.extend(["--resource-group", group, keys_name_flag(kind), name]);
        match self.run(&args).await {
            Lookup::Found(value) => parse_keys(kind, &value),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::TransientError(detail) => Lookup::TransientError(detail),
        }
    }
}

/// Subcommand listing keys for a kind, if the kind has keys
fn keys_command(kind: ResourceKind) -> Option<&'static [&'static str]> {
    match kind {
        ResourceKind::StorageAccount => Some(&["storage", "account", "keys", "list"]),
        ResourceKind::SearchService => Some(&["search", "admin-key", "show"]),
        ResourceKind::AIFoundryHub | ResourceKind::DocumentIntelligence => {
            Some(&["cognitiveservices", "account", "keys", "list"])
        }
        ResourceKind::CosmosDbAccount => Some(&["cosmosdb", "keys", "list"]),
        _ => None,
    }
}

const fn keys_name_flag(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::SearchService => "--service-name",
        _ => "--name",
    }
}

fn classify_failure<T>(stderr: &str) -> Lookup<T> {
    let missing = ["ResourceNotFound", "NotFound", "could not be found", "was not found"];
    if missing.iter().any(|m| stderr.contains(m)) {
        Lookup::NotFound
    } else if stderr.is_empty() {
        Lookup::TransientError("az exited with a non-zero status".to_string())
    } else {
        Lookup::TransientError(stderr.lines().next().unwrap_or(stderr).to_string())
    }
}

fn parse_json(stdout: &str) -> Lookup<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Lookup::NotFound;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Null) => Lookup::NotFound,
        Ok(value) => Lookup::Found(value),
        Err(e) => Lookup::TransientError(format!("invalid JSON from az: {e}")),
    }
}

fn parse_deployments(value: &Value) -> Result<Vec<DeploymentSummary>> {
    let entries = value
        .as_array()
        .ok_or_else(|| AzenvError::control_plane("deployment list is not a JSON array"))?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let timestamp = entry
                .pointer("/properties/timestamp")
                .and_then(Value::as_str)
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc));
            Some(DeploymentSummary::new(name, timestamp))
        })
        .collect())
}

fn parse_outputs(value: &Value) -> Lookup<BTreeMap<String, String>> {
    let Some(outputs) = value.as_object() else {
        return Lookup::TransientError("deployment outputs are not a JSON object".to_string());
    };

    let flattened = outputs
        .iter()
        .filter_map(|(key, output)| {
            let value = output.get("value").unwrap_or(output);
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect();
    Lookup::Found(flattened)
}

fn parse_resource_list(value: &Value) -> Vec<ResourceSummary> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let name = entry.get("name")?.as_str()?;
                    let kind = entry.get("kind").and_then(Value::as_str);
                    Some(ResourceSummary::new(name, kind))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_details(value: &Value) -> Lookup<ResourceDetails> {
    let properties = value.get("properties").cloned().unwrap_or(Value::Null);
    let endpoint = properties.get("endpoint").and_then(Value::as_str).map(String::from);
    Lookup::Found(ResourceDetails {
        endpoint,
        properties,
    })
}

fn parse_keys(kind: ResourceKind, value: &Value) -> Lookup<ResourceKeys> {
    let text = |v: Option<&Value>| v.and_then(Value::as_str).filter(|s| !s.is_empty()).map(String::from);

    let primary = match kind {
        ResourceKind::StorageAccount => text(value.pointer("/0/value")),
        ResourceKind::SearchService => text(value.get("primaryKey")),
        ResourceKind::CosmosDbAccount => text(value.get("primaryMasterKey")),
        _ => text(value.get("key1")),
    };

    match primary {
        Some(primary) => Lookup::Found(ResourceKeys { primary }),
        None => Lookup::NotFound,
    }
}
