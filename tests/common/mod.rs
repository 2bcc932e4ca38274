//! In-memory control plane shared by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use azenv::control_plane::{DeploymentSummary, ResourceDetails, ResourceKeys, ResourceSummary};
use azenv::{AzenvError, ControlPlane, Lookup, ResourceKind, Result};

/// Control plane answering from fixed tables and recording every call
#[derive(Default)]
pub struct FakeControlPlane {
    subscription: Option<String>,
    deployments: Vec<DeploymentSummary>,
    deployments_error: Option<String>,
    outputs: BTreeMap<String, BTreeMap<String, String>>,
    resources: BTreeMap<String, Vec<ResourceSummary>>,
    failing_types: BTreeSet<String>,
    details: BTreeMap<String, ResourceDetails>,
    keys: BTreeMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(mut self, id: &str) -> Self {
        self.subscription = Some(id.to_string());
        self
    }

    pub fn with_deployment(mut self, name: &str, timestamp: Option<&str>) -> Self {
        let timestamp = timestamp.map(|t| {
            DateTime::parse_from_rfc3339(t).expect("valid test timestamp").with_timezone(&Utc)
        });
        self.deployments.push(DeploymentSummary::new(name, timestamp));
        self
    }

    pub fn failing_deployments(mut self, detail: &str) -> Self {
        self.deployments_error = Some(detail.to_string());
        self
    }

    pub fn with_outputs(mut self, deployment: &str, outputs: &[(&str, &str)]) -> Self {
        let entry = self.outputs.entry(deployment.to_string()).or_default();
        for (key, value) in outputs {
            entry.insert((*key).to_string(), (*value).to_string());
        }
        self
    }

    pub fn with_resource(mut self, kind: ResourceKind, name: &str, kind_attr: Option<&str>) -> Self {
        self.resources
            .entry(kind.spec().resource_type.to_string())
            .or_default()
            .push(ResourceSummary::new(name, kind_attr));
        self
    }

    pub fn failing_listing(mut self, kind: ResourceKind) -> Self {
        self.failing_types.insert(kind.spec().resource_type.to_string());
        self
    }

    pub fn with_details(mut self, name: &str, properties: serde_json::Value) -> Self {
        let endpoint = properties.get("endpoint").and_then(|e| e.as_str()).map(String::from);
        let details = ResourceDetails {
            endpoint,
            properties,
        };
        self.details.insert(name.to_string(), details);
        self
    }

    pub fn with_key(mut self, name: &str, key: &str) -> Self {
        self.keys.insert(name.to_string(), key.to_string());
        self
    }

    /// Every call so far, as `operation:argument`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log").clone()
    }

    pub fn was_called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("call log").push(call);
    }
}

impl ControlPlane for FakeControlPlane {
    async fn subscription_id(&self) -> Lookup<String> {
        self.record("subscription_id".to_string());
        match &self.subscription {
            Some(id) => Lookup::Found(id.clone()),
            None => Lookup::TransientError("not logged in".to_string()),
        }
    }

    async fn list_deployments(&self, group: &str) -> Result<Vec<DeploymentSummary>> {
        self.record(format!("list_deployments:{group}"));
        match &self.deployments_error {
            Some(detail) => Err(AzenvError::discovery_failed(group, detail.clone())),
            None => Ok(self.deployments.clone()),
        }
    }

    async fn deployment_outputs(&self, _group: &str, deployment: &str) -> Lookup<BTreeMap<String, String>> {
        self.record(format!("deployment_outputs:{deployment}"));
        self.outputs.get(deployment).cloned().map_or(Lookup::NotFound, Lookup::Found)
    }

    async fn list_resources_by_type(&self, _group: &str, resource_type: &str) -> Lookup<Vec<ResourceSummary>> {
        self.record(format!("list_resources_by_type:{resource_type}"));
        if self.failing_types.contains(resource_type) {
            return Lookup::TransientError("request timed out".to_string());
        }
        Lookup::Found(self.resources.get(resource_type).cloned().unwrap_or_default())
    }

    async fn show_resource(&self, _group: &str, _kind: ResourceKind, name: &str) -> Lookup<ResourceDetails> {
        self.record(format!("show_resource:{name}"));
        self.details.get(name).cloned().map_or(Lookup::NotFound, Lookup::Found)
    }

    async fn list_resource_keys(&self, _group: &str, _kind: ResourceKind, name: &str) -> Lookup<ResourceKeys> {
        self.record(format!("list_resource_keys:{name}"));
        match self.keys.get(name) {
            Some(key) => Lookup::Found(ResourceKeys {
                primary: key.clone(),
            }),
            None => Lookup::NotFound,
        }
    }
}
