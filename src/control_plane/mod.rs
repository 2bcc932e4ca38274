//! Control-Plane Abstraction
//!
//! This module defines the operations azenv consumes from the cloud control plane.
//! The production implementation lives in [`az`]; tests substitute an in-memory fake.
//!
//! # Failure Model
//! Only [`ControlPlane::list_deployments`] returns a `Result`: failing to enumerate
//! deployments is fatal. Every other operation returns a [`Lookup`], which the
//! resolvers collapse to an empty field through [`Lookup::collapse`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::resource::ResourceKind;

pub mod az;

/// Outcome of a best-effort control-plane read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The value exists
    Found(T),
    /// The control plane answered, but there is nothing there
    NotFound,
    /// The call itself failed (timeout, auth, malformed output, ...)
    TransientError(String),
}

impl<T> Lookup<T> {
    /// Collapse the lookup into an optional value, logging the gap.
    ///
    /// This is the single place where soft failures are swallowed: `NotFound`
    /// logs at debug level, `TransientError` at warn level, and both become `None`.
    pub fn collapse(self, what: &str) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => {
                tracing::debug!("{what}: not found");
                None
            }
            Self::TransientError(detail) => {
                tracing::warn!("{what}: {detail}");
                None
            }
        }
    }

    /// Map the found value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::TransientError(detail) => Lookup::TransientError(detail),
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// One entry of the deployment history of a resource group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DeploymentSummary {
    pub fn new(name: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            timestamp,
        }
    }
}

/// One resource returned by a type-scoped listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub name: String,
    /// The resource's `kind` attribute (e.g. `AIServices`, `FormRecognizer`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ResourceSummary {
    pub fn new(name: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: kind.map(String::from),
        }
    }
}

/// The `show` document of a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl ResourceDetails {
    /// Read a string property; the top-level `endpoint` answers for `"endpoint"`
    #[must_use]
    pub fn property(&self, name: &str) -> Option<String> {
        if name == "endpoint" {
            if let Some(endpoint) = self.endpoint.as_ref().filter(|e| !e.is_empty()) {
                return Some(endpoint.clone());
            }
        }
        self.properties
            .get(name)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// Access keys of a resource
///
/// A listing without a primary key is reported as [`Lookup::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKeys {
    pub primary: String,
}

/// Cloud control-plane operations
///
/// All methods are read-only. Implementations must not retry or reorder results:
/// list order is observable through deployment selection and type discovery.
pub trait ControlPlane {
    /// Subscription the client operates in
    fn subscription_id(&self) -> impl std::future::Future<Output = Lookup<String>> + Send;

    /// Deployment history of a resource group, in control-plane order
    ///
    /// This is the one fatal read: an error aborts the run.
    fn list_deployments(
        &self,
        group: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DeploymentSummary>>> + Send;

    /// Declared outputs of a deployment, flattened to strings
    fn deployment_outputs(
        &self,
        group: &str,
        deployment: &str,
    ) -> impl std::future::Future<Output = Lookup<BTreeMap<String, String>>> + Send;

    /// Resources of one ARM type in the group, in control-plane order
    fn list_resources_by_type(
        &self,
        group: &str,
        resource_type: &str,
    ) -> impl std::future::Future<Output = Lookup<Vec<ResourceSummary>>> + Send;

    /// The `show` document of a named resource
    fn show_resource(
        &self,
        group: &str,
        kind: ResourceKind,
        name: &str,
    ) -> impl std::future::Future<Output = Lookup<ResourceDetails>> + Send;

    /// Access keys of a named resource
    fn list_resource_keys(
        &self,
        group: &str,
        kind: ResourceKind,
        name: &str,
    ) -> impl std::future::Future<Output = Lookup<ResourceKeys>> + Send;
}
