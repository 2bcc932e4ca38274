//! Resource Resolution Engine
//!
//! Resolves every [`ResourceKind`] of a resource group into a [`ResourceDescriptor`].
//!
//! # Strategy Table
//! Each kind has an ordered list of [`Strategy`] values. Strategies are tried in
//! order and the first one producing a name wins; later strategies are never
//! consulted for that kind. Deployment outputs therefore always take priority
//! over type discovery.
//!
//! # Pipeline
//! 1. [`primary`]: pick the deployment, read its outputs once
//! 2. strategy table per kind: the outputs-based strategies in [`primary`], then
//!    [`fallback`] discovery for the kinds still unresolved
//! 3. [`secrets`]: endpoints and keys for resolved names
//! 4. subscription id, read once for derivation

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::control_plane::ControlPlane;
use crate::error::{AzenvError, Result};
use crate::resource::{ResourceDescriptor, ResourceKind};

pub mod fallback;
pub mod primary;
pub mod secrets;

pub use fallback::resolve_fallback;
pub use primary::{resolve_primary, select_deployment, ResolutionContext};

/// A way of resolving a kind's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Read the name from the selected deployment's outputs
    DeploymentOutput,
    /// Parse the name out of an endpoint published in the deployment outputs
    EndpointInference,
    /// Enumerate live resources of the kind's type and take the first match
    TypeDiscovery,
}

/// Strategies for a kind, highest priority first
#[must_use]
pub const fn strategies(kind: ResourceKind) -> &'static [Strategy] {
    match kind {
        ResourceKind::AIFoundryProject => {
            &[Strategy::DeploymentOutput, Strategy::EndpointInference, Strategy::TypeDiscovery]
        }
        _ => &[Strategy::DeploymentOutput, Strategy::TypeDiscovery],
    }
}

/// Which part of a resource could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapField {
    Name,
    Endpoint,
    Key,
}

/// A soft resolution gap, reported but never fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionGap {
    pub kind: ResourceKind,
    pub field: GapField,
}

/// Result of resolving one resource group
#[derive(Debug, Clone)]
pub struct Resolution {
    pub group: String,
    pub deployment: String,
    pub subscription_id: Option<String>,
    pub descriptors: BTreeMap<ResourceKind, ResourceDescriptor>,
    pub gaps: Vec<ResolutionGap>,
}

impl Resolution {
    /// Descriptor for a kind (unresolved if the kind is somehow absent)
    #[must_use]
    pub fn descriptor(&self, kind: ResourceKind) -> ResourceDescriptor {
        self.descriptors.get(&kind).cloned().unwrap_or_else(|| ResourceDescriptor::unresolved(kind))
    }

    /// Kinds no strategy could resolve, in catalog order
    #[must_use]
    pub fn unresolved_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| !self.descriptors.get(kind).is_some_and(ResourceDescriptor::is_resolved))
            .collect()
    }
}

/// Resolution engine over a control plane
pub struct Resolver<'a, C> {
    client: &'a C,
    template_markers: &'a [String],
}

impl<'a, C: ControlPlane + Sync> Resolver<'a, C> {
    pub const fn new(client: &'a C, template_markers: &'a [String]) -> Self {
        Self {
            client,
            template_markers,
        }
    }

    /// Resolve every kind of the group
    ///
    /// Fails only on an empty group, a failed deployment enumeration, or a group
    /// without a matching deployment. Everything else degrades to gaps.
    pub async fn resolve(&self, group: &str) -> Result<Resolution> {
        let group = group.trim();
        if group.is_empty() {
            return Err(AzenvError::invalid_input("Resource group name cannot be empty"));
        }

        let context = ResolutionContext::load(self.client, group, self.template_markers).await?;
        tracing::info!("using deployment '{}' in resource group '{group}'", context.deployment);

        let mut descriptors = primary::resolve_from_context(&context);
        let unresolved: BTreeSet<ResourceKind> = descriptors
            .values()
            .filter(|d| !d.is_resolved())
            .map(|d| d.kind)
            .collect();
        descriptors.extend(fallback::resolve_fallback(self.client, group, &unresolved).await);

        let (descriptors, mut gaps) = secrets::enrich(self.client, group, descriptors).await;

        let unresolved = descriptors
            .values()
            .filter(|d| !d.is_resolved())
            .map(|d| ResolutionGap {
                kind: d.kind,
                field: GapField::Name,
            });
        let mut name_gaps: Vec<ResolutionGap> = unresolved.collect();
        name_gaps.append(&mut gaps);

        let subscription_id = self.client.subscription_id().await.collapse("subscription id");

        Ok(Resolution {
            group: group.to_string(),
            deployment: context.deployment.clone(),
            subscription_id,
            descriptors,
            gaps: name_gaps,
        })
    }
}
