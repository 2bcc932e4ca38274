//! Primary Resolver
//!
//! Selects the deployment that provisioned the group and resolves names and
//! endpoints from its declared outputs.
//!
//! # Deployment Selection
//! Only deployments whose name contains a template marker are candidates. The
//! latest timestamp wins; a deployment without a timestamp never beats one with
//! a timestamp, and equal timestamps keep the earlier list position. The list
//! returned by the control plane is scanned as-is, never reordered.

use std::collections::BTreeMap;

use crate::control_plane::{ControlPlane, DeploymentSummary};
use crate::derive::project_name_from_endpoint;
use crate::error::{AzenvError, Result};
use crate::resolver::{strategies, Strategy};
use crate::resource::{ResolvedVia, ResourceDescriptor, ResourceKind};

/// Deployment outputs of the selected deployment
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub group: String,
    pub deployment: String,
    outputs: BTreeMap<String, String>,
}

impl ResolutionContext {
    pub fn new(
        group: impl Into<String>,
        deployment: impl Into<String>,
        outputs: BTreeMap<String, String>,
    ) -> Self {
        Self {
            group: group.into(),
            deployment: deployment.into(),
            outputs,
        }
    }

    /// Enumerate deployments, select one and read its outputs
    ///
    /// Enumeration failure and an empty candidate set are fatal; a failed
    /// outputs read leaves the context without outputs.
    pub async fn load<C: ControlPlane>(client: &C, group: &str, markers: &[String]) -> Result<Self> {
        let deployments = client.list_deployments(group).await?;
        tracing::debug!("found {} deployment(s) in '{group}'", deployments.len());

        let selected = select_deployment(&deployments, markers)
            .ok_or_else(|| AzenvError::deployment_not_found(group, markers))?;

        let outputs = client
            .deployment_outputs(group, &selected.name)
            .await
            .collapse(&format!("outputs of deployment '{}'", selected.name))
            .unwrap_or_default();

        Ok(Self::new(group, selected.name.clone(), outputs))
    }

    /// Non-empty output value, matched case-insensitively
    #[must_use]
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs
            .get(key)
            .or_else(|| {
                self.outputs.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
            })
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Pick the deployment to read outputs from
#[must_use]
pub fn select_deployment<'a>(
    deployments: &'a [DeploymentSummary],
    markers: &[String],
) -> Option<&'a DeploymentSummary> {
    let matches = |d: &&DeploymentSummary| {
        let name = d.name.to_ascii_lowercase();
        markers.iter().any(|m| !m.is_empty() && name.contains(&m.to_ascii_lowercase()))
    };

    deployments.iter().filter(matches).fold(None, |best, candidate| match best {
        Some(current) if candidate.timestamp <= current.timestamp => Some(current),
        _ => Some(candidate),
    })
}

/// `DeploymentOutput` strategy: name (and endpoint) straight from the outputs
#[must_use]
pub fn from_outputs(context: &ResolutionContext, kind: ResourceKind) -> Option<ResourceDescriptor> {
    let spec = kind.spec();
    let name = context.output(spec.name_output)?;
    let endpoint = spec.endpoint_output.and_then(|key| context.output(key)).map(String::from);
    Some(ResourceDescriptor::resolved(kind, name, ResolvedVia::DeploymentOutput).with_endpoint(endpoint))
}

/// `EndpointInference` strategy: the project name embedded in an API-shaped endpoint
#[must_use]
pub fn infer_from_endpoint(context: &ResolutionContext, kind: ResourceKind) -> Option<ResourceDescriptor> {
    let endpoint = kind.spec().endpoint_output.and_then(|key| context.output(key))?;
    let name = match kind {
        ResourceKind::AIFoundryProject => project_name_from_endpoint(endpoint)?,
        _ => return None,
    };
    Some(
        ResourceDescriptor::resolved(kind, name, ResolvedVia::Derived)
            .with_endpoint(Some(endpoint.to_string())),
    )
}

/// Walk the outputs-based strategies of each kind's table, first success wins
///
/// Kinds no such strategy names stay unresolved and are left to discovery.
#[must_use]
pub fn resolve_from_context(context: &ResolutionContext) -> BTreeMap<ResourceKind, ResourceDescriptor> {
    ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            let found = strategies(kind).iter().find_map(|strategy| match strategy {
                Strategy::DeploymentOutput => from_outputs(context, kind),
                Strategy::EndpointInference => infer_from_endpoint(context, kind),
                Strategy::TypeDiscovery => None,
            });
            let descriptor = match found {
                Some(descriptor) => {
                    tracing::debug!("{kind}: resolved via {}", descriptor.resolved_via().as_str());
                    descriptor
                }
                None => ResourceDescriptor::unresolved(kind),
            };
            (kind, descriptor)
        })
        .collect()
}

/// Resolve every kind from the selected deployment's outputs alone
///
/// Kinds without a usable output stay unresolved.
pub async fn resolve_primary<C: ControlPlane>(
    client: &C,
    group: &str,
    markers: &[String],
) -> Result<BTreeMap<ResourceKind, ResourceDescriptor>> {
    let context = ResolutionContext::load(client, group, markers).await?;
    Ok(resolve_from_context(&context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn markers() -> Vec<String> {
        vec!["azuredeploy".to_string(), "Microsoft.Template".to_string()]
    }

    fn at(hour: u32) -> Option<chrono::DateTime<Utc>> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).single()
    }

    #[test]
    fn test_select_ignores_unmarked_deployments() {
        let deployments = vec![
            DeploymentSummary::new("networking", at(12)),
            DeploymentSummary::new("azuredeploy-001", at(8)),
        ];
        let selected = select_deployment(&deployments, &markers()).unwrap();
        assert_eq!(selected.name, "azuredeploy-001");
    }

    #[test]
    fn test_select_latest_timestamp() {
        let deployments = vec![
            DeploymentSummary::new("azuredeploy-001", at(8)),
            DeploymentSummary::new("Microsoft.Template-002", at(10)),
            DeploymentSummary::new("azuredeploy-003", at(9)),
        ];
        let selected = select_deployment(&deployments, &markers()).unwrap();
        assert_eq!(selected.name, "Microsoft.Template-002");
    }

    #[test]
    fn test_select_ties_keep_first() {
        let deployments = vec![
            DeploymentSummary::new("azuredeploy-a", None),
            DeploymentSummary::new("azuredeploy-b", None),
        ];
        assert_eq!(select_deployment(&deployments, &markers()).unwrap().name, "azuredeploy-a");

        let deployments = vec![
            DeploymentSummary::new("azuredeploy-a", at(8)),
            DeploymentSummary::new("azuredeploy-b", at(8)),
        ];
        assert_eq!(select_deployment(&deployments, &markers()).unwrap().name, "azuredeploy-a");
    }

    #[test]
    fn test_select_timestamp_beats_missing_timestamp() {
        let deployments = vec![
            DeploymentSummary::new("azuredeploy-a", None),
            DeploymentSummary::new("azuredeploy-b", at(1)),
        ];
        assert_eq!(select_deployment(&deployments, &markers()).unwrap().name, "azuredeploy-b");
    }

    #[test]
    fn test_select_marker_case_insensitive() {
        let deployments = vec![DeploymentSummary::new("AzureDeploy-20250301", None)];
        assert!(select_deployment(&deployments, &markers()).is_some());
    }

    #[test]
    fn test_select_none_without_match() {
        let deployments = vec![DeploymentSummary::new("networking", None)];
        assert!(select_deployment(&deployments, &markers()).is_none());
        assert!(select_deployment(&[], &markers()).is_none());
    }

    #[test]
    fn test_output_lookup_case_insensitive_and_non_empty() {
        let mut outputs = BTreeMap::new();
        outputs.insert("StorageAccountName".to_string(), "stdemo001".to_string());
        outputs.insert("searchServiceName".to_string(), "  ".to_string());
        let context = ResolutionContext::new("rg", "azuredeploy", outputs);

        assert_eq!(context.output("storageAccountName"), Some("stdemo001"));
        assert_eq!(context.output("searchServiceName"), None);
        assert_eq!(context.output("keyVaultName"), None);
    }

    #[test]
    fn test_from_outputs_sets_endpoint() {
        let mut outputs = BTreeMap::new();
        outputs.insert("searchServiceName".to_string(), "srch-demo".to_string());
        outputs.insert("searchServiceEndpoint".to_string(), "https://srch-demo.search.windows.net".to_string());
        let context = ResolutionContext::new("rg", "azuredeploy", outputs);

        let descriptor = from_outputs(&context, ResourceKind::SearchService).unwrap();
        assert_eq!(descriptor.name(), Some("srch-demo"));
        assert_eq!(descriptor.resolved_via(), ResolvedVia::DeploymentOutput);
        assert_eq!(descriptor.endpoint.as_deref(), Some("https://srch-demo.search.windows.net"));

        assert!(from_outputs(&context, ResourceKind::KeyVault).is_none());
    }

    #[test]
    fn test_infer_project_name_from_api_endpoint() {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            "aiFoundryProjectEndpoint".to_string(),
            "https://aihub-demo.services.ai.azure.com/api/projects/proj-demo".to_string(),
        );
        let context = ResolutionContext::new("rg", "azuredeploy", outputs);

        assert!(from_outputs(&context, ResourceKind::AIFoundryProject).is_none());
        let descriptor = infer_from_endpoint(&context, ResourceKind::AIFoundryProject).unwrap();
        assert_eq!(descriptor.name(), Some("proj-demo"));
        assert_eq!(descriptor.resolved_via(), ResolvedVia::Derived);
    }

    #[test]
    fn test_no_inference_from_browser_url() {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            "aiFoundryProjectEndpoint".to_string(),
            "https://ai.azure.com/resource/overview?wsid=/subscriptions/x".to_string(),
        );
        let context = ResolutionContext::new("rg", "azuredeploy", outputs);
        assert!(infer_from_endpoint(&context, ResourceKind::AIFoundryProject).is_none());
    }

    #[test]
    fn test_context_walk_infers_project_and_leaves_rest_unresolved() {
        let mut outputs = BTreeMap::new();
        outputs.insert("storageAccountName".to_string(), "stdemo001".to_string());
        outputs.insert(
            "aiFoundryProjectEndpoint".to_string(),
            "https://aihub-demo.services.ai.azure.com/api/projects/proj-demo".to_string(),
        );
        let context = ResolutionContext::new("rg", "azuredeploy", outputs);

        let resolved = resolve_from_context(&context);
        assert_eq!(resolved.len(), ResourceKind::ALL.len());
        assert_eq!(resolved[&ResourceKind::StorageAccount].resolved_via(), ResolvedVia::DeploymentOutput);
        assert_eq!(resolved[&ResourceKind::AIFoundryProject].name(), Some("proj-demo"));
        assert_eq!(resolved[&ResourceKind::AIFoundryProject].resolved_via(), ResolvedVia::Derived);
        assert!(!resolved[&ResourceKind::SearchService].is_resolved());
    }
}
