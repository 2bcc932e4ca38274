//! Resolution Engine Tests
//!
//! Drives [`Resolver`] against an in-memory control plane and checks:
//! - Deployment outputs take priority over type discovery
//! - Type discovery takes the first accepted match
//! - Kind filters separate resources sharing one ARM type
//! - Fatal paths (empty group, failed enumeration, no template deployment)
//! - Soft failures collapse to gaps

mod common;

use common::FakeControlPlane;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

use azenv::resolver::{resolve_fallback, resolve_primary, GapField};
use azenv::{ResolvedVia, Resolver, ResourceKind};

fn markers() -> Vec<String> {
    vec!["azuredeploy".to_string(), "Microsoft.Template".to_string()]
}

fn storage_type() -> String {
    format!("list_resources_by_type:{}", ResourceKind::StorageAccount.spec().resource_type)
}

// ============================================================================
// Priority and Discovery
// ============================================================================

#[tokio::test]
async fn test_outputs_win_and_skip_discovery() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", Some("2025-03-01T10:00:00Z"))
        .with_outputs("azuredeploy-001", &[("storageAccountName", "stoutputs")])
        .with_resource(ResourceKind::StorageAccount, "stdiscovered", None);
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();
    let storage = resolution.descriptor(ResourceKind::StorageAccount);

    assert_eq!(storage.name(), Some("stoutputs"));
    assert_eq!(storage.resolved_via(), ResolvedVia::DeploymentOutput);
    assert!(!client.was_called(&storage_type()));
}

#[tokio::test]
async fn test_discovery_fills_missing_outputs_with_first_match() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", None)
        .with_resource(ResourceKind::SearchService, "srch-a", None)
        .with_resource(ResourceKind::SearchService, "srch-b", None);
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();
    let search = resolution.descriptor(ResourceKind::SearchService);

    assert_eq!(search.name(), Some("srch-a"));
    assert_eq!(search.resolved_via(), ResolvedVia::TypeDiscovery);
    // No show document: the well-known endpoint is used
    assert_eq!(search.endpoint.as_deref(), Some("https://srch-a.search.windows.net"));
}

#[tokio::test]
async fn test_kind_filter_separates_shared_resource_type() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", None)
        .with_resource(ResourceKind::DocumentIntelligence, "docintel-demo", Some("FormRecognizer"))
        .with_resource(ResourceKind::AIFoundryHub, "aihub-demo", Some("AIServices"))
        .with_details("aihub-demo", serde_json::json!({"endpoint": "https://aihub-demo.cognitiveservices.azure.com/"}));
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();

    assert_eq!(resolution.descriptor(ResourceKind::AIFoundryHub).name(), Some("aihub-demo"));
    assert_eq!(
        resolution.descriptor(ResourceKind::AIFoundryHub).endpoint.as_deref(),
        Some("https://aihub-demo.cognitiveservices.azure.com/")
    );
    assert_eq!(resolution.descriptor(ResourceKind::DocumentIntelligence).name(), Some("docintel-demo"));
}

#[tokio::test]
async fn test_project_name_inferred_from_api_endpoint() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", None)
        .with_outputs(
            "azuredeploy-001",
            &[("aiFoundryProjectEndpoint", "https://aihub-demo.services.ai.azure.com/api/projects/proj-demo")],
        );
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();
    let project = resolution.descriptor(ResourceKind::AIFoundryProject);

    assert_eq!(project.name(), Some("proj-demo"));
    assert_eq!(project.resolved_via(), ResolvedVia::Derived);
    let project_type = ResourceKind::AIFoundryProject.spec().resource_type;
    assert!(!client.was_called(&format!("list_resources_by_type:{project_type}")));
}

#[tokio::test]
async fn test_latest_template_deployment_is_read() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-old", Some("2025-01-01T00:00:00Z"))
        .with_deployment("unrelated-app", Some("2025-06-01T00:00:00Z"))
        .with_deployment("azuredeploy-new", Some("2025-03-01T00:00:00Z"))
        .with_outputs("azuredeploy-old", &[("storageAccountName", "stold")])
        .with_outputs("azuredeploy-new", &[("storageAccountName", "stnew")]);
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();

    assert_eq!(resolution.deployment, "azuredeploy-new");
    assert_eq!(resolution.descriptor(ResourceKind::StorageAccount).name(), Some("stnew"));
    assert!(!client.was_called("deployment_outputs:azuredeploy-old"));
}

#[tokio::test]
async fn test_fallback_tier_only_sees_primary_gaps() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", None)
        .with_outputs("azuredeploy-001", &[("storageAccountName", "stdemo001")])
        .with_resource(ResourceKind::SearchService, "srch-a", None);
    let markers = markers();

    let primary = resolve_primary(&client, "rg-demo", &markers).await.unwrap();
    assert_eq!(primary[&ResourceKind::StorageAccount].name(), Some("stdemo001"));
    assert!(!primary[&ResourceKind::SearchService].is_resolved());

    let unresolved: BTreeSet<ResourceKind> =
        primary.values().filter(|d| !d.is_resolved()).map(|d| d.kind).collect();
    let fallback = resolve_fallback(&client, "rg-demo", &unresolved).await;

    assert!(!fallback.contains_key(&ResourceKind::StorageAccount));
    assert_eq!(fallback[&ResourceKind::SearchService].name(), Some("srch-a"));
    assert_eq!(fallback.len(), unresolved.len());
    assert!(!client.was_called(&storage_type()));
}

// ============================================================================
// Soft Failures
// ============================================================================

#[tokio::test]
async fn test_transient_listing_error_becomes_name_gap() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", None)
        .failing_listing(ResourceKind::CosmosDbAccount);
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();

    assert!(!resolution.descriptor(ResourceKind::CosmosDbAccount).is_resolved());
    assert!(resolution
        .gaps
        .iter()
        .any(|g| g.kind == ResourceKind::CosmosDbAccount && g.field == GapField::Name));
    assert_eq!(resolution.subscription_id, None);
}

#[tokio::test]
async fn test_missing_key_is_reported_not_fatal() {
    let client = FakeControlPlane::new()
        .with_deployment("azuredeploy-001", None)
        .with_outputs("azuredeploy-001", &[("storageAccountName", "stdemo001")]);
    let markers = markers();

    let resolution = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap();

    assert_eq!(resolution.descriptor(ResourceKind::StorageAccount).primary_key, None);
    assert!(resolution
        .gaps
        .iter()
        .any(|g| g.kind == ResourceKind::StorageAccount && g.field == GapField::Key));
}

// ============================================================================
// Fatal Paths
// ============================================================================

#[tokio::test]
async fn test_empty_group_is_rejected_before_any_call() {
    let client = FakeControlPlane::new();
    let markers = markers();

    let err = Resolver::new(&client, &markers).resolve("   ").await.unwrap_err();

    assert_eq!(err.error_code(), "INVALID_INPUT");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_enumeration_failure_is_fatal() {
    let client = FakeControlPlane::new().failing_deployments("AuthorizationFailed");
    let markers = markers();

    let err = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap_err();

    assert_eq!(err.error_code(), "DISCOVERY_FAILED");
    assert!(err.message().contains("AuthorizationFailed"));
}

#[tokio::test]
async fn test_group_without_template_deployment_is_fatal() {
    let client = FakeControlPlane::new().with_deployment("unrelated-app", Some("2025-01-01T00:00:00Z"));
    let markers = markers();

    let err = Resolver::new(&client, &markers).resolve("rg-demo").await.unwrap_err();

    assert_eq!(err.error_code(), "DEPLOYMENT_NOT_FOUND");
    assert!(!client.was_called("deployment_outputs:unrelated-app"));
}
