//! Environment Snapshot
//!
//! [`ResolvedEnvironment`] is the immutable, ordered set of variables one run
//! produces. [`materialize`] replaces the snapshot file with it: any previous
//! file is removed first and nothing from it is carried over.
//!
//! # File Format
//! One `KEY="value"` line per variable, in [`EnvKey::ALL`] order. Unresolved
//! values are written as `""`. A crash between removal and the end of the write
//! can leave a truncated file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::derive::{ArtifactKind, DerivedArtifacts};
use crate::error::{AzenvError, Result};
use crate::resolver::Resolution;
use crate::resource::ResourceKind;

/// Output variables, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKey {
    StorageAccountName,
    StorageAccountKey,
    StorageConnectionString,
    DocumentIntelligenceEndpoint,
    DocumentIntelligenceKey,
    LogAnalyticsWorkspaceName,
    SearchServiceName,
    SearchEndpoint,
    SearchAdminKey,
    ApiManagementName,
    ApiManagementGatewayUrl,
    KeyVaultName,
    KeyVaultUri,
    ContainerRegistryName,
    ContainerRegistryLoginServer,
    ApplicationInsightsName,
    ApplicationInsightsInstrumentationKey,
    AIFoundryHubName,
    AIFoundryProjectName,
    AIFoundryEndpoint,
    AIFoundryKey,
    AIFoundryHubEndpoint,
    AIFoundryProjectEndpoint,
    AzureAIConnectionId,
    CosmosEndpoint,
    CosmosKey,
    CosmosConnectionString,
    LegacyOpenAIServiceName,
    LegacyOpenAIEndpoint,
    LegacyOpenAIKey,
    LegacyOpenAIDeploymentName,
    ModelDeploymentName,
    EmbeddingModelDeploymentName,
}

impl EnvKey {
    pub const ALL: [Self; 33] = [
        Self::StorageAccountName,
        Self::StorageAccountKey,
        Self::StorageConnectionString,
        Self::DocumentIntelligenceEndpoint,
        Self::DocumentIntelligenceKey,
        Self::LogAnalyticsWorkspaceName,
        Self::SearchServiceName,
        Self::SearchEndpoint,
        Self::SearchAdminKey,
        Self::ApiManagementName,
        Self::ApiManagementGatewayUrl,
        Self::KeyVaultName,
        Self::KeyVaultUri,
        Self::ContainerRegistryName,
        Self::ContainerRegistryLoginServer,
        Self::ApplicationInsightsName,
        Self::ApplicationInsightsInstrumentationKey,
        Self::AIFoundryHubName,
        Self::AIFoundryProjectName,
        Self::AIFoundryEndpoint,
        Self::AIFoundryKey,
        Self::AIFoundryHubEndpoint,
        Self::AIFoundryProjectEndpoint,
        Self::AzureAIConnectionId,
        Self::CosmosEndpoint,
        Self::CosmosKey,
        Self::CosmosConnectionString,
        Self::LegacyOpenAIServiceName,
        Self::LegacyOpenAIEndpoint,
        Self::LegacyOpenAIKey,
        Self::LegacyOpenAIDeploymentName,
        Self::ModelDeploymentName,
        Self::EmbeddingModelDeploymentName,
    ];

    /// Variable name as written to the file
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StorageAccountName => "AZURE_STORAGE_ACCOUNT_NAME",
            Self::StorageAccountKey => "AZURE_STORAGE_ACCOUNT_KEY",
            Self::StorageConnectionString => "AZURE_STORAGE_CONNECTION_STRING",
            Self::DocumentIntelligenceEndpoint => "AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT",
            Self::DocumentIntelligenceKey => "AZURE_DOCUMENT_INTELLIGENCE_KEY",
            Self::LogAnalyticsWorkspaceName => "AZURE_LOG_ANALYTICS_WORKSPACE_NAME",
            Self::SearchServiceName => "AZURE_SEARCH_SERVICE_NAME",
            Self::SearchEndpoint => "AZURE_SEARCH_ENDPOINT",
            Self::SearchAdminKey => "AZURE_SEARCH_ADMIN_KEY",
            Self::ApiManagementName => "AZURE_API_MANAGEMENT_NAME",
            Self::ApiManagementGatewayUrl => "AZURE_API_MANAGEMENT_GATEWAY_URL",
            Self::KeyVaultName => "AZURE_KEY_VAULT_NAME",
            Self::KeyVaultUri => "AZURE_KEY_VAULT_URI",
            Self::ContainerRegistryName => "AZURE_CONTAINER_REGISTRY_NAME",
            Self::ContainerRegistryLoginServer => "AZURE_CONTAINER_REGISTRY_LOGIN_SERVER",
            Self::ApplicationInsightsName => "APPLICATIONINSIGHTS_NAME",
            Self::ApplicationInsightsInstrumentationKey => "APPLICATIONINSIGHTS_INSTRUMENTATION_KEY",
            Self::AIFoundryHubName => "AI_FOUNDRY_HUB_NAME",
            Self::AIFoundryProjectName => "AI_FOUNDRY_PROJECT_NAME",
            Self::AIFoundryEndpoint => "AI_FOUNDRY_ENDPOINT",
            Self::AIFoundryKey => "AI_FOUNDRY_KEY",
            Self::AIFoundryHubEndpoint => "AI_FOUNDRY_HUB_ENDPOINT",
            Self::AIFoundryProjectEndpoint => "AI_FOUNDRY_PROJECT_ENDPOINT",
            Self::AzureAIConnectionId => "AZURE_AI_CONNECTION_ID",
            Self::CosmosEndpoint => "COSMOS_ENDPOINT",
            Self::CosmosKey => "COSMOS_KEY",
            Self::CosmosConnectionString => "COSMOS_CONNECTION_STRING",
            Self::LegacyOpenAIServiceName => "AZURE_OPENAI_SERVICE_NAME",
            Self::LegacyOpenAIEndpoint => "AZURE_OPENAI_ENDPOINT",
            Self::LegacyOpenAIKey => "AZURE_OPENAI_KEY",
            Self::LegacyOpenAIDeploymentName => "AZURE_OPENAI_DEPLOYMENT_NAME",
            Self::ModelDeploymentName => "MODEL_DEPLOYMENT_NAME",
            Self::EmbeddingModelDeploymentName => "EMBEDDING_MODEL_DEPLOYMENT_NAME",
        }
    }
}

impl std::fmt::Display for EnvKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constant model deployment names written alongside the resolved values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDeployments {
    pub chat: String,
    pub embedding: String,
}

/// Every variable of one run, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    entries: Vec<(EnvKey, String)>,
}

impl ResolvedEnvironment {
    /// Fold descriptors, artifacts and model names into the variable set
    #[must_use]
    pub fn assemble(resolution: &Resolution, artifacts: &DerivedArtifacts, models: &ModelDeployments) -> Self {
        let entries = EnvKey::ALL
            .into_iter()
            .map(|key| (key, value_for(key, resolution, artifacts, models)))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[(EnvKey, String)] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, key: EnvKey) -> &str {
        self.entries.iter().find(|(k, _)| *k == key).map_or("", |(_, v)| v.as_str())
    }

    /// File contents: one `KEY="value"` line per variable
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}=\"{}\"\n", escape(value)))
            .collect()
    }
}

fn value_for(key: EnvKey, r: &Resolution, a: &DerivedArtifacts, models: &ModelDeployments) -> String {
    let d = |kind: ResourceKind| r.descriptor(kind);
    let name = |kind| d(kind).name_or_empty().to_string();
    let endpoint = |kind| d(kind).endpoint_or_empty().to_string();
    let key_of = |kind| d(kind).key_or_empty().to_string();

    match key {
        EnvKey::StorageAccountName => name(ResourceKind::StorageAccount),
        EnvKey::StorageAccountKey => key_of(ResourceKind::StorageAccount),
        EnvKey::StorageConnectionString => a.get(ArtifactKind::StorageConnectionString).to_string(),
        EnvKey::DocumentIntelligenceEndpoint => endpoint(ResourceKind::DocumentIntelligence),
        EnvKey::DocumentIntelligenceKey => key_of(ResourceKind::DocumentIntelligence),
        EnvKey::LogAnalyticsWorkspaceName => name(ResourceKind::LogAnalyticsWorkspace),
        EnvKey::SearchServiceName => name(ResourceKind::SearchService),
        EnvKey::SearchEndpoint => endpoint(ResourceKind::SearchService),
        EnvKey::SearchAdminKey => key_of(ResourceKind::SearchService),
        EnvKey::ApiManagementName => name(ResourceKind::ApiManagement),
        EnvKey::ApiManagementGatewayUrl => endpoint(ResourceKind::ApiManagement),
        EnvKey::KeyVaultName => name(ResourceKind::KeyVault),
        EnvKey::KeyVaultUri => endpoint(ResourceKind::KeyVault),
        EnvKey::ContainerRegistryName => name(ResourceKind::ContainerRegistry),
        EnvKey::ContainerRegistryLoginServer => endpoint(ResourceKind::ContainerRegistry),
        EnvKey::ApplicationInsightsName => name(ResourceKind::ApplicationInsights),
        EnvKey::ApplicationInsightsInstrumentationKey => key_of(ResourceKind::ApplicationInsights),
        EnvKey::AIFoundryHubName | EnvKey::LegacyOpenAIServiceName => name(ResourceKind::AIFoundryHub),
        EnvKey::AIFoundryProjectName => name(ResourceKind::AIFoundryProject),
        EnvKey::AIFoundryEndpoint | EnvKey::LegacyOpenAIEndpoint => endpoint(ResourceKind::AIFoundryHub),
        EnvKey::AIFoundryKey | EnvKey::LegacyOpenAIKey => key_of(ResourceKind::AIFoundryHub),
        EnvKey::AIFoundryHubEndpoint => a.get(ArtifactKind::AIFoundryHubEndpoint).to_string(),
        EnvKey::AIFoundryProjectEndpoint => a.get(ArtifactKind::AIFoundryProjectEndpoint).to_string(),
        EnvKey::AzureAIConnectionId => a.get(ArtifactKind::AzureAIConnectionId).to_string(),
        EnvKey::CosmosEndpoint => endpoint(ResourceKind::CosmosDbAccount),
        EnvKey::CosmosKey => key_of(ResourceKind::CosmosDbAccount),
        EnvKey::CosmosConnectionString => a.get(ArtifactKind::CosmosConnectionString).to_string(),
        EnvKey::LegacyOpenAIDeploymentName | EnvKey::ModelDeploymentName => models.chat.clone(),
        EnvKey::EmbeddingModelDeploymentName => models.embedding.clone(),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Replace the snapshot at `path` with `env`
///
/// The previous file is removed before anything is written; a missing file is fine.
pub fn materialize(env: &ResolvedEnvironment, path: &Path) -> Result<()> {
    let shown = path.display().to_string();

    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("removed previous snapshot {shown}"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(AzenvError::snapshot_write(&shown, e.to_string())),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AzenvError::snapshot_write(&shown, e.to_string()))?;
    }

    fs::write(path, env.render())
        .map_err(|e| AzenvError::snapshot_write(&shown, e.to_string()))?;
    tracing::info!("wrote {} variables to {shown}", env.entries().len());
    Ok(())
}
