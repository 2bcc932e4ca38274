//! Resource Kinds and Descriptors
//!
//! This module defines the closed set of resource kinds azenv resolves and the
//! per-kind descriptor that accumulates a resource's name, endpoint and key.
//!
//! # Catalog
//! Each [`ResourceKind`] carries a static [`KindSpec`]: the ARM resource type
//! used for type discovery, an optional `kind` attribute filter, the deployment
//! output names it is published under, and how its endpoint and key are fetched.

use serde::{Deserialize, Serialize};

/// Provisioned resource kinds, in summary order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    StorageAccount,
    LogAnalyticsWorkspace,
    SearchService,
    ApiManagement,
    AIFoundryHub,
    AIFoundryProject,
    KeyVault,
    ContainerRegistry,
    ApplicationInsights,
    DocumentIntelligence,
    CosmosDbAccount,
}

/// How a resource's key is obtained after its name is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The kind carries no key
    None,
    /// A list-keys call against the control plane
    ListKeys,
    /// A property of the resource's `show` document
    Property(&'static str),
}

/// Static description of a resource kind
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    /// ARM resource type used for type discovery
    pub resource_type: &'static str,
    /// Required value of the resource's `kind` attribute, if the type is shared
    pub kind_filter: Option<&'static str>,
    /// Deployment output carrying the resource name
    pub name_output: &'static str,
    /// Deployment output carrying the resource endpoint
    pub endpoint_output: Option<&'static str>,
    /// Property of the `show` document that holds the endpoint
    pub endpoint_property: Option<&'static str>,
    /// Well-known endpoint template; `{name}` is replaced by the resource name
    pub endpoint_template: Option<&'static str>,
    /// Where the key comes from
    pub key_source: KeySource,
}

impl ResourceKind {
    /// Every kind, in the fixed order used for resolution and reporting
    pub const ALL: [Self; 11] = [
        Self::StorageAccount,
        Self::LogAnalyticsWorkspace,
        Self::SearchService,
        Self::ApiManagement,
        Self::AIFoundryHub,
        Self::AIFoundryProject,
        Self::KeyVault,
        Self::ContainerRegistry,
        Self::ApplicationInsights,
        Self::DocumentIntelligence,
        Self::CosmosDbAccount,
    ];

    /// Stable identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StorageAccount => "storage_account",
            Self::LogAnalyticsWorkspace => "log_analytics_workspace",
            Self::SearchService => "search_service",
            Self::ApiManagement => "api_management",
            Self::AIFoundryHub => "ai_foundry_hub",
            Self::AIFoundryProject => "ai_foundry_project",
            Self::KeyVault => "key_vault",
            Self::ContainerRegistry => "container_registry",
            Self::ApplicationInsights => "application_insights",
            Self::DocumentIntelligence => "document_intelligence",
            Self::CosmosDbAccount => "cosmos_db_account",
        }
    }

    /// Human-readable service name for the console summary
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::StorageAccount => "Storage Account",
            Self::LogAnalyticsWorkspace => "Log Analytics Workspace",
            Self::SearchService => "Search Service",
            Self::ApiManagement => "API Management",
            Self::AIFoundryHub => "AI Foundry Hub",
            Self::AIFoundryProject => "AI Foundry Project",
            Self::KeyVault => "Key Vault",
            Self::ContainerRegistry => "Container Registry",
            Self::ApplicationInsights => "Application Insights",
            Self::DocumentIntelligence => "Document Intelligence",
            Self::CosmosDbAccount => "Cosmos DB",
        }
    }

    /// Static catalog entry for this kind
    #[must_use]
    pub const fn spec(&self) -> KindSpec {
        match self {
            Self::StorageAccount => KindSpec {
                resource_type: "Microsoft.Storage/storageAccounts",
                kind_filter: None,
                name_output: "storageAccountName",
                endpoint_output: None,
                endpoint_property: None,
                endpoint_template: None,
                key_source: KeySource::ListKeys,
            },
            Self::LogAnalyticsWorkspace => KindSpec {
                resource_type: "Microsoft.OperationalInsights/workspaces",
                kind_filter: None,
                name_output: "logAnalyticsWorkspaceName",
                endpoint_output: None,
                endpoint_property: None,
                endpoint_template: None,
                key_source: KeySource::None,
            },
            Self::SearchService => KindSpec {
                resource_type: "Microsoft.Search/searchServices",
                kind_filter: None,
                name_output: "searchServiceName",
                endpoint_output: Some("searchServiceEndpoint"),
                endpoint_property: None,
                endpoint_template: Some("https://{name}.search.windows.net"),
                key_source: KeySource::ListKeys,
            },
            Self::ApiManagement => KindSpec {
                resource_type: "Microsoft.ApiManagement/service",
                kind_filter: None,
                name_output: "apiManagementName",
                endpoint_output: Some("apiManagementGatewayUrl"),
                endpoint_property: Some("gatewayUrl"),
                endpoint_template: Some("https://{name}.azure-api.net"),
                key_source: KeySource::None,
            },
            Self::AIFoundryHub => KindSpec {
                resource_type: "Microsoft.CognitiveServices/accounts",
                kind_filter: Some("AIServices"),
                name_output: "aiFoundryHubName",
                endpoint_output: Some("aiFoundryEndpoint"),
                endpoint_property: Some("endpoint"),
                endpoint_template: None,
                key_source: KeySource::ListKeys,
            },
            Self::AIFoundryProject => KindSpec {
                resource_type: "Microsoft.CognitiveServices/accounts/projects",
                kind_filter: None,
                name_output: "aiFoundryProjectName",
                endpoint_output: Some("aiFoundryProjectEndpoint"),
                endpoint_property: None,
                endpoint_template: None,
                key_source: KeySource::None,
            },
            Self::KeyVault => KindSpec {
                resource_type: "Microsoft.KeyVault/vaults",
                kind_filter: None,
                name_output: "keyVaultName",
                endpoint_output: Some("keyVaultUri"),
                endpoint_property: Some("vaultUri"),
                endpoint_template: Some("https://{name}.vault.azure.net/"),
                key_source: KeySource::None,
            },
            Self::ContainerRegistry => KindSpec {
                resource_type: "Microsoft.ContainerRegistry/registries",
                kind_filter: None,
                name_output: "containerRegistryName",
                endpoint_output: Some("containerRegistryLoginServer"),
                endpoint_property: Some("loginServer"),
                endpoint_template: Some("{name}.azurecr.io"),
                key_source: KeySource::None,
            },
            Self::ApplicationInsights => KindSpec {
                resource_type: "Microsoft.Insights/components",
                kind_filter: None,
                name_output: "applicationInsightsName",
                endpoint_output: None,
                endpoint_property: None,
                endpoint_template: None,
                key_source: KeySource::Property("InstrumentationKey"),
            },
            Self::DocumentIntelligence => KindSpec {
                resource_type: "Microsoft.CognitiveServices/accounts",
                kind_filter: Some("FormRecognizer"),
                name_output: "documentIntelligenceName",
                endpoint_output: Some("documentIntelligenceEndpoint"),
                endpoint_property: Some("endpoint"),
                endpoint_template: None,
                key_source: KeySource::ListKeys,
            },
            Self::CosmosDbAccount => KindSpec {
                resource_type: "Microsoft.DocumentDB/databaseAccounts",
                kind_filter: None,
                name_output: "cosmosDbAccountName",
                endpoint_output: Some("cosmosDbEndpoint"),
                endpoint_property: Some("documentEndpoint"),
                endpoint_template: None,
                key_source: KeySource::ListKeys,
            },
        }
    }

    /// Whether a discovered resource's `kind` attribute satisfies this kind's filter.
    ///
    /// Kinds without a filter accept anything. The comparison ignores case
    /// because the control plane is not consistent about it.
    #[must_use]
    pub fn accepts(&self, resource_kind: Option<&str>) -> bool {
        match self.spec().kind_filter {
            None => true,
            Some(expected) => resource_kind.is_some_and(|k| k.eq_ignore_ascii_case(expected)),
        }
    }

    /// Fill the kind's well-known endpoint template with a resource name
    #[must_use]
    pub fn default_endpoint(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        self.spec().endpoint_template.map(|t| t.replace("{name}", name))
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Which source produced a descriptor's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    DeploymentOutput,
    TypeDiscovery,
    Derived,
    Unresolved,
}

impl ResolvedVia {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeploymentOutput => "deployment output",
            Self::TypeDiscovery => "type discovery",
            Self::Derived => "derived",
            Self::Unresolved => "unresolved",
        }
    }
}

/// Resolved state of one resource kind
///
/// The name is set together with `resolved_via` through [`ResourceDescriptor::resolved`];
/// an unresolved descriptor never carries a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    name: Option<String>,
    pub endpoint: Option<String>,
    /// WARNING: Sensitive data, do not log or include in the summary
    #[serde(skip_serializing)]
    pub primary_key: Option<String>,
    resolved_via: ResolvedVia,
}

impl ResourceDescriptor {
    /// A descriptor nothing has resolved yet
    #[must_use]
    pub const fn unresolved(kind: ResourceKind) -> Self {
        Self {
            kind,
            name: None,
            endpoint: None,
            primary_key: None,
            resolved_via: ResolvedVia::Unresolved,
        }
    }

    /// A descriptor whose name came from `via`
    ///
    /// An empty name yields an unresolved descriptor.
    #[must_use]
    pub fn resolved(kind: ResourceKind, name: impl Into<String>, via: ResolvedVia) -> Self {
        let name = name.into();
        if name.is_empty() || via == ResolvedVia::Unresolved {
            return Self::unresolved(kind);
        }
        Self {
            kind,
            name: Some(name),
            endpoint: None,
            primary_key: None,
            resolved_via: via,
        }
    }

    /// Attach an endpoint (empty values are ignored)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|e| !e.is_empty());
        self
    }

    /// Attach a key (empty values are ignored)
    #[must_use]
    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.primary_key = key.filter(|k| !k.is_empty());
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn resolved_via(&self) -> ResolvedVia {
        self.resolved_via
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.name.is_some()
    }

    /// Name, or empty string when unresolved
    #[must_use]
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Endpoint, or empty string when absent
    #[must_use]
    pub fn endpoint_or_empty(&self) -> &str {
        self.endpoint.as_deref().unwrap_or("")
    }

    /// Key, or empty string when absent
    #[must_use]
    pub fn key_or_empty(&self) -> &str {
        self.primary_key.as_deref().unwrap_or("")
    }
}
