//! Derivation Engine
//!
//! Builds the composite values no single lookup returns: connection strings,
//! the AI Search connection id and the AI Foundry endpoints.
//!
//! Every artifact is produced by a named [`Template`] that declares its inputs.
//! [`Template::render`] returns the empty string when any input is empty, so a
//! partially interpolated value can never be produced.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resolver::Resolution;
use crate::resource::ResourceKind;

/// Composite values computed from resolved descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ArtifactKind {
    StorageConnectionString,
    CosmosConnectionString,
    AzureAIConnectionId,
    AIFoundryHubEndpoint,
    AIFoundryProjectEndpoint,
}

impl ArtifactKind {
    pub const ALL: [Self; 5] = [
        Self::StorageConnectionString,
        Self::CosmosConnectionString,
        Self::AzureAIConnectionId,
        Self::AIFoundryHubEndpoint,
        Self::AIFoundryProjectEndpoint,
    ];

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::StorageConnectionString => "Storage connection string",
            Self::CosmosConnectionString => "Cosmos DB connection string",
            Self::AzureAIConnectionId => "AI Search connection id",
            Self::AIFoundryHubEndpoint => "AI Foundry hub endpoint",
            Self::AIFoundryProjectEndpoint => "AI Foundry project endpoint",
        }
    }
}

/// A string template with named `{placeholders}`, all of them required
///
/// `guards` are further required inputs that gate the template without being
/// interpolated into it.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pattern: &'static str,
    inputs: &'static [&'static str],
    guards: &'static [&'static str],
}

impl Template {
    /// Every input name that must be non-empty
    pub fn required(&self) -> impl Iterator<Item = &'static str> {
        self.inputs.iter().chain(self.guards).copied()
    }

    /// Fill every placeholder, or return the empty string if any value is
    /// missing or empty
    #[must_use]
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let value_of = |input: &str| {
            values.iter().find(|(k, _)| *k == input).map(|(_, v)| v.trim()).filter(|v| !v.is_empty())
        };
        if self.required().any(|input| value_of(input).is_none()) {
            return String::new();
        }

        let mut rendered = self.pattern.to_string();
        for &input in self.inputs {
            if let Some(v) = value_of(input) {
                rendered = rendered.replace(&format!("{{{input}}}"), v);
            }
        }
        rendered
    }
}

pub const STORAGE_CONNECTION_STRING: Template = Template {
    pattern: "DefaultEndpointsProtocol=https;AccountName={name};AccountKey={key};EndpointSuffix={suffix}",
    inputs: &["name", "key", "suffix"],
    guards: &[],
};

pub const COSMOS_CONNECTION_STRING: Template = Template {
    pattern: "AccountEndpoint={endpoint};AccountKey={key};",
    inputs: &["endpoint", "key"],
    guards: &[],
};

/// Without a search service there is no connection to point at
pub const AI_SEARCH_CONNECTION_ID: Template = Template {
    pattern: "/subscriptions/{subscription}/resourceGroups/{group}/providers/Microsoft.CognitiveServices/accounts/{hub}/connections/{hub}-aisearch",
    inputs: &["subscription", "group", "hub"],
    guards: &["search"],
};

pub const AI_FOUNDRY_HUB_ENDPOINT: Template = Template {
    pattern: "https://ai.azure.com/resource/overview?wsid=/subscriptions/{subscription}/resourceGroups/{group}/providers/Microsoft.CognitiveServices/accounts/{hub}",
    inputs: &["subscription", "group", "hub"],
    guards: &[],
};

pub const AI_FOUNDRY_PROJECT_ENDPOINT: Template = Template {
    pattern: "https://{hub}.services.ai.azure.com/api/projects/{project}",
    inputs: &["hub", "project"],
    guards: &[],
};

/// Derived artifacts of one resolution; absent artifacts are empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedArtifacts {
    values: BTreeMap<ArtifactKind, String>,
}

impl DerivedArtifacts {
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> &str {
        self.values.get(&kind).map_or("", String::as_str)
    }

    /// Artifacts whose inputs were incomplete
    #[must_use]
    pub fn skipped(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL.into_iter().filter(|k| self.get(*k).is_empty()).collect()
    }
}

/// Compute every derived artifact from a resolution
///
/// Pure: the same resolution always yields the same artifacts.
#[must_use]
pub fn derive(resolution: &Resolution, storage_suffix: &str) -> DerivedArtifacts {
    let storage = resolution.descriptor(ResourceKind::StorageAccount);
    let cosmos = resolution.descriptor(ResourceKind::CosmosDbAccount);
    let search = resolution.descriptor(ResourceKind::SearchService);
    let hub = resolution.descriptor(ResourceKind::AIFoundryHub);
    let project = resolution.descriptor(ResourceKind::AIFoundryProject);
    let subscription = resolution.subscription_id.as_deref().unwrap_or("");
    let group = resolution.group.as_str();

    let mut values = BTreeMap::new();
    values.insert(
        ArtifactKind::StorageConnectionString,
        STORAGE_CONNECTION_STRING.render(&[
            ("name", storage.name_or_empty()),
            ("key", storage.key_or_empty()),
            ("suffix", storage_suffix),
        ]),
    );
    values.insert(
        ArtifactKind::CosmosConnectionString,
        COSMOS_CONNECTION_STRING.render(&[
            ("endpoint", cosmos.endpoint_or_empty()),
            ("key", cosmos.key_or_empty()),
        ]),
    );
    values.insert(
        ArtifactKind::AzureAIConnectionId,
        AI_SEARCH_CONNECTION_ID.render(&[
            ("subscription", subscription),
            ("group", group),
            ("hub", hub.name_or_empty()),
            ("search", search.name_or_empty()),
        ]),
    );
    values.insert(
        ArtifactKind::AIFoundryHubEndpoint,
        AI_FOUNDRY_HUB_ENDPOINT.render(&[
            ("subscription", subscription),
            ("group", group),
            ("hub", hub.name_or_empty()),
        ]),
    );
    values.insert(
        ArtifactKind::AIFoundryProjectEndpoint,
        project_endpoint(project.endpoint.as_deref(), hub.name_or_empty(), project.name_or_empty()),
    );

    DerivedArtifacts { values }
}

/// Project endpoint from the hub and project names
///
/// Empty unless both names are known. A published endpoint is kept only when it
/// has the API shape; anything else is rebuilt from the API template.
#[must_use]
pub fn project_endpoint(published: Option<&str>, hub: &str, project: &str) -> String {
    let rebuilt = AI_FOUNDRY_PROJECT_ENDPOINT.render(&[("hub", hub), ("project", project)]);
    if rebuilt.is_empty() {
        return rebuilt;
    }
    match published.map(str::trim) {
        Some(endpoint) if is_api_project_endpoint(endpoint) => endpoint.to_string(),
        Some(endpoint) => {
            if is_browser_overview_url(endpoint) {
                tracing::info!("replacing browser project URL with API endpoint");
            }
            rebuilt
        }
        None => rebuilt,
    }
}

const API_HOST_SUFFIX: &str = ".services.ai.azure.com";

/// Portal-style URL meant for a browser, never for an SDK client
#[must_use]
pub fn is_browser_overview_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    let host = host_of(&lower);
    matches!(host, "ai.azure.com" | "ml.azure.com" | "portal.azure.com")
        || lower.contains("wsid=")
        || lower.contains("/overview")
}

/// `https://<hub>.services.ai.azure.com/api/projects/<project>`
#[must_use]
pub fn is_api_project_endpoint(url: &str) -> bool {
    !is_browser_overview_url(url) && project_name_from_endpoint(url).is_some()
}

/// Project name embedded in an API-shaped project endpoint
#[must_use]
pub fn project_name_from_endpoint(url: &str) -> Option<&str> {
    let trimmed = url.trim();
    if !trimmed.starts_with("https://") || is_browser_overview_url(trimmed) {
        return None;
    }
    if !host_of(trimmed).to_ascii_lowercase().ends_with(API_HOST_SUFFIX) {
        return None;
    }
    let (_, rest) = trimmed.split_once("/api/projects/")?;
    let name = rest.split(['/', '?', '#']).next()?;
    (!name.is_empty()).then_some(name)
}

fn host_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme.split(['/', '?', '#']).next().unwrap_or("")
}
