//! azenv - Azure Resource Environment Resolver
//!
//! azenv resolves the resources a provisioning template created in one resource
//! group and writes their names, endpoints and keys to a `.env` snapshot.
//!
//! # Pipeline
//! 1. [`resolver`]: deployment outputs first, type discovery for the gaps,
//!    then endpoints and keys for every resolved name
//! 2. [`derive`]: connection strings, ids and endpoints built from templates
//! 3. [`environment`]: the ordered variable set, written over the snapshot
//! 4. [`output`]: the console summary
//!
//! Only an invalid group, a failed deployment enumeration, a group without a
//! template deployment, or a failed write end a run with an error. Everything
//! else is a soft gap: the value is written empty and reported.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`resource`] - Resource kinds and descriptors
//! - [`control_plane`] - Control-plane trait and the Azure CLI client
//! - [`config`] - Configuration management

pub mod config;
pub mod control_plane;
pub mod derive;
pub mod environment;
pub mod error;
pub mod output;
pub mod resolver;
pub mod resource;

pub use config::{resolve_settings, Settings, SettingsFile};
pub use control_plane::{az::AzCli, ControlPlane, Lookup};
pub use derive::{ArtifactKind, DerivedArtifacts};
pub use environment::{materialize, EnvKey, ModelDeployments, ResolvedEnvironment};
pub use error::{AzenvError, Result};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, RunReport, SuccessEnvelope};
pub use resolver::{Resolution, Resolver};
pub use resource::{ResolvedVia, ResourceDescriptor, ResourceKind};

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub environment: ResolvedEnvironment,
}

/// Resolve a group, derive its artifacts and write the snapshot
pub async fn run<C: ControlPlane + Sync>(client: &C, group: &str, settings: &Settings) -> Result<RunOutcome> {
    let resolution = Resolver::new(client, &settings.template_markers).resolve(group).await?;
    let artifacts = derive::derive(&resolution, &settings.storage_endpoint_suffix);
    let environment = ResolvedEnvironment::assemble(&resolution, &artifacts, &settings.models);

    materialize(&environment, &settings.output_path)?;

    let report = RunReport::new(&resolution, &artifacts, &settings.output_path);
    Ok(RunOutcome {
        report,
        environment,
    })
}
