//! Fallback Resolver
//!
//! Type discovery for kinds the deployment outputs did not name. The first
//! listed resource accepted by the kind's filter wins. When several resources
//! of one kind coexist, the pick depends on the control plane's list order.

use std::collections::{BTreeMap, BTreeSet};

use crate::control_plane::ControlPlane;
use crate::resolver::{strategies, Strategy};
use crate::resource::{ResolvedVia, ResourceDescriptor, ResourceKind};

/// `TypeDiscovery` strategy for one kind
pub async fn discover<C: ControlPlane>(
    client: &C,
    group: &str,
    kind: ResourceKind,
) -> Option<ResourceDescriptor> {
    let spec = kind.spec();
    let resources = client
        .list_resources_by_type(group, spec.resource_type)
        .await
        .collapse(&format!("{kind}: list {}", spec.resource_type))?;

    let first = resources.into_iter().find(|r| kind.accepts(r.kind.as_deref()))?;
    let name = child_name(&first.name);
    Some(ResourceDescriptor::resolved(kind, name, ResolvedVia::TypeDiscovery))
        .filter(ResourceDescriptor::is_resolved)
}

/// Run type discovery for each unresolved kind whose table allows it
///
/// Kinds with no match are returned unresolved.
pub async fn resolve_fallback<C: ControlPlane>(
    client: &C,
    group: &str,
    unresolved: &BTreeSet<ResourceKind>,
) -> BTreeMap<ResourceKind, ResourceDescriptor> {
    let mut resolved = BTreeMap::new();
    for &kind in unresolved {
        let found = if strategies(kind).contains(&Strategy::TypeDiscovery) {
            discover(client, group, kind).await
        } else {
            None
        };
        let descriptor = match found {
            Some(descriptor) => {
                tracing::debug!("{kind}: resolved via {}", descriptor.resolved_via().as_str());
                descriptor
            }
            None => {
                tracing::warn!("{kind}: not found in '{group}'");
                ResourceDescriptor::unresolved(kind)
            }
        };
        resolved.insert(kind, descriptor);
    }
    resolved
}

/// Child resources list as `parent/child`; keep the child segment
fn child_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
