//! Secret & Endpoint Fetcher
//!
//! For each resolved descriptor, fills the endpoint and key its kind carries
//! but the name lookup did not provide. Every read is independent and
//! best-effort. A kind with a well-known endpoint template falls back to it
//! when no endpoint could be read.

use std::collections::BTreeMap;

use crate::control_plane::{ControlPlane, ResourceDetails};
use crate::resolver::{GapField, ResolutionGap};
use crate::resource::{KeySource, ResourceDescriptor, ResourceKind};

/// Enrich resolved descriptors with endpoints and keys
///
/// Returns the enriched descriptors and the endpoint/key gaps encountered.
pub async fn enrich<C: ControlPlane>(
    client: &C,
    group: &str,
    descriptors: BTreeMap<ResourceKind, ResourceDescriptor>,
) -> (BTreeMap<ResourceKind, ResourceDescriptor>, Vec<ResolutionGap>) {
    let mut enriched = BTreeMap::new();
    let mut gaps = Vec::new();

    for (kind, descriptor) in descriptors {
        let descriptor = if descriptor.is_resolved() {
            enrich_one(client, group, descriptor, &mut gaps).await
        } else {
            descriptor
        };
        enriched.insert(kind, descriptor);
    }

    (enriched, gaps)
}

async fn enrich_one<C: ControlPlane>(
    client: &C,
    group: &str,
    mut descriptor: ResourceDescriptor,
    gaps: &mut Vec<ResolutionGap>,
) -> ResourceDescriptor {
    let kind = descriptor.kind;
    let spec = kind.spec();
    let name = descriptor.name_or_empty().to_string();

    let wants_details = (descriptor.endpoint.is_none() && spec.endpoint_property.is_some())
        || matches!(spec.key_source, KeySource::Property(_));
    let details = if wants_details {
        client.show_resource(group, kind, &name).await.collapse(&format!("{kind}: show '{name}'"))
    } else {
        None
    };

    if descriptor.endpoint.is_none() {
        let fetched = spec
            .endpoint_property
            .and_then(|property| details.as_ref().and_then(|d| d.property(property)));
        descriptor.endpoint = fetched.or_else(|| kind.default_endpoint(&name));
        if descriptor.endpoint.is_none() && expects_endpoint(kind) {
            gaps.push(ResolutionGap {
                kind,
                field: GapField::Endpoint,
            });
        }
    }

    if descriptor.primary_key.is_some() {
        return descriptor;
    }
    descriptor.primary_key = match spec.key_source {
        KeySource::None => None,
        KeySource::ListKeys => client
            .list_resource_keys(group, kind, &name)
            .await
            .collapse(&format!("{kind}: keys of '{name}'"))
            .map(|keys| keys.primary),
        KeySource::Property(property) => details.as_ref().and_then(|d: &ResourceDetails| d.property(property)),
    };
    if descriptor.primary_key.is_none() && spec.key_source != KeySource::None {
        gaps.push(ResolutionGap {
            kind,
            field: GapField::Key,
        });
    }

    descriptor
}

/// Kinds whose endpoint ends up in the snapshot
fn expects_endpoint(kind: ResourceKind) -> bool {
    let spec = kind.spec();
    spec.endpoint_property.is_some() || spec.endpoint_template.is_some()
}
