//! Candidate filtering with single-level degradation.
//!
//! Partitions the candidate list into the decided cohort. When the decided
//! cohort turns out to be empty the other cohort is used instead, so a
//! transiently empty cohort degrades the routing guarantee instead of
//! failing the call. When both cohorts are empty the outcome is an empty
//! selection with an unresolved group; the final selection stage falls back
//! to the full candidate list from there.

use crate::context::WILDCARD_GROUP;
use crate::directory::CohortDirectory;
use crate::endpoint::EndpointInfo;
use crate::metrics_defs::{ENDPOINT_METADATA_ERROR, FILTER_DEGRADED, LOOKUP_FAILED};
use shared::counter;

/// Result of one filtering pass.
///
/// `group` is what gets stamped onto the call context: the canary group the
/// selection actually landed on, or the empty string for the stable cohort
/// (and for the nothing-left outcome).
#[derive(Debug)]
pub struct FilterOutcome<'a, E> {
    pub selected: Vec<&'a E>,
    pub group: String,
}

/// Partitions `candidates` according to the cohort decision, degrading to
/// the opposite cohort when the decided one is empty.
pub fn partition<'a, D, E>(
    directory: &D,
    candidates: &'a [E],
    gray: bool,
    tenant: Option<&str>,
    consumer_application: &str,
) -> FilterOutcome<'a, E>
where
    D: CohortDirectory,
    E: EndpointInfo,
{
    if gray {
        partition_gray(directory, candidates, tenant, consumer_application)
    } else {
        partition_formal(directory, candidates, tenant, consumer_application)
    }
}

fn partition_gray<'a, D, E>(
    directory: &D,
    candidates: &'a [E],
    tenant: Option<&str>,
    consumer_application: &str,
) -> FilterOutcome<'a, E>
where
    D: CohortDirectory,
    E: EndpointInfo,
{
    let group = resolved_group(directory, tenant, consumer_application);

    let selected = canary_members(candidates, &group);
    if !selected.is_empty() {
        return FilterOutcome { selected, group };
    }

    // No canary endpoint for this group (or the group never resolved):
    // degrade to the stable cohort.
    counter!(FILTER_DEGRADED).increment(1);
    tracing::warn!(
        group,
        consumer_application,
        "canary cohort is empty, degrading to stable endpoints"
    );
    FilterOutcome {
        selected: stable_members(candidates),
        group: String::new(),
    }
}

fn partition_formal<'a, D, E>(
    directory: &D,
    candidates: &'a [E],
    tenant: Option<&str>,
    consumer_application: &str,
) -> FilterOutcome<'a, E>
where
    D: CohortDirectory,
    E: EndpointInfo,
{
    let selected = stable_members(candidates);
    if !selected.is_empty() {
        return FilterOutcome {
            selected,
            group: String::new(),
        };
    }

    // Only canary endpoints are deployed for this provider: degrade onto
    // them so the call still completes, and tag the call with their group so
    // the provider-side group match holds.
    counter!(FILTER_DEGRADED).increment(1);
    let group = resolved_group(directory, tenant, consumer_application);
    tracing::warn!(
        group,
        consumer_application,
        "stable cohort is empty, degrading to canary endpoints"
    );

    let selected = canary_members(candidates, &group);
    if selected.is_empty() {
        return FilterOutcome {
            selected,
            group: String::new(),
        };
    }
    FilterOutcome { selected, group }
}

/// Canary group for this call, or empty when unresolved. A wildcard answer
/// is treated as unresolved so it can never leak into attachments.
fn resolved_group<D: CohortDirectory>(
    directory: &D,
    tenant: Option<&str>,
    consumer_application: &str,
) -> String {
    match directory.resolve_group(tenant, consumer_application) {
        Ok(group) if group == WILDCARD_GROUP => String::new(),
        Ok(group) => group,
        Err(err) => {
            counter!(LOOKUP_FAILED).increment(1);
            tracing::error!(
                consumer_application,
                error = %err,
                "canary group resolution failed, treating as unresolved"
            );
            String::new()
        }
    }
}

/// Endpoints tagged with `group` (case-insensitive). Empty `group` matches
/// nothing: an untagged endpoint is stable, not "in the unnamed group".
fn canary_members<'a, E: EndpointInfo>(candidates: &'a [E], group: &str) -> Vec<&'a E> {
    if group.is_empty() {
        return Vec::new();
    }
    candidates
        .iter()
        .filter(|endpoint| match endpoint.group_tag() {
            Ok(tag) => !tag.is_empty() && tag.eq_ignore_ascii_case(group),
            Err(err) => {
                exclude(err);
                false
            }
        })
        .collect()
}

/// Endpoints with no cohort tag.
fn stable_members<'a, E: EndpointInfo>(candidates: &'a [E]) -> Vec<&'a E> {
    candidates
        .iter()
        .filter(|endpoint| match endpoint.group_tag() {
            Ok(tag) => tag.is_empty(),
            Err(err) => {
                exclude(err);
                false
            }
        })
        .collect()
}

fn exclude(err: crate::endpoint::MetadataError) {
    counter!(ENDPOINT_METADATA_ERROR).increment(1);
    tracing::error!(error = %err, "skipping endpoint with unreadable metadata");
}
