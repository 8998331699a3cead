//! Cohort decision policy.
//!
//! Decides gray vs. formal for one call. Precedence: an interface forced
//! into the canary cohort wins outright; otherwise tenant identity decides
//! when present, and the calling machine's own cohort membership decides for
//! identity-less service-to-service hops. Lookup failures never surface to
//! the caller; they count as "not canary".

use crate::context::CallContext;
use crate::directory::CohortDirectory;
use crate::metrics_defs::{DECISION_FORMAL, DECISION_GRAY, LOOKUP_FAILED};
use shared::counter;

/// Decision for a call that may carry a tenant identity.
///
/// An empty `tenant` means the identity is absent, in which case only the
/// forced-interface list applies.
pub fn decide_with_tenant<D: CohortDirectory>(
    directory: &D,
    context: &CallContext,
    tenant: &str,
    provider_application: &str,
) -> bool {
    let gray = if tenant.is_empty() {
        interface_forced_gray(directory, context.interface())
    } else {
        interface_forced_gray(directory, context.interface())
            || tenant_in_cohort(directory, tenant, provider_application)
    };
    record(gray);
    gray
}

/// Decision for an identity-less service-to-service hop: forced interfaces
/// first, then "this calling instance is itself canary".
pub fn decide_by_topology<D: CohortDirectory>(directory: &D, context: &CallContext) -> bool {
    let gray = interface_forced_gray(directory, context.interface())
        || machine_in_cohort(directory, context.consumer_application());
    record(gray);
    gray
}

fn record(gray: bool) {
    if gray {
        counter!(DECISION_GRAY).increment(1);
    } else {
        counter!(DECISION_FORMAL).increment(1);
    }
}

fn interface_forced_gray<D: CohortDirectory>(directory: &D, interface: &str) -> bool {
    match directory.is_interface_forced_gray(interface) {
        Ok(forced) => forced,
        Err(err) => {
            counter!(LOOKUP_FAILED).increment(1);
            tracing::error!(
                interface,
                error = %err,
                "forced-gray interface lookup failed, treating as not forced"
            );
            false
        }
    }
}

fn tenant_in_cohort<D: CohortDirectory>(
    directory: &D,
    tenant: &str,
    provider_application: &str,
) -> bool {
    match directory.is_tenant_in_cohort(tenant, provider_application) {
        Ok(in_cohort) => in_cohort,
        Err(err) => {
            counter!(LOOKUP_FAILED).increment(1);
            tracing::error!(
                tenant,
                provider_application,
                error = %err,
                "tenant cohort lookup failed, routing to the stable cohort"
            );
            false
        }
    }
}

fn machine_in_cohort<D: CohortDirectory>(directory: &D, consumer_application: &str) -> bool {
    match directory.is_machine_in_cohort(consumer_application) {
        Ok(in_cohort) => in_cohort,
        Err(err) => {
            counter!(LOOKUP_FAILED).increment(1);
            tracing::error!(
                consumer_application,
                error = %err,
                "machine cohort lookup failed, routing to the stable cohort"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MapDirectory;

    fn context() -> CallContext {
        CallContext::new("com.example.CaseService", "web-gateway")
    }

    #[test]
    fn test_tenant_decision() {
        let directory = MapDirectory::new()
            .with_tenant("t-gray", "canary-a", &["case-provider"])
            .with_forced_interface("com.example.ForcedService");

        // tenant assigned to a cohort covering the provider
        assert!(decide_with_tenant(
            &directory,
            &context(),
            "t-gray",
            "case-provider"
        ));

        // same tenant, cohort does not cover this provider
        assert!(!decide_with_tenant(
            &directory,
            &context(),
            "t-gray",
            "other-provider"
        ));

        // unknown tenant
        assert!(!decide_with_tenant(
            &directory,
            &context(),
            "t-formal",
            "case-provider"
        ));

        // forced interface wins even for an unknown tenant
        let forced_ctx = CallContext::new("com.example.ForcedService", "web-gateway");
        assert!(decide_with_tenant(
            &directory,
            &forced_ctx,
            "t-formal",
            "case-provider"
        ));
    }

    #[test]
    fn test_absent_tenant_only_checks_forced_list() {
        // The machine is canary, but the tenant-shaped entry point must not
        // consult machine membership when the tenant is simply absent.
        let directory = MapDirectory::new().with_machine("web-gateway", "canary-a");
        assert!(!decide_with_tenant(
            &directory,
            &context(),
            "",
            "case-provider"
        ));
        assert!(decide_by_topology(&directory, &context()));
    }

    #[test]
    fn test_forced_wildcard() {
        let directory = MapDirectory::new().with_forced_interface("all");
        assert!(decide_with_tenant(
            &directory,
            &context(),
            "",
            "case-provider"
        ));
        assert!(decide_by_topology(&directory, &context()));
    }

    #[test]
    fn test_lookup_failure_degrades_to_formal() {
        let directory = MapDirectory::new()
            .with_tenant("t-gray", "canary-a", &[])
            .failing();
        assert!(!decide_with_tenant(
            &directory,
            &context(),
            "t-gray",
            "case-provider"
        ));
        assert!(!decide_by_topology(&directory, &context()));
    }

    #[test]
    fn test_empty_candidate_shape() {
        // No candidates means the provider application extracts as the
        // empty string; the decision still runs and lands on formal.
        let directory =
            MapDirectory::new().with_tenant("t-gray", "canary-a", &["case-provider"]);
        assert!(!decide_with_tenant(&directory, &context(), "t-gray", ""));
    }
}
