//! Final endpoint selection.
//!
//! Ties the pipeline together: decision → filter → tag → pick. The
//! guarantees at this stage:
//!
//! - a filtered set of exactly one is returned directly, so a
//!   single-provider deployment never requires the secondary policy to
//!   understand cohort grouping;
//! - an empty filtered set falls back to the *unfiltered* candidate list
//!   through the secondary policy, trading cohort correctness for
//!   availability (and logging the provider application it happened to);
//! - callers never see an error from cohort logic, only the secondary
//!   policy's own outcome.

use crate::balance::BalancePolicy;
use crate::context::CallContext;
use crate::decision;
use crate::directory::CohortDirectory;
use crate::endpoint::EndpointInfo;
use crate::filter;
use crate::metrics_defs::FILTER_EXHAUSTED;
use crate::tagging;
use shared::counter;

/// Cohort-aware endpoint selector.
///
/// Stateless across calls; a single instance serves arbitrarily many
/// concurrent requests.
pub struct CohortSelector<D> {
    directory: D,
}

impl<D: CohortDirectory> CohortSelector<D> {
    pub fn new(directory: D) -> Self {
        CohortSelector { directory }
    }

    /// Selection entry point for calls carrying a tenant identity (which may
    /// be empty when the caller has none).
    pub fn select_with_tenant<'a, E, P>(
        &self,
        candidates: &'a [E],
        context: &mut CallContext,
        tenant: &str,
        policy: &P,
    ) -> Option<&'a E>
    where
        E: EndpointInfo,
        P: BalancePolicy<E> + ?Sized,
    {
        let provider_application = provider_application(candidates);
        let gray =
            decision::decide_with_tenant(&self.directory, context, tenant, &provider_application);
        let tenant = (!tenant.is_empty()).then_some(tenant);
        self.finish(candidates, context, gray, tenant, &provider_application, policy)
    }

    /// Selection entry point for identity-less service-to-service hops; the
    /// calling machine's own cohort membership stands in for the tenant.
    pub fn select_by_topology<'a, E, P>(
        &self,
        candidates: &'a [E],
        context: &mut CallContext,
        policy: &P,
    ) -> Option<&'a E>
    where
        E: EndpointInfo,
        P: BalancePolicy<E> + ?Sized,
    {
        let provider_application = provider_application(candidates);
        let gray = decision::decide_by_topology(&self.directory, context);
        self.finish(candidates, context, gray, None, &provider_application, policy)
    }

    fn finish<'a, E, P>(
        &self,
        candidates: &'a [E],
        context: &mut CallContext,
        gray: bool,
        tenant: Option<&str>,
        provider_application: &str,
        policy: &P,
    ) -> Option<&'a E>
    where
        E: EndpointInfo,
        P: BalancePolicy<E> + ?Sized,
    {
        let outcome = filter::partition(
            &self.directory,
            candidates,
            gray,
            tenant,
            context.consumer_application(),
        );
        tagging::tag_group(context, &outcome.group);

        if outcome.selected.is_empty() {
            counter!(FILTER_EXHAUSTED).increment(1);
            tracing::error!(
                provider_application,
                "no endpoint left in either cohort, balancing over the full candidate list"
            );
            let everyone: Vec<&E> = candidates.iter().collect();
            return policy.pick(&everyone, context);
        }

        if outcome.selected.len() == 1 {
            return Some(outcome.selected[0]);
        }

        policy.pick(&outcome.selected, context)
    }
}

/// Application name of the provider, read from the first candidate. Empty
/// when the list is empty or the metadata is unreadable; selection proceeds
/// either way.
fn provider_application<E: EndpointInfo>(candidates: &[E]) -> String {
    let Some(endpoint) = candidates.first() else {
        return String::new();
    };
    match endpoint.application() {
        Ok(application) => application.to_string(),
        Err(err) => {
            tracing::error!(error = %err, "could not read provider application from endpoint");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::First;
    use crate::endpoint::StaticEndpoint;
    use crate::testutils::MapDirectory;
    use std::cell::Cell;

    /// Records how many candidates it was offered; picks the first.
    #[derive(Default)]
    struct Spy {
        calls: Cell<usize>,
        offered: Cell<usize>,
    }

    impl BalancePolicy<StaticEndpoint> for Spy {
        fn pick<'a>(
            &self,
            candidates: &[&'a StaticEndpoint],
            _context: &CallContext,
        ) -> Option<&'a StaticEndpoint> {
            self.calls.set(self.calls.get() + 1);
            self.offered.set(candidates.len());
            candidates.first().copied()
        }
    }

    fn context() -> CallContext {
        CallContext::new("com.example.CaseService", "web-gateway")
    }

    fn mixed_candidates() -> Vec<StaticEndpoint> {
        vec![
            StaticEndpoint::new("case-provider", "canary-a"),
            StaticEndpoint::new("case-provider", ""),
        ]
    }

    #[test]
    fn test_gray_tenant_routes_to_canary() {
        let selector = CohortSelector::new(
            MapDirectory::new().with_tenant("T1", "canary-a", &["case-provider"]),
        );
        let candidates = mixed_candidates();
        let mut ctx = context();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T1", &First)
            .unwrap();
        assert_eq!(picked.group_tag, "canary-a");
        assert_eq!(ctx.group(), Some("canary-a"));
    }

    #[test]
    fn test_formal_tenant_routes_to_stable() {
        let selector = CohortSelector::new(
            MapDirectory::new().with_tenant("T1", "canary-a", &["case-provider"]),
        );
        let candidates = mixed_candidates();
        let mut ctx = context();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &First)
            .unwrap();
        assert_eq!(picked.group_tag, "");
        assert_eq!(ctx.group(), Some(""));
    }

    #[test]
    fn test_determinism() {
        let selector = CohortSelector::new(
            MapDirectory::new().with_tenant("T1", "canary-a", &["case-provider"]),
        );
        let candidates = mixed_candidates();

        for _ in 0..10 {
            let mut ctx = context();
            let picked = selector
                .select_with_tenant(&candidates, &mut ctx, "T1", &First)
                .unwrap();
            assert_eq!(picked.group_tag, "canary-a");
            assert_eq!(ctx.group(), Some("canary-a"));
        }
    }

    #[test]
    fn test_single_candidate_skips_policy() {
        struct NeverCalled;
        impl BalancePolicy<StaticEndpoint> for NeverCalled {
            fn pick<'a>(
                &self,
                _candidates: &[&'a StaticEndpoint],
                _context: &CallContext,
            ) -> Option<&'a StaticEndpoint> {
                panic!("secondary policy must not run for a single filtered candidate");
            }
        }

        let selector = CohortSelector::new(MapDirectory::new());
        let candidates = vec![StaticEndpoint::new("case-provider", "")];
        let mut ctx = context();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &NeverCalled)
            .unwrap();
        assert_eq!(picked.application, "case-provider");
        assert_eq!(ctx.group(), Some(""));
    }

    #[test]
    fn test_many_candidates_delegate_to_policy() {
        let selector = CohortSelector::new(MapDirectory::new());
        let candidates = vec![
            StaticEndpoint::new("case-provider", ""),
            StaticEndpoint::new("case-provider", ""),
        ];
        let mut ctx = context();
        let spy = Spy::default();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &spy)
            .unwrap();
        assert_eq!(picked.group_tag, "");
        assert_eq!(spy.calls.get(), 1);
        assert_eq!(spy.offered.get(), 2);
    }

    #[test]
    fn test_double_empty_falls_back_to_full_list() {
        // Tenant is formal, but only foreign-group canary endpoints exist
        // and no group resolves for degradation: the policy gets the whole
        // original list.
        let selector = CohortSelector::new(MapDirectory::new());
        let candidates = vec![
            StaticEndpoint::new("case-provider", "canary-x"),
            StaticEndpoint::new("case-provider", "canary-y"),
        ];
        let mut ctx = context();
        let spy = Spy::default();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &spy)
            .unwrap();
        assert_eq!(spy.offered.get(), 2);
        assert_eq!(picked.group_tag, "canary-x");
        assert_eq!(ctx.group(), Some(""));
    }

    #[test]
    fn test_empty_candidate_list_reaches_policy_intact() {
        let selector = CohortSelector::new(MapDirectory::new());
        let candidates: Vec<StaticEndpoint> = Vec::new();
        let mut ctx = context();
        let spy = Spy::default();

        let picked = selector.select_with_tenant(&candidates, &mut ctx, "T1", &spy);
        assert!(picked.is_none());
        assert_eq!(spy.calls.get(), 1);
        assert_eq!(spy.offered.get(), 0);
        assert_eq!(ctx.group(), Some(""));
    }

    #[test]
    fn test_canary_machine_propagates_cohort_downstream() {
        let selector = CohortSelector::new(
            MapDirectory::new().with_machine("web-gateway", "canary-a"),
        );
        let candidates = mixed_candidates();
        let mut ctx = context();

        let picked = selector
            .select_by_topology(&candidates, &mut ctx, &First)
            .unwrap();
        assert_eq!(picked.group_tag, "canary-a");
        assert_eq!(ctx.group(), Some("canary-a"));
    }

    #[test]
    fn test_formal_decision_degrades_onto_canary_cohort() {
        // T2's cohort does not cover this provider, so the decision is
        // formal; but with only canary endpoints deployed, the call
        // degrades onto them and carries their group downstream.
        let selector = CohortSelector::new(
            MapDirectory::new().with_tenant("T2", "canary-a", &["other-app"]),
        );
        let candidates = vec![
            StaticEndpoint::new("case-provider", "canary-a"),
            StaticEndpoint::new("case-provider", "canary-a"),
        ];
        let mut ctx = context();
        let spy = Spy::default();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &spy)
            .unwrap();
        assert_eq!(picked.group_tag, "canary-a");
        assert_eq!(spy.offered.get(), 2);
        assert_eq!(ctx.group(), Some("canary-a"));
    }

    #[test]
    fn test_formal_decision_with_unresolvable_group_exhausts_to_full_list() {
        // Canary-only deployment, formal decision, and no group resolves
        // for this caller: degradation finds nothing, full-list fallback.
        let selector = CohortSelector::new(
            MapDirectory::new().with_machine("other-app", "canary-a"),
        );
        let candidates = vec![
            StaticEndpoint::new("case-provider", "canary-a"),
            StaticEndpoint::new("case-provider", "canary-a"),
        ];
        let mut ctx = context();
        let spy = Spy::default();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &spy)
            .unwrap();
        assert_eq!(spy.offered.get(), 2);
        assert_eq!(picked.group_tag, "canary-a");
        assert_eq!(ctx.group(), Some(""));
    }

    #[test]
    fn test_formal_decision_canary_only_with_resolvable_group() {
        let selector = CohortSelector::new(
            MapDirectory::new().with_machine("web-gateway", "canary-a"),
        );
        let candidates = vec![StaticEndpoint::new("case-provider", "canary-a")];
        let mut ctx = context();

        // Tenant path with an unknown tenant decides formal; the stable
        // cohort is empty; the machine-resolved group finds the canary
        // endpoint and tags the call with it.
        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "", &First)
            .unwrap();
        assert_eq!(picked.group_tag, "canary-a");
        assert_eq!(ctx.group(), Some("canary-a"));
    }

    #[test]
    fn test_forced_interface_overrides_tenant() {
        let selector = CohortSelector::new(
            MapDirectory::new()
                .with_forced_interface("com.example.CaseService")
                .with_tenant("T2", "canary-a", &["case-provider"]),
        );
        let candidates = mixed_candidates();
        let mut ctx = context();

        // Unknown tenant on a forced-gray interface: the decision is gray,
        // but no group resolves for T9, so the filter degrades to stable.
        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T9", &First)
            .unwrap();
        assert_eq!(picked.group_tag, "");
        assert_eq!(ctx.group(), Some(""));

        // An assigned tenant rides the forced decision into its own group.
        let mut ctx = context();
        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T2", &First)
            .unwrap();
        assert_eq!(picked.group_tag, "canary-a");
        assert_eq!(ctx.group(), Some("canary-a"));
    }

    #[test]
    fn test_lookup_failures_never_panic() {
        let selector = CohortSelector::new(MapDirectory::new().failing());
        let candidates = mixed_candidates();
        let mut ctx = context();

        let picked = selector
            .select_with_tenant(&candidates, &mut ctx, "T1", &First)
            .unwrap();
        // every lookup failed: formal decision, stable endpoint
        assert_eq!(picked.group_tag, "");
        assert_eq!(ctx.group(), Some(""));
    }
}
