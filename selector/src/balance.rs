//! Secondary balance policies.
//!
//! Once cohort filtering has narrowed the candidates to a single cohort,
//! ties among the remaining endpoints are broken by a pluggable policy.
//! The policy is a capability, not a hierarchy: anything that can pick one
//! member from a non-empty slice qualifies. The cohort pipeline guarantees
//! nothing about the slice beyond its order matching the original candidate
//! order.

use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use crate::context::CallContext;
use crate::endpoint::EndpointInfo;

/// Picks one endpoint among equally eligible candidates.
pub trait BalancePolicy<E: EndpointInfo> {
    /// Returns one member of `candidates`, or `None` when the slice is
    /// empty. Implementations own their internal failure handling.
    fn pick<'a>(&self, candidates: &[&'a E], context: &CallContext) -> Option<&'a E>;
}

/// Rotates through candidates with a shared atomic cursor.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        RoundRobin::default()
    }
}

impl<E: EndpointInfo> BalancePolicy<E> for RoundRobin {
    fn pick<'a>(&self, candidates: &[&'a E], _context: &CallContext) -> Option<&'a E> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % candidates.len();
        candidates.get(index).copied()
    }
}

/// Always picks the first candidate. Deterministic; useful for tests and
/// for deployments where the candidate order already encodes priority.
#[derive(Debug, Default)]
pub struct First;

impl<E: EndpointInfo> BalancePolicy<E> for First {
    fn pick<'a>(&self, candidates: &[&'a E], _context: &CallContext) -> Option<&'a E> {
        candidates.first().copied()
    }
}

/// A balance policy name from configuration did not match any known
/// strategy. Fatal at wiring time, never per call.
#[derive(Error, Debug)]
#[error("unknown balance policy `{0}`")]
pub struct UnknownPolicy(pub String);

/// Resolves a configured policy name to a strategy.
pub fn policy_from_name<E: EndpointInfo>(
    name: &str,
) -> Result<Box<dyn BalancePolicy<E> + Send + Sync>, UnknownPolicy> {
    match name {
        "round_robin" => Ok(Box::new(RoundRobin::new())),
        "first" => Ok(Box::new(First)),
        other => Err(UnknownPolicy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::StaticEndpoint;

    fn context() -> CallContext {
        CallContext::new("com.example.CaseService", "web-gateway")
    }

    #[test]
    fn test_round_robin_rotates() {
        let endpoints = vec![
            StaticEndpoint::new("a", ""),
            StaticEndpoint::new("b", ""),
            StaticEndpoint::new("c", ""),
        ];
        let refs: Vec<&StaticEndpoint> = endpoints.iter().collect();
        let policy = RoundRobin::new();
        let ctx = context();

        let picks: Vec<&str> = (0..4)
            .map(|_| policy.pick(&refs, &ctx).unwrap().application.as_str())
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_round_robin_empty() {
        let policy = RoundRobin::new();
        let refs: Vec<&StaticEndpoint> = Vec::new();
        assert!(policy.pick(&refs, &context()).is_none());
    }

    #[test]
    fn test_first() {
        let endpoints = vec![StaticEndpoint::new("a", ""), StaticEndpoint::new("b", "")];
        let refs: Vec<&StaticEndpoint> = endpoints.iter().collect();
        let picked = First.pick(&refs, &context()).unwrap();
        assert_eq!(picked.application, "a");
    }

    #[test]
    fn test_policy_from_name() {
        assert!(policy_from_name::<StaticEndpoint>("round_robin").is_ok());
        assert!(policy_from_name::<StaticEndpoint>("first").is_ok());
        assert!(policy_from_name::<StaticEndpoint>("latency_aware").is_err());
    }
}
