use thiserror::Error;

/// Failure of a cohort membership lookup.
///
/// The selector converts every variant into the most conservative routing
/// outcome (stable cohort / group unresolved) at the call site; it never
/// propagates these to the caller of a select operation.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("cohort directory is not ready")]
    NotReady,

    #[error("cohort lookup failed: {0}")]
    Lookup(String),
}

/// Answers cohort membership questions against externally refreshed data.
///
/// Implementations are expected to be cheap, synchronous, in-memory reads
/// (the selector sits on the RPC critical path) and safe to call from many
/// request tasks concurrently.
pub trait CohortDirectory {
    /// Whether calls to `interface` are forced into the canary cohort,
    /// regardless of who is calling. Implementations own any wildcard
    /// ("all interfaces") semantics of the underlying list.
    fn is_interface_forced_gray(&self, interface: &str) -> Result<bool, DirectoryError>;

    /// Whether tenant `tenant` is assigned to a canary cohort that covers
    /// `provider_application`.
    fn is_tenant_in_cohort(
        &self,
        tenant: &str,
        provider_application: &str,
    ) -> Result<bool, DirectoryError>;

    /// Whether this machine's instance of `consumer_application` is itself a
    /// canary instance, in which case its downstream calls stay canary.
    fn is_machine_in_cohort(&self, consumer_application: &str) -> Result<bool, DirectoryError>;

    /// Resolves the canary group name for this call: by tenant when one is
    /// present, otherwise by this machine's instance of
    /// `consumer_application`. Empty string means unresolved.
    fn resolve_group(
        &self,
        tenant: Option<&str>,
        consumer_application: &str,
    ) -> Result<String, DirectoryError>;
}
