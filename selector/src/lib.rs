//! Cohort-aware endpoint selection for RPC calls.
//!
//! For every outbound call the selector decides whether the call belongs to
//! the canary ("gray") cohort or the stable ("formal") cohort of provider
//! endpoints, narrows the candidate list to that cohort, stamps the decision
//! onto the call's attachment map so downstream hops stay in the same cohort,
//! and finally hands ties to a pluggable secondary balance policy.
//!
//! # Pipeline
//!
//! ```text
//! candidates + call context
//!   │
//!   ├─ decision:  gray or formal?        (tenant / forced interface / machine)
//!   ├─ filter:    keep the decided cohort, degrade to the other when empty
//!   ├─ tagging:   write the resolved group into the `group` attachment
//!   └─ select:    0 left → balance over everything (log), 1 → return it,
//!                 n → secondary balance policy
//! ```
//!
//! Every call is processed statelessly; the selector holds no per-call state
//! of its own. Cohort membership questions are answered by a
//! [`CohortDirectory`] implementation, and any lookup failure degrades to the
//! stable cohort rather than failing the call.

pub mod balance;
pub mod context;
pub mod decision;
pub mod directory;
pub mod endpoint;
pub mod filter;
pub mod metrics_defs;
pub mod select;
pub mod tagging;
pub mod testutils;

pub use balance::{BalancePolicy, First, RoundRobin, UnknownPolicy};
pub use context::{CallContext, GROUP_ATTACHMENT, WILDCARD_GROUP};
pub use directory::{CohortDirectory, DirectoryError};
pub use endpoint::{EndpointInfo, MetadataError, StaticEndpoint};
pub use select::CohortSelector;
pub use tagging::normalize_formal_group;
