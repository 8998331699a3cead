use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canary group name. Empty means "no group" everywhere it appears.
pub type GroupName = String;

/// One tenant's cohort assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TenantAssignment {
    /// Canary group the tenant's traffic is routed to.
    pub group: GroupName,
    /// Provider applications the assignment covers. Empty covers all of
    /// them.
    #[serde(default)]
    pub applications: Vec<String>,
}

/// One canary machine: an (ip, application) instance pair and the group it
/// runs in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct MachineAssignment {
    pub ip: String,
    pub application: String,
    pub group: GroupName,
}

/// Full cohort assignment tables, replaced wholesale on every sync.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CohortSnapshot {
    /// Interfaces whose calls are forced into the canary cohort. The
    /// literal `all` forces every interface.
    #[serde(default)]
    pub forced_interfaces: Vec<String>,
    /// Tenant identity to cohort assignment.
    #[serde(default)]
    pub tenants: HashMap<String, TenantAssignment>,
    /// Canary machine instances.
    #[serde(default)]
    pub machines: Vec<MachineAssignment>,
}

impl CohortSnapshot {
    pub fn is_empty(&self) -> bool {
        self.forced_interfaces.is_empty() && self.tenants.is_empty() && self.machines.is_empty()
    }
}
