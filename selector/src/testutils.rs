//! In-memory cohort directory for tests and examples.

use std::collections::HashMap;

use crate::directory::{CohortDirectory, DirectoryError};

/// Directory backed by plain maps, with optional failure injection.
#[derive(Debug, Default)]
pub struct MapDirectory {
    forced_interfaces: Vec<String>,
    // tenant -> (group, provider applications covered; empty = all)
    tenants: HashMap<String, (String, Vec<String>)>,
    // consumer application -> group, for "this machine is canary" checks
    machines: HashMap<String, String>,
    failing: bool,
}

impl MapDirectory {
    pub fn new() -> Self {
        MapDirectory::default()
    }

    pub fn with_forced_interface(mut self, interface: &str) -> Self {
        self.forced_interfaces.push(interface.to_string());
        self
    }

    pub fn with_tenant(mut self, tenant: &str, group: &str, applications: &[&str]) -> Self {
        self.tenants.insert(
            tenant.to_string(),
            (
                group.to_string(),
                applications.iter().map(|a| a.to_string()).collect(),
            ),
        );
        self
    }

    pub fn with_machine(mut self, consumer_application: &str, group: &str) -> Self {
        self.machines
            .insert(consumer_application.to_string(), group.to_string());
        self
    }

    /// Every lookup fails until further notice.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.failing {
            return Err(DirectoryError::Lookup("injected failure".to_string()));
        }
        Ok(())
    }
}

impl CohortDirectory for MapDirectory {
    fn is_interface_forced_gray(&self, interface: &str) -> Result<bool, DirectoryError> {
        self.check()?;
        Ok(self
            .forced_interfaces
            .iter()
            .any(|entry| entry == "all" || entry == interface))
    }

    fn is_tenant_in_cohort(
        &self,
        tenant: &str,
        provider_application: &str,
    ) -> Result<bool, DirectoryError> {
        self.check()?;
        Ok(self.tenants.get(tenant).is_some_and(|(_, applications)| {
            applications.is_empty()
                || applications.iter().any(|app| app == provider_application)
        }))
    }

    fn is_machine_in_cohort(&self, consumer_application: &str) -> Result<bool, DirectoryError> {
        self.check()?;
        Ok(self.machines.contains_key(consumer_application))
    }

    fn resolve_group(
        &self,
        tenant: Option<&str>,
        consumer_application: &str,
    ) -> Result<String, DirectoryError> {
        self.check()?;
        let group = match tenant {
            Some(tenant) if !tenant.is_empty() => self
                .tenants
                .get(tenant)
                .map(|(group, _)| group.clone())
                .unwrap_or_default(),
            _ => self
                .machines
                .get(consumer_application)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(group)
    }
}
