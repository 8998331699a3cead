//! Metrics definitions for the cohort registry.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SYNC_DURATION: MetricDef = MetricDef {
    name: "cohorts.sync.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a cohort table sync in seconds",
};

pub const SYNC_TENANTS: MetricDef = MetricDef {
    name: "cohorts.sync.tenants",
    metric_type: MetricType::Histogram,
    description: "Number of tenant assignments in the synced snapshot",
};

pub const SYNC_FALLBACK: MetricDef = MetricDef {
    name: "cohorts.sync.fallback",
    metric_type: MetricType::Counter,
    description: "Syncs that fell back to the backup provider",
};

pub const ALL_METRICS: &[MetricDef] = &[SYNC_DURATION, SYNC_TENANTS, SYNC_FALLBACK];
