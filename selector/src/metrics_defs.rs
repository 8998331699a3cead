//! Metrics definitions for the selector.

use shared::metrics_defs::{MetricDef, MetricType};

pub const DECISION_GRAY: MetricDef = MetricDef {
    name: "cohort.decision.gray",
    metric_type: MetricType::Counter,
    description: "Calls decided into the canary cohort",
};

pub const DECISION_FORMAL: MetricDef = MetricDef {
    name: "cohort.decision.formal",
    metric_type: MetricType::Counter,
    description: "Calls decided into the stable cohort",
};

pub const LOOKUP_FAILED: MetricDef = MetricDef {
    name: "cohort.lookup.failed",
    metric_type: MetricType::Counter,
    description: "Directory lookups that failed and were degraded to the stable outcome",
};

pub const FILTER_DEGRADED: MetricDef = MetricDef {
    name: "cohort.filter.degraded",
    metric_type: MetricType::Counter,
    description: "Calls where the decided cohort was empty and the other cohort was used",
};

pub const FILTER_EXHAUSTED: MetricDef = MetricDef {
    name: "cohort.filter.exhausted",
    metric_type: MetricType::Counter,
    description: "Calls where both cohorts were empty and the full candidate list was used",
};

pub const ENDPOINT_METADATA_ERROR: MetricDef = MetricDef {
    name: "cohort.endpoint.metadata_error",
    metric_type: MetricType::Counter,
    description: "Endpoints excluded from filtering because their metadata was unreadable",
};

pub const ALL_METRICS: &[MetricDef] = &[
    DECISION_GRAY,
    DECISION_FORMAL,
    LOOKUP_FAILED,
    FILTER_DEGRADED,
    FILTER_EXHAUSTED,
    ENDPOINT_METADATA_ERROR,
];
