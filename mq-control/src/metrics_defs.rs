//! Metrics definitions for the consumer lifecycle controller.

use shared::metrics_defs::{MetricDef, MetricType};

pub const CONSUMERS_ENABLED: MetricDef = MetricDef {
    name: "mq.consumers.enabled",
    metric_type: MetricType::Counter,
    description: "Transitions that started the registered consumers",
};

pub const CONSUMERS_DISABLED: MetricDef = MetricDef {
    name: "mq.consumers.disabled",
    metric_type: MetricType::Counter,
    description: "Transitions that stopped the registered consumers",
};

pub const ALL_METRICS: &[MetricDef] = &[CONSUMERS_ENABLED, CONSUMERS_DISABLED];
