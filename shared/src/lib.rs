pub mod metrics_defs;
pub mod net;

pub use metrics_defs::{MetricDef, MetricType};
