mod config;

use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use shared::MetricType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graymesh", about = "Canary traffic routing services")]
enum CliCommand {
    /// Run the cohort assignment lookup API
    CohortApi {
        /// Path to the YAML config file
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum GraymeshError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("config section `{0}` is missing")]
    MissingSection(&'static str),
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("could not install metrics recorder: {0}")]
    InstallRecorder(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cohort service error: {0}")]
    Cohorts(#[from] cohorts::CohortsError),
}

fn main() -> Result<(), GraymeshError> {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::CohortApi { config: path } => {
            let config = config::Config::from_file(&path)?;

            // The guard flushes buffered events on drop; keep it alive for
            // the whole process.
            let _sentry_guard = init_logging(&config);
            init_metrics(&config)?;

            let cohorts_config = config
                .cohorts
                .ok_or(GraymeshError::MissingSection("cohorts"))?;

            tracing::info!("starting cohort lookup API");
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(cohorts::run(cohorts_config))?;
        }
    }

    Ok(())
}

fn init_logging(config: &config::Config) -> Option<sentry::ClientInitGuard> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    })
}

fn init_metrics(config: &config::Config) -> Result<(), GraymeshError> {
    let Some(metrics_config) = &config.common.metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(
        metrics_config.statsd_host.as_str(),
        metrics_config.statsd_port,
    )
    .build(Some("graymesh"))?;
    metrics::set_global_recorder(recorder)
        .map_err(|err| GraymeshError::InstallRecorder(err.to_string()))?;

    describe_all_metrics();
    Ok(())
}

/// Registers every metric the workspace can emit on the installed recorder.
fn describe_all_metrics() {
    let all = selector::metrics_defs::ALL_METRICS
        .iter()
        .chain(cohorts::metrics_defs::ALL_METRICS)
        .chain(mq_control::metrics_defs::ALL_METRICS);

    for def in all {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Gauge => metrics::describe_gauge!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
