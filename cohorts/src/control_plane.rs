const BASE_DELAY: u64 = 500;

use crate::types::CohortSnapshot;
use reqwest::StatusCode;
use tokio::time::{Duration, sleep};

#[derive(thiserror::Error, Debug)]
pub enum ControlPlaneError {
    #[error("could not load cohort assignments: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("control plane unavailable")]
    RetriesExceeded,
}

/// Client for the remote store that publishes cohort assignment tables.
pub struct ControlPlane {
    client: reqwest::Client,
    full_url: String,
}

impl ControlPlane {
    pub fn new(base_url: String) -> Self {
        let full_url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            "cohort-assignments"
        );

        ControlPlane {
            client: reqwest::Client::new(),
            full_url,
        }
    }

    /// Fetches the full assignment snapshot. The tables are small enough to
    /// ship as one document, so there is no pagination.
    pub async fn load_assignments(&self) -> Result<CohortSnapshot, ControlPlaneError> {
        const RETRIABLE_STATUS_CODES: &[StatusCode] = &[
            StatusCode::TOO_MANY_REQUESTS,     // 429
            StatusCode::INTERNAL_SERVER_ERROR, // 500
            StatusCode::BAD_GATEWAY,           // 502
            StatusCode::SERVICE_UNAVAILABLE,   // 503
            StatusCode::GATEWAY_TIMEOUT,       // 504
        ];

        // 3 retries with backoff
        let mut retries = 0;

        loop {
            let response = self.client.get(&self.full_url).send().await?;

            if !response.status().is_success() {
                if RETRIABLE_STATUS_CODES.contains(&response.status()) && retries < 3 {
                    let retry_millis = BASE_DELAY * 2_u64.pow(retries);
                    sleep(Duration::from_millis(retry_millis)).await;
                    retries += 1;
                    continue;
                } else {
                    return Err(ControlPlaneError::RetriesExceeded);
                }
            }

            let snapshot = response.json::<CohortSnapshot>().await?;
            tracing::debug!(
                forced_interfaces = snapshot.forced_interfaces.len(),
                tenants = snapshot.tenants.len(),
                machines = snapshot.machines.len(),
                "fetched cohort assignments from control plane"
            );
            return Ok(snapshot);
        }
    }
}
