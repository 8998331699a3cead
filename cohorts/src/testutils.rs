//! In-process mock control plane for sync tests.

use axum::{Json, Router, extract::State, routing::get};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::types::CohortSnapshot;

type SharedSnapshot = Arc<RwLock<CohortSnapshot>>;

/// Serves a cohort snapshot over HTTP on an ephemeral local port.
pub struct MockControlPlane {
    addr: SocketAddr,
    snapshot: SharedSnapshot,
    handle: JoinHandle<()>,
}

impl MockControlPlane {
    pub async fn spawn(snapshot: CohortSnapshot) -> Result<Self, std::io::Error> {
        let snapshot = Arc::new(RwLock::new(snapshot));

        let app = Router::new()
            .route("/cohort-assignments", get(serve_snapshot))
            .with_state(snapshot.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(MockControlPlane {
            addr,
            snapshot,
            handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replaces the snapshot served to subsequent requests.
    pub fn set_snapshot(&self, snapshot: CohortSnapshot) {
        *self.snapshot.write() = snapshot;
    }
}

impl Drop for MockControlPlane {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_snapshot(State(snapshot): State<SharedSnapshot>) -> Json<CohortSnapshot> {
    Json(snapshot.read().clone())
}
