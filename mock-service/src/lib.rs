use axum::{debug_handler, extract::Path, http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};
use tracing::debug;

/// Target service for behavior tests. Counts what it receives so tests can
/// assert on the traffic a descriptor produced.
pub async fn run(addr: SocketAddr) {
    let app = Router::new()
        .route("/", get(root))
        .route("/count/:key", get(count))
        .route("/status/:code", get(status));

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

static ROOT_HITS: AtomicU64 = AtomicU64::new(0);

#[debug_handler]
pub async fn root() {
    ROOT_HITS.fetch_add(1, Ordering::Relaxed);
    debug!("MOCK SERVER ___ GET /");
}

pub fn root_hits() -> u64 {
    ROOT_HITS.load(Ordering::Relaxed)
}

lazy_static! {
    static ref COUNT_MAP: Arc<RwLock<HashMap<String, u64>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

#[debug_handler]
pub async fn count(Path(key): Path<String>) {
    debug!("MOCK SERVER ___ GET /count/{key}");
    *COUNT_MAP.write().unwrap().entry(key).or_insert(0) += 1;
}

pub fn key_hits(key: &str) -> u64 {
    COUNT_MAP.read().unwrap().get(key).copied().unwrap_or(0)
}

#[debug_handler]
pub async fn status(Path(code): Path<u16>) -> StatusCode {
    debug!("MOCK SERVER ___ GET /status/{code}");
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
