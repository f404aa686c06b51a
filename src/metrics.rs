use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::state::AppState;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the global Prometheus recorder and its upkeep task.
/// Returns `None` when observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);
    gauge!("http_requests_active").decrement(1.0);

    response
}

/// `GET /metrics` in the Prometheus text format.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// Business metrics helpers

pub fn track_user_registered() {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total").increment(1);
}

pub fn track_user_login_success(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
}

pub fn track_user_login_failure() {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => "unknown", "status" => "failure").increment(1);
}

/// `flow` is one of `register`, `login`, `refresh`.
pub fn track_tokens_issued(flow: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("tokens_issued_total", "flow" => flow).increment(1);
}

/// `reason` is logged server-side only; the client always sees the same message.
pub fn track_refresh_rejected(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("refresh_rejected_total", "reason" => reason).increment(1);
}
