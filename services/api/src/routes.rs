use crate::infra::{AppState, InMemorySessionStore};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use servicedesk::workflows::control::{
    control_router, ControlCode, ControlCodeConverter, ControlWorkflowService, DateValidator,
    SessionStore,
};

pub(crate) fn with_control_routes<S, V, C>(
    service: Arc<ControlWorkflowService<S, V, C>>,
) -> axum::Router
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    control_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/control/session",
            axum::routing::put(seed_session_handler),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Stand-in for the upstream hand-over: installs the control-code record the
/// portal acquired for the user, replacing whatever was there.
pub(crate) async fn seed_session_handler(
    Extension(store): Extension<Arc<InMemorySessionStore>>,
    Json(record): Json<ControlCode>,
) -> impl IntoResponse {
    match store.replace(record) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;

    fn app_state(ready: bool) -> AppState {
        // Build a handle without installing the process-global recorder, so the
        // helper can be called more than once per test binary.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
        }
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(payload) = healthcheck().await;
        assert_eq!(payload, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_flips_with_the_flag() {
        let response = readiness_endpoint(Extension(app_state(false)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readiness_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeding_replaces_the_session_record() {
        let store = Arc::new(InMemorySessionStore::default());
        let record = ControlCode {
            code: "QR34F7".to_string(),
            first_name: "Mary".to_string(),
            last_name: "Steward".to_string(),
            day_of_birth: "1995-04-02".to_string(),
            user_uid: "urn:collab:person:example.com:msteward".to_string(),
        };

        let response = seed_session_handler(Extension(store.clone()), Json(record.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let stored = store
            .current()
            .expect("store readable")
            .expect("record present");
        assert_eq!(stored, record);
    }
}
