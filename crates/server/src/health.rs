use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use folio_core::config::AppConfig;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct HealthState {
    remote: bool,
    email: bool,
    sheets: bool,
}

impl HealthState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            remote: config.remote.is_configured(),
            email: config.email.enabled,
            sheets: config.sheets.is_configured(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub remote: HealthCheck,
    pub email: HealthCheck,
    pub sheets: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// The chat works without any integration, so missing ones never make the
/// service unready; they are reported as `disabled`.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck { status: "ready", detail: "folio-server runtime initialized".to_string() },
        remote: integration_check(state.remote, "remote answers", "canned replies only"),
        email: integration_check(state.email, "lead e-mail", "leads are not e-mailed"),
        sheets: integration_check(state.sheets, "sheets webhook", "leads are not logged to a sheet"),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn integration_check(configured: bool, name: &str, fallback: &str) -> HealthCheck {
    if configured {
        HealthCheck { status: "configured", detail: format!("{name} configured") }
    } else {
        HealthCheck { status: "disabled", detail: format!("{name} not configured; {fallback}") }
    }
}
