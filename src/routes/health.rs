use crate::state::StudentFormState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_health(State(state): State<StudentFormState>) -> (StatusCode, Json<HealthReport>) {
    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "healthy",
                database: "connected",
                error: None,
            }),
        ),
        Err(e) => {
            warn!(?e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthReport {
                    status: "unhealthy",
                    database: "disconnected",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
