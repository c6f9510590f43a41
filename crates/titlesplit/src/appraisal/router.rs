use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde_json::json;

use super::service::{AppraisalRequest, AppraisalService, AppraisalServiceError};
use crate::domain::PropertyId;
use crate::error::AppError;
use crate::verification::{VerificationRecord, VerificationRepository};

/// Router exposing appraisal and verification endpoints.
pub fn appraisal_router<R>(service: Arc<AppraisalService<R>>) -> Router
where
    R: VerificationRepository + 'static,
{
    Router::new()
        .route("/api/v1/appraisals", post(appraise_handler::<R>))
        .route(
            "/api/v1/properties/:property_id/verification",
            put(record_verification_handler::<R>).get(verification_handler::<R>),
        )
        .with_state(service)
}

async fn appraise_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Json(request): Json<AppraisalRequest>,
) -> Result<Response, AppError>
where
    R: VerificationRepository + 'static,
{
    let appraisal = service.appraise(request)?;
    Ok((StatusCode::OK, Json(appraisal)).into_response())
}

async fn record_verification_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path(property_id): Path<String>,
    Json(record): Json<VerificationRecord>,
) -> Response
where
    R: VerificationRepository + 'static,
{
    if record.property_id.0 != property_id {
        let payload = json!({
            "error": "property_id in path and body differ",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    match service.record_verification(record) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(AppraisalServiceError::InvalidRequest(message)) => {
            let payload = json!({
                "error": message,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

async fn verification_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path(property_id): Path<String>,
) -> Result<Response, AppError>
where
    R: VerificationRepository + 'static,
{
    let record = service.verification(&PropertyId(property_id))?;
    Ok((StatusCode::OK, Json(record)).into_response())
}
