use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use titlesplit::appraisal::{appraisal_router, AppraisalService};
use titlesplit::domain::{ListingSnapshot, PropertyId};
use titlesplit::screening::{screen_batch, ScreeningResult};
use titlesplit::verification::VerificationRepository;

#[derive(Debug, Deserialize)]
pub(crate) struct ScreeningRequest {
    pub(crate) listings: Vec<ListingSnapshot>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScreenedListing {
    pub(crate) property_id: PropertyId,
    pub(crate) postcode: String,
    pub(crate) asking_price: i64,
    #[serde(flatten)]
    pub(crate) result: ScreeningResult,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScreeningResponse {
    pub(crate) passed: usize,
    pub(crate) rejected: usize,
    pub(crate) listings: Vec<ScreenedListing>,
}

pub(crate) fn with_appraisal_routes<R>(service: Arc<AppraisalService<R>>) -> axum::Router
where
    R: VerificationRepository + 'static,
{
    appraisal_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/screening", axum::routing::post(screening_endpoint))
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

/// Screens a batch of listings and returns them best first.
pub(crate) async fn screening_endpoint(
    Json(payload): Json<ScreeningRequest>,
) -> Json<ScreeningResponse> {
    let ranked = screen_batch(&payload.listings);
    let passed = ranked.iter().filter(|(_, result)| result.passes).count();

    let listings: Vec<ScreenedListing> = ranked
        .into_iter()
        .map(|(listing, result)| ScreenedListing {
            property_id: listing.property_id.clone(),
            postcode: listing.postcode.clone(),
            asking_price: listing.asking_price,
            result,
        })
        .collect();

    Json(ScreeningResponse {
        passed,
        rejected: listings.len() - passed,
        listings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryVerificationRepository;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use titlesplit::config::EngineConfig;
    use titlesplit::domain::Tenure;
    use tower::ServiceExt;

    fn listing(id: &str, tenure: Tenure, asking_price: i64) -> ListingSnapshot {
        ListingSnapshot {
            property_id: PropertyId(id.to_string()),
            postcode: "PR8 1RS".to_string(),
            asking_price,
            estimated_units: Some(4),
            tenure,
            tenure_confidence: 0.9,
            unit_confidence: 0.8,
            refurb_indicators: Vec::new(),
            description: String::new(),
        }
    }

    fn router() -> axum::Router {
        let service = Arc::new(AppraisalService::new(
            Arc::new(InMemoryVerificationRepository::default()),
            Arc::new(EngineConfig::default()),
        ));
        with_appraisal_routes(service)
    }

    #[tokio::test]
    async fn screening_endpoint_ranks_and_counts() {
        let request = ScreeningRequest {
            listings: vec![
                listing("rm-leasehold", Tenure::Leasehold, 200_000),
                listing("rm-freehold", Tenure::Freehold, 180_000),
            ],
        };

        let Json(body) = screening_endpoint(Json(request)).await;

        assert_eq!(body.passed, 1);
        assert_eq!(body.rejected, 1);
        assert_eq!(body.listings[0].property_id, PropertyId("rm-freehold".to_string()));
        assert_eq!(body.listings[1].result.score, 0);
    }

    #[tokio::test]
    async fn health_route_is_served_alongside_appraisals() {
        let response = router()
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_verification_is_not_found() {
        let response = router()
            .oneshot(
                Request::get("/api/v1/properties/rm-missing/verification")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
