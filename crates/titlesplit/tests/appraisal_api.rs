use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use titlesplit::appraisal::{appraisal_router, AppraisalService};
use titlesplit::config::EngineConfig;
use titlesplit::domain::{PropertyId, TenureCode};
use titlesplit::verification::{
    RepositoryError, TitleVerification, VerificationRecord, VerificationRepository,
};
use tower::ServiceExt;

#[derive(Default)]
struct MemoryRepository {
    records: Mutex<HashMap<PropertyId, VerificationRecord>>,
}

impl VerificationRepository for MemoryRepository {
    fn save(&self, record: VerificationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.property_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<VerificationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

fn router() -> Router {
    let service = AppraisalService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(EngineConfig::default()),
    );
    appraisal_router(Arc::new(service))
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn appraisal_payload() -> Value {
    json!({
        "listing": {
            "property_id": "rm-7731",
            "postcode": "PR9 0NP",
            "asking_price": 280000,
            "estimated_units": 4,
            "tenure": "freehold",
            "tenure_confidence": 0.9,
            "unit_confidence": 0.8
        },
        "evidence": {
            "comparables": [
                {
                    "address": "Flat 1, 20 Park Road",
                    "postcode": "PR9 9JL",
                    "price": 82000,
                    "sale_date": "2025-02-14",
                    "property_type": "flat",
                    "tenure": "leasehold"
                },
                {
                    "address": "Flat 2, 20 Park Road",
                    "postcode": "PR9 9JL",
                    "price": 86500,
                    "sale_date": "2025-03-28",
                    "property_type": "flat",
                    "tenure": "leasehold"
                }
            ]
        },
        "as_of": "2025-06-01"
    })
}

fn freehold_record(id: &str) -> VerificationRecord {
    let mut record = VerificationRecord::new(PropertyId(id.to_string()));
    record.title.verification = Some(TitleVerification {
        tenure_confirmed: Some(TenureCode::Freehold),
        is_single_title: Some(true),
        ..TitleVerification::default()
    });
    record
}

#[tokio::test]
async fn appraisal_with_evidence_returns_enriched_report() {
    let response = router()
        .oneshot(json_request("POST", "/api/v1/appraisals", &appraisal_payload()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["stage"], "enriched");
    assert_eq!(body["valuation"]["total_units"], 4);
    assert!(body["recommendation"]["level"].is_string());
    assert_eq!(
        body["valuation"]["title_split_costs"],
        body["cost_benefit"]["costs"]["total"]
    );
}

#[tokio::test]
async fn appraisal_rejects_blank_postcode() {
    let mut payload = appraisal_payload();
    payload["listing"]["postcode"] = json!("  ");

    let response = router()
        .oneshot(json_request("POST", "/api/v1/appraisals", &payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_verification_is_not_found() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/properties/rm-0000/verification")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verification_path_must_match_body() {
    let body = serde_json::to_value(freehold_record("rm-other")).expect("record json");

    let response = router()
        .oneshot(json_request(
            "PUT",
            "/api/v1/properties/rm-7731/verification",
            &body,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json(response).await;
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn recorded_verification_is_served_and_drives_appraisal() {
    let app = router();
    let body = serde_json::to_value(freehold_record("rm-7731")).expect("record json");

    let put = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/properties/rm-7731/verification",
            &body,
        ))
        .await
        .expect("response");
    assert_eq!(put.status(), StatusCode::OK);
    let outcome = read_json(put).await;
    assert_eq!(outcome["fully_verified"], false);
    assert_eq!(outcome["summary"]["has_blockers"], false);

    let get = app
        .clone()
        .oneshot(
            Request::get("/api/v1/properties/rm-7731/verification")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(get.status(), StatusCode::OK);
    let stored = read_json(get).await;
    assert_eq!(stored["property_id"], "rm-7731");

    let appraisal = app
        .oneshot(json_request("POST", "/api/v1/appraisals", &appraisal_payload()))
        .await
        .expect("response");
    assert_eq!(appraisal.status(), StatusCode::OK);
    let appraisal = read_json(appraisal).await;
    assert_eq!(appraisal["stage"], "partially_verified");
    assert!(appraisal["impacts"]
        .as_array()
        .is_some_and(|impacts| !impacts.is_empty()));
}

struct OfflineRepository;

impl VerificationRepository for OfflineRepository {
    fn save(&self, _record: VerificationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &PropertyId) -> Result<Option<VerificationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

#[tokio::test]
async fn unavailable_repository_is_a_server_error() {
    let service = AppraisalService::new(
        Arc::new(OfflineRepository),
        Arc::new(EngineConfig::default()),
    );
    let app = appraisal_router(Arc::new(service));
    let body = serde_json::to_value(freehold_record("rm-7731")).expect("record json");

    let put = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/properties/rm-7731/verification",
            &body,
        ))
        .await
        .expect("response");
    assert_eq!(put.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json(put).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("store offline")));

    let get = app
        .oneshot(
            Request::get("/api/v1/properties/rm-7731/verification")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(get.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
