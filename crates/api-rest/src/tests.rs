//! Router tests over the in-memory store.

use super::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use ips_core::store::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let store: Arc<dyn store::RecordStore> = Arc::new(MemoryStore::new());
    router(AppState::new(store, Arc::new(CoreConfig::in_memory())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn patient_body(document_number: &str) -> Value {
    json!({
        "document_type": "CC",
        "document_number": document_number,
        "first_name": "Ana",
        "first_surname": "Gómez",
        "birth_date": "1990-05-12",
        "sex": "FEMALE"
    })
}

async fn create_patient(app: &Router, document_number: &str) -> String {
    let (status, body) = send(app, Method::POST, "/patients", Some(patient_body(document_number))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("patient should have an id").to_string()
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/chronic-controls/{id}"].is_object());
    assert!(body["paths"]["/maternal-perinatal"].is_object());
    assert!(body["paths"]["/adolescence/age-range/{min_age}/{max_age}"].is_object());
    assert!(body["paths"]["/public-health-settings/{id}/families"].is_object());
}

#[tokio::test]
async fn test_patient_lifecycle() {
    let app = app();
    let id = create_patient(&app, "52111222").await;

    let (status, body) = send(&app, Method::POST, "/patients", Some(patient_body("52111222"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().expect("detail").contains("52111222"));

    let (status, body) = send(&app, Method::GET, "/patients?document_number=52111222", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let mut replacement = patient_body("52111222");
    replacement["first_name"] = json!("Ana María");
    let (status, body) =
        send(&app, Method::PUT, &format!("/patients/{id}"), Some(replacement)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Ana María");

    let (status, _) = send(&app, Method::DELETE, &format!("/patients/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/patients/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_path_id_is_rejected() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/patients/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_typed_encounter_links_generic_encounter() {
    let app = app();
    let patient_id = create_patient(&app, "1011223344").await;

    let visit = json!({
        "patient_id": patient_id,
        "encounter_date": "2024-03-05",
        "weight_kg": 30.0,
        "height_cm": 130.0,
        "school_grade": "3"
    });
    let (status, created) = send(&app, Method::POST, "/childhood", Some(visit)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["assessment"].is_object());
    let detail_id = created["id"].as_str().expect("detail id").to_string();
    let encounter_id = created["encounter_id"].as_str().expect("encounter id").to_string();

    let (status, encounter) =
        send(&app, Method::GET, &format!("/encounters/{encounter_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(encounter["kind"], "CHILDHOOD");
    assert_eq!(encounter["detail_id"], json!(detail_id));

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/childhood/patient/{patient_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().map(Vec::len), Some(1));

    // the generic row cannot be removed while the detail points at it
    let (status, _) =
        send(&app, Method::DELETE, &format!("/encounters/{encounter_id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, &format!("/childhood/{detail_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/encounters/{encounter_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_patient_leaves_no_rows() {
    let app = app();
    let visit = json!({
        "patient_id": uuid::Uuid::new_v4(),
        "encounter_date": "2024-03-05",
        "weight_kg": 30.0,
        "height_cm": 130.0
    });
    let (status, body) = send(&app, Method::POST, "/childhood", Some(visit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().expect("detail").contains("patient"));

    let (_, encounters) = send(&app, Method::GET, "/encounters", None).await;
    assert_eq!(encounters.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_chronic_control_with_detail_and_stats() {
    let app = app();
    let patient_id = create_patient(&app, "79888777").await;

    let control = json!({
        "patient_id": patient_id,
        "encounter_date": "2024-06-10",
        "condition": "DIABETES",
        "control_status": "CONTROLLED",
        "adherence": "GOOD",
        "weight_kg": 70.0,
        "height_cm": 175.0,
        "diabetes": {"diabetes_type": "TYPE2", "hba1c_pct": 6.8, "uses_insulin": false}
    });
    let (status, created) = send(&app, Method::POST, "/chronic-controls", Some(control)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["assessment"]["control_adequate"], true);
    assert_eq!(created["diabetes"]["hba1c_pct"], 6.8);
    let id = created["id"].as_str().expect("control id").to_string();

    let (status, fetched) = send(&app, Method::GET, &format!("/chronic-controls/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["condition_detail_id"], created["diabetes"]["id"]);

    let (status, by_condition) =
        send(&app, Method::GET, "/chronic-controls/condition/DIABETES", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_condition.as_array().map(Vec::len), Some(1));

    let (status, stats) = send(&app, Method::GET, "/chronic-controls/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["diabetes"], 1);
    assert_eq!(stats["controlled_pct"], 100.0);
}

#[tokio::test]
async fn test_occupation_search_requires_term() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/occupations?term=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = send(&app, Method::GET, "/occupations/2211", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_care_plan_finalize_and_report() {
    let app = app();
    let plan = json!({
        "code": "PAI-001",
        "approach": "PRIMARY_PREVENTION",
        "subject": "COMMUNITY",
        "started_at": "2024-01-10T08:00:00Z"
    });
    let (status, created) = send(&app, Method::POST, "/integral-care-plans", Some(plan)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "PLANNED");
    let id = created["id"].as_str().expect("plan id").to_string();

    let (status, finalized) = send(
        &app,
        Method::POST,
        &format!("/integral-care-plans/{id}/finalize"),
        Some(json!({"closing_notes": "Objetivos cumplidos"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finalized["status"], "COMPLETED");
    assert!(finalized["actual_end_at"].is_string());

    let (status, fetched) =
        send(&app, Method::GET, "/integral-care-plans/code/PAI-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], json!(id));

    let (status, report) = send(&app, Method::GET, "/integral-care-plans/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_plans"], 1);
}

#[tokio::test]
async fn test_life_stage_listings_and_stats() {
    let app = app();
    let patient_id = create_patient(&app, "80123456").await;

    let visit = json!({
        "patient_id": patient_id,
        "encounter_date": "2024-04-02",
        "age_years": 35,
        "sex": "MALE"
    });
    let (status, _) = send(&app, Method::POST, "/adulthood", Some(visit)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, low) = send(&app, Method::GET, "/adulthood/cardiovascular-risk/LOW", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low.as_array().map(Vec::len), Some(1));

    let (status, stats) = send(&app, Method::GET, "/adulthood/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["low_risk"], 1);

    let (status, _) = send(&app, Method::GET, "/adulthood/cardiovascular-risk/EXTREME", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/adolescence/age-range/20/15", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, alerts) = send(&app, Method::GET, "/adolescence/alerts/high-risk", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts.as_array().map(Vec::len), Some(0));

    let (status, stats) = send(&app, Method::GET, "/childhood/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 0);

    let (status, _) = send(
        &app,
        Method::GET,
        "/old-age/geriatric-report?date_from=2024-06-01&date_to=2024-01-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, report) = send(
        &app,
        Method::GET,
        "/old-age/geriatric-report?date_from=2024-01-01&date_to=2024-06-30",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], 0);
}

#[tokio::test]
async fn test_families_by_setting_route() {
    let app = app();
    let setting_id = uuid::Uuid::new_v4();
    for (code, setting) in [("FAM-1", Some(setting_id)), ("FAM-2", None)] {
        let family = json!({
            "family_code": code,
            "structure": "NUCLEAR_TWO_PARENT",
            "life_cycle": "YOUNG_CHILDREN",
            "total_members": 3,
            "setting_id": setting
        });
        let (status, _) = send(&app, Method::POST, "/family-units", Some(family)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, families) = send(
        &app,
        Method::GET,
        &format!("/public-health-settings/{setting_id}/families"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(families.as_array().map(Vec::len), Some(1));
    assert_eq!(families[0]["family_code"], "FAM-1");

    let (status, report) = send(&app, Method::GET, "/family-units/report/life-cycle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_families"], 2);
    assert_eq!(report["by_life_cycle"][0]["members"], 6);
}

#[tokio::test]
async fn test_care_plan_evaluations_and_complexity_routes() {
    let app = app();
    let plan = json!({
        "code": "PAI-010",
        "approach": "PRIMARY_PREVENTION",
        "subject": "COMMUNITY",
        "complexity": "HIGH",
        "status": "IN_PROGRESS",
        "started_at": "2024-01-10T08:00:00Z",
        "next_evaluation_on": "2024-02-01"
    });
    let (status, _) = send(&app, Method::POST, "/integral-care-plans", Some(plan)).await;
    assert_eq!(status, StatusCode::CREATED);

    // the evaluation date has long passed, so it is due in any window
    let (status, due) = send(&app, Method::GET, "/integral-care-plans/upcoming-evaluations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(due.as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        Method::GET,
        "/integral-care-plans/upcoming-evaluations?days=400",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, report) =
        send(&app, Method::GET, "/integral-care-plans/report/complexity", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_plans"], 1);
    assert_eq!(report["by_complexity"][0]["complexity"], "HIGH");
    assert_eq!(report["by_complexity"][0]["in_progress"], 1);
}

#[tokio::test]
async fn test_screening_adherence_and_catalogue_routes() {
    let app = app();
    let (status, report) = send(
        &app,
        Method::GET,
        "/cancer-screenings/adherence-report?screening_type=BREAST",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["screening_type"], "BREAST");
    assert_eq!(report["total"], 0);

    let (status, stats) = send(&app, Method::GET, "/occupations/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 0);

    let (status, categories) = send(&app, Method::GET, "/occupations/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories.as_array().map(Vec::len), Some(0));

    let (status, _) = send(&app, Method::GET, "/occupations/categories?per_category=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, validation) = send(&app, Method::GET, "/occupations/validate/2211", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], false);
    assert_eq!(validation["code"], "2211");
}
