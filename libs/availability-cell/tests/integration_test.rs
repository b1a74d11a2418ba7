use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Local, NaiveTime};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::router::availability_routes;
use availability_cell::AvailabilityService;
use shared_utils::test_utils::{MockHospitalResponses, TestConfig};

fn create_test_service(mock_server: &MockServer) -> Arc<AvailabilityService> {
    let config = TestConfig::with_api_url(&mock_server.uri()).to_app_config();
    Arc::new(AvailabilityService::from_config(&config).unwrap())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_department_preload_fetches_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doctors/departments/5/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::department_doctors(10, 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "POST", "/departments/doctors", Some(json!({ "ids": ["5"] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["departments"][0]["status"]["state"], "ready");
    assert_eq!(body["departments"][0]["doctors"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "POST", "/departments/doctors", Some(json!({ "ids": ["5", "5"] }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/departments/5/doctors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["doctors"][0]["id"], "10");
    assert_eq!(body["doctors"][0]["name"], "ThS. Nguyễn Văn 10");
    assert_eq!(body["doctors"][0]["department_id"], "5");
}

#[tokio::test]
async fn test_schedule_slots_and_dates_over_http() {
    let mock_server = MockServer::start().await;
    let tomorrow = Local::now().date_naive() + Duration::days(1);

    Mock::given(method("GET"))
        .and(path("/doctors/7/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockHospitalResponses::schedule_response(100, 7, tomorrow, "08:00:00", "10:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/appointments/schedule/100/available-slots"))
        .and(body_json(json!({ "startTime": "08:00:00", "endTime": "10:00:00" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::slot_run(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            4,
            3,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "POST", "/doctors/schedules", Some(json!({ "ids": ["7"] }))).await;
    assert_eq!(status, StatusCode::OK);
    let schedule = &body["doctors"][0]["schedules"][0];
    assert_eq!(schedule["schedule_id"], 100);
    assert_eq!(schedule["slots"].as_array().unwrap().len(), 4);
    assert_eq!(schedule["slot_status"]["state"], "ready");

    let (status, body) = send(&app, "POST", "/doctors/dates", Some(json!({ "ids": ["7"] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window_days"], 7);
    let dates = body["doctors"][0]["dates"].as_array().unwrap();
    assert_eq!(dates.len(), 7);
    assert_eq!(dates[1]["available_slots_count"], 3);
    assert_eq!(dates[1]["schedule_ids"], json!([100]));

    let (status, body) = send(&app, "POST", "/schedules/slots", Some(json!({ "ids": [100] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedules"][0]["slots"].as_array().unwrap().len(), 4);

    let (status, body) = send(&app, "GET", "/schedules/100/slots", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"][0]["id"], "100-0");
    assert_eq!(body["slots"][0]["time"], "08:00 - 08:30");
    assert_eq!(body["slots"][3]["is_booked"], true);
    assert_eq!(body["status"]["state"], "ready");

    let (status, body) = send(&app, "GET", "/doctors/7/dates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dates"][0]["is_today"], true);
}

#[tokio::test]
async fn test_upstream_error_is_recorded_as_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doctors/departments/3/doctors"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(MockHospitalResponses::error_response("database offline", "INTERNAL")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "POST", "/departments/doctors", Some(json!({ "ids": ["3"] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["departments"][0]["status"]["state"], "failed");
    assert_eq!(body["departments"][0]["status"]["attempts"], 1);
    assert_eq!(body["departments"][0]["doctors"], json!([]));
}

#[tokio::test]
async fn test_uncached_entries_are_not_found() {
    let mock_server = MockServer::start().await;
    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "GET", "/doctors/99/schedules", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = send(&app, "GET", "/schedules/5/slots", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/departments/1/doctors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_preload_requests_are_rejected() {
    let mock_server = MockServer::start().await;
    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "POST", "/departments/doctors", Some(json!({ "ids": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, _) = send(&app, "POST", "/doctors/dates", Some(json!({ "ids": ["7"], "window_days": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/doctors/dates", Some(json!({ "ids": ["7"], "window_days": 61 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_loading_and_clear_endpoints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doctors/departments/5/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::department_doctors(10, 1)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "GET", "/loading", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "department_ids": [], "doctor_ids": [] }));

    send(&app, "POST", "/departments/doctors", Some(json!({ "ids": ["5"] }))).await;

    let (status, body) = send(&app, "DELETE", "/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], true);

    let (status, _) = send(&app, "GET", "/departments/5/doctors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Cleared entries are fetched again.
    send(&app, "POST", "/departments/doctors", Some(json!({ "ids": ["5"] }))).await;
    let (status, _) = send(&app, "GET", "/departments/5/doctors", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_disposed_service_is_unavailable() {
    let mock_server = MockServer::start().await;
    let service = create_test_service(&mock_server);
    service.dispose().await;
    let app = availability_routes(service);

    let (status, body) = send(&app, "POST", "/doctors/schedules", Some(json!({ "ids": ["7"] }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "unavailable");
}

#[tokio::test]
async fn test_preload_reports_trimmed_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doctors/departments/5/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockHospitalResponses::department_doctors(10, 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = availability_routes(create_test_service(&mock_server));

    let (status, body) = send(&app, "POST", "/departments/doctors", Some(json!({ "ids": [" 5", "5 ", ""] }))).await;
    assert_eq!(status, StatusCode::OK);
    let departments = body["departments"].as_array().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["department_id"], "5");
    assert_eq!(departments[0]["status"]["state"], "ready");
    assert_eq!(departments[0]["doctors"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "POST", "/doctors/schedules", Some(json!({ "ids": ["  "] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
