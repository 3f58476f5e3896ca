mod common;

use axum::http::{header, StatusCode};
use common::{body_json, delete, get, multipart_request, TestApp};
use parcelmap::services::plot_number::is_generated_format;
use serde_json::{json, Value};

const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[-2.3,6.1],[-2.3,6.2],[-2.4,6.2],[-2.4,6.1],[-2.3,6.1]]]}"#;

fn plot_fields<'a>(plot_number: &'a str, geom: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("plot_number", plot_number),
        ("owner_name", "Kwame Asante"),
        ("address", "12 Market Road, Bibiani"),
        ("area_sqm", "150.5"),
        ("compliance_status", "compliant"),
        ("land_use", ""),
        ("development_status", "vacant"),
        ("additional_info", "corner plot"),
        ("geom", geom),
    ]
}

async fn create_plot(app: &TestApp, cookie: &str, plot_number: &str) -> Value {
    let response = app
        .send(multipart_request(
            "POST",
            "/plots",
            cookie,
            &plot_fields(plot_number, SQUARE),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_create_without_number_generates_one_and_round_trips_geometry() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let created = create_plot(&app, &cookie, "").await;
    assert_eq!(created["message"], "Plot created successfully");

    let plot_number = created["plot_number"].as_str().unwrap();
    assert!(is_generated_format(plot_number), "got {}", plot_number);

    let id = created["plot_id"].as_i64().unwrap();
    let response = app.send(get(&format!("/plots/{}", id), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let plot = body_json(response).await;
    assert_eq!(plot["id"], id);
    assert_eq!(plot["plot_number"], plot_number);
    assert_eq!(plot["area_sqm"], 150.5);
    assert_eq!(plot["land_use"], Value::Null);
    assert_eq!(plot["development_status"], "vacant");
    assert_eq!(plot["image_path"], Value::Null);
    assert_eq!(plot["geom"], serde_json::from_str::<Value>(SQUARE).unwrap());
}

#[tokio::test]
async fn test_duplicate_number_conflicts_with_free_suggestion() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    create_plot(&app, &cookie, "BIB-100").await;

    let response = app
        .send(multipart_request(
            "POST",
            "/plots",
            &cookie,
            &plot_fields("BIB-100", SQUARE),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Plot number already exists");
    let suggestion = body["suggested_plot_number"].as_str().unwrap();
    assert!(is_generated_format(suggestion));

    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plots WHERE plot_number = ?")
        .bind(suggestion)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(taken, 0);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let id = create_plot(&app, &cookie, "").await["plot_id"].as_i64().unwrap();
    let uri = format!("/plots/{}", id);

    let response = app.send(delete(&uri, &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Plot deleted successfully");

    let response = app.send(get(&uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Plot not found");

    let response = app.send(delete(&uri, &cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disallowed_upload_is_ignored() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let response = app
        .send(multipart_request(
            "POST",
            "/plots",
            &cookie,
            &plot_fields("", SQUARE),
            Some(("payload.exe", b"MZ")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["plot_id"].as_i64().unwrap();

    let plot = body_json(app.send(get(&format!("/plots/{}", id), Some(&cookie))).await).await;
    assert_eq!(plot["image_path"], Value::Null);
    assert!(!app.dir.path().join("uploads/payload.exe").exists());
}

#[tokio::test]
async fn test_allowed_upload_is_stored_and_served() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let response = app
        .send(multipart_request(
            "POST",
            "/plots",
            &cookie,
            &plot_fields("", SQUARE),
            Some(("site photo.PNG", b"\x89PNG fake")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["plot_id"].as_i64().unwrap();

    let plot = body_json(app.send(get(&format!("/plots/{}", id), Some(&cookie))).await).await;
    assert_eq!(
        plot["image_path"],
        "http://testserver/uploads/site_photo.PNG"
    );

    let response = app.send(get("/uploads/site_photo.PNG", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get("/uploads/missing.png", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_overwrites_fields_and_keeps_image() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let response = app
        .send(multipart_request(
            "POST",
            "/plots",
            &cookie,
            &plot_fields("BIB-200", SQUARE),
            Some(("plan.jpg", b"jpeg")),
        ))
        .await;
    let id = body_json(response).await["plot_id"].as_i64().unwrap();

    let triangle = r#"{"type":"Polygon","coordinates":[[[-2.31,6.11],[-2.32,6.12],[-2.33,6.11],[-2.31,6.11]]]}"#;
    let fields = vec![
        ("plot_number", "BIB-201"),
        ("owner_name", "Efua Mensah"),
        ("address", "4 Mine Street"),
        ("area_sqm", "99"),
        ("compliance_status", "under review"),
        ("geom", triangle),
    ];

    let response = app
        .send(multipart_request(
            "PUT",
            &format!("/plots/{}", id),
            &cookie,
            &fields,
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Plot updated successfully");
    let plot = &body["plot"];
    assert_eq!(plot["plot_number"], "BIB-201");
    assert_eq!(plot["owner_name"], "Efua Mensah");
    assert_eq!(plot["area_sqm"], 99.0);
    assert_eq!(plot["development_status"], Value::Null);
    assert_eq!(plot["additional_info"], Value::Null);
    assert_eq!(plot["image_path"], "http://testserver/uploads/plan.jpg");
    assert_eq!(plot["geom"], serde_json::from_str::<Value>(triangle).unwrap());
}

#[tokio::test]
async fn test_update_to_taken_number_conflicts() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    create_plot(&app, &cookie, "BIB-300").await;
    let id = create_plot(&app, &cookie, "BIB-301").await["plot_id"]
        .as_i64()
        .unwrap();

    let response = app
        .send(multipart_request(
            "PUT",
            &format!("/plots/{}", id),
            &cookie,
            &plot_fields("BIB-300", SQUARE),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_json(response).await["suggested_plot_number"].is_string());

    let plot = body_json(app.send(get(&format!("/plots/{}", id), Some(&cookie))).await).await;
    assert_eq!(plot["plot_number"], "BIB-301");
}

#[tokio::test]
async fn test_update_missing_plot() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let response = app
        .send(multipart_request(
            "PUT",
            "/plots/4242",
            &cookie,
            &plot_fields("BIB-1", SQUARE),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_submissions_are_bad_requests() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    let point = r#"{"type":"Point","coordinates":[-2.3,6.1]}"#;
    let response = app
        .send(multipart_request(
            "POST",
            "/plots",
            &cookie,
            &plot_fields("", point),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut fields = plot_fields("", SQUARE);
    fields.retain(|(name, _)| *name != "owner_name");
    let response = app
        .send(multipart_request("POST", "/plots", &cookie, &fields, None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "owner_name is required");

    let mut fields = plot_fields("", SQUARE);
    fields.retain(|(name, _)| *name != "area_sqm");
    fields.push(("area_sqm", "-5"));
    let response = app
        .send(multipart_request("POST", "/plots", &cookie, &fields, None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plots")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_list_returns_plots_in_id_order() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    create_plot(&app, &cookie, "BIB-A").await;
    create_plot(&app, &cookie, "BIB-B").await;

    let response = app.send(get("/plots", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let plots = body_json(response).await;
    let numbers: Vec<&str> = plots
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["plot_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["BIB-A", "BIB-B"]);
}

#[tokio::test]
async fn test_api_requires_session() {
    let app = TestApp::new().await;

    let response = app.send(get("/plots", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Authentication required");

    let response = app
        .send(common::json_post("/save_polygon", None, &json!({ "geom": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let app = TestApp::new().await;

    let response = app.send(get("/nowhere", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(response).await, json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn test_non_numeric_plot_id_is_json_not_found() {
    let app = TestApp::new().await;
    let cookie = app.logged_in().await;

    for response in [
        app.send(get("/plots/abc", Some(&cookie))).await,
        app.send(delete("/plots/1.5", &cookie)).await,
        app.send(multipart_request(
            "PUT",
            "/plots/abc",
            &cookie,
            &plot_fields("BIB-1", SQUARE),
            None,
        ))
        .await,
    ] {
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_json(response).await, json!({ "error": "Not Found" }));
    }
}
