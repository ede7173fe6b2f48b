mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn patient_lifecycle() {
    let app = app().await;

    let (status, created) = post(&app, "/api/patients", json!({"nhc": "N001", "sex": "F"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["nhc"], "N001");
    assert_eq!(created["sex"], "F");

    let (status, updated) = patch(&app, "/api/patients/N001", json!({"sex": "M"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["sex"], "M");
    assert_eq!(updated["nhc"], "N001");

    let (status, body) = delete(&app, "/api/patients/N001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = get(&app, "/api/patients/N001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "Patient not found");
}

#[tokio::test]
async fn fixed_endpoints() {
    let app = app().await;

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "TechConnect API is running"}));

    let (_, body) = get(&app, "/api/health").await;
    assert_eq!(body, json!({"status": "healthy"}));

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "ok"}));

    let (_, body) = get(&app, "/version").await;
    assert_eq!(body["name"], "techconnect-api");

    let (_, body) = get(&app, "/info").await;
    let entities = body["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 18);
    assert!(entities
        .iter()
        .any(|e| e["path"] == "/api/genomic-sequencings" && e["name"] == "GenomicSequencing"));
}

#[tokio::test]
async fn every_entity_reports_missing_rows() {
    let app = app().await;
    let (_, info) = get(&app, "/info").await;
    let missing = uuid::Uuid::new_v4().to_string();

    for entity in info["entities"].as_array().unwrap() {
        let base = entity["path"].as_str().unwrap();
        let uri = format!("{}/{}", base, missing);
        let expected = format!("{} not found", entity["name"].as_str().unwrap());

        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", uri);
        assert_eq!(body["error"]["message"], expected.as_str());

        let (status, _) = patch(&app, &uri, json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "PATCH {}", uri);

        let (status, _) = delete(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {}", uri);

        let (status, body) = get(&app, base).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}

#[tokio::test]
async fn malformed_uuid_is_not_found() {
    let app = app().await;
    let (status, body) = get(&app, "/api/mice/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Mouse not found");
}

#[tokio::test]
async fn list_limit_is_clamped() {
    let app = app().await;
    for i in 0..105 {
        create(&app, "patients", json!({"nhc": format!("P{:03}", i)})).await;
    }

    let (status, body) = get(&app, "/api/patients?limit=1000").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 100);
    assert_eq!(rows[0]["nhc"], "P000");

    let (_, body) = get(&app, "/api/patients?offset=100").await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["nhc"], "P100");

    let (_, body) = get(&app, "/api/patients?offset=10&limit=2").await;
    let nhcs: Vec<_> = body.as_array().unwrap().iter().map(|r| r["nhc"].clone()).collect();
    assert_eq!(nhcs, vec![json!("P010"), json!("P011")]);

    let (status, body) = get(&app, "/api/patients?limit=5000000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 100);

    let (status, body) = get(&app, "/api/patients?offset=18446744073709551615").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_query_is_rejected() {
    let app = app().await;
    let (status, body) = get(&app, "/api/patients?limit=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn non_object_body_is_bad_request() {
    let app = app().await;
    let (status, body) = post(&app, "/api/patients", json!(["N001"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = app_with(&[("CORS_ORIGINS", "https://lab.example.org")]).await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/patients")
        .header("origin", "https://lab.example.org")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "https://lab.example.org");
    assert_eq!(headers["access-control-allow-credentials"], "true");
}
