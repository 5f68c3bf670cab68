use super::*;
use axum::{body, body::Body, http::Request};
use serde_json::json;
use tower::ServiceExt;

fn test_app(store: Store) -> Router {
    build_router(Arc::new(AppState::new(store)))
}

async fn json_body(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    let raw = payload.to_string();
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("content-length", raw.len())
        .body(Body::from(raw))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let response = test_app(Store::new())
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"ok");
}

#[tokio::test]
async fn list_shape_follows_the_page_parameter() {
    let app = test_app(Store::seeded());

    let bare = app
        .clone()
        .oneshot(Request::get("/funcionarios").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(bare.status(), StatusCode::OK);
    assert_eq!(json_body(bare).await.as_array().map(Vec::len), Some(2));

    let paged = app
        .oneshot(
            Request::get("/clientes?page=1&limit=1&search=central")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let envelope = json_body(paged).await;
    assert_eq!(envelope["total"], json!(1));
    assert_eq!(envelope["page"], json!(1));
    assert_eq!(envelope["data"][0]["nome"], json!("Mercado Central"));
}

#[tokio::test]
async fn create_then_duplicate_is_rejected_with_a_message() {
    let app = test_app(Store::new());
    let payload = json!({ "nome": "Ana", "cpf": "123.456.789-00" });

    let created = app
        .clone()
        .oneshot(json_request("POST", "/funcionarios", payload.clone()))
        .await
        .expect("response");
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await["id"], json!(1));

    let duplicate = app
        .oneshot(json_request("POST", "/funcionarios", payload))
        .await
        .expect("response");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(duplicate).await["message"], json!("CPF duplicado"));
}

#[tokio::test]
async fn patch_and_status_routes_update_the_record() {
    let app = test_app(Store::seeded());

    let updated = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/funcionarios/1",
            json!({ "cargo": "Supervisão", "aprovadorId": null }),
        ))
        .await
        .expect("response");
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = json_body(updated).await;
    assert_eq!(updated["cargo"], json!("Supervisão"));
    assert_eq!(updated["aprovadorId"], Value::Null);

    let toggled = app
        .oneshot(json_request(
            "PATCH",
            "/funcionarios/1/status",
            json!({ "status": "inativo" }),
        ))
        .await
        .expect("response");
    assert_eq!(json_body(toggled).await["status"], json!("inativo"));
}

#[tokio::test]
async fn linked_crop_delete_returns_the_conflict_body() {
    let app = test_app(Store::seeded());

    let blocked = app
        .clone()
        .oneshot(
            Request::delete("/culturas/1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(blocked.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(blocked).await,
        json!({ "error": "Cultura vinculada", "detalhes": "3 plantios ativos" })
    );

    let removed = app
        .oneshot(
            Request::delete("/culturas/2")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn bad_input_maps_to_client_errors() {
    let app = test_app(Store::new());

    let missing = app
        .clone()
        .oneshot(json_request("POST", "/culturas", json!({ "nome": "Soja" })))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let not_an_object = app
        .clone()
        .oneshot(json_request("POST", "/culturas", json!(["Soja"])))
        .await
        .expect("response");
    assert_eq!(not_an_object.status(), StatusCode::BAD_REQUEST);

    let bad_id = app
        .clone()
        .oneshot(json_request("PATCH", "/culturas/abc", json!({ "nome": "x" })))
        .await
        .expect("response");
    assert_eq!(bad_id.status(), StatusCode::NOT_FOUND);

    let unknown = app
        .oneshot(Request::get("/plantios").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let app = test_app(Store::new());
    let huge = "x".repeat(MAX_BODY_BYTES + 1);

    let response = app
        .oneshot(json_request(
            "POST",
            "/funcionarios",
            json!({ "nome": huge, "cpf": "1" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
