mod common;

use axum::http::{Method, StatusCode};
use common::{BrokenUserRepository, InMemoryUserRepository, app, send, send_raw};
use core_config::Environment;
use serde_json::{Value, json};
use test_utils::TestDataBuilder;

fn missing_id(test_name: &str) -> String {
    TestDataBuilder::from_test_name(test_name).object_id().to_hex()
}

async fn create(app: &axum::Router, first: &str, last: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        Some(json!({ "firstName": first, "lastName": last, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

fn paths(body: &Value) -> Vec<String> {
    body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn create_returns_trimmed_view() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "firstName": "  Ada ", "lastName": " Lovelace", "email": " ada@example.com  " })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    assert_eq!(data["firstName"], "Ada");
    assert_eq!(data["lastName"], "Lovelace");
    assert_eq!(data["email"], "ada@example.com");
    assert_eq!(data["id"].as_str().unwrap().len(), 24);
    assert_eq!(data["createdAt"], data["lastModifiedAt"]);
    assert!(data.get("deletedAt").is_none());
}

#[tokio::test]
async fn create_with_bad_email_is_unprocessable() {
    let repo = InMemoryUserRepository::default();
    let app = app(repo.clone(), Environment::Development);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "firstName": "Ada", "lastName": "Lovelace", "email": "not-an-email" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], "Validation");
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(paths(&body), vec!["body.email"]);
    assert_eq!(body["detail"][0]["message"], "Invalid email format");
    assert_eq!(repo.calls(), 0);
}

#[tokio::test]
async fn create_with_empty_body_lists_every_field() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let (status, body) = send(&app, Method::POST, "/api/users", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        paths(&body),
        vec!["body.firstName", "body.lastName", "body.email"]
    );
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"firstName\":"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_bad_request() {
    let repo = InMemoryUserRepository::default();
    let app = app(repo.clone(), Environment::Production);

    let padding = "a".repeat(3 * 1024 * 1024);
    let body = json!({ "firstName": padding, "lastName": "Lovelace", "email": "ada@example.com" });
    let (status, body) = send_raw(&app, Method::POST, "/api/users", body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "Invalid request" }));
    assert_eq!(repo.calls(), 0);
}

#[tokio::test]
async fn non_object_body_is_bad_request() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    for raw in ["[1,2]", "\"ada\"", "42"] {
        let (status, body) = send_raw(&app, Method::POST, "/api/users", raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}");
        assert_eq!(body["message"], "Invalid request");
        assert_eq!(body["error"], "BadRequestError");
    }
}

#[tokio::test]
async fn mistyped_field_is_reported_with_other_violations() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "firstName": 5, "lastName": "Lovelace", "email": "not-an-email" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let paths: Vec<_> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, ["body.firstName", "body.email"]);
}

#[tokio::test]
async fn duplicate_email_conflicts_and_keeps_first_user() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    let first = create(&app, "Ada", "Lovelace", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "firstName": "Augusta", "lastName": "King", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");
    assert_eq!(body["error"], "ConflictError");

    let uri = format!("/api/users/{}", first["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["firstName"], "Ada");
}

#[tokio::test]
async fn get_unknown_user_is_not_found() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let uri = format!("/api/users/{}", missing_id("get_unknown_user"));
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn malformed_id_is_unprocessable_on_every_route() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let routes = [
        (Method::GET, "/api/users/abc123", None),
        (
            Method::PATCH,
            "/api/users/abc123",
            Some(json!({ "firstName": "Augusta" })),
        ),
        (Method::DELETE, "/api/users/abc123", None),
        (Method::PATCH, "/api/users/abc123/restore", None),
    ];

    for (method, uri, body) in routes {
        let (status, body) = send(&app, method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{method} {uri}");
        assert_eq!(paths(&body), vec!["params.id"], "{method} {uri}");
        assert_eq!(
            body["detail"][0]["message"],
            "Invalid id format, must be a 24 character hex string"
        );
    }
}

#[tokio::test]
async fn update_reports_id_and_body_violations_together() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let (status, body) = send(&app, Method::PATCH, "/api/users/abc123", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(paths(&body), vec!["params.id", "body.updateData"]);
}

#[tokio::test]
async fn empty_update_never_reaches_repository() {
    let repo = InMemoryUserRepository::default();
    let app = app(repo.clone(), Environment::Development);
    let user = create(&app, "Ada", "Lovelace", "ada@example.com").await;
    let calls = repo.calls();

    let uri = format!("/api/users/{}", user["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        json!([{
            "path": "body.updateData",
            "message": "At least one field firsName or lastName must be provided for updating"
        }])
    );
    assert_eq!(repo.calls(), calls);
}

#[tokio::test]
async fn update_changes_names_and_touches_timestamp() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    let user = create(&app, "Ada", "Lovelace", "ada@example.com").await;

    let uri = format!("/api/users/{}", user["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "lastName": " King " }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["firstName"], "Ada");
    assert_eq!(body["data"]["lastName"], "King");
    assert!(body["data"]["lastModifiedAt"].as_str().unwrap() > user["lastModifiedAt"].as_str().unwrap());
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let uri = format!("/api/users/{}", missing_id("update_unknown_user"));
    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "firstName": "Ada" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_restore_lifecycle() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    let user = create(&app, "Ada", "Lovelace", "ada@example.com").await;
    let uri = format!("/api/users/{}", user["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    // Deleted users are still readable and carry deletedAt.
    let (_, deleted) = send(&app, Method::GET, &uri, None).await;
    let deleted = deleted["data"].clone();
    assert!(deleted["deletedAt"].is_string());
    assert!(deleted["lastModifiedAt"].as_str().unwrap() > user["lastModifiedAt"].as_str().unwrap());

    // A second delete is a no-op.
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, again) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(again["data"]["lastModifiedAt"], deleted["lastModifiedAt"]);

    let restore_uri = format!("{uri}/restore");
    let (status, body) = send(&app, Method::PATCH, &restore_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let restored = &body["data"];
    assert!(restored.get("deletedAt").is_none());
    assert!(
        restored["lastModifiedAt"].as_str().unwrap() > deleted["lastModifiedAt"].as_str().unwrap()
    );

    let (status, body) = send(&app, Method::PATCH, &restore_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not valid for recovery");
}

#[tokio::test]
async fn delete_unknown_user_is_not_found() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let uri = format!("/api/users/{}", missing_id("delete_unknown_user"));
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn list_hides_deleted_users_unless_asked() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    create(&app, "Ada", "Lovelace", "ada@example.com").await;
    let gone = create(&app, "Alan", "Turing", "alan@example.com").await;
    let uri = format!("/api/users/{}", gone["id"].as_str().unwrap());
    send(&app, Method::DELETE, &uri, None).await;

    let (status, body) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["email"], "ada@example.com");

    let (_, body) = send(&app, Method::GET, "/api/users?includeDeleted=true", None).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn list_filters_case_insensitively() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    create(&app, "Ada", "Lovelace", "ada@example.com").await;
    create(&app, "Grace", "Hopper", "grace@navy.mil").await;

    let (status, body) = send(&app, Method::GET, "/api/users?lastName=HOPP", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["firstName"], "Grace");
}

#[tokio::test]
async fn list_sorts_by_email_descending() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    create(&app, "Bob", "Brown", "bob@example.com").await;
    create(&app, "Cid", "Clark", "cid@example.com").await;
    create(&app, "Ann", "Adams", "ann@example.com").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/users?sortBy=email&sortOrder=desc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec!["cid@example.com", "bob@example.com", "ann@example.com"]
    );
}

#[tokio::test]
async fn list_limit_bounds() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);
    create(&app, "Ada", "Lovelace", "ada@example.com").await;
    create(&app, "Grace", "Hopper", "grace@navy.mil").await;

    for limit in ["0", "101"] {
        let (status, body) = send(&app, Method::GET, &format!("/api/users?limit={limit}"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "limit={limit}");
        assert_eq!(paths(&body), vec!["query.limit"]);
        assert_eq!(
            body["detail"][0]["message"],
            "limit must be an integer between 1 and 100"
        );
    }

    let (status, body) = send(&app, Method::GET, "/api/users?limit=100&offset=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (_, body) = send(&app, Method::GET, "/api/users?limit=1&offset=1&sortBy=firstName", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["firstName"], "Grace");
}

#[tokio::test]
async fn list_rejects_negative_offset() {
    let app = app(InMemoryUserRepository::default(), Environment::Development);

    let (status, body) = send(&app, Method::GET, "/api/users?offset=-1", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["message"], "offset must be a non-negative integer");
}

#[tokio::test]
async fn internal_errors_hide_diagnostics_in_production() {
    let environment = Environment::classify("PRODUCTION");
    assert!(environment.is_production());
    let app = app(BrokenUserRepository, environment);

    let (status, body) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Internal server error" })
    );
}

#[tokio::test]
async fn internal_errors_show_diagnostics_in_development() {
    for raw in ["development", "staging", "prod", ""] {
        let app = app(BrokenUserRepository, Environment::classify(raw));

        let (status, body) = send(&app, Method::GET, "/api/users", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "InternalServerError");
        assert!(body["stack"].as_str().unwrap().contains("server selection timeout"));
    }
}

#[tokio::test]
async fn unknown_route_gets_not_found_envelope() {
    let app = app(InMemoryUserRepository::default(), Environment::Production);

    let (status, body) = send(&app, Method::GET, "/api/nothing-here", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Resource not found" })
    );
}
