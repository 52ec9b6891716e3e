/// API integration tests
/// Tests complete HTTP request/response cycles with real database
mod common;

use accounts_server::{api, services::AccountManager, AppState, UserExtras};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{create_test_app, fixtures};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

const CREATE_USER_URL: &str = "/users/create/";
const TOKEN_URL: &str = "/users/token/";
const ME_URL: &str = "/users/me/";

/// Send a request and return the status, headers, and parsed JSON body
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, headers, json)
}

async fn create_user(accounts: &AccountManager, email: &str, password: &str, name: &str) {
    accounts
        .create_user(
            Some(email),
            Some(password),
            UserExtras {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

async fn token_for(app: &Router, email: &str, password: &str) -> String {
    let (status, _, body) = send(
        app,
        "POST",
        TOKEN_URL,
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

// --- Registration ---

#[tokio::test]
async fn test_create_valid_user_success() {
    let (app, accounts, _dir) = create_test_app().await;

    let payload = json!({
        "email": fixtures::TEST_EMAIL,
        "password": fixtures::TEST_PASSWORD,
        "name": fixtures::TEST_NAME,
    });
    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({ "email": fixtures::TEST_EMAIL, "name": fixtures::TEST_NAME })
    );
    assert!(body.get("password").is_none());

    let user = accounts
        .find_by_email(fixtures::TEST_EMAIL)
        .await
        .unwrap()
        .expect("user should be persisted");
    assert!(accounts
        .check_password(&user, fixtures::TEST_PASSWORD)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_create_user_without_name() {
    let (app, _accounts, _dir) = create_test_app().await;

    let payload = json!({ "email": "noname@example.com", "password": "secret" });
    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "");
}

#[tokio::test]
async fn test_user_exists() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;

    let payload = json!({ "email": fixtures::TEST_EMAIL, "password": "otherpass" });
    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"][0], "user with this email already exists.");
    assert_eq!(accounts.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_password_too_short() {
    let (app, accounts, _dir) = create_test_app().await;

    let payload = json!({ "email": fixtures::TEST_EMAIL, "password": "pw" });
    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["password"][0],
        "Ensure this field has at least 5 characters."
    );
    assert!(accounts
        .find_by_email(fixtures::TEST_EMAIL)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_password_longer_than_bcrypt_input_is_rejected() {
    let (app, accounts, _dir) = create_test_app().await;
    let prefix = "a".repeat(72);

    let payload = json!({
        "email": fixtures::TEST_EMAIL,
        "password": format!("{}REALSECRETSUFFIX", prefix),
    });
    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["password"][0],
        "Ensure this field has no more than 72 bytes."
    );
    assert!(accounts.list_users().await.unwrap().is_empty());

    // At the limit the password is stored; a longer one sharing its bytes never matches
    let payload = json!({ "email": fixtures::TEST_EMAIL, "password": prefix });
    let (status, _, _) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let payload = json!({
        "email": fixtures::TEST_EMAIL,
        "password": format!("{}totally-different", prefix),
    });
    let (status, _, body) = send(&app, "POST", TOKEN_URL, None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());

    token_for(&app, fixtures::TEST_EMAIL, &prefix).await;
}

#[tokio::test]
async fn test_create_user_invalid_email() {
    let (app, accounts, _dir) = create_test_app().await;

    let payload = json!({ "email": "not-an-email", "password": "secret" });
    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"][0], "Enter a valid email address.");
    assert!(accounts.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_user_missing_fields() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, _, body) = send(&app, "POST", CREATE_USER_URL, None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"][0], "This field is required.");
    assert_eq!(body["password"][0], "This field is required.");
    assert!(body.get("name").is_none());
}

#[tokio::test]
async fn test_create_user_rejects_non_object_payload() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, _, body) =
        send(&app, "POST", CREATE_USER_URL, None, Some(json!(["a", "b"]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["non_field_errors"][0],
        "Invalid data. Expected a dictionary, but got list."
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _accounts, _dir) = create_test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri(CREATE_USER_URL)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("JSON parse error"));
}

#[tokio::test]
async fn test_create_user_wrong_method() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, _, body) = send(&app, "GET", CREATE_USER_URL, None, None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["detail"], "Method \"GET\" not allowed.");
}

// --- Token ---

#[tokio::test]
async fn test_create_token_for_user() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;

    let first = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;
    assert_eq!(first.len(), 40);

    // Repeated logins return the same key
    let second = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_create_token_invalid_credentials() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;

    let payloads = [
        json!({ "email": fixtures::TEST_EMAIL, "password": "wrong" }),
        json!({ "email": "nobody@example.com", "password": fixtures::TEST_PASSWORD }),
        json!({ "email": fixtures::TEST_EMAIL, "password": "" }),
        json!({ "email": fixtures::TEST_EMAIL }),
    ];

    for payload in payloads {
        let (status, _, body) = send(&app, "POST", TOKEN_URL, None, Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("token").is_none());
        assert_eq!(
            body["non_field_errors"][0],
            "Unable to authenticate with provided credentials"
        );
    }
}

#[tokio::test]
async fn test_create_token_inactive_user() {
    let (db, _dir) = common::create_test_database().await;
    let accounts = common::accounts_over(db.clone());
    let app = api::router(AppState::new(Arc::clone(&accounts)));
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;

    let user = accounts
        .find_by_email(fixtures::TEST_EMAIL)
        .await
        .unwrap()
        .unwrap();
    let token = accounts.obtain_token(&user).await.unwrap();

    // Deactivation has no HTTP surface; flip the flag in storage
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user.id.get())
        .execute(db.pool())
        .await
        .unwrap();

    let payload = json!({ "email": fixtures::TEST_EMAIL, "password": fixtures::TEST_PASSWORD });
    let (status, _, body) = send(&app, "POST", TOKEN_URL, None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());

    let (status, _, body) = send(&app, "GET", ME_URL, Some(&token.key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "User inactive or deleted.");
}

// --- Profile ---

#[tokio::test]
async fn test_retrieve_user_unauthorized() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, headers, body) = send(&app, "GET", ME_URL, None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["detail"],
        "Authentication credentials were not provided."
    );
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Token");
}

#[tokio::test]
async fn test_retrieve_profile_success() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(
        &accounts,
        fixtures::TEST_EMAIL,
        fixtures::TEST_PASSWORD,
        fixtures::TEST_NAME,
    )
    .await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let (status, _, body) = send(&app, "GET", ME_URL, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "email": fixtures::TEST_EMAIL, "name": fixtures::TEST_NAME })
    );
}

#[tokio::test]
async fn test_bearer_scheme_is_accepted() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let request = Request::builder()
        .uri(ME_URL)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, _, body) = send(&app, "GET", ME_URL, Some("deadbeef"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token.");
}

#[tokio::test]
async fn test_post_me_not_allowed() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let (status, _, body) = send(&app, "POST", ME_URL, Some(&token), Some(json!({}))).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["detail"], "Method \"POST\" not allowed.");
}

#[tokio::test]
async fn test_update_user_profile() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(
        &accounts,
        fixtures::TEST_EMAIL,
        fixtures::TEST_PASSWORD,
        fixtures::TEST_NAME,
    )
    .await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let payload = json!({ "name": "new name", "password": "newpassword123" });
    let (status, _, body) = send(&app, "PATCH", ME_URL, Some(&token), Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "email": fixtures::TEST_EMAIL, "name": "new name" })
    );

    let user = accounts
        .authenticate(fixtures::TEST_EMAIL, "newpassword123")
        .await
        .unwrap()
        .expect("new password should authenticate");
    assert_eq!(user.name, "new name");
    assert!(accounts
        .authenticate(fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await
        .unwrap()
        .is_none());

    // The existing token keeps working after a password change
    let (status, _, _) = send(&app, "GET", ME_URL, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_rejects_short_password() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let payload = json!({ "password": "abc" });
    let (status, _, body) = send(&app, "PATCH", ME_URL, Some(&token), Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("password").is_some());
    assert!(accounts
        .authenticate(fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_update_email_taken_by_other_user() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;
    create_user(&accounts, "other@example.com", "otherpass", "").await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let taken = json!({ "email": "other@example.com" });
    let (status, _, body) = send(&app, "PATCH", ME_URL, Some(&token), Some(taken)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"][0], "user with this email already exists.");

    // Re-submitting one's own email is not a conflict
    let own = json!({ "email": fixtures::TEST_EMAIL });
    let (status, _, _) = send(&app, "PATCH", ME_URL, Some(&token), Some(own)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_put_requires_all_fields() {
    let (app, accounts, _dir) = create_test_app().await;
    create_user(&accounts, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD, "").await;
    let token = token_for(&app, fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD).await;

    let (status, _, body) = send(
        &app,
        "PUT",
        ME_URL,
        Some(&token),
        Some(json!({ "name": "only name" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"][0], "This field is required.");
    assert_eq!(body["password"][0], "This field is required.");

    let full = json!({
        "email": "renamed@example.com",
        "password": "replaced1",
        "name": "Full",
    });
    let (status, _, body) = send(&app, "PUT", ME_URL, Some(&token), Some(full)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "email": "renamed@example.com", "name": "Full" }));
}

// --- Misc ---

#[tokio::test]
async fn test_health_check() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, _, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let (db, _dir) = common::create_test_database().await;
    let app = api::router(AppState::new(common::accounts_over(db.clone())));

    db.pool().close().await;

    let (status, _, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "unreachable");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _accounts, _dir) = create_test_app().await;

    let (status, _, body) = send(&app, "GET", "/nope/", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found.");
}
