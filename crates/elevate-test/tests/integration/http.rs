//! HTTP surface: routing, status mapping, JSON bodies and CORS.

use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn healthcheck_answers_without_token() {
    let harness = TestHarness::new().await;
    let service = harness.service();

    let response = TestRequest::get("/api/app/healthcheck")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(response.body_string(), "OK");
}

#[test_log::test(tokio::test)]
async fn preflight_is_answered_with_cors_headers() {
    let harness = TestHarness::new().await;
    let service = harness.service();

    let response = TestRequest::options("/api/app/invite")
        .header("origin", "https://portal.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization, content-type")
        .send(&service)
        .await;

    assert!(response.status.is_success(), "status {}", response.status);
    assert!(
        response
            .get_header("access-control-allow-origin")
            .is_some()
    );
}

#[test_log::test(tokio::test)]
async fn invite_without_token_is_401() {
    let harness = TestHarness::new().await;
    let service = harness.service();

    let _ = TestRequest::post("/api/app/invite")
        .json_body(&json!({"name": "Taro", "email": "taro@example.com", "role": "player"}))
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_code("UNAUTHENTICATED");
}

#[test_log::test(tokio::test)]
async fn invite_over_http() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let admin = harness.admin(None);

    let _ = TestRequest::post("/api/app/invite")
        .bearer(&admin.token)
        .json_body(&json!({"name": "Taro", "email": "taro@example.com", "role": "admin"}))
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_code("UNAUTHORIZED");

    let response = TestRequest::post("/api/app/invite")
        .bearer(&admin.token)
        .json_body(&json!({"name": "Taro", "email": "taro@example.com", "role": "player"}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["role"], "player");
    assert_eq!(harness.store.users_with_email("taro@example.com").len(), 1);

    let _ = TestRequest::post("/api/app/invite")
        .bearer(&admin.token)
        .json_body(&json!({"name": "Taro", "email": "taro@example.com", "role": "player"}))
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("DUPLICATE_EMAIL");
}

#[test_log::test(tokio::test)]
async fn user_token_header_is_accepted() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let player = harness.player(None);

    let response = TestRequest::get("/api/app/whoami")
        .header("x-user-token", &player.token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    let body = response.json();
    assert_eq!(body["email"], "player@example.com");
    assert_eq!(body["role"], "player");
}

#[test_log::test(tokio::test)]
async fn malformed_body_is_400() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();

    let _ = TestRequest::post("/api/app/invite")
        .bearer(&creator.token)
        .raw_body("{not json", "application/json")
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("VALIDATION_ERROR");

    let _ = TestRequest::post("/api/app/invite")
        .bearer(&creator.token)
        .json_body(&json!({"name": "Taro", "email": "taro@example.com", "role": "overlord"}))
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn delete_unknown_account_is_404() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();

    let _ = TestRequest::post("/api/app/delete")
        .bearer(&creator.token)
        .json_body(&json!({"target_id": uuid::Uuid::new_v4()}))
        .send(&service)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_code("NOT_FOUND");
}

#[test_log::test(tokio::test)]
async fn delete_over_http() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();
    let player = harness.player(None);

    let response = TestRequest::post("/api/app/delete")
        .bearer(&creator.token)
        .json_body(&json!({"target_id": player.user.id}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(response.json()["success"], true);
    assert!(harness.store.user(player.user.id).is_none());
}

#[test_log::test(tokio::test)]
async fn delete_across_organizations_is_401() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let kanto = harness.organization("Kanto");
    let kansai = harness.organization("Kansai");
    let admin = harness.admin(Some(kanto.id));
    let foreign = harness.seed_account("Jiro", "jiro@example.com", Role::Player, Some(kansai.id));

    let _ = TestRequest::post("/api/app/delete")
        .bearer(&admin.token)
        .json_body(&json!({"target_id": foreign.user.id}))
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_code("UNAUTHORIZED");
    assert!(harness.store.user(foreign.user.id).is_some());
}

#[test_log::test(tokio::test)]
async fn activation_reports_weak_password() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();

    let _ = TestRequest::post("/api/app/invite")
        .bearer(&creator.token)
        .json_body(&json!({"name": "Taro", "email": "taro@example.com", "role": "player"}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    let token = harness
        .identity
        .activation_token_for("taro@example.com")
        .expect("activation token issued");

    let _ = TestRequest::post("/api/app/completeActivation")
        .json_body(&json!({"activation_token": token, "password": "abcde"}))
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("WEAK_PASSWORD");

    let response = TestRequest::post("/api/app/completeActivation")
        .json_body(&json!({"activation_token": token, "password": "abcdef"}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert!(body["session"]["access_token"].is_string());
}

#[test_log::test(tokio::test)]
async fn users_listing_by_role() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();
    let _admin = harness.admin(None);
    let _player = harness.player(None);

    let response = TestRequest::get("/api/app/users?role=player")
        .bearer(&creator.token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    let users = response.json()["users"]
        .as_array()
        .expect("users array")
        .clone();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "player@example.com");

    let _ = TestRequest::get("/api/app/users?role=wizard")
        .bearer(&creator.token)
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let _ = TestRequest::get("/api/app/users")
        .bearer(&creator.token)
        .header("x-organization-id", "not-a-uuid")
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn organization_switch_over_http() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();
    let kanto = harness.organization("Kanto");

    let response = TestRequest::post("/api/app/switchOrganization")
        .bearer(&creator.token)
        .json_body(&json!({"organization_id": kanto.id}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(response.json()["organization_id"], kanto.id.to_string());

    let active = TestRequest::get("/api/app/organizations/active")
        .bearer(&creator.token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(active.json()["organization_id"], kanto.id.to_string());

    let listing = TestRequest::get("/api/app/organizations")
        .bearer(&creator.token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(listing.json()["organizations"][0]["name"], "Kanto");
}

#[test_log::test(tokio::test)]
async fn reconcile_over_http_is_creator_only() {
    let harness = TestHarness::new().await;
    let service = harness.service();
    let creator = harness.creator();
    let player = harness.player(None);

    let _ = TestRequest::post("/api/app/reconcile")
        .bearer(&player.token)
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_code("UNAUTHORIZED");

    let response = TestRequest::post("/api/app/reconcile")
        .bearer(&creator.token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(response.json()["examined"], 2);
}
