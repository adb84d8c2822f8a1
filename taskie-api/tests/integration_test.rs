/// Integration tests for the Taskie API
///
/// These drive the full router against PostgreSQL:
/// - Registration, login and the session cookie
/// - Password reset by mail
/// - Collection and task CRUD, owner scoping and admin access
/// - Collection delete removing its tasks
///
/// Run with `cargo test -- --ignored` and `DATABASE_URL` pointing at a
/// scratch database.

mod common;

use axum::http::{header, StatusCode};
use common::{TestContext, PASSWORD};
use serde_json::json;
use taskie_shared::auth::authorization::{ADMIN, USER};
use taskie_shared::auth::jwt::{create_token, ResetClaims};
use taskie_shared::auth::password::verify_password;
use taskie_shared::models::task::Task;
use taskie_shared::models::user::User;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_register_then_login() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("Reg-{}@Example.com", Uuid::new_v4());

    let res = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json);
    assert_eq!(res.json["message"], "User created successfully");
    assert_eq!(res.json["user"]["email"], email.to_lowercase());
    assert_eq!(res.json["user"]["roleName"], "user");
    assert!(res.json["user"].get("passwordHash").is_none());

    let duplicate = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.json["message"], "Email already exists.");

    let wrong = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "Wrong!123" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json["message"], "Invalid credentials");

    let login = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": PASSWORD, "rememberMe": true })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json["message"], "Login successful");

    let set_cookie = login.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let me = ctx.request("GET", "/auth/auth-token", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json["user"]["email"], email.to_lowercase());

    let user = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_login_unknown_user() {
    let ctx = TestContext::new().await.unwrap();

    let res = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": format!("{}@example.com", Uuid::new_v4()), "password": PASSWORD })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json["message"], "User not found");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_collection_and_task_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(USER).await.unwrap();
    let cookie = ctx.cookie_for(&user);
    let base = format!("/users/{}", user.id);

    let empty = ctx.request("GET", &format!("{base}/collections"), Some(&cookie), None).await;
    assert_eq!(empty.status, StatusCode::NO_CONTENT);

    let created = ctx
        .request(
            "POST",
            &format!("{base}/collections"),
            Some(&cookie),
            Some(json!({ "name": "Work", "icon": "briefcase" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.json);
    let collection_id = created.json["collection"]["id"].as_i64().unwrap();

    let task = ctx
        .request(
            "POST",
            &format!("{base}/tasks"),
            Some(&cookie),
            Some(json!({
                "title": "Report",
                "description": "Q1 numbers",
                "collectionId": collection_id,
                "endAt": "2025-03-01"
            })),
        )
        .await;
    assert_eq!(task.status, StatusCode::CREATED, "{}", task.json);
    assert_eq!(task.json["task"]["endAt"], "2025-03-01T00:00:00Z");
    let task_id = task.json["task"]["id"].as_str().unwrap().to_string();

    let updated = ctx
        .request(
            "PATCH",
            &format!("{base}/tasks/{task_id}"),
            Some(&cookie),
            Some(json!({ "completed": true, "endAt": "" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["task"]["completed"], true);
    assert!(updated.json["task"]["endAt"].is_null());
    assert_eq!(updated.json["task"]["title"], "Report");

    // Soft-deleted tasks drop out of the default listing
    ctx.request(
        "PATCH",
        &format!("{base}/tasks/{task_id}"),
        Some(&cookie),
        Some(json!({ "deleted": true })),
    )
    .await;
    let listed = ctx.request("GET", &format!("{base}/tasks"), Some(&cookie), None).await;
    assert_eq!(listed.status, StatusCode::NO_CONTENT);
    let listed = ctx
        .request("GET", &format!("{base}/tasks?includeDeleted=true"), Some(&cookie), None)
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.json.as_array().unwrap().len(), 1);

    let in_collection = ctx
        .request(
            "GET",
            &format!("{base}/collections/{collection_id}/tasks?includeDeleted=true"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(in_collection.status, StatusCode::OK);

    let deleted = ctx
        .request("DELETE", &format!("{base}/tasks/{task_id}"), Some(&cookie), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json["message"], "Task deleted successfully");

    let gone = ctx
        .request("GET", &format!("{base}/tasks/{task_id}"), Some(&cookie), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json["message"], "Task not found");

    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_task_in_foreign_collection_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user(USER).await.unwrap();
    let intruder = ctx.create_user(USER).await.unwrap();

    let created = ctx
        .request(
            "POST",
            &format!("/users/{}/collections", owner.id),
            Some(&ctx.cookie_for(&owner)),
            Some(json!({ "name": "Private", "icon": "lock" })),
        )
        .await;
    let collection_id = created.json["collection"]["id"].as_i64().unwrap();

    let res = ctx
        .request(
            "POST",
            &format!("/users/{}/tasks", intruder.id),
            Some(&ctx.cookie_for(&intruder)),
            Some(json!({ "title": "Sneak", "description": "in", "collectionId": collection_id })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json["message"], "Collection not found");

    ctx.cleanup(&owner).await.unwrap();
    ctx.cleanup(&intruder).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_collection_delete_removes_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(USER).await.unwrap();
    let cookie = ctx.cookie_for(&user);
    let base = format!("/users/{}", user.id);

    let created = ctx
        .request(
            "POST",
            &format!("{base}/collections"),
            Some(&cookie),
            Some(json!({ "name": "Errands", "icon": "cart" })),
        )
        .await;
    let collection_id = created.json["collection"]["id"].as_i64().unwrap();

    for title in ["Milk", "Bread"] {
        let res = ctx
            .request(
                "POST",
                &format!("{base}/tasks"),
                Some(&cookie),
                Some(json!({ "title": title, "description": "shop", "collectionId": collection_id })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let deleted = ctx
        .request(
            "DELETE",
            &format!("{base}/collections/{collection_id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json["collection"]["id"], collection_id);

    let remaining = Task::list_by_user(&ctx.db, user.id, true).await.unwrap();
    assert!(remaining.is_empty());

    let again = ctx
        .request(
            "DELETE",
            &format!("{base}/collections/{collection_id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.json["message"], "Collection not found");

    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_admin_reaches_other_users() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(ADMIN).await.unwrap();
    let user = ctx.create_user(USER).await.unwrap();
    let cookie = ctx.cookie_for(&admin);

    let listed = ctx.request("GET", "/users?limit=1000", Some(&cookie), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert!(listed
        .json
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["id"] == user.id.to_string()));

    let profile = ctx
        .request("GET", &format!("/users/{}", user.id), Some(&cookie), None)
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.json["email"], user.email);

    let missing = ctx
        .request("GET", &format!("/users/{}", Uuid::new_v4()), Some(&cookie), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json["message"], "User not found");

    ctx.cleanup(&admin).await.unwrap();
    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_profile_and_portrait_update() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(USER).await.unwrap();
    let cookie = ctx.cookie_for(&user);
    let path = format!("/users/{}", user.id);

    let res = ctx
        .request(
            "PATCH",
            &path,
            Some(&cookie),
            Some(json!({ "name": "Renamed", "roleName": "admin" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["user"]["name"], "Renamed");
    assert_eq!(res.json["user"]["roleName"], "user");

    let res = ctx
        .request(
            "PATCH",
            &format!("{path}/portrait"),
            Some(&cookie),
            Some(json!({ "portrait": "https://example.com/ada.png" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["user"]["portrait"], "https://example.com/ada.png");

    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_password_reset_flow() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(USER).await.unwrap();

    let res = ctx
        .request(
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({ "email": user.email })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Reset link sent to your email");

    let message = ctx.mailer.sent.lock().unwrap().pop().unwrap();
    assert_eq!(message.to, user.email);
    let token = message
        .html
        .split("/reset-password/")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();

    let valid = ctx
        .request("GET", &format!("/auth/reset-password-validation/{token}"), None, None)
        .await;
    assert_eq!(valid.status, StatusCode::OK);

    let weak = ctx
        .request(
            "PATCH",
            &format!("/auth/reset-password/{token}"),
            None,
            Some(json!({ "password": "weak" })),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let res = ctx
        .request(
            "PATCH",
            &format!("/auth/reset-password/{token}"),
            None,
            Some(json!({ "password": "Fresh!456" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Password updated successfully");

    let stored = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert!(verify_password("Fresh!456", &stored.password_hash).unwrap());

    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_reset_for_deleted_user() {
    let ctx = TestContext::new().await.unwrap();
    let token = create_token(&ResetClaims::new(Uuid::new_v4()), &ctx.config.jwt.secret).unwrap();

    let res = ctx
        .request(
            "PATCH",
            &format!("/auth/reset-password/{token}"),
            None,
            Some(json!({ "password": "Fresh!456" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_forgot_password_without_mailer() {
    let ctx = TestContext::without_mailer().await.unwrap();
    let user = ctx.create_user(USER).await.unwrap();

    let res = ctx
        .request(
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({ "email": user.email })),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json["message"], "Sendgrid key not provided");

    let unknown = ctx
        .request(
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({ "email": format!("{}@example.com", Uuid::new_v4()) })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    ctx.cleanup(&user).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_health_reports_database() {
    let ctx = TestContext::new().await.unwrap();

    let res = ctx.request("GET", "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["database"], "connected");
    assert_eq!(res.json["migrations"]["is_up_to_date"], true);
}
