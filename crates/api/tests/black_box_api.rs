use std::collections::HashMap;

use reqwest::StatusCode;
use serde_json::{Value, json};

use warden_api::config::ApiConfig;

const ROOT_USER: &str = "root";
const ROOT_PASSWORD: &str = "root-password";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("JWT_SECRET".to_string(), "black-box-test-secret-0123456789abcdef".to_string()),
            ("BOOTSTRAP_ADMIN_USERNAME".to_string(), ROOT_USER.to_string()),
            ("BOOTSTRAP_ADMIN_PASSWORD".to_string(), ROOT_PASSWORD.to_string()),
            ("BOOTSTRAP_ADMIN_EMAIL".to_string(), "root@example.org".to_string()),
        ]);
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }
        let config = ApiConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid test config");

        // Same router as prod (in-memory store), bound to an ephemeral port.
        let app = warden_api::app::build_app(&config).await.expect("app builds");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "login as {username}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["token_type"], "Bearer");
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn create_user(&self, token: &str, username: &str, roles: &[&str]) -> reqwest::Response {
        self.client
            .post(self.url("/users"))
            .bearer_auth(token)
            .json(&json!({
                "username": username,
                "password": "pw",
                "email": format!("{username}@example.org"),
                "roles": roles,
            }))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn roles_of(body: &Value) -> Vec<&str> {
    let mut roles: Vec<&str> = body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    roles.sort();
    roles
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let missing = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let missing: Value = missing.json().await.unwrap();

    let garbage = srv.get("/users/me", "not-a-token").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    let garbage: Value = garbage.json().await.unwrap();

    // Same body whatever the cause.
    assert_eq!(missing, garbage);
    assert_eq!(missing["error"], "unauthorized");
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "username": ROOT_USER, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_ignores_requested_roles() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/register"))
        .json(&json!({
            "username": "alice",
            "password": "pw",
            "email": "alice@example.org",
            "roles": ["ROLE_SUPER_ADMIN"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(roles_of(&body), vec!["ROLE_USER"]);

    let token = srv.login("alice", "pw").await;
    let who: Value = srv.get("/whoami", &token).await.json().await.unwrap();
    assert_eq!(who["username"], "alice");
    assert_eq!(roles_of(&who), vec!["ROLE_USER"]);

    // A plain user cannot list accounts.
    assert_eq!(srv.get("/users", &token).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_editors_and_cannot_touch_super_admin() {
    let srv = TestServer::spawn().await;
    let root = srv.login(ROOT_USER, ROOT_PASSWORD).await;
    let root_me: Value = srv.get("/users/me", &root).await.json().await.unwrap();
    let root_id = root_me["id"].as_str().unwrap().to_string();

    let res = srv.create_user(&root, "adm", &["ROLE_ADMIN"]).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(res.headers().contains_key(reqwest::header::LOCATION));

    let adm = srv.login("adm", "pw").await;
    let res = srv.create_user(&adm, "dave", &["ROLE_ADMIN", "ROLE_SUPER_ADMIN"]).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let dave: Value = res.json().await.unwrap();
    assert_eq!(roles_of(&dave), vec!["ROLE_EDITOR"]);

    let res = srv
        .client
        .put(srv.url(&format!("/users/{root_id}/roles")))
        .bearer_auth(&adm)
        .json(&json!({ "roles": ["ROLE_EDITOR"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{root_id}")))
        .bearer_auth(&adm)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let root_after: Value = srv.get("/users/me", &root).await.json().await.unwrap();
    assert_eq!(roles_of(&root_after), vec!["ROLE_SUPER_ADMIN"]);
}

#[tokio::test]
async fn duplicate_username_is_bad_request() {
    let srv = TestServer::spawn().await;
    let root = srv.login(ROOT_USER, ROOT_PASSWORD).await;
    assert_eq!(srv.create_user(&root, "erin", &[]).await.status(), StatusCode::CREATED);
    assert_eq!(srv.create_user(&root, "erin", &[]).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn iam_endpoints_validate_permission_codes() {
    let srv = TestServer::spawn().await;
    let root = srv.login(ROOT_USER, ROOT_PASSWORD).await;

    let catalog: Value = srv.get("/admin/users/permissions", &root).await.json().await.unwrap();
    assert_eq!(catalog.as_array().unwrap().len(), 5);

    let roles: Value = srv.get("/admin/users/roles", &root).await.json().await.unwrap();
    let editor_id = roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "ROLE_EDITOR")
        .and_then(|r| r["id"].as_str())
        .unwrap()
        .to_string();
    let path = format!("/admin/users/roles/{editor_id}/permissions");

    let res = srv
        .client
        .put(srv.url(&path))
        .bearer_auth(&root)
        .json(&json!(["PROGRAM:ACADEMIC:READ", "BOGUS:CODE"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let perms: Value = srv.get(&path, &root).await.json().await.unwrap();
    assert_eq!(perms, json!([]));

    let res = srv
        .client
        .put(srv.url(&path))
        .bearer_auth(&root)
        .json(&json!(["PROGRAM:ACADEMIC:READ"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let perms: Value = srv.get(&path, &root).await.json().await.unwrap();
    assert_eq!(perms, json!(["PROGRAM:ACADEMIC:READ"]));
}

#[tokio::test]
async fn functional_permissions_flow_into_next_token() {
    let srv = TestServer::spawn().await;
    let root = srv.login(ROOT_USER, ROOT_PASSWORD).await;
    let created: Value = srv.create_user(&root, "fay", &["ROLE_EDITOR"]).await.json().await.unwrap();
    let fay_id = created["id"].as_str().unwrap().to_string();

    let fay_before = srv.login("fay", "pw").await;

    let res = srv
        .client
        .put(srv.url(&format!("/admin/users/{fay_id}/permissions")))
        .bearer_auth(&root)
        .json(&json!(["PROGRAM:PROGRAMME:UPDATE"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The old token keeps its snapshot; a fresh login sees the grant.
    let stale: Value = srv.get("/whoami", &fay_before).await.json().await.unwrap();
    assert_eq!(stale["permissions"], json!([]));

    let fay_after = srv.login("fay", "pw").await;
    let fresh: Value = srv.get("/whoami", &fay_after).await.json().await.unwrap();
    assert_eq!(roles_of(&fresh), vec!["PROGRAMME_EDITOR", "ROLE_EDITOR"]);
    assert_eq!(
        fresh["permissions"],
        json!(["PROGRAM:PROGRAMME:READ", "PROGRAM:PROGRAMME:UPDATE"])
    );

    // An editor without the IAM permission cannot use the admin surface.
    assert_eq!(
        srv.get("/admin/users/permissions", &fay_after).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn malformed_and_unknown_ids_are_not_found() {
    let srv = TestServer::spawn().await;
    let root = srv.login(ROOT_USER, ROOT_PASSWORD).await;
    assert_eq!(srv.get("/users/not-a-uuid", &root).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        srv.get("/users/01890a5d-ac96-774b-bcce-b302099a8057", &root).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let srv = TestServer::spawn_with(&[("JWT_EXPIRATION_MS", "2000")]).await;
    let root = srv.login(ROOT_USER, ROOT_PASSWORD).await;
    assert_eq!(srv.get("/whoami", &root).await.status(), StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert_eq!(srv.get("/whoami", &root).await.status(), StatusCode::UNAUTHORIZED);
}
