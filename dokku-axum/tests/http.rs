use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use dokku_axum::{router, AppState};
use dokku_core::{CommandExecutor, CommandOutput, QuotaUpdate, ResourceStore, Role, Settings};
use dokku_store::MemoryStore;

const API_KEY: &str = "api-key";
const MASTER_KEY: &str = "master-key";

#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<(String, Role)>>,
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, command: &str, role: Role) -> CommandOutput {
        self.calls.lock().push((command.to_string(), role));
        CommandOutput::ok("")
    }
}

struct TestApi {
    router: Router,
    store: Arc<MemoryStore>,
    executor: Arc<RecordingExecutor>,
}

async fn test_api(rate_limit_per_minute: u32) -> TestApi {
    let settings = Settings {
        api_key: Some(API_KEY.to_string()),
        master_key: Some(MASTER_KEY.to_string()),
        rate_limit_per_minute,
        ..Settings::default()
    };
    let store = Arc::new(MemoryStore::new());
    let executor = Arc::new(RecordingExecutor::default());

    store.create_tenant("dev@example.com", "token").await.unwrap();
    store
        .update_quota(
            "dev@example.com",
            QuotaUpdate {
                apps_quota: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let state = AppState::new(&settings, executor.clone(), store.clone());
    TestApi {
        router: router(state),
        store,
        executor,
    }
}

fn tenant_request(method: &str, uri: &str, api_key: &str, token: &str) -> Request<Body> {
    let sep = if uri.contains('?') { '&' } else { '?' };
    Request::builder()
        .method(method)
        .uri(format!("{uri}{sep}api_key={api_key}"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"email": "dev@example.com", "access_token": token}).to_string(),
        ))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, master_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = master_key {
        builder = builder.header("MASTER-KEY", key);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn quota_ceiling_over_http() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/first", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(json_body(res).await, json!({"success": true, "result": ""}));

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/second", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await, json!({"detail": "Quota exceeded"}));

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("DELETE", "/api/apps/first", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/second", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let calls: Vec<String> = api.executor.calls.lock().iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(
        calls,
        vec![
            "apps:create 1-first",
            "--force apps:destroy 1-first",
            "apps:create 1-second"
        ]
    );
}

#[tokio::test]
async fn bad_credentials_are_forbidden() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/list", "wrong", "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await, json!({"detail": "Invalid or missing API key"}));

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/list", API_KEY, "wrong"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The master key is accepted in place of the API key.
    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/list", MASTER_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/apps/list?api_key={API_KEY}"))
                .header("content-type", "application/json")
                .body(Body::from("{\"email\":"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["detail"].is_string());
}

#[tokio::test]
async fn admin_routes_need_the_master_key() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(admin_request("POST", "/api/admin/users/list", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = api
        .router
        .clone()
        .oneshot(admin_request("POST", "/api/admin/users/list", Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = api
        .router
        .clone()
        .oneshot(admin_request("POST", "/api/admin/users/list", Some(MASTER_KEY)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["result"][0]["email"], "dev@example.com");
    assert!(body["result"][0].get("access_token").is_none());
}

#[tokio::test]
async fn admin_manages_users_and_quotas() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/users/new@example.com?access_token=secret",
            Some(MASTER_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = api
        .router
        .clone()
        .oneshot(admin_request(
            "PUT",
            "/api/admin/users/new@example.com/quota?apps_quota=3&networks_quota=2",
            Some(MASTER_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let tenant = api.store.get_tenant("new@example.com").await.unwrap();
    assert_eq!(tenant.quotas.apps_quota, 3);
    assert_eq!(tenant.quotas.networks_quota, 2);
    assert_eq!(tenant.quotas.services_quota, 0);

    let res = api
        .router
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/users/new@example.com?access_token=other",
            Some(MASTER_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await, json!({"detail": "User already exists"}));

    let res = api
        .router
        .clone()
        .oneshot(admin_request("DELETE", "/api/admin/users/ghost@example.com", Some(MASTER_KEY)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await, json!({"detail": "User not found"}));
}

#[tokio::test]
async fn admin_plugin_install_runs_as_root() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(admin_request("POST", "/api/admin/plugins/postgres", Some(MASTER_KEY)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let calls = api.executor.calls.lock().clone();
    assert_eq!(
        calls,
        vec![(
            "plugin:install https://github.com/dokku/dokku-postgres.git".to_string(),
            Role::Root
        )]
    );
}

#[tokio::test]
async fn unknown_resource_kind_is_bad_request() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(admin_request("POST", "/api/admin/resources/volumes", Some(MASTER_KEY)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_is_bad_request_with_detail() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(admin_request(
            "PUT",
            "/api/admin/users/dev@example.com/quota?apps_quota=-1",
            Some(MASTER_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["detail"].is_string());

    let tenant = api.store.get_tenant("dev@example.com").await.unwrap();
    assert_eq!(tenant.quotas.apps_quota, 1);
}

#[tokio::test]
async fn malformed_port_is_checked_after_authentication() {
    let api = test_api(1000).await;
    api.store
        .reserve("dev@example.com", "1-web", dokku_core::ResourceKind::App)
        .await
        .unwrap();

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/web/ports/http/abc/80", API_KEY, "wrong"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/web/ports/http/abc/80", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await, json!({"detail": "Invalid port: abc"}));
    assert!(api.executor.calls.lock().is_empty());
}

#[tokio::test]
async fn clone_answers_created_and_takes_a_slot() {
    let api = test_api(1000).await;
    api.store
        .update_quota(
            "dev@example.com",
            QuotaUpdate {
                apps_quota: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/web", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/copy/clone/web", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/copy/exists", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(json_body(res).await, json!({"success": true, "result": true}));

    let res = api
        .router
        .clone()
        .oneshot(tenant_request("POST", "/api/apps/other/clone/web", API_KEY, "token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await, json!({"detail": "Quota exceeded"}));

    let calls: Vec<String> = api.executor.calls.lock().iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(calls, vec!["apps:create 1-web", "apps:clone 1-web 1-copy"]);
}

#[tokio::test]
async fn index_reports_name_and_version() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!({"name": "Dokku API", "version": "0.1.0"}));
}

#[tokio::test]
async fn request_id_is_set_and_propagated() {
    let api = test_api(1000).await;

    let res = api
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(res.headers().get("x-request-id").is_some());

    let res = api
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn rate_limit_answers_too_many_requests() {
    let api = test_api(2).await;

    let health = || {
        Request::builder()
            .uri("/api/health")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let res = api.router.clone().oneshot(health()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = api.router.clone().oneshot(health()).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json_body(res).await,
        json!({"detail": "Rate limit exceeded: 2 per 1 minute"})
    );
}
