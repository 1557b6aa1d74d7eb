mod common;

use dokku_commands::{apps, databases, networks};
use dokku_core::{CommandOutput, DokkuError, ErrorKind, ResourceKind, ResourceStore};

use common::harness;

fn kind(err: &anyhow::Error) -> Option<ErrorKind> {
    DokkuError::from_anyhow(err).map(|e| e.kind)
}

#[tokio::test]
async fn create_reserves_then_runs_the_remote_command() {
    let h = harness(1).await;

    let result = apps::create(&h.cmds, &h.tenant, "Test-App").await.unwrap();
    assert!(result.success);
    assert_eq!(h.executor.calls(), vec!["apps:create 1-test-app"]);
    assert!(h
        .store
        .owns("dev@example.com", "1-test-app", ResourceKind::App)
        .await
        .unwrap());
}

#[tokio::test]
async fn remote_create_failure_releases_the_reservation() {
    let h = harness(1).await;
    h.executor
        .respond("apps:create", CommandOutput::failed(" !     Name is already taken"));

    let result = apps::create(&h.cmds, &h.tenant, "web").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.result, " !     Name is already taken");

    let owned = h
        .store
        .owned_resources("dev@example.com", ResourceKind::App)
        .await
        .unwrap();
    assert!(owned.is_empty());

    // The slot is free again.
    h.executor.respond("apps:create", CommandOutput::ok("-----> Creating 1-api..."));
    assert!(apps::create(&h.cmds, &h.tenant, "api").await.unwrap().success);
}

#[tokio::test]
async fn quota_is_checked_before_any_remote_call() {
    let h = harness(1).await;
    apps::create(&h.cmds, &h.tenant, "one").await.unwrap();

    let err = apps::create(&h.cmds, &h.tenant, "two").await.unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::QuotaExceeded));
    assert_eq!(
        DokkuError::from_anyhow(&err).map(|e| e.message.as_str()),
        Some("Quota exceeded")
    );
    assert_eq!(h.executor.calls(), vec!["apps:create 1-one"]);
}

#[tokio::test]
async fn zero_quota_rejects_every_kind() {
    let h = harness(0).await;

    let app = apps::create(&h.cmds, &h.tenant, "a").await.unwrap_err();
    let db = databases::create(&h.cmds, &h.tenant, "postgres", "a").await.unwrap_err();
    let net = networks::create(&h.cmds, &h.tenant, "a").await.unwrap_err();

    for err in [app, db, net] {
        assert_eq!(kind(&err), Some(ErrorKind::QuotaExceeded));
    }
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn delete_releases_before_destroying() {
    let h = harness(1).await;
    apps::create(&h.cmds, &h.tenant, "web").await.unwrap();
    h.executor
        .respond("--force apps:destroy", CommandOutput::failed("ssh: connection refused"));

    let result = apps::delete(&h.cmds, &h.tenant, "web").await.unwrap();
    assert!(!result.success);
    assert!(!h
        .store
        .owns("dev@example.com", "1-web", ResourceKind::App)
        .await
        .unwrap());

    // Quota is available again even though the remote destroy failed.
    assert!(apps::create(&h.cmds, &h.tenant, "next").await.is_ok());
}

#[tokio::test]
async fn delete_of_unowned_app_is_not_found() {
    let h = harness(1).await;
    let err = apps::delete(&h.cmds, &h.tenant, "ghost").await.unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::NotFound));
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn duplicate_create_is_already_exists() {
    let h = harness(3).await;
    apps::create(&h.cmds, &h.tenant, "web").await.unwrap();

    let err = apps::create(&h.cmds, &h.tenant, "WEB").await.unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::AlreadyExists));
}

#[tokio::test]
async fn services_are_keyed_per_plugin() {
    let h = harness(2).await;

    databases::create(&h.cmds, &h.tenant, "postgres", "orders").await.unwrap();
    databases::create(&h.cmds, &h.tenant, "redis", "orders").await.unwrap();

    assert_eq!(
        h.executor.calls(),
        vec!["postgres:create 1_orders", "redis:create 1_orders"]
    );
    assert!(h
        .store
        .owns("dev@example.com", "postgres:1_orders", ResourceKind::Service)
        .await
        .unwrap());
}

#[tokio::test]
async fn failed_database_create_is_rolled_back() {
    let h = harness(1).await;
    h.executor
        .respond("mysql:create", CommandOutput::failed("plugin not installed"));

    let result = databases::create(&h.cmds, &h.tenant, "mysql", "db").await.unwrap();
    assert!(!result.success);
    assert!(h
        .store
        .owned_resources("dev@example.com", ResourceKind::Service)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn failed_network_create_is_rolled_back() {
    let h = harness(1).await;
    h.executor
        .respond("network:create", CommandOutput::failed("docker error"));

    assert!(!networks::create(&h.cmds, &h.tenant, "front").await.unwrap().success);
    assert!(networks::create(&h.cmds, &h.tenant, "front").await.is_ok());
}
