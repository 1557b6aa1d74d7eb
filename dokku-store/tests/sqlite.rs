#![cfg(feature = "sqlite")]

use std::path::PathBuf;

use dokku_core::{Page, QuotaUpdate, ResourceKind, ResourceStore, StoreError};
use dokku_store::SqliteStore;
use futures::future::join_all;

struct TempDb(PathBuf);

impl TempDb {
    fn new() -> Self {
        let name = format!("dokku-store-{}.db", uuid::Uuid::new_v4());
        Self(std::env::temp_dir().join(name))
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.0.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.0.display()));
        }
    }
}

async fn seed(store: &SqliteStore, apps: u32) {
    store.create_tenant("t@example.com", "token").await.unwrap();
    store
        .update_quota(
            "t@example.com",
            QuotaUpdate {
                apps_quota: Some(apps),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_handles_racing_never_pass_the_quota() {
    let db = TempDb::new();
    let first = SqliteStore::connect(&db.url()).await.unwrap();
    let second = SqliteStore::connect(&db.url()).await.unwrap();
    seed(&first, 5).await;

    let attempts = (0..40).map(|i| {
        let store = if i % 2 == 0 { first.clone() } else { second.clone() };
        tokio::spawn(async move {
            store
                .reserve("t@example.com", &format!("1-app{i}"), ResourceKind::App)
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(granted, 5);
    for rejected in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(rejected, &StoreError::QuotaExceeded(ResourceKind::App));
    }
    assert_eq!(
        second
            .owned_resources("t@example.com", ResourceKind::App)
            .await
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn records_survive_a_reconnect() {
    let db = TempDb::new();
    {
        let store = SqliteStore::connect(&db.url()).await.unwrap();
        seed(&store, 2).await;
        store
            .reserve("t@example.com", "1-web", ResourceKind::App)
            .await
            .unwrap();
    }

    let store = SqliteStore::connect(&db.url()).await.unwrap();
    let tenant = store.get_tenant_by_access_token("token").await.unwrap();
    assert_eq!(tenant.quotas.apps_quota, 2);
    assert!(store
        .owns("t@example.com", "1-web", ResourceKind::App)
        .await
        .unwrap());
    assert_eq!(
        store
            .reserve("t@example.com", "1-web", ResourceKind::App)
            .await
            .unwrap_err(),
        StoreError::AlreadyExists(ResourceKind::App)
    );
}

#[tokio::test]
async fn listing_pages_newest_first_by_default() {
    let store = SqliteStore::in_memory().await.unwrap();
    seed(&store, 3).await;
    for name in ["1-a", "1-b", "1-c"] {
        store
            .reserve("t@example.com", name, ResourceKind::App)
            .await
            .unwrap();
    }

    let newest = store
        .list_resources(
            ResourceKind::App,
            Page {
                offset: 0,
                limit: 2,
                ascending: false,
            },
        )
        .await
        .unwrap();
    let names: Vec<_> = newest.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["1-c", "1-b"]);

    let oldest = store
        .list_resources(
            ResourceKind::App,
            Page {
                offset: 1,
                limit: 5,
                ascending: true,
            },
        )
        .await
        .unwrap();
    let names: Vec<_> = oldest.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["1-b", "1-c"]);
}
