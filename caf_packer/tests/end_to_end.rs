// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end scenarios from spec.md §8: pipeline + façade wired together
//! against the filesystem test doubles and an in-memory catalog, the same
//! way `main.rs` wires them for a real run.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{test, App};

use caf_packer::application::{PackingPipeline, PackingPipelineConfig};
use caf_packer::infrastructure::adapters::{
    filesystem_object_store_seed, FilesystemObjectStore, FilesystemRemoteBlob, InMemoryQueue,
};
use caf_packer::infrastructure::presentation::{routes, AppState, ContainerCache, ProofCache};
use caf_packer::infrastructure::repositories::SqliteCatalogRepository;
use caf_packer_bootstrap::shutdown::ShutdownCoordinator;
use caf_packer_domain::repositories::CatalogRepository;
use caf_packer_domain::value_objects::ByteBudget;

struct Harness {
    catalog: Arc<SqliteCatalogRepository>,
    app_state: actix_web::web::Data<AppState>,
}

async fn run_pipeline_to_completion(
    temp_dir: &std::path::Path,
    src_root: &std::path::Path,
    blob_root: &std::path::Path,
    budget_bytes: u64,
    batch_count_ceiling: usize,
    inactivity_timeout: Duration,
    messages: &[(&str, &str)],
) -> Harness {
    let catalog = Arc::new(SqliteCatalogRepository::connect("sqlite::memory:").await.unwrap());
    let object_store = Arc::new(FilesystemObjectStore::new(src_root));
    let remote_blob = Arc::new(FilesystemRemoteBlob::new(blob_root));

    let config = PackingPipelineConfig {
        temp_dir: temp_dir.to_path_buf(),
        byte_budget: ByteBudget::from_bytes(budget_bytes).unwrap(),
        batch_count_ceiling,
        inactivity_timeout,
        worker_id: "1".to_string(),
    };

    let mut pipeline = PackingPipeline::new(config, object_store, remote_blob.clone(), catalog.clone(), None);

    let (mut queue, handle) = InMemoryQueue::new();
    for (task_id, file_path) in messages {
        handle.publish(*task_id, *file_path);
    }

    let shutdown = ShutdownCoordinator::new(Duration::from_secs(5));
    let token = shutdown.token();
    let stop_after = inactivity_timeout + Duration::from_millis(250);
    tokio::spawn(async move {
        tokio::time::sleep(stop_after).await;
        token.cancel();
    });

    pipeline.run(&mut queue, &shutdown.token()).await.unwrap();

    let container_cache = ContainerCache::new(
        temp_dir.join("container_cache"),
        Duration::from_secs(5),
        true,
        remote_blob.clone(),
    );

    let app_state = actix_web::web::Data::new(AppState {
        worker_id: 1,
        catalog: catalog.clone(),
        remote_blob,
        container_cache,
        proof_cache: ProofCache::new(),
    });

    Harness { catalog, app_state }
}

/// Scenario 1: single small file, inactivity finalize, served back intact.
#[tokio::test]
async fn single_small_file_round_trips_through_http() {
    let temp_dir = tempfile::tempdir().unwrap();
    let src_root = tempfile::tempdir().unwrap();
    let blob_root = tempfile::tempdir().unwrap();

    let body: Vec<u8> = (0..1024u32).map(|i| (i % 4) as u8).collect();
    filesystem_object_store_seed(src_root.path(), "a.bin", &body).await.unwrap();

    let harness = run_pipeline_to_completion(
        temp_dir.path(),
        src_root.path(),
        blob_root.path(),
        1024 * 1024,
        1000,
        Duration::from_millis(100),
        &[("T1", "a.bin")],
    )
    .await;

    let record = harness.catalog.lookup("T1", "a.bin").await.unwrap().unwrap();
    assert!(record.bundle_id.starts_with("batch_"));

    let app = test::init_service(App::new().app_data(harness.app_state.clone()).configure(routes::config)).await;

    let req = test::TestRequest::get().uri("/file/T1/a.bin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let got = test::read_body(resp).await;
    assert_eq!(got.len(), 1024);
    assert_eq!(got.as_ref(), body.as_slice());
}

/// Scenario 2: two files land in one container; extraction respects each
/// member's own byte range regardless of the other member's presence.
#[tokio::test]
async fn two_files_one_container_share_a_bundle() {
    let temp_dir = tempfile::tempdir().unwrap();
    let src_root = tempfile::tempdir().unwrap();
    let blob_root = tempfile::tempdir().unwrap();

    filesystem_object_store_seed(src_root.path(), "a.bin", &[1u8; 100]).await.unwrap();
    filesystem_object_store_seed(src_root.path(), "b.bin", &[2u8; 200]).await.unwrap();

    let harness = run_pipeline_to_completion(
        temp_dir.path(),
        src_root.path(),
        blob_root.path(),
        1024 * 1024 * 1024,
        1000,
        Duration::from_millis(100),
        &[("T1", "a.bin"), ("T1", "b.bin")],
    )
    .await;

    let a = harness.catalog.lookup("T1", "a.bin").await.unwrap().unwrap();
    let b = harness.catalog.lookup("T1", "b.bin").await.unwrap().unwrap();
    assert_eq!(a.bundle_id, b.bundle_id);

    let app = test::init_service(App::new().app_data(harness.app_state.clone()).configure(routes::config)).await;

    let req = test::TestRequest::get().uri("/file/T1/b.bin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let got = test::read_body(resp).await;
    assert_eq!(got.as_ref(), vec![2u8; 200].as_slice());
}

/// Scenario 3: a budget too small for all three files splits them across
/// two containers.
#[tokio::test]
async fn budget_rollover_splits_across_two_containers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let src_root = tempfile::tempdir().unwrap();
    let blob_root = tempfile::tempdir().unwrap();

    for (name, len) in [("a.bin", 400), ("b.bin", 400), ("c.bin", 400)] {
        filesystem_object_store_seed(src_root.path(), name, &vec![7u8; len]).await.unwrap();
    }

    let harness = run_pipeline_to_completion(
        temp_dir.path(),
        src_root.path(),
        blob_root.path(),
        1000,
        1000,
        Duration::from_millis(150),
        &[("T1", "a.bin"), ("T1", "b.bin"), ("T1", "c.bin")],
    )
    .await;

    let a = harness.catalog.lookup("T1", "a.bin").await.unwrap().unwrap();
    let b = harness.catalog.lookup("T1", "b.bin").await.unwrap().unwrap();
    let c = harness.catalog.lookup("T1", "c.bin").await.unwrap().unwrap();
    assert_eq!(a.bundle_id, b.bundle_id);
    assert_ne!(a.bundle_id, c.bundle_id);
}

/// Scenario 4: malformed taskId/filePath are rejected before any catalog
/// lookup, with the exact error strings spec.md §8 names.
#[tokio::test]
async fn validation_rejection_returns_400_with_exact_messages() {
    let temp_dir = tempfile::tempdir().unwrap();
    let blob_root = tempfile::tempdir().unwrap();
    let catalog = Arc::new(SqliteCatalogRepository::connect("sqlite::memory:").await.unwrap());
    let remote_blob = Arc::new(FilesystemRemoteBlob::new(blob_root.path()));
    let app_state = actix_web::web::Data::new(AppState {
        worker_id: 1,
        catalog,
        remote_blob: remote_blob.clone(),
        container_cache: ContainerCache::new(temp_dir.path().to_path_buf(), Duration::from_secs(5), true, remote_blob),
        proof_cache: ProofCache::new(),
    });

    let app = test::init_service(App::new().app_data(app_state).configure(routes::config)).await;

    let req = test::TestRequest::get().uri("/file/..%2Fetc/x").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid taskId format");

    let req = test::TestRequest::get().uri("/file/ok/../etc/passwd").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid filePath format");
}

/// Scenario 5: a zero-byte file pre-placed in the container cache is
/// detected, discarded, and replaced by a fresh download before serving.
#[tokio::test]
async fn corrupted_container_cache_entry_is_replaced_before_serving() {
    let temp_dir = tempfile::tempdir().unwrap();
    let src_root = tempfile::tempdir().unwrap();
    let blob_root = tempfile::tempdir().unwrap();

    filesystem_object_store_seed(src_root.path(), "a.bin", &[9, 9, 9]).await.unwrap();

    let harness = run_pipeline_to_completion(
        temp_dir.path(),
        src_root.path(),
        blob_root.path(),
        1024 * 1024,
        1000,
        Duration::from_millis(100),
        &[("T1", "a.bin")],
    )
    .await;

    let record = harness.catalog.lookup("T1", "a.bin").await.unwrap().unwrap();

    let cache_dir = temp_dir.path().join("container_cache");
    tokio::fs::create_dir_all(&cache_dir).await.unwrap();
    tokio::fs::write(cache_dir.join(&record.bundle_id), []).await.unwrap();

    let app = test::init_service(App::new().app_data(harness.app_state.clone()).configure(routes::config)).await;

    let req = test::TestRequest::get().uri("/file/T1/a.bin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let got = test::read_body(resp).await;
    assert_eq!(got.as_ref(), &[9, 9, 9]);
}

/// Scenario 6: a short inactivity timeout finalizes and acks a lone
/// in-flight message with no further traffic.
#[tokio::test]
async fn inactivity_finalize_acks_the_lone_message() {
    let temp_dir = tempfile::tempdir().unwrap();
    let src_root = tempfile::tempdir().unwrap();
    let blob_root = tempfile::tempdir().unwrap();

    filesystem_object_store_seed(src_root.path(), "a.bin", &[1, 2, 3]).await.unwrap();

    let harness = run_pipeline_to_completion(
        temp_dir.path(),
        src_root.path(),
        blob_root.path(),
        1024 * 1024,
        1000,
        Duration::from_millis(200),
        &[("T1", "a.bin")],
    )
    .await;

    let record = harness.catalog.lookup("T1", "a.bin").await.unwrap().unwrap();
    assert!(record.bundle_id.starts_with("batch_"));
    assert!(tokio::fs::try_exists(blob_root.path().join(&record.bundle_id)).await.unwrap());
}
