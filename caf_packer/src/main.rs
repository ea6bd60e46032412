// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::{from_fn, Logger};
use actix_web::{App, HttpServer};

use caf_packer::application::{PackingPipeline, PackingPipelineConfig, DEFAULT_BATCH_COUNT_CEILING};
use caf_packer::infrastructure::adapters::{FilesystemObjectStore, FilesystemRemoteBlob, InMemoryQueue};
use caf_packer::infrastructure::config::WorkerConfig;
use caf_packer::infrastructure::metrics::MetricsService;
use caf_packer::infrastructure::presentation::{routes, AppState, ContainerCache, ProofCache};
use caf_packer::infrastructure::repositories::SqliteCatalogRepository;
use caf_packer_bootstrap::shutdown::ShutdownCoordinator;
use caf_packer_domain::repositories::CatalogRepository;
use caf_packer_domain::PackerError;

#[actix_web::main]
async fn main() -> std::process::ExitCode {
    caf_packer_bootstrap::logger::init_tracing();

    let cli = match caf_packer_bootstrap::bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            tracing::error!("invalid CLI arguments: {e}");
            return caf_packer_bootstrap::result_to_exit_code(Err(e));
        }
    };

    caf_packer_bootstrap::result_to_exit_code(run(cli).await)
}

async fn run(cli: caf_packer_bootstrap::ValidatedCli) -> Result<(), PackerError> {
    let config = WorkerConfig::load(&cli)?;
    tracing::info!(
        worker_id = config.worker_id,
        chain_mode = config.chain_mode.as_str(),
        http_port = config.http_port(),
        "starting caf-packer worker"
    );

    tokio::fs::create_dir_all(&config.temp_dir).await?;
    let object_store_root = config.temp_dir.join("object_store");
    let remote_blob_root = config.temp_dir.join("remote_blob");
    let container_cache_dir = config.temp_dir.join("container_cache");
    let database_url = format!("sqlite://{}", config.temp_dir.join("catalog.db").display());

    let catalog = Arc::new(SqliteCatalogRepository::connect(&database_url).await?);
    if catalog.lookup_worker(config.worker_id).await?.is_none() {
        return Err(PackerError::not_found(format!(
            "worker row for worker_id {} is missing from the catalog",
            config.worker_id
        )));
    }
    let object_store = Arc::new(FilesystemObjectStore::new(&object_store_root));
    let remote_blob = Arc::new(FilesystemRemoteBlob::new(&remote_blob_root));
    let metrics = Arc::new(MetricsService::new()?);

    // No broker crate exists anywhere in the retrieved example corpus (see
    // DESIGN.md); `InMemoryQueue` stands in for the queue named in spec.md
    // §1. Its handle is unused here because nothing outside this process
    // feeds it, which makes the worker idle but still servable via HTTP.
    let (mut queue, _queue_handle) = InMemoryQueue::new();

    let shutdown = ShutdownCoordinator::new(Duration::from_secs(5));

    let pipeline_config = PackingPipelineConfig {
        temp_dir: config.temp_dir.clone(),
        byte_budget: config.byte_budget()?,
        batch_count_ceiling: DEFAULT_BATCH_COUNT_CEILING,
        inactivity_timeout: Duration::from_secs(config.caf_timeout_minutes * 60),
        worker_id: config.worker_id.to_string(),
    };

    let mut pipeline = PackingPipeline::new(
        pipeline_config,
        object_store,
        remote_blob.clone(),
        catalog.clone(),
        Some(metrics.clone()),
    );

    let pipeline_shutdown = shutdown.token();
    let pipeline_task = tokio::spawn(async move { pipeline.run(&mut queue, &pipeline_shutdown).await });

    let proof_cache = ProofCache::new();
    let proof_cache_janitor = Arc::new(proof_cache.clone()).spawn_janitor();

    let container_cache = ContainerCache::new(
        container_cache_dir,
        Duration::from_millis(config.download_timeout_ms),
        config.keep_caf_files,
        remote_blob.clone(),
    );

    let app_state = actix_web::web::Data::new(AppState {
        worker_id: config.worker_id,
        catalog,
        remote_blob,
        container_cache,
        proof_cache,
    });

    let http_port = config.http_port();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(from_fn(routes::cors_middleware))
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind(("0.0.0.0", http_port))
    .map_err(|e| PackerError::InvalidConfiguration(format!("failed to bind HTTP port {http_port}: {e}")))?
    .run();

    let server_handle = server.handle();
    let shutdown_signal = shutdown.clone();
    let ctrl_c_task = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        shutdown_signal.initiate_shutdown();
        server_handle.stop(true).await;
    });

    let server_result = server.await;
    shutdown.initiate_shutdown();
    shutdown.complete_shutdown();

    let _ = pipeline_task.await;
    ctrl_c_task.abort();
    proof_cache_janitor.abort();

    server_result.map_err(|e| PackerError::InternalError(format!("HTTP server error: {e}")))
}
