// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The packing pipeline use case (§4.F): a single-consumer, single-writer
//! state machine driving the CAF writer, the object-store and remote-blob
//! ports, and the catalog repository through Idle → Open →
//! Finalizing → Uploading → Indexing → Acking.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use caf_packer_domain::entities::QueueMessage;
use caf_packer_domain::repositories::CatalogRepository;
use caf_packer_domain::services::{CafWriter, ObjectStoreAdapter, QueueConsumer, RemoteBlobAdapter};
use caf_packer_domain::value_objects::{ByteBudget, ContainerName};
use caf_packer_domain::PackerError;

use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::services::caf_file_writer::delete_residual;
use crate::infrastructure::services::CafFileWriter;

/// Default batch-count finalization ceiling (§4.F "e.g. 1,000").
pub const DEFAULT_BATCH_COUNT_CEILING: usize = 1_000;

#[derive(Debug, Clone)]
pub struct PackingPipelineConfig {
    pub temp_dir: PathBuf,
    pub byte_budget: ByteBudget,
    pub batch_count_ceiling: usize,
    pub inactivity_timeout: Duration,
    pub worker_id: String,
}

struct InFlight {
    writer: CafFileWriter,
    local_path: PathBuf,
    pending: Vec<QueueMessage>,
}

pub struct PackingPipeline {
    config: PackingPipelineConfig,
    object_store: Arc<dyn ObjectStoreAdapter>,
    remote_blob: Arc<dyn RemoteBlobAdapter>,
    catalog: Arc<dyn CatalogRepository>,
    metrics: Option<Arc<MetricsService>>,
    in_flight: Option<InFlight>,
}

impl PackingPipeline {
    pub fn new(
        config: PackingPipelineConfig,
        object_store: Arc<dyn ObjectStoreAdapter>,
        remote_blob: Arc<dyn RemoteBlobAdapter>,
        catalog: Arc<dyn CatalogRepository>,
        metrics: Option<Arc<MetricsService>>,
    ) -> Self {
        Self {
            config,
            object_store,
            remote_blob,
            catalog,
            metrics,
            in_flight: None,
        }
    }

    /// Drives the pipeline until the queue is closed or `shutdown` fires.
    /// The inactivity timer is a periodic tick rather than a one-shot timer
    /// reset per message, since resetting a `tokio::time::Sleep` in place
    /// needs pinning; a tick interval no-ops when nothing is in flight,
    /// matching §4.F's "no writer currently open it is a no-op" rule.
    pub async fn run(
        &mut self,
        queue: &mut dyn QueueConsumer,
        shutdown: &caf_packer_bootstrap::shutdown::CancellationToken,
    ) -> Result<(), PackerError> {
        let tick = Duration::from_secs(1).min(self.config.inactivity_timeout);
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_activity = Instant::now();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("packing pipeline shutting down");
                    return Ok(());
                }

                msg = queue.recv() => {
                    match msg? {
                        None => {
                            info!("queue consumer closed, stopping pipeline");
                            return Ok(());
                        }
                        Some(message) => {
                            if let Some(metrics) = &self.metrics {
                                metrics.record_message_consumed();
                            }
                            if self.handle_message(message, queue).await? {
                                last_activity = Instant::now();
                            }
                        }
                    }
                }

                _ = ticker.tick() => {
                    if self.in_flight.is_some() && last_activity.elapsed() >= self.config.inactivity_timeout {
                        debug!("inactivity timeout reached, finalizing in-flight container");
                        self.finalize(queue).await?;
                    }
                }
            }
        }
    }

    /// Returns whether a member was actually appended, so callers can reset
    /// the inactivity timer only on real progress (§4.F).
    async fn handle_message(&mut self, message: QueueMessage, queue: &mut dyn QueueConsumer) -> Result<bool, PackerError> {
        if self.in_flight.is_none() {
            self.open_new_container(message, queue).await
        } else {
            self.append_to_open_container(message, queue).await
        }
    }

    async fn open_new_container(
        &mut self,
        message: QueueMessage,
        queue: &mut dyn QueueConsumer,
    ) -> Result<bool, PackerError> {
        let local_path = self.config.temp_dir.join(format!("{}.caf.inflight", Uuid::new_v4()));
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let mut writer = CafFileWriter::create(local_path.clone(), self.config.byte_budget)?;

        match self.append_message(&mut writer, &message).await {
            Ok(true) => {
                self.in_flight = Some(InFlight {
                    writer,
                    local_path,
                    pending: vec![message],
                });
                self.check_count_predicate(queue).await?;
                Ok(true)
            }
            Ok(false) => {
                writer.cleanup().await.ok();
                delete_residual(&local_path).await.ok();
                warn!(task_id = %message.task_id, "single file exceeds configured container budget");
                queue.nack_requeue(message.delivery_tag).await?;
                self.record_nack();
                Ok(false)
            }
            Err(e) => {
                writer.cleanup().await.ok();
                delete_residual(&local_path).await.ok();
                error!(error = %e, "failed to open first member of a new container");
                queue.nack_requeue(message.delivery_tag).await?;
                self.record_nack();
                Ok(false)
            }
        }
    }

    async fn append_to_open_container(
        &mut self,
        message: QueueMessage,
        queue: &mut dyn QueueConsumer,
    ) -> Result<bool, PackerError> {
        let mut in_flight = self.in_flight.take().expect("checked by caller");

        let append_result = self.append_message(&mut in_flight.writer, &message).await;

        match append_result {
            Ok(true) => {
                in_flight.pending.push(message);
                self.in_flight = Some(in_flight);
                self.check_count_predicate(queue).await?;
                Ok(true)
            }
            Ok(false) => {
                // Capacity hit: finalize the predecessor, then open a fresh
                // container for the current message with a re-obtained stream.
                self.in_flight = Some(in_flight);
                self.finalize(queue).await?;
                self.open_new_container(message, queue).await
            }
            Err(e) if e.poisons_container() => {
                error!(error = %e, "in-flight container poisoned, discarding and requeuing batch");
                self.poison_and_requeue(in_flight, queue).await?;
                queue.nack_requeue(message.delivery_tag).await?;
                self.record_nack();
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, task_id = %message.task_id, "append failed, requeuing message only");
                self.in_flight = Some(in_flight);
                queue.nack_requeue(message.delivery_tag).await?;
                self.record_nack();
                Ok(false)
            }
        }
    }

    async fn append_message(&self, writer: &mut CafFileWriter, message: &QueueMessage) -> Result<bool, PackerError> {
        let member_path = message.member_path();
        let (stream, declared_length) = self.object_store.open_stream(&message.file_path).await?;
        let started = Instant::now();
        let result = writer.append_stream(member_path.as_str(), stream, declared_length).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_append_duration(started.elapsed());
        }
        result
    }

    async fn check_count_predicate(&mut self, queue: &mut dyn QueueConsumer) -> Result<(), PackerError> {
        let hit_ceiling = self
            .in_flight
            .as_ref()
            .map(|f| f.pending.len() >= self.config.batch_count_ceiling)
            .unwrap_or(false);
        if hit_ceiling {
            debug!("batch count ceiling reached, finalizing");
            self.finalize(queue).await?;
        }
        Ok(())
    }

    async fn poison_and_requeue(&mut self, mut in_flight: InFlight, queue: &mut dyn QueueConsumer) -> Result<(), PackerError> {
        in_flight.writer.cleanup().await.ok();
        delete_residual(&in_flight.local_path).await.ok();
        for pending in &in_flight.pending {
            queue.nack_requeue(pending.delivery_tag).await?;
            self.record_nack();
        }
        Ok(())
    }

    /// Runs Finalizing → Uploading → Indexing → Acking for the current
    /// in-flight container, if any.
    async fn finalize(&mut self, queue: &mut dyn QueueConsumer) -> Result<(), PackerError> {
        let Some(mut in_flight) = self.in_flight.take() else {
            return Ok(());
        };

        let local_path = match in_flight.writer.finalize().await {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "finalize failed, discarding container and requeuing batch");
                delete_residual(&in_flight.local_path).await.ok();
                for pending in &in_flight.pending {
                    queue.nack_requeue(pending.delivery_tag).await?;
                    self.record_nack();
                }
                return Ok(());
            }
        };

        let container_name = ContainerName::for_batch(epoch_millis());

        if let Err(e) = self.remote_blob.put_container(container_name.as_str(), &local_path).await {
            error!(error = %e, container = %container_name, "shipping container failed, requeuing batch");
            delete_residual(&local_path).await.ok();
            for pending in &in_flight.pending {
                queue.nack_requeue(pending.delivery_tag).await?;
                self.record_nack();
            }
            return Ok(());
        }

        for (idx, pending) in in_flight.pending.iter().enumerate() {
            if let Err(e) = self
                .catalog
                .insert(&pending.task_id, &pending.file_path, container_name.as_str(), &self.config.worker_id)
                .await
            {
                error!(
                    error = %e,
                    task_id = %pending.task_id,
                    "catalog insert failed mid-batch; earlier rows in this batch are not rolled back"
                );
                // Rows before `idx` are already committed and the container is
                // already shipped, so that work is real: ack those messages
                // rather than letting them redeliver into a duplicate-key insert.
                for done in &in_flight.pending[..idx] {
                    queue.ack(done.delivery_tag).await?;
                    if let Some(metrics) = &self.metrics {
                        metrics.record_message_acked();
                    }
                }
                for remaining in &in_flight.pending[idx..] {
                    queue.nack_requeue(remaining.delivery_tag).await?;
                    self.record_nack();
                }
                delete_residual(&local_path).await.ok();
                return Ok(());
            }
        }

        for pending in &in_flight.pending {
            queue.ack(pending.delivery_tag).await?;
            if let Some(metrics) = &self.metrics {
                metrics.record_message_acked();
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_container_finalized();
        }
        info!(container = %container_name, members = in_flight.pending.len(), "container shipped and indexed");

        delete_residual(&local_path).await.ok();
        Ok(())
    }

    fn record_nack(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_message_nacked();
        }
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis()
}
