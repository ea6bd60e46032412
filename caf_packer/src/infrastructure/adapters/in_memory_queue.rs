// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-memory `QueueConsumer` (§6 Queue contract): a stand-in for the durable
//! broker, used by tests and the demo entry point. Nack+requeue re-delivers
//! the message at the back of the queue; ack simply drops it from the
//! in-flight set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use caf_packer_domain::entities::QueueMessage;
use caf_packer_domain::services::QueueConsumer;
use caf_packer_domain::PackerError;

/// The producer-side handle: pushes raw queue-message bodies in.
#[derive(Clone)]
pub struct InMemoryQueueHandle {
    sender: mpsc::UnboundedSender<(String, String)>,
}

impl InMemoryQueueHandle {
    pub fn publish(&self, task_id: impl Into<String>, file_path: impl Into<String>) {
        let _ = self.sender.send((task_id.into(), file_path.into()));
    }
}

pub struct InMemoryQueue {
    receiver: mpsc::UnboundedReceiver<(String, String)>,
    sender: mpsc::UnboundedSender<(String, String)>,
    next_tag: Arc<AtomicU64>,
    in_flight: Arc<Mutex<HashMap<u64, (String, String)>>>,
}

impl InMemoryQueue {
    pub fn new() -> (Self, InMemoryQueueHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let next_tag = Arc::new(AtomicU64::new(1));
        let handle = InMemoryQueueHandle {
            sender: sender.clone(),
        };
        (
            Self {
                receiver,
                sender,
                next_tag,
                in_flight: Arc::new(Mutex::new(HashMap::new())),
            },
            handle,
        )
    }
}

#[async_trait]
impl QueueConsumer for InMemoryQueue {
    async fn recv(&mut self) -> Result<Option<QueueMessage>, PackerError> {
        match self.receiver.recv().await {
            None => Ok(None),
            Some((task_id, file_path)) => {
                let delivery_tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
                self.in_flight
                    .lock()
                    .insert(delivery_tag, (task_id.clone(), file_path.clone()));
                Ok(Some(QueueMessage {
                    task_id,
                    file_path,
                    delivery_tag,
                }))
            }
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> Result<(), PackerError> {
        self.in_flight.lock().remove(&delivery_tag);
        Ok(())
    }

    async fn nack_requeue(&mut self, delivery_tag: u64) -> Result<(), PackerError> {
        if let Some((task_id, file_path)) = self.in_flight.lock().remove(&delivery_tag) {
            self.sender
                .send((task_id, file_path))
                .map_err(|e| PackerError::internal_error(format!("queue closed during requeue: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recv_then_ack_clears_in_flight() {
        let (mut queue, handle) = InMemoryQueue::new();
        handle.publish("T1", "a.bin");

        let msg = queue.recv().await.unwrap().unwrap();
        assert_eq!(msg.task_id, "T1");
        queue.ack(msg.delivery_tag).await.unwrap();
        assert!(queue.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn nack_requeue_redelivers() {
        let (mut queue, handle) = InMemoryQueue::new();
        handle.publish("T1", "a.bin");

        let first = queue.recv().await.unwrap().unwrap();
        queue.nack_requeue(first.delivery_tag).await.unwrap();

        let second = queue.recv().await.unwrap().unwrap();
        assert_eq!(second.task_id, "T1");
        assert_eq!(second.file_path, "a.bin");
    }
}
