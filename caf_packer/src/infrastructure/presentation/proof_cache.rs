// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! TTL-based proof cache (§3 Proof cache entry, §4.G): keyed by
//! `(container_name, file_path, task_id)`, entries expire 60 s after
//! insertion. A janitor scans every 30 s and drops expired entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use caf_packer_domain::services::MembershipProof;

const ENTRY_TTL: Duration = Duration::from_secs(60);
pub const JANITOR_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    container_name: String,
    file_path: String,
    task_id: String,
}

struct CacheEntry {
    proofs: Vec<MembershipProof>,
    inserted_at: Instant,
}

#[derive(Clone, Default)]
pub struct ProofCache {
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl ProofCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, container_name: &str, file_path: &str, task_id: &str) -> Option<Vec<MembershipProof>> {
        let key = CacheKey {
            container_name: container_name.to_string(),
            file_path: file_path.to_string(),
            task_id: task_id.to_string(),
        };
        let entries = self.entries.lock();
        entries.get(&key).and_then(|entry| {
            if entry.inserted_at.elapsed() < ENTRY_TTL {
                Some(entry.proofs.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, container_name: &str, file_path: &str, task_id: &str, proofs: Vec<MembershipProof>) {
        let key = CacheKey {
            container_name: container_name.to_string(),
            file_path: file_path.to_string(),
            task_id: task_id.to_string(),
        };
        self.entries.lock().insert(
            key,
            CacheEntry {
                proofs,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops every entry older than the TTL. Intended to run on a periodic
    /// tick independent of request traffic.
    pub fn evict_expired(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ENTRY_TTL);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the periodic janitor task (§4.G: "scans every 30 s").
    pub fn spawn_janitor(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(JANITOR_INTERVAL);
            loop {
                ticker.tick().await;
                self.evict_expired();
            }
        })
    }
}
