// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Registers and updates the counters/histograms the worker exports for
//! Prometheus scraping: messages consumed/acked/nacked, containers
//! finalized, append latency, and façade request counts/latencies.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

use caf_packer_domain::PackerError;

pub struct MetricsService {
    registry: Registry,
    messages_consumed_total: IntCounter,
    messages_acked_total: IntCounter,
    messages_nacked_total: IntCounter,
    containers_finalized_total: IntCounter,
    append_duration: Histogram,
    http_requests_total: IntCounterVec,
}

impl MetricsService {
    pub fn new() -> Result<Self, PackerError> {
        let registry = Registry::new();

        let messages_consumed_total = IntCounter::new(
            "caf_packer_messages_consumed_total",
            "Total queue messages received",
        )
        .map_err(|e| PackerError::internal_error(format!("failed to build messages_consumed_total: {e}")))?;

        let messages_acked_total = IntCounter::new(
            "caf_packer_messages_acked_total",
            "Total queue messages acknowledged",
        )
        .map_err(|e| PackerError::internal_error(format!("failed to build messages_acked_total: {e}")))?;

        let messages_nacked_total = IntCounter::new(
            "caf_packer_messages_nacked_total",
            "Total queue messages negatively acknowledged",
        )
        .map_err(|e| PackerError::internal_error(format!("failed to build messages_nacked_total: {e}")))?;

        let containers_finalized_total = IntCounter::new(
            "caf_packer_containers_finalized_total",
            "Total containers finalized and shipped",
        )
        .map_err(|e| PackerError::internal_error(format!("failed to build containers_finalized_total: {e}")))?;

        let append_duration = Histogram::with_opts(HistogramOpts::new(
            "caf_packer_append_duration_seconds",
            "Duration of a single AppendStream call",
        ))
        .map_err(|e| PackerError::internal_error(format!("failed to build append_duration: {e}")))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("caf_packer_http_requests_total", "Total façade HTTP requests by route and status"),
            &["route", "status"],
        )
        .map_err(|e| PackerError::internal_error(format!("failed to build http_requests_total: {e}")))?;

        registry
            .register(Box::new(messages_consumed_total.clone()))
            .map_err(|e| PackerError::internal_error(format!("failed to register messages_consumed_total: {e}")))?;
        registry
            .register(Box::new(messages_acked_total.clone()))
            .map_err(|e| PackerError::internal_error(format!("failed to register messages_acked_total: {e}")))?;
        registry
            .register(Box::new(messages_nacked_total.clone()))
            .map_err(|e| PackerError::internal_error(format!("failed to register messages_nacked_total: {e}")))?;
        registry
            .register(Box::new(containers_finalized_total.clone()))
            .map_err(|e| PackerError::internal_error(format!("failed to register containers_finalized_total: {e}")))?;
        registry
            .register(Box::new(append_duration.clone()))
            .map_err(|e| PackerError::internal_error(format!("failed to register append_duration: {e}")))?;
        registry
            .register(Box::new(http_requests_total.clone()))
            .map_err(|e| PackerError::internal_error(format!("failed to register http_requests_total: {e}")))?;

        Ok(Self {
            registry,
            messages_consumed_total,
            messages_acked_total,
            messages_nacked_total,
            containers_finalized_total,
            append_duration,
            http_requests_total,
        })
    }

    pub fn record_message_consumed(&self) {
        self.messages_consumed_total.inc();
    }

    pub fn record_message_acked(&self) {
        self.messages_acked_total.inc();
    }

    pub fn record_message_nacked(&self) {
        self.messages_nacked_total.inc();
    }

    pub fn record_container_finalized(&self) {
        self.containers_finalized_total.inc();
    }

    pub fn record_append_duration(&self, duration: std::time::Duration) {
        self.append_duration.observe(duration.as_secs_f64());
    }

    pub fn record_http_request(&self, route: &str, status: u16) {
        self.http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn render(&self) -> Result<String, PackerError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| PackerError::internal_error(format!("failed to encode metrics: {e}")))?;
        String::from_utf8(buffer).map_err(|e| PackerError::internal_error(format!("metrics output was not UTF-8: {e}")))
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new().expect("metric registration with fixed, non-conflicting names cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_message_consumed();
        metrics.record_container_finalized();

        let output = metrics.render().unwrap();
        assert!(output.contains("caf_packer_messages_consumed_total"));
        assert!(output.contains("caf_packer_containers_finalized_total"));
    }

    #[test]
    fn http_requests_total_is_labeled_by_route_and_status() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_http_request("/file", 200);
        let output = metrics.render().unwrap();
        assert!(output.contains("route=\"/file\""));
        assert!(output.contains("status=\"200\""));
    }
}
