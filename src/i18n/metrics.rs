//! Translation counters exposed on `GET /metrics`.
//!
//! One instance per process, shared by the gateway and the session.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide translation counters.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Language switches served from a language-keyed cache
    cache_hits: AtomicUsize,

    /// Language switches that needed a gateway call
    cache_misses: AtomicUsize,

    /// Calls made to the generation service for translation
    gateway_calls: AtomicUsize,

    /// Gateway calls that returned the untranslated input
    gateway_fallbacks: AtomicUsize,

    /// Finished translations dropped because their canonical record was replaced
    stale_discards: AtomicUsize,
}

impl TranslationMetrics {
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gateway_call(&self) {
        self.gateway_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gateway_fallback(&self) {
        self.gateway_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn gateway_calls(&self) -> usize {
        self.gateway_calls.load(Ordering::Relaxed)
    }

    pub fn gateway_fallbacks(&self) -> usize {
        self.gateway_fallbacks.load(Ordering::Relaxed)
    }

    pub fn stale_discards(&self) -> usize {
        self.stale_discards.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let lookups = hits + misses;
        let cache_hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.gateway_calls();
        let fallbacks = self.gateway_fallbacks();
        let gateway_success_rate = if calls > 0 {
            (calls.saturating_sub(fallbacks) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            gateway_calls: calls,
            gateway_fallbacks: fallbacks,
            gateway_success_rate,
            stale_discards: self.stale_discards(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Percentage (0-100)
    pub cache_hit_rate: f64,
    pub gateway_calls: usize,
    pub gateway_fallbacks: usize,
    /// Percentage (0-100)
    pub gateway_success_rate: f64,
    pub stale_discards: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_counters_increment() {
        let metrics = TranslationMetrics::default();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_gateway_call();
        metrics.record_gateway_fallback();
        metrics.record_stale_discard();

        assert_eq!(metrics.cache_hits(), 2);
        assert_eq!(metrics.cache_misses(), 1);
        assert_eq!(metrics.gateway_calls(), 1);
        assert_eq!(metrics.gateway_fallbacks(), 1);
        assert_eq!(metrics.stale_discards(), 1);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::default().report();
        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.gateway_success_rate, 0.0);
    }

    #[test]
    fn test_report_rates() {
        let metrics = TranslationMetrics::default();
        for _ in 0..3 {
            metrics.record_cache_hit();
        }
        metrics.record_cache_miss();
        for _ in 0..4 {
            metrics.record_gateway_call();
        }
        metrics.record_gateway_fallback();

        let report = metrics.report();
        assert_eq!(report.cache_hit_rate, 75.0);
        assert_eq!(report.gateway_success_rate, 75.0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let json = serde_json::to_value(TranslationMetrics::default().report()).unwrap();
        assert!(json.get("gatewayFallbacks").is_some());
        assert!(json.get("staleDiscards").is_some());
    }
}
