//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the elo-ladder service using
//! Prometheus metrics.

use crate::types::SkippedOutcome;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the ladder service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Ranking computation metrics
    ranking_metrics: RankingMetrics,

    /// Store size metrics
    store_metrics: StoreMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// HTTP requests served, by endpoint
    pub http_requests_total: IntCounterVec,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Ranking computation metrics
#[derive(Clone)]
pub struct RankingMetrics {
    /// Rankings computed, by category
    pub computations_total: IntCounterVec,

    /// Outcomes left out of a computation, by reason
    pub skipped_outcomes_total: IntCounterVec,

    /// Competitors in the latest ranking of each category
    pub ranked_competitors: IntGaugeVec,

    /// Time spent replaying a category history
    pub ranking_duration: Histogram,

    /// Computations abandoned at their deadline
    pub timeouts_total: IntCounter,
}

/// Store size metrics
#[derive(Clone)]
pub struct StoreMetrics {
    pub categories: IntGauge,
    pub competitors: IntGauge,
    pub matches: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let ranking_metrics = RankingMetrics::new(&registry)?;
        let store_metrics = StoreMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            ranking_metrics,
            store_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get ranking metrics
    pub fn ranking(&self) -> &RankingMetrics {
        &self.ranking_metrics
    }

    /// Get store metrics
    pub fn store(&self) -> &StoreMetrics {
        &self.store_metrics
    }

    /// Record a finished ranking computation
    pub fn record_ranking(
        &self,
        category: &str,
        ranked: usize,
        skipped: &[SkippedOutcome],
        duration: Duration,
    ) {
        self.ranking_metrics
            .computations_total
            .with_label_values(&[category])
            .inc();

        self.ranking_metrics
            .ranked_competitors
            .with_label_values(&[category])
            .set(ranked as i64);

        for outcome in skipped {
            self.ranking_metrics
                .skipped_outcomes_total
                .with_label_values(&[outcome.reason.as_str()])
                .inc();
        }

        self.ranking_metrics
            .ranking_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a computation abandoned at its deadline
    pub fn record_ranking_timeout(&self) {
        self.ranking_metrics.timeouts_total.inc();
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, endpoint: &str) {
        self.service_metrics
            .http_requests_total
            .with_label_values(&[endpoint])
            .inc();
    }

    /// Update store size gauges
    pub fn update_store_counts(&self, categories: usize, competitors: usize, matches: usize) {
        self.store_metrics.categories.set(categories as i64);
        self.store_metrics.competitors.set(competitors as i64);
        self.store_metrics.matches.set(matches as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Encode every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        TextEncoder::new()
            .encode_to_string(&metric_families)
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
    }

    /// Content type of [`Self::encode_text`] output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("elo_ladder_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("elo_ladder_http_requests_total", "Total HTTP requests served"),
            &["endpoint"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let health_status = IntGauge::new(
            "elo_ladder_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("elo_ladder_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            http_requests_total,
            health_status,
            component_health,
        })
    }
}

impl RankingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let computations_total = IntCounterVec::new(
            Opts::new(
                "elo_ladder_ranking_computations_total",
                "Total ranking computations",
            ),
            &["category"],
        )?;
        registry.register(Box::new(computations_total.clone()))?;

        let skipped_outcomes_total = IntCounterVec::new(
            Opts::new(
                "elo_ladder_skipped_outcomes_total",
                "Match outcomes skipped during rating computation",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(skipped_outcomes_total.clone()))?;

        let ranked_competitors = IntGaugeVec::new(
            Opts::new(
                "elo_ladder_ranked_competitors",
                "Competitors in the latest ranking",
            ),
            &["category"],
        )?;
        registry.register(Box::new(ranked_competitors.clone()))?;

        let ranking_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elo_ladder_ranking_duration_seconds",
                "Ranking computation time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(ranking_duration.clone()))?;

        let timeouts_total = IntCounter::new(
            "elo_ladder_ranking_timeouts_total",
            "Ranking computations abandoned at their deadline",
        )?;
        registry.register(Box::new(timeouts_total.clone()))?;

        Ok(Self {
            computations_total,
            skipped_outcomes_total,
            ranked_competitors,
            ranking_duration,
            timeouts_total,
        })
    }
}

impl StoreMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let categories = IntGauge::new("elo_ladder_categories", "Known categories")?;
        registry.register(Box::new(categories.clone()))?;

        let competitors = IntGauge::new("elo_ladder_competitors", "Registered competitors")?;
        registry.register(Box::new(competitors.clone()))?;

        let matches = IntGauge::new("elo_ladder_matches", "Recorded matches")?;
        registry.register(Box::new(matches.clone()))?;

        Ok(Self {
            categories,
            competitors,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkipReason;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _ranking = collector.ranking();
        let _store = collector.store();
    }

    #[test]
    fn test_ranking_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let skipped = vec![
            SkippedOutcome {
                outcome_id: "m1".to_string(),
                reason: SkipReason::DegenerateMatch,
            },
            SkippedOutcome {
                outcome_id: "m2".to_string(),
                reason: SkipReason::DegenerateMatch,
            },
        ];

        collector.record_ranking("melee", 12, &skipped, Duration::from_millis(3));

        let ranking = collector.ranking();
        assert_eq!(
            ranking
                .computations_total
                .with_label_values(&["melee"])
                .get(),
            1
        );
        assert_eq!(
            ranking.ranked_competitors.with_label_values(&["melee"]).get(),
            12
        );
        assert_eq!(
            ranking
                .skipped_outcomes_total
                .with_label_values(&["degenerate_match"])
                .get(),
            2
        );
    }

    #[test]
    fn test_encode_text() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_http_request("rankings");
        collector.update_store_counts(1, 2, 3);

        let text = collector.encode_text().unwrap();
        assert!(text.contains("elo_ladder_http_requests_total"));
        assert!(text.contains("elo_ladder_matches 3"));
        assert!(collector.content_type().contains("text/plain"));
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2);
        collector.update_component_health("store", true);
        assert_eq!(collector.service().health_status.get(), 2);
    }
}
