//! Metrics and monitoring for the elo-ladder service
//!
//! This module provides Prometheus metrics collection and the health and
//! metrics HTTP endpoints.

pub mod collector;
pub mod health;

pub use collector::{MetricsCollector, RankingMetrics, ServiceMetrics, StoreMetrics};
pub use health::monitoring_routes;
