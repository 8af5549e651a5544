//! # Application State Management
//!
//! This module holds everything that HTTP handlers and websocket actors share:
//! configuration, request metrics, the upload store, the connection registry,
//! and the reply/transcription strategies.
//!
//! ## Key Rust Concepts:
//!
//! ### Arc (Atomically Reference Counted)
//! - **Purpose**: Allows multiple parts of the program to safely share ownership of data
//! - **Why needed**: Every actix worker thread gets its own clone of `AppState`
//!
//! ### RwLock (Reader-Writer Lock)
//! - **Purpose**: Allows multiple readers OR one writer at a time (but not both)
//! - **Used for**: Metrics, which every request updates
//!
//! ### Trait objects (`Arc<dyn Trait>`)
//! - **Purpose**: Swap the reply or transcription strategy without touching handlers
//! - **Send + Sync bounds**: Required so the object can cross worker threads

use crate::audio::AudioStore;
use crate::config::AppConfig;
use crate::reply::ReplyGenerator;
use crate::transcription::Transcriber;
use crate::websocket::ChatRegistry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The application state shared across all HTTP request handlers.
///
/// Cloning is cheap: every field is either `Copy` or reference counted, so all
/// clones observe the same registry, store and metrics.
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup (read-only afterwards)
    pub config: Arc<AppConfig>,

    /// Request metrics, updated by the metrics middleware and websocket actors
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// Validating upload store
    pub uploads: AudioStore,

    /// Live websocket connections by chat id
    pub registry: ChatRegistry,

    /// Canned chat reply strategy
    pub replies: Arc<dyn ReplyGenerator>,

    /// Mock transcription strategy
    pub transcriber: Arc<dyn Transcriber>,

    /// When the server started
    pub start_time: Instant,
}

/// Request metrics collected across all HTTP requests.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Total number of 4xx/5xx responses since server start
    pub error_count: u64,

    /// Current number of open websocket chat sessions
    pub active_sessions: u32,

    /// Per-route statistics.
    /// Key: method and route pattern (e.g., "GET /ws/chat/{chat_id}")
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Performance metrics for one route.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    /// Assemble the state from its parts.
    ///
    /// The registry is passed in rather than created here so tests (and
    /// anything else that dispatches to sessions) can hold their own handle.
    pub fn new(
        config: AppConfig,
        uploads: AudioStore,
        registry: ChatRegistry,
        replies: Arc<dyn ReplyGenerator>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            uploads,
            registry,
            replies,
            transcriber,
            start_time: Instant::now(),
        }
    }

    /// Increment the total request counter (called by middleware for every request).
    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    /// Increment the total error counter (called when a request fails).
    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    /// Record detailed metrics for a specific endpoint.
    ///
    /// ## HashMap operations:
    /// The first time we see an endpoint, we create a new EndpointMetric with default values.
    /// Subsequent requests update the existing metrics for that endpoint.
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();
        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Called when a websocket chat session starts.
    pub fn increment_active_sessions(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.active_sessions += 1;
    }

    /// Called when a websocket chat session ends. Never goes below zero.
    pub fn decrement_active_sessions(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.active_sessions = metrics.active_sessions.saturating_sub(1);
    }

    /// Consistent copy of the metrics, so no lock is held while serializing.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics.read().unwrap().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl AppMetrics {
    /// Fraction of requests that failed (0.0 when nothing has been served).
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

impl EndpointMetric {
    /// Average response time in milliseconds.
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Error rate for this endpoint (0.0 to 1.0).
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
