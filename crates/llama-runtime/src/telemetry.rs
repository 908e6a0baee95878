//! Telemetry hooks for generation performance measurement.
//!
//! Provides:
//! - [`InferenceMetrics`]: TTFT, tokens/sec, and generation summary
//! - [`TelemetryHook`] trait: callback interface for metric reporting
//! - [`InferenceTimer`]: records timestamps and computes metrics
//! - [`TracingTelemetry`] / [`RecordingTelemetry`]: built-in hooks

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::backend::Backend;

/// Aggregate metrics from a generation run.
#[derive(Debug, Clone)]
pub struct InferenceMetrics {
    pub backend: Backend,
    /// Time to first sampled token in milliseconds (prefill latency).
    pub ttft_ms: f64,
    /// Decode throughput, excluding prefill.
    pub tokens_per_sec: f64,
    pub prompt_tokens: usize,
    pub generated_tokens: usize,
    /// Wall-clock time in milliseconds (prefill + decode).
    pub total_time_ms: f64,
}

/// Callback trait for inference telemetry.
///
/// All methods default to no-ops so hooks can be selective.
pub trait TelemetryHook: Send + Sync {
    fn on_prefill_complete(&self, _ttft_ms: f64) {}

    fn on_generation_complete(&self, _metrics: &InferenceMetrics) {}
}

/// Emits one `info` event per finished generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetryHook for TracingTelemetry {
    fn on_prefill_complete(&self, ttft_ms: f64) {
        tracing::debug!(ttft_ms, "prefill complete");
    }

    fn on_generation_complete(&self, m: &InferenceMetrics) {
        tracing::info!(
            backend = %m.backend,
            prompt_tokens = m.prompt_tokens,
            generated_tokens = m.generated_tokens,
            ttft_ms = m.ttft_ms,
            tokens_per_sec = m.tokens_per_sec,
            total_ms = m.total_time_ms,
            "generation complete"
        );
    }
}

/// Keeps the most recent metrics for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    last_report: Arc<Mutex<Option<InferenceMetrics>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_metrics(&self) -> Option<InferenceMetrics> {
        self.last_report.lock().ok().and_then(|m| m.clone())
    }
}

impl TelemetryHook for RecordingTelemetry {
    fn on_generation_complete(&self, metrics: &InferenceMetrics) {
        if let Ok(mut last) = self.last_report.lock() {
            *last = Some(metrics.clone());
        }
    }
}

/// Records timestamps during generation to compute [`InferenceMetrics`].
///
/// 1. [`InferenceTimer::new`] at generation start
/// 2. [`InferenceTimer::mark_prefill_complete`] after the prompt forward pass
/// 3. [`InferenceTimer::mark_token`] after each sampled token
/// 4. [`InferenceTimer::finish`] to compute final metrics
pub struct InferenceTimer {
    backend: Backend,
    prompt_tokens: usize,
    start: Instant,
    prefill_end: Option<Instant>,
    token_count: usize,
    hook: Box<dyn TelemetryHook>,
}

impl InferenceTimer {
    pub fn new(backend: Backend, prompt_tokens: usize, hook: Box<dyn TelemetryHook>) -> Self {
        Self {
            backend,
            prompt_tokens,
            start: Instant::now(),
            prefill_end: None,
            token_count: 0,
            hook,
        }
    }

    pub fn mark_prefill_complete(&mut self) {
        let now = Instant::now();
        self.prefill_end = Some(now);
        let ttft_ms = now.duration_since(self.start).as_secs_f64() * 1000.0;
        self.hook.on_prefill_complete(ttft_ms);
    }

    pub fn mark_token(&mut self) {
        self.token_count += 1;
    }

    pub fn finish(self) -> InferenceMetrics {
        let total_time_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        let ttft_ms = self
            .prefill_end
            .map(|t| t.duration_since(self.start).as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        let decode_time_ms = total_time_ms - ttft_ms;
        let tokens_per_sec = if decode_time_ms > 0.0 && self.token_count > 0 {
            self.token_count as f64 / (decode_time_ms / 1000.0)
        } else {
            0.0
        };

        let metrics = InferenceMetrics {
            backend: self.backend,
            ttft_ms,
            tokens_per_sec,
            prompt_tokens: self.prompt_tokens,
            generated_tokens: self.token_count,
            total_time_ms,
        };

        self.hook.on_generation_complete(&metrics);
        metrics
    }
}
