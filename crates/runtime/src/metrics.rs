//! Metrics instrumentation for run observability.

use std::time::Instant;

pub const PLAN_GENERATION_LATENCY: &str = "plan_generation_latency";
pub const RUN_DURATION: &str = "run_duration";

/// Record plan generation latency.
pub fn record_generation_latency(duration_ms: f64) {
    metrics::histogram!(PLAN_GENERATION_LATENCY, duration_ms);
}

/// Record end-to-end run duration.
pub fn record_run_duration(duration_ms: f64) {
    metrics::histogram!(RUN_DURATION, duration_ms);
}

/// Count model calls made while generating one plan.
pub fn record_generation_attempts(attempts: u64) {
    if attempts > 0 {
        metrics::counter!("plan_generation_attempts", attempts);
    }
}

/// Record a single step's execution latency.
pub fn record_step_latency(duration_ms: f64) {
    metrics::histogram!("step_execution_latency", duration_ms);
}

/// Count steps dropped by the normalizer.
pub fn record_skipped_steps(count: u64) {
    if count > 0 {
        metrics::counter!("normalizer_skipped_steps", count);
    }
}

/// Count a terminal outcome by status.
pub fn record_outcome(status: &'static str) {
    metrics::counter!("run_outcomes", 1, "status" => status);
}

/// RAII timer for automatic metric recording.
pub struct MetricTimer {
    start: Instant,
    metric_name: &'static str,
}

impl MetricTimer {
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }
}

impl Drop for MetricTimer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        match self.metric_name {
            PLAN_GENERATION_LATENCY => record_generation_latency(duration_ms),
            RUN_DURATION => record_run_duration(duration_ms),
            _ => {}
        }
    }
}
