use std::time::Duration;

/// Observability collaborator injected into the engine and service.
///
/// Nothing in the ledger depends on it for correctness.
pub trait EngineMetrics: Send + Sync {
    fn record_duration(&self, method: &'static str, elapsed: Duration);
    fn record_error(&self, method: &'static str, kind: &'static str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl EngineMetrics for NoopMetrics {
    fn record_duration(&self, _method: &'static str, _elapsed: Duration) {}
    fn record_error(&self, _method: &'static str, _kind: &'static str) {}
}

/// Forwards to the process-wide `metrics` recorder, if one is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderMetrics;

impl EngineMetrics for RecorderMetrics {
    fn record_duration(&self, method: &'static str, elapsed: Duration) {
        ::metrics::histogram!("ewallet_store_duration_seconds", "method" => method)
            .record(elapsed.as_secs_f64());
    }

    fn record_error(&self, method: &'static str, kind: &'static str) {
        ::metrics::counter!("ewallet_errors_total", "method" => method, "kind" => kind)
            .increment(1);
    }
}
