// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Document store operations (throughput, latency, outcome per backend)
// - Documents returned by reads and aggregations
// - Domain mutations and validation failures
// - Search requests and result sizes
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Store Metrics
    pub store_operations: IntCounterVec,
    pub store_operation_duration: HistogramVec,
    pub store_documents_returned: IntCounterVec,

    // Domain Metrics
    pub domain_mutations: IntCounterVec,
    pub validation_failures: IntCounterVec,

    // Search Metrics
    pub search_requests_total: IntCounter,
    pub search_results: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Store Metrics
        let store_operations = IntCounterVec::new(
            Opts::new("store_operations_total", "Total document store operations"),
            &["backend", "operation", "collection", "outcome"],
        )?;
        registry.register(Box::new(store_operations.clone()))?;

        let store_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "store_operation_duration_seconds",
                "Document store operation duration",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["backend", "operation"],
        )?;
        registry.register(Box::new(store_operation_duration.clone()))?;

        let store_documents_returned = IntCounterVec::new(
            Opts::new(
                "store_documents_returned_total",
                "Documents returned by reads and aggregations",
            ),
            &["operation", "collection"],
        )?;
        registry.register(Box::new(store_documents_returned.clone()))?;

        // Domain Metrics
        let domain_mutations = IntCounterVec::new(
            Opts::new("domain_mutations_total", "Successful create/update/delete calls"),
            &["entity", "action"],
        )?;
        registry.register(Box::new(domain_mutations.clone()))?;

        let validation_failures = IntCounterVec::new(
            Opts::new("validation_failures_total", "Requests rejected by validation"),
            &["operation"],
        )?;
        registry.register(Box::new(validation_failures.clone()))?;

        // Search Metrics
        let search_requests_total =
            IntCounter::new("search_requests_total", "Total combined search requests")?;
        registry.register(Box::new(search_requests_total.clone()))?;

        let search_results = IntCounterVec::new(
            Opts::new("search_results_total", "Search hits by result kind"),
            &["kind"],
        )?;
        registry.register(Box::new(search_results.clone()))?;

        Ok(Self {
            registry,
            store_operations,
            store_operation_duration,
            store_documents_returned,
            domain_mutations,
            validation_failures,
            search_requests_total,
            search_results,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a store operation and its latency
    pub fn record_store_operation(
        &self,
        backend: &str,
        operation: &str,
        collection: &str,
        outcome: &str,
        duration_secs: f64,
    ) {
        self.store_operations
            .with_label_values(&[backend, operation, collection, outcome])
            .inc();
        self.store_operation_duration
            .with_label_values(&[backend, operation])
            .observe(duration_secs);
    }

    pub fn record_documents_returned(&self, operation: &str, collection: &str, count: usize) {
        self.store_documents_returned
            .with_label_values(&[operation, collection])
            .inc_by(count as u64);
    }

    pub fn record_mutation(&self, entity: &str, action: &str) {
        self.domain_mutations.with_label_values(&[entity, action]).inc();
    }

    pub fn record_validation_failure(&self, operation: &str) {
        self.validation_failures.with_label_values(&[operation]).inc();
    }

    /// Helper to record one combined search and the size of each half
    pub fn record_search(&self, teams: usize, fixtures: usize) {
        self.search_requests_total.inc();
        self.search_results
            .with_label_values(&["teams"])
            .inc_by(teams as u64);
        self.search_results
            .with_label_values(&["fixtures"])
            .inc_by(fixtures as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_search(0, 0);
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_store_operation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_store_operation("memory", "insert_one", "teams", "ok", 0.001);
        metrics.record_store_operation("memory", "insert_one", "teams", "duplicate_key", 0.001);

        let gathered = metrics.registry.gather();
        let operations = gathered
            .iter()
            .find(|m| m.name() == "store_operations_total")
            .unwrap();
        assert_eq!(operations.metric.len(), 2); // Two different outcome labels
    }

    #[test]
    fn test_record_search() {
        let metrics = Metrics::new().unwrap();
        metrics.record_search(2, 1);
        metrics.record_search(1, 0);

        let gathered = metrics.registry.gather();
        let requests = gathered
            .iter()
            .find(|m| m.name() == "search_requests_total")
            .unwrap();
        assert_eq!(requests.metric[0].counter.value, Some(2.0));
    }

    #[test]
    fn test_record_validation_failure() {
        let metrics = Metrics::new().unwrap();
        metrics.record_validation_failure("create_fixture");

        let gathered = metrics.registry.gather();
        let failures = gathered
            .iter()
            .find(|m| m.name() == "validation_failures_total")
            .unwrap();
        assert_eq!(failures.metric[0].counter.value, Some(1.0));
    }
}
