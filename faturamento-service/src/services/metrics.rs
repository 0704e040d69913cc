//! Prometheus metrics for faturamento-service.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Invoice lifecycle counter by event.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "faturamento_invoices_total",
        "Total number of invoice lifecycle events",
        &["event"] // created, printed
    )
    .expect("Failed to register invoices_total")
});

/// Sum of invoice totals at creation. Approximate: exported as f64.
pub static INVOICE_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "faturamento_invoice_amount_total",
        "Total amount of created invoices by currency",
        &["currency"]
    )
    .expect("Failed to register invoice_amount_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "faturamento_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "faturamento_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&INVOICE_AMOUNT_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&service_core::middleware::metrics::HTTP_REQUESTS_TOTAL);
    Lazy::force(&service_core::middleware::metrics::HTTP_REQUEST_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    service_core::middleware::gather_metrics()
}
