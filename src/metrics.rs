//! Metrics recording
//!
//! Counters are recorded through the `metrics` facade. Installing a recorder
//! (Prometheus or otherwise) is left to the host application; without one,
//! every call here is a no-op.

/// Register metric descriptions (call once at startup, after installing a recorder)
pub fn describe_metrics() {
    metrics::describe_counter!(
        "codestream_requests_total",
        "Total number of generation requests by vendor and outcome"
    );
    metrics::describe_counter!(
        "codestream_fragments_total",
        "Total content fragments delivered to callers"
    );
    metrics::describe_counter!(
        "codestream_malformed_lines_total",
        "Stream lines that failed structured parsing and were passed through as raw text"
    );
}

/// Record a finished request
pub fn record_request(vendor: &str, outcome: &str) {
    metrics::counter!(
        "codestream_requests_total",
        "vendor" => vendor.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a fragment delivered for a vendor
pub fn record_fragment(vendor: &str) {
    metrics::counter!("codestream_fragments_total", "vendor" => vendor.to_string()).increment(1);
}

/// Record a line recovered as raw text
pub fn record_malformed_line() {
    metrics::counter!("codestream_malformed_lines_total").increment(1);
}
