//! Ticket lifecycle metrics.
//!
//! Counters are recorded through the `metrics` facade; they are no-ops until
//! the application installs a recorder (the server installs the Prometheus
//! exporter).

use metrics::describe_counter;

// Re-export metrics macros for use in other modules
pub use metrics::counter;

/// Tickets issued.
pub const TICKETS_ISSUED: &str = "qrlogin_tickets_issued_total";

/// Claims, labelled by `outcome`.
pub const CLAIMS: &str = "qrlogin_claims_total";

/// Polls, labelled by `outcome`.
pub const POLLS: &str = "qrlogin_polls_total";

/// Tickets removed by expiry sweeps.
pub const TICKETS_SWEPT: &str = "qrlogin_tickets_swept_total";

/// Whole-table saves that failed and were absorbed.
pub const PERSIST_FAILURES: &str = "qrlogin_store_persist_failures_total";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(TICKETS_ISSUED, "Total number of login tickets issued");
    describe_counter!(CLAIMS, "Total number of claim attempts by outcome");
    describe_counter!(POLLS, "Total number of poll requests by outcome");
    describe_counter!(
        TICKETS_SWEPT,
        "Total number of expired tickets removed by sweeps"
    );
    describe_counter!(
        PERSIST_FAILURES,
        "Total number of failed ticket table saves"
    );
}
