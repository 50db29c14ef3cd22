//! Metrics for the relay roles.

/// Container for the relayer's metric names and recorders.
///
/// Every recorder is a no-op unless the `metrics` feature is enabled.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Headers stored on the bridge contract and confirmed.
    pub const HEADERS_RELAYED_TOTAL: &'static str = "strait_headers_relayed_total";
    /// The source height of the last confirmed header.
    pub const RELAYED_HEIGHT: &'static str = "strait_relayed_height";
    /// Proofs submitted with `verify`.
    pub const PROOFS_SUBMITTED_TOTAL: &'static str = "strait_proofs_submitted_total";
    /// Requests left pending because the source chain could not produce a proof.
    pub const PROOFS_UNAVAILABLE_TOTAL: &'static str = "strait_proofs_unavailable_total";
    /// Requests the fulfiller dropped after a failure, labelled by kind.
    pub const REQUESTS_DROPPED_TOTAL: &'static str = "strait_requests_dropped_total";
    /// Requests observed resolved by the request client, labelled by outcome.
    pub const REQUESTS_RESOLVED_TOTAL: &'static str = "strait_requests_resolved_total";

    /// Describes and zeroes every metric.
    pub fn init() {
        #[cfg(feature = "metrics")]
        {
            Self::describe();
            Self::zero();
        }
    }

    #[cfg(feature = "metrics")]
    fn describe() {
        metrics::describe_counter!(
            Self::HEADERS_RELAYED_TOTAL,
            metrics::Unit::Count,
            "Headers stored on the bridge contract and confirmed",
        );
        metrics::describe_gauge!(
            Self::RELAYED_HEIGHT,
            metrics::Unit::Count,
            "Source chain height of the last confirmed header",
        );
        metrics::describe_counter!(
            Self::PROOFS_SUBMITTED_TOTAL,
            metrics::Unit::Count,
            "Storage proofs submitted to the bridge contract",
        );
        metrics::describe_counter!(
            Self::PROOFS_UNAVAILABLE_TOTAL,
            metrics::Unit::Count,
            "Requests left pending because no proof was available",
        );
        metrics::describe_counter!(
            Self::REQUESTS_DROPPED_TOTAL,
            metrics::Unit::Count,
            "Requests dropped by the fulfiller after a failure other than pruned state, by kind",
        );
        metrics::describe_counter!(
            Self::REQUESTS_RESOLVED_TOTAL,
            metrics::Unit::Count,
            "Requests resolved by the bridge contract, by outcome",
        );
    }

    #[cfg(feature = "metrics")]
    fn zero() {
        metrics::counter!(Self::HEADERS_RELAYED_TOTAL).increment(0);
        metrics::gauge!(Self::RELAYED_HEIGHT).set(0.0);
        metrics::counter!(Self::PROOFS_SUBMITTED_TOTAL).increment(0);
        metrics::counter!(Self::PROOFS_UNAVAILABLE_TOTAL).increment(0);
        metrics::counter!(Self::REQUESTS_RESOLVED_TOTAL, "outcome" => "served").increment(0);
        metrics::counter!(Self::REQUESTS_RESOLVED_TOTAL, "outcome" => "not_found").increment(0);
    }

    pub(crate) fn record_header_relayed(height: u64) {
        #[cfg(feature = "metrics")]
        {
            metrics::counter!(Self::HEADERS_RELAYED_TOTAL).increment(1);
            metrics::gauge!(Self::RELAYED_HEIGHT).set(height as f64);
        }
        #[cfg(not(feature = "metrics"))]
        let _ = height;
    }

    pub(crate) fn record_proof_submitted() {
        #[cfg(feature = "metrics")]
        metrics::counter!(Self::PROOFS_SUBMITTED_TOTAL).increment(1);
    }

    pub(crate) fn record_proof_unavailable() {
        #[cfg(feature = "metrics")]
        metrics::counter!(Self::PROOFS_UNAVAILABLE_TOTAL).increment(1);
    }

    pub(crate) fn record_request_dropped(kind: &'static str) {
        #[cfg(feature = "metrics")]
        metrics::counter!(Self::REQUESTS_DROPPED_TOTAL, "kind" => kind).increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = kind;
    }

    pub(crate) fn record_request_resolved(outcome: &'static str) {
        #[cfg(feature = "metrics")]
        metrics::counter!(Self::REQUESTS_RESOLVED_TOTAL, "outcome" => outcome).increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = outcome;
    }
}
