use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing upload and summarization activity.
#[derive(Default)]
pub struct ServiceMetrics {
    documents_stored: AtomicU64,
    duplicate_uploads: AtomicU64,
    summaries_generated: AtomicU64,
    summary_cache_hits: AtomicU64,
    completion_failures: AtomicU64,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an upload, noting whether its content was already stored.
    pub fn record_upload(&self, deduplicated: bool) {
        if deduplicated {
            self.duplicate_uploads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.documents_stored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a summary produced by the completion service.
    pub fn record_summary_generated(&self) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summary answered from the cache.
    pub fn record_cache_hit(&self) {
        self.summary_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed or timed-out completion call.
    pub fn record_completion_failure(&self) {
        self.completion_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_stored: self.documents_stored.load(Ordering::Relaxed),
            duplicate_uploads: self.duplicate_uploads.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            summary_cache_hits: self.summary_cache_hits.load(Ordering::Relaxed),
            completion_failures: self.completion_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of service counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Novel documents written to the store since startup.
    pub documents_stored: u64,
    /// Uploads whose content was already stored.
    pub duplicate_uploads: u64,
    /// Summaries produced by the completion service.
    pub summaries_generated: u64,
    /// Summaries answered from the cache.
    pub summary_cache_hits: u64,
    /// Completion calls that failed or timed out.
    pub completion_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_uploads_by_dedup_outcome() {
        let metrics = ServiceMetrics::new();
        metrics.record_upload(false);
        metrics.record_upload(true);
        metrics.record_upload(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_stored, 1);
        assert_eq!(snapshot.duplicate_uploads, 2);
    }

    #[test]
    fn records_summary_activity() {
        let metrics = ServiceMetrics::new();
        metrics.record_summary_generated();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_completion_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.summaries_generated, 1);
        assert_eq!(snapshot.summary_cache_hits, 2);
        assert_eq!(snapshot.completion_failures, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        assert_eq!(ServiceMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
