use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    text_requests: AtomicU64,
    file_requests: AtomicU64,
    chunks_summarized: AtomicU64,
    failures: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized raw-text request and its chunk count.
    pub fn record_text(&self, chunk_count: u64) {
        self.text_requests.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a summarized upload and its chunk count.
    pub fn record_file(&self, chunk_count: u64) {
        self.file_requests.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a request that ended in an error.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            text_requests: self.text_requests.load(Ordering::Relaxed),
            file_requests: self.file_requests.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the summarization counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Successful `POST /summarize` requests since startup.
    pub text_requests: u64,
    /// Successful `POST /summarize-file` requests since startup.
    pub file_requests: u64,
    /// Chunks passed through the model across all successful requests.
    pub chunks_summarized: u64,
    /// Requests rejected or failed.
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_requests_and_chunks() {
        let metrics = SummaryMetrics::new();
        metrics.record_text(2);
        metrics.record_file(3);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.text_requests, 1);
        assert_eq!(snapshot.file_requests, 1);
        assert_eq!(snapshot.chunks_summarized, 5);
        assert_eq!(snapshot.failures, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        assert_eq!(SummaryMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
