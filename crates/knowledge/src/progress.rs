//! Progress reporting for the ingestion tools.
//!
//! Embedding and uploading can take minutes on large document sets; callers
//! pass a reporter to get one event per written record or uploaded batch.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during ingestion.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "embed" or "upload"
    pub phase: &'static str,

    /// Units done so far (pages embedded, documents uploaded)
    pub current: u64,

    /// Total expected work, if known
    pub total: Option<u64>,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    /// Format as a single user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) if total > 0 => format!(
                "{}/{} ({:.0}%)",
                self.current,
                total,
                self.current as f64 / total as f64 * 100.0
            ),
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };

        format!("[{}] {} - {}", self.phase, progress, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress events through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// A reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    fn emit(&self, phase: &'static str, current: u64, total: Option<u64>, message: String) {
        let Some(callback) = &self.callback else {
            return;
        };

        let event = ProgressEvent {
            phase,
            current,
            total,
            message,
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
        };

        tracing::debug!(
            phase = event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            "Progress event"
        );

        callback(event);
    }

    /// One embedding record was written.
    pub fn embedded(&self, current: u64, source: &str, page: u32, record: &str) {
        self.emit(
            "embed",
            current,
            None,
            format!("page {} of {} -> {}", page, source, record),
        );
    }

    /// One batch of documents was accepted by the index.
    pub fn uploaded(&self, current: u64, total: u64, batch_len: usize) {
        self.emit(
            "upload",
            current,
            Some(total),
            format!("uploaded {} documents", batch_len),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent {
            phase: "upload",
            current: 50,
            total: Some(200),
            message: "uploaded 50 documents".to_string(),
            elapsed_secs: 0.0,
        };
        assert_eq!(event.format_simple(), "[upload] 50/200 (25%) - uploaded 50 documents");
    }

    #[test]
    fn test_progress_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        let reporter = ProgressReporter::new(Arc::new(move |event| {
            events_clone.lock().unwrap().push(event);
        }));

        reporter.embedded(1, "report.json", 3, "report.page3.embedding.json");

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].phase, "embed");
        assert!(captured[0].message.contains("page 3 of report.json"));
    }

    #[test]
    fn test_noop_reporter() {
        ProgressReporter::noop().uploaded(1, 1, 1);
    }
}
