use serde::Serialize;
use std::sync::Mutex;

/// Pipeline counters, shared between the consumer and readers.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub chunks: usize,
    pub lines: usize,
    pub messages: usize,
    pub samples: usize,
    pub detections: usize,
    pub decode_irregularities: usize,
    pub frame_parse_errors: usize,
    pub coercion_failures: usize,
    pub transport_failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn bump(&self, field: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            field(&mut metrics);
        }
    }

    pub fn record_chunk(&self) {
        self.bump(|m| m.chunks += 1);
    }

    pub fn record_lines(&self, count: usize) {
        self.bump(|m| m.lines += count);
    }

    pub fn record_message(&self) {
        self.bump(|m| m.messages += 1);
    }

    pub fn record_sample(&self) {
        self.bump(|m| m.samples += 1);
    }

    pub fn record_detection(&self) {
        self.bump(|m| m.detections += 1);
    }

    pub fn record_decode_irregularity(&self) {
        self.bump(|m| m.decode_irregularities += 1);
    }

    pub fn record_frame_parse_error(&self) {
        self.bump(|m| m.frame_parse_errors += 1);
    }

    pub fn record_coercion_failure(&self) {
        self.bump(|m| m.coercion_failures += 1);
    }

    pub fn record_transport_failure(&self) {
        self.bump(|m| m.transport_failures += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
