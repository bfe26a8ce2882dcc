use std::sync::Arc;
use std::time::Instant;

use crate::clock::{Clock, MonotonicClock};
use crate::prelude::{PipelineConfig, PipelineError};
use crate::processing::{
    ChunkDecoder, LineFramer, MessageParser, SampleHistory, TargetDetector, TelemetryState,
};
use crate::protocol::{DetectedTarget, PolarSample, RawChunk, TelemetryMessage};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{MetricsRecorder, MetricsSnapshot};

/// What a single chunk produced on its way through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub lines: usize,
    pub messages: usize,
    pub samples: usize,
    pub detections: Vec<DetectedTarget>,
}

/// Read-only copy of everything a display client needs.
#[derive(Debug, Clone)]
pub struct RadarSnapshot {
    pub taken_at: Instant,
    pub telemetry: TelemetryState,
    pub history: Vec<PolarSample>,
    pub targets: Vec<DetectedTarget>,
    pub metrics: MetricsSnapshot,
}

/// Owns all decoding, framing and detection state for one sensor stream.
///
/// Chunks go through decode, framing and parsing; every parsed message
/// then fans out to the telemetry state, the sample history and the
/// target detector. Malformed input is logged, counted and skipped.
pub struct RadarPipeline {
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
    decoder: ChunkDecoder,
    framer: LineFramer,
    parser: MessageParser,
    state: TelemetryState,
    history: SampleHistory,
    detector: TargetDetector,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl RadarPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    pub fn with_clock(config: PipelineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            decoder: ChunkDecoder::new(),
            framer: LineFramer::new(),
            parser: MessageParser::new(),
            state: TelemetryState::new(),
            history: SampleHistory::with_capacity(config.history_capacity),
            detector: TargetDetector::new(config.detector.clone()),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("pipeline"),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Runs one transport chunk end to end.
    pub fn ingest(&mut self, chunk: &RawChunk) -> IngestReport {
        self.metrics.record_chunk();
        let text = match self.decoder.try_decode(chunk) {
            Ok(text) => text,
            Err(irregularity) => {
                self.metrics.record_decode_irregularity();
                self.decoder.salvage(irregularity)
            }
        };
        self.ingest_text(&text)
    }

    /// Frames and applies already-decoded text.
    pub fn ingest_text(&mut self, text: &str) -> IngestReport {
        let lines = self.framer.feed(text);
        self.metrics.record_lines(lines.len());

        let mut report = IngestReport {
            lines: lines.len(),
            ..Default::default()
        };
        for line in &lines {
            let message = match self.parser.try_parse(line) {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(err) => {
                    self.metrics.record_frame_parse_error();
                    self.logger.irregularity(&err.to_string());
                    continue;
                }
            };

            report.messages += 1;
            let now = self.clock.now();
            if message.sample().is_some() {
                report.samples += 1;
            }
            if let Some(target) = self.apply_message(&message, now) {
                report.detections.push(target);
            }
        }
        report
    }

    /// Fans a parsed message out to the state, the history and the detector.
    pub fn apply_message(&mut self, message: &TelemetryMessage, now: Instant) -> Option<DetectedTarget> {
        self.metrics.record_message();
        self.state.apply(message);

        for field in message.coercion_failures() {
            self.metrics.record_coercion_failure();
            self.logger
                .irregularity(&PipelineError::FieldCoercion { field }.to_string());
        }
        if message.is_ready() {
            self.logger.record("sensor reports ready");
        }

        let (angle, distance) = message.sample()?;
        self.metrics.record_sample();
        self.history.record(PolarSample::new(angle, distance, now));

        let target = self.detector.observe(angle, distance, now)?;
        self.metrics.record_detection();
        Some(target)
    }

    pub fn telemetry(&self) -> &TelemetryState {
        &self.state
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Targets still live at the current clock reading.
    pub fn targets(&self) -> Vec<DetectedTarget> {
        self.detector.live_targets(self.clock.now())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn record_transport_failure(&self) {
        self.metrics.record_transport_failure();
    }

    pub fn pending_text(&self) -> &str {
        self.framer.pending()
    }

    pub fn snapshot(&self) -> RadarSnapshot {
        let taken_at = self.clock.now();
        RadarSnapshot {
            taken_at,
            telemetry: self.state.snapshot(),
            history: self.history.to_vec(),
            targets: self.detector.live_targets(taken_at),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Forgets detected targets and bucket baselines.
    pub fn clear_targets(&mut self) {
        self.detector.clear();
        self.logger.record("targets cleared");
    }

    /// Clears the sample history together with the detection state.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.clear_targets();
    }

    pub fn set_transport_connected(&mut self, connected: bool) {
        self.state.set_transport_connected(connected);
    }

    /// Disconnect semantics: drops the partial line, baselines, targets
    /// and both connection flags. The sample history is kept.
    pub fn reset(&mut self) {
        self.framer.reset();
        self.detector.clear();
        self.state.disconnect();
        self.logger.record("pipeline reset");
    }
}

impl Default for RadarPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn frame(angle: f64, distance: f64) -> String {
        format!("{{\"angle\":{},\"distance\":{}}}\n", angle, distance)
    }

    fn hex(text: &str) -> RawChunk {
        RawChunk::Text(text.bytes().map(|b| format!("{:02X}", b)).collect())
    }

    fn pipeline_with_clock() -> (RadarPipeline, ManualClock) {
        let clock = ManualClock::new();
        let pipeline = RadarPipeline::with_clock(PipelineConfig::default(), Arc::new(clock.clone()));
        (pipeline, clock)
    }

    #[test]
    fn mixed_encodings_reassemble_split_frames() {
        let (mut pipeline, _) = pipeline_with_clock();
        let first = pipeline.ingest(&hex("{\"angle\":10,"));
        let second = pipeline.ingest(&RawChunk::from(&b"\"distance\":100}\n{\"angle\""[..]));
        let third = pipeline.ingest(&RawChunk::from(":\"12\",\"distance\":\"250\"}\n"));

        assert_eq!(first.lines, 0);
        assert_eq!(second.samples, 1);
        assert_eq!(third.samples, 1);
        assert_eq!(third.detections.len(), 1);
        assert_eq!(pipeline.telemetry().angle, 12.0);
        assert_eq!(pipeline.history().len(), 2);
        assert_eq!(pipeline.pending_text(), "");
    }

    #[test]
    fn malformed_units_are_skipped_without_side_effects() {
        let (mut pipeline, _) = pipeline_with_clock();
        let report = pipeline.ingest(&RawChunk::from(
            "boot v1.2\n{\"angle\":5,\n{\"angle\":\"x\",\"distance\":9,\"connected\":true}\n",
        ));
        assert_eq!(report.lines, 3);
        assert_eq!(report.messages, 1);
        assert_eq!(report.samples, 0);
        assert!(pipeline.telemetry().link_connected);
        assert!(pipeline.history().is_empty());

        let metrics = pipeline.metrics();
        assert_eq!(metrics.frame_parse_errors, 1);
        assert_eq!(metrics.coercion_failures, 1);
    }

    #[test]
    fn decode_irregularity_still_feeds_salvaged_text() {
        let (mut pipeline, _) = pipeline_with_clock();
        pipeline.ingest(&RawChunk::from("{\"angle\":1,\"distance\":2}"));
        let report = pipeline.ingest(&RawChunk::Values(vec![10, 999]));
        assert_eq!(report.samples, 1);
        assert_eq!(pipeline.metrics().decode_irregularities, 1);
    }

    #[test]
    fn history_is_bounded_to_capacity() {
        let (mut pipeline, _) = pipeline_with_clock();
        for i in 0..400 {
            pipeline.ingest(&RawChunk::from(frame((i % 180) as f64, 500.0)));
        }
        assert_eq!(pipeline.history().len(), 360);
        assert_eq!(pipeline.metrics().samples, 400);
    }

    #[test]
    fn targets_age_out_of_snapshots() {
        let (mut pipeline, clock) = pipeline_with_clock();
        pipeline.ingest(&RawChunk::from(frame(10.0, 100.0)));
        pipeline.ingest(&RawChunk::from(frame(10.0, 200.0)));
        assert_eq!(pipeline.snapshot().targets.len(), 1);

        clock.advance_ms(30_000);
        assert!(pipeline.snapshot().targets.is_empty());
    }

    #[test]
    fn clear_history_also_clears_targets() {
        let (mut pipeline, _) = pipeline_with_clock();
        pipeline.ingest(&RawChunk::from(frame(10.0, 100.0)));
        pipeline.ingest(&RawChunk::from(frame(10.0, 200.0)));
        pipeline.clear_history();
        assert!(pipeline.history().is_empty());
        assert!(pipeline.targets().is_empty());

        // Baseline is gone too: the next reading cannot fire.
        let report = pipeline.ingest(&RawChunk::from(frame(10.0, 400.0)));
        assert!(report.detections.is_empty());
    }

    #[test]
    fn reset_drops_partial_line_and_flags_but_keeps_history() {
        let (mut pipeline, _) = pipeline_with_clock();
        pipeline.set_transport_connected(true);
        pipeline.ingest(&RawChunk::from("{\"connected\":true}\n"));
        pipeline.ingest(&RawChunk::from(frame(10.0, 100.0)));
        pipeline.ingest(&RawChunk::from("{\"angle\":"));
        pipeline.reset();

        assert_eq!(pipeline.pending_text(), "");
        assert!(!pipeline.telemetry().link_connected);
        assert!(!pipeline.telemetry().transport_connected);
        assert_eq!(pipeline.history().len(), 1);
    }
}
