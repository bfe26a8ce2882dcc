use crate::prelude::{PipelineError, PipelineResult};
use crate::protocol::{TelemetryMessage, WireFrame};
use crate::telemetry::log::LogManager;

/// Turns framed lines into telemetry messages.
///
/// Only lines whose trimmed content starts with `{` reach the JSON parser;
/// everything else sharing the stream (boot banners, debug prints) is
/// ignored without cost.
pub struct MessageParser {
    logger: LogManager,
}

impl MessageParser {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("parser"),
        }
    }

    /// Parses `line`, logging and dropping frames that fail to parse.
    pub fn parse(&self, line: &str) -> Option<TelemetryMessage> {
        match self.try_parse(line) {
            Ok(message) => message,
            Err(err) => {
                self.logger.irregularity(&err.to_string());
                None
            }
        }
    }

    /// `Ok(None)` for lines that are not frame candidates.
    pub fn try_parse(&self, line: &str) -> PipelineResult<Option<TelemetryMessage>> {
        let trimmed = line.trim();
        if !is_candidate(trimmed) {
            return Ok(None);
        }

        let frame: WireFrame = serde_json::from_str(trimmed)
            .map_err(|err| PipelineError::FrameParse(format!("{} in {:?}", err, trimmed)))?;
        let message = TelemetryMessage::from_frame(frame);
        self.logger.trace(&format!("parsed {:?}", message));
        Ok(Some(message))
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_candidate(trimmed: &str) -> bool {
    trimmed.starts_with('{')
}
