use crate::telemetry::log::LogManager;

/// Reassembles newline-delimited frames across chunk boundaries.
pub struct LineFramer {
    buffer: String,
    logger: LogManager,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            logger: LogManager::new("framer"),
        }
    }

    /// Appends `text` and returns every line it completed, in arrival order.
    /// The unterminated tail stays buffered for the next call.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);
        let lines: Vec<String> = complete
            .split_terminator('\n')
            .map(str::to_string)
            .collect();
        self.logger.trace(&format!(
            "framed {} line(s), {} byte(s) pending",
            lines.len(),
            self.buffer.len()
        ));
        lines
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
