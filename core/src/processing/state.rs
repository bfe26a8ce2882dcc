use serde::Serialize;

use crate::protocol::TelemetryMessage;

/// Latest sweep reading and connection flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryState {
    pub angle: f64,
    pub distance: f64,
    /// Link status of the upstream radio relay, as reported in frames.
    pub link_connected: bool,
    /// Whether the local transport is open.
    pub transport_connected: bool,
    pub status: Option<String>,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates each field the message carries. The sweep reading is only
    /// taken from a valid sample; link fields apply regardless.
    pub fn apply(&mut self, message: &TelemetryMessage) {
        if let Some((angle, distance)) = message.sample() {
            self.angle = angle;
            self.distance = distance;
        }
        if let Some(connected) = message.connected {
            self.link_connected = connected;
        }
        if let Some(status) = &message.status {
            self.status = Some(status.clone());
        }
    }

    pub fn set_transport_connected(&mut self, connected: bool) {
        self.transport_connected = connected;
    }

    /// Clears both connection flags, keeping the last reading for display.
    pub fn disconnect(&mut self) {
        self.link_connected = false;
        self.transport_connected = false;
    }

    pub fn snapshot(&self) -> TelemetryState {
        self.clone()
    }
}
