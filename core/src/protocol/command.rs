use std::fmt;

/// Outbound command sent fire-and-forget to the sensor relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the relay to report its status.
    Status,
    Raw(String),
}

impl Command {
    /// Newline-terminated frame as written to the transport.
    pub fn to_frame(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Status => f.write_str("STATUS"),
            Command::Raw(text) => f.write_str(text.trim_end_matches(['\r', '\n'])),
        }
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        match text.trim() {
            "STATUS" => Command::Status,
            other => Command::Raw(other.to_string()),
        }
    }
}
