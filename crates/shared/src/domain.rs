use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(Sequence);
id_newtype!(RecognitionSessionId);
id_newtype!(QueryTicket);

pub const DEFAULT_ENDPOINT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sequence: Sequence,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlags {
    pub listening: bool,
    pub synthesis_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub endpoint_port: u16,
}

impl Default for SessionFlags {
    fn default() -> Self {
        Self {
            listening: false,
            synthesis_enabled: false,
            last_error: None,
            endpoint_port: DEFAULT_ENDPOINT_PORT,
        }
    }
}

/// Validates a user-supplied port, returning `None` outside `1..=65535`.
pub fn parse_endpoint_port(value: i64) -> Option<u16> {
    u16::try_from(value).ok().filter(|port| *port != 0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn chat_url(&self) -> String {
        format!("http://{}:{}/chat", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_bounds_are_inclusive() {
        assert_eq!(parse_endpoint_port(1), Some(1));
        assert_eq!(parse_endpoint_port(65535), Some(65535));
        assert_eq!(parse_endpoint_port(0), None);
        assert_eq!(parse_endpoint_port(-80), None);
        assert_eq!(parse_endpoint_port(70000), None);
    }

    #[test]
    fn chat_url_targets_chat_route() {
        let endpoint = Endpoint::new("localhost", 9090);
        assert_eq!(endpoint.chat_url(), "http://localhost:9090/chat");
    }

    #[test]
    fn default_flags_match_session_start() {
        let flags = SessionFlags::default();
        assert!(!flags.listening);
        assert!(!flags.synthesis_enabled);
        assert_eq!(flags.last_error, None);
        assert_eq!(flags.endpoint_port, DEFAULT_ENDPOINT_PORT);
    }
}
