use std::{fs, path::Path};

use anyhow::Context;
use client_core::{SessionOptions, SubmissionPolicy};
use serde::Deserialize;
use shared::domain::{parse_endpoint_port, DEFAULT_ENDPOINT_PORT};
use speech::{RecognitionOptions, DEFAULT_RECOGNITION_LANGUAGE, DEFAULT_SYNTHESIS_LANGUAGE};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "nutribot.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub recognition_language: String,
    pub synthesis_language: String,
    pub request_timeout_secs: Option<u64>,
    pub speech_command: String,
    /// Capture-and-transcribe command for voice input; none disables it.
    pub recognition_command: Option<String>,
    pub serialize_queries: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_ENDPOINT_PORT,
            recognition_language: DEFAULT_RECOGNITION_LANGUAGE.into(),
            synthesis_language: DEFAULT_SYNTHESIS_LANGUAGE.into(),
            request_timeout_secs: None,
            speech_command: "espeak-ng".into(),
            recognition_command: None,
            serialize_queries: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    host: Option<String>,
    port: Option<i64>,
    recognition_language: Option<String>,
    synthesis_language: Option<String>,
    request_timeout_secs: Option<u64>,
    speech_command: Option<String>,
    recognition_command: Option<String>,
    serialize_queries: Option<bool>,
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<i64>,
    pub request_timeout_secs: Option<u64>,
    pub serialize_queries: bool,
}

impl Settings {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            host: self.host.clone(),
            port: self.port,
            recognition: RecognitionOptions {
                language: self.recognition_language.clone(),
            },
            synthesis_language: self.synthesis_language.clone(),
            submission_policy: if self.serialize_queries {
                SubmissionPolicy::Serialized
            } else {
                SubmissionPolicy::Concurrent
            },
        }
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(host) = overrides.host {
            self.set_host(host);
        }
        if let Some(port) = overrides.port {
            self.set_port(port);
        }
        if overrides.request_timeout_secs.is_some() {
            self.request_timeout_secs = overrides.request_timeout_secs;
        }
        if overrides.serialize_queries {
            self.serialize_queries = true;
        }
    }

    fn set_host(&mut self, host: String) {
        match url::Host::parse(&host) {
            Ok(_) => self.host = host,
            Err(err) => warn!(host = %host, "ignoring invalid host: {err}"),
        }
    }

    fn set_port(&mut self, value: i64) {
        match parse_endpoint_port(value) {
            Some(port) => self.port = port,
            None => warn!(value, "ignoring out-of-range port"),
        }
    }

    /// A blank command switches voice input off.
    fn set_recognition_command(&mut self, command: String) {
        let command = command.trim();
        self.recognition_command = (!command.is_empty()).then(|| command.to_string());
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(host) = file.host {
            self.set_host(host);
        }
        if let Some(port) = file.port {
            self.set_port(port);
        }
        if let Some(v) = file.recognition_language {
            self.recognition_language = v;
        }
        if let Some(v) = file.synthesis_language {
            self.synthesis_language = v;
        }
        if file.request_timeout_secs.is_some() {
            self.request_timeout_secs = file.request_timeout_secs;
        }
        if let Some(v) = file.speech_command {
            self.speech_command = v;
        }
        if let Some(v) = file.recognition_command {
            self.set_recognition_command(v);
        }
        if let Some(v) = file.serialize_queries {
            self.serialize_queries = v;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        for key in ["NUTRIBOT_HOST", "APP__HOST"] {
            if let Some(v) = var(key) {
                self.set_host(v);
            }
        }

        for key in ["NUTRIBOT_PORT", "APP__PORT"] {
            if let Some(v) = var(key) {
                match v.trim().parse::<i64>() {
                    Ok(parsed) => self.set_port(parsed),
                    Err(_) => warn!(key, value = %v, "ignoring non-numeric port"),
                }
            }
        }

        if let Some(v) = var("APP__RECOGNITION_LANGUAGE") {
            self.recognition_language = v;
        }
        if let Some(v) = var("APP__SYNTHESIS_LANGUAGE") {
            self.synthesis_language = v;
        }
        if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                self.request_timeout_secs = Some(parsed);
            }
        }
        if let Some(v) = var("APP__SPEECH_COMMAND") {
            self.speech_command = v;
        }
        if let Some(v) = var("APP__RECOGNITION_COMMAND") {
            self.set_recognition_command(v);
        }
        if let Some(v) = var("APP__SERIALIZE_QUERIES") {
            if let Ok(parsed) = v.trim().parse::<bool>() {
                self.serialize_queries = parsed;
            }
        }
    }
}

/// Defaults, then the config file (explicit path or `nutribot.toml` when
/// present), then environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        settings.apply_file(parse_file(&raw)?);
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

fn parse_file(raw: &str) -> anyhow::Result<FileSettings> {
    toml::from_str(raw).context("failed to parse config file")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
