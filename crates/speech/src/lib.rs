//! Platform speech capabilities behind injectable traits.

use std::path::{Path, PathBuf};

use shared::{
    domain::RecognitionSessionId, error::RecognitionError, protocol::PlatformSignal,
};
use tokio::sync::mpsc;

pub mod capture;
pub mod recognition;
pub mod synthesis;
pub mod testing;

pub use capture::CommandRecognitionEngine;
pub use recognition::{RecognitionAdapter, RecognitionEvent, RecognitionState, StartOutcome};
pub use synthesis::{
    strip_formatting, CommandSynthesizer, MissingSpeechSynthesizer, Speaker, SpeechSynthesizer,
    Utterance,
};

pub const DEFAULT_RECOGNITION_LANGUAGE: &str = "es-ES";
pub const DEFAULT_SYNTHESIS_LANGUAGE: &str = "es-CR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub language: String,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_RECOGNITION_LANGUAGE.to_string(),
        }
    }
}

/// A platform signal tagged with the recognition session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSignal {
    pub session: RecognitionSessionId,
    pub signal: PlatformSignal,
}

/// Handle given to an engine for one recognition session.
#[derive(Debug, Clone)]
pub struct SignalSink {
    session: RecognitionSessionId,
    tx: mpsc::UnboundedSender<SessionSignal>,
}

impl SignalSink {
    pub fn new(session: RecognitionSessionId, tx: mpsc::UnboundedSender<SessionSignal>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> RecognitionSessionId {
        self.session
    }

    /// Returns `false` once the consumer is gone.
    pub fn emit(&self, signal: PlatformSignal) -> bool {
        self.tx
            .send(SessionSignal {
                session: self.session,
                signal,
            })
            .is_ok()
    }
}

pub trait RecognitionEngine: Send + Sync {
    /// Begins one recognition session. Signals for the session are delivered
    /// through `sink`; a synchronous error means the session never started.
    fn start(&self, options: &RecognitionOptions, sink: SignalSink)
        -> Result<(), RecognitionError>;
}

/// Engine used when the platform offers no speech recognition at all.
pub struct UnsupportedRecognitionEngine;

impl RecognitionEngine for UnsupportedRecognitionEngine {
    fn start(
        &self,
        _options: &RecognitionOptions,
        _sink: SignalSink,
    ) -> Result<(), RecognitionError> {
        Err(RecognitionError::Unsupported)
    }
}

/// Looks `program` up on `PATH` unless it already names a path.
pub(crate) fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
