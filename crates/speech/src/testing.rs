//! Deterministic stand-ins for platform speech capabilities.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use shared::{error::RecognitionError, protocol::PlatformSignal};

use crate::{RecognitionEngine, RecognitionOptions, SignalSink, SpeechSynthesizer, Utterance};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Replays scripted signal sequences, one script per started session.
///
/// A session with no script stays open; drive it with [`Self::emit`].
#[derive(Default)]
pub struct ScriptedRecognitionEngine {
    scripts: Mutex<VecDeque<Vec<PlatformSignal>>>,
    repeat_last: bool,
    refuse_with: Option<RecognitionError>,
    current: Mutex<Option<SignalSink>>,
    starts: Mutex<Vec<RecognitionOptions>>,
}

impl ScriptedRecognitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        Self::refusing(RecognitionError::Unsupported)
    }

    pub fn refusing(err: RecognitionError) -> Self {
        Self {
            refuse_with: Some(err),
            ..Self::default()
        }
    }

    /// A session that hears `transcript` and ends normally.
    pub fn recognizing(transcript: impl Into<String>) -> Self {
        Self::new().with_session(vec![
            PlatformSignal::Result(transcript.into()),
            PlatformSignal::End,
        ])
    }

    pub fn failing(code: impl Into<String>) -> Self {
        Self::new().with_session(vec![PlatformSignal::Error(code.into()), PlatformSignal::End])
    }

    pub fn with_session(self, signals: Vec<PlatformSignal>) -> Self {
        lock(&self.scripts).push_back(signals);
        self
    }

    /// Keeps replaying the final script once the queue is exhausted.
    pub fn repeating(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    /// Pushes a signal into the most recently started session.
    pub fn emit(&self, signal: PlatformSignal) -> bool {
        lock(&self.current)
            .as_ref()
            .is_some_and(|sink| sink.emit(signal))
    }

    pub fn starts(&self) -> Vec<RecognitionOptions> {
        lock(&self.starts).clone()
    }
}

impl RecognitionEngine for ScriptedRecognitionEngine {
    fn start(
        &self,
        options: &RecognitionOptions,
        sink: SignalSink,
    ) -> Result<(), RecognitionError> {
        if let Some(err) = &self.refuse_with {
            return Err(err.clone());
        }
        lock(&self.starts).push(options.clone());

        let script = {
            let mut scripts = lock(&self.scripts);
            if self.repeat_last && scripts.len() == 1 {
                scripts.front().cloned()
            } else {
                scripts.pop_front()
            }
        };
        for signal in script.unwrap_or_default() {
            sink.emit(signal);
        }
        *lock(&self.current) = Some(sink);
        Ok(())
    }
}

/// Records every utterance instead of vocalizing it.
pub struct RecordingSynthesizer {
    available: bool,
    spoken: Mutex<Vec<Utterance>>,
}

impl Default for RecordingSynthesizer {
    fn default() -> Self {
        Self {
            available: true,
            spoken: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingSynthesizer {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        lock(&self.spoken).clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        lock(&self.spoken)
            .iter()
            .map(|utterance| utterance.text.clone())
            .collect()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn speak(&self, utterance: Utterance) {
        lock(&self.spoken).push(utterance);
    }
}
