use std::{path::PathBuf, process::Stdio, sync::Arc};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::resolve_program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
}

/// Fire-and-forget speech output. Overlapping utterances follow whatever
/// queueing or interruption policy the platform applies.
pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, utterance: Utterance);
}

pub struct MissingSpeechSynthesizer;

impl SpeechSynthesizer for MissingSpeechSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _utterance: Utterance) {}
}

/// Removes characters that only carry structure: emphasis markers and the
/// asterisk runs used as menu separators.
pub fn strip_formatting(text: &str) -> String {
    text.chars().filter(|c| *c != '*').collect()
}

/// Speech front for the controller: cleans text, applies the configured
/// locale and drops utterances when no synthesizer is available.
#[derive(Clone)]
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    language: String,
}

impl Speaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, language: impl Into<String>) -> Self {
        Self {
            synthesizer,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn speak(&self, text: &str) {
        let cleaned = strip_formatting(text);
        if cleaned.trim().is_empty() {
            return;
        }
        if !self.synthesizer.is_available() {
            debug!("speech synthesis unavailable; dropping utterance");
            return;
        }
        self.synthesizer.speak(Utterance {
            text: cleaned,
            language: self.language.clone(),
        });
    }
}

/// Speaks through an external command such as `espeak-ng -v es "..."`.
pub struct CommandSynthesizer {
    program: PathBuf,
    available: bool,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let available = resolve_program(&program).is_some();
        if !available {
            warn!(
                program = %program.display(),
                "speech command not found; speech output disabled"
            );
        }
        Self { program, available }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn speak(&self, utterance: Utterance) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available for speech command");
            return;
        };

        let mut command = Command::new(&self.program);
        command
            .args(speech_args(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let program = self.program.display().to_string();

        runtime.spawn(async move {
            match command.status().await {
                Ok(status) if !status.success() => {
                    warn!(program = %program, %status, "speech command exited with failure");
                }
                Ok(_) => {}
                Err(err) => warn!(program = %program, "failed to run speech command: {err}"),
            }
        });
    }
}

/// `--` keeps replies such as "-5% grasa" from being read as options.
fn speech_args(utterance: &Utterance) -> [String; 4] {
    [
        "-v".to_string(),
        voice_for(&utterance.language),
        "--".to_string(),
        utterance.text.clone(),
    ]
}

/// espeak-style voices are keyed by primary language subtag.
fn voice_for(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase()
}
