//! Speech recognition through an external capture-and-transcribe command.
//!
//! The command runs once per session with `--language <tag>` appended. It
//! prints what it heard on stdout, one hypothesis per line with the final
//! transcript last. Failures exit non-zero with a platform error code such as
//! `no-speech`, `audio-capture` or `not-allowed` as the last stderr line.

use std::{iter, path::PathBuf, process::Stdio};

use shared::{error::RecognitionError, protocol::PlatformSignal};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{resolve_program, RecognitionEngine, RecognitionOptions, SignalSink};

pub struct CommandRecognitionEngine {
    program: PathBuf,
    args: Vec<String>,
    available: bool,
}

impl CommandRecognitionEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let available = resolve_program(&program).is_some();
        if !available {
            warn!(
                program = %program.display(),
                "recognition command not found; voice input disabled"
            );
        }
        Self {
            program,
            args: Vec::new(),
            available,
        }
    }

    /// Splits a command line such as `whisper-listen --model small` on
    /// whitespace. Returns `None` for a blank line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).with_args(parts))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl RecognitionEngine for CommandRecognitionEngine {
    fn start(
        &self,
        options: &RecognitionOptions,
        sink: SignalSink,
    ) -> Result<(), RecognitionError> {
        if !self.available {
            return Err(RecognitionError::Unsupported);
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available for recognition command");
            return Err(RecognitionError::Unsupported);
        };

        let program = self.program.display().to_string();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg("--language")
            .arg(&options.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                warn!(program = %program, "failed to start recognition command: {err}");
                RecognitionError::Other(err.to_string())
            })?;
        debug!(session = sink.session().0, program = %program, "recognition command started");

        runtime.spawn(async move {
            let signals = match child.wait_with_output().await {
                Ok(output) => signals_for(
                    output.status.success(),
                    output.status.code(),
                    &String::from_utf8_lossy(&output.stdout),
                    &String::from_utf8_lossy(&output.stderr),
                ),
                Err(err) => {
                    warn!(program = %program, "recognition command failed: {err}");
                    vec![PlatformSignal::Error(err.to_string())]
                }
            };
            for signal in signals.into_iter().chain(iter::once(PlatformSignal::End)) {
                if !sink.emit(signal) {
                    break;
                }
            }
        });
        Ok(())
    }
}

/// Maps a finished command to the outcome signals of its session. The
/// trailing `End` is added by the caller.
fn signals_for(
    success: bool,
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Vec<PlatformSignal> {
    if !success {
        let code = non_empty_lines(stderr)
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| match exit_code {
                Some(code) => format!("exit-{code}"),
                None => "terminated".to_string(),
            });
        return vec![PlatformSignal::Error(code)];
    }

    let lines: Vec<&str> = non_empty_lines(stdout).collect();
    match lines.split_last() {
        Some((transcript, partials)) => partials
            .iter()
            .map(|partial| PlatformSignal::Interim(partial.to_string()))
            .chain(iter::once(PlatformSignal::Result(transcript.to_string())))
            .collect(),
        None => vec![PlatformSignal::Error("no-speech".to_string())],
    }
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

#[cfg(test)]
#[path = "tests/capture_tests.rs"]
mod tests;
