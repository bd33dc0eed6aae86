//! Recognition lifecycle state machine.
//!
//! Every session follows `Idle -> Listening -> Settling -> Idle`:
//! - `start()` moves `Idle -> Listening` and yields `Started`
//! - the first `Result` or `Error` signal passes through `Settling` back to
//!   `Idle` and closes the session, yielding the outcome
//! - `End` without an outcome returns to `Idle` and yields `Ended`
//!
//! Once a session is closed, anything it still sends (a trailing `End`, a
//! duplicate outcome) is dropped as stale. Interim signals are dropped too.

use std::{fmt, sync::Arc};

use shared::{domain::RecognitionSessionId, error::RecognitionError, protocol::PlatformSignal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{RecognitionEngine, RecognitionOptions, SessionSignal, SignalSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionState {
    Idle,
    Listening,
    Settling,
}

impl fmt::Display for RecognitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionState::Idle => write!(f, "Idle"),
            RecognitionState::Listening => write!(f, "Listening"),
            RecognitionState::Settling => write!(f, "Settling"),
        }
    }
}

impl RecognitionState {
    pub fn can_transition_to(&self, target: &RecognitionState) -> bool {
        matches!(
            (self, target),
            (RecognitionState::Idle, RecognitionState::Listening)
                | (RecognitionState::Listening, RecognitionState::Settling)
                | (RecognitionState::Settling, RecognitionState::Idle)
                // platform abandoned the session without an outcome
                | (RecognitionState::Listening, RecognitionState::Idle)
        )
    }
}

/// Typed lifecycle event consumed by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Result(String),
    Error(RecognitionError),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A session is already running; the request was ignored.
    AlreadyActive,
}

pub struct RecognitionAdapter {
    engine: Arc<dyn RecognitionEngine>,
    options: RecognitionOptions,
    signals: mpsc::UnboundedSender<SessionSignal>,
    state: RecognitionState,
    active_session: Option<RecognitionSessionId>,
    next_session: u64,
}

impl RecognitionAdapter {
    pub fn new(
        engine: Arc<dyn RecognitionEngine>,
        options: RecognitionOptions,
        signals: mpsc::UnboundedSender<SessionSignal>,
    ) -> Self {
        Self {
            engine,
            options,
            signals,
            state: RecognitionState::Idle,
            active_session: None,
            next_session: 1,
        }
    }

    pub fn state(&self) -> RecognitionState {
        self.state
    }

    pub fn active_session(&self) -> Option<RecognitionSessionId> {
        self.active_session
    }

    pub fn start(&mut self) -> Result<StartOutcome, RecognitionError> {
        if self.state != RecognitionState::Idle {
            debug!(state = %self.state, "recognition already active; ignoring start");
            return Ok(StartOutcome::AlreadyActive);
        }

        let session = RecognitionSessionId(self.next_session);
        let sink = SignalSink::new(session, self.signals.clone());
        if let Err(err) = self.engine.start(&self.options, sink) {
            warn!(error = %err, "recognition engine refused to start");
            return Err(err);
        }

        self.next_session += 1;
        self.active_session = Some(session);
        self.transition(RecognitionState::Listening);
        info!(
            session = session.0,
            language = %self.options.language,
            "recognition started"
        );
        Ok(StartOutcome::Started)
    }

    /// Feeds one platform signal through the state machine, returning the
    /// lifecycle event it produces, if any.
    pub fn advance(&mut self, signal: SessionSignal) -> Option<RecognitionEvent> {
        if self.active_session != Some(signal.session) {
            debug!(session = signal.session.0, "dropping signal from inactive session");
            return None;
        }

        match (self.state, signal.signal) {
            (RecognitionState::Listening, PlatformSignal::Interim(partial)) => {
                debug!(partial = %partial, "ignoring interim result");
                None
            }
            (RecognitionState::Listening, PlatformSignal::Result(transcript)) => {
                self.settle();
                Some(RecognitionEvent::Result(transcript))
            }
            (RecognitionState::Listening, PlatformSignal::Error(code)) => {
                self.settle();
                let err = RecognitionError::from_code(&code);
                warn!(code = %code, "recognition failed");
                Some(RecognitionEvent::Error(err))
            }
            (RecognitionState::Listening, PlatformSignal::End) => {
                self.close_session();
                Some(RecognitionEvent::Ended)
            }
            (state, signal) => {
                debug!(state = %state, ?signal, "ignoring signal outside lifecycle");
                None
            }
        }
    }

    /// An outcome ends the session; the platform's trailing `End` is not
    /// awaited.
    fn settle(&mut self) {
        self.transition(RecognitionState::Settling);
        self.close_session();
    }

    fn close_session(&mut self) {
        self.transition(RecognitionState::Idle);
        self.active_session = None;
    }

    fn transition(&mut self, target: RecognitionState) {
        debug_assert!(self.state.can_transition_to(&target));
        debug!("recognition state: {} -> {}", self.state, target);
        self.state = target;
    }
}

#[cfg(test)]
#[path = "tests/recognition_tests.rs"]
mod tests;
