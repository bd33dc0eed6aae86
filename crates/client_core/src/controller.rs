//! Session controller: the single writer of the transcript and session flags.
//!
//! The controller runs as one actor selecting over three inputs: commands
//! from [`SessionHandle`]s, completions of spawned chat requests, and signals
//! from the recognition engine. Each input is applied to completion before
//! the next is taken, so appends never interleave.

use std::{collections::VecDeque, sync::Arc};

use shared::{
    domain::{
        parse_endpoint_port, Endpoint, Message, QueryTicket, Sender, SessionFlags,
        DEFAULT_ENDPOINT_PORT,
    },
    error::ChatError,
    protocol::ChatReply,
};
use speech::{
    RecognitionAdapter, RecognitionEngine, RecognitionEvent, RecognitionOptions, SessionSignal,
    Speaker, SpeechSynthesizer, StartOutcome, DEFAULT_SYNTHESIS_LANGUAGE,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::{chat_client::ChatBackend, transcript::Transcript};

pub const DEFAULT_HOST: &str = "localhost";

/// How overlapping submissions reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPolicy {
    /// Every submission is sent immediately; replies are appended in arrival
    /// order.
    #[default]
    Concurrent,
    /// At most one request in flight; later submissions wait their turn and
    /// replies follow invocation order.
    Serialized,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    pub recognition: RecognitionOptions,
    pub synthesis_language: String,
    pub submission_policy: SubmissionPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_ENDPOINT_PORT,
            recognition: RecognitionOptions::default(),
            synthesis_language: DEFAULT_SYNTHESIS_LANGUAGE.to_string(),
            submission_policy: SubmissionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SubmitQuery(String),
    ToggleSpeechOutput,
    SetEndpointPort(i64),
    StartListening,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MessageAppended(Message),
    FlagsChanged(SessionFlags),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub transcript: Vec<Message>,
    pub flags: SessionFlags,
}

#[derive(Debug, Error)]
#[error("session controller has stopped")]
pub struct SessionClosed;

struct ChatSettled {
    ticket: QueryTicket,
    outcome: Result<ChatReply, ChatError>,
}

/// Cloneable entry point used by render layers.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn submit_query(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.dispatch(SessionCommand::SubmitQuery(text.into()))
    }

    pub fn toggle_speech_output(&self) -> Result<(), SessionClosed> {
        self.dispatch(SessionCommand::ToggleSpeechOutput)
    }

    pub fn set_endpoint_port(&self, value: i64) -> Result<(), SessionClosed> {
        self.dispatch(SessionCommand::SetEndpointPort(value))
    }

    pub fn start_listening(&self) -> Result<(), SessionClosed> {
        self.dispatch(SessionCommand::StartListening)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    fn dispatch(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }
}

pub struct SessionController {
    host: String,
    policy: SubmissionPolicy,
    transcript: Transcript,
    flags: SessionFlags,
    chat: Arc<dyn ChatBackend>,
    recognizer: RecognitionAdapter,
    speaker: Speaker,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    signals: mpsc::UnboundedReceiver<SessionSignal>,
    completions_tx: mpsc::UnboundedSender<ChatSettled>,
    completions: mpsc::UnboundedReceiver<ChatSettled>,
    events: broadcast::Sender<SessionEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
    next_ticket: u64,
    in_flight: usize,
    waiting: VecDeque<(QueryTicket, String)>,
}

impl SessionController {
    pub fn new(
        options: SessionOptions,
        chat: Arc<dyn ChatBackend>,
        recognition_engine: Arc<dyn RecognitionEngine>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> (Self, SessionHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (signals_tx, signals) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(1024);

        let flags = SessionFlags {
            endpoint_port: options.port,
            ..SessionFlags::default()
        };
        let (snapshot, snapshot_rx) = watch::channel(SessionSnapshot {
            transcript: Vec::new(),
            flags: flags.clone(),
        });

        let controller = Self {
            host: options.host,
            policy: options.submission_policy,
            transcript: Transcript::new(),
            flags,
            chat,
            recognizer: RecognitionAdapter::new(
                recognition_engine,
                options.recognition,
                signals_tx,
            ),
            speaker: Speaker::new(synthesizer, options.synthesis_language),
            commands,
            signals,
            completions_tx,
            completions,
            events: events.clone(),
            snapshot,
            next_ticket: 1,
            in_flight: 0,
            waiting: VecDeque::new(),
        };
        let handle = SessionHandle {
            commands: commands_tx,
            events,
            snapshot: snapshot_rx,
        };
        (controller, handle)
    }

    pub fn transcript(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    /// Processes inputs until every [`SessionHandle`] is dropped. Requests
    /// still in flight at that point are abandoned.
    pub async fn run(mut self) {
        info!(host = %self.host, port = self.flags.endpoint_port, "session started");
        while self.process_next().await {}
        info!("session ended");
    }

    /// Waits for the next input from any source and applies it. Returns
    /// `false` once the command queue is closed.
    pub async fn process_next(&mut self) -> bool {
        tokio::select! {
            biased;
            command = self.commands.recv() => match command {
                Some(command) => {
                    self.apply(command);
                    true
                }
                None => false,
            },
            Some(signal) = self.signals.recv() => {
                self.on_platform_signal(signal);
                true
            }
            Some(settled) = self.completions.recv() => {
                self.on_chat_settled(settled);
                true
            }
        }
    }

    pub fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SubmitQuery(text) => self.submit_query(&text),
            SessionCommand::ToggleSpeechOutput => {
                self.flags.synthesis_enabled = !self.flags.synthesis_enabled;
                info!(enabled = self.flags.synthesis_enabled, "speech output toggled");
                self.publish_flags();
            }
            SessionCommand::SetEndpointPort(value) => match parse_endpoint_port(value) {
                Some(port) => {
                    self.flags.endpoint_port = port;
                    info!(port, "endpoint port updated");
                    self.publish_flags();
                }
                None => debug!(value, "ignoring out-of-range endpoint port"),
            },
            SessionCommand::StartListening => self.start_listening(),
        }
    }

    fn submit_query(&mut self, text: &str) {
        let query = text.trim();
        if query.is_empty() {
            debug!("ignoring empty query");
            return;
        }

        self.append(Sender::User, query.to_string());

        let ticket = QueryTicket(self.next_ticket);
        self.next_ticket += 1;

        if self.policy == SubmissionPolicy::Serialized && self.in_flight > 0 {
            debug!(ticket = ticket.0, "query waiting for in-flight request");
            self.waiting.push_back((ticket, query.to_string()));
            return;
        }
        self.dispatch_query(ticket, query.to_string());
    }

    fn dispatch_query(&mut self, ticket: QueryTicket, query: String) {
        let endpoint = Endpoint::new(self.host.clone(), self.flags.endpoint_port);
        let chat = Arc::clone(&self.chat);
        let completions = self.completions_tx.clone();

        self.in_flight += 1;
        debug!(ticket = ticket.0, port = endpoint.port, "dispatching chat query");

        tokio::spawn(async move {
            let outcome = chat.send(&endpoint, &query).await;
            let _ = completions.send(ChatSettled { ticket, outcome });
        });
    }

    fn on_chat_settled(&mut self, settled: ChatSettled) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let text = match settled.outcome {
            Ok(reply) => {
                info!(ticket = settled.ticket.0, "chat reply received");
                reply.response
            }
            Err(err) => {
                warn!(ticket = settled.ticket.0, error = %err, "chat query failed");
                err.user_message().to_string()
            }
        };

        self.append(Sender::Bot, text.clone());
        if self.flags.synthesis_enabled {
            self.speaker.speak(&text);
        }

        if self.in_flight == 0 {
            if let Some((ticket, query)) = self.waiting.pop_front() {
                self.dispatch_query(ticket, query);
            }
        }
    }

    fn start_listening(&mut self) {
        match self.recognizer.start() {
            Ok(StartOutcome::Started) => self.on_recognition_event(RecognitionEvent::Started),
            Ok(StartOutcome::AlreadyActive) => {}
            Err(err) => {
                self.flags.listening = false;
                self.flags.last_error = Some(err.user_message());
                self.publish_flags();
            }
        }
    }

    fn on_platform_signal(&mut self, signal: SessionSignal) {
        if let Some(event) = self.recognizer.advance(signal) {
            self.on_recognition_event(event);
        }
    }

    fn on_recognition_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Started => {
                self.flags.listening = true;
                self.flags.last_error = None;
                self.publish_flags();
            }
            RecognitionEvent::Result(transcript) => {
                self.flags.listening = false;
                self.flags.last_error = None;
                self.publish_flags();
                self.submit_query(&transcript);
            }
            RecognitionEvent::Error(err) => {
                self.flags.listening = false;
                self.flags.last_error = Some(err.user_message());
                self.publish_flags();
            }
            RecognitionEvent::Ended => {
                if self.flags.listening {
                    self.flags.listening = false;
                    self.publish_flags();
                }
            }
        }
    }

    fn append(&mut self, sender: Sender, text: String) {
        let message = self.transcript.append(sender, text).clone();
        debug!(sequence = message.sequence.0, ?sender, "message appended");
        self.snapshot
            .send_modify(|snapshot| snapshot.transcript.push(message.clone()));
        let _ = self.events.send(SessionEvent::MessageAppended(message));
    }

    fn publish_flags(&self) {
        let flags = self.flags.clone();
        self.snapshot
            .send_modify(|snapshot| snapshot.flags = flags.clone());
        let _ = self.events.send(SessionEvent::FlagsChanged(flags));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
