//! Terminal projection of session state. Nothing here mutates the session.

use chrono::Local;
use client_core::{classify, FormattedMessage, MenuSegment, SessionEvent, SessionSnapshot};
use shared::domain::{Message, Sender, SessionFlags};
use tokio::sync::broadcast::{self, error::RecvError};

pub const HELP_TEXT: &str = "\
Instrucciones de uso
  Enviando texto: escribe tu mensaje y presiona Enter para enviar.
  Usando el micrófono: escribe /listen y habla para que se transcriba tu mensaje.
  Lectura en voz alta: escribe /tts para que Nutribot lea las respuestas.
Comandos: /tts  /port <número>  /listen  /help  /info  /quit";

pub const INFO_TEXT: &str = "\
Información
  Nutribot: asistente de nutrición conversacional.
  Este programa está bajo MIT License.";

const RULE: &str = "  ────────────────";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Query(String),
    ToggleSpeech,
    Port(Option<i64>),
    Listen,
    Help,
    Info,
    Quit,
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Query(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "tts" => Input::ToggleSpeech,
        "port" => Input::Port(parts.next().and_then(|v| v.parse().ok())),
        "listen" => Input::Listen,
        "help" => Input::Help,
        "info" => Input::Info,
        "quit" | "exit" => Input::Quit,
        _ => Input::Query(line.to_string()),
    }
}

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "Usuario",
        Sender::Bot => "Nutribot",
    }
}

pub fn render_body(text: &str) -> String {
    match classify(text) {
        FormattedMessage::PlainText(text) => text,
        FormattedMessage::Menu(segments) => segments
            .iter()
            .map(|segment| match segment {
                MenuSegment::Title(title) => format!("\n  {}", title.to_uppercase()),
                MenuSegment::Separator => RULE.to_string(),
                MenuSegment::Item(item) => format!("    - {item}"),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn render_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.sent_at.with_timezone(&Local).format("%H:%M"),
        sender_label(message.sender),
        render_body(&message.text)
    )
}

/// Status lines describing what changed between two flag sets.
pub fn describe_flag_changes(prev: &SessionFlags, next: &SessionFlags) -> Vec<String> {
    let mut lines = Vec::new();
    if next.listening && !prev.listening {
        lines.push("🎤 Escuchando...".to_string());
    }
    if next.synthesis_enabled != prev.synthesis_enabled {
        lines.push(if next.synthesis_enabled {
            "🔊 TTS activado".to_string()
        } else {
            "🔈 TTS desactivado".to_string()
        });
    }
    if next.endpoint_port != prev.endpoint_port {
        lines.push(format!("Puerto: {}", next.endpoint_port));
    }
    if let Some(err) = &next.last_error {
        if prev.last_error.as_ref() != Some(err) {
            lines.push(format!("⚠ {err}"));
        }
    }
    lines
}

/// True once every user message has its reply.
pub fn replies_settled(snapshot: &SessionSnapshot) -> bool {
    let (users, bots) = snapshot
        .transcript
        .iter()
        .fold((0usize, 0usize), |(users, bots), message| match message.sender {
            Sender::User => (users + 1, bots),
            Sender::Bot => (users, bots + 1),
        });
    bots >= users
}

pub async fn print_events(mut events: broadcast::Receiver<SessionEvent>, initial: SessionFlags) {
    let mut flags = initial;
    loop {
        match events.recv().await {
            Ok(SessionEvent::MessageAppended(message)) => println!("{}", render_message(&message)),
            Ok(SessionEvent::FlagsChanged(next)) => {
                for line in describe_flag_changes(&flags, &next) {
                    println!("{line}");
                }
                flags = next;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "render layer fell behind session events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
