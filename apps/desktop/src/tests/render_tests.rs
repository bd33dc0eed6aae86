use super::*;
use chrono::Utc;
use shared::domain::Sequence;

fn message(sequence: u64, sender: Sender, text: &str) -> Message {
    Message {
        sequence: Sequence(sequence),
        sender,
        text: text.to_string(),
        sent_at: Utc::now(),
    }
}

#[test]
fn parses_commands_and_queries() {
    assert_eq!(parse_input("/tts"), Input::ToggleSpeech);
    assert_eq!(parse_input("  /port 9090 "), Input::Port(Some(9090)));
    assert_eq!(parse_input("/port nueve"), Input::Port(None));
    assert_eq!(parse_input("/listen"), Input::Listen);
    assert_eq!(parse_input("/quit"), Input::Quit);
    assert_eq!(
        parse_input("qué ceno hoy"),
        Input::Query("qué ceno hoy".to_string())
    );
    assert_eq!(
        parse_input("/2 tazas de arroz"),
        Input::Query("/2 tazas de arroz".to_string())
    );
}

#[test]
fn menu_replies_render_as_sections() {
    let body = render_body("Desayuno, pan, ****************, Almuerzo, arroz");
    assert_eq!(
        body,
        "\n  DESAYUNO\n    - pan\n  ────────────────\n\n  ALMUERZO\n    - arroz"
    );
}

#[test]
fn plain_replies_render_verbatim() {
    assert_eq!(render_body("Hola, ¿cómo estás?"), "Hola, ¿cómo estás?");
}

#[test]
fn message_lines_carry_sender_label() {
    let line = render_message(&message(0, Sender::User, "hola"));
    assert!(line.ends_with("Usuario: hola"), "unexpected line: {line}");

    let line = render_message(&message(1, Sender::Bot, "buenas"));
    assert!(line.ends_with("Nutribot: buenas"), "unexpected line: {line}");
}

#[test]
fn flag_changes_are_described_once() {
    let prev = SessionFlags::default();
    let next = SessionFlags {
        listening: true,
        synthesis_enabled: true,
        last_error: Some("No se detectó micrófono.".to_string()),
        endpoint_port: 9090,
    };

    let lines = describe_flag_changes(&prev, &next);
    assert_eq!(
        lines,
        vec![
            "🎤 Escuchando...".to_string(),
            "🔊 TTS activado".to_string(),
            "Puerto: 9090".to_string(),
            "⚠ No se detectó micrófono.".to_string(),
        ]
    );
    assert!(describe_flag_changes(&next, &next).is_empty());
}

#[test]
fn replies_settle_when_every_query_is_answered() {
    let mut snapshot = SessionSnapshot::default();
    assert!(replies_settled(&snapshot));

    snapshot.transcript.push(message(0, Sender::User, "hola"));
    assert!(!replies_settled(&snapshot));

    snapshot.transcript.push(message(1, Sender::Bot, "buenas"));
    assert!(replies_settled(&snapshot));
}
