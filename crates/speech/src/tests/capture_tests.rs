use std::time::Duration;

use super::*;
use shared::domain::RecognitionSessionId;
use tokio::sync::mpsc;

use crate::SessionSignal;

async fn run_session(engine: &CommandRecognitionEngine, language: &str) -> Vec<PlatformSignal> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = RecognitionOptions {
        language: language.to_string(),
    };
    engine
        .start(&options, SignalSink::new(RecognitionSessionId(7), tx))
        .expect("start");

    let mut signals = Vec::new();
    loop {
        let SessionSignal { session, signal } =
            tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("recognition command timed out")
                .expect("signal channel closed");
        assert_eq!(session, RecognitionSessionId(7));
        let done = signal == PlatformSignal::End;
        signals.push(signal);
        if done {
            return signals;
        }
    }
}

#[test]
fn last_stdout_line_is_the_transcript() {
    assert_eq!(
        signals_for(true, Some(0), "qué\n\nqué hay de cena\n", ""),
        vec![
            PlatformSignal::Interim("qué".to_string()),
            PlatformSignal::Result("qué hay de cena".to_string()),
        ]
    );
}

#[test]
fn silent_success_means_no_speech() {
    assert_eq!(
        signals_for(true, Some(0), "  \n", ""),
        vec![PlatformSignal::Error("no-speech".to_string())]
    );
}

#[test]
fn failure_reports_last_stderr_line_or_exit_code() {
    assert_eq!(
        signals_for(false, Some(1), "", "opening device\naudio-capture\n"),
        vec![PlatformSignal::Error("audio-capture".to_string())]
    );
    assert_eq!(
        signals_for(false, Some(3), "parcial", ""),
        vec![PlatformSignal::Error("exit-3".to_string())]
    );
    assert_eq!(
        signals_for(false, None, "", ""),
        vec![PlatformSignal::Error("terminated".to_string())]
    );
}

#[test]
fn command_line_is_split_on_whitespace() {
    let engine = CommandRecognitionEngine::from_command_line("  sh  -c  true ").expect("engine");
    assert_eq!(engine.program, PathBuf::from("sh"));
    assert_eq!(engine.args, vec!["-c".to_string(), "true".to_string()]);
    assert!(CommandRecognitionEngine::from_command_line("   ").is_none());
}

#[test]
fn missing_command_is_unsupported() {
    let engine = CommandRecognitionEngine::new("definitely-not-a-listen-command-xyz");
    assert!(!engine.is_available());

    let (tx, _rx) = mpsc::unbounded_channel();
    let result = engine.start(
        &RecognitionOptions::default(),
        SignalSink::new(RecognitionSessionId(1), tx),
    );
    assert_eq!(result, Err(RecognitionError::Unsupported));
}

#[tokio::test]
async fn command_output_becomes_result_then_end() {
    // `sh -c` binds the appended `--language <tag>` to $0 and $1.
    let engine = CommandRecognitionEngine::new("sh").with_args(["-c", "echo \"menú en $1\""]);

    assert_eq!(
        run_session(&engine, "es-ES").await,
        vec![
            PlatformSignal::Result("menú en es-ES".to_string()),
            PlatformSignal::End,
        ]
    );
}

#[tokio::test]
async fn failing_command_becomes_error_then_end() {
    let engine =
        CommandRecognitionEngine::new("sh").with_args(["-c", "echo not-allowed >&2; exit 1"]);

    assert_eq!(
        run_session(&engine, "es-ES").await,
        vec![
            PlatformSignal::Error("not-allowed".to_string()),
            PlatformSignal::End,
        ]
    );
}
