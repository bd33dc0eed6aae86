use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ChatClient, SessionController, SessionHandle};
use shared::domain::parse_endpoint_port;
use speech::{
    testing::ScriptedRecognitionEngine, CommandRecognitionEngine, CommandSynthesizer,
    RecognitionEngine, UnsupportedRecognitionEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, CliOverrides};
use render::{parse_input, Input, HELP_TEXT, INFO_TEXT};

const REPLY_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "nutribot", about = "Terminal client for the Nutribot assistant")]
struct Args {
    /// Config file; defaults to ./nutribot.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<i64>,
    #[arg(long)]
    request_timeout_secs: Option<u64>,
    /// Keep one chat request in flight at a time.
    #[arg(long)]
    serialize_queries: bool,
    /// Start with speech output enabled.
    #[arg(long)]
    tts: bool,
    /// Make /listen "hear" this phrase instead of using a microphone.
    #[arg(long)]
    simulate_voice: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    settings.apply_overrides(CliOverrides {
        host: args.host,
        port: args.port,
        request_timeout_secs: args.request_timeout_secs,
        serialize_queries: args.serialize_queries,
    });

    let chat = match settings.request_timeout_secs {
        Some(secs) => ChatClient::with_timeout(Duration::from_secs(secs))
            .context("failed to build HTTP client")?,
        None => ChatClient::new(),
    };
    let command_engine = || {
        settings
            .recognition_command
            .as_deref()
            .and_then(CommandRecognitionEngine::from_command_line)
    };
    let recognition: Arc<dyn RecognitionEngine> = if let Some(phrase) = args.simulate_voice {
        Arc::new(ScriptedRecognitionEngine::recognizing(phrase).repeating())
    } else if let Some(engine) = command_engine() {
        Arc::new(engine)
    } else {
        Arc::new(UnsupportedRecognitionEngine)
    };
    let synthesizer = Arc::new(CommandSynthesizer::new(&settings.speech_command));

    let (controller, handle) = SessionController::new(
        settings.session_options(),
        Arc::new(chat),
        recognition,
        synthesizer,
    );
    let printer = tokio::spawn(render::print_events(
        handle.subscribe_events(),
        handle.snapshot().flags,
    ));
    let session = tokio::spawn(controller.run());

    if args.tts {
        handle.toggle_speech_output()?;
    }
    println!(
        "Nutribot → http://{}:{}/chat  (/help para ayuda)",
        settings.host, settings.port
    );

    let quit = read_commands(&handle).await?;
    if !quit {
        drain_replies(&handle).await;
    }

    drop(handle);
    session.await.context("session task failed")?;
    printer.await.context("render task failed")?;
    Ok(())
}

/// Returns `true` when the user asked to quit, `false` on end of input.
async fn read_commands(handle: &SessionHandle) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_input(&line) {
            Input::Quit => return Ok(true),
            Input::Help => println!("{HELP_TEXT}"),
            Input::Info => println!("{INFO_TEXT}"),
            Input::ToggleSpeech => handle.toggle_speech_output()?,
            Input::Port(Some(value)) => {
                if parse_endpoint_port(value).is_none() {
                    println!("Puerto inválido: {value} (1-65535)");
                }
                handle.set_endpoint_port(value)?;
            }
            Input::Port(None) => println!("Uso: /port <número>"),
            Input::Listen => handle.start_listening()?,
            Input::Query(text) => handle.submit_query(text)?,
        }
    }
    Ok(false)
}

/// Piped input ends before replies arrive; give them a bounded time to land.
async fn drain_replies(handle: &SessionHandle) {
    let mut snapshots = handle.watch_snapshot();
    if tokio::time::timeout(
        REPLY_DRAIN_TIMEOUT,
        snapshots.wait_for(render::replies_settled),
    )
    .await
    .is_err()
    {
        tracing::warn!("gave up waiting for pending replies");
    }
}
