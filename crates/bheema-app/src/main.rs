//! Bheema application binary - composition root.
//!
//! Ties together all Bheema crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the event bus, workflow interpreter, and speech queue
//! 3. Wire the HTTP planner and synthesizer against the agent backend
//! 4. Run a line-based conversation loop on stdin
//!
//! The loop treats each line as one user submission. In `--voice` mode
//! replies are additionally synthesized and played, and the capture prompt
//! reopens after the assistant finishes speaking.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use bheema_core::config::BheemaConfig;
use bheema_core::{AssistantEvent, EventBus};
use bheema_providers::{build_client, HttpPlanner, HttpSynthesizer, ProcessPlayback, StubSpeaker};
use bheema_session::{Controller, Directive};
use bheema_speech::SpeechQueue;
use bheema_workflow::Interpreter;

#[derive(Parser, Debug)]
#[command(name = "bheema", about = "Voice-driven farming assistant", version)]
struct Cli {
    /// Path to the configuration file (defaults to ~/.bheema/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Conversation language code, overriding the configured one.
    #[arg(long)]
    language: Option<String>,

    /// Treat submissions as voice input: speak replies aloud and reopen
    /// the prompt after the assistant finishes talking.
    #[arg(long)]
    voice: bool,
}

/// Resolve the config file path (BHEEMA_CONFIG env, or ~/.bheema/config.toml).
fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("BHEEMA_CONFIG") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".bheema").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config first: its log_level seeds the tracing default.
    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let mut config = BheemaConfig::load_or_default(&config_file);
    if let Some(language) = &cli.language {
        config.general.language = language.clone();
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Bheema v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Event bus shared by every component.
    let bus = Arc::new(EventBus::new());

    // Workflow interpreter.
    let interpreter = Arc::new(Interpreter::new(Arc::clone(&bus)));

    // Speech pipeline: HTTP synthesis, external player, logging fallback.
    let client = build_client(config.speech.synthesis_timeout_secs.max(30) * 2);
    let speech = Arc::new(SpeechQueue::new(
        Arc::clone(&bus),
        Arc::new(HttpSynthesizer::new(
            client.clone(),
            &config.providers.api_base_url,
        )),
        Arc::new(ProcessPlayback::new(&config.speech.player_command)),
        Arc::new(StubSpeaker),
        Duration::from_secs(config.speech.synthesis_timeout_secs),
    ));
    speech.attach();
    tracing::info!(
        backend = %config.providers.api_base_url,
        player = %config.speech.player_command,
        "Speech pipeline ready"
    );

    // Conversation controller over the HTTP planner.
    let planner = Arc::new(HttpPlanner::new(client, &config.providers.api_base_url));
    let controller = Arc::new(Controller::new(
        Arc::clone(&bus),
        planner,
        interpreter,
        speech,
        &config,
    ));
    controller.attach();

    // Bot messages from workflows arrive over the bus; print them the way
    // the chat pane would show them.
    bus.subscribe("workflow-message", |event| {
        if let AssistantEvent::WorkflowMessage { message } = event {
            println!("bheema> {}", message.content);
        }
        Ok(())
    });

    // Deliver speech completion to the controller off the bus thread.
    let (ended_tx, mut ended_rx) = mpsc::unbounded_channel();
    bus.subscribe("speech-ended", move |_| {
        let _ = ended_tx.send(());
        Ok(())
    });
    let speech_controller = Arc::clone(&controller);
    tokio::spawn(async move {
        while ended_rx.recv().await.is_some() {
            if speech_controller.handle_speech_ended() == Directive::ReopenCapture {
                speech_controller.capture_opened();
                println!("(listening)");
            }
        }
    });

    // UI-binding events have no frontend here; trace them so a session is
    // observable end to end.
    for name in ["navigate", "autofill-field", "click-element", "check-status"] {
        bus.subscribe(name, |event| {
            tracing::info!(event = ?event, "UI event");
            Ok(())
        });
    }

    println!(
        "Bheema ready ({} mode). Type a request, /lang <code>, /cancel, or /quit.",
        if cli.voice { "voice" } else { "text" }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/cancel" => {
                controller.cancel().await;
                println!("(cancelled)");
            }
            _ if line.starts_with("/lang ") => {
                let code = line.trim_start_matches("/lang ").trim();
                controller.set_language(code);
                println!("(language set to {})", code);
            }
            _ => {
                if cli.voice {
                    controller.capture_opened();
                }
                if let Some(reply) = controller.handle_submission(line, cli.voice).await {
                    println!("bheema> {}", reply.content);
                    for suggestion in &reply.suggestions {
                        println!("        - {}", suggestion);
                    }
                }
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
