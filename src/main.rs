//! NPC dialogue - console conversations with state-driven characters
//!
//! A character moves through a fixed set of narrative states while a local
//! text-generation service voices it.

mod character;
mod config;
mod console;
mod dialogue;
mod llm;

use config::AppConfig;
use console::Console;
use dialogue::{ControllerSettings, DialogueController};
use llm::{GenerationClient, LoggingClient, OllamaClient};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the conversation
    let (json_layer, plain_layer) = if AppConfig::log_json_from_env() {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "npc_dialogue=warn".into()),
        )
        .with(json_layer)
        .with(plain_layer)
        .init();

    let config = AppConfig::from_env();
    let character = config.load_character()?;
    tracing::info!(
        character = %character.name(),
        mode = ?character.mode(),
        model = %config.model,
        base_url = %config.base_url,
        policy = %config.state_policy,
        log_json = config.log_json,
        "Starting dialogue"
    );

    let ollama: Arc<dyn GenerationClient> = Arc::new(OllamaClient::new(&config.base_url)?);
    let client: Arc<dyn GenerationClient> = Arc::new(LoggingClient::new(ollama));
    let settings =
        ControllerSettings::new(config.model.clone()).with_unresolved_policy(config.state_policy);
    let controller = Arc::new(DialogueController::new(character, client, settings));

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    Console::new(
        controller,
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        shutdown,
    )
    .with_idle_timeout(config.idle_timeout)
    .with_max_auto_turns(config.max_auto_turns)
    .run()
    .await?;

    Ok(())
}
