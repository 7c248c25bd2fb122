//! `previsit-screening <call-script.json>`
//!
//! Replays a call script through the screening engine and stores the
//! resulting report. Uses Gemini for extraction and phrasing when an API key
//! is configured, and the script's pre-extracted fields otherwise.

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use previsit_screening::adapters::ai::GeminiProvider;
use previsit_screening::adapters::channel::CallScript;
use previsit_screening::adapters::reasoning::{LlmReasoningEngine, ScriptedReasoningEngine};
use previsit_screening::adapters::storage::LocalReportStorage;
use previsit_screening::application::{RunScreeningCallCommand, RunScreeningCallHandler};
use previsit_screening::config::{AppConfig, LogFormat, TelemetryConfig};
use previsit_screening::domain::foundation::SessionId;
use previsit_screening::domain::screening::CallEndReason;
use previsit_screening::ports::ReasoningEngine;

const USAGE: &str = "usage: previsit-screening <call-script.json>";

#[tokio::main]
async fn main() -> ExitCode {
    let Some(script_path) = std::env::args().nth(1) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(&script_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Screening call failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(script_path: &str) -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.telemetry)?;

    let script = CallScript::parse(&tokio::fs::read_to_string(script_path).await?)?;
    let session_id = SessionId::new();

    let reasoning: Arc<dyn ReasoningEngine> = match config.ai.gemini() {
        Some(gemini) => {
            tracing::info!(model = %gemini.model, "Using Gemini reasoning");
            let temperature = gemini.temperature;
            let provider = Arc::new(GeminiProvider::new(gemini)?);
            Arc::new(LlmReasoningEngine::new(provider, session_id).with_temperature(temperature))
        }
        None => {
            tracing::info!(
                utterances = script.utterance_count(),
                "No Gemini key configured, replaying scripted extractions"
            );
            Arc::new(ScriptedReasoningEngine::new(script.turn_inputs().to_vec()))
        }
    };

    let storage = Arc::new(LocalReportStorage::new(config.reports.path()));
    let policy = Arc::new(config.interview.to_policy()?);

    let mut handler =
        RunScreeningCallHandler::new(reasoning, Arc::new(script.channel()), storage, policy);
    if let Some(silence) = config.interview.silence_timeout() {
        handler = handler.with_silence_timeout(silence);
    }

    let (cancel_tx, cancel_rx) = watch::channel(None);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, ending call");
            let _ = cancel_tx.send(Some(CallEndReason::SessionError));
        }
    });

    let result = handler
        .handle(
            RunScreeningCallCommand {
                session_id,
                metadata: script.metadata().clone(),
            },
            cancel_rx,
        )
        .await?;

    println!("{}", result.report.text());
    println!("status: {}", result.status);
    println!("questions asked: {}", result.questions_asked);
    println!("saved: {} (sha256 {})", result.stored.location, result.stored.checksum);
    Ok(())
}

/// Logs go to stderr so the report on stdout stays clean.
fn init_tracing(telemetry: &TelemetryConfig) -> Result<(), Box<dyn Error>> {
    let filter = telemetry.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    match telemetry.log_format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
