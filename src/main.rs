use anyhow::{Context, Result};
use motion_coach::coach::HttpChatGateway;
use motion_coach::integration::{CoachConfig, OrchestratorBuilder, OrchestratorEvent};
use motion_coach::messages::MessageOrigin;
use motion_coach::motion::{SensorEvent, SensorHub};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reads JSON sensor events and chat lines from stdin.
///
/// Lines starting with `{` are motion events, e.g.
/// `{"acceleration":{"x":0.1,"y":0.0,"z":4.2}}`. Events are stamped on
/// arrival, so feed them at the pace the device produced them.
/// `/speech on`, `/speech off`, `/motion` and `/quit` are commands; anything
/// else is sent to the model as a chat message.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motion_coach=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting motion coach");

    let config = match std::env::args().nth(1) {
        Some(path) => CoachConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => CoachConfig::default(),
    };

    let gateway =
        HttpChatGateway::from_env(config.gateway.clone()).context("creating chat gateway")?;

    let hub = SensorHub::new();
    let (orchestrator, handle) = OrchestratorBuilder::new()
        .with_config(config)
        .with_gateway(Arc::new(gateway))
        .with_source(Arc::new(hub.clone()))
        .build()?;

    let task = orchestrator.spawn();

    let events = handle.event_receiver();
    let printer = std::thread::spawn(move || {
        for event in events.iter() {
            match event {
                OrchestratorEvent::Reply { text, origin, .. } => match origin {
                    MessageOrigin::Chat => println!("assistant: {}", text),
                    MessageOrigin::Coaching(kind) => println!("coach [{}]: {}", kind.as_str(), text),
                },
                OrchestratorEvent::InvalidMessage(reason) => println!("! {}", reason),
                OrchestratorEvent::PermissionDenied(reason) => println!("! {}", reason),
                OrchestratorEvent::Shutdown => break,
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" => break,
            "/motion" => handle.enable_motion()?,
            "/speech on" => handle.set_speech_enabled(true)?,
            "/speech off" => handle.set_speech_enabled(false)?,
            _ if line.starts_with('{') => match serde_json::from_str::<SensorEvent>(line) {
                Ok(event) => {
                    hub.emit(event);
                }
                Err(e) => warn!("Ignoring malformed sensor event: {}", e),
            },
            _ => handle.send_text(line)?,
        }
    }

    handle.shutdown()?;
    task.await??;
    let _ = printer.join();

    Ok(())
}
