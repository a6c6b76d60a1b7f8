//! Headless mode runner - main event loop
//!
//! Reads commands from stdin, feeds them to the engine, and writes engine
//! events to stdout as NDJSON.

use shovel_app::{Engine, Settings};
use shovel_client::{FlowApi, HttpFlowApi};
use shovel_core::prelude::*;
use tokio::sync::{broadcast, mpsc};
use url::Url;

use shovel_app::EngineEvent;

use super::{HeadlessCommand, HeadlessEvent};

/// Run in headless mode against the configured server.
///
/// `location` is the starting navigable location (e.g. a shared link); it
/// defaults to the server URL.
pub async fn run_headless(settings: Settings, location: Option<String>) -> Result<()> {
    let server = settings.server_url()?;
    let location = match location {
        Some(raw) => Url::parse(&raw)?,
        None => server.clone(),
    };

    info!("═══════════════════════════════════════════════════════");
    info!("Shovel starting in HEADLESS mode");
    info!("Server: {}", server);
    info!("Location: {}", location);
    info!("═══════════════════════════════════════════════════════");

    let api = HttpFlowApi::new(server.clone())?;
    let mut engine = Engine::new(api, settings, location);
    let mut events = engine.subscribe();

    let (cmd_tx, cmd_rx) = mpsc::channel::<HeadlessCommand>(64);
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(cmd_tx);
    });

    if engine.settings.events.enabled {
        if let Err(e) = engine.start_live_events(server) {
            warn!("Push channel unavailable: {}", e);
            HeadlessEvent::error(format!("Push channel unavailable: {e}"), false).emit();
        }
    }
    engine.start();
    forward_events(&mut events);

    let result = headless_event_loop(&mut engine, &mut events, cmd_rx).await;

    engine.shutdown().await;
    forward_events(&mut events);

    info!("Shovel headless mode exiting");
    result
}

/// Main headless event loop
///
/// Runs until a `quit` command arrives or stdin is closed.
pub async fn headless_event_loop<A>(
    engine: &mut Engine<A>,
    events: &mut broadcast::Receiver<EngineEvent>,
    mut cmd_rx: mpsc::Receiver<HeadlessCommand>,
) -> Result<()>
where
    A: FlowApi + Clone + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            Some(msg) = engine.msg_rx.recv() => {
                engine.process_message(msg);
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    info!("Stdin closed");
                    break;
                };
                match cmd {
                    HeadlessCommand::Quit => {
                        info!("Quit requested");
                        break;
                    }
                    HeadlessCommand::View => HeadlessEvent::view(engine.view()).emit(),
                    cmd => match cmd.into_message() {
                        Ok(Some(msg)) => engine.process_message(msg),
                        Ok(None) => {}
                        Err(e) => HeadlessEvent::error(e.to_string(), false).emit(),
                    },
                }
            }
        }
        forward_events(events);
    }

    Ok(())
}

/// Write every pending engine event to stdout.
fn forward_events(events: &mut broadcast::Receiver<EngineEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => HeadlessEvent::from(event).emit(),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                warn!("Dropped {} engine events", n);
            }
            Err(_) => break,
        }
    }
}

/// Read stdin lines into commands (blocking version)
fn spawn_stdin_reader_blocking(cmd_tx: mpsc::Sender<HeadlessCommand>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match HeadlessCommand::parse(trimmed) {
            Ok(cmd) => {
                let quit = cmd == HeadlessCommand::Quit;
                if cmd_tx.blocking_send(cmd).is_err() || quit {
                    break;
                }
            }
            Err(e) => {
                warn!("Unknown stdin command: {}", trimmed);
                HeadlessEvent::error(format!("Invalid command: {e}"), false).emit();
            }
        }
    }

    info!("Stdin reader exiting");
}
