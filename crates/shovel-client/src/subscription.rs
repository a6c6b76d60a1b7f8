//! Long-lived push subscription (`subscribeEvents`)
//!
//! A background task reads `api/events`, decodes frames into [`LiveEvent`]s
//! and forwards them on an mpsc channel. When the stream fails it reports
//! `Offline(true)` and reconnects with exponential backoff until shutdown or
//! until the receiver is dropped.

use std::time::Duration;

use futures_util::StreamExt;
use shovel_core::prelude::*;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::events::{arrange_batch, EventStreamDecoder, LiveEvent};
use crate::http::normalize_base;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default initial reconnection backoff.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Default reconnection backoff cap.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Capacity of the live event channel (bursty on reconnect).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Reconnection timing of the push subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl ReconnectPolicy {
    /// Backoff before reconnection attempt `attempt` (1-indexed).
    ///
    /// `initial_backoff * 2^(attempt-1)`, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier: u32 = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(multiplier)
            .min(self.max_backoff)
    }
}

/// Why one connection of the subscription ended.
#[derive(Debug)]
enum StreamEnd {
    /// Shutdown was requested.
    Shutdown,
    /// The event receiver was dropped.
    ReceiverGone,
    /// The stream failed or closed; reconnect.
    Lost(String),
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Spawn the push subscription for the viewer rooted at `base`.
///
/// Events are delivered on `event_tx` in arrival order, except that within
/// one received chunk configuration events come last, each preceded by
/// `Offline(false)`.
pub fn subscribe_events(
    base: Url,
    policy: ReconnectPolicy,
    event_tx: mpsc::Sender<LiveEvent>,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<JoinHandle<()>> {
    let url = normalize_base(base).join("api/events")?;
    // No overall timeout: the stream is long-lived.
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| Error::transport(format!("Failed to build HTTP client: {e}")))?;

    Ok(tokio::spawn(run_subscription(
        client,
        url,
        policy,
        event_tx,
        shutdown_rx,
    )))
}

async fn run_subscription(
    client: reqwest::Client,
    url: Url,
    policy: ReconnectPolicy,
    event_tx: mpsc::Sender<LiveEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        info!("Push channel: connecting to {}", url);
        let end = match connect(&client, &url).await {
            Ok(response) => {
                info!("Push channel: connected");
                attempt = 0;
                pump(response, &event_tx, &mut shutdown_rx).await
            }
            Err(e) => StreamEnd::Lost(e.to_string()),
        };

        match end {
            StreamEnd::Shutdown => break,
            StreamEnd::ReceiverGone => {
                debug!("Push channel: receiver dropped, stopping");
                break;
            }
            StreamEnd::Lost(reason) => {
                if event_tx.send(LiveEvent::Offline(true)).await.is_err() {
                    break;
                }
                attempt = attempt.saturating_add(1);
                let backoff = policy.backoff(attempt);
                warn!(
                    "Push channel: {}, retrying in {:?} (attempt {})",
                    reason, backoff, attempt
                );
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        }
    }
    debug!("Push channel: task exited");
}

async fn connect(client: &reqwest::Client, url: &Url) -> Result<reqwest::Response> {
    let response = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| Error::transport(format!("Failed to open event stream: {e}")))?;
    if !response.status().is_success() {
        return Err(Error::http_status(response.status().as_u16(), url.path()));
    }
    Ok(response)
}

/// Forward events of one open stream until it ends.
async fn pump(
    response: reqwest::Response,
    event_tx: &mpsc::Sender<LiveEvent>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> StreamEnd {
    let mut stream = response.bytes_stream();
    let mut decoder = EventStreamDecoder::new();
    let mut text = Utf8Buffer::default();

    loop {
        tokio::select! {
            chunk = stream.next() => {
                let bytes = match chunk {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(e)) => return StreamEnd::Lost(format!("stream error: {e}")),
                    None => return StreamEnd::Lost("stream closed".to_string()),
                };
                let events = decode_chunk(&mut decoder, &text.push(&bytes));
                for event in events {
                    if event_tx.send(event).await.is_err() {
                        return StreamEnd::ReceiverGone;
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return StreamEnd::Shutdown;
                }
            }
        }
    }
}

/// Decode the frames completed by `chunk`, in delivery order.
///
/// Malformed payloads are logged and skipped.
pub fn decode_chunk(decoder: &mut EventStreamDecoder, chunk: &str) -> Vec<LiveEvent> {
    let events = decoder
        .feed(chunk)
        .iter()
        .filter_map(|frame| match LiveEvent::from_frame(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!("Push channel: skipping frame: {}", e);
                None
            }
        })
        .collect();
    arrange_batch(events)
}

/// Reassembles UTF-8 text from byte chunks that may split a code point.
#[derive(Debug, Default)]
struct Utf8Buffer {
    pending: Vec<u8>,
}

impl Utf8Buffer {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // An incomplete sequence at the end waits for the next chunk
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                return text;
            }
        };
        let rest = self.pending.split_off(valid);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = rest;
        text
    }
}
