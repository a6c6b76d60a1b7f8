//! Engine - owned controller object for one viewer session
//!
//! The Engine owns the state, the message channel, the shutdown signal and
//! the push subscription. Frontends feed interactions in as [`Message`]s and
//! observe [`EngineEvent`]s and [`ControllerView`] snapshots.

use std::time::Duration;

use shovel_client::{subscribe_events, FlowApi, LiveEvent, EVENT_CHANNEL_CAPACITY};
use shovel_core::prelude::*;
use shovel_core::{FlowId, TimestampBounds};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::Settings;
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::process;
use crate::state::{AppState, DetailState};
use crate::view::ControllerView;

/// Detail progress, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailStatus {
    None,
    Pending(FlowId),
    Loaded(FlowId),
    NotFound(FlowId),
}

impl From<&DetailState> for DetailStatus {
    fn from(detail: &DetailState) -> Self {
        match detail {
            DetailState::None => Self::None,
            DetailState::Pending(id) => Self::Pending(*id),
            DetailState::Loaded(id, _) => Self::Loaded(*id),
            DetailState::NotFound(id) => Self::NotFound(*id),
        }
    }
}

/// Lightweight snapshot of state for change detection.
///
/// Captured before message processing, compared after to detect
/// what changed and emit appropriate EngineEvents.
#[derive(Debug, Clone)]
struct StateSnapshot {
    url: Url,
    selected_flow: Option<FlowId>,
    search: Option<String>,
    generation: u64,
    flow_count: usize,
    exhausted: bool,
    offline: bool,
    detail: DetailStatus,
    bounds: Option<TimestampBounds>,
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        Self {
            url: state.location.current().clone(),
            selected_flow: state.selected_flow,
            search: state.filter().search,
            generation: state.generation,
            flow_count: state.pager.len(),
            exhausted: state.pager.is_exhausted(),
            offline: state.is_offline(),
            detail: DetailStatus::from(&state.detail),
            bounds: state.live.bounds(),
        }
    }
}

/// Flow list controller engine.
pub struct Engine<A> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources.
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Sender for the shutdown signal. Send `true` to initiate shutdown.
    pub shutdown_tx: watch::Sender<bool>,

    /// Receiver for the shutdown signal. Clone for background tasks.
    pub shutdown_rx: watch::Receiver<bool>,

    /// Loaded settings
    pub settings: Settings,

    api: A,

    /// Push subscription and its message bridge
    live_tasks: Vec<JoinHandle<()>>,

    /// Event broadcaster for external consumers.
    event_tx: broadcast::Sender<EngineEvent>,
}

impl<A> Engine<A>
where
    A: FlowApi + Clone + Send + Sync + 'static,
{
    /// Create an engine for the navigable `location`.
    ///
    /// Nothing is fetched until [`start`](Self::start).
    pub fn new(api: A, settings: Settings, location: Url) -> Self {
        let state = AppState::new(location, settings.clone());
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, _) = broadcast::channel(256);

        Self {
            state,
            msg_tx,
            msg_rx,
            shutdown_tx,
            shutdown_rx,
            settings,
            api,
            live_tasks: Vec::new(),
            event_tx,
        }
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Load the flow list for the starting location.
    pub fn start(&mut self) {
        self.process_message(Message::Init);
    }

    /// Subscribe to the push channel at `base`, bridging its events into
    /// the message channel.
    pub fn start_live_events(&mut self, base: Url) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<LiveEvent>(EVENT_CHANNEL_CAPACITY);
        let subscription = subscribe_events(
            base,
            self.settings.reconnect_policy(),
            event_tx,
            self.shutdown_receiver(),
        )?;

        let msg_tx = self.msg_sender();
        let bridge = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if msg_tx.send(Message::Live(event)).await.is_err() {
                    break;
                }
            }
        });

        self.live_tasks.push(subscription);
        self.live_tasks.push(bridge);
        self.process_message(Message::LiveSubscriptionStarted);
        Ok(())
    }

    /// Process a single message through the TEA update cycle and emit
    /// events for what changed.
    pub fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);

        process::process_message(&mut self.state, msg, &self.api, &self.msg_tx);

        let post = StateSnapshot::capture(&self.state);
        self.emit_events(&pre, &post);
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Wait for the next message and process it.
    ///
    /// Returns `false` once the channel is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.process_message(msg);
                true
            }
            None => false,
        }
    }

    /// Snapshot of everything a frontend renders.
    pub fn view(&self) -> ControllerView {
        ControllerView::from_state(&self.state)
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Get a clone of the shutdown receiver for background tasks.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Signal background tasks and wait for the push subscription to stop.
    pub async fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);

        let _ = self.shutdown_tx.send(true);

        for handle in self.live_tasks.drain(..) {
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Push task panicked: {}", e),
                Err(_) => warn!("Push task cleanup timed out"),
            }
        }
        info!("Engine shut down");
    }

    /// Compare pre/post snapshots and emit an event per change.
    fn emit_events(&self, pre: &StateSnapshot, post: &StateSnapshot) {
        if pre.url != post.url {
            self.emit(EngineEvent::LocationChanged {
                url: post.url.clone(),
            });
        }

        let search_changed = post.selected_flow.is_some() && pre.search != post.search;
        if pre.selected_flow != post.selected_flow || search_changed {
            self.emit(EngineEvent::SelectionChanged {
                flow_id: post.selected_flow,
                search: post.search.clone(),
            });
        }

        if pre.generation != post.generation {
            self.emit(EngineEvent::ListReset {
                filter: self.state.filter(),
                generation: post.generation,
            });
        } else if pre.flow_count != post.flow_count || pre.exhausted != post.exhausted {
            self.emit(EngineEvent::ListAppended {
                added: post.flow_count.saturating_sub(pre.flow_count),
                total: post.flow_count,
                exhausted: post.exhausted,
            });
        }

        if pre.offline != post.offline {
            self.emit(EngineEvent::OfflineChanged {
                offline: post.offline,
            });
        }

        if pre.detail != post.detail {
            match (&post.detail, &self.state.detail) {
                (DetailStatus::Loaded(id), DetailState::Loaded(_, detail)) => {
                    self.emit(EngineEvent::FlowDetailLoaded {
                        flow_id: *id,
                        detail: detail.clone(),
                    });
                }
                (DetailStatus::NotFound(id), _) => {
                    self.emit(EngineEvent::FlowNotFound { flow_id: *id });
                }
                _ => {}
            }
        }

        if let Some(bounds) = post.bounds.filter(|_| pre.bounds != post.bounds) {
            self.emit(EngineEvent::BoundsChanged { bounds });
        }
    }

    /// Emit a single EngineEvent to all subscribers.
    ///
    /// send() returns Err only if there are no receivers.
    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}
