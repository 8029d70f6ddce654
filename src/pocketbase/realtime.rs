//! PocketBase realtime (server-sent events) subscriptions
//!
//! One SSE connection is shared by all subscriptions of a client. It is
//! opened by the first `subscribe`, and closed again when the last topic is
//! unsubscribed. While topics remain, a dropped connection is re-opened with
//! backoff and the topic list is submitted again under the new client id;
//! subscribers keep their channels across reconnects.

use super::auth_store::AuthStore;
use super::client::{authorize, build_url, response_error, REQUEST_TIMEOUT};
use super::sse::{SseEvent, SseParser};
use super::Record;
use crate::error::FirebaseError;
use futures::StreamExt;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Change notification for a subscribed record topic
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSubscriptionEvent {
    /// `create`, `update` or `delete`
    pub action: String,
    /// Record after the change (before it, for deletes)
    pub record: Record,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectPayload {
    client_id: String,
}

type EventSender = mpsc::UnboundedSender<RecordSubscriptionEvent>;

/// Delay before each reconnect attempt; the last value repeats
const RECONNECT_INTERVALS: [Duration; 7] = [
    Duration::from_millis(200),
    Duration::from_millis(300),
    Duration::from_millis(500),
    Duration::from_millis(1000),
    Duration::from_millis(1200),
    Duration::from_millis(1500),
    Duration::from_millis(2000),
];

#[derive(Default)]
struct RealtimeState {
    client_id: Option<String>,
    connection: Option<JoinHandle<()>>,
    /// Bumped on every connect/disconnect so a stale reader can't clobber a
    /// newer connection's state
    generation: u64,
    next_id: u64,
    topics: BTreeMap<String, Vec<(u64, EventSender)>>,
}

#[derive(Clone)]
pub(crate) struct RealtimeService {
    inner: Arc<RealtimeInner>,
}

struct RealtimeInner {
    base_url: String,
    http: reqwest::Client,
    auth_store: AuthStore,
    state: Mutex<RealtimeState>,
}

impl RealtimeService {
    pub(crate) fn new(base_url: String, http: reqwest::Client, auth_store: AuthStore) -> Self {
        Self {
            inner: Arc::new(RealtimeInner {
                base_url,
                http,
                auth_store,
                state: Mutex::new(RealtimeState::default()),
            }),
        }
    }

    /// Register a subscriber for `topic`, connecting first if needed
    pub(crate) async fn subscribe(&self, topic: String) -> Result<RealtimeSubscription, FirebaseError> {
        let mut state = self.inner.state.lock().await;
        let fresh_connection = state.client_id.is_none();
        if fresh_connection {
            self.inner.connect(&mut state).await?;
        }

        let id = state.next_id;
        state.next_id += 1;
        let (tx, receiver) = mpsc::unbounded_channel();
        let is_new_topic = !state.topics.contains_key(&topic);
        state.topics.entry(topic.clone()).or_default().push((id, tx));

        // A fresh connection has no topics registered server-side yet
        if is_new_topic || fresh_connection {
            if let Err(err) = self.inner.submit(&state).await {
                state.topics.remove(&topic);
                if state.topics.is_empty() {
                    state.disconnect();
                }
                return Err(err);
            }
        }

        debug!(topic = %topic, "realtime subscription added");
        Ok(RealtimeSubscription {
            topic,
            id,
            receiver,
            service: self.clone(),
        })
    }

    /// Remove one subscriber; drops the topic (and the connection) once
    /// nothing listens to it
    pub(crate) async fn unsubscribe(&self, topic: &str, id: u64) -> Result<(), FirebaseError> {
        let mut state = self.inner.state.lock().await;
        let Some(subscribers) = state.topics.get_mut(topic) else {
            return Ok(());
        };
        subscribers.retain(|(subscriber, _)| *subscriber != id);
        if !subscribers.is_empty() {
            return Ok(());
        }

        state.topics.remove(topic);
        debug!(topic = %topic, "realtime topic removed");
        if state.topics.is_empty() {
            state.disconnect();
            return Ok(());
        }
        self.inner.submit(&state).await
    }

    /// Whether an SSE connection is currently open
    pub(crate) async fn is_connected(&self) -> bool {
        self.inner.state.lock().await.client_id.is_some()
    }
}

impl RealtimeState {
    fn disconnect(&mut self) {
        if let Some(handle) = self.connection.take() {
            handle.abort();
        }
        self.client_id = None;
        self.generation += 1;
        debug!("realtime connection closed");
    }
}

impl RealtimeInner {
    /// Open the event stream
    async fn open(&self) -> Result<reqwest::Response, FirebaseError> {
        let url = build_url(&self.base_url, &["api", "realtime"])?;
        let request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let response = authorize(request, &self.auth_store).send().await?;

        if !response.status().is_success() {
            return Err(response_error(response).await.into());
        }
        Ok(response)
    }

    async fn connect(self: &Arc<Self>, state: &mut RealtimeState) -> Result<(), FirebaseError> {
        let response = self.open().await?;

        // A connection still retrying in the background is superseded
        if let Some(stale) = state.connection.take() {
            stale.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let (connect_tx, connect_rx) = oneshot::channel();
        let handle = tokio::spawn(run_connection(Arc::downgrade(self), response, connect_tx, generation));

        let client_id = match tokio::time::timeout(REQUEST_TIMEOUT, connect_rx).await {
            Ok(Ok(client_id)) => client_id,
            Ok(Err(_)) => {
                handle.abort();
                return Err(FirebaseError::Realtime(
                    "connection closed before PB_CONNECT".to_string(),
                ));
            }
            Err(_) => {
                handle.abort();
                return Err(FirebaseError::Realtime(
                    "timed out waiting for PB_CONNECT".to_string(),
                ));
            }
        };

        debug!(client_id = %client_id, "realtime connection established");
        state.client_id = Some(client_id);
        state.connection = Some(handle);
        Ok(())
    }

    /// Send the full topic list for this client
    async fn submit(&self, state: &RealtimeState) -> Result<(), FirebaseError> {
        let Some(client_id) = &state.client_id else {
            return Err(FirebaseError::Realtime("not connected".to_string()));
        };

        let url = build_url(&self.base_url, &["api", "realtime"])?;
        let topics: Vec<&String> = state.topics.keys().collect();
        let request = self
            .http
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({
                "clientId": client_id,
                "subscriptions": topics,
            }));
        let response = authorize(request, &self.auth_store).send().await?;

        if !response.status().is_success() {
            return Err(response_error(response).await.into());
        }
        Ok(())
    }

    /// Re-register every topic under the client id of a re-opened stream
    async fn resume(&self, client_id: String, generation: u64) -> Result<(), FirebaseError> {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return Err(FirebaseError::Realtime("connection superseded".to_string()));
        }

        state.client_id = Some(client_id);
        if let Err(err) = self.submit(&state).await {
            state.client_id = None;
            return Err(err);
        }
        debug!(topics = state.topics.len(), "realtime connection resumed");
        Ok(())
    }

    /// Decide whether a dropped stream should be re-opened
    ///
    /// Subscribers that went away without unsubscribing are pruned first;
    /// with nothing left to deliver to, the connection is retired.
    async fn should_reconnect(&self, generation: u64) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return false;
        }

        state.client_id = None;
        for subscribers in state.topics.values_mut() {
            subscribers.retain(|(_, tx)| !tx.is_closed());
        }
        state.topics.retain(|_, subscribers| !subscribers.is_empty());

        if state.topics.is_empty() {
            state.connection = None;
            debug!("realtime connection closed, no subscribers left");
            return false;
        }
        true
    }

    async fn dispatch(&self, event: &SseEvent) {
        let payload: RecordSubscriptionEvent = match serde_json::from_str(&event.data) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(event = %event.event, error = %err, "ignoring malformed realtime event");
                return;
            }
        };

        let mut state = self.state.lock().await;
        if let Some(subscribers) = state.topics.get_mut(&event.event) {
            subscribers.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
        }
    }
}

async fn run_connection(
    inner: Weak<RealtimeInner>,
    response: reqwest::Response,
    connect_tx: oneshot::Sender<String>,
    generation: u64,
) {
    let mut connect_tx = Some(connect_tx);
    let mut response = Some(response);
    let mut attempt = 0;

    loop {
        if let Some(body) = response.take() {
            match read_events(&inner, body, &mut connect_tx, generation, &mut attempt).await {
                Ok(()) => debug!("realtime stream ended"),
                Err(err) => warn!(error = %err, "realtime stream failed"),
            }
        }

        // Never connected: `connect` reports the failure once the sender drops
        if connect_tx.is_some() {
            return;
        }

        let Some(strong) = inner.upgrade() else {
            return;
        };
        if !strong.should_reconnect(generation).await {
            return;
        }
        drop(strong);

        let delay = RECONNECT_INTERVALS[attempt.min(RECONNECT_INTERVALS.len() - 1)];
        attempt += 1;
        warn!(attempt, delay_ms = delay.as_millis() as u64, "realtime connection lost, reconnecting");
        tokio::time::sleep(delay).await;

        let Some(strong) = inner.upgrade() else {
            return;
        };
        match strong.open().await {
            Ok(body) => response = Some(body),
            Err(err) => error!(error = %err, "realtime reconnect failed"),
        }
    }
}

async fn read_events(
    inner: &Weak<RealtimeInner>,
    response: reqwest::Response,
    connect_tx: &mut Option<oneshot::Sender<String>>,
    generation: u64,
    attempt: &mut usize,
) -> Result<(), FirebaseError> {
    let mut parser = SseParser::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for event in parser.feed(&chunk) {
            if event.event == "PB_CONNECT" {
                let client_id = match serde_json::from_str::<ConnectPayload>(&event.data) {
                    Ok(payload) => payload.client_id,
                    Err(_) => event.id.clone().unwrap_or_default(),
                };
                match connect_tx.take() {
                    Some(tx) => {
                        let _ = tx.send(client_id);
                    }
                    None => {
                        let Some(inner) = inner.upgrade() else {
                            return Ok(());
                        };
                        inner.resume(client_id, generation).await?;
                    }
                }
                *attempt = 0;
                continue;
            }

            let Some(inner) = inner.upgrade() else {
                return Ok(());
            };
            inner.dispatch(&event).await;
        }
    }
    Ok(())
}

/// Live subscription to one realtime topic
///
/// Call [`RealtimeSubscription::unsubscribe`] to detach; dropping the value
/// only stops delivery to it.
pub struct RealtimeSubscription {
    topic: String,
    id: u64,
    receiver: mpsc::UnboundedReceiver<RecordSubscriptionEvent>,
    service: RealtimeService,
}

impl RealtimeSubscription {
    /// Subscribed topic, e.g. `todos/*`
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next change event; `None` once the client is dropped
    pub async fn recv(&mut self) -> Option<RecordSubscriptionEvent> {
        self.receiver.recv().await
    }

    /// Detach from the topic
    pub async fn unsubscribe(self) -> Result<(), FirebaseError> {
        self.service.unsubscribe(&self.topic, self.id).await
    }
}

impl std::fmt::Debug for RealtimeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSubscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}
