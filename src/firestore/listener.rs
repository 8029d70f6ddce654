//! Snapshot listeners
//!
//! A listener runs on its own tokio task:
//! 1. Fetches the full collection and subscribes to `{collection}/*`
//!    concurrently; the fetch result is the first snapshot
//! 2. Re-fetches the full collection on every realtime event
//! 3. Unsubscribes once removed
//!
//! A dropped realtime connection is re-opened underneath the listener, which
//! keeps re-fetching on the events of the new connection.
//!
//! Re-fetches run independently of each other, so with bursts of events the
//! last fetch to complete wins.

use super::query::Query;
use super::query_snapshot::QuerySnapshot;
use crate::error::FirebaseError;
use crate::pocketbase::RecordService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// Callback for listener setup failures
pub type SnapshotErrorHandler = Box<dyn Fn(FirebaseError) + Send + Sync>;

/// Handle for removing a snapshot listener
///
/// Dropping the handle removes the listener as well.
#[must_use = "the listener is removed as soon as its registration is dropped"]
pub struct ListenerRegistration {
    active: Arc<AtomicBool>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ListenerRegistration {
    /// Removes the listener and stops receiving updates
    ///
    /// No snapshot is delivered after this returns. The realtime
    /// subscription itself is released once listener setup has finished.
    pub fn remove(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(tx) = self.cancel_tx.take() {
            // Ignore error if the listener task already ended
            let _ = tx.send(());
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish()
    }
}

/// Listen to a query
///
/// `on_next` receives the initial snapshot and one fresh snapshot per change
/// to the collection. Setup failures (initial fetch, realtime subscription)
/// go to `on_error`, or to the log when it is `None`; failed re-fetches are
/// only logged.
///
/// # Panics
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use firebase_pocketbase::firestore::{collection, get_firestore, on_snapshot};
/// use firebase_pocketbase::{initialize_app, AppConfig};
///
/// let db = get_firestore(&initialize_app(AppConfig::new()));
/// let todos = collection(&db, &["todos"])?;
///
/// let registration = on_snapshot(
///     &todos,
///     |snapshot| println!("{} todos", snapshot.size()),
///     Some(Box::new(|err| eprintln!("listen failed: {}", err))),
/// );
/// // ...
/// registration.remove();
/// # Ok(())
/// # }
/// ```
pub fn on_snapshot<F>(query: &Query, on_next: F, on_error: Option<SnapshotErrorHandler>) -> ListenerRegistration
where
    F: Fn(QuerySnapshot) + Send + Sync + 'static,
{
    spawn_query_listener(query, on_next, on_error)
}

pub(crate) fn spawn_query_listener<F>(
    query: &Query,
    on_next: F,
    on_error: Option<SnapshotErrorHandler>,
) -> ListenerRegistration
where
    F: Fn(QuerySnapshot) + Send + Sync + 'static,
{
    let active = Arc::new(AtomicBool::new(true));
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let records = query.records();
    debug!(collection = %records.collection_name(), "starting snapshot listener");

    tokio::spawn(run_query_listener(
        records,
        Arc::new(on_next),
        on_error,
        Arc::clone(&active),
        cancel_rx,
    ));

    ListenerRegistration {
        active,
        cancel_tx: Some(cancel_tx),
    }
}

async fn run_query_listener<F>(
    records: RecordService,
    on_next: Arc<F>,
    on_error: Option<SnapshotErrorHandler>,
    active: Arc<AtomicBool>,
    mut cancel_rx: oneshot::Receiver<()>,
) where
    F: Fn(QuerySnapshot) + Send + Sync + 'static,
{
    let report = |err: FirebaseError| {
        if !active.load(Ordering::SeqCst) {
            return;
        }
        match &on_error {
            Some(handler) => handler(err),
            None => error!(collection = %records.collection_name(), error = %err, "snapshot listener failed"),
        }
    };

    let initial = async {
        match records.get_full_list().await {
            Ok(list) => deliver(on_next.as_ref(), &active, list),
            Err(err) => report(err),
        }
    };
    let (_, subscribed) = tokio::join!(initial, records.subscribe("*"));

    let mut subscription = match subscribed {
        Ok(subscription) => subscription,
        Err(err) => {
            report(err);
            return;
        }
    };

    loop {
        tokio::select! {
            _ = &mut cancel_rx => break,
            event = subscription.recv() => {
                let Some(event) = event else {
                    warn!(collection = %records.collection_name(), "realtime client dropped, snapshot listener stopped");
                    return;
                };
                debug!(
                    collection = %records.collection_name(),
                    action = %event.action,
                    "change received, re-fetching"
                );
                tokio::spawn(refetch(records.clone(), Arc::clone(&on_next), Arc::clone(&active)));
            }
        }
    }

    if let Err(err) = subscription.unsubscribe().await {
        warn!(collection = %records.collection_name(), error = %err, "failed to unsubscribe snapshot listener");
    }
    debug!(collection = %records.collection_name(), "snapshot listener removed");
}

async fn refetch<F>(records: RecordService, on_next: Arc<F>, active: Arc<AtomicBool>)
where
    F: Fn(QuerySnapshot) + Send + Sync + 'static,
{
    match records.get_full_list().await {
        Ok(list) => deliver(on_next.as_ref(), &active, list),
        Err(err) => error!(collection = %records.collection_name(), error = %err, "snapshot re-fetch failed"),
    }
}

fn deliver<F>(on_next: &F, active: &AtomicBool, records: Vec<crate::pocketbase::Record>)
where
    F: Fn(QuerySnapshot),
{
    if active.load(Ordering::SeqCst) {
        on_next(QuerySnapshot::from_records(records));
    }
}
