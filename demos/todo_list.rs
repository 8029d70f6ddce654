//! Todo list demo
//!
//! Signs in anonymously, watches a `todos` collection and adds one item.
//!
//! ```bash
//! POCKETBASE_URL=http://127.0.0.1:8090 RUST_LOG=info cargo run --example todo_list -- "buy milk"
//! ```

use firebase_pocketbase::auth::{get_auth, on_auth_state_changed, sign_in_anonymously};
use firebase_pocketbase::firestore::{
    add_doc, collection, get_firestore, on_snapshot, order_by, query, server_timestamp, Direction,
};
use firebase_pocketbase::initialize_app_from_env;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let text = std::env::args().nth(1).unwrap_or_else(|| "buy milk".to_string());

    let app = initialize_app_from_env();
    let auth = get_auth(&app);
    let db = get_firestore(&app);

    let _auth_listener = on_auth_state_changed(&auth, |user| match user {
        Some(user) => info!(uid = %user.uid, anonymous = user.is_anonymous, "signed in"),
        None => info!("signed out"),
    });

    let user = sign_in_anonymously(&auth).await?.user;

    let todos = collection(&db, &["todos"])?;
    let newest_first = query(&todos, &[order_by("createdAt", Direction::Descending)]);

    let registration = on_snapshot(
        &newest_first,
        |snapshot| {
            println!("--- {} todo(s) ---", snapshot.size());
            for doc in &snapshot {
                let text = doc.get("text").and_then(|v| v.as_str().map(str::to_owned));
                println!("{}  {}", doc.id(), text.unwrap_or_default());
            }
        },
        Some(Box::new(|err| error!(error = %err, "listener failed"))),
    );

    let added = add_doc(
        &todos,
        &json!({ "text": text, "owner": user.uid, "createdAt": server_timestamp() }),
    )
    .await?;
    info!(path = %added.path(), "added todo");

    // Let the realtime update arrive before exiting
    tokio::time::sleep(Duration::from_secs(2)).await;
    registration.remove();

    Ok(())
}
