//! Firebase-shaped client for PocketBase
//!
//! Code written against the Firebase app / auth / firestore API runs
//! unchanged against a self-hosted PocketBase server. Depend on this crate
//! under the name `firebase` to swap it in without touching imports:
//!
//! ```toml
//! [dependencies]
//! firebase = { package = "firebase-pocketbase", version = "0.1.0-beta" }
//! ```
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use firebase_pocketbase::auth::{get_auth, sign_in_anonymously};
//! use firebase_pocketbase::firestore::{add_doc, collection, get_firestore, server_timestamp};
//! use firebase_pocketbase::{initialize_app, AppConfig};
//! use serde_json::json;
//!
//! let app = initialize_app(AppConfig::with_pocketbase_url("http://127.0.0.1:8090"));
//!
//! let user = sign_in_anonymously(&get_auth(&app)).await?.user;
//! println!("Signed in: {}", user.uid);
//!
//! let todos = collection(&get_firestore(&app), &["todos"])?;
//! let added = add_doc(&todos, &json!({ "text": "milk", "when": server_timestamp() })).await?;
//! println!("Added {}", added.path());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod error;
mod observer;
pub mod pocketbase;

// Auth module
pub mod auth {
    //! Firebase Authentication

    #[allow(clippy::module_inception)]
    pub mod auth;
    pub(crate) mod session;
    pub mod types;

    pub use auth::{
        create_user_with_email_and_password, get_auth, on_auth_state_changed, sign_in_anonymously,
        sign_in_with_custom_token, sign_in_with_email_and_password, sign_out, Auth,
        AuthStateListener,
    };
    pub use types::{AdditionalUserInfo, AuthResult, User};
}

// Firestore module
pub mod firestore;

// Re-exports for convenience
pub use app::{initialize_app, initialize_app_from_env, App};
pub use config::{injected_config, AppConfig};
pub use error::{AuthError, FirebaseError, FirestoreError};

// Auth re-exports
pub use auth::{Auth, AuthResult, User};

// Firestore re-exports
pub use firestore::{
    CollectionReference, DocumentReference, Firestore, ListenerRegistration, QuerySnapshot,
    Timestamp,
};
