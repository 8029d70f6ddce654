//! App handle
//!
//! The [`App`] is the one connection object of this crate: it stands in for
//! the SDK's app, auth and database instances alike. It owns the PocketBase
//! client, the config it was built from, and the session context used by the
//! auth adapter.

use crate::auth::session::Session;
use crate::config::{injected_config, AppConfig};
use crate::pocketbase::PocketBase;
use std::sync::Arc;
use tracing::info;

pub use crate::config::DEFAULT_POCKETBASE_URL;

/// Client handle
///
/// Cheap to clone; clones share the connection and session state.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    options: AppConfig,
    client: PocketBase,
    session: Arc<Session>,
}

impl App {
    /// Build a handle from `config`
    ///
    /// Cannot fail: the server is first contacted by the first operation
    /// that needs it.
    ///
    /// # Example
    /// ```
    /// use firebase_pocketbase::{App, AppConfig};
    ///
    /// let app = App::initialize(AppConfig::with_pocketbase_url("http://127.0.0.1:8090"));
    /// assert_eq!(app.base_url(), "http://127.0.0.1:8090");
    /// ```
    pub fn initialize(config: AppConfig) -> Self {
        let url = config.target_url().to_string();
        let client = PocketBase::new(url.as_str());

        info!(url = %url, "initialized PocketBase client");

        App {
            inner: Arc::new(AppInner {
                options: config,
                client,
                session: Arc::new(Session::new()),
            }),
        }
    }

    /// The config this handle was built from
    pub fn options(&self) -> &AppConfig {
        &self.inner.options
    }

    /// Backend address in use
    pub fn base_url(&self) -> &str {
        self.inner.client.base_url()
    }

    /// Underlying PocketBase client
    pub fn pocketbase(&self) -> &PocketBase {
        &self.inner.client
    }

    /// Whether two handles share the same connection
    pub fn ptr_eq(&self, other: &App) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// Initialize the app from a config object
pub fn initialize_app(config: AppConfig) -> App {
    App::initialize(config)
}

/// Initialize the app from the injected default config
pub fn initialize_app_from_env() -> App {
    App::initialize(injected_config().clone())
}
