//! Authentication adapter
//!
//! Sign-in, sign-out and session observation on top of the app's PocketBase
//! auth store. Anonymous and custom-token sign-in have no PocketBase
//! counterpart, so those users are fabricated locally and live only in the
//! session cache.

use crate::app::App;
use crate::auth::session::{AuthState, Session};
use crate::auth::types::{AdditionalUserInfo, AuthResult, User};
use crate::error::{AuthError, FirebaseError};
use crate::observer::{Observer, ObserverId, Teardown};
use crate::pocketbase::{AuthStore, Record};
use async_stream::stream;
use futures::Stream;
use rand::Rng;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

/// Auth collection used for password accounts
pub const USERS_COLLECTION: &str = "users";

const ANONYMOUS_UID_PREFIX: &str = "anon-";
const ANONYMOUS_UID_LEN: usize = 9;
const CUSTOM_UID_PREFIX: &str = "custom-user-";
const CUSTOM_UID_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Authentication handle
///
/// Shares the connection and session of the [`App`] it was obtained from;
/// any number of `Auth` values for one app observe the same session.
#[derive(Clone)]
pub struct Auth {
    app: App,
}

impl Auth {
    /// Get the auth handle of `app`
    ///
    /// # Example
    /// ```
    /// use firebase_pocketbase::{initialize_app, AppConfig, Auth};
    ///
    /// let app = initialize_app(AppConfig::new());
    /// let auth = Auth::get_auth(&app);
    /// assert!(auth.current_user().is_none());
    /// ```
    pub fn get_auth(app: &App) -> Self {
        Auth { app: app.clone() }
    }

    /// The app this handle belongs to
    pub fn app(&self) -> &App {
        &self.app
    }

    fn session(&self) -> &Arc<Session> {
        self.app.session()
    }

    fn store(&self) -> &AuthStore {
        self.app.pocketbase().auth_store()
    }

    /// Get the current signed-in user
    ///
    /// Returns None if no user is currently signed in.
    pub fn current_user(&self) -> Option<Arc<User>> {
        self.session().current_user()
    }

    /// User view of the auth store, if it holds an unexpired token with an
    /// account record
    fn store_user(&self) -> Option<Arc<User>> {
        let store = self.store();
        if !store.is_valid() {
            return None;
        }
        store.model().map(|record| Arc::new(User::from_record(&record)))
    }

    /// Sign in anonymously
    ///
    /// Returns the stored session's user when one is active, then the cached
    /// current user, so repeated calls yield the same user. Otherwise a new
    /// local anonymous user is created and observers are notified.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_pocketbase::{initialize_app, AppConfig, Auth};
    ///
    /// let auth = Auth::get_auth(&initialize_app(AppConfig::new()));
    /// let result = auth.sign_in_anonymously().await?;
    /// println!("Anonymous user: {}", result.user.uid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn sign_in_anonymously(&self) -> Result<AuthResult, FirebaseError> {
        if let Some(user) = self.store_user() {
            debug!(uid = %user.uid, "anonymous sign-in reused stored session");
            return Ok(AuthResult {
                user,
                additional_user_info: AdditionalUserInfo::new("anonymous", false),
            });
        }

        if let Some(user) = self.current_user() {
            debug!(uid = %user.uid, "anonymous sign-in reused cached user");
            return Ok(AuthResult {
                user,
                additional_user_info: AdditionalUserInfo::new("anonymous", false),
            });
        }

        let uid = format!("{}{}", ANONYMOUS_UID_PREFIX, random_base36(ANONYMOUS_UID_LEN));
        let user = Arc::new(User::fabricated(uid, true));
        debug!(uid = %user.uid, "created local anonymous user");

        self.session().publish(Some(Arc::clone(&user)));

        Ok(AuthResult {
            user,
            additional_user_info: AdditionalUserInfo::new("anonymous", true),
        })
    }

    /// Sign in with a custom token
    ///
    /// The token is stored as-is for subsequent requests; it is not verified
    /// here. The returned user is a local placeholder.
    pub async fn sign_in_with_custom_token(&self, token: &str) -> Result<AuthResult, FirebaseError> {
        if token.is_empty() {
            return Err(AuthError::InvalidCredential("Custom token cannot be empty".to_string()).into());
        }

        // The store listener ignores a token without a model, so observers
        // hear about this sign-in exactly once, from `publish` below
        self.store().save(token, None);

        let uid = format!("{}{}", CUSTOM_UID_PREFIX, random_base36(CUSTOM_UID_LEN));
        let user = Arc::new(User::fabricated(uid, false));
        debug!(uid = %user.uid, "signed in with custom token");

        self.session().publish(Some(Arc::clone(&user)));

        Ok(AuthResult {
            user,
            additional_user_info: AdditionalUserInfo::new("custom", false),
        })
    }

    /// Sign in with email and password
    ///
    /// Authenticates against the `users` auth collection.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_pocketbase::{initialize_app, AppConfig, Auth};
    ///
    /// let auth = Auth::get_auth(&initialize_app(AppConfig::new()));
    /// let result = auth.sign_in_with_email_and_password("user@example.com", "password").await?;
    /// println!("Signed in: {}", result.user.uid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn sign_in_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();
        validate_email_password(email, password)?;

        let user = self.password_sign_in(email, password).await?;

        Ok(AuthResult {
            user,
            additional_user_info: AdditionalUserInfo::new("password", false),
        })
    }

    /// Create new user with email and password, then sign in as that user
    pub async fn create_user_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();
        validate_email_password(email, password)?;

        let mut body = Record::new();
        body.insert("email".to_string(), email.into());
        body.insert("password".to_string(), password.into());
        body.insert("passwordConfirm".to_string(), password.into());

        let created = self.app.pocketbase().collection(USERS_COLLECTION).create(&body).await?;
        debug!(id = ?created.get("id"), "created user account");

        let user = self.password_sign_in(email, password).await?;

        Ok(AuthResult {
            user,
            additional_user_info: AdditionalUserInfo::new("password", true),
        })
    }

    async fn password_sign_in(&self, email: &str, password: &str) -> Result<Arc<User>, FirebaseError> {
        // Saving into the store notifies observers through the store listener
        let response = self
            .app
            .pocketbase()
            .collection(USERS_COLLECTION)
            .auth_with_password(email, password)
            .await?;

        let user = Arc::new(User::from_record(&response.record));
        self.session().set_current_user(Some(Arc::clone(&user)));
        debug!(uid = %user.uid, "signed in with password");
        Ok(user)
    }

    /// Sign out the current user
    ///
    /// Clears the auth store and the cached user. Every registered observer
    /// receives exactly one `None`, also when nobody was signed in.
    pub async fn sign_out(&self) -> Result<(), FirebaseError> {
        // With observers registered, the store listener publishes `None`
        self.store().clear();
        self.session().set_current_user(None);
        debug!("signed out");
        Ok(())
    }

    /// Register an auth-state observer
    ///
    /// If a user is signed in, the callback is invoked right away with it.
    /// After that it runs on every sign-in and sign-out until the returned
    /// listener is removed.
    pub fn on_auth_state_changed<F>(&self, callback: F) -> AuthStateListener
    where
        F: Fn(Option<Arc<User>>) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let observer: Observer<AuthState> = {
            let callback = Arc::clone(&callback);
            Arc::new(move |user: &AuthState| callback(user.clone()))
        };

        let session = self.session();
        let store = self.store();
        let id = session
            .observers
            .add(observer, || wire_store_listener(store, session));

        if let Some(user) = self.store_user().or_else(|| self.current_user()) {
            callback(Some(user));
        }

        AuthStateListener {
            session: Arc::clone(session),
            id,
        }
    }

    /// Subscribe to authentication state changes
    ///
    /// The stream yields the signed-in user first (if any), then every change.
    /// Dropping the stream removes its observer.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() {
    /// use firebase_pocketbase::{initialize_app, AppConfig, Auth};
    /// use futures::StreamExt;
    ///
    /// let auth = Auth::get_auth(&initialize_app(AppConfig::new()));
    /// let mut stream = auth.auth_state_changes();
    ///
    /// while let Some(user) = stream.next().await {
    ///     match user {
    ///         Some(u) => println!("User signed in: {}", u.uid),
    ///         None => println!("User signed out"),
    ///     }
    /// }
    /// # }
    /// ```
    pub fn auth_state_changes(&self) -> Pin<Box<dyn Stream<Item = Option<Arc<User>>> + Send>> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = self.on_auth_state_changed(move |user| {
            let _ = tx.send(user);
        });
        let guard = RemoveOnDrop(Some(listener));

        Box::pin(stream! {
            let _guard = guard;
            while let Some(user) = rx.recv().await {
                yield user;
            }
        })
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("base_url", &self.app.base_url())
            .finish()
    }
}

/// Attach the one store listener shared by every observer of `session`
fn wire_store_listener(store: &AuthStore, session: &Arc<Session>) -> Teardown {
    let weak: Weak<Session> = Arc::downgrade(session);
    let id = store.on_change(move |token, model| {
        let Some(session) = weak.upgrade() else {
            return;
        };
        match model {
            Some(record) => session.publish(Some(Arc::new(User::from_record(record)))),
            None if token.is_empty() => session.publish(None),
            // Token without account record: the caller publishes its own user
            None => {}
        }
    });
    debug!(listener = id, "wired auth store listener");

    let store = store.clone();
    Box::new(move || {
        store.remove_listener(id);
        debug!(listener = id, "detached auth store listener");
    })
}

fn validate_email_password(email: &str, password: &str) -> Result<(), FirebaseError> {
    if email.is_empty() {
        return Err(AuthError::InvalidEmail.into());
    }
    if password.is_empty() {
        return Err(AuthError::InvalidPassword.into());
    }
    Ok(())
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Registration returned by [`Auth::on_auth_state_changed`]
///
/// Not removed on drop: call [`AuthStateListener::remove`] to stop
/// receiving updates.
pub struct AuthStateListener {
    session: Arc<Session>,
    id: ObserverId,
}

impl std::fmt::Debug for AuthStateListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStateListener").field("id", &self.id).finish()
    }
}

impl AuthStateListener {
    /// Detach this observer; the others keep receiving updates
    pub fn remove(self) {
        self.session.observers.remove(self.id);
    }
}

struct RemoveOnDrop(Option<AuthStateListener>);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Some(listener) = self.0.take() {
            listener.remove();
        }
    }
}

/// Get the auth handle of `app`
pub fn get_auth(app: &App) -> Auth {
    Auth::get_auth(app)
}

/// Sign in anonymously
pub async fn sign_in_anonymously(auth: &Auth) -> Result<AuthResult, FirebaseError> {
    auth.sign_in_anonymously().await
}

/// Sign in with a custom token
pub async fn sign_in_with_custom_token(auth: &Auth, token: &str) -> Result<AuthResult, FirebaseError> {
    auth.sign_in_with_custom_token(token).await
}

/// Sign in with email and password
pub async fn sign_in_with_email_and_password(
    auth: &Auth,
    email: &str,
    password: &str,
) -> Result<AuthResult, FirebaseError> {
    auth.sign_in_with_email_and_password(email, password).await
}

/// Create a password account and sign in
pub async fn create_user_with_email_and_password(
    auth: &Auth,
    email: &str,
    password: &str,
) -> Result<AuthResult, FirebaseError> {
    auth.create_user_with_email_and_password(email, password).await
}

/// Register an auth-state observer
pub fn on_auth_state_changed<F>(auth: &Auth, callback: F) -> AuthStateListener
where
    F: Fn(Option<Arc<User>>) + Send + Sync + 'static,
{
    auth.on_auth_state_changed(callback)
}

/// Sign out the current user
pub async fn sign_out(auth: &Auth) -> Result<(), FirebaseError> {
    auth.sign_out().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::pocketbase::test_token;
    use futures::StreamExt;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn local_auth() -> Auth {
        get_auth(&App::initialize(AppConfig::new()))
    }

    /// Observer that records the uid (or `None`) of every state it sees
    fn recorder() -> (Arc<Mutex<Vec<Option<String>>>>, impl Fn(Option<Arc<User>>) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = move |user: Option<Arc<User>>| {
            sink.lock().unwrap().push(user.map(|u| u.uid.clone()));
        };
        (seen, callback)
    }

    fn account(id: &str) -> Record {
        json!({ "id": id, "email": "jane@example.com", "username": "jane" })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_current_user_initially_none() {
        let auth = local_auth();
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_get_auth_shares_session() {
        let app = App::initialize(AppConfig::new());
        let first = get_auth(&app);
        let second = get_auth(&app);

        first.sign_in_anonymously().await.unwrap();

        assert_eq!(
            first.current_user().unwrap().uid,
            second.current_user().unwrap().uid
        );
    }

    #[tokio::test]
    async fn test_sign_in_anonymously_creates_anonymous_user() {
        let auth = local_auth();
        let result = sign_in_anonymously(&auth).await.unwrap();

        assert!(result.user.is_anonymous);
        assert!(result.user.uid.starts_with(ANONYMOUS_UID_PREFIX));
        assert_eq!(result.user.uid.len(), ANONYMOUS_UID_PREFIX.len() + ANONYMOUS_UID_LEN);
        assert!(result.user.uid[ANONYMOUS_UID_PREFIX.len()..]
            .bytes()
            .all(|b| BASE36.contains(&b)));
        assert!(result.additional_user_info.unwrap().is_new_user);
    }

    #[tokio::test]
    async fn test_sign_in_anonymously_is_idempotent() {
        let auth = local_auth();
        let first = auth.sign_in_anonymously().await.unwrap();
        let second = auth.sign_in_anonymously().await.unwrap();

        assert_eq!(first.user.uid, second.user.uid);
        assert!(!second.additional_user_info.unwrap().is_new_user);
    }

    #[tokio::test]
    async fn test_fresh_sessions_get_fresh_anonymous_ids() {
        let first = local_auth().sign_in_anonymously().await.unwrap();
        let second = local_auth().sign_in_anonymously().await.unwrap();
        assert_ne!(first.user.uid, second.user.uid);
    }

    #[tokio::test]
    async fn test_sign_in_anonymously_prefers_valid_store_session() {
        let auth = local_auth();
        auth.store().save(test_token(chrono::Utc::now().timestamp() + 3600), Some(account("u1")));

        let result = auth.sign_in_anonymously().await.unwrap();

        assert_eq!(result.user.uid, "u1");
        assert!(!result.user.is_anonymous);
        assert_eq!(result.user.display_name.as_deref(), Some("jane"));
    }

    #[tokio::test]
    async fn test_expired_store_session_is_ignored() {
        let auth = local_auth();
        auth.store().save(test_token(chrono::Utc::now().timestamp() - 60), Some(account("u1")));

        let result = auth.sign_in_anonymously().await.unwrap();
        assert!(result.user.is_anonymous);
    }

    #[tokio::test]
    async fn test_sign_in_with_custom_token_validates_empty() {
        let auth = local_auth();
        let result = auth.sign_in_with_custom_token("").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidCredential(_)))
        ));
    }

    #[tokio::test]
    async fn test_custom_token_saved_and_user_fabricated() {
        let auth = local_auth();
        let (seen, callback) = recorder();
        let _listener = auth.on_auth_state_changed(callback);

        let result = sign_in_with_custom_token(&auth, "opaque-token").await.unwrap();

        assert!(result.user.uid.starts_with(CUSTOM_UID_PREFIX));
        assert_eq!(result.user.uid.len(), CUSTOM_UID_PREFIX.len() + CUSTOM_UID_LEN);
        assert!(!result.user.is_anonymous);
        assert_eq!(auth.store().token(), "opaque-token");
        assert_eq!(*seen.lock().unwrap(), vec![Some(result.user.uid.clone())]);
    }

    #[tokio::test]
    async fn test_sign_in_validates_email() {
        let auth = local_auth();
        let result = auth.sign_in_with_email_and_password("", "password").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidEmail))));
    }

    #[tokio::test]
    async fn test_sign_in_validates_password() {
        let auth = local_auth();
        let result = auth.sign_in_with_email_and_password("test@example.com", "").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidPassword))));
    }

    #[tokio::test]
    async fn test_create_user_validates_email() {
        let auth = local_auth();
        let result = auth.create_user_with_email_and_password("", "password123").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidEmail))));
    }

    #[tokio::test]
    async fn test_create_user_validates_password() {
        let auth = local_auth();
        let result = auth.create_user_with_email_and_password("new@example.com", "").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidPassword))));
    }

    #[tokio::test]
    async fn test_sign_out_clears_user() {
        let auth = local_auth();
        auth.sign_in_with_custom_token("opaque-token").await.unwrap();
        assert!(auth.current_user().is_some());

        sign_out(&auth).await.unwrap();

        assert!(auth.current_user().is_none());
        assert!(auth.store().token().is_empty());
    }

    #[tokio::test]
    async fn test_observer_called_immediately_with_cached_user() {
        let auth = local_auth();
        let signed_in = auth.sign_in_anonymously().await.unwrap();

        let (seen, callback) = recorder();
        let listener = on_auth_state_changed(&auth, callback);

        assert_eq!(*seen.lock().unwrap(), vec![Some(signed_in.user.uid.clone())]);
        listener.remove();
    }

    #[tokio::test]
    async fn test_observer_not_called_without_user() {
        let auth = local_auth();
        let (seen, callback) = recorder();
        let _listener = auth.on_auth_state_changed(callback);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_without_session_notifies_each_observer_once() {
        let auth = local_auth();
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();
        let _first = auth.on_auth_state_changed(first);
        let _second = auth.on_auth_state_changed(second);

        auth.sign_out().await.unwrap();

        assert_eq!(*first_seen.lock().unwrap(), vec![None]);
        assert_eq!(*second_seen.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_observer_called_immediately_with_store_user() {
        let auth = local_auth();
        auth.store().save(test_token(chrono::Utc::now().timestamp() + 3600), Some(account("u7")));

        let (seen, callback) = recorder();
        let _listener = auth.on_auth_state_changed(callback);

        assert_eq!(*seen.lock().unwrap(), vec![Some("u7".to_string())]);
    }

    #[tokio::test]
    async fn test_single_store_listener_and_single_sign_out_notification() {
        let auth = local_auth();
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();

        let a = auth.on_auth_state_changed(first);
        let b = auth.on_auth_state_changed(second);
        assert_eq!(auth.store().listener_count(), 1);

        let uid = auth.sign_in_anonymously().await.unwrap().user.uid.clone();
        auth.sign_out().await.unwrap();

        let expected = vec![Some(uid), None];
        assert_eq!(*first_seen.lock().unwrap(), expected);
        assert_eq!(*second_seen.lock().unwrap(), expected);

        a.remove();
        assert_eq!(auth.store().listener_count(), 1);
        b.remove();
        assert_eq!(auth.store().listener_count(), 0);
    }

    #[tokio::test]
    async fn test_removing_one_observer_keeps_others() {
        let auth = local_auth();
        let (removed_seen, removed) = recorder();
        let (kept_seen, kept) = recorder();

        let listener = auth.on_auth_state_changed(removed);
        let _kept = auth.on_auth_state_changed(kept);
        listener.remove();

        auth.sign_in_anonymously().await.unwrap();

        assert!(removed_seen.lock().unwrap().is_empty());
        assert_eq!(kept_seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_listener_rewired_after_all_removed() {
        let auth = local_auth();
        let listener = auth.on_auth_state_changed(|_| {});
        listener.remove();
        assert_eq!(auth.store().listener_count(), 0);

        let (seen, callback) = recorder();
        let _listener = auth.on_auth_state_changed(callback);
        assert_eq!(auth.store().listener_count(), 1);

        auth.store().save(test_token(chrono::Utc::now().timestamp() + 3600), Some(account("u9")));
        assert_eq!(*seen.lock().unwrap(), vec![Some("u9".to_string())]);
    }

    #[tokio::test]
    async fn test_auth_state_changes_yields_updates() {
        let auth = local_auth();
        let mut stream = auth.auth_state_changes();

        let uid = auth.sign_in_anonymously().await.unwrap().user.uid.clone();
        let next = stream.next().await.unwrap();
        assert_eq!(next.unwrap().uid, uid);

        auth.sign_out().await.unwrap();
        assert_eq!(stream.next().await, Some(None));
    }

    #[tokio::test]
    async fn test_dropping_stream_detaches_observer() {
        let auth = local_auth();
        let stream = auth.auth_state_changes();
        assert_eq!(auth.store().listener_count(), 1);

        drop(stream);
        assert_eq!(auth.store().listener_count(), 0);
    }

    #[tokio::test]
    async fn test_password_sign_in_maps_record_and_notifies_once() {
        let server = MockServer::start_async().await;
        let token = test_token(chrono::Utc::now().timestamp() + 3600);
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/collections/users/auth-with-password")
                    .json_body(json!({ "identity": "jane@example.com", "password": "hunter22" }));
                then.status(200).json_body(json!({
                    "token": token,
                    "record": { "id": "u42", "email": "jane@example.com", "name": "Jane" }
                }));
            })
            .await;

        let auth = get_auth(&App::initialize(AppConfig::with_pocketbase_url(server.base_url())));
        let (seen, callback) = recorder();
        let _listener = auth.on_auth_state_changed(callback);

        let result = sign_in_with_email_and_password(&auth, "jane@example.com", "hunter22")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.user.uid, "u42");
        assert_eq!(result.user.display_name.as_deref(), Some("Jane"));
        assert_eq!(auth.current_user().unwrap().uid, "u42");
        assert!(auth.store().is_valid());
        assert_eq!(*seen.lock().unwrap(), vec![Some("u42".to_string())]);
    }

    #[tokio::test]
    async fn test_password_sign_in_failure_is_backend_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/collections/users/auth-with-password");
                then.status(400)
                    .json_body(json!({ "code": 400, "message": "Failed to authenticate.", "data": {} }));
            })
            .await;

        let auth = get_auth(&App::initialize(AppConfig::with_pocketbase_url(server.base_url())));
        let err = auth
            .sign_in_with_email_and_password("jane@example.com", "wrong")
            .await
            .unwrap_err();

        match err {
            FirebaseError::Backend(response) => {
                assert_eq!(response.status, 400);
                assert_eq!(response.message, "Failed to authenticate.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_create_user_then_sign_in() {
        let server = MockServer::start_async().await;
        let token = test_token(chrono::Utc::now().timestamp() + 3600);
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/collections/users/records")
                    .json_body(json!({
                        "email": "new@example.com",
                        "password": "password123",
                        "passwordConfirm": "password123"
                    }));
                then.status(200).json_body(json!({ "id": "n1", "email": "new@example.com" }));
            })
            .await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/collections/users/auth-with-password");
                then.status(200).json_body(json!({
                    "token": token,
                    "record": { "id": "n1", "email": "new@example.com" }
                }));
            })
            .await;

        let auth = get_auth(&App::initialize(AppConfig::with_pocketbase_url(server.base_url())));
        let result = auth
            .create_user_with_email_and_password("new@example.com", "password123")
            .await
            .unwrap();

        create.assert_async().await;
        login.assert_async().await;
        assert_eq!(result.user.uid, "n1");
        assert_eq!(result.user.display_name.as_deref(), Some("User"));
        assert!(result.additional_user_info.unwrap().is_new_user);
    }
}
