//! Authentication types

use crate::pocketbase::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Display name used when the account record has neither `name` nor
/// `username`
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Signed-in user
///
/// Either built from a PocketBase account record ([`User::from_record`]) or
/// fabricated locally by anonymous / custom-token sign-in. Use `Arc<User>`
/// for shared ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable user identifier
    pub uid: String,

    /// Email address (if available)
    pub email: Option<String>,

    /// Display name (if available)
    pub display_name: Option<String>,

    /// Whether this is an anonymous user
    pub is_anonymous: bool,

    /// Account record fields, verbatim (empty for fabricated users)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub record: Record,
}

impl User {
    /// Map a PocketBase account record to a user view
    ///
    /// - `uid` from `id`
    /// - `email` from `email`
    /// - `display_name` from `name`, then `username`, then `"User"`
    /// - `is_anonymous` is `false`
    ///
    /// Record fields literally named `uid`, `email`, `displayName` or
    /// `isAnonymous` take precedence over the computed values.
    pub fn from_record(record: &Record) -> Self {
        let display_name = non_empty_str(record, "name")
            .or_else(|| non_empty_str(record, "username"))
            .unwrap_or(DEFAULT_DISPLAY_NAME);

        let mut user = User {
            uid: non_empty_str(record, "id").unwrap_or_default().to_string(),
            email: record.get("email").and_then(Value::as_str).map(str::to_string),
            display_name: Some(display_name.to_string()),
            is_anonymous: false,
            record: record.clone(),
        };

        if let Some(uid) = record.get("uid").and_then(Value::as_str) {
            user.uid = uid.to_string();
        }
        if let Some(name) = record.get("displayName").and_then(Value::as_str) {
            user.display_name = Some(name.to_string());
        }
        if let Some(flag) = record.get("isAnonymous").and_then(Value::as_bool) {
            user.is_anonymous = flag;
        }
        user
    }

    /// Locally fabricated user without an account record
    pub(crate) fn fabricated(uid: String, is_anonymous: bool) -> Self {
        User {
            uid,
            email: None,
            display_name: None,
            is_anonymous,
            record: Record::new(),
        }
    }

    /// Raw account record field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }
}

fn non_empty_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Result of a sign-in operation
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Signed-in user
    pub user: Arc<User>,

    /// Additional user info
    pub additional_user_info: Option<AdditionalUserInfo>,
}

/// Additional information about the sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalUserInfo {
    /// Provider ID (`anonymous`, `custom`, `password`)
    pub provider_id: String,

    /// Whether this sign-in created the user
    pub is_new_user: bool,
}

impl AdditionalUserInfo {
    pub(crate) fn new(provider_id: &str, is_new_user: bool) -> Option<Self> {
        Some(Self {
            provider_id: provider_id.to_string(),
            is_new_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_record_maps_fields() {
        let user = User::from_record(&record(json!({
            "id": "u1",
            "email": "jane@example.com",
            "name": "Jane",
            "username": "jane_d",
            "verified": true
        })));

        assert_eq!(user.uid, "u1");
        assert_eq!(user.email.as_deref(), Some("jane@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("Jane"));
        assert!(!user.is_anonymous);
        assert_eq!(user.get("verified"), Some(&json!(true)));
        assert_eq!(user.get("username"), Some(&json!("jane_d")));
    }

    #[test]
    fn test_display_name_fallback_chain() {
        let by_username = User::from_record(&record(json!({ "id": "u1", "name": "", "username": "jd" })));
        assert_eq!(by_username.display_name.as_deref(), Some("jd"));

        let default = User::from_record(&record(json!({ "id": "u1" })));
        assert_eq!(default.display_name.as_deref(), Some(DEFAULT_DISPLAY_NAME));
        assert!(default.email.is_none());
    }

    #[test]
    fn test_record_fields_take_precedence() {
        let user = User::from_record(&record(json!({
            "id": "u1",
            "uid": "legacy-uid",
            "displayName": "Legacy",
            "isAnonymous": true
        })));

        assert_eq!(user.uid, "legacy-uid");
        assert_eq!(user.display_name.as_deref(), Some("Legacy"));
        assert!(user.is_anonymous);
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User::fabricated("anon-abc".to_string(), true);
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["uid"], "anon-abc");
        assert_eq!(value["isAnonymous"], true);
        assert!(value.get("record").is_none());
    }
}
