//! Per-collection record API

use super::client::PocketBase;
use super::realtime::RealtimeSubscription;
use super::Record;
use crate::error::FirebaseError;
use reqwest::Method;
use serde::Deserialize;

/// Page size used by [`RecordService::get_full_list`]
pub const FULL_LIST_BATCH: u32 = 500;

/// One page of records
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    /// 1-based page number
    pub page: u32,
    /// Requested page size
    pub per_page: u32,
    /// Total matching records (`-1` when the count was skipped)
    #[serde(default)]
    pub total_items: i64,
    /// Total pages (`-1` when the count was skipped)
    #[serde(default)]
    pub total_pages: i64,
    /// Records on this page
    pub items: Vec<Record>,
}

/// Response of a password authentication
#[derive(Debug, Clone, Deserialize)]
pub struct RecordAuthResponse {
    /// Issued auth token
    pub token: String,
    /// Authenticated account record
    pub record: Record,
}

/// Record operations addressed to one collection
#[derive(Clone, Debug)]
pub struct RecordService {
    client: PocketBase,
    collection: String,
}

impl RecordService {
    pub(crate) fn new(client: PocketBase, collection: String) -> Self {
        Self { client, collection }
    }

    /// Collection name or id
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Fetch one page of records
    pub async fn get_list(&self, page: u32, per_page: u32) -> Result<ListResult, FirebaseError> {
        let url = self.client.url(&["api", "collections", &self.collection, "records"])?;
        let request = self.client.request(Method::GET, url).query(&[
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
            ("skipTotal", "1".to_string()),
        ]);
        self.client.send_json(request).await
    }

    /// Fetch every record of the collection, page by page
    pub async fn get_full_list(&self) -> Result<Vec<Record>, FirebaseError> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let list = self.get_list(page, FULL_LIST_BATCH).await?;
            let fetched = list.items.len();
            records.extend(list.items);
            if fetched < FULL_LIST_BATCH as usize {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    /// Create a record
    pub async fn create(&self, body: &Record) -> Result<Record, FirebaseError> {
        let url = self.client.url(&["api", "collections", &self.collection, "records"])?;
        let request = self.client.request(Method::POST, url).json(body);
        self.client.send_json(request).await
    }

    /// Patch a record
    pub async fn update(&self, id: &str, body: &Record) -> Result<Record, FirebaseError> {
        let url = self.client.url(&["api", "collections", &self.collection, "records", id])?;
        let request = self.client.request(Method::PATCH, url).json(body);
        self.client.send_json(request).await
    }

    /// Delete a record
    pub async fn delete(&self, id: &str) -> Result<(), FirebaseError> {
        let url = self.client.url(&["api", "collections", &self.collection, "records", id])?;
        let request = self.client.request(Method::DELETE, url);
        self.client.send_empty(request).await
    }

    /// Authenticate against an auth collection and save the result in the
    /// client's auth store
    pub async fn auth_with_password(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<RecordAuthResponse, FirebaseError> {
        let url = self.client.url(&["api", "collections", &self.collection, "auth-with-password"])?;
        let request = self.client.request(Method::POST, url).json(&serde_json::json!({
            "identity": identity,
            "password": password,
        }));
        let response: RecordAuthResponse = self.client.send_json(request).await?;

        self.client
            .auth_store()
            .save(response.token.clone(), Some(response.record.clone()));
        Ok(response)
    }

    /// Subscribe to realtime changes: `"*"` for the whole collection or a
    /// record id
    pub async fn subscribe(&self, topic: &str) -> Result<RealtimeSubscription, FirebaseError> {
        let topic = format!("{}/{}", self.collection, topic);
        self.client.realtime().subscribe(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn records(count: usize, offset: usize) -> Vec<serde_json::Value> {
        (0..count)
            .map(|i| json!({ "id": format!("rec{}", i + offset), "collectionName": "todos" }))
            .collect()
    }

    #[tokio::test]
    async fn test_get_full_list_pages_until_short_page() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/collections/todos/records")
                    .query_param("page", "1")
                    .query_param("perPage", "500");
                then.status(200).json_body(json!({
                    "page": 1, "perPage": 500, "totalItems": -1, "totalPages": -1,
                    "items": records(500, 0)
                }));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/collections/todos/records")
                    .query_param("page", "2");
                then.status(200).json_body(json!({
                    "page": 2, "perPage": 500, "totalItems": -1, "totalPages": -1,
                    "items": records(3, 500)
                }));
            })
            .await;

        let pb = PocketBase::new(server.base_url());
        let all = pb.collection("todos").get_full_list().await.unwrap();

        assert_eq!(all.len(), 503);
        assert_eq!(all[502]["id"], "rec502");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_sends_body_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/collections/todos/records")
                    .header("authorization", "secret-token")
                    .json_body(json!({ "text": "milk" }));
                then.status(200).json_body(json!({ "id": "abc", "text": "milk" }));
            })
            .await;

        let pb = PocketBase::new(server.base_url());
        pb.auth_store().save("secret-token", None);

        let body = json!({ "text": "milk" }).as_object().cloned().unwrap();
        let created = pb.collection("todos").create(&body).await.unwrap();

        assert_eq!(created["id"], "abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_and_delete_address_record() {
        let server = MockServer::start_async().await;
        let update = server
            .mock_async(|when, then| {
                when.method(PATCH).path("/api/collections/todos/records/abc");
                then.status(200).json_body(json!({ "id": "abc", "done": true }));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/collections/todos/records/abc");
                then.status(204);
            })
            .await;

        let todos = PocketBase::new(server.base_url()).collection("todos");
        let body = json!({ "done": true }).as_object().cloned().unwrap();
        todos.update("abc", &body).await.unwrap();
        todos.delete("abc").await.unwrap();

        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_with_password_saves_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/collections/users/auth-with-password")
                    .json_body(json!({ "identity": "a@b.c", "password": "pw" }));
                then.status(200).json_body(json!({
                    "token": "jwt-token",
                    "record": { "id": "u1", "email": "a@b.c" }
                }));
            })
            .await;

        let pb = PocketBase::new(server.base_url());
        let response = pb.collection("users").auth_with_password("a@b.c", "pw").await.unwrap();

        assert_eq!(response.token, "jwt-token");
        assert_eq!(pb.auth_store().token(), "jwt-token");
        assert_eq!(pb.auth_store().model().unwrap()["id"], "u1");
    }
}
