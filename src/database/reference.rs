use super::{ensure_success, normalize, DatabaseError, FirebaseDatabase};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// A node in the Realtime Database.
#[derive(Clone)]
pub struct DatabaseReference<'a> {
    database: &'a FirebaseDatabase,
    path: String,
}

impl<'a> DatabaseReference<'a> {
    pub(crate) fn new(database: &'a FirebaseDatabase, path: String) -> Self {
        Self { database, path }
    }

    /// The path from the root, without leading or trailing slashes. Empty at the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last path segment, `None` at the root.
    pub fn key(&self) -> Option<&str> {
        if self.path.is_empty() {
            return None;
        }
        Some(self.path.rsplit_once('/').map_or(self.path.as_str(), |(_, key)| key))
    }

    pub fn child(&self, path: &str) -> DatabaseReference<'a> {
        let path = normalize(&format!("{}/{}", self.path, path));
        DatabaseReference::new(self.database, path)
    }

    /// The parent node, `None` at the root.
    pub fn parent(&self) -> Option<DatabaseReference<'a>> {
        if self.path.is_empty() {
            return None;
        }
        let parent = self
            .path
            .rsplit_once('/')
            .map_or(String::new(), |(parent, _)| parent.to_string());
        Some(DatabaseReference::new(self.database, parent))
    }

    pub fn root(&self) -> DatabaseReference<'a> {
        self.database.root()
    }

    /// Reads the node as pretty-printed JSON. A missing node reads as `null`.
    pub async fn read(&self) -> Result<String, DatabaseError> {
        let mut query = self.database.auth_query();
        query.push(("print", "pretty".to_string()));

        let response = self
            .database
            .client()
            .get(self.json_url()?)
            .query(&query)
            .send()
            .await?;

        let response = ensure_success(response, "Read from database failed").await?;
        Ok(response.text().await?)
    }

    /// Reads the node and deserializes it into `T`. Returns `Ok(None)` for a missing node.
    pub async fn read_as<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        let body = self.read().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Replaces the node with `value`.
    pub async fn write<T: Serialize>(&self, value: &T) -> Result<(), DatabaseError> {
        let body = serde_json::to_vec(value)?;
        self.put(body).await
    }

    /// Replaces the node with a JSON document given as text.
    ///
    /// The text is checked to be valid JSON before anything is sent.
    pub async fn write_raw(&self, json: &str) -> Result<(), DatabaseError> {
        serde_json::from_str::<serde::de::IgnoredAny>(json)?;
        self.put(json.as_bytes().to_vec()).await
    }

    /// Merges the children of `value` into the node, leaving other children alone.
    pub async fn update<T: Serialize>(&self, value: &T) -> Result<(), DatabaseError> {
        let response = self
            .database
            .client()
            .patch(self.json_url()?)
            .query(&self.database.auth_query())
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?)
            .send()
            .await?;

        ensure_success(response, "Update database failed").await?;
        Ok(())
    }

    /// Appends `value` under a server-generated key and returns that key.
    pub async fn push<T: Serialize>(&self, value: &T) -> Result<String, DatabaseError> {
        let response = self
            .database
            .client()
            .post(self.json_url()?)
            .query(&self.database.auth_query())
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?)
            .send()
            .await?;

        let response = ensure_success(response, "Push to database failed").await?;
        let pushed: PushResponse = response.json().await?;
        log::debug!("pushed {}/{}", self.path, pushed.name);
        Ok(pushed.name)
    }

    pub async fn delete(&self) -> Result<(), DatabaseError> {
        let response = self
            .database
            .client()
            .delete(self.json_url()?)
            .query(&self.database.auth_query())
            .send()
            .await?;

        ensure_success(response, "Delete from database failed").await?;
        Ok(())
    }

    async fn put(&self, body: Vec<u8>) -> Result<(), DatabaseError> {
        let response = self
            .database
            .client()
            .put(self.json_url()?)
            .query(&self.database.auth_query())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        ensure_success(response, "Write to database failed").await?;
        Ok(())
    }

    /// `{root}/{path}.json`, each segment percent-encoded.
    fn json_url(&self) -> Result<Url, DatabaseError> {
        let base = self.database.url();
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DatabaseError::InvalidUrl(base.to_string()))?;
            segments.pop_if_empty();

            let mut parts: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
            match parts.pop() {
                Some(last) => {
                    segments.extend(parts);
                    segments.push(&format!("{}.json", last));
                }
                None => {
                    segments.push(".json");
                }
            }
        }
        Ok(url)
    }
}

impl fmt::Display for DatabaseReference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.database.url(), self.path)
    }
}
