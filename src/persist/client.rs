//! Async request/response wrapper around the remote document store.
//!
//! The store holds at most one scene document in a fixed slot; `get` returns
//! the document-store list form (a JSON array) and this client reduces it to
//! the one logical document. All three operations may fail with network or
//! server errors, and every such failure is non-fatal to the caller's render
//! loop; retry policy belongs to the caller.

use serde_json::Value;
use thiserror::Error;

use crate::scene::SceneDocument;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Server {
        status: u16,
        message: String,
    },
    #[error("stored scene document is malformed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct PersistenceClient {
    http: reqwest::Client,
    scene_url: String,
}

impl PersistenceClient {
    /// `scene_url` is the full URL of the singleton scene resource,
    /// e.g. `http://127.0.0.1:8081/api/scene`.
    pub fn new(scene_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            scene_url: scene_url.into(),
        }
    }

    /// Fetches the persisted scene document, or `Ok(None)` when the store is
    /// empty. Never returns a partial document.
    pub async fn get(&self) -> Result<Option<SceneDocument>, PersistError> {
        let response = self.http.get(self.scene_url.as_str()).send().await?;
        let response = Self::check_status(response).await?;

        let mut stored: Vec<Value> = response.json().await?;
        let result = match stored.drain(..).next() {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        };
        result
    }

    /// Upserts the one scene document. Idempotent: repeated identical puts
    /// leave the same stored state.
    pub async fn put(&self, document: &SceneDocument) -> Result<(), PersistError> {
        let response = self
            .http
            .put(self.scene_url.as_str())
            .json(document)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Removes the persisted document; a no-op when it is already absent.
    pub async fn delete(&self) -> Result<(), PersistError> {
        let response = self.http.delete(self.scene_url.as_str()).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Turns a non-2xx response into [`PersistError::Server`], pulling the
    /// `{"error": message}` body the server sends alongside failures.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PersistError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("server error")
                .to_string(),
            Err(_) => "server error".to_string(),
        };
        Err(PersistError::Server {
            status: status.as_u16(),
            message,
        })
    }
}
