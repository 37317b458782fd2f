//! Remote mirror of the full solution collection.
//!
//! The mirror is best-effort. Transport failures and non-2xx statuses surface as
//! `KbError::RemoteUnavailable`; a reachable server whose body does not decode gives
//! `KbError::InvalidRemoteData`. The mutation service turns either into an informational
//! outcome rather than an error.

use crate::solution::Solution;
use crate::{KbError, KbResult};
use api_shared::{paths, SaveRes};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// The flat-file endpoint the full collection is mirrored to.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Reads the collection currently stored remotely, entry by entry as stored.
    ///
    /// Entries are not validated; the remote file may hold records older clients wrote.
    async fn fetch(&self) -> KbResult<Vec<Value>>;

    /// Overwrites the remote collection with `full`.
    async fn replace(&self, full: &[Solution]) -> KbResult<SaveRes>;

    /// Appends one solution to the remote collection.
    async fn append(&self, solution: &Solution) -> KbResult<SaveRes>;
}

#[async_trait]
impl<M: RemoteMirror + ?Sized> RemoteMirror for Box<M> {
    async fn fetch(&self) -> KbResult<Vec<Value>> {
        (**self).fetch().await
    }

    async fn replace(&self, full: &[Solution]) -> KbResult<SaveRes> {
        (**self).replace(full).await
    }

    async fn append(&self, solution: &Solution) -> KbResult<SaveRes> {
        (**self).append(solution).await
    }
}

/// Mirror talking to the flat-file HTTP service.
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMirror {
    /// Creates a client for the service at `base_url` (e.g. `http://localhost:3001`).
    ///
    /// # Errors
    ///
    /// Returns `KbError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> KbResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KbError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> KbResult<T> {
        let response = response.map_err(|e| unavailable(path, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(KbError::RemoteUnavailable(format!(
                "{path} returned {status}"
            )));
        }
        let body = response.bytes().await.map_err(|e| unavailable(path, e))?;
        serde_json::from_slice(&body)
            .map_err(|e| KbError::InvalidRemoteData(format!("{path}: {e}")))
    }
}

fn unavailable(path: &str, error: reqwest::Error) -> KbError {
    KbError::RemoteUnavailable(format!("{path}: {error}"))
}

#[async_trait]
impl RemoteMirror for HttpMirror {
    async fn fetch(&self) -> KbResult<Vec<Value>> {
        let response = self.client.get(self.url(paths::BOT)).send().await;
        self.read_json(paths::BOT, response).await
    }

    async fn replace(&self, full: &[Solution]) -> KbResult<SaveRes> {
        let response = self
            .client
            .post(self.url(paths::BOT))
            .json(full)
            .send()
            .await;
        self.read_json(paths::BOT, response).await
    }

    async fn append(&self, solution: &Solution) -> KbResult<SaveRes> {
        let response = self
            .client
            .post(self.url(paths::BOT_ADD))
            .json(solution)
            .send()
            .await;
        self.read_json(paths::BOT_ADD, response).await
    }
}

/// Mirror used when no remote is configured; every call is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMirror;

#[async_trait]
impl RemoteMirror for DisabledMirror {
    async fn fetch(&self) -> KbResult<Vec<Value>> {
        Err(disabled())
    }

    async fn replace(&self, _full: &[Solution]) -> KbResult<SaveRes> {
        Err(disabled())
    }

    async fn append(&self, _solution: &Solution) -> KbResult<SaveRes> {
        Err(disabled())
    }
}

fn disabled() -> KbError {
    KbError::RemoteUnavailable("remote mirror disabled".into())
}
