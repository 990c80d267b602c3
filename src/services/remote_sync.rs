//! Remote mirror over HTTP.
//!
//! `PUT {base}/sync/{identity}` with the whole snapshot as JSON. Any 2xx
//! counts as success.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::services::persistence::RemoteMirror;
use crate::types::errors::SyncError;
use crate::types::session::Snapshot;

pub struct HttpRemoteMirror {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRemoteMirror {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Target url for `identity`. The identity is percent-encoded as one path segment.
    pub fn document_url(&self, identity: &str) -> String {
        format!("{}/sync/{}", self.base_url, urlencoding::encode(identity))
    }

    pub async fn put_snapshot(&self, identity: &str, snapshot: &Snapshot) -> Result<(), SyncError> {
        let target = self.document_url(identity);
        debug!(url = %target, "Mirroring snapshot");

        let response = self
            .http
            .put(&target)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }
        Ok(())
    }
}

impl RemoteMirror for HttpRemoteMirror {
    fn mirror<'a>(&'a self, identity: &'a str, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(self.put_snapshot(identity, snapshot))
    }
}
