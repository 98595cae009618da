//! Provisioning hook for obtaining a session id.
//!
//! A client needs a session id before it can send `Init`. Where it comes
//! from is not this crate's business: a lobby service, a link someone
//! shared, a config file. The [`Provisioner`] trait is the seam. It is
//! asked at most once per session; the answer is cached and persisted.
//! [`HttpProvisioner`] asks a relay's pairing endpoint over HTTP.

use std::sync::Arc;

use crate::SessionError;

/// Hands out a session id.
///
/// # Example
///
/// ```rust
/// use boardlink_session::{Provisioner, SessionError};
///
/// /// Every client joins the same table.
/// struct SharedTable;
///
/// impl Provisioner for SharedTable {
///     async fn provision(&self) -> Result<String, SessionError> {
///         Ok("friday-night".to_string())
///     }
/// }
/// ```
pub trait Provisioner: Send + Sync + 'static {
    /// Returns a session id to join.
    fn provision(
        &self,
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send;
}

/// Always returns the same, preconfigured session id.
#[derive(Debug, Clone)]
pub struct FixedProvisioner(pub String);

impl FixedProvisioner {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Provisioner for FixedProvisioner {
    async fn provision(&self) -> Result<String, SessionError> {
        if self.0.is_empty() {
            return Err(SessionError::ProvisionFailed(
                "no session id configured".into(),
            ));
        }
        Ok(self.0.clone())
    }
}

/// Asks a relay's pairing endpoint for a session id.
///
/// The endpoint answers `GET` with the id as plain text. Two clients asking
/// back to back are handed the same id and end up at the same table.
#[derive(Debug, Clone)]
pub struct HttpProvisioner {
    url: String,
    client: reqwest::Client,
}

impl HttpProvisioner {
    /// `url` is the full endpoint, e.g. `http://127.0.0.1:8001/game`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Provisioner for HttpProvisioner {
    async fn provision(&self) -> Result<String, SessionError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let id = body.trim();
        if id.is_empty() {
            return Err(SessionError::ProvisionFailed(format!(
                "{} answered with an empty id",
                self.url
            )));
        }
        tracing::debug!(url = %self.url, session = %id, "session id provisioned");
        Ok(id.to_string())
    }
}

impl<P: Provisioner> Provisioner for Arc<P> {
    async fn provision(&self) -> Result<String, SessionError> {
        P::provision(self).await
    }
}
