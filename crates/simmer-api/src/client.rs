// Cloud HTTP client
//
// Wraps `reqwest::Client` with bearer injection, the single forced
// refresh on 401/403, and response decoding. Endpoint groups (devices,
// cooking, sessions) are implemented as inherent methods in separate
// files to keep this module focused on transport mechanics.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Session;
use crate::error::Error;
use crate::models::ProgramState;
use crate::transport::TransportConfig;

/// Production base URL of the KitchenOS cloud.
pub const DEFAULT_API_BASE: &str = "https://api.fresco-kitchenos.com";

/// Versioned media type the read endpoints expect. The execute endpoint
/// dislikes the version parameter, so command POSTs send plain JSON.
pub(crate) const ACCEPT_VERSIONED: &str = "application/x.default+json;version=2";

/// Authenticated client for the KitchenOS cloud.
///
/// Holds the HTTP client, the account session, and the client's own
/// per-device program-state mirror. Commands for different devices may
/// run concurrently; only token refreshes serialize (inside [`Session`]).
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
    timeout: Duration,
    /// Last-known program state per device id, updated by successful
    /// commands and by status polls.
    programs: RwLock<HashMap<String, ProgramState>>,
}

impl CloudClient {
    /// Create a client against `base_url` (use [`DEFAULT_API_BASE`] for
    /// the production cloud).
    pub fn new(base_url: Url, session: Session, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            session: Arc::new(session),
            timeout: transport.timeout,
            programs: RwLock::new(HashMap::new()),
        })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account session (for callers that only need a token).
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The client's current understanding of a device's program state.
    pub fn program_state(&self, device_id: &str) -> ProgramState {
        self.programs
            .read()
            .expect("program state lock poisoned")
            .get(device_id)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn note_state(&self, device_id: &str, state: ProgramState) {
        self.programs
            .write()
            .expect("program state lock poisoned")
            .insert(device_id.to_owned(), state);
    }

    // ── URL builder ──────────────────────────────────────────────────

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authorized request, forcing exactly one token refresh and
    /// one retry if the cloud answers 401/403. A second rejection is an
    /// authentication failure, not something more retries can fix.
    pub(crate) async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, Error>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.session.bearer_token().await?;
        let resp = build(&self.http, &token)
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        let status = resp.status();
        if status != reqwest::StatusCode::UNAUTHORIZED && status != reqwest::StatusCode::FORBIDDEN {
            return Ok(resp);
        }

        debug!(%status, "cloud rejected bearer token, forcing one refresh");
        let fresh = self.session.refresh_after_rejection(&token).await?;
        let retry = build(&self.http, &fresh)
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        let retry_status = retry.status();
        if retry_status == reqwest::StatusCode::UNAUTHORIZED
            || retry_status == reqwest::StatusCode::FORBIDDEN
        {
            warn!(%retry_status, "cloud rejected a freshly refreshed token");
            return Err(Error::Authentication {
                message: format!("cloud rejected the renewed token (HTTP {retry_status})"),
            });
        }
        Ok(retry)
    }

    /// Authorized GET returning decoded JSON. Non-2xx responses surface
    /// as [`Error::Command`] with the body verbatim; callers with a more
    /// specific taxonomy (device lookup) remap it.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");

        let resp = self
            .send_authorized(|http, token| {
                http.get(url.clone())
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, ACCEPT_VERSIONED)
            })
            .await?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        if !status.is_success() {
            return Err(Error::Command {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
