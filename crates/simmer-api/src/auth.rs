// Authentication and session-token management.
//
// The KitchenOS cloud fronts an AWS Cognito user pool: password logins
// and token renewals both go through the Cognito `InitiateAuth` call,
// and every other endpoint takes the resulting access token as a
// bearer. A captured app token satisfies the same contract but has no
// renewal path.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Cognito region of the vendor's user pool.
pub const DEFAULT_REGION: &str = "us-east-2";

/// App client id of the vendor's Cognito user pool (from app capture).
pub const DEFAULT_CLIENT_ID: &str = "5qucjsjb9i1ahnddonctmp9hba";

/// Tokens within this margin of expiry are refreshed proactively, so a
/// token handed to a caller cannot expire mid-request.
const EXPIRY_MARGIN_SECS: i64 = 60;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";

/// Credentials for authenticating with the KitchenOS cloud.
///
/// Both variants satisfy the same [`Session::bearer_token`] contract;
/// which one is used is a configuration choice made at setup time.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password login through the vendor's Cognito user pool.
    Account {
        email: String,
        password: SecretString,
        client_id: String,
        region: String,
    },

    /// Bearer token captured from the vendor app. Used as-is until the
    /// cloud rejects it; there is no renewal path.
    CapturedToken { token: SecretString },
}

impl Credentials {
    /// Account credentials against the vendor's production user pool.
    pub fn account(email: impl Into<String>, password: SecretString) -> Self {
        Self::Account {
            email: email.into(),
            password,
            client_id: DEFAULT_CLIENT_ID.into(),
            region: DEFAULT_REGION.into(),
        }
    }
}

/// A bearer token plus its expiry watermark.
#[derive(Debug, Clone)]
struct SessionToken {
    bearer: SecretString,
    /// `None` for captured tokens, whose lifetime the client cannot know.
    expires_at: Option<DateTime<Utc>>,
    /// Cognito refresh token, when the login flow returned one.
    refresh: Option<SecretString>,
}

impl SessionToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + chrono::TimeDelta::seconds(EXPIRY_MARGIN_SECS) < expires_at,
            None => true,
        }
    }
}

/// The single logical session for a configured account.
///
/// Owns the cached token and serializes every refresh behind one async
/// mutex: concurrent callers during a refresh wait for the in-flight
/// login and reuse its result instead of triggering duplicate logins.
pub struct Session {
    http: reqwest::Client,
    auth_url: Url,
    credentials: Credentials,
    timeout: Duration,
    token: Mutex<Option<SessionToken>>,
}

impl Session {
    /// Create a session for the given credentials.
    ///
    /// For [`Credentials::Account`] the auth endpoint is derived from
    /// the configured region; override it with
    /// [`with_auth_url`](Self::with_auth_url) for tests.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let auth_url = match &credentials {
            Credentials::Account { region, .. } => {
                Url::parse(&format!("https://cognito-idp.{region}.amazonaws.com/"))?
            }
            // Never contacted for captured tokens; any valid URL will do.
            Credentials::CapturedToken { .. } => Url::parse("https://localhost/")?,
        };
        Ok(Self {
            http: transport.build_client()?,
            auth_url,
            credentials,
            timeout: transport.timeout,
            token: Mutex::new(None),
        })
    }

    /// Point the auth flow at a different endpoint (tests).
    pub fn with_auth_url(mut self, auth_url: Url) -> Self {
        self.auth_url = auth_url;
        self
    }

    /// Return a bearer token whose expiry is strictly in the future,
    /// logging in first if the cache is empty or stale.
    pub async fn bearer_token(&self) -> Result<String, Error> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.bearer.expose_secret().to_owned());
            }
            debug!("cached token is at or past its expiry margin, refreshing");
        }
        let token = self.obtain(guard.take()).await?;
        let bearer = token.bearer.expose_secret().to_owned();
        *guard = Some(token);
        Ok(bearer)
    }

    /// Forced refresh after the cloud rejected `stale` with 401/403.
    ///
    /// Serialized with every other refresh; if another caller already
    /// replaced the rejected token, its result is reused instead of
    /// performing a second login.
    pub(crate) async fn refresh_after_rejection(&self, stale: &str) -> Result<String, Error> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.bearer.expose_secret() != stale {
                return Ok(token.bearer.expose_secret().to_owned());
            }
        }
        if matches!(self.credentials, Credentials::CapturedToken { .. }) {
            *guard = None;
            return Err(Error::Authentication {
                message: "the captured token was rejected by the cloud; capture a new one".into(),
            });
        }
        let token = self.obtain(guard.take()).await?;
        let bearer = token.bearer.expose_secret().to_owned();
        *guard = Some(token);
        Ok(bearer)
    }

    /// Obtain a token: pass-through for captured tokens, Cognito login
    /// for accounts. Prefers the refresh-token flow when the previous
    /// token carried one, falling back to a password login if the
    /// refresh token itself is rejected.
    async fn obtain(&self, previous: Option<SessionToken>) -> Result<SessionToken, Error> {
        let (email, password, client_id) = match &self.credentials {
            Credentials::CapturedToken { token } => {
                return Ok(SessionToken {
                    bearer: token.clone(),
                    expires_at: None,
                    refresh: None,
                });
            }
            Credentials::Account {
                email,
                password,
                client_id,
                ..
            } => (email, password, client_id),
        };

        if let Some(refresh) = previous.and_then(|t| t.refresh) {
            let params = HashMap::from([("REFRESH_TOKEN", refresh.expose_secret().to_owned())]);
            match self
                .initiate_auth("REFRESH_TOKEN_AUTH", client_id, params)
                .await
            {
                Ok(mut token) => {
                    // Cognito does not rotate refresh tokens on this flow.
                    token.refresh = Some(refresh);
                    return Ok(token);
                }
                Err(Error::Authentication { message }) => {
                    debug!(%message, "refresh token rejected, falling back to password login");
                }
                Err(other) => return Err(other),
            }
        }

        let params = HashMap::from([
            ("USERNAME", email.clone()),
            ("PASSWORD", password.expose_secret().to_owned()),
        ]);
        self.initiate_auth("USER_PASSWORD_AUTH", client_id, params)
            .await
    }

    /// One Cognito `InitiateAuth` round trip.
    async fn initiate_auth(
        &self,
        flow: &str,
        client_id: &str,
        parameters: HashMap<&str, String>,
    ) -> Result<SessionToken, Error> {
        debug!(flow, url = %self.auth_url, "initiating auth");

        let body = json!({
            "AuthFlow": flow,
            "ClientId": client_id,
            "AuthParameters": parameters,
        });

        let resp = self
            .http
            .post(self.auth_url.clone())
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        if !status.is_success() {
            // Cognito reports rejections as `{"__type": "...Exception", "message": "..."}`.
            let detail: CognitoError = serde_json::from_str(&text).unwrap_or_default();
            let message = match (detail.kind, detail.message) {
                (Some(kind), Some(msg)) => format!("{kind}: {msg}"),
                (_, Some(msg)) => msg,
                (Some(kind), None) => kind,
                (None, None) => format!("login failed (HTTP {status})"),
            };
            warn!(%status, "cloud rejected {flow} attempt");
            return Err(Error::Authentication { message });
        }

        let parsed: InitiateAuthResponse = serde_json::from_str(&text).map_err(|e| {
            let preview = &text[..text.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: text.clone(),
            }
        })?;

        let result = parsed.result.ok_or_else(|| Error::Authentication {
            message: "auth response carried no AuthenticationResult (challenge flow?)".into(),
        })?;

        let expires_at = Utc::now() + chrono::TimeDelta::seconds(result.expires_in);
        debug!(%expires_at, "obtained access token");

        Ok(SessionToken {
            bearer: SecretString::from(result.access_token),
            expires_at: Some(expires_at),
            refresh: result.refresh_token.map(SecretString::from),
        })
    }
}

// ── Cognito wire shapes ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "AccessToken")]
    access_token: String,
    #[serde(rename = "ExpiresIn")]
    expires_in: i64,
    #[serde(rename = "RefreshToken", default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CognitoError {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
}
