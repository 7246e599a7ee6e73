//! FirstPromoter client: request building, response parsing and the
//! round-trip that ties them together.
//!
//! # Design
//! `Client` holds the account id, the API key, the base URL and a caller
//! supplied [`Transport`], and carries no mutable state between calls. The
//! sign-up operation is split into `build_track_sign_up`, which produces an
//! `HttpRequest`, and `parse_track_sign_up`, which consumes an `HttpResponse`.
//! `track_sign_up` runs the two around one transport call, racing it against
//! the caller's [`Context`].

use std::fmt;

use http::Method;

use crate::context::Context;
use crate::error::{Error, Result, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{SignUpRequest, SignUpResponse, TrackSignUpInput, TrackSignUpOutput};

pub const DEFAULT_BASE_URL: &str = "https://v2.firstpromoter.com";
pub const TRACK_SIGNUP_PATH: &str = "/api/v2/track/signup";

/// Upper bound on how much of an error body ends up in [`Error::Status`].
pub const MAX_ERROR_BODY: usize = 8 << 10;

pub const ENV_ACCOUNT_ID: &str = "FIRSTPROMOTER_ACCOUNT_ID";
pub const ENV_API_KEY: &str = "FIRSTPROMOTER_API_KEY";
pub const ENV_BASE_URL: &str = "FIRSTPROMOTER_BASE_URL";

/// Client for the FirstPromoter tracking API.
///
/// Safe to share across tasks; concurrent calls are independent as long as
/// the transport allows concurrent use.
#[derive(Clone)]
pub struct Client<T> {
    account_id: String,
    api_key: String,
    base_url: String,
    transport: T,
}

impl<T> Client<T> {
    /// No validation and no network activity happen here.
    pub fn new(account_id: impl Into<String>, api_key: impl Into<String>, transport: T) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport,
        }
    }

    /// Reads credentials from `FIRSTPROMOTER_ACCOUNT_ID` and
    /// `FIRSTPROMOTER_API_KEY`, and an optional `FIRSTPROMOTER_BASE_URL`.
    pub fn from_env(transport: T) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), transport)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, transport: T) -> Result<Self> {
        let account_id = lookup(ENV_ACCOUNT_ID).ok_or(Error::MissingEnv(ENV_ACCOUNT_ID))?;
        let api_key = lookup(ENV_API_KEY).ok_or(Error::MissingEnv(ENV_API_KEY))?;
        let client = Self::new(account_id, api_key, transport);
        Ok(match lookup(ENV_BASE_URL) {
            Some(base_url) => client.with_base_url(&base_url),
            None => client,
        })
    }

    /// Points the client at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_track_sign_up(&self, input: &TrackSignUpInput) -> Result<HttpRequest> {
        let body = serde_json::to_string(&SignUpRequest::from(input)).map_err(Error::Serialization)?;
        Ok(HttpRequest {
            method: Method::POST,
            url: format!("{}{TRACK_SIGNUP_PATH}", self.base_url),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("ACCOUNT-ID".to_string(), self.account_id.clone()),
                ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
            ],
            body: Some(body),
        })
    }

    pub fn parse_track_sign_up(&self, response: HttpResponse) -> Result<TrackSignUpOutput> {
        check_status(&response)?;
        // An empty body means "nothing else to report", not a decode error.
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(TrackSignUpOutput::default());
        }
        let body: SignUpResponse = serde_json::from_slice(&response.body).map_err(Error::Decode)?;
        body.into_output()
    }
}

impl<T: Transport> Client<T> {
    /// Records a sign-up with FirstPromoter.
    ///
    /// Fails with `Error::Transport(TransportError::Context(_))` if `ctx` is
    /// done before a response arrives; nothing is sent when it is already
    /// done. No retries are made.
    #[tracing::instrument(name = "track_sign_up", skip_all, fields(account_id = %self.account_id))]
    pub async fn track_sign_up(
        &self,
        ctx: &Context,
        input: &TrackSignUpInput,
    ) -> Result<TrackSignUpOutput> {
        let request = self.build_track_sign_up(input)?;
        if let Some(reason) = ctx.err() {
            tracing::debug!(%reason, "context done before sending sign-up");
            return Err(TransportError::from(reason).into());
        }

        tracing::debug!(url = %request.url, "sending sign-up");
        let response = tokio::select! {
            biased;
            reason = ctx.done() => {
                tracing::debug!(%reason, "sign-up aborted");
                return Err(TransportError::from(reason).into());
            }
            response = self.transport.execute(request) => response?,
        };

        tracing::debug!(status = %response.status, "received sign-up response");
        self.parse_track_sign_up(response)
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Map non-2xx responses to `Error::Status` with a truncated body.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.status.is_success() {
        return Ok(());
    }
    let end = response.body.len().min(MAX_ERROR_BODY);
    let body = String::from_utf8_lossy(&response.body[..end]).into_owned();
    tracing::warn!(status = %response.status, "sign-up rejected");
    Err(Error::Status {
        status: response.status,
        body,
    })
}
