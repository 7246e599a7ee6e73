use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TRACK_SIGNUP_PATH: &str = "/api/v2/track/signup";

/// Credentials and referral ids the mock accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub account_id: String,
    pub api_key: String,
    pub ref_ids: Vec<String>,
    /// Sleep this long before answering each sign-up.
    pub delay: Option<Duration>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            account_id: "acc_test".to_string(),
            api_key: "key_test".to_string(),
            ref_ids: vec!["alice".to_string()],
            delay: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub uid: Option<String>,
    pub tid: Option<String>,
    pub ref_id: Option<String>,
    pub ip: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub skip_email_notification: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Referral {
    pub id: String,
    pub email: Option<String>,
    pub uid: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignUpEvent {
    pub id: i64,
    pub etype: String,
    pub sale_amount: Option<i64>,
    pub original_sale_amount: Option<i64>,
    pub original_sale_currency: Option<String>,
    pub event_id: Option<String>,
    pub plan_id: Option<String>,
    pub billing_period: Option<String>,
    pub created_at: String,
    pub referral: Referral,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A sign-up the mock accepted, as it arrived on the wire.
#[derive(Clone, Debug)]
pub struct ReceivedSignUp {
    pub account_id: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    referrals: HashMap<String, Referral>,
    received: Vec<ReceivedSignUp>,
}

#[derive(Clone)]
pub struct MockState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Every accepted sign-up, oldest first.
    pub async fn received(&self) -> Vec<ReceivedSignUp> {
        self.store.read().await.received.clone()
    }
}

type Rejection = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, message: &str) -> Rejection {
    tracing::info!(%status, reason = message, "rejecting sign-up");
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn app(config: MockConfig) -> Router {
    router(MockState::new(config))
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route(TRACK_SIGNUP_PATH, post(track_signup))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

/// Serves an existing state, so callers can inspect what arrived.
pub async fn serve(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn track_signup(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<SignUpEvent>), Rejection> {
    if let Some(delay) = state.config.delay {
        tokio::time::sleep(delay).await;
    }

    let account_id = header(&headers, "account-id");
    let authorization = header(&headers, "authorization");
    let expected_auth = format!("Bearer {}", state.config.api_key);
    if account_id.as_deref() != Some(state.config.account_id.as_str())
        || authorization.as_deref() != Some(expected_auth.as_str())
    {
        return Err(reject(StatusCode::UNAUTHORIZED, "unauthorized"));
    }

    let input: SignUpRequest = serde_json::from_value(raw.clone())
        .map_err(|_| reject(StatusCode::UNPROCESSABLE_ENTITY, "malformed sign-up"))?;
    if input.uid.is_none() && input.email.is_none() {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "uid or email is required"));
    }
    if input.tid.is_none() && input.ref_id.is_none() {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "tid or ref_id is required"));
    }
    if let Some(ref_id) = &input.ref_id {
        if !state.config.ref_ids.contains(ref_id) {
            return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "invalid ref_id"));
        }
    }

    let mut store = state.store.write().await;
    store.next_id += 1;
    let id = store.next_id;

    let lead_key = input
        .uid
        .clone()
        .or_else(|| input.email.clone())
        .unwrap_or_default();
    let referral = store
        .referrals
        .entry(lead_key)
        .or_insert_with(|| Referral {
            id: Uuid::new_v4().to_string(),
            email: input.email.clone(),
            uid: input.uid.clone(),
        })
        .clone();

    store.received.push(ReceivedSignUp {
        account_id,
        authorization,
        content_type: header(&headers, "content-type"),
        body: raw,
    });

    let created_at = input.created_at.unwrap_or_else(Utc::now);
    tracing::info!(id, referral = %referral.id, "accepted sign-up");

    Ok((
        StatusCode::CREATED,
        Json(SignUpEvent {
            id,
            etype: "signup".to_string(),
            sale_amount: None,
            original_sale_amount: None,
            original_sale_currency: None,
            event_id: None,
            plan_id: None,
            billing_period: None,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            referral,
        }),
    ))
}
