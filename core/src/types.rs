//! Domain DTOs for the track sign-up endpoint.
//!
//! # Design
//! The public types are what callers build and receive. The wire shapes
//! (`SignUpRequest`, `SignUpResponse`) are crate-private and mirror the JSON
//! exactly; the mock-server crate defines its own copies and the integration
//! tests catch any drift between the two.
//!
//! Optional fields use `Option` so "absent" and "present but empty" stay
//! distinct: `Some(String::new())` is sent as `""`, `None` is not sent at all.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Input for [`Client::track_sign_up`](crate::Client::track_sign_up).
///
/// The lead is identified by `uid` or `email`, the referral source by `tid`
/// or `ref_id`. Nothing here is enforced; see [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSignUpInput {
    /// Stable id of the lead, for when the email can change before the first sale.
    pub uid: Option<String>,
    pub email: Option<String>,
    /// Visitor tracking id, from the `_fprom_tid` cookie.
    pub tid: Option<String>,
    /// Referral id of the promoter the lead should be assigned to.
    pub ref_id: Option<String>,
    /// IP of the visitor, used for fraud analysis.
    pub ip: Option<String>,
    /// When the sign-up happened. The server uses "now" when unset.
    pub created_at: Option<DateTime<Utc>>,
    /// Sent as `false` when unset.
    pub skip_email_notification: Option<bool>,
}

impl TrackSignUpInput {
    /// Checks that both the lead and the referral source are identified.
    ///
    /// `track_sign_up` does not call this; the server remains the authority.
    pub fn validate(&self) -> Result<()> {
        if self.uid.is_none() && self.email.is_none() {
            return Err(Error::InvalidInput("uid or email is required"));
        }
        if self.tid.is_none() && self.ref_id.is_none() {
            return Err(Error::InvalidInput("tid or ref_id is required"));
        }
        Ok(())
    }
}

/// The referral record the server resolved the sign-up to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Referral {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub email: Option<String>,
    pub uid: Option<String>,
}

/// Event returned by a successful sign-up call.
///
/// Amounts are in minor units of `original_sale_currency`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSignUpOutput {
    pub id: i64,
    pub etype: String,
    pub sale_amount: Option<i64>,
    pub original_sale_amount: Option<i64>,
    pub original_sale_currency: Option<String>,
    pub event_id: Option<String>,
    pub plan_id: Option<String>,
    pub billing_period: Option<String>,
    /// `None` when the response carried no `created_at`.
    pub created_at: Option<DateTime<Utc>>,
    pub referral: Referral,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub skip_email_notification: bool,
}

impl<'a> From<&'a TrackSignUpInput> for SignUpRequest<'a> {
    fn from(input: &'a TrackSignUpInput) -> Self {
        Self {
            email: input.email.as_deref(),
            uid: input.uid.as_deref(),
            tid: input.tid.as_deref(),
            ref_id: input.ref_id.as_deref(),
            ip: input.ip.as_deref(),
            created_at: input
                .created_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            skip_email_notification: input.skip_email_notification.unwrap_or(false),
        }
    }
}

/// Success body as sent by the server. Missing keys decode to their default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SignUpResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub etype: String,
    pub sale_amount: Option<i64>,
    pub original_sale_amount: Option<i64>,
    pub original_sale_currency: Option<String>,
    pub event_id: Option<String>,
    pub plan_id: Option<String>,
    pub billing_period: Option<String>,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub referral: Referral,
}

/// Decodes JSON `null` as the type's default instead of failing.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SignUpResponse {
    /// Converts into the public type, parsing `created_at` as RFC 3339.
    pub fn into_output(self) -> Result<TrackSignUpOutput> {
        let created_at = match self.created_at.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|source| Error::Timestamp {
                        value: raw.to_string(),
                        source,
                    })?
                    .with_timezone(&Utc),
            ),
        };

        Ok(TrackSignUpOutput {
            id: self.id,
            etype: self.etype,
            sale_amount: self.sale_amount,
            original_sale_amount: self.original_sale_amount,
            original_sale_currency: self.original_sale_currency,
            event_id: self.event_id,
            plan_id: self.plan_id,
            billing_period: self.billing_period,
            created_at,
            referral: self.referral,
        })
    }
}
