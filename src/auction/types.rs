//! Host-framework object model consumed and produced by the adapter.

use std::collections::HashMap;
use std::fmt;

use error_stack::{Report, ResultExt};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApsAdapterError;
use crate::ortb::OpenRtbResponse;

/// Exchange account identifier, accepted as either a string or a number
/// (publisher configs routinely carry it both ways).
#[derive(Debug, Clone, PartialEq)]
pub enum AccountId {
    Text(String),
    Number(f64),
}

impl AccountId {
    /// True when the identifier can address an exchange account: any number
    /// (zero included), or a string with non-whitespace content.
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(text) => !text.trim().is_empty(),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct AccountIdVisitor;

        impl<'de> Visitor<'de> for AccountIdVisitor {
            type Value = AccountId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or number account identifier")
            }

            fn visit_str<E>(self, value: &str) -> Result<AccountId, E>
            where
                E: de::Error,
            {
                Ok(AccountId::Text(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<AccountId, E>
            where
                E: de::Error,
            {
                Ok(AccountId::Text(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<AccountId, E>
            where
                E: de::Error,
            {
                Ok(AccountId::Number(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<AccountId, E>
            where
                E: de::Error,
            {
                Ok(AccountId::Number(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<AccountId, E>
            where
                E: de::Error,
            {
                Ok(AccountId::Number(value))
            }
        }

        deserializer.deserialize_any(AccountIdVisitor)
    }
}

/// Media type of a single slot request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Banner,
    Video,
}

/// One advertising slot's request parameters, supplied by the host framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRequest {
    /// Framework-assigned bid identifier; resulting bids echo it back.
    pub bid_id: String,
    /// Publisher-facing slot name (e.g. "header-banner").
    pub ad_unit_code: String,
    /// Requested creative sizes as (width, height) pairs.
    pub sizes: Vec<(u32, u32)>,
    pub media_type: MediaType,
    pub params: BidParams,
}

/// Adapter-specific parameters carried on a bid request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BidParams {
    #[serde(rename = "accountId", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
}

/// Shared auction context supplied alongside the pending bid requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionContext {
    pub auction_id: String,
    pub timeout_ms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub us_privacy: Option<String>,
}

/// Descriptor for the single HTTP call covering one auction round.
/// The host framework owns the transport; the adapter only shapes the call.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    pub method: Method,
    pub url: String,
    pub body: Value,
    pub content_type: &'static str,
}

/// A raw exchange reply plus its parsed wire form.
///
/// The raw body is retained verbatim because the non-video render snippet
/// embeds its exact base64 encoding.
#[derive(Debug, Clone)]
pub struct ServerResponse {
    pub body: OpenRtbResponse,
    pub raw_body: String,
}

impl ServerResponse {
    /// Parse an HTTP reply body into the wire model, keeping the raw text.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not valid bid-response JSON.
    pub fn parse(raw_body: impl Into<String>) -> Result<Self, Report<ApsAdapterError>> {
        let raw_body = raw_body.into();
        let body: OpenRtbResponse =
            serde_json::from_str(&raw_body).change_context(ApsAdapterError::Interpretation {
                message: "response body is not valid bid-response JSON".to_string(),
            })?;
        Ok(Self { body, raw_body })
    }
}

/// Normalized bid result handed back to the host framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    /// The `bid_id` of the originating slot request (wire `impid`).
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    pub currency: String,
    pub width: u32,
    pub height: u32,
    /// Creative markup for display bids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<String>,
    /// VAST reference for video bids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vast_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    /// Seat-bid identifier correlating the bid to its demand seat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, Value>,
}

/// Sync capabilities granted by the host for this round.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub iframe_enabled: bool,
    pub pixel_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserSyncType {
    Iframe,
    Image,
}

/// A sync descriptor the exchange asked the host to fire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSync {
    pub sync_type: UserSyncType,
    pub url: String,
}

/// Consent signals accepted by `user_syncs`. The exchange endpoint handles
/// consent server-side, so the adapter carries these without reading them.
#[derive(Debug, Clone, Default)]
pub struct ConsentData {
    pub gdpr_consent: Option<String>,
    pub us_privacy: Option<String>,
}
