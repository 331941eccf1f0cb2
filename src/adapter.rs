//! The APS bidder adapter.
//!
//! Thin protocol translation between the host auction framework and the APS
//! exchange: the generic [`OrtbConverter`] does the heavy request/response
//! shaping, and this adapter layers the exchange-specific edits on top:
//! privacy field stripping, banner dimension backfill, account injection,
//! VAST capture for video bids, and the inline render snippet for display
//! bids. Auction orchestration (timeouts, concurrent dispatch, targeting)
//! lives entirely in the host framework.

use std::collections::HashMap;
use std::sync::Arc;

use error_stack::Report;
use http::Method;
use serde_json::{json, Map, Value};

use crate::auction::adapter::BidderAdapter;
use crate::auction::types::{
    AccountId, AuctionContext, Bid, BidRequest, ConsentData, MediaType, ServerRequest,
    ServerResponse, SyncOptions, UserSync, UserSyncType,
};
use crate::converter::OrtbConverter;
use crate::creative::render_snippet;
use crate::error::ApsAdapterError;
use crate::ortb::{ApsRequestExt, OpenRtbRequest, MTYPE_VIDEO};
use crate::settings::ApsConfig;
use crate::telemetry::{normalize_event_name, TelemetryEvent, TelemetrySink};

/// Bidder code registered with the host framework.
pub const BIDDER_CODE: &str = "aps";

/// Adapter version stamped onto every telemetry event.
pub const ADAPTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source tag stamped onto every telemetry event.
const TELEMETRY_SOURCE: &str = "aps-bid-adapter";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Protocol-translation adapter for the APS exchange.
pub struct ApsBidAdapter {
    config: ApsConfig,
    converter: Arc<dyn OrtbConverter>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl ApsBidAdapter {
    pub fn new(
        config: ApsConfig,
        converter: Arc<dyn OrtbConverter>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            config,
            converter,
            telemetry,
        }
    }

    /// Account identifier for a slot request: per-request params win over the
    /// adapter configuration.
    fn account_for(&self, request: &BidRequest) -> Option<AccountId> {
        request
            .params
            .account_id
            .clone()
            .or_else(|| self.config.account_id.clone())
    }

    /// Account identifier for a round: the first params-carried account among
    /// the pending requests, else the configured one. The same rule the
    /// validation gate applies per request.
    fn resolve_account(&self, requests: &[BidRequest]) -> Result<AccountId, Report<ApsAdapterError>> {
        requests
            .iter()
            .find_map(|request| request.params.account_id.clone())
            .or_else(|| self.config.account_id.clone())
            .ok_or_else(|| {
                Report::new(ApsAdapterError::Validation {
                    message: "no account identifier in request params or configuration"
                        .to_string(),
                })
            })
    }

    /// Record a telemetry event under the configured account.
    ///
    /// No-op when telemetry is disabled or no account is configured. The
    /// payload is augmented with provenance fields and, unless it already
    /// carries an `error`, an empty `analytics` object.
    fn record(&self, name: &str, detail: Value) {
        if !self.config.telemetry {
            return;
        }
        let Some(account) = self.config.account_id.as_ref() else {
            return;
        };

        let mut detail = match detail {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        let has_error = detail.contains_key("error");
        detail.insert("source".to_string(), json!(TELEMETRY_SOURCE));
        detail.insert("adapterVersion".to_string(), json!(ADAPTER_VERSION));
        if !has_error {
            detail.insert("analytics".to_string(), json!({}));
        }

        self.telemetry.push(
            &account.to_string(),
            TelemetryEvent::new(normalize_event_name(name), Value::Object(detail)),
        );
    }

    fn record_error(&self, operation: &str, report: &Report<ApsAdapterError>) {
        self.record(
            &format!("{operation}/didError"),
            json!({ "error": report.to_string() }),
        );
    }

    /// Delete precise geo coordinates and the sensitive user fields from the
    /// wire request. Runs unconditionally; the exchange never sees them.
    fn strip_privacy_fields(wire: &mut OpenRtbRequest) {
        if let Some(geo) = wire.device.as_mut().and_then(|device| device.geo.as_mut()) {
            geo.lat = None;
            geo.lon = None;
        }
        if let Some(user) = wire.user.as_mut() {
            user.gender = None;
            user.yob = None;
            user.keywords = None;
            user.kwarry = None;
            user.customdata = None;
            user.geo = None;
            user.data = None;
        }
    }

    /// Ensure every banner impression carries explicit dimensions, filling
    /// them from the first format entry when absent.
    fn backfill_banner_dimensions(wire: &mut OpenRtbRequest) -> Result<(), Report<ApsAdapterError>> {
        if wire.imp.is_empty() {
            return Err(Report::new(ApsAdapterError::Structural {
                message: "auction request carries no impressions".to_string(),
            }));
        }

        for imp in &mut wire.imp {
            let Some(banner) = imp.banner.as_mut() else {
                continue;
            };
            if banner.w.is_some() || banner.h.is_some() {
                continue;
            }
            let Some(first) = banner.format.first() else {
                return Err(Report::new(ApsAdapterError::Structural {
                    message: format!(
                        "impression '{}' has a banner without dimensions or formats",
                        imp.id
                    ),
                }));
            };
            let (Some(w), Some(h)) = (first.w, first.h) else {
                return Err(Report::new(ApsAdapterError::Structural {
                    message: format!(
                        "impression '{}' first format entry lacks numeric dimensions",
                        imp.id
                    ),
                }));
            };
            banner.w = Some(w);
            banner.h = Some(h);
        }
        Ok(())
    }

    fn try_build(
        &self,
        requests: &[BidRequest],
        context: &AuctionContext,
    ) -> Result<ServerRequest, Report<ApsAdapterError>> {
        let url = self.config.endpoint_url()?;
        let account_id = self.resolve_account(requests)?;

        let mut wire = self.converter.to_auction_request(requests, context)?;

        Self::strip_privacy_fields(&mut wire);
        Self::backfill_banner_dimensions(&mut wire)?;

        if wire.cur.as_ref().map_or(true, Vec::is_empty) {
            wire.cur = Some(vec!["USD".to_string()]);
        }
        wire.ext.get_or_insert_with(Default::default).aps = Some(ApsRequestExt { account_id });

        let body = serde_json::to_value(&wire).map_err(|e| {
            Report::new(ApsAdapterError::Structural {
                message: format!("failed to serialize auction request: {e}"),
            })
        })?;

        Ok(ServerRequest {
            method: Method::POST,
            url,
            body,
            content_type: CONTENT_TYPE_JSON,
        })
    }

    fn try_interpret(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Result<Vec<Bid>, Report<ApsAdapterError>> {
        let ortb_request: OpenRtbRequest =
            serde_json::from_value(request.body.clone()).map_err(|e| {
                Report::new(ApsAdapterError::Interpretation {
                    message: format!("request payload is not a valid auction request: {e}"),
                })
            })?;

        // The round's account was injected into the wire request at build
        // time; read it back so build and interpretation always agree.
        let account = ortb_request
            .ext
            .as_ref()
            .and_then(|ext| ext.aps.as_ref())
            .map(|aps| aps.account_id.clone())
            .or_else(|| self.config.account_id.clone())
            .ok_or_else(|| {
                Report::new(ApsAdapterError::Interpretation {
                    message: "request payload carries no account identifier".to_string(),
                })
            })?;

        // Capture video markup before the generic conversion sees it; the
        // exchange sends the VAST reference in `adm`.
        let mut wire = response.body.clone();
        let mut vast_by_imp: HashMap<String, String> = HashMap::new();
        if let Some(seatbids) = wire.seatbid.as_mut() {
            for seatbid in seatbids {
                for bid in &mut seatbid.bid {
                    if bid.mtype == Some(MTYPE_VIDEO) {
                        if let (Some(impid), Some(adm)) = (bid.impid.clone(), bid.adm.take()) {
                            vast_by_imp.insert(impid, adm);
                        }
                    }
                }
            }
        }

        let mut bids = self.converter.to_bids(&wire, &ortb_request)?;

        let account_key = account.to_string();
        let creative_url = self.config.renderer_url();
        for bid in &mut bids {
            // The bid's own media type decides the branch; an impression can
            // carry both a video and a display bid from different seats.
            if bid.media_type == MediaType::Video {
                if let Some(vast_url) = vast_by_imp.get(&bid.request_id) {
                    bid.vast_url = Some(vast_url.clone());
                    bid.ad = None;
                }
            } else {
                let seat = bid.seat.clone().unwrap_or_default();
                bid.ad = Some(render_snippet(
                    creative_url,
                    &account_key,
                    &response.raw_body,
                    &seat,
                ));
            }
        }

        Ok(bids)
    }

    fn record_notification(&self, name: &str, detail: Option<Value>) {
        self.record(name, detail.unwrap_or(Value::Null));
    }
}

impl BidderAdapter for ApsBidAdapter {
    fn bidder_code(&self) -> &'static str {
        BIDDER_CODE
    }

    fn is_bid_request_valid(&self, request: &BidRequest) -> bool {
        match self.account_for(request) {
            Some(account) if account.is_usable() => true,
            Some(_) => {
                log::warn!(
                    "aps: rejecting bid request '{}': blank account identifier",
                    request.bid_id
                );
                false
            }
            None => {
                log::warn!(
                    "aps: rejecting bid request '{}': no account identifier",
                    request.bid_id
                );
                false
            }
        }
    }

    fn build_http_request(
        &self,
        requests: &[BidRequest],
        context: &AuctionContext,
    ) -> Result<ServerRequest, Report<ApsAdapterError>> {
        self.record("buildRequests", Value::Null);
        match self.try_build(requests, context) {
            Ok(server_request) => {
                log::debug!(
                    "aps: built bid request for {} slots -> {}",
                    requests.len(),
                    server_request.url
                );
                Ok(server_request)
            }
            Err(report) => {
                self.record_error("buildRequests", &report);
                log::error!("aps: buildRequests failed: {report:?}");
                Err(report)
            }
        }
    }

    fn interpret_response(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Result<Vec<Bid>, Report<ApsAdapterError>> {
        self.record("interpretResponse", Value::Null);
        match self.try_interpret(response, request) {
            Ok(bids) => {
                log::debug!("aps: interpreted {} bids", bids.len());
                Ok(bids)
            }
            Err(report) => {
                self.record_error("interpretResponse", &report);
                log::error!("aps: interpretResponse failed: {report:?}");
                Err(report)
            }
        }
    }

    fn user_syncs(
        &self,
        responses: &[ServerResponse],
        options: &SyncOptions,
        _consent: &ConsentData,
    ) -> Result<Vec<UserSync>, Report<ApsAdapterError>> {
        let mut syncs = Vec::new();
        for response in responses {
            let entries = response
                .body
                .ext
                .as_ref()
                .map(|ext| ext.user_syncs.as_slice())
                .unwrap_or_default();
            for entry in entries {
                let sync = match entry.sync_type.as_str() {
                    "iframe" if options.iframe_enabled => UserSync {
                        sync_type: UserSyncType::Iframe,
                        url: entry.url.clone(),
                    },
                    "image" if options.pixel_enabled => UserSync {
                        sync_type: UserSyncType::Image,
                        url: entry.url.clone(),
                    },
                    _ => continue,
                };
                syncs.push(sync);
            }
        }
        Ok(syncs)
    }

    fn on_timeout(&self, detail: Option<Value>) {
        self.record_notification("onTimeout", detail);
    }

    fn on_set_targeting(&self, detail: Option<Value>) {
        self.record_notification("onSetTargeting", detail);
    }

    fn on_ad_render_succeeded(&self, detail: Option<Value>) {
        self.record_notification("onAdRenderSucceeded", detail);
    }

    fn on_bidder_error(&self, detail: Option<Value>) {
        self.record_notification("onBidderError", detail);
    }

    fn on_bid_won(&self, detail: Option<Value>) {
        self.record_notification("onBidWon", detail);
    }

    fn on_bid_attribute(&self, detail: Option<Value>) {
        self.record_notification("onBidAttribute", detail);
    }

    fn on_bidder_billable(&self, detail: Option<Value>) {
        self.record_notification("onBidderBillable", detail);
    }
}
