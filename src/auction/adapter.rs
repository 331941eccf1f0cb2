//! Capability trait the host auction framework requires from every bidder.

use error_stack::Report;
use serde_json::Value;

use crate::error::ApsAdapterError;

use super::types::{
    AuctionContext, Bid, BidRequest, ConsentData, ServerRequest, ServerResponse, SyncOptions,
    UserSync,
};

/// Trait implemented by bidder adapters (one per exchange).
///
/// The framework drives the auction: it validates each slot request, asks the
/// adapter to shape one HTTP call per round, hands the reply back for
/// interpretation, and fires lifecycle notifications as the round progresses.
/// An `Err` from any fallible operation means "skip this bidder this round";
/// it never aborts the overall auction.
pub trait BidderAdapter {
    /// Unique bidder code (e.g. "aps").
    fn bidder_code(&self) -> &'static str;

    /// Gate a single slot request. Invalid requests are dropped from the
    /// round without an error.
    fn is_bid_request_valid(&self, request: &BidRequest) -> bool;

    /// Shape one HTTP call covering all pending slot requests.
    ///
    /// # Errors
    ///
    /// Returns an error when the wire request cannot be built; the round
    /// proceeds without this exchange.
    fn build_http_request(
        &self,
        requests: &[BidRequest],
        context: &AuctionContext,
    ) -> Result<ServerRequest, Report<ApsAdapterError>>;

    /// Interpret the exchange reply into normalized bids.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply cannot be mapped; the framework
    /// records no bids for this exchange.
    fn interpret_response(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Result<Vec<Bid>, Report<ApsAdapterError>>;

    /// Extract the sync descriptors the exchange requested, filtered by the
    /// host's sync capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error instead of an empty list when extraction fails, so
    /// the host can distinguish "nothing requested" from "extraction broke".
    fn user_syncs(
        &self,
        responses: &[ServerResponse],
        options: &SyncOptions,
        consent: &ConsentData,
    ) -> Result<Vec<UserSync>, Report<ApsAdapterError>>;

    // Lifecycle notifications. These must never fail; their only observable
    // behavior is telemetry.

    /// The exchange did not answer within the auction timeout.
    fn on_timeout(&self, detail: Option<Value>);

    /// Targeting keys were assigned for this bidder's bids.
    fn on_set_targeting(&self, detail: Option<Value>);

    /// A creative from this bidder finished rendering.
    fn on_ad_render_succeeded(&self, detail: Option<Value>);

    /// The framework observed a bidder-attributed error.
    fn on_bidder_error(&self, detail: Option<Value>);

    /// One of this bidder's bids won the auction.
    fn on_bid_won(&self, detail: Option<Value>);

    /// A bid attribute changed after the auction settled.
    fn on_bid_attribute(&self, detail: Option<Value>);

    /// A winning bid became billable.
    fn on_bidder_billable(&self, detail: Option<Value>);
}
