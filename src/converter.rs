//! Injected collaborator performing generic OpenRTB shape translation.
//!
//! The adapter layers exchange-specific edits on top of this converter; the
//! converter itself is supplied by the host framework and carries no APS
//! knowledge.

use error_stack::Report;

use crate::auction::types::{AuctionContext, Bid, BidRequest};
use crate::error::ApsAdapterError;
use crate::ortb::{OpenRtbRequest, OpenRtbResponse};

/// Generic bid-request/bid-response shape translation.
pub trait OrtbConverter: Send + Sync {
    /// Produce the base wire request covering all pending slot requests.
    ///
    /// # Errors
    ///
    /// Returns an error when the slot requests cannot be expressed as an
    /// OpenRTB request.
    fn to_auction_request(
        &self,
        requests: &[BidRequest],
        context: &AuctionContext,
    ) -> Result<OpenRtbRequest, Report<ApsAdapterError>>;

    /// Map wire-format bids to normalized bids, pairing each wire bid with
    /// its originating impression from the request.
    ///
    /// # Errors
    ///
    /// Returns an error when the response cannot be mapped against the
    /// original request.
    fn to_bids(
        &self,
        response: &OpenRtbResponse,
        request: &OpenRtbRequest,
    ) -> Result<Vec<Bid>, Report<ApsAdapterError>>;
}
