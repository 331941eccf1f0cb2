//! Host-framework contract: object model and the bidder capability trait.

pub mod adapter;
pub mod types;

pub use adapter::BidderAdapter;
pub use types::{
    AccountId, AuctionContext, Bid, BidParams, BidRequest, ConsentData, MediaType, ServerRequest,
    ServerResponse, SyncOptions, UserSync, UserSyncType,
};
