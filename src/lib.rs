//! Bidder adapter for the APS exchange.
//!
//! This crate translates a host auction framework's bid requests into the
//! exchange's OpenRTB-shaped wire format and maps the exchange's JSON
//! responses back into the framework's bid model. Auction orchestration
//! (timeouts, concurrent dispatch, targeting assignment, transport) belongs
//! to the host; the adapter only shapes and validates payloads.
//!
//! # Modules
//!
//! - [`adapter`]: The APS adapter: request shaping, response interpretation,
//!   validation, user syncs, and lifecycle notifications
//! - [`auction`]: Host-framework object model and the bidder capability trait
//! - [`converter`]: Injected generic OpenRTB converter interface
//! - [`creative`]: Inline render-script construction for display bids
//! - [`error`]: Error types shared across the adapter
//! - [`ortb`]: Minimal OpenRTB 2.x wire subset
//! - [`settings`]: Configuration management and validation
//! - [`telemetry`]: Telemetry sink abstraction and in-memory implementation

pub mod adapter;
pub mod auction;
pub mod converter;
pub mod creative;
pub mod error;
pub mod ortb;
pub mod settings;
pub mod telemetry;

pub use adapter::{ApsBidAdapter, ADAPTER_VERSION, BIDDER_CODE};
pub use auction::{
    AccountId, AuctionContext, Bid, BidParams, BidRequest, BidderAdapter, ConsentData, MediaType,
    ServerRequest, ServerResponse, SyncOptions, UserSync, UserSyncType,
};
pub use converter::OrtbConverter;
pub use error::ApsAdapterError;
pub use settings::{ApsConfig, Settings};
pub use telemetry::{InMemoryTelemetrySink, TelemetryEvent, TelemetrySink};
