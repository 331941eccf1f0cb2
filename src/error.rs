use derive_more::{Display, Error};

/// Errors surfaced by the APS adapter.
///
/// Every framework-facing operation returns `Result<_, Report<ApsAdapterError>>`;
/// the host framework treats an error as "skip this bidder for the current
/// auction round" rather than failing the whole auction.
#[derive(Debug, Display, Error)]
pub enum ApsAdapterError {
    /// Configuration could not be loaded or failed validation.
    #[display("configuration error: {message}")]
    Configuration { message: String },

    /// The auction payload is structurally malformed. Fatal to the current
    /// request build; the round proceeds without this exchange.
    #[display("malformed auction payload: {message}")]
    Structural { message: String },

    /// A bid request is not usable by this adapter.
    #[display("invalid bid request: {message}")]
    Validation { message: String },

    /// The exchange response could not be interpreted.
    #[display("failed to interpret exchange response: {message}")]
    Interpretation { message: String },
}
