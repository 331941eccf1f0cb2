//! Inline render-script construction for non-video bids.
//!
//! APS display bids are not rendered from raw markup. Instead the creative
//! slot receives a loader tag for the renderer script plus an inline snippet
//! that queues a render event carrying the base64 of the exact exchange
//! response body and the winning seat-bid identifier. The renderer drains the
//! per-account queue client-side.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Renderer loaded when no `creative_url` is configured.
pub const DEFAULT_CREATIVE_URL: &str = "https://c.amazon-adsystem.com/dtb/aps-render.js";

/// Event name pushed onto the render queue.
const RENDER_EVENT: &str = "aps/render/event";

/// Build the two-script markup for a display bid.
///
/// The inline script lazily creates the account's queue/store structure under
/// `window._aps` before pushing, so load order against the renderer does not
/// matter.
pub fn render_snippet(creative_url: &str, account: &str, raw_body: &str, seat: &str) -> String {
    let payload = BASE64.encode(raw_body);
    format!(
        concat!(
            "<script src=\"{url}\"></script>",
            "<script>",
            "window._aps=window._aps||{{}};",
            "window._aps[\"{account}\"]=window._aps[\"{account}\"]||{{queue:[],store:{{}}}};",
            "window._aps[\"{account}\"].queue.push({{name:\"{event}\",",
            "detail:{{payload:\"{payload}\",seat:\"{seat}\"}}}});",
            "</script>"
        ),
        url = creative_url,
        account = account,
        event = RENDER_EVENT,
        payload = payload,
        seat = seat,
    )
}
