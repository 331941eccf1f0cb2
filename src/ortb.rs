use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auction::types::AccountId;

/// OpenRTB 2.x media type code for video bids.
pub const MTYPE_VIDEO: i32 = 2;

/// Minimal subset of an OpenRTB 2.x bid request used by the APS adapter.
///
/// Every field the adapter reads or edits is explicit; anything else the
/// generic converter produced survives in the flattened `extra` map.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenRtbRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub imp: Vec<Imp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<RequestExt>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Imp {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Banner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<Format>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// A banner size entry. Dimensions are optional so a malformed entry is
/// representable and can be rejected during banner backfill.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Format {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Video {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Device {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Geo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// User object with every sensitive field the adapter strips modeled
/// explicitly, so a strip pass removes them from serialization entirely.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yob: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwarry: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Site {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequestExt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aps: Option<ApsRequestExt>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// Exchange-specific request extension carrying the publisher account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApsRequestExt {
    #[serde(rename = "accountId")]
    pub account_id: AccountId,
}

/// Minimal subset of an OpenRTB 2.x bid response used by the APS adapter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenRtbResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seatbid: Option<Vec<SeatBid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<ResponseExt>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeatBid {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bid: Vec<WireBid>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WireBid {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtype: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponseExt {
    #[serde(rename = "userSyncs", default, skip_serializing_if = "Vec::is_empty")]
    pub user_syncs: Vec<UserSyncEntry>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// Sync descriptor the exchange requests via `ext.userSyncs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSyncEntry {
    #[serde(rename = "type")]
    pub sync_type: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_round_trip_preserves_unknown_fields() {
        let raw = json!({
            "id": "auction-1",
            "imp": [{"id": "imp-1", "banner": {"format": [{"w": 300, "h": 250}]}, "tagid": "slot-1"}],
            "tmax": 800,
            "at": 1
        });

        let request: OpenRtbRequest =
            serde_json::from_value(raw.clone()).expect("should deserialize request");
        assert_eq!(request.id, "auction-1");
        assert_eq!(request.imp.len(), 1);
        assert_eq!(request.extra.get("tmax"), Some(&json!(800)));
        assert_eq!(request.imp[0].extra.get("tagid"), Some(&json!("slot-1")));

        let round_tripped = serde_json::to_value(&request).expect("should serialize request");
        assert_eq!(round_tripped.get("tmax"), Some(&json!(800)));
        assert_eq!(round_tripped.get("at"), Some(&json!(1)));
    }

    #[test]
    fn test_sensitive_user_fields_land_in_typed_slots() {
        let raw = json!({
            "id": "auction-2",
            "imp": [],
            "user": {
                "id": "u-1",
                "gender": "F",
                "yob": 1990,
                "keywords": "a,b",
                "kwarry": ["a", "b"],
                "customdata": "blob",
                "geo": {"lat": 1.0, "lon": 2.0},
                "data": [{"id": "seg"}],
                "consented": true
            }
        });

        let request: OpenRtbRequest =
            serde_json::from_value(raw).expect("should deserialize request");
        let user = request.user.expect("user should be present");
        assert_eq!(user.gender.as_deref(), Some("F"));
        assert_eq!(user.yob, Some(1990));
        assert!(user.kwarry.is_some());
        assert!(user.data.is_some());
        // Unknown fields stay in extra, not in the typed slots.
        assert_eq!(user.extra.get("consented"), Some(&json!(true)));
    }

    #[test]
    fn test_response_parses_seatbid_and_user_syncs() {
        let raw = json!({
            "id": "resp-1",
            "cur": "USD",
            "seatbid": [{
                "seat": "amazon",
                "bid": [{"id": "b1", "impid": "imp-1", "price": 1.25, "adm": "<div/>", "mtype": 1}]
            }],
            "ext": {"userSyncs": [{"type": "iframe", "url": "https://sync.example/if"}]}
        });

        let response: OpenRtbResponse =
            serde_json::from_value(raw).expect("should deserialize response");
        let seatbid = response.seatbid.as_ref().expect("seatbid present");
        assert_eq!(seatbid[0].seat.as_deref(), Some("amazon"));
        assert_eq!(seatbid[0].bid[0].mtype, Some(1));
        let ext = response.ext.expect("ext present");
        assert_eq!(ext.user_syncs[0].sync_type, "iframe");
    }

    #[test]
    fn test_format_tolerates_missing_dimensions() {
        let format: Format = serde_json::from_value(json!({"w": 300})).expect("should parse");
        assert_eq!(format.w, Some(300));
        assert_eq!(format.h, None);
    }
}
