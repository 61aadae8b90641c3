//! obs-websocket v5 wire format
//!
//! Every frame is a JSON object `{ "op": <opcode>, "d": { ... } }`. Only the
//! opcodes needed for identification and request/response are modelled here;
//! events (op 5) are read and discarded by the client.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use super::MediaOptions;
use crate::playback::MediaReference;

/// RPC version requested in `Identify`
pub const RPC_VERSION: u32 = 1;

/// Frame opcodes
pub mod op {
    pub const HELLO: u8 = 0;
    pub const IDENTIFY: u8 = 1;
    pub const IDENTIFIED: u8 = 2;
    pub const EVENT: u8 = 5;
    pub const REQUEST: u8 = 6;
    pub const REQUEST_RESPONSE: u8 = 7;
}

/// Request type names used by this crate
pub mod request_type {
    pub const SET_INPUT_SETTINGS: &str = "SetInputSettings";
    pub const SET_SOURCE_FILTER_SETTINGS: &str = "SetSourceFilterSettings";
    pub const SET_CURRENT_SCENE_TRANSITION: &str = "SetCurrentSceneTransition";
    pub const SET_CURRENT_PROGRAM_SCENE: &str = "SetCurrentProgramScene";
}

/// Outer envelope of every message in both directions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
}

impl Frame {
    /// Decode a text message
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode for sending
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Build an `Identify` frame
    pub fn identify(authentication: Option<String>) -> Result<Self, serde_json::Error> {
        let identify = Identify {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: 0,
        };
        Ok(Self {
            op: op::IDENTIFY,
            d: serde_json::to_value(identify)?,
        })
    }

    /// Build a `Request` frame
    pub fn request(request_type: &str, request_id: &str, request_data: Value) -> Self {
        Self {
            op: op::REQUEST,
            d: json!({
                "requestType": request_type,
                "requestId": request_id,
                "requestData": request_data,
            }),
        }
    }

    /// Decode the payload as a specific message body
    pub fn body<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.d)
    }
}

/// Server greeting (op 0)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    pub rpc_version: u32,
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

/// Authentication parameters offered in `Hello`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// Client identification (op 1)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: u32,
}

/// Identification accepted (op 2)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

/// Response to a request (op 7)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default)]
    pub response_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Compute the `Identify.authentication` string:
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
pub fn auth_response(password: &str, challenge: &AuthChallenge) -> String {
    let secret = BASE64.encode(Sha256::digest(format!("{}{}", password, challenge.salt)));
    BASE64.encode(Sha256::digest(format!("{}{}", secret, challenge.challenge)))
}

/// `SetInputSettings` payload loading a media file into a media source.
///
/// `overlay` keeps the source's other settings intact.
pub fn set_input_settings(source: &str, media: &MediaReference, options: MediaOptions) -> Value {
    json!({
        "inputName": source,
        "inputSettings": {
            "local_file": media.as_str(),
            "looping": options.looping,
            "playback_speed": options.speed,
        },
        "overlay": true,
    })
}

/// `SetSourceFilterSettings` payload setting the opacity of a colour filter
pub fn set_filter_opacity(source: &str, filter: &str, opacity: f64) -> Value {
    json!({
        "sourceName": source,
        "filterName": filter,
        "filterSettings": {
            "opacity": opacity,
        },
    })
}
