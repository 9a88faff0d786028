use serde::Serialize;
use serde_json::{Map, Value};

use super::Handle;

/// Snapshot of a handle's metadata, keyed the way `stream_get_meta_data`-style callers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub timed_out: bool,
    pub blocked: bool,
    pub eof: bool,
    pub wrapper_type: String,
    pub stream_type: String,
    pub mode: String,
    pub unread_bytes: u64,
    pub seekable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Metadata {
    pub(crate) fn of(handle: &dyn Handle) -> Self {
        Self {
            timed_out: false,
            blocked: true,
            eof: handle.is_eof(),
            wrapper_type: handle.wrapper_type().to_owned(),
            stream_type: handle.stream_type().to_owned(),
            mode: handle.mode().as_str().to_owned(),
            unread_bytes: 0,
            seekable: handle.is_seekable(),
            uri: handle.uri().map(ToOwned::to_owned),
        }
    }

    /// The metadata as a key/value mapping.
    pub fn into_map(self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
