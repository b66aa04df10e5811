// Transport response model

use bytes::Bytes;
use serde_json::Value;

use super::request::Headers;

/// Response received by a transport, fully buffered
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Headers,
    body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Build a 200 response with a JSON body
    pub fn json_ok(value: &Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::new(200, headers, value.to_string())
    }

    /// Structured decode of the body; `None` when it is not valid JSON
    pub fn json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    /// Raw body as text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
