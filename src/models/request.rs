// Outbound request models
// Everything the adapter hands to a transport for a single authentication call

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Parameter mapping bound into every request (insertion ordered)
pub type Params = serde_json::Map<String, Value>;

/// Request headers
pub type Headers = BTreeMap<String, String>;

// ==================================================================================================
// Query Params
// ==================================================================================================

/// Ordered key/value pairs with query-string semantics
///
/// `set` replaces an existing key in place, so the first insertion decides
/// the position of a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing the existing value if present
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Serialize as `application/x-www-form-urlencoded`
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl From<&Params> for QueryParams {
    fn from(params: &Params) -> Self {
        let mut query = QueryParams::new();
        for (key, value) in params {
            query.set(key.as_str(), value_to_param(value));
        }
        query
    }
}

/// Stringify a JSON value the way a query string expects it
///
/// Strings are taken verbatim, arrays are comma-joined, everything else uses
/// its JSON form.
pub fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_param)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

// ==================================================================================================
// Request Payload
// ==================================================================================================

/// Payload produced by a params builder
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    /// Form/query pairs
    Query(QueryParams),
    /// JSON document
    Json(Value),
    /// Pre-encoded body or query string
    Raw(String),
}

impl RequestPayload {
    /// Flatten the payload into query pairs
    ///
    /// JSON objects become one pair per key; other JSON values and raw
    /// strings cannot be expressed as pairs and yield `None`.
    pub fn to_query_params(&self) -> Option<QueryParams> {
        match self {
            RequestPayload::Query(query) => Some(query.clone()),
            RequestPayload::Json(Value::Object(map)) => Some(QueryParams::from(map)),
            _ => None,
        }
    }
}

// ==================================================================================================
// Request Descriptor
// ==================================================================================================

/// Everything a transport needs besides the URL
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP verb, upper-cased
    pub method: String,
    pub headers: Headers,
    /// Set for POST requests
    pub body: Option<RequestPayload>,
    /// Set for GET requests
    pub query: Option<RequestPayload>,
    /// Passthrough request options
    pub options: Params,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            headers: Headers::new(),
            body: None,
            query: None,
            options: Params::new(),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_set_replaces_in_place() {
        let mut query = QueryParams::new();
        query.set("username", "alice");
        query.set("client", "web");
        query.set("username", "bob");

        assert_eq!(query.len(), 2);
        assert_eq!(query.get("username"), Some("bob"));
        assert_eq!(query.pairs()[0].0, "username");
        assert_eq!(query.to_query_string(), "username=bob&client=web");
    }

    #[test]
    fn test_query_string_encoding() {
        let mut query = QueryParams::new();
        query.set("password", "s3cr3t&x=1");
        query.set("note", "hello world");

        assert_eq!(
            query.to_query_string(),
            "password=s3cr3t%26x%3D1&note=hello+world"
        );
    }

    #[test]
    fn test_query_params_from_params_keeps_order() {
        let mut params = Params::new();
        params.insert("zeta".to_string(), json!("z"));
        params.insert("alpha".to_string(), json!(1));
        params.insert("flag".to_string(), json!(true));

        let query = QueryParams::from(&params);
        let keys: Vec<&str> = query.pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "flag"]);
        assert_eq!(query.get("alpha"), Some("1"));
        assert_eq!(query.get("flag"), Some("true"));
    }

    #[test]
    fn test_value_to_param() {
        assert_eq!(value_to_param(&json!("text")), "text");
        assert_eq!(value_to_param(&json!(42)), "42");
        assert_eq!(value_to_param(&json!(null)), "null");
        assert_eq!(value_to_param(&json!(["a", "b", 3])), "a,b,3");
    }

    #[test]
    fn test_payload_to_query_params() {
        let payload = RequestPayload::Json(json!({"scope": "read"}));
        let query = payload.to_query_params().unwrap();
        assert_eq!(query.get("scope"), Some("read"));

        assert!(RequestPayload::Raw("a=b".to_string())
            .to_query_params()
            .is_none());
        assert!(RequestPayload::Json(json!([1, 2])).to_query_params().is_none());
    }

    #[test]
    fn test_descriptor_method_and_header_lookup() {
        let mut descriptor = RequestDescriptor::new("post");
        descriptor
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());

        assert_eq!(descriptor.method, "POST");
        assert_eq!(descriptor.header("content-type"), Some("application/json"));
        assert_eq!(descriptor.header("accept"), None);
    }
}
