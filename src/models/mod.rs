// Data models for requests and responses crossing the transport boundary

pub mod request;
pub mod response;

pub use request::{value_to_param, Headers, Params, QueryParams, RequestDescriptor, RequestPayload};
pub use response::TransportResponse;
