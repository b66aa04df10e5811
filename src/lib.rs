// HTTP authentication adapter - library root

pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod resolver;

pub use auth::{AdapterOptions, AuthOutcome, AuthResult, HttpAdapter, Payload, ResultCode};
pub use error::AdapterError;
pub use http_client::{ReqwestTransport, Transport};
pub use resolver::{TemplateResolver, UrlResolver};
