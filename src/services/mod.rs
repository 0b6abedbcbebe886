//! Concrete services registered by the binary.

pub mod http;

pub use http::HttpService;
