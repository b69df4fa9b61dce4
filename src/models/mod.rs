//! Data models for literal requests, responses and round trips.

pub mod request;
pub mod response;
pub mod roundtrip;

pub use request::{canonical_header_key, HttpMethod, HttpRequest};
pub use response::HttpResponse;
pub use roundtrip::{
    Definition, Eventually, Patch, RequestSpec, ResponseSpec, RoundTrip, RoundTripTemplate,
};
