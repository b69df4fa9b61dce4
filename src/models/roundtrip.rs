//! Rendered round trips and the ambient round-trip template.
//!
//! Every optional field uses `Option` as an explicit presence marker, so a
//! status code of `0` or an empty body can be told apart from "not set".
//! Layers combine through [`Patch`]: a set field in the patch overrides, an
//! unset field inherits, and header maps merge key by key.

use super::request::{canonical_header_key, HttpMethod, HttpRequest};
use crate::config::DefinitionType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Structural override of `self` by `other`.
pub trait Patch {
    fn patch(&mut self, other: Self);
}

impl<T> Patch for Option<T> {
    fn patch(&mut self, other: Self) {
        if other.is_some() {
            *self = other;
        }
    }
}

impl<V> Patch for IndexMap<String, V> {
    fn patch(&mut self, other: Self) {
        self.extend(other);
    }
}

/// Request side of a round trip. Unset fields inherit from the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub method: Option<HttpMethod>,
    pub path: Option<String>,
    /// Wrapper applied to relative paths; `%s` marks where the path goes.
    pub path_template: Option<String>,
    pub headers: IndexMap<String, String>,
    pub body: Option<String>,
}

impl Patch for RequestSpec {
    fn patch(&mut self, other: Self) {
        self.scheme.patch(other.scheme);
        self.host.patch(other.host);
        self.method.patch(other.method);
        self.path.patch(other.path);
        self.path_template.patch(other.path_template);
        self.headers.patch(other.headers);
        self.body.patch(other.body);
    }
}

impl RequestSpec {
    /// Sets a header under its canonical name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(canonical_header_key(name), value.into());
    }
}

/// Polling settings of an eventually round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eventually {
    pub timeout: Option<Duration>,
    pub interval: Option<Duration>,
}

impl Patch for Eventually {
    fn patch(&mut self, other: Self) {
        self.timeout.patch(other.timeout);
        self.interval.patch(other.interval);
    }
}

/// Expected response of a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub status_code: Option<u16>,
    pub headers: IndexMap<String, String>,
    /// JSON pattern text. `Some("")` means the body must be empty.
    pub body: Option<String>,
    /// Present for eventually round trips.
    pub eventually: Option<Eventually>,
}

impl Patch for ResponseSpec {
    fn patch(&mut self, other: Self) {
        self.status_code.patch(other.status_code);
        self.headers.patch(other.headers);
        self.body.patch(other.body);
        match (&mut self.eventually, other.eventually) {
            (Some(mine), Some(theirs)) => mine.patch(theirs),
            (slot, theirs) => slot.patch(theirs),
        }
    }
}

impl ResponseSpec {
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(canonical_header_key(name), value.into());
    }
}

/// A rendered variable definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionType,
    pub selector: Vec<String>,
}

/// A concrete round trip, or the ambient template it is patched onto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub description: String,
    /// Named HTTP client; `None` uses the default client.
    pub client: Option<String>,
    pub request: RequestSpec,
    pub response: ResponseSpec,
    pub definitions: Vec<Definition>,
}

/// The inheritable defaults a context hands to its round trips.
pub type RoundTripTemplate = RoundTrip;

impl Patch for RoundTrip {
    fn patch(&mut self, other: Self) {
        if !other.description.is_empty() {
            self.description = other.description;
        }
        self.client.patch(other.client);
        self.request.patch(other.request);
        self.response.patch(other.response);
        if !other.definitions.is_empty() {
            self.definitions = other.definitions;
        }
    }
}

impl RoundTrip {
    /// Returns a copy of `self` with `other` patched on top.
    pub fn patched(&self, other: RoundTrip) -> RoundTrip {
        let mut out = self.clone();
        out.patch(other);
        out
    }

    /// Builds the literal request. Host and path are required; the scheme
    /// defaults to `http` and the method to `GET`.
    pub fn to_request(&self) -> Result<HttpRequest, String> {
        let host = self
            .request
            .host
            .clone()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "host is not defined".to_string())?;
        let path = self
            .request
            .path
            .clone()
            .ok_or_else(|| "api is not defined".to_string())?;
        Ok(HttpRequest {
            method: self.request.method.unwrap_or_default(),
            scheme: self
                .request
                .scheme
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http".to_string()),
            host,
            path,
            headers: self.request.headers.clone(),
            body: self.request.body.clone(),
        })
    }
}
