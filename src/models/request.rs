//! Literal HTTP request models.
//!
//! A [`HttpRequest`] is the fully rendered request of one round trip: every
//! template has been resolved and only concrete strings remain.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Request method of a round trip's `api` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    HEAD,
    TRACE,
    CONNECT,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Converts to the equivalent reqwest method.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::HEAD => reqwest::Method::HEAD,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
            HttpMethod::TRACE => reqwest::Method::TRACE,
            HttpMethod::CONNECT => reqwest::Method::CONNECT,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Parses a method name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "HEAD" => Ok(HttpMethod::HEAD),
            "TRACE" => Ok(HttpMethod::TRACE),
            "CONNECT" => Ok(HttpMethod::CONNECT),
            other => Err(format!("unknown HTTP method {:?}", other)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete request, ready to send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,

    /// `http` or `https`.
    pub scheme: String,

    /// Host with optional port, e.g. `localhost:8080`.
    pub host: String,

    /// Absolute path with optional query string. A full `http(s)://` URL is
    /// also accepted and then overrides scheme and host.
    pub path: String,

    /// Request headers, keyed by canonical header name.
    pub headers: IndexMap<String, String>,

    pub body: Option<String>,
}

impl HttpRequest {
    /// Builds the target URL.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        if self.path.starts_with("http://") || self.path.starts_with("https://") {
            return Url::parse(&self.path);
        }
        let separator = if self.path.starts_with('/') || self.path.is_empty() {
            ""
        } else {
            "/"
        };
        Url::parse(&format!(
            "{}://{}{}{}",
            self.scheme, self.host, separator, self.path
        ))
    }
}

impl fmt::Display for HttpRequest {
    /// Formats as `METHOD scheme://host/path`, the form used in failure reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.url() {
            Ok(url) => write!(f, "{} {}", self.method, url),
            Err(_) => write!(
                f,
                "{} {}://{}{}",
                self.method, self.scheme, self.host, self.path
            ),
        }
    }
}

/// Normalizes a header name to canonical MIME form (`content-type` becomes
/// `Content-Type`).
pub fn canonical_header_key(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!(
                    "{}{}",
                    first.to_ascii_uppercase(),
                    chars.as_str().to_ascii_lowercase()
                ),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
