//! Authentication presetters.
//!
//! Both presetters set the `Authorization` request header: `basicAuth`
//! following RFC 7617, `bearerAuth` following RFC 6750.

use super::{required, PresetError, Presetter};
use crate::models::RoundTripTemplate;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;

/// Encodes username and password into a Basic authentication header value.
///
/// # Examples
///
/// ```
/// use aloe::preset::basic_auth;
///
/// assert_eq!(basic_auth("user", "pass123"), "Basic dXNlcjpwYXNzMTIz");
/// ```
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}

/// Formats a token into a Bearer authentication header value.
pub fn bearer_token(token: &str) -> String {
    format!("Bearer {}", token)
}

/// `basicAuth`: `username` is required, `password` defaults to empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuthPresetter;

impl Presetter for BasicAuthPresetter {
    fn name(&self) -> &str {
        "basicAuth"
    }

    fn preset(
        &self,
        mut template: RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<RoundTripTemplate, PresetError> {
        let username = required(args, "username")?;
        let password = args.get("password").map(String::as_str).unwrap_or_default();
        template
            .request
            .set_header("Authorization", basic_auth(username, password));
        Ok(template)
    }
}

/// `bearerAuth`: `token` is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerAuthPresetter;

impl Presetter for BearerAuthPresetter {
    fn name(&self) -> &str {
        "bearerAuth"
    }

    fn preset(
        &self,
        mut template: RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<RoundTripTemplate, PresetError> {
        let token = required(args, "token")?;
        if token.trim().is_empty() {
            return Err(PresetError::InvalidArg {
                arg: "token".to_string(),
                value: token.to_string(),
                reason: "should not be empty".to_string(),
            });
        }
        template
            .request
            .set_header("Authorization", bearer_token(token.trim()));
        Ok(template)
    }
}
