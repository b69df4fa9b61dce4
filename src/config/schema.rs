//! Schema of the YAML test-data files.
//!
//! A test-data directory holds one context file (`_context.yaml` by default)
//! and any number of case files. Both are deserialized into the types below
//! with `serde_yaml`. Every string that may reference variables is a
//! [`Template`] and is parsed while loading, so template syntax errors are
//! reported against the file that contains them.

use crate::template::Template;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Contents of a directory's context file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContextConfig {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub description: String,

    /// Presetters applied, in order, to the inherited round-trip template.
    #[serde(default, alias = "presetter")]
    pub presetters: Vec<PresetConfig>,

    /// Setup round trips run every time the context is activated.
    #[serde(default)]
    pub flow: Vec<RoundTripConfig>,

    /// Setup round trips that only rerun when their validator fails.
    #[serde(default)]
    pub validated_flow: Vec<ValidatedFlowConfig>,

    #[serde(default, alias = "cleaner")]
    pub cleaners: Vec<CleanerConfig>,

    /// Variables made visible to child contexts and cases.
    #[serde(default)]
    pub exports: Vec<ExportConfig>,
}

/// Contents of a case file: one leaf test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseConfig {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub flow: Vec<RoundTripConfig>,

    /// Tags matched against the focus and skip label sets.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// One templated request/response exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoundTripConfig {
    #[serde(default)]
    pub description: String,

    /// Name of a registered HTTP client to send this request with.
    #[serde(default)]
    pub client: Option<String>,

    /// Number of iterations. Zero runs the round trip once, without an iterator.
    #[serde(default, rename = "loop")]
    pub loop_count: usize,

    #[serde(default)]
    pub when: Option<WhenConfig>,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub response: ResponseConfig,

    #[serde(default)]
    pub definitions: Vec<DefinitionConfig>,
}

/// A boolean condition guarding a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WhenConfig {
    pub expr: String,

    /// Named parameters, rendered before evaluation.
    #[serde(default)]
    pub args: IndexMap<String, Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequestConfig {
    #[serde(default)]
    pub host: Option<Template>,

    #[serde(default)]
    pub scheme: Option<Template>,

    /// `METHOD /path`. A backtick-wrapped path is used verbatim.
    #[serde(default)]
    pub api: Option<Template>,

    #[serde(default)]
    pub headers: IndexMap<String, Template>,

    #[serde(default)]
    pub body: Option<Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseConfig {
    /// Expected status. Absent means unchecked.
    #[serde(default)]
    pub status_code: Option<u16>,

    #[serde(default)]
    pub headers: IndexMap<String, Template>,

    /// JSON pattern for the body. Absent means unchecked; an empty template
    /// means the body must be empty.
    #[serde(default)]
    pub body: Option<Template>,

    #[serde(default)]
    pub eventually: Option<EventuallyConfig>,
}

/// Polling settings. Durations are written Go style: `1s`, `250ms`, `1m30s`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventuallyConfig {
    #[serde(default, deserialize_with = "deserialize_duration", serialize_with = "serialize_duration")]
    pub timeout: Option<Duration>,

    #[serde(default, deserialize_with = "deserialize_duration", serialize_with = "serialize_duration")]
    pub interval: Option<Duration>,
}

/// Where a defined variable is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DefinitionType {
    #[default]
    Body,
    Header,
    Status,
}

impl DefinitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionType::Body => "body",
            DefinitionType::Header => "header",
            DefinitionType::Status => "status",
        }
    }
}

impl fmt::Display for DefinitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefinitionType {
    type Err = String;

    /// An empty type means `body`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "body" => Ok(DefinitionType::Body),
            "header" => Ok(DefinitionType::Header),
            "status" => Ok(DefinitionType::Status),
            other => Err(format!(
                "unknown definition type {:?}, only [body, header, status] is allowed",
                other
            )),
        }
    }
}

impl Serialize for DefinitionType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DefinitionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A rule binding a variable from the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DefinitionConfig {
    pub name: String,

    #[serde(default, rename = "type")]
    pub kind: DefinitionType,

    /// Path into the body, or the single header name. Unused for status.
    #[serde(default)]
    pub selector: Vec<Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PresetConfig {
    pub name: String,

    #[serde(default)]
    pub args: IndexMap<String, Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CleanerConfig {
    pub name: String,

    /// Run after every case in the subtree instead of only after the last.
    #[serde(default)]
    pub for_each: bool,

    #[serde(default)]
    pub args: IndexMap<String, Template>,
}

/// A constructor flow guarded by a validator flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidatedFlowConfig {
    #[serde(default)]
    pub constructor: Vec<RoundTripConfig>,

    #[serde(default)]
    pub validator: Vec<RoundTripConfig>,
}

/// A variable exported from a context to its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportConfig {
    pub name: String,

    /// Path in the context scope, starting with a variable name. Defaults
    /// to the exported name itself.
    #[serde(default)]
    pub selector: Vec<Template>,
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => humantime::parse_duration(raw.trim())
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {:?}: {}", raw, e))),
    }
}

fn serialize_duration<S: serde::Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
        None => serializer.serialize_none(),
    }
}
