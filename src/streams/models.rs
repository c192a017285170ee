// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One row of the streams table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamItem {
    /// Stream name, unique within an instance
    pub name: String,

    /// Number of tuples that went through the stream
    #[serde(rename = "dataCount", default, deserialize_with = "deserialize_count")]
    pub data_count: u64,
}

impl StreamItem {
    pub fn new(name: impl Into<String>, data_count: u64) -> Self {
        Self {
            name: name.into(),
            data_count,
        }
    }
}

/// Tag of a pushed stream event.
///
/// Tags this build does not know about are kept in `Other` so they can be
/// reported instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StreamEventKind {
    Created,
    Updated,
    Deleted,
    Other(String),
}

impl From<String> for StreamEventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "CREATED" => StreamEventKind::Created,
            "UPDATED" => StreamEventKind::Updated,
            "DELETED" => StreamEventKind::Deleted,
            _ => StreamEventKind::Other(tag),
        }
    }
}

impl From<StreamEventKind> for String {
    fn from(kind: StreamEventKind) -> Self {
        match kind {
            StreamEventKind::Created => "CREATED".to_string(),
            StreamEventKind::Updated => "UPDATED".to_string(),
            StreamEventKind::Deleted => "DELETED".to_string(),
            StreamEventKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for StreamEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEventKind::Created => f.write_str("CREATED"),
            StreamEventKind::Updated => f.write_str("UPDATED"),
            StreamEventKind::Deleted => f.write_str("DELETED"),
            StreamEventKind::Other(tag) => f.write_str(tag),
        }
    }
}

/// A create/update/delete notification for a single stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: StreamEventKind,

    pub name: String,

    /// Absent on DELETED events
    #[serde(rename = "dataCount", default, deserialize_with = "deserialize_count")]
    pub data_count: u64,
}

impl StreamEvent {
    pub fn created(name: impl Into<String>, data_count: u64) -> Self {
        Self {
            kind: StreamEventKind::Created,
            name: name.into(),
            data_count,
        }
    }

    pub fn updated(name: impl Into<String>, data_count: u64) -> Self {
        Self {
            kind: StreamEventKind::Updated,
            name: name.into(),
            data_count,
        }
    }

    pub fn deleted(name: impl Into<String>) -> Self {
        Self {
            kind: StreamEventKind::Deleted,
            name: name.into(),
            data_count: 0,
        }
    }
}

/// Accepts a count either as a JSON number or as a decimal string.
/// The server encodes 64-bit integers as strings.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
