// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The record type carried through the pipeline.
//!
//! An [`Entry`] is either a log or an event. Payloads are opaque JSON values;
//! the relay never inspects them. On disk every entry is one line of the form
//!
//! ```text
//! {"type":"log","value":{...}}
//! {"type":"event","value":{...}}
//! ```
//!
//! The `type` tag is always present, so decoding never has to guess which
//! variant a payload belongs to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Entry {
    Log(Value),
    Event(Value),
}

impl Entry {
    #[must_use]
    pub fn log(payload: impl Into<Value>) -> Self {
        Self::Log(payload.into())
    }

    #[must_use]
    pub fn event(payload: impl Into<Value>) -> Self {
        Self::Event(payload.into())
    }

    /// Discriminator written to the `type` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Event(_) => "event",
        }
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        match self {
            Self::Log(value) | Self::Event(value) => value,
        }
    }

    /// Compact single-line encoding, without the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Splits a batch into log and event payloads, keeping the relative order
/// within each kind.
#[must_use]
pub fn partition(entries: &[Entry]) -> (Vec<&Value>, Vec<&Value>) {
    let mut logs = Vec::new();
    let mut events = Vec::new();
    for entry in entries {
        match entry {
            Entry::Log(value) => logs.push(value),
            Entry::Event(value) => events.push(value),
        }
    }
    (logs, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_envelope() {
        let entry = Entry::log(json!({"message": "hello", "level": "info"}));
        let line = entry.to_line().expect("encode");
        let raw: Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(raw["type"], "log");
        assert_eq!(raw["value"]["message"], "hello");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_round_trip_both_variants() {
        for entry in [
            Entry::log(json!({"message": "a", "nested": {"k": [1, 2, 3]}})),
            Entry::event(json!({"name": "click", "target": "button"})),
            Entry::event(json!(null)),
        ] {
            let decoded = Entry::from_line(&entry.to_line().expect("encode")).expect("decode");
            assert_eq!(decoded, entry);
            assert_eq!(decoded.kind(), entry.kind());
        }
    }

    #[test]
    fn test_decode_dispatches_on_tag() {
        let entry = Entry::from_line(r#"{"value":{"name":"x"},"type":"event"}"#).expect("decode");
        assert_eq!(entry, Entry::event(json!({"name": "x"})));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert!(Entry::from_line(r#"{"type":"metric","value":1}"#).is_err());
        assert!(Entry::from_line(r#"{"value":1}"#).is_err());
        assert!(Entry::from_line("not json").is_err());
    }

    #[test]
    fn test_partition_keeps_order_per_kind() {
        let entries = vec![
            Entry::log(json!(1)),
            Entry::event(json!("a")),
            Entry::log(json!(2)),
            Entry::event(json!("b")),
        ];
        let (logs, events) = partition(&entries);
        assert_eq!(logs, vec![&json!(1), &json!(2)]);
        assert_eq!(events, vec![&json!("a"), &json!("b")]);
    }
}
