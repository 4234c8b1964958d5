//! Canonical signing payload.
//!
//! Every client SDK signs the exact byte sequence produced here, and the
//! verifier reconstructs it independently from the request fields. The rules
//! are shared across all SDK languages:
//!
//! - keys in alphabetical order, recursively for nested objects
//! - `": "` after every key, `", "` between members (objects and arrays)
//! - no HTML escaping
//! - `context` always present (empty object when absent)
//! - `risk_level` present only when non-empty
//! - `timestamp` as an integer of unix seconds
//!
//! Any deviation silently breaks cross-SDK signature validation, so changes
//! here must ship in lockstep with every SDK.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The signed fields of an action request
#[derive(Debug, Clone)]
pub struct ActionPayload {
    /// UUID of the requesting agent, in its string form
    pub agent_id: String,
    /// The action being requested
    pub action_type: String,
    /// The resource the action targets
    pub resource: String,
    /// Free-form request context
    pub context: Map<String, Value>,
    /// Unix seconds at signing time
    pub timestamp: i64,
    /// Optional client-supplied risk hint
    pub risk_level: Option<String>,
}

impl ActionPayload {
    /// Build the canonical map of signed fields
    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("action_type".into(), Value::String(self.action_type.clone()));
        map.insert("agent_id".into(), Value::String(self.agent_id.clone()));
        map.insert("context".into(), Value::Object(self.context.clone()));
        map.insert("resource".into(), Value::String(self.resource.clone()));
        map.insert(
            "timestamp".into(),
            Value::Number(serde_json::Number::from(self.timestamp)),
        );
        if let Some(risk_level) = &self.risk_level {
            if !risk_level.is_empty() {
                map.insert("risk_level".into(), Value::String(risk_level.clone()));
            }
        }
        Value::Object(map)
    }

    /// The exact byte sequence clients sign and the verifier checks
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_json(&self.to_value()).into_bytes()
    }
}

/// Serialize a JSON value in the canonical cross-SDK form
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            // BTreeMap gives the alphabetical key order every SDK produces
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, val)) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, &Value::String((*key).clone()));
                out.push_str(": ");
                write_value(out, val);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        // Scalars use serde_json's compact form, which never HTML-escapes
        scalar => out.push_str(&scalar.to_string()),
    }
}
