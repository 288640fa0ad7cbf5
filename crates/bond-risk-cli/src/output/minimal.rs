use serde_json::Value;
use std::io::{self, Write};

use super::cell;

/// The headline number of each command, in lookup order: simulate,
/// summary, rebalance, state, version.
const HEADLINE_KEYS: [&str; 7] = [
    "var95",
    "weighted_duration",
    "applied_shift",
    "total_market_value",
    "removed",
    "saved",
    "version",
];

/// Print only the headline value. Lists print their length.
pub fn write_minimal<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    writeln!(out, "{}", headline(result))
}

fn headline(result: &Value) -> String {
    match result {
        Value::Object(map) => {
            // A summary nested under an analysis still has a headline
            let scope = map.get("summary").and_then(Value::as_object).unwrap_or(map);
            HEADLINE_KEYS
                .iter()
                .find_map(|k| scope.get(*k).filter(|v| !v.is_null()))
                .or_else(|| map.get("bonds"))
                .map(|v| match v {
                    Value::Array(items) => items.len().to_string(),
                    other => cell(other),
                })
                .or_else(|| map.iter().next().map(|(k, v)| format!("{k}: {}", cell(v))))
                .unwrap_or_default()
        }
        Value::Array(items) => items.len().to_string(),
        other => cell(other),
    }
}
