pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};
use std::io;

/// Write a command result to stdout in the requested format.
pub fn format_output(format: &OutputFormat, value: &Value) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => json::write_json(&mut out, value),
        OutputFormat::Table => table::write_table(&mut out, &Report::from_value(value)),
        OutputFormat::Csv => csv_out::write_csv(&mut out, &Report::from_value(value)),
        OutputFormat::Minimal => minimal::write_minimal(&mut out, value),
    }
}

/// A list of records rendered as its own table: a breakdown, the
/// histogram, positions or bonds.
#[derive(Debug, Default, PartialEq)]
pub struct Section {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A command result split into what the tabular formats print.
///
/// Scalars of the result become `field, value` pairs, with nested objects
/// flattened to dotted keys (`summary.weighted_duration`). Arrays of
/// objects anywhere in the result become sections. Lists inside a record
/// (a bond's cashflows) are left to JSON output.
#[derive(Debug, Default, PartialEq)]
pub struct Report {
    pub fields: Vec<(String, String)>,
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
    pub methodology: Option<String>,
}

impl Report {
    pub fn from_value(value: &Value) -> Report {
        let mut report = Report::default();

        let body = match value {
            Value::Object(map) if map.contains_key("result") => {
                if let Some(Value::Array(ws)) = map.get("warnings") {
                    report.warnings = ws.iter().filter_map(|w| w.as_str().map(String::from)).collect();
                }
                report.methodology = map
                    .get("methodology")
                    .and_then(Value::as_str)
                    .map(String::from);
                &map["result"]
            }
            other => other,
        };

        match body {
            Value::Object(map) => report.collect("", map),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                report.sections.push(section("rows", items));
            }
            other => report.fields.push(("value".into(), cell(other))),
        }
        report
    }

    fn collect(&mut self, prefix: &str, map: &Map<String, Value>) {
        for (key, val) in map {
            let name = dotted(prefix, key);
            match val {
                Value::Object(inner) => self.collect(&name, inner),
                Value::Array(items) if items.iter().any(Value::is_object) => {
                    self.sections.push(section(&name, items));
                }
                other => self.fields.push((name, cell(other))),
            }
        }
    }
}

fn section(name: &str, items: &[Value]) -> Section {
    let records: Vec<Vec<(String, String)>> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            let mut cols = Vec::new();
            flatten_record("", map, &mut cols);
            cols
        })
        .collect();

    // Union of columns in first-seen order
    let mut headers: Vec<String> = Vec::new();
    for rec in &records {
        for (k, _) in rec {
            if !headers.contains(k) {
                headers.push(k.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|rec| {
            headers
                .iter()
                .map(|h| {
                    rec.iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    Section {
        name: name.to_string(),
        headers,
        rows,
    }
}

fn flatten_record(prefix: &str, map: &Map<String, Value>, cols: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = dotted(prefix, key);
        match val {
            Value::Object(inner) => flatten_record(&name, inner, cols),
            Value::Array(items) if items.iter().any(Value::is_object) => {}
            other => cols.push((name, cell(other))),
        }
    }
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Render a scalar (or a list of scalars) as one cell.
pub fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_splits_fields_sections_and_notes() {
        let value = json!({
            "result": {
                "var95": 1250.5,
                "histogram": [
                    {"label": "-10 to 0", "value": -5.0, "count": 3},
                    {"label": "0 to 10", "value": 5.0, "count": 7}
                ]
            },
            "methodology": "Monte Carlo",
            "warnings": ["few scenarios"],
            "metadata": {"version": "0.1.0"}
        });
        let report = Report::from_value(&value);
        assert_eq!(report.fields, vec![("var95".to_string(), "1250.5".to_string())]);
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].name, "histogram");
        assert_eq!(report.sections[0].headers, vec!["label", "value", "count"]);
        assert_eq!(report.sections[0].rows[1], vec!["0 to 10", "5.0", "7"]);
        assert_eq!(report.warnings, vec!["few scenarios"]);
        assert_eq!(report.methodology.as_deref(), Some("Monte Carlo"));
    }

    #[test]
    fn test_nested_objects_use_dotted_names() {
        let value = json!({
            "result": {
                "summary": {
                    "weighted_duration": "6.1",
                    "sector_breakdown": [{"category": "Energy", "count": 2}]
                },
                "positions": [
                    {"bond": {"id": 1, "cashflows": [{"year": 1}]}, "market_value": "10"}
                ]
            }
        });
        let report = Report::from_value(&value);
        assert_eq!(report.fields[0].0, "summary.weighted_duration");
        let names: Vec<&str> = report.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["summary.sector_breakdown", "positions"]);
        // Per-bond cashflows are not a column
        assert_eq!(report.sections[1].headers, vec!["bond.id", "market_value"]);
    }

    #[test]
    fn test_bare_bond_list_is_one_section() {
        let value = json!([{"id": 1, "issuer": "A"}, {"id": 2, "rating": "BBB"}]);
        let report = Report::from_value(&value);
        assert!(report.fields.is_empty());
        let s = &report.sections[0];
        assert_eq!(s.headers, vec!["id", "issuer", "rating"]);
        assert_eq!(s.rows[1], vec!["2", "", "BBB"]);
    }
}
