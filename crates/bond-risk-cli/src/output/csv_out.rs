use std::io::{self, Write};
use tracing::warn;

use super::{Report, Section};

/// CSV blocks separated by a blank line: `field,value` for the scalars,
/// then one header row plus records per section. Warnings go to the log
/// so stdout stays parseable.
pub fn write_csv<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    for w in &report.warnings {
        warn!("{w}");
    }

    let mut first = true;
    if !report.fields.is_empty() {
        let rows: Vec<Vec<String>> = report
            .fields
            .iter()
            .map(|(k, v)| vec![k.clone(), v.clone()])
            .collect();
        write_block(out, &["field".to_string(), "value".to_string()], &rows)?;
        first = false;
    }

    for Section { name, headers, rows } in &report.sections {
        if !first {
            writeln!(out)?;
        }
        first = false;
        // Section name as a leading column keeps blocks self-describing
        let mut header = vec!["section".to_string()];
        header.extend(headers.iter().cloned());
        let tagged: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                let mut row = vec![name.clone()];
                row.extend(r.iter().cloned());
                row
            })
            .collect();
        write_block(out, &header, &tagged)?;
    }
    Ok(())
}

fn write_block<W: Write>(out: &mut W, header: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(&mut *out);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: serde_json::Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, &Report::from_value(&value)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_histogram_rows_are_records() {
        let text = render(json!({
            "result": {
                "var95": 1000.0,
                "histogram": [
                    {"label": "-20 to -10", "value": -15.0, "count": 4},
                    {"label": "-10 to 0", "value": -5.0, "count": 6}
                ]
            }
        }));
        let expected = "field,value\n\
                        var95,1000.0\n\
                        \n\
                        section,label,value,count\n\
                        histogram,-20 to -10,-15.0,4\n\
                        histogram,-10 to 0,-5.0,6\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_bond_list_without_envelope() {
        let text = render(json!([
            {"id": 1, "issuer": "U.S. Treasury", "cashflows": [{"year": 1}]}
        ]));
        assert_eq!(text, "section,id,issuer\nrows,1,U.S. Treasury\n");
    }
}
