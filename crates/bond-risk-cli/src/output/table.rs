use std::io::{self, Write};
use tabled::{builder::Builder, Table};

use super::{Report, Section};

/// Scalars as a `Field | Value` table, then one table per section, then
/// warnings and methodology.
pub fn write_table<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    if report.fields.is_empty() && report.sections.is_empty() {
        writeln!(out, "(empty)")?;
    }

    if !report.fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &report.fields {
            builder.push_record([key.as_str(), val.as_str()]);
        }
        writeln!(out, "{}", Table::from(builder))?;
    }

    for (i, section) in report.sections.iter().enumerate() {
        if i > 0 || !report.fields.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "{} ({}):", section.name, section.rows.len())?;
        write_section(out, section)?;
    }

    if !report.warnings.is_empty() {
        writeln!(out, "\nWarnings:")?;
        for w in &report.warnings {
            writeln!(out, "  - {w}")?;
        }
    }
    if let Some(m) = &report.methodology {
        writeln!(out, "\nMethodology: {m}")?;
    }
    Ok(())
}

fn write_section<W: Write>(out: &mut W, section: &Section) -> io::Result<()> {
    if section.rows.is_empty() {
        return writeln!(out, "(empty)");
    }
    let mut builder = Builder::default();
    builder.push_record(section.headers.iter().map(String::as_str));
    for row in &section.rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    writeln!(out, "{}", Table::from(builder))
}
