use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::is_row_collection;

/// Print the envelope as text tables: result fields first, then one table
/// per row collection, then warnings and methodology.
pub fn print_table(value: &Value) {
    print!("{}", render(value));
}

fn render(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                render_record(&mut out, result);
                render_notes(&mut out, map);
            }
            _ => render_record(&mut out, map),
        },
        Value::Array(rows) => render_rows(&mut out, rows),
        other => out.push_str(&format!("{other}\n")),
    }
    out
}

fn render_record(out: &mut String, record: &Map<String, Value>) {
    let (sections, scalars): (Vec<_>, Vec<_>) = record
        .iter()
        .partition(|(_, v)| matches!(v, Value::Array(rows) if is_row_collection(rows)));

    let mut builder = Builder::default();
    builder.push_record(["Field".to_string(), "Value".to_string()]);
    for (key, val) in scalars {
        builder.push_record([key.clone(), cell(val)]);
    }
    out.push_str(&format!("{}\n", Table::from(builder)));

    for (key, val) in sections {
        if let Value::Array(rows) = val {
            out.push_str(&format!("\n{key}:\n"));
            render_rows(out, rows);
        }
    }
}

fn render_rows(out: &mut String, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            out.push_str("(empty)\n");
        }
        for row in rows {
            out.push_str(&format!("{}\n", cell(row)));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(cell).unwrap_or_default())
            .collect();
        builder.push_record(record);
    }
    out.push_str(&format!("{}\n", Table::from(builder)));
}

fn render_notes(out: &mut String, envelope: &Map<String, Value>) {
    let warnings: Vec<&str> = envelope
        .get("warnings")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    if !warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in warnings {
            out.push_str(&format!("  - {w}\n"));
        }
    }
    if let Some(methodology) = envelope.get("methodology").and_then(Value::as_str) {
        out.push_str(&format!("\nMethodology: {methodology}\n"));
    }
}

/// One table cell. Nested row collections (a plan's schedule, a snapshot's
/// balances) collapse to a row count.
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Array(items) if is_row_collection(items) => format!("[{} rows]", items.len()),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
