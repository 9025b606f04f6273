pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Print a command's output envelope in the requested format.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Non-empty arrays of objects: amortization rows, yearly SIP points,
/// per-card plans and the balance timeline.
pub(crate) fn is_row_collection(rows: &[Value]) -> bool {
    rows.first().is_some_and(Value::is_object)
}
