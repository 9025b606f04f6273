use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                write_result_csv(&mut wtr, result);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Row-shaped results export their rows; everything else is field,value.
fn write_result_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, result: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(rows)) = result.get("schedule") {
        write_array_csv(wtr, rows);
    } else if let Some(Value::Array(rows)) = result.get("yearly") {
        write_array_csv(wtr, rows);
    } else if let Some(Value::Array(plans)) = result.get("plans") {
        write_array_csv(wtr, &flatten_plans(plans));
    } else {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in result {
            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
        }
    }
}

/// One row per card per month, tagged with the card id.
fn flatten_plans(plans: &[Value]) -> Vec<Value> {
    let mut rows = Vec::new();
    for plan in plans {
        let card_id = plan.get("card_id").cloned().unwrap_or(Value::Null);
        if let Some(Value::Array(periods)) = plan.get("schedule") {
            for period in periods {
                if let Value::Object(fields) = period {
                    let mut row = serde_json::Map::new();
                    row.insert("card_id".to_string(), card_id.clone());
                    row.extend(fields.clone());
                    rows.push(Value::Object(row));
                }
            }
        }
    }
    rows
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(*h)
                            .map(|v| format_csv_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
