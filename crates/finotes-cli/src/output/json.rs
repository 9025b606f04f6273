use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the envelope to stdout, newline terminated.
pub fn print_json(value: &Value) {
    let mut stdout = io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(io::Error::from)
        .and_then(|()| writeln!(stdout));
    if let Err(e) = written {
        eprintln!("failed to write JSON output: {e}");
    }
}
