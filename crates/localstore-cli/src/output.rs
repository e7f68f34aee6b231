//! Terminal output for the inspector.
//!
//! Every printer takes `json_mode`. In JSON mode each command writes
//! exactly one JSON document to stdout (errors go to stderr), with no
//! ANSI escapes. Otherwise output is colored for a terminal.
//!
//! Rendering is split from printing so the layouts can be unit tested.

use colored::Colorize;
use serde_json::{Map, Value as JsonValue};

/// Column separator in human-readable tables.
const GAP: &str = "  ";

// ---------------------------------------------------------------------------
// Status lines
// ---------------------------------------------------------------------------

pub fn print_success(msg: &str, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::json!({ "status": "ok", "message": msg }));
    } else {
        println!("{} {msg}", "ok".green().bold());
    }
}

pub fn print_error(msg: &str, json_mode: bool) {
    if json_mode {
        eprintln!("{}", serde_json::json!({ "error": msg }));
    } else {
        eprintln!("{} {msg}", "error:".red().bold());
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Prints a stored value or a whole dump: compact in JSON mode, indented
/// otherwise.
pub fn print_json_value(value: &JsonValue, json_mode: bool) {
    if json_mode {
        println!("{value}");
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => print_error(&format!("cannot format value: {e}"), false),
    }
}

/// Prints named fields as one JSON object, or as aligned
/// `label: value` lines.
pub fn print_fields(fields: &[(&str, JsonValue)], json_mode: bool) {
    if json_mode {
        println!("{}", fields_object(fields));
        return;
    }
    for (label, value) in render_fields(fields) {
        println!("{} {value}", label.bold());
    }
}

fn fields_object(fields: &[(&str, JsonValue)]) -> JsonValue {
    let map: Map<String, JsonValue> = fields
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.clone()))
        .collect();
    JsonValue::Object(map)
}

/// Human labels are the field names with spaces, padded to a common
/// width.
fn render_fields(fields: &[(&str, JsonValue)]) -> Vec<(String, String)> {
    let labels: Vec<String> = fields
        .iter()
        .map(|(name, _)| format!("{}:", name.replace('_', " ")))
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    labels
        .into_iter()
        .zip(fields)
        .map(|(label, (_, value))| (format!("{label:<width$}"), plain(value)))
        .collect()
}

/// Strings print without quotes, everything else as compact JSON.
fn plain(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Prints rows under `headers`: a JSON array of objects keyed by header,
/// or an aligned text table.
pub fn print_table(headers: &[&str], rows: &[Vec<String>], json_mode: bool) {
    if json_mode {
        println!("{}", rows_array(headers, rows));
        return;
    }
    if rows.is_empty() {
        println!("{}", "(empty)".dimmed());
        return;
    }

    let lines = render_table(headers, rows);
    for (i, line) in lines.iter().enumerate() {
        match i {
            0 => println!("{}", line.bold()),
            1 => println!("{}", line.dimmed()),
            _ => println!("{line}"),
        }
    }
}

fn rows_array(headers: &[&str], rows: &[Vec<String>]) -> JsonValue {
    rows.iter()
        .map(|row| {
            let object: Map<String, JsonValue> = headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let cell = row.get(i).cloned().unwrap_or_default();
                    ((*h).to_owned(), JsonValue::String(cell))
                })
                .collect();
            JsonValue::Object(object)
        })
        .collect()
}

/// Header line, rule line, then one line per row. Widths count chars,
/// not bytes, so non-ASCII keys stay aligned.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let join = |cells: Vec<String>| cells.join(GAP).trim_end().to_owned();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(join(
        headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(&h.to_uppercase(), *w))
            .collect(),
    ));
    lines.push(join(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        lines.push(join(
            widths
                .iter()
                .enumerate()
                .map(|(i, w)| pad(row.get(i).map_or("", String::as_str), *w))
                .collect(),
        ));
    }
    lines
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.chars().count());
    format!("{cell}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_become_one_object() {
        let fields = [("file_exists", json!(false)), ("keys", json!(3))];
        assert_eq!(fields_object(&fields), json!({ "file_exists": false, "keys": 3 }));
    }

    #[test]
    fn field_labels_are_aligned() {
        let fields = [("data_dir", json!("/tmp/x")), ("keys", json!(2))];
        let lines = render_fields(&fields);
        assert_eq!(lines[0], ("data dir:".to_owned(), "/tmp/x".to_owned()));
        assert_eq!(lines[1], ("keys:    ".to_owned(), "2".to_owned()));
    }

    #[test]
    fn table_columns_fit_widest_cell() {
        let rows = vec![
            vec!["hp".to_owned(), "int".to_owned()],
            vec!["player_name".to_owned(), "string".to_owned()],
        ];
        let lines = render_table(&["key", "kind"], &rows);
        assert_eq!(lines[0], "KEY          KIND");
        assert_eq!(lines[1], "-----------  ------");
        assert_eq!(lines[2], "hp           int");
        assert_eq!(lines[3], "player_name  string");
    }

    #[test]
    fn table_width_counts_chars() {
        let rows = vec![vec!["日本".to_owned(), "x".to_owned()]];
        let lines = render_table(&["k", "v"], &rows);
        assert_eq!(lines[2], "日本  x");
    }

    #[test]
    fn rows_array_fills_missing_cells() {
        let rows = vec![vec!["only".to_owned()]];
        assert_eq!(
            rows_array(&["key", "kind"], &rows),
            json!([{ "key": "only", "kind": "" }])
        );
    }
}
