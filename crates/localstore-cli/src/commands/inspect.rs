//! Read-only commands: info, list, get, dump.

use localstore_storage::LocalStore;
use serde_json::json;

use crate::output;
use crate::GlobalOpts;

pub fn info(store: &mut LocalStore, opts: &GlobalOpts) -> std::result::Result<(), String> {
    let exists = store.storage_file_exists();
    let keys = store.len().map_err(|e| e.to_string())?;

    let fields = [
        ("data_dir", json!(store.data_dir().display().to_string())),
        ("storage_path", json!(store.storage_path().display().to_string())),
        ("file_exists", json!(exists)),
        ("keys", json!(keys)),
    ];
    output::print_fields(&fields, opts.json);
    Ok(())
}

pub fn list(store: &mut LocalStore, opts: &GlobalOpts) -> std::result::Result<(), String> {
    let keys = store.keys().map_err(|e| e.to_string())?;

    let mut rows = Vec::with_capacity(keys.len());
    for key in keys {
        let (kind, shown) = match store.get_value(&key).map_err(|e| e.to_string())? {
            Some(value) => (value.kind(), preview(&value.to_string())),
            None => ("-", String::new()),
        };
        rows.push(vec![key, kind.to_string(), shown]);
    }

    output::print_table(&["key", "kind", "value"], &rows, opts.json);
    Ok(())
}

pub fn get(store: &mut LocalStore, opts: &GlobalOpts, key: &str) -> std::result::Result<(), String> {
    match store.get_value(key).map_err(|e| e.to_string())? {
        Some(value) => {
            output::print_json_value(&value.to_json(), opts.json);
            Ok(())
        }
        None => Err(format!("key not found: {key}")),
    }
}

pub fn dump(store: &mut LocalStore, opts: &GlobalOpts) -> std::result::Result<(), String> {
    let json = store.dump_cache().map_err(|e| e.to_string())?;
    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| format!("invalid dump output: {e}"))?;
    output::print_json_value(&value, opts.json);
    Ok(())
}

/// Shortens long values for the list table.
fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 48;
    if text.chars().count() <= MAX_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_CHARS - 3).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("hoge"), "hoge");
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "x".repeat(100);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), 48);
        assert!(shown.ends_with("..."));
    }
}
