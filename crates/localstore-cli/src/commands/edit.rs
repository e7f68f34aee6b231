//! Commands that change the storage file: set, delete, clear,
//! remove-file.

use localstore_storage::LocalStore;
use localstore_types::Value;

use crate::output;
use crate::GlobalOpts;

pub fn set(
    store: &mut LocalStore,
    opts: &GlobalOpts,
    key: &str,
    raw: &str,
) -> std::result::Result<(), String> {
    let value = parse_value(raw);
    let kind = value.kind();
    store.set_value(key, value).map_err(|e| e.to_string())?;
    store.save().map_err(|e| e.to_string())?;
    output::print_success(&format!("stored {kind} under {key:?}"), opts.json);
    Ok(())
}

pub fn delete(store: &mut LocalStore, opts: &GlobalOpts, key: &str) -> std::result::Result<(), String> {
    if !store.has_key(key).map_err(|e| e.to_string())? {
        return Err(format!("key not found: {key}"));
    }
    store.delete_key(key).map_err(|e| e.to_string())?;
    store.save().map_err(|e| e.to_string())?;
    output::print_success(&format!("deleted {key:?}"), opts.json);
    Ok(())
}

pub fn clear(store: &mut LocalStore, opts: &GlobalOpts) -> std::result::Result<(), String> {
    store.delete_all().map_err(|e| e.to_string())?;
    output::print_success("local storage cleared", opts.json);
    Ok(())
}

pub fn remove_file(store: &mut LocalStore, opts: &GlobalOpts) -> std::result::Result<(), String> {
    let path = store.storage_path().display().to_string();
    if store.delete_storage_file().map_err(|e| e.to_string())? {
        output::print_success(&format!("deleted {path}"), opts.json);
    } else {
        output::print_success(&format!("nothing to delete at {path}"), opts.json);
    }
    Ok(())
}

/// Interprets a command-line value: JSON when it parses, otherwise the
/// literal text.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from_json(json),
        Err(_) => Value::from(raw),
    }
}
