//! Converts source feeds into canonical [`App`] records.
//!
//! Two feed layouts are recognised per app entry:
//! - AltStore style, with a `versions` array of release objects.
//! - Flat style, where `version`/`downloadURL` sit directly on the app.
//!
//! Every read falls back to an empty value so partial feeds still load.
use crate::error::CatalogError;
use crate::models::{App, Version};
use serde_json::{Map, Value};

const BUNDLE_KEYS: &[&str] = &["bundleIdentifier", "bundleID", "bundleId", "bundle_id"];
const NAME_KEYS: &[&str] = &["name", "title"];
const DEVELOPER_KEYS: &[&str] = &["developerName", "developer", "dev"];
const ICON_KEYS: &[&str] = &["iconURL", "iconUrl", "icon"];
const DESCRIPTION_KEYS: &[&str] = &["localizedDescription", "description", "subtitle"];

const VERSION_KEYS: &[&str] = &["version"];
const DOWNLOAD_KEYS: &[&str] = &["downloadURL", "downloadUrl", "down"];
const RELEASE_DATE_KEYS: &[&str] = &["date", "versionDate", "releaseDate"];
const RELEASE_NOTES_KEYS: &[&str] = &["localizedDescription", "versionDescription", "changelog", "notes"];

// Flat feeds put release fields on the app itself, where `localizedDescription`
// is the app description rather than release notes.
const FLAT_DATE_KEYS: &[&str] = &["versionDate", "date", "releaseDate"];
const FLAT_NOTES_KEYS: &[&str] = &["versionDescription", "changelog"];

fn text(obj: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

fn size(obj: &Map<String, Value>) -> Option<u64> {
    match obj.get("size")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn has_any(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    !text(obj, keys).is_empty()
}

fn release_from(
    obj: &Map<String, Value>,
    date_keys: &[&str],
    notes_keys: &[&str],
    source_url: &str,
) -> Version {
    Version {
        version: text(obj, VERSION_KEYS),
        date: text(obj, date_keys),
        download_url: text(obj, DOWNLOAD_KEYS),
        notes: text(obj, notes_keys),
        size: size(obj),
        source: source_url.to_string(),
    }
}

fn normalize_versions(entry: &Map<String, Value>, source_url: &str) -> Vec<Version> {
    let listed: Vec<Version> = entry
        .get("versions")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .map(|v| release_from(v, RELEASE_DATE_KEYS, RELEASE_NOTES_KEYS, source_url))
                .collect()
        })
        .unwrap_or_default();

    if !listed.is_empty() {
        return listed;
    }

    if has_any(entry, VERSION_KEYS) || has_any(entry, DOWNLOAD_KEYS) {
        return vec![release_from(entry, FLAT_DATE_KEYS, FLAT_NOTES_KEYS, source_url)];
    }

    Vec::new()
}

fn normalize_app(entry: &Map<String, Value>, source_url: &str) -> App {
    App {
        bundle_id: text(entry, BUNDLE_KEYS),
        name: text(entry, NAME_KEYS),
        developer: text(entry, DEVELOPER_KEYS),
        icon_url: text(entry, ICON_KEYS),
        description: text(entry, DESCRIPTION_KEYS),
        source: source_url.to_string(),
        sources: vec![source_url.to_string()],
        versions: normalize_versions(entry, source_url),
    }
}

fn normalize_entries(entries: &[Value], source_url: &str) -> Vec<App> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| normalize_app(entry, source_url))
        .collect()
}

/// Normalizes one parsed feed document.
///
/// Object documents read their `apps` array (missing means no apps). A bare
/// array is read as the app list itself. Anything else is rejected as an
/// invalid document.
pub fn normalize(raw: &Value, source_url: &str) -> Result<Vec<App>, CatalogError> {
    match raw {
        Value::Object(doc) => Ok(doc
            .get("apps")
            .and_then(Value::as_array)
            .map(|apps| normalize_entries(apps, source_url))
            .unwrap_or_default()),
        Value::Array(apps) => Ok(normalize_entries(apps, source_url)),
        _ => Err(CatalogError::InvalidDocument {
            source_url: source_url.to_string(),
        }),
    }
}
