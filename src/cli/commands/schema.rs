//! `schema` command
//!
//! Prints the accepted top-level keys, their value types and defaults.

use std::fmt::Write as _;
use std::io::Write as _;

use serde::Serialize;

use crate::cli::args::{OutputFormat, SchemaArgs};
use crate::config::table::{KeySpec, SCHEMA};
use crate::error::Era5CfgError;

#[derive(Debug, Serialize)]
struct KeyEntry {
    key: &'static str,
    required: bool,
    expected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    description: &'static str,
}

impl From<&KeySpec> for KeyEntry {
    fn from(spec: &KeySpec) -> Self {
        Self {
            key: spec.key,
            required: spec.is_required(),
            expected: spec.kind.expected(),
            default: spec.default.map(|d| d.describe()),
            description: spec.description,
        }
    }
}

/// Prints the schema table.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing to stdout fails.
pub fn run(args: &SchemaArgs) -> Result<(), Era5CfgError> {
    let entries: Vec<KeyEntry> = SCHEMA.iter().map(KeyEntry::from).collect();
    let text = match args.format {
        OutputFormat::Human => render_human(&entries),
        OutputFormat::Json => serde_json::to_string_pretty(&entries)? + "\n",
    };
    std::io::stdout().lock().write_all(text.as_bytes())?;
    Ok(())
}

fn render_human(entries: &[KeyEntry]) -> String {
    let width = entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        let status = entry
            .default
            .as_ref()
            .map_or_else(|| "required".to_string(), |d| format!("default: {d}"));
        let _ = writeln!(
            out,
            "{:width$}  {} [{status}]\n{:width$}  expects {}",
            entry.key, entry.description, "", entry.expected
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<KeyEntry> {
        SCHEMA.iter().map(KeyEntry::from).collect()
    }

    #[test]
    fn test_required_keys_have_no_default() {
        for entry in entries() {
            assert_eq!(entry.required, entry.default.is_none(), "key {}", entry.key);
        }
    }

    #[test]
    fn test_human_lists_every_key() {
        let text = render_human(&entries());
        for spec in SCHEMA {
            assert!(text.contains(spec.key), "missing {}", spec.key);
        }
        assert!(text.contains("required"));
        assert!(text.contains("default: global"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(entries()).unwrap();
        let freq = json
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["key"] == "freq")
            .unwrap();
        assert_eq!(freq["required"], true);
        assert!(freq["expected"].as_str().unwrap().contains("mon"));
        assert!(freq.get("default").is_none());
    }
}
