//! composer.json repository list

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::parser::read_json;
use crate::parser::types::{ComposerRepository, ParseError};

#[derive(Debug, Default, Deserialize)]
struct ComposerJson {
    #[serde(default)]
    repositories: Value,
}

/// `composer`-type repositories, accepting both the list and the keyed form.
///
/// Entries such as `{"packagist.org": false}` or other repository types are
/// ignored.
pub fn read_repositories(path: &Path) -> Result<Vec<ComposerRepository>, ParseError> {
    let composer: ComposerJson = read_json(path)?;
    Ok(repositories_from(&composer.repositories))
}

fn repositories_from(value: &Value) -> Vec<ComposerRepository> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("composer"))
        .filter_map(|entry| entry.get("url").and_then(Value::as_str))
        .map(|url| ComposerRepository {
            url: url.to_string(),
        })
        .collect()
}
