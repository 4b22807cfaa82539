//! Sample document loading
//!
//! Accepts a JSON array of documents, a single JSON document, or a
//! multi-document YAML file. `null` and empty documents are dropped.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::JSON_FIELD_VERSION;
use crate::error::{Error, Result};

/// Read every non-empty sample document from `path`
pub fn load_documents(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Input(format!("cannot read {}: {e}", path.display())))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let parsed = if is_yaml {
        parse_yaml(&text)?
    } else {
        parse_json(&text)?
    };

    let mut documents = Vec::with_capacity(parsed.len());
    for (index, document) in parsed.into_iter().enumerate() {
        match document {
            Value::Null => {}
            Value::Object(ref map) if map.is_empty() => {}
            Value::Object(_) => documents.push(document),
            other => {
                return Err(Error::Input(format!(
                    "{}: document {index} is not a mapping: {other}",
                    path.display()
                )));
            }
        }
    }

    debug!(path = %path.display(), count = documents.len(), "loaded sample documents");
    Ok(documents)
}

fn parse_json(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str(text)? {
        Value::Array(documents) => Ok(documents),
        document => Ok(vec![document]),
    }
}

fn parse_yaml(text: &str) -> Result<Vec<Value>> {
    serde_yaml::Deserializer::from_str(text)
        .map(|document| Value::deserialize(document).map_err(Error::from))
        .collect()
}

/// Copy of `document` with its protocol version set to `version`
pub fn with_version(document: &Value, version: u8) -> Result<Value> {
    let mut stamped = document.clone();
    let Value::Object(map) = &mut stamped else {
        return Err(Error::MalformedDocument(format!(
            "cannot stamp a version into {document}"
        )));
    };
    map.insert(JSON_FIELD_VERSION.to_string(), Value::from(version));
    Ok(stamped)
}
