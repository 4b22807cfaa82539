//! Flattening of document trees into keypath entries

use std::fmt;

use serde_json::Value;

use super::syntax::{Classifier, Syntax};
use crate::constants::JSON_FIELD_MSG;
use crate::error::{Error, Result};

/// One addressable node of an annotated document snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub keypath: String,
    pub syntax:  Syntax,
}

impl Entry {
    pub const fn new(keypath: String, syntax: Syntax) -> Self {
        Self { keypath, syntax }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let syntax = self.syntax.to_string();
        if syntax.is_empty() {
            write!(f, "{}=''", self.keypath)
        } else {
            write!(f, "{}={syntax}", self.keypath)
        }
    }
}

/// Append an entry for `value` and, depth first, for every node beneath it
///
/// Mapping children are visited in insertion order at `keypath.key`, sequence
/// children at `keypath.index`. The parent entry always precedes its children.
pub fn annotate(value: &Value, keypath: &str, classifier: &Classifier, entries: &mut Vec<Entry>) {
    entries.push(Entry::new(keypath.to_string(), classifier.classify(value)));

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                annotate(child, &format!("{keypath}.{key}"), classifier, entries);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                annotate(child, &format!("{keypath}.{index}"), classifier, entries);
            }
        }
        _ => {}
    }
}

/// Annotate the `msg` subtree of a sample document
pub fn annotate_message(document: &Value, classifier: &Classifier) -> Result<Vec<Entry>> {
    let message = document.get(JSON_FIELD_MSG).ok_or_else(|| {
        Error::MalformedDocument(format!("document has no `{JSON_FIELD_MSG}` field"))
    })?;

    let mut entries = Vec::new();
    annotate(message, JSON_FIELD_MSG, classifier, &mut entries);
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn keypaths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.keypath.as_str()).collect()
    }

    #[test]
    fn test_annotate_empty_object() {
        let mut entries = Vec::new();
        annotate(&json!({}), "msg", &Classifier::default(), &mut entries);

        assert_eq!(entries, vec![Entry::new("msg".to_string(), Syntax::Object)]);
    }

    #[test]
    fn test_annotate_is_depth_first_in_insertion_order() {
        let value = json!({
            "zeta": 1,
            "actions": [{"port": 0xFFFF_FFFF_u64}, "x"],
            "alpha": null
        });
        let mut entries = Vec::new();
        annotate(&value, "msg", &Classifier::default(), &mut entries);

        assert_eq!(
            keypaths(&entries),
            vec![
                "msg",
                "msg.zeta",
                "msg.actions",
                "msg.actions.0",
                "msg.actions.0.port",
                "msg.actions.1",
                "msg.alpha",
            ]
        );
        assert_eq!(entries[4].syntax, Syntax::UInt32);
        assert_eq!(entries[6].syntax, Syntax::Null);
    }

    #[test]
    fn test_annotate_appends_to_accumulator() {
        let classifier = Classifier::default();
        let mut entries = vec![Entry::new("existing".to_string(), Syntax::Null)];
        annotate(&json!(5), "msg", &classifier, &mut entries);

        assert_eq!(keypaths(&entries), vec!["existing", "msg"]);
    }

    #[test]
    fn test_annotate_message_scenario() {
        let document = json!({
            "type": "X",
            "msg": {"a": 0xFFFF_FFFF_u64, "b": "ff:ff:ff:ff:ff:ff"}
        });
        let entries = annotate_message(&document, &Classifier::default()).unwrap();

        assert_eq!(
            entries,
            vec![
                Entry::new("msg".to_string(), Syntax::Object),
                Entry::new("msg.a".to_string(), Syntax::UInt32),
                Entry::new("msg.b".to_string(), Syntax::MacAddress),
            ]
        );
    }

    #[test]
    fn test_annotate_message_requires_msg() {
        let result = annotate_message(&json!({"type": "X"}), &Classifier::default());
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_entry_display() {
        let entry = Entry::new("msg.name".to_string(), Syntax::Literal(String::new()));
        assert_eq!(entry.to_string(), "msg.name=''");

        let entry = Entry::new("msg.port".to_string(), Syntax::UInt32);
        assert_eq!(entry.to_string(), "msg.port=uint32");
    }
}
