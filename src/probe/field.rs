//! Single-field mutations applied to a document through a keypath

use serde_json::Value;

use super::annotate::Entry;
use super::syntax::{Classifier, UINT8_ALT_MAX};
use crate::error::{Error, Result};

/// Out-of-range replacement for a field sitting at the 4-bit uint8 maximum
const UINT8_OVERFLOW: u64 = 256;

/// Position of a field inside its containing node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'k> {
    Key(&'k str),
    Index(usize),
}

/// Resolve one keypath segment against `container`
fn resolve<'k>(container: &Value, segment: &'k str, keypath: &str) -> Result<Slot<'k>> {
    match container {
        Value::Object(map) => {
            if map.contains_key(segment) {
                Ok(Slot::Key(segment))
            } else {
                Err(Error::keypath(keypath, format!("no key `{segment}`")))
            }
        }
        Value::Array(items) => {
            let index: usize = segment
                .parse()
                .map_err(|_| Error::keypath(keypath, format!("`{segment}` is not an index")))?;
            if index < items.len() {
                Ok(Slot::Index(index))
            } else {
                Err(Error::keypath(
                    keypath,
                    format!("index {index} out of bounds ({} items)", items.len()),
                ))
            }
        }
        _ => Err(Error::keypath(
            keypath,
            format!("`{segment}` descends into a scalar"),
        )),
    }
}

fn slot_mut<'d>(container: &'d mut Value, slot: Slot<'_>) -> Option<&'d mut Value> {
    match (container, slot) {
        (Value::Object(map), Slot::Key(key)) => map.get_mut(key),
        (Value::Array(items), Slot::Index(index)) => items.get_mut(index),
        _ => None,
    }
}

/// Find the node containing `keypath` and the slot it occupies there
pub fn locate<'d, 'k>(document: &'d mut Value, keypath: &'k str) -> Result<(&'d mut Value, Slot<'k>)> {
    let segments: Vec<&str> = keypath.split('.').collect();
    let Some((&last, parents)) = segments.split_last() else {
        return Err(Error::keypath(keypath, "empty keypath"));
    };

    let mut current = document;
    for &segment in parents {
        let slot = resolve(current, segment, keypath)?;
        current = slot_mut(current, slot)
            .ok_or_else(|| Error::keypath(keypath, format!("`{segment}` vanished")))?;
    }

    let slot = resolve(current, last, keypath)?;
    Ok((current, slot))
}

/// Increment a value past its maximum
///
/// Returns `None` when the value is not incrementable.
pub fn incremented(value: &Value) -> Result<Option<Value>> {
    match value {
        Value::Number(number) => {
            if number.as_u64() == Some(UINT8_ALT_MAX) {
                return Ok(Some(Value::from(UINT8_OVERFLOW)));
            }
            if let Some(unsigned) = number.as_u64() {
                return Ok(Some(serde_json::to_value(u128::from(unsigned) + 1)?));
            }
            if let Some(signed) = number.as_i64() {
                return Ok(Some(serde_json::to_value(i128::from(signed) + 1)?));
            }
            Ok(None)
        }
        Value::String(text) if text.ends_with('.') => Ok(Some(Value::from(format!("{text}.")))),
        _ => Ok(None),
    }
}

impl Entry {
    /// Mutable access to this entry's value in `document`
    fn value_mut<'d>(&self, document: &'d mut Value) -> Result<&'d mut Value> {
        let (container, slot) = locate(document, &self.keypath)?;
        slot_mut(container, slot).ok_or_else(|| Error::keypath(&self.keypath, "slot vanished"))
    }

    /// Remove this entry's field from `document`
    pub fn omit(&self, document: &mut Value) -> Result<()> {
        let (container, slot) = locate(document, &self.keypath)?;
        match (container, slot) {
            (Value::Object(map), Slot::Key(key)) => {
                map.shift_remove(key);
            }
            (Value::Array(items), Slot::Index(index)) => {
                items.remove(index);
            }
            _ => return Err(Error::keypath(&self.keypath, "slot does not match container")),
        }
        Ok(())
    }

    /// Replace this entry's value with the probe value for its syntax
    ///
    /// Values whose syntax has no probe value are left untouched.
    pub fn modify(&self, document: &mut Value, classifier: &Classifier) -> Result<()> {
        let value = self.value_mut(document)?;
        if let Some(mutated) = classifier.classify(value).mutated() {
            *value = mutated;
        }
        Ok(())
    }

    /// Increment this entry's value in place
    ///
    /// Returns `false` (leaving `document` untouched) when the value is not
    /// incrementable, in which case no experiment should run for the field.
    pub fn increment(&self, document: &mut Value) -> Result<bool> {
        let value = self.value_mut(document)?;
        match incremented(value)? {
            Some(next) => {
                *value = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::probe::syntax::Syntax;

    fn entry(keypath: &str) -> Entry {
        Entry::new(keypath.to_string(), Syntax::Null)
    }

    fn sample() -> Value {
        json!({
            "type": "FLOW_MOD",
            "msg": {
                "cookie": u64::MAX,
                "actions": [
                    {"action": "OUTPUT", "port": 0xFFFF_FFFF_u64},
                    {"action": "SET_FIELD", "nibble": 0x0F}
                ],
                "name": "................",
                "flag": true
            }
        })
    }

    #[test]
    fn test_locate_through_arrays() {
        let mut document = sample();
        let (container, slot) = locate(&mut document, "msg.actions.1.nibble").unwrap();
        assert_eq!(slot, Slot::Key("nibble"));
        assert_eq!(container["action"], json!("SET_FIELD"));

        let (container, slot) = locate(&mut document, "msg.actions.0").unwrap();
        assert_eq!(slot, Slot::Index(0));
        assert!(container.is_array());
    }

    #[test]
    fn test_locate_missing_segment_fails() {
        let mut document = sample();
        for keypath in [
            "msg.missing",
            "msg.actions.7",
            "msg.actions.first",
            "msg.cookie.deeper",
            "other.cookie",
        ] {
            let result = locate(&mut document, keypath);
            assert!(
                matches!(result, Err(Error::Keypath { .. })),
                "expected keypath error for {keypath}"
            );
        }
    }

    #[test]
    fn test_omit_preserves_order_of_remaining_keys() {
        let mut document = sample();
        entry("msg.cookie").omit(&mut document).unwrap();

        let keys: Vec<&String> = document["msg"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["actions", "name", "flag"]);
    }

    #[test]
    fn test_omit_array_element_shifts() {
        let mut document = sample();
        entry("msg.actions.0").omit(&mut document).unwrap();

        let actions = document["msg"]["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0]["action"], json!("SET_FIELD"));
    }

    #[test]
    fn test_omit_root_message() {
        let mut document = sample();
        entry("msg").omit(&mut document).unwrap();
        assert!(document.get("msg").is_none());
    }

    #[test]
    fn test_modify_substitutes_probe_values() {
        let classifier = Classifier::default();
        let mut document = sample();

        entry("msg.actions.0.port")
            .modify(&mut document, &classifier)
            .unwrap();
        assert_eq!(document["msg"]["actions"][0]["port"], json!(0xEEEE_EEEE_u64));

        entry("msg.cookie").modify(&mut document, &classifier).unwrap();
        assert_eq!(document["msg"]["cookie"], json!(0xEEEE_EEEE_EEEE_EEEE_u64));
    }

    #[test]
    fn test_modify_leaves_unmodifiable_values() {
        let classifier = Classifier::default();
        let mut document = sample();
        let before = document.clone();

        entry("msg.actions.0.action")
            .modify(&mut document, &classifier)
            .unwrap();
        entry("msg.actions").modify(&mut document, &classifier).unwrap();
        entry("msg.name").modify(&mut document, &classifier).unwrap();

        assert_eq!(document, before);
    }

    #[test]
    fn test_increment_overflows_maximums() {
        let mut document = sample();

        assert!(entry("msg.actions.1.nibble").increment(&mut document).unwrap());
        assert_eq!(document["msg"]["actions"][1]["nibble"], json!(256));

        assert!(entry("msg.actions.0.port").increment(&mut document).unwrap());
        assert_eq!(document["msg"]["actions"][0]["port"], json!(0x1_0000_0000_u64));

        assert!(entry("msg.cookie").increment(&mut document).unwrap());
        assert_eq!(
            document["msg"]["cookie"].to_string(),
            "18446744073709551616"
        );

        assert!(entry("msg.name").increment(&mut document).unwrap());
        assert_eq!(document["msg"]["name"], json!(".".repeat(17)));
    }

    #[test]
    fn test_increment_rejects_other_values() {
        let mut document = sample();
        let before = document.clone();

        assert!(!entry("msg.flag").increment(&mut document).unwrap());
        assert!(!entry("msg.actions").increment(&mut document).unwrap());
        assert!(!entry("msg.actions.0.action").increment(&mut document).unwrap());
        assert_eq!(document, before);
    }

    #[test]
    fn test_increment_negative_integer() {
        assert_eq!(incremented(&json!(-5)).unwrap(), Some(json!(-4)));
        assert_eq!(incremented(&json!(1.5)).unwrap(), None);
    }
}
