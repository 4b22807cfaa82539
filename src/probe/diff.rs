//! Structural difference between two annotated snapshots

use std::cmp::Ordering;

use super::annotate::Entry;
use super::syntax::Syntax;

fn sorted_by_keypath(entries: &[Entry]) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.keypath.cmp(&b.keypath));
    sorted
}

/// Symmetric difference of two snapshots, in ascending keypath order
///
/// A keypath present on one side only yields that side's entry. A keypath
/// present on both sides with different tags yields the `rhs` entry.
pub fn diff(lhs: &[Entry], rhs: &[Entry]) -> Vec<Entry> {
    let lhs = sorted_by_keypath(lhs);
    let rhs = sorted_by_keypath(rhs);

    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let (left, right) = (lhs[i], rhs[j]);
        match left.keypath.cmp(&right.keypath) {
            Ordering::Less => {
                result.push(left.clone());
                i += 1;
            }
            Ordering::Greater => {
                result.push(right.clone());
                j += 1;
            }
            Ordering::Equal => {
                if left.syntax != right.syntax {
                    result.push(right.clone());
                }
                i += 1;
                j += 1;
            }
        }
    }

    result.extend(lhs[i..].iter().map(|entry| (*entry).clone()));
    result.extend(rhs[j..].iter().map(|entry| (*entry).clone()));
    result
}

/// Drop differences explained by a parent that became null
///
/// Only the first entry is considered: when it is `null`, every other entry
/// beneath its keypath is removed.
pub fn filter_cascade(entries: &mut Vec<Entry>) {
    let Some(first) = entries.first() else {
        return;
    };
    if first.syntax != Syntax::Null {
        return;
    }

    let prefix = format!("{}.", first.keypath);
    entries.retain(|entry| !entry.keypath.starts_with(&prefix));
}

/// Filtered difference between two snapshots
pub fn consequences(lhs: &[Entry], rhs: &[Entry]) -> Vec<Entry> {
    let mut result = diff(lhs, rhs);
    filter_cascade(&mut result);
    result
}
