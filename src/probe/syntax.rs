//! Value classification and the sentinel tables that drive the experiments
//!
//! Sample documents are expected to carry every field at its maximum value.
//! The classifier recognizes those saturated values and tags them with the
//! field syntax they imply. Values that match no sentinel classify as their
//! own display form, so enumerated literals tag as themselves.

use std::fmt;

use serde_json::Value;

use crate::constants::DEFAULT_STRING_WIDTHS;

// Maximum-value sentinels for string syntaxes (compared lower-case)
const MAX_MAC_ADDRESS: &str = "ff:ff:ff:ff:ff:ff";
const MAX_DATAPATH: &str = "ff:ff:ff:ff:ff:ff:ff:ff";
const MAX_DATAPATH_DASHED: &str = "ffff-ffff-ffff-ffff";
const MAX_BINARY: &str = "ffffffff";
const MAX_IPV4_ADDRESS: &str = "255.255.255.255";

// Alternate uint8 maximum used by 4-bit fields
pub const UINT8_ALT_MAX: u64 = 0x0F;

// Mutated probe values
const MUTATED_UINT8: u64 = 0x0E;
const MUTATED_UINT16: u64 = 0xEEEE;
const MUTATED_UINT32: u64 = 0xEEEE_EEEE;
const MUTATED_UINT64: u64 = 0xEEEE_EEEE_EEEE_EEEE;
const MUTATED_MAC_ADDRESS: &str = "ee:ee:ee:ee:ee:ee";
const MUTATED_DATAPATH: &str = "ee:ee:ee:ee:ee:ee:ee:ee";
const MUTATED_BINARY: &str = "eeeeeeee";
const MUTATED_STR15: &str = "e.e.e.e.e.e.e.e";
const MUTATED_IPV4_ADDRESS: &str = "14.14.14.14";

/// Renderings a codec may produce for a mutated value beyond the table itself
const MUTATED_ALIASES: [&str; 2] = ["238", "eeee-eeee-eeee-eeee"];

/// Semantic tag assigned to a document node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// JSON null
    Null,
    /// Mapping node
    Object,
    /// Sequence node
    Array,
    /// Integer at 0xFF (or the 4-bit alternate 0x0F)
    UInt8,
    /// Integer at 0xFFFF
    UInt16,
    /// Integer at 0xFFFFFFFF
    UInt32,
    /// Integer at 0xFFFFFFFFFFFFFFFF
    UInt64,
    /// Broadcast MAC address
    MacAddress,
    /// All-ones 64-bit datapath id
    Datapath,
    /// Limited broadcast IPv4 address
    Ipv4Address,
    /// All-ones hex digest
    Binary,
    /// String of dots filling a fixed-size field
    FixedString(usize),
    /// No sentinel matched; the value's own display form
    Literal(String),
}

impl Syntax {
    /// The maximum integer value this syntax was recognized from, if it is numeric
    pub const fn maximum(&self) -> Option<u64> {
        match self {
            Self::UInt8 => Some(0xFF),
            Self::UInt16 => Some(0xFFFF),
            Self::UInt32 => Some(0xFFFF_FFFF),
            Self::UInt64 => Some(u64::MAX),
            _ => None,
        }
    }

    /// The probe value substituted for a field of this syntax by the modify experiment
    ///
    /// Returns `None` when the syntax has no probe value; such fields are left as they are.
    pub fn mutated(&self) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::UInt8 => Some(Value::from(MUTATED_UINT8)),
            Self::UInt16 => Some(Value::from(MUTATED_UINT16)),
            Self::UInt32 => Some(Value::from(MUTATED_UINT32)),
            Self::UInt64 => Some(Value::from(MUTATED_UINT64)),
            Self::MacAddress => Some(Value::from(MUTATED_MAC_ADDRESS)),
            Self::Datapath => Some(Value::from(MUTATED_DATAPATH)),
            Self::Binary => Some(Value::from(MUTATED_BINARY)),
            Self::FixedString(15) => Some(Value::from(MUTATED_STR15)),
            Self::Ipv4Address => Some(Value::from(MUTATED_IPV4_ADDRESS)),
            _ => None,
        }
    }

    /// Whether this tag, observed after a modify round-trip, shows the probe value
    ///
    /// `original` is the tag of the field before it was modified.
    pub fn looks_mutated(&self, original: &Self) -> bool {
        if self == original {
            return false;
        }
        let rendered = self.to_string().to_lowercase();
        is_probe_string(&rendered)
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Object => f.write_str("object"),
            Self::Array => f.write_str("array"),
            Self::UInt8 => f.write_str("uint8"),
            Self::UInt16 => f.write_str("uint16"),
            Self::UInt32 => f.write_str("uint32"),
            Self::UInt64 => f.write_str("uint64"),
            Self::MacAddress => f.write_str("macaddress"),
            Self::Datapath => f.write_str("datapath"),
            Self::Ipv4Address => f.write_str("ipv4address"),
            Self::Binary => f.write_str("binary"),
            Self::FixedString(width) => write!(f, "str{width}"),
            Self::Literal(text) => f.write_str(text),
        }
    }
}

/// Display forms of every non-null probe value
fn probe_strings() -> impl Iterator<Item = String> {
    [
        Syntax::UInt8,
        Syntax::UInt16,
        Syntax::UInt32,
        Syntax::UInt64,
        Syntax::MacAddress,
        Syntax::Datapath,
        Syntax::Binary,
        Syntax::FixedString(15),
        Syntax::Ipv4Address,
    ]
    .into_iter()
    .filter_map(|syntax| syntax.mutated())
    .map(|value| display_value(&value))
    .chain(MUTATED_ALIASES.into_iter().map(str::to_string))
}

fn is_probe_string(rendered: &str) -> bool {
    probe_strings().any(|probe| probe == rendered)
}

/// Display form of a scalar: strings without quotes, everything else as JSON text
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Maps document values to [`Syntax`] tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    string_widths: Vec<usize>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_STRING_WIDTHS.to_vec())
    }
}

impl Classifier {
    /// Create a classifier recognizing dotted fixed-size strings of the given widths
    pub const fn new(string_widths: Vec<usize>) -> Self {
        Self { string_widths }
    }

    /// Classify a value. Total: every value maps to exactly one tag.
    pub fn classify(&self, value: &Value) -> Syntax {
        match value {
            Value::Null => Syntax::Null,
            Value::Object(_) => Syntax::Object,
            Value::Array(_) => Syntax::Array,
            Value::Number(number) => number
                .as_u64()
                .and_then(classify_integer)
                .unwrap_or_else(|| Syntax::Literal(number.to_string())),
            Value::String(text) => self.classify_string(text),
            Value::Bool(flag) => Syntax::Literal(flag.to_string()),
        }
    }

    fn classify_string(&self, text: &str) -> Syntax {
        let lowered = text.to_lowercase();
        match lowered.as_str() {
            MAX_MAC_ADDRESS => return Syntax::MacAddress,
            MAX_DATAPATH | MAX_DATAPATH_DASHED => return Syntax::Datapath,
            _ => {}
        }

        if let Some(width) = self.fixed_width(&lowered) {
            return Syntax::FixedString(width);
        }

        match lowered.as_str() {
            MAX_BINARY => Syntax::Binary,
            MAX_IPV4_ADDRESS => Syntax::Ipv4Address,
            _ => Syntax::Literal(text.to_string()),
        }
    }

    fn fixed_width(&self, text: &str) -> Option<usize> {
        if text.is_empty() || !text.bytes().all(|b| b == b'.') {
            return None;
        }
        self.string_widths
            .iter()
            .copied()
            .find(|width| *width == text.len())
    }
}

/// Integer syntaxes, each recognized by its [`Syntax::maximum`]
const INTEGER_SYNTAXES: [Syntax; 4] = [Syntax::UInt8, Syntax::UInt16, Syntax::UInt32, Syntax::UInt64];

fn classify_integer(value: u64) -> Option<Syntax> {
    if value == UINT8_ALT_MAX {
        return Some(Syntax::UInt8);
    }
    INTEGER_SYNTAXES
        .into_iter()
        .find(|syntax| syntax.maximum() == Some(value))
}
