//! Differential field probing for an external codec
//!
//! A sample document is flattened into keypath entries, then every field is
//! omitted, modified and incremented in turn. Each variant is round-tripped
//! through the codec and the annotated result is compared against the
//! original to infer the field's contract.

mod annotate;
mod diff;
mod document;
mod field;
mod oracle;
mod report;
mod syntax;


pub use self::document::Prober;
pub use self::oracle::{Codec, CodecProcess};
pub use self::report::write_header;
pub use self::syntax::Classifier;
