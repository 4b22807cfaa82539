//! Per-document orchestration of the omit, modify and increment experiments

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::annotate::{Entry, annotate, annotate_message};
use super::diff::consequences;
use super::oracle::Codec;
use super::syntax::Classifier;
use crate::constants::{JSON_FIELD_MSG, JSON_FIELD_TYPE, JSON_FIELD_VERSION, MULTIPART_TYPE_SUFFIXES};
use crate::error::{Error, Result};

/// Outcome of round-tripping a document with one field replaced by its probe value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifyEffect {
    /// The codec accepted the document but its output does not show the probe value
    #[default]
    Unobserved,
    /// The codec's output carries the probe value
    Observed,
    /// The codec rejected the modified document
    Rejected,
}

/// Outcome of round-tripping a document with one field pushed past its maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncrementEffect {
    /// The field's value cannot be incremented; nothing was sent
    #[default]
    Skipped,
    /// The codec rejected the overflowing value
    Rejected,
    /// The codec decoded a value that should not fit its field
    UnexpectedlyAccepted,
}

/// A baseline field together with what the experiments learned about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedField {
    pub entry:                Entry,
    pub required:             bool,
    pub omitted_consequences: Vec<Entry>,
    pub modify:               ModifyEffect,
    pub increment:            IncrementEffect,
}

impl ProbedField {
    fn new(entry: Entry) -> Self {
        Self {
            entry,
            required: false,
            omitted_consequences: Vec::new(),
            modify: ModifyEffect::default(),
            increment: IncrementEffect::default(),
        }
    }
}

/// Everything learned from probing one document at one protocol version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub version:      u64,
    pub label:        String,
    pub fields:       Vec<ProbedField>,
    /// Differences produced by round-tripping the unmodified document
    pub consequences: Vec<Entry>,
}

/// Label a document by message type, multipart subtype and version
///
/// Returns the label and the stamped version.
pub fn document_label(document: &Value) -> Result<(String, u64)> {
    let kind = document
        .get(JSON_FIELD_TYPE)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::MalformedDocument(format!("document has no string `{JSON_FIELD_TYPE}`"))
        })?;
    let version = document
        .get(JSON_FIELD_VERSION)
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            Error::MalformedDocument(format!("document `{kind}` has no `{JSON_FIELD_VERSION}`"))
        })?;

    let mut label = kind.to_string();
    if MULTIPART_TYPE_SUFFIXES
        .iter()
        .any(|suffix| kind.ends_with(suffix))
    {
        let subtype = document
            .get(JSON_FIELD_MSG)
            .and_then(|msg| msg.get(JSON_FIELD_TYPE))
            .ok_or_else(|| {
                Error::MalformedDocument(format!("multipart document `{kind}` has no `msg.type`"))
            })?;
        match subtype {
            Value::String(text) => label = format!("{label}.{text}"),
            other => label = format!("{label}.{other}"),
        }
    }

    Ok((format!("{label}.v{version}"), version))
}

/// Runs the probing experiments through a shared codec
pub struct Prober<'c, C> {
    codec:                  &'c mut C,
    classifier:             Classifier,
    checked:                usize,
    unexpected_acceptances: usize,
}

impl<'c, C: Codec> Prober<'c, C> {
    pub const fn new(codec: &'c mut C, classifier: Classifier) -> Self {
        Self {
            codec,
            classifier,
            checked: 0,
            unexpected_acceptances: 0,
        }
    }

    /// Number of documents checked so far
    pub const fn checked(&self) -> usize {
        self.checked
    }

    /// Number of increment experiments the codec wrongly accepted so far
    pub const fn unexpected_acceptances(&self) -> usize {
        self.unexpected_acceptances
    }

    /// Annotate a codec reply; a reply without `msg` is an empty snapshot
    fn snapshot(&self, reply: &Value) -> Vec<Entry> {
        let mut entries = Vec::new();
        match reply.get(JSON_FIELD_MSG) {
            Some(message) => annotate(message, JSON_FIELD_MSG, &self.classifier, &mut entries),
            None => warn!(reply = %reply, "codec reply has no `msg`"),
        }
        entries
    }

    /// Probe every field of `document`
    ///
    /// `document` is never modified; each experiment works on its own copy.
    pub async fn check(&mut self, document: &Value) -> Result<DocumentReport> {
        let (label, version) = document_label(document)?;
        self.checked += 1;
        info!(document = self.checked, "Checking {label}");

        let baseline = annotate_message(document, &self.classifier)?;

        // Self-check: what changes with no perturbation at all
        let normalized = match self.codec.roundtrip(document).await? {
            Some(reply) => Some(self.snapshot(&reply)),
            None => {
                warn!(%label, "codec rejected the unmodified document");
                None
            }
        };
        let self_consequences = normalized
            .as_deref()
            .map(|snapshot| consequences(&baseline, snapshot))
            .unwrap_or_default();
        let reference = normalized.as_deref().unwrap_or(&baseline);

        let mut fields: Vec<ProbedField> = baseline.iter().cloned().map(ProbedField::new).collect();

        for field in &mut fields {
            let mut variant = document.clone();
            field.entry.omit(&mut variant)?;
            match self.codec.roundtrip(&variant).await? {
                None => field.required = true,
                Some(reply) => {
                    field.required = false;
                    field.omitted_consequences = consequences(reference, &self.snapshot(&reply));
                }
            }
        }

        for field in &mut fields {
            let mut variant = document.clone();
            field.entry.modify(&mut variant, &self.classifier)?;
            field.modify = match self.codec.roundtrip(&variant).await? {
                None => ModifyEffect::Rejected,
                Some(reply) => {
                    let observed = self.snapshot(&reply).iter().any(|entry| {
                        entry.keypath == field.entry.keypath
                            && entry.syntax.looks_mutated(&field.entry.syntax)
                    });
                    if observed {
                        ModifyEffect::Observed
                    } else {
                        ModifyEffect::Unobserved
                    }
                }
            };
        }

        // Sample fields sit at their maximum, so every increment must be rejected
        for field in &mut fields {
            let mut variant = document.clone();
            if !field.entry.increment(&mut variant)? {
                continue;
            }
            field.increment = match self.codec.roundtrip(&variant).await? {
                None => IncrementEffect::Rejected,
                Some(reply) => {
                    self.unexpected_acceptances += 1;
                    error!(
                        %label,
                        keypath = %field.entry.keypath,
                        reply = %reply,
                        "Unexpected result: codec accepted a value past the field's maximum"
                    );
                    IncrementEffect::UnexpectedlyAccepted
                }
            };
        }

        debug!(%label, fields = fields.len(), "document checked");
        Ok(DocumentReport {
            version,
            label,
            fields,
            consequences: self_consequences,
        })
    }
}
