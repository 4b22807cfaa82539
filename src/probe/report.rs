//! Tab-separated report rows

use std::fmt;
use std::io::{self, Write};

use super::document::{DocumentReport, IncrementEffect, ModifyEffect, ProbedField};
use crate::constants::{REPORT_HEADER, REPORT_INCREMENT_ACCEPTED, REPORT_MODIFY_ERROR};

impl fmt::Display for ModifyEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unobserved => Ok(()),
            Self::Observed => f.write_str("true"),
            Self::Rejected => f.write_str(REPORT_MODIFY_ERROR),
        }
    }
}

impl ProbedField {
    /// Omitted consequences as `keypath=syntax` pairs joined by commas
    fn default_effect(&self) -> String {
        self.omitted_consequences
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Modify effect, flagged when the codec accepted an out-of-range value
    fn modify_cell(&self) -> String {
        let modify = self.modify.to_string();
        if self.increment != IncrementEffect::UnexpectedlyAccepted {
            return modify;
        }
        if modify.is_empty() {
            REPORT_INCREMENT_ACCEPTED.to_string()
        } else {
            format!("{modify},{REPORT_INCREMENT_ACCEPTED}")
        }
    }
}

/// One printed line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub version:  u64,
    pub label:    String,
    pub keypath:  String,
    pub syntax:   String,
    pub required: bool,
    pub default:  String,
    pub missing:  String,
    pub modify:   String,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.version,
            self.label,
            self.keypath,
            self.syntax,
            self.required,
            self.default,
            self.missing,
            self.modify
        )
    }
}

impl DocumentReport {
    /// Report rows for every field, sorted by keypath
    pub fn rows(&self) -> Vec<ReportRow> {
        let mut fields: Vec<&ProbedField> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.entry.keypath.cmp(&b.entry.keypath));

        fields
            .into_iter()
            .map(|field| {
                let missing = self
                    .consequences
                    .iter()
                    .find(|entry| entry.keypath == field.entry.keypath)
                    .map(ToString::to_string)
                    .unwrap_or_default();

                ReportRow {
                    version: self.version,
                    label: self.label.clone(),
                    keypath: field.entry.keypath.clone(),
                    syntax: field.entry.syntax.to_string(),
                    required: field.required,
                    default: field.default_effect(),
                    missing,
                    modify: field.modify_cell(),
                }
            })
            .collect()
    }

    /// Write one line per field
    pub fn write_rows(&self, out: &mut impl Write) -> io::Result<()> {
        for row in self.rows() {
            writeln!(out, "{row}")?;
        }
        Ok(())
    }
}

/// Write the column header line
pub fn write_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", REPORT_HEADER.join("\t"))
}
