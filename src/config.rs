//! Command-line configuration
//!
//! Everything here has a default that matches the stock codec build, so the
//! only required argument is the sample document file.

use std::ffi::OsString;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::Parser;

use crate::constants::{
    DEFAULT_CODEC_ARGS, DEFAULT_CODEC_PROGRAM, DEFAULT_MAX_VERSION, DEFAULT_STRING_WIDTHS,
    ENV_CODEC_PROGRAM, ENV_CODEC_WRAPPER, MIN_VERSION,
};
use crate::probe::Classifier;

/// Probe every field of sample documents against a codec's round-trip behavior
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Sample documents: a JSON array, a single JSON document, or multi-document YAML
    pub input: PathBuf,

    /// Codec executable
    #[arg(long, env = ENV_CODEC_PROGRAM, default_value = DEFAULT_CODEC_PROGRAM)]
    pub codec: PathBuf,

    /// Arguments passed to the codec (repeat for each argument)
    #[arg(
        long = "codec-arg",
        allow_hyphen_values = true,
        default_values = DEFAULT_CODEC_ARGS
    )]
    pub codec_args: Vec<String>,

    /// Command prefixed to the codec invocation, split on whitespace
    #[arg(long, env = ENV_CODEC_WRAPPER, default_value = "")]
    pub wrapper: String,

    /// First protocol version stamped into each document
    #[arg(long, default_value_t = MIN_VERSION)]
    pub min_version: u8,

    /// Last protocol version stamped into each document
    #[arg(long, default_value_t = DEFAULT_MAX_VERSION)]
    pub max_version: u8,

    /// Widths of dotted fixed-size strings recognized as `str<N>`
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_STRING_WIDTHS)]
    pub string_widths: Vec<usize>,
}

impl Args {
    /// The codec command line described by these arguments
    pub fn codec_command(&self) -> CodecCommand {
        CodecCommand::new(
            self.codec.clone(),
            self.codec_args.clone(),
            self.wrapper.split_whitespace().map(str::to_string).collect(),
        )
    }

    /// Settings for the probing run
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            versions:   self.min_version..=self.max_version,
            classifier: Classifier::new(self.string_widths.clone()),
        }
    }
}

/// Settings shared by every document probed in a run
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub versions:   RangeInclusive<u8>,
    pub classifier: Classifier,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            versions:   MIN_VERSION..=DEFAULT_MAX_VERSION,
            classifier: Classifier::default(),
        }
    }
}

/// How to launch the codec process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCommand {
    program: PathBuf,
    args:    Vec<String>,
    wrapper: Vec<String>,
}

impl CodecCommand {
    pub const fn new(program: PathBuf, args: Vec<String>, wrapper: Vec<String>) -> Self {
        Self {
            program,
            args,
            wrapper,
        }
    }

    /// Executable and arguments, with the wrapper words in front
    pub fn argv(&self) -> (OsString, Vec<OsString>) {
        let mut words: Vec<OsString> = self.wrapper.iter().map(OsString::from).collect();
        words.push(self.program.clone().into_os_string());
        words.extend(self.args.iter().map(OsString::from));

        let program = words.remove(0);
        (program, words)
    }
}

impl fmt::Display for CodecCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.wrapper {
            write!(f, "{word} ")?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["codec_prober", "samples.json"]).unwrap();

        assert_eq!(args.input, PathBuf::from("samples.json"));
        assert_eq!(args.min_version, 1);
        assert_eq!(args.max_version, 5);
        assert_eq!(args.string_widths, vec![16, 32, 256]);
        assert_eq!(
            args.codec_command().to_string(),
            "../oftr encode -jkR --silent-error"
        );
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(Args::try_parse_from(["codec_prober"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "codec_prober",
            "samples.yml",
            "--codec",
            "/usr/bin/ofpx",
            "--codec-arg",
            "encode",
            "--codec-arg",
            "-R",
            "--wrapper",
            "valgrind --quiet",
            "--max-version",
            "4",
            "--string-widths",
            "15,31,255",
        ])
        .unwrap();

        let command = args.codec_command();
        assert_eq!(command.to_string(), "valgrind --quiet /usr/bin/ofpx encode -R");

        let (program, rest) = command.argv();
        assert_eq!(program, OsString::from("valgrind"));
        assert_eq!(
            rest,
            vec![
                OsString::from("--quiet"),
                OsString::from("/usr/bin/ofpx"),
                OsString::from("encode"),
                OsString::from("-R"),
            ]
        );

        let config = args.probe_config();
        assert_eq!(config.versions, 1..=4);
        assert_eq!(config.classifier, Classifier::new(vec![15, 31, 255]));
    }
}
