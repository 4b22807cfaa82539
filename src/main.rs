//! Differential field prober for a protocol message codec
//!
//! Every sample document is stamped with each protocol version in turn and
//! probed field by field through one long-lived codec process. The findings
//! are printed as a tab-separated table on stdout; logs go to stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;
mod constants;
mod error;
mod input;
mod probe;

use config::{Args, ProbeConfig};
use constants::DEFAULT_LOG_FILTER;
use probe::{Codec, CodecProcess, Prober, write_header};

/// Counts gathered over a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Summary {
    documents:              usize,
    unexpected_acceptances: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    match run(&args, &mut io::stdout()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Probe every document, writing the report to `out`, and return the codec's exit code
async fn run(args: &Args, out: &mut impl Write) -> anyhow::Result<u8> {
    let documents = input::load_documents(&args.input)
        .with_context(|| format!("Failed to load samples from {}", args.input.display()))?;
    let config = args.probe_config();
    let command = args.codec_command();

    info!(%command, documents = documents.len(), "Starting codec");
    let mut codec = CodecProcess::spawn(&command)?;

    // The codec is shut down even when probing fails
    let outcome = probe_all(&mut codec, &config, &documents, out).await;
    let shutdown = codec.shutdown().await;
    let summary = outcome?;
    let status = shutdown?;

    info!(
        documents = summary.documents,
        unexpected_acceptances = summary.unexpected_acceptances,
        %status,
        "Probing finished"
    );
    if summary.unexpected_acceptances > 0 {
        warn!(
            "{} out-of-range values were accepted by the codec",
            summary.unexpected_acceptances
        );
    }

    Ok(status
        .code()
        .map_or(1, |code| u8::try_from(code).unwrap_or(1)))
}

/// Probe each document at each configured version, writing report rows to `out`
async fn probe_all<C: Codec>(
    codec: &mut C,
    config: &ProbeConfig,
    documents: &[Value],
    out: &mut impl Write,
) -> anyhow::Result<Summary> {
    let mut prober = Prober::new(codec, config.classifier.clone());
    write_header(out)?;

    for version in config.versions.clone() {
        for document in documents {
            let stamped = input::with_version(document, version)?;
            let report = prober
                .check(&stamped)
                .await
                .with_context(|| format!("Failed to probe document at version {version}"))?;
            report.write_rows(out)?;
        }
    }
    out.flush()?;

    Ok(Summary {
        documents:              prober.checked(),
        unexpected_acceptances: prober.unexpected_acceptances(),
    })
}
