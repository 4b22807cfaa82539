//! Round-trip oracle backed by a long-lived codec process
//!
//! The codec reads one compact JSON document per line on stdin and answers
//! each with exactly one line on stdout: the re-decoded document, or `null`
//! when it could not encode or decode the input. The process is spawned once
//! and reused for every experiment of the run.

use std::process::{ExitStatus, Stdio};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, trace};

use crate::config::CodecCommand;
use crate::error::{Error, Result};

/// Something that round-trips documents through the codec under test
pub trait Codec {
    /// Encode and decode `document`
    ///
    /// Returns `Ok(None)` when the codec rejected the document. Errors mean the
    /// channel itself failed and the run cannot continue.
    async fn roundtrip(&mut self, document: &Value) -> Result<Option<Value>>;
}

/// The codec as a child process speaking line-delimited JSON
pub struct CodecProcess {
    child:   Child,
    writer:  Option<FramedWrite<ChildStdin, LinesCodec>>,
    reader:  FramedRead<ChildStdout, LinesCodec>,
    command: String,
}

impl CodecProcess {
    /// Spawn the codec process described by `command`
    pub fn spawn(command: &CodecCommand) -> Result<Self> {
        let (program, args) = command.argv();
        let rendered = command.to_string();

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::OracleFailure(format!("failed to spawn `{rendered}`: {e}")))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            Error::OracleFailure(format!("`{rendered}` has no stdin pipe"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            Error::OracleFailure(format!("`{rendered}` has no stdout pipe"))
        })?;

        debug!(command = %rendered, pid = ?child.id(), "spawned codec process");

        Ok(Self {
            child,
            writer: Some(FramedWrite::new(stdin, LinesCodec::new())),
            reader: FramedRead::new(stdout, LinesCodec::new()),
            command: rendered,
        })
    }

    /// Close the codec's stdin and wait for it to exit
    pub async fn shutdown(mut self) -> Result<ExitStatus> {
        if let Some(mut writer) = self.writer.take() {
            // The process may already be gone; its exit status is reported below
            if let Err(e) = SinkExt::<String>::close(&mut writer).await {
                debug!(command = %self.command, error = %e, "failed to close codec stdin");
            }
        }

        let status = self.child.wait().await.map_err(|e| {
            Error::OracleFailure(format!("failed to wait for `{}`: {e}", self.command))
        })?;
        debug!(command = %self.command, %status, "codec process exited");
        Ok(status)
    }

    /// Describe a broken channel, including the exit status if the process is gone
    fn channel_failure(&mut self, what: &str) -> Error {
        let status = match self.child.try_wait() {
            Ok(Some(status)) => format!("exited with {status}"),
            Ok(None) => "still running".to_string(),
            Err(e) => format!("status unavailable: {e}"),
        };
        Error::OracleFailure(format!("{what} (`{}` {status})", self.command))
    }
}

impl Codec for CodecProcess {
    async fn roundtrip(&mut self, document: &Value) -> Result<Option<Value>> {
        let line = serde_json::to_string(document)?;
        trace!(request = %line, "codec request");

        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::OracleFailure(format!(
                "`{}` stdin is already closed",
                self.command
            )));
        };
        if let Err(e) = writer.send(line).await {
            return Err(self.channel_failure(&format!("failed to write request: {e}")));
        }

        let reply = match self.reader.next().await {
            Some(Ok(reply)) => reply,
            Some(Err(e)) => return Err(self.channel_failure(&format!("failed to read reply: {e}"))),
            None => return Err(self.channel_failure("unexpected end of codec output")),
        };
        trace!(reply = %reply, "codec reply");

        match serde_json::from_str::<Value>(&reply) {
            Ok(Value::Null) => Ok(None),
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => Err(self.channel_failure(&format!("unparseable reply `{reply}`: {e}"))),
        }
    }
}
