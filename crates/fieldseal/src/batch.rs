//! Line-oriented batch processing over async readers and writers.
//!
//! Each input line is one unit of work: a plaintext or envelope in the text
//! modes, a JSON object in the record modes. A line that fails, including one
//! that is not UTF-8, is rejected (logged as a JSON [`ErrorResponse`], counted,
//! omitted from the output) and processing continues. Only I/O errors abort a
//! run.

use std::fmt;
use std::str::FromStr;

use common::protocol::{BatchSummary, ErrorResponse};
use common::ServiceError;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::crypto::{open_to_string, seal_str, CipherError, Key};
use crate::fields::{open_fields, reseal_fields, seal_fields, FieldRule};

/// What a batch run does to each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plaintext line in, envelope line out. Every line is sealed, including
    /// empty and whitespace-only ones.
    Seal,
    /// Envelope line in, plaintext line out.
    Open,
    /// JSON record in, record with rule fields normalised and sealed out.
    SealRecords,
    /// JSON record in, record with rule fields opened out.
    OpenRecords,
    /// JSON record in, record with rule fields opened, normalised and re-sealed out.
    ResealRecords,
}

impl Mode {
    /// Command-line name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Seal => "seal",
            Mode::Open => "open",
            Mode::SealRecords => "seal-records",
            Mode::OpenRecords => "open-records",
            Mode::ResealRecords => "reseal-records",
        }
    }

    /// Returns `true` for the modes that read JSON records and need field rules.
    pub fn uses_records(self) -> bool {
        matches!(
            self,
            Mode::SealRecords | Mode::OpenRecords | Mode::ResealRecords
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seal" => Ok(Mode::Seal),
            "open" => Ok(Mode::Open),
            "seal-records" => Ok(Mode::SealRecords),
            "open-records" => Ok(Mode::OpenRecords),
            "reseal-records" => Ok(Mode::ResealRecords),
            other => Err(ServiceError::BadInput(format!("unknown mode: {other}"))),
        }
    }
}

impl From<CipherError> for ServiceError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::MalformedEnvelope
            | CipherError::AuthenticationFailure
            | CipherError::InvalidUtf8 => ServiceError::Rejected(e.to_string()),
            CipherError::InvalidKeyLength(_)
            | CipherError::UnsupportedKeyBits(_)
            | CipherError::InvalidKeyEncoding => {
                ServiceError::Misconfigured(e.to_string())
            }
            CipherError::CryptoBackend => ServiceError::Internal(e.to_string()),
        }
    }
}

/// Transform every line of `reader` according to `mode`, writing results to `writer`.
///
/// Blank lines are skipped in the record modes only. `rules` is only consulted
/// in the record modes. A trailing `\n` or `\r\n` is stripped from each line.
///
/// # Errors
///
/// Returns an I/O error if reading or writing fails. Per-line failures are
/// logged and counted in the returned [`BatchSummary`].
pub async fn run<R, W>(
    mode: Mode,
    key: &Key,
    rules: &[FieldRule],
    mut reader: R,
    mut writer: W,
) -> std::io::Result<BatchSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = BatchSummary::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;
        strip_line_ending(&mut buf);

        let result = match std::str::from_utf8(&buf) {
            Ok(line) if mode.uses_records() && line.trim().is_empty() => continue,
            Ok(line) => transform_line(mode, key, rules, line),
            Err(_) => Err(ServiceError::BadInput("line is not valid UTF-8".into())),
        };

        match result {
            Ok(out) => {
                writer.write_all(out.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                summary.processed += 1;
            }
            Err(e) => {
                let rejection = ErrorResponse::from(&e).at_line(line_no);
                warn!(
                    rejection = %serde_json::to_string(&rejection).unwrap_or_default(),
                    "line rejected"
                );
                summary.rejected += 1;
            }
        }
    }
    writer.flush().await?;

    info!(
        mode = %mode,
        summary = %serde_json::to_string(&summary).unwrap_or_default(),
        "batch complete"
    );
    Ok(summary)
}

fn strip_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Apply `mode` to a single input line.
fn transform_line(
    mode: Mode,
    key: &Key,
    rules: &[FieldRule],
    line: &str,
) -> Result<String, ServiceError> {
    let key = key.as_ref();
    match mode {
        Mode::Seal => Ok(seal_str(line, key)?),
        Mode::Open => Ok(open_to_string(line.trim(), key)?),
        Mode::SealRecords | Mode::OpenRecords | Mode::ResealRecords => {
            let mut record: Value = serde_json::from_str(line)
                .map_err(|e| ServiceError::BadInput(format!("invalid JSON record: {e}")))?;
            if !record.is_object() {
                return Err(ServiceError::BadInput(
                    "record is not a JSON object".into(),
                ));
            }

            match mode {
                Mode::SealRecords => seal_fields(&mut record, rules, key)?,
                Mode::OpenRecords => open_fields(&mut record, rules, key)?,
                _ => reseal_fields(&mut record, rules, key)?,
            }
            debug!(fields = rules.len(), "record transformed");

            serde_json::to_string(&record).map_err(|e| ServiceError::Internal(e.to_string()))
        }
    }
}
