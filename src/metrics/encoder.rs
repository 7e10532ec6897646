//! Wire encodings for a [`Batch`].
//!
//! Both encodings consume the same normalized samples, so metric names are
//! identical whichever format is configured.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use prost::Message;

use crate::error::EncodeError;
use crate::metrics::model::{Batch, INTERFACE_LABEL};
use crate::metrics::prompb::{Label, Sample, TimeSeries, WriteRequest};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const REMOTE_WRITE_VERSION: &str = "X-Prometheus-Remote-Write-Version";

const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Reserved label holding the metric name in remote-write series.
const NAME_LABEL: &str = "__name__";

/// An encoded batch together with the headers needed to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl EncodedPayload {
    /// Returns the value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

/// Wire format used to push samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Snappy-compressed protobuf `WriteRequest`.
    #[default]
    RemoteWrite,
    /// Uncompressed text exposition format.
    Text,
}

impl Encoding {
    /// Serializes a batch in this format.
    pub fn encode(self, batch: &Batch) -> Result<EncodedPayload, EncodeError> {
        match self {
            Encoding::RemoteWrite => encode_remote_write(batch),
            Encoding::Text => Ok(encode_text(batch)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::RemoteWrite => write!(f, "remote-write"),
            Encoding::Text => write!(f, "text"),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote-write" | "protobuf" => Ok(Encoding::RemoteWrite),
            "text" => Ok(Encoding::Text),
            other => Err(format!(
                "unknown format '{}', expected 'remote-write' or 'text'",
                other
            )),
        }
    }
}

/// Builds the remote-write request: one series per sample, each with the
/// `__name__` and `interface` labels and a single point.
pub fn build_write_request(batch: &Batch) -> WriteRequest {
    let timeseries = batch
        .samples()
        .iter()
        .map(|sample| TimeSeries {
            labels: vec![
                Label {
                    name: NAME_LABEL.to_string(),
                    value: sample.metric.clone(),
                },
                Label {
                    name: INTERFACE_LABEL.to_string(),
                    value: sample.interface.clone(),
                },
            ],
            samples: vec![Sample {
                value: sample.value as f64,
                timestamp: sample.timestamp_ms,
            }],
        })
        .collect();

    WriteRequest { timeseries }
}

fn encode_remote_write(batch: &Batch) -> Result<EncodedPayload, EncodeError> {
    let request = build_write_request(batch);

    let mut buf = Vec::with_capacity(request.encoded_len());
    request.encode(&mut buf)?;
    let body = snap::raw::Encoder::new().compress_vec(&buf)?;

    Ok(EncodedPayload {
        body,
        headers: vec![
            (CONTENT_ENCODING, "snappy"),
            (CONTENT_TYPE, PROTOBUF_CONTENT_TYPE),
            (REMOTE_WRITE_VERSION, "0.1.0"),
        ],
    })
}

fn encode_text(batch: &Batch) -> EncodedPayload {
    let mut out = String::new();
    for sample in batch.samples() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{}{{{}=\"{}\"}} {}",
            sample.metric,
            INTERFACE_LABEL,
            escape_label_value(&sample.interface),
            sample.value
        );
    }

    EncodedPayload {
        body: out.into_bytes(),
        headers: vec![(CONTENT_TYPE, TEXT_CONTENT_TYPE)],
    }
}

/// Escapes `\`, `"` and newlines in a label value.
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}
