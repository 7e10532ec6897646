//! Metric model and wire encodings.
//!
//! Raw driver counters become [`Batch`]es of normalized [`Sample`]s, which an
//! [`Encoding`] turns into an [`EncodedPayload`] ready to push.

mod encoder;
mod model;
pub mod prompb;

pub use encoder::{
    CONTENT_ENCODING, CONTENT_TYPE, EncodedPayload, Encoding, REMOTE_WRITE_VERSION,
    build_write_request,
};
pub use model::{Batch, INTERFACE_LABEL, METRIC_PREFIX, Sample, normalize_metric_name};
