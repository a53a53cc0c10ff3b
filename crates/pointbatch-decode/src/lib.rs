//! Decode fixed-width binary point records into position and color buffers.
//!
//! A point file is a flat sequence of records, each holding seven numeric
//! fields (`X, Y, Z, R, G, B, A`) of a single width (`f32` or `f64`) shared by
//! the whole file. The width is not stored in the file; callers pass it in as
//! a [`RecordFormat`].
//!
//! This crate provides pure synchronous functions for turning a percentage
//! range of such a file into decoded buffers:
//!
//! - [`Window::resolve`] maps a percentage range onto absolute record indices
//! - [`Decimator`] selects which records of a window to materialize
//! - [`RecordFile`] performs the positioned reads
//! - [`PointBatchDecoder`] drives all three and tracks [`Bounds`]
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Bounded memory**: Only the sampled records are ever buffered
//! - **Explicit randomness**: Statistical sampling draws from a caller-supplied RNG

mod batch;
mod bounds;
mod convert;
mod decimate;
mod error;
mod format;
mod range;
mod record;

pub use batch::{BatchRequest, PointBatch, PointBatchDecoder, PointSource};
pub use bounds::Bounds;
pub use convert::convert_text;
pub use decimate::{Decimation, Decimator, Indices, Sampling};
pub use error::{DecodeError, DecodeResult};
pub use format::{FIELD_COUNT, Precision, RecordFormat};
pub use range::{PERCENT_SCALE, Window};
pub use record::RecordFile;
