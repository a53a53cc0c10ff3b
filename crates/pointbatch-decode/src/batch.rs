//! Decoding one batch of points.

use std::path::Path;

use glam::{Vec3, Vec4};
use rand::RngCore;

use crate::bounds::Bounds;
use crate::decimate::{Decimation, Decimator, Sampling};
use crate::error::{DecodeError, DecodeResult};
use crate::format::RecordFormat;
use crate::range::Window;
use crate::record::RecordFile;

/// Parameters of one decode: which part of the file, how thinned, and the
/// record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchRequest {
    /// Start of the range, in percent of the record count.
    pub start_percent: u32,
    /// Length of the range, in percent. 0 reads to the end of the file.
    pub length_percent: u32,
    pub decimation: Decimation,
    pub sampling: Sampling,
    pub format: RecordFormat,
}

impl BatchRequest {
    /// A request for the whole file at full resolution.
    #[must_use]
    pub fn full(format: RecordFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

/// Decoded points with their extents.
///
/// `positions` and `colors` are parallel arrays.
#[derive(Debug, Clone, Default)]
pub struct PointBatch {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub bounds: Bounds,
    /// The record window the request resolved to.
    pub window: Window,
    /// Record count of the whole source file.
    pub total_records: u64,
}

impl PointBatch {
    /// Number of decoded points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A format-specific way of turning a file and a request into points.
pub trait PointSource {
    /// Decode the records selected by `request` from the file at `path`.
    ///
    /// `rng` is used for [`Sampling::Random`].
    fn decode(
        &self,
        path: &Path,
        request: &BatchRequest,
        rng: &mut dyn RngCore,
    ) -> DecodeResult<PointBatch>;
}

/// Decoder for flat binary `X,Y,Z,R,G,B,A` record files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointBatchDecoder;

impl PointBatchDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode the records selected by `request` from the file at `path`.
    ///
    /// Without decimation the window is read with a single sequential read.
    /// With decimation every sampled record is read with its own positioned
    /// read, so only the sampled records are ever buffered.
    ///
    /// An empty selection is not an error: a warning is logged and an empty
    /// batch returned.
    pub fn decode_file(
        path: &Path,
        request: &BatchRequest,
        rng: &mut dyn RngCore,
    ) -> DecodeResult<PointBatch> {
        let format = request.format;
        let mut file = RecordFile::open(path, format)?;
        let total_records = file.record_count();

        let window = Window::resolve(
            total_records,
            request.start_percent,
            request.length_percent,
        );
        let decimator = Decimator::new(window, request.decimation, request.sampling);

        tracing::debug!(
            path = %path.display(),
            first = window.start,
            end = window.end(),
            total_records,
            decimation = %request.decimation,
            "reading point records"
        );

        let count = usize::try_from(decimator.len()).map_err(|_| DecodeError::Allocation {
            bytes: usize::MAX,
        })?;
        let record_size = format.record_size();
        let byte_len = count
            .checked_mul(record_size)
            .ok_or(DecodeError::Allocation { bytes: usize::MAX })?;

        if byte_len == 0 {
            tracing::warn!(
                path = %path.display(),
                records = window.length,
                decimation = %request.decimation,
                "no records selected"
            );
            return Ok(PointBatch {
                window,
                total_records,
                ..PointBatch::default()
            });
        }

        let mut buffer = try_alloc::<u8>(byte_len, byte_len)?;
        buffer.resize(byte_len, 0);

        if request.decimation.is_none() {
            file.read_records(window.start, &mut buffer)?;
        } else {
            for (index, record) in decimator
                .indices(rng)
                .zip(buffer.chunks_exact_mut(record_size))
            {
                file.read_record(index, record)?;
            }
        }
        drop(file);

        let mut positions = try_alloc::<Vec3>(count, count * size_of::<Vec3>())?;
        let mut colors = try_alloc::<Vec4>(count, count * size_of::<Vec4>())?;
        let mut bounds = Bounds::new();

        for record in buffer.chunks_exact(record_size) {
            let [x, y, z, r, g, b, a] = format.unpack(record);
            let position = Vec3::new(x, y, z);
            let color = Vec4::new(r, g, b, a);
            positions.push(position);
            colors.push(color);
            bounds.update(position, color);
        }

        Ok(PointBatch {
            positions,
            colors,
            bounds,
            window,
            total_records,
        })
    }
}

impl PointSource for PointBatchDecoder {
    fn decode(
        &self,
        path: &Path,
        request: &BatchRequest,
        rng: &mut dyn RngCore,
    ) -> DecodeResult<PointBatch> {
        Self::decode_file(path, request, rng)
    }
}

fn try_alloc<T>(capacity: usize, bytes: usize) -> DecodeResult<Vec<T>> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(capacity).map_err(|_| {
        tracing::error!(bytes, "could not allocate decode buffer");
        DecodeError::Allocation { bytes }
    })?;
    Ok(vec)
}
