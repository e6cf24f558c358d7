//! Pixel raster extraction
//!
//! Resolves the storage geometry of a directory (strips or tiles, chunky or
//! planar, arbitrary sample widths) and assembles a dense row-major sample
//! buffer. Only uncompressed storage is readable; compressed images are
//! rejected with a recoverable error so the caller can fall back while still
//! using the parsed metadata.

use std::io::{Read, Seek};
use std::mem;

use super::stream::EndianReader;
use super::{Decoder, ValueReader};
use crate::tags::{
    CompressionMethod, FillOrder, PhotometricInterpretation, PlanarConfiguration, Tag,
};
use crate::{Directory, FormatError, RawError, RawResult, UnsupportedError};

/// Resolved pixel storage geometry of one directory.
///
/// Exactly one of the strip set or the tile set is populated; when a file
/// carries both, tiles win.
#[derive(Debug, Clone)]
pub struct ImageLayout {
    pub planar_config: PlanarConfiguration,
    /// Raw compression code; 1 is uncompressed.
    pub compression: u16,
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    pub fill_order: FillOrder,
    /// Absent when the tag is missing or carries a code outside the
    /// recognized set.
    pub photometric_interpretation: Option<PhotometricInterpretation>,

    pub rows_per_strip: u32,
    pub strip_offsets: Vec<u64>,
    /// Advisory only; the reader is driven by geometry, not byte counts.
    pub strip_byte_counts: Vec<u64>,

    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_offsets: Vec<u64>,
    pub tile_byte_counts: Vec<u64>,
}

impl ImageLayout {
    pub(crate) fn from_directory<R: Read + Seek>(
        decoder: &mut Decoder<R>,
        dir: &Directory,
    ) -> RawResult<ImageLayout> {
        let width = require_u32(decoder, dir, Tag::ImageWidth)?;
        let height = require_u32(decoder, dir, Tag::ImageLength)?;

        // BitsPerSample may carry one entry per sample; all samples of a raw
        // frame share a width, so the first entry rules.
        let bits_per_sample = decoder
            .require_tag(dir, Tag::BitsPerSample)?
            .into_u16_vec()?
            .first()
            .copied()
            .ok_or(RawError::FormatError(FormatError::RequiredTagEmpty(
                Tag::BitsPerSample,
            )))?;

        let samples_per_pixel = decoder
            .require_tag(dir, Tag::SamplesPerPixel)?
            .into_u16()?;
        if samples_per_pixel == 0 {
            return Err(RawError::FormatError(FormatError::SamplesPerPixelIsZero));
        }

        let compression = optional_u16(decoder, dir, Tag::Compression)?.unwrap_or(1);

        let photometric_interpretation =
            optional_u16(decoder, dir, Tag::PhotometricInterpretation)?
                .and_then(PhotometricInterpretation::from_u16);

        let planar_config = match optional_u16(decoder, dir, Tag::PlanarConfiguration)? {
            None => PlanarConfiguration::Chunky,
            Some(config) => PlanarConfiguration::from_u16(config).ok_or(
                RawError::FormatError(FormatError::UnknownPlanarConfiguration(config)),
            )?,
        };

        let fill_order = match optional_u16(decoder, dir, Tag::FillOrder)? {
            None => FillOrder::MsbFirst,
            Some(order) => FillOrder::from_u16(order)
                .ok_or(RawError::FormatError(FormatError::UnknownFillOrder(order)))?,
        };

        // A missing or zero RowsPerStrip means a single strip covers every
        // row, which the realization formula handles uniformly.
        let rows_per_strip = match optional_u32(decoder, dir, Tag::RowsPerStrip)? {
            None | Some(0) => height,
            Some(rows) => rows,
        };

        let strip_offsets = optional_u64_vec(decoder, dir, Tag::StripOffsets)?;
        let strip_byte_counts = optional_u64_vec(decoder, dir, Tag::StripByteCounts)?;

        let tile_width = optional_u32(decoder, dir, Tag::TileWidth)?.unwrap_or(0);
        let tile_height = optional_u32(decoder, dir, Tag::TileLength)?.unwrap_or(0);
        let tile_offsets = optional_u64_vec(decoder, dir, Tag::TileOffsets)?;
        let tile_byte_counts = optional_u64_vec(decoder, dir, Tag::TileByteCounts)?;

        Ok(ImageLayout {
            planar_config,
            compression,
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            fill_order,
            photometric_interpretation,
            rows_per_strip,
            strip_offsets,
            strip_byte_counts,
            tile_width,
            tile_height,
            tile_offsets,
            tile_byte_counts,
        })
    }

    /// Whether the pixels are stored as tiles rather than strips.
    pub fn is_tiled(&self) -> bool {
        !self.tile_offsets.is_empty()
    }

    /// Buffer dimensions after rounding up to whole strips or tiles.
    ///
    /// Pixels outside the declared `width x height` region inside border
    /// chunks are undefined but present in the decoded buffer.
    pub fn realized_dimensions(&self) -> RawResult<(u32, u32)> {
        if self.is_tiled() {
            if self.tile_width == 0 || self.tile_height == 0 {
                return Err(RawError::FormatError(FormatError::RequiredTagNotFound(
                    Tag::TileWidth,
                )));
            }
            let real_width = self.width.div_ceil(self.tile_width) * self.tile_width;
            let real_height = self.height.div_ceil(self.tile_height) * self.tile_height;
            Ok((real_width, real_height))
        } else {
            let real_height =
                self.height.div_ceil(self.rows_per_strip) * self.rows_per_strip;
            Ok((self.width, real_height))
        }
    }
}

fn require_u32<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
) -> RawResult<u32> {
    decoder.require_tag(dir, tag)?.into_u32()
}

fn optional_u16<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
) -> RawResult<Option<u16>> {
    decoder.get_tag(dir, tag)?.map(|v| v.into_u16()).transpose()
}

fn optional_u32<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
) -> RawResult<Option<u32>> {
    decoder.get_tag(dir, tag)?.map(|v| v.into_u32()).transpose()
}

fn optional_u64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
) -> RawResult<Vec<u64>> {
    match decoder.get_tag(dir, tag)? {
        Some(value) => Ok(value.into_u32_vec()?.into_iter().map(u64::from).collect()),
        None => Ok(Vec::new()),
    }
}

/// A decoded sample buffer together with its realized dimensions.
///
/// The buffer is channel-interleaved for chunky images and plane-contiguous
/// for planar ones.
#[derive(Debug)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: RasterData,
}

/// Decoded samples, sized to the sample bit width.
#[derive(Debug, PartialEq, Eq)]
pub enum RasterData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl RasterData {
    pub fn len(&self) -> usize {
        match self {
            RasterData::U8(buf) => buf.len(),
            RasterData::U16(buf) => buf.len(),
            RasterData::U32(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

trait Sample: Copy + Default {
    fn from_bits(value: u32) -> Self;
}

impl Sample for u8 {
    fn from_bits(value: u32) -> u8 {
        value as u8
    }
}

impl Sample for u16 {
    fn from_bits(value: u32) -> u16 {
        value as u16
    }
}

impl Sample for u32 {
    fn from_bits(value: u32) -> u32 {
        value
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn lcm(a: u32, b: u32) -> u32 {
    a / gcd(a, b) * b
}

/// Reads whole packing units from the stream and expands them to samples.
///
/// A unit spans `lcm(bits, 8)` bits, so it holds a whole number of samples
/// and a whole number of bytes. In LSB fill order each sample occupies its
/// own little-endian byte group, which is only well formed for 8, 16 and 32
/// bit samples; every other width unpacks through a most-significant-first
/// bit accumulator.
struct UnitReader {
    bits: u32,
    unit_bytes: usize,
    unit_samples: usize,
    lsb: bool,
    buf: Vec<u8>,
}

impl UnitReader {
    fn new(bits: u16, fill_order: FillOrder) -> UnitReader {
        let bits = u32::from(bits);
        let unit_bits = lcm(bits, 8);
        let lsb = fill_order == FillOrder::LsbFirst && matches!(bits, 8 | 16 | 32);
        UnitReader {
            bits,
            unit_bytes: (unit_bits / 8) as usize,
            unit_samples: (unit_bits / bits) as usize,
            lsb,
            buf: vec![0; (unit_bits / 8) as usize],
        }
    }

    fn read_unit<R: Read>(
        &mut self,
        reader: &mut EndianReader<R>,
        out: &mut Vec<u32>,
    ) -> std::io::Result<()> {
        out.clear();
        reader.read_exact(&mut self.buf)?;
        if self.lsb {
            let step = self.unit_bytes / self.unit_samples;
            for chunk in self.buf.chunks_exact(step) {
                let mut value: u32 = 0;
                for (i, byte) in chunk.iter().enumerate() {
                    value |= u32::from(*byte) << (8 * i);
                }
                out.push(value);
            }
        } else {
            let mut acc: u64 = 0;
            let mut held: u32 = 0;
            for &byte in &self.buf {
                acc = (acc << 8) | u64::from(byte);
                held += 8;
                if held >= self.bits {
                    held -= self.bits;
                    out.push((acc >> held) as u32);
                    acc &= (1u64 << held) - 1;
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn read_raster<R: Read + Seek>(
    value_reader: &mut ValueReader<R>,
    layout: &ImageLayout,
) -> RawResult<Raster> {
    if CompressionMethod::from_u16_exhaustive(layout.compression) != CompressionMethod::None {
        return Err(RawError::UnsupportedError(
            UnsupportedError::UnsupportedCompression(layout.compression),
        ));
    }
    match layout.bits_per_sample {
        1..=8 => read_samples::<R, u8>(value_reader, layout)
            .map(|(width, height, data)| Raster {
                width,
                height,
                data: RasterData::U8(data),
            }),
        9..=16 => read_samples::<R, u16>(value_reader, layout)
            .map(|(width, height, data)| Raster {
                width,
                height,
                data: RasterData::U16(data),
            }),
        17..=32 => read_samples::<R, u32>(value_reader, layout)
            .map(|(width, height, data)| Raster {
                width,
                height,
                data: RasterData::U32(data),
            }),
        bits => Err(RawError::UnsupportedError(
            UnsupportedError::UnsupportedBitsPerSample(bits),
        )),
    }
}

fn read_samples<R: Read + Seek, T: Sample>(
    value_reader: &mut ValueReader<R>,
    layout: &ImageLayout,
) -> RawResult<(u32, u32, Vec<T>)> {
    let (real_width, real_height) = layout.realized_dimensions()?;
    let samples = usize::from(layout.samples_per_pixel);

    let total = usize::try_from(real_width)?
        .checked_mul(usize::try_from(real_height)?)
        .and_then(|n| n.checked_mul(samples))
        .ok_or(RawError::IntSizeError)?;
    if total > value_reader.limits().decoding_buffer_size / mem::size_of::<T>() {
        return Err(RawError::LimitsExceeded);
    }

    // Interleaved channels advance the column index in chunky mode; in
    // planar mode each plane is one contiguous block of the output.
    let (channels, plane_count) = match layout.planar_config {
        PlanarConfiguration::Chunky => (samples, 1),
        PlanarConfiguration::Planar => (1, samples),
    };

    let mut buffer = vec![T::default(); total];
    let mut unit_reader = UnitReader::new(layout.bits_per_sample, layout.fill_order);
    let mut scratch = Vec::with_capacity(unit_reader.unit_samples);

    let real_width = usize::try_from(real_width)?;
    let real_height = usize::try_from(real_height)?;

    if layout.is_tiled() {
        let tile_width = usize::try_from(layout.tile_width)?;
        let tile_height = usize::try_from(layout.tile_height)?;
        let tiles_per_line = real_width / tile_width;
        let tiles_per_plane = tiles_per_line * (real_height / tile_height);
        if layout.tile_offsets.len() < tiles_per_plane * plane_count {
            return Err(RawError::FormatError(
                FormatError::InconsistentSizesEncountered,
            ));
        }

        let row_span = tile_width * channels;
        for plane in 0..plane_count {
            let plane_base = plane * real_width * real_height * channels;
            for tile_index in 0..tiles_per_plane {
                let offset = layout.tile_offsets[plane * tiles_per_plane + tile_index];
                value_reader.reader().goto_offset(offset)?;
                let base_row = tile_index / tiles_per_line * tile_height;
                let base_col = tile_index % tiles_per_line * row_span;
                for row in 0..tile_height {
                    let row_base = plane_base + (base_row + row) * real_width * channels + base_col;
                    emit_row::<R, T>(
                        value_reader.reader(),
                        &mut unit_reader,
                        &mut scratch,
                        &mut buffer,
                        row_base,
                        row_span,
                    )?;
                }
            }
        }
    } else {
        let rows_per_strip = usize::try_from(layout.rows_per_strip)?;
        let strips_per_plane = real_height / rows_per_strip;
        if layout.strip_offsets.len() < strips_per_plane * plane_count {
            return Err(RawError::FormatError(
                FormatError::InconsistentSizesEncountered,
            ));
        }

        let row_span = real_width * channels;
        for plane in 0..plane_count {
            let plane_base = plane * real_width * real_height * channels;
            for strip_index in 0..strips_per_plane {
                let offset = layout.strip_offsets[plane * strips_per_plane + strip_index];
                value_reader.reader().goto_offset(offset)?;
                let base_row = strip_index * rows_per_strip;
                for row in 0..rows_per_strip {
                    let row_base = plane_base + (base_row + row) * row_span;
                    emit_row::<R, T>(
                        value_reader.reader(),
                        &mut unit_reader,
                        &mut scratch,
                        &mut buffer,
                        row_base,
                        row_span,
                    )?;
                }
            }
        }
    }

    Ok((
        u32::try_from(real_width)?,
        u32::try_from(real_height)?,
        buffer,
    ))
}

/// Unpacks one row of `row_span` samples starting at `row_base`.
///
/// The final unit of a row may carry more samples than the row has left;
/// those spill samples belong to the byte padding of the chunk row and are
/// dropped.
fn emit_row<R: Read, T: Sample>(
    reader: &mut EndianReader<R>,
    unit_reader: &mut UnitReader,
    scratch: &mut Vec<u32>,
    buffer: &mut [T],
    row_base: usize,
    row_span: usize,
) -> RawResult<()> {
    let mut col = 0;
    while col < row_span {
        unit_reader.read_unit(reader, scratch)?;
        for (i, &value) in scratch.iter().enumerate() {
            if col + i < row_span {
                buffer[row_base + col + i] = T::from_bits(value);
            }
        }
        col += unit_reader.unit_samples;
    }
    Ok(())
}
