mod common;

use std::io::Cursor;

use common::TiffBuilder;
use rawdng::decoder::{Decoder, RasterData};
use rawdng::tags::Tag;
use rawdng::{Directory, FormatError, RawError, UnsupportedError};

fn decode(bytes: Vec<u8>) -> Decoder<Cursor<Vec<u8>>> {
    Decoder::new(Cursor::new(bytes)).expect("cannot parse synthetic container")
}

fn first_dir(decoder: &Decoder<Cursor<Vec<u8>>>) -> Directory {
    decoder.directories()[0].clone()
}

#[test]
fn test_minimal_strip_image() {
    let mut b = TiffBuilder::new(false);
    let strip = b.blob(&[10, 20, 30, 40]);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[2]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[8]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
        b.short_entry(Tag::Compression.to_u16(), &[1]),
        b.short_entry(Tag::RowsPerStrip.to_u16(), &[2]),
        b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
        b.long_entry(Tag::StripByteCounts.to_u16(), &[4]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let raster = decoder.read_image(&dir).unwrap();
    assert_eq!((raster.width, raster.height), (2, 2));
    assert_eq!(raster.data, RasterData::U8(vec![10, 20, 30, 40]));
}

#[test]
fn test_packed_12bit_msb() {
    // Two 12-bit samples packed into three bytes, most significant bit first.
    let mut b = TiffBuilder::new(false);
    let strip = b.blob(&[0xAB, 0xCD, 0xEF]);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[1]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[12]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
        b.short_entry(Tag::Compression.to_u16(), &[1]),
        b.short_entry(Tag::RowsPerStrip.to_u16(), &[1]),
        b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let raster = decoder.read_image(&dir).unwrap();
    assert_eq!(raster.data, RasterData::U16(vec![0xABC, 0xDEF]));
}

#[test]
fn test_fill_order_for_16bit_samples() {
    let pixels = [0x01u8, 0x02, 0x03, 0x04];

    for (fill_order, expected) in [(1u16, vec![0x0102, 0x0304]), (2u16, vec![0x0201, 0x0403])] {
        let mut b = TiffBuilder::new(false);
        let strip = b.blob(&pixels);
        let entries = vec![
            b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
            b.short_entry(Tag::ImageLength.to_u16(), &[1]),
            b.short_entry(Tag::BitsPerSample.to_u16(), &[16]),
            b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
            b.short_entry(Tag::FillOrder.to_u16(), &[fill_order]),
            b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
        ];
        let root = b.ifd(entries, 0);
        let mut decoder = decode(b.finish(root));

        let dir = first_dir(&decoder);
        let raster = decoder.read_image(&dir).unwrap();
        assert_eq!(raster.data, RasterData::U16(expected));
    }
}

#[test]
fn test_tiled_layout() {
    // 5x3 image in 4x2 tiles: the buffer rounds up to 8x4 and tiles cover it
    // in row-major order.
    let mut b = TiffBuilder::new(false);
    let tiles: Vec<u32> = (0..4u8)
        .map(|tile| b.blob(&[tile + 1; 8]))
        .collect();
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[5]),
        b.short_entry(Tag::ImageLength.to_u16(), &[3]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[8]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
        b.short_entry(Tag::TileWidth.to_u16(), &[4]),
        b.short_entry(Tag::TileLength.to_u16(), &[2]),
        b.long_entry(Tag::TileOffsets.to_u16(), &tiles),
        b.long_entry(Tag::TileByteCounts.to_u16(), &[8, 8, 8, 8]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let raster = decoder.read_image(&dir).unwrap();
    assert_eq!((raster.width, raster.height), (8, 4));

    let data = match raster.data {
        RasterData::U8(data) => data,
        other => panic!("expected 8-bit raster, got {:?}", other),
    };
    assert_eq!(data.len(), 32);
    // One corner pixel from each tile.
    assert_eq!(data[0], 1);
    assert_eq!(data[4], 2);
    assert_eq!(data[2 * 8], 3);
    assert_eq!(data[2 * 8 + 4], 4);
}

#[test]
fn test_planar_strips() {
    let mut b = TiffBuilder::new(false);
    let plane0 = b.blob(&[1, 2, 3, 4]);
    let plane1 = b.blob(&[5, 6, 7, 8]);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[2]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[8, 8]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[2]),
        b.short_entry(Tag::PlanarConfiguration.to_u16(), &[2]),
        b.short_entry(Tag::RowsPerStrip.to_u16(), &[2]),
        b.long_entry(Tag::StripOffsets.to_u16(), &[plane0, plane1]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let raster = decoder.read_image(&dir).unwrap();
    // Plane contiguous output.
    assert_eq!(raster.data, RasterData::U8(vec![1, 2, 3, 4, 5, 6, 7, 8]));
}

#[test]
fn test_rows_per_strip_exceeding_height() {
    // One strip covers all rows; the realized height rounds up to the strip.
    let mut b = TiffBuilder::new(false);
    let strip = b.blob(&[7u8; 16]);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[2]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[8]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
        b.short_entry(Tag::RowsPerStrip.to_u16(), &[8]),
        b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let raster = decoder.read_image(&dir).unwrap();
    assert_eq!((raster.width, raster.height), (2, 8));
    assert_eq!(raster.data.len(), 16);
}

#[test]
fn test_endianness_parity() {
    // The same logical content in both byte orders parses identically.
    fn build(big_endian: bool) -> Vec<u8> {
        let mut b = TiffBuilder::new(big_endian);
        let strip = b.blob(&[10, 20, 30, 40]);
        let entries = vec![
            b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
            b.short_entry(Tag::ImageLength.to_u16(), &[2]),
            b.short_entry(Tag::BitsPerSample.to_u16(), &[8]),
            b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
            b.short_entry(Tag::RowsPerStrip.to_u16(), &[2]),
            b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
            b.ascii_entry(Tag::UniqueCameraModel.to_u16(), "Front Camera"),
            b.rational_entry(Tag::AsShotNeutral.to_u16(), &[(475, 1000)]),
            b.srational_entry(Tag::ColorMatrix1.to_u16(), &[(5309, 10000), (-229, 10000)]),
            b.double_entry(Tag::NoiseReductionApplied.to_u16(), &[0.25]),
            b.long_entry(Tag::WhiteLevel.to_u16(), &[65535]),
        ];
        let root = b.ifd(entries, 0);
        b.finish(root)
    }

    let mut little = decode(build(false));
    let mut big = decode(build(true));

    let little_dir = first_dir(&little);
    let big_dir = first_dir(&big);

    for tag in [
        Tag::ImageWidth,
        Tag::UniqueCameraModel,
        Tag::AsShotNeutral,
        Tag::ColorMatrix1,
        Tag::NoiseReductionApplied,
        Tag::WhiteLevel,
    ] {
        let lhs = little.get_tag(&little_dir, tag).unwrap();
        let rhs = big.get_tag(&big_dir, tag).unwrap();
        assert_eq!(lhs, rhs, "tag {:?} decoded differently across byte orders", tag);
    }

    let lhs = little.read_image(&little_dir).unwrap();
    let rhs = big.read_image(&big_dir).unwrap();
    assert_eq!((lhs.width, lhs.height), (rhs.width, rhs.height));
    assert_eq!(lhs.data, rhs.data);
}

#[test]
fn test_inline_payload_read_from_entry_slot() {
    let mut b = TiffBuilder::new(false);
    let entries = vec![b.short_entry(Tag::ImageWidth.to_u16(), &[7])];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let entry = dir.get(Tag::ImageWidth).unwrap().clone();
    assert!(entry.is_inline());
    // The recorded payload offset is the entry's own value slot inside the
    // directory record, not the numeric interpretation of the slot bytes.
    assert_eq!(entry.offset(), u64::from(root) + 2 + 8);
    assert_eq!(
        decoder.get_tag(&dir, Tag::ImageWidth).unwrap().unwrap().into_u16().unwrap(),
        7
    );
}

#[test]
fn test_unsupported_compression_is_recoverable() {
    let mut b = TiffBuilder::new(false);
    let strip = b.blob(&[0u8; 4]);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[2]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[8]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
        b.short_entry(Tag::Compression.to_u16(), &[7]),
        b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let err = decoder.read_image(&dir).unwrap_err();
    assert!(matches!(
        err,
        RawError::UnsupportedError(UnsupportedError::UnsupportedCompression(7))
    ));
    // The metadata stays readable after the failed pixel read.
    assert_eq!(
        decoder.get_tag(&dir, Tag::ImageWidth).unwrap().unwrap().into_u32().unwrap(),
        2
    );
}

#[test]
fn test_missing_required_tag() {
    let mut b = TiffBuilder::new(false);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[2]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let err = decoder.read_image(&dir).unwrap_err();
    assert!(matches!(
        err,
        RawError::FormatError(FormatError::RequiredTagNotFound(Tag::BitsPerSample))
    ));
}

#[test]
fn test_sub_ifd_lookup() {
    let mut b = TiffBuilder::new(false);

    let strip = b.blob(&[1, 2, 3, 4]);
    let raw_entries = vec![
        b.long_entry(Tag::NewSubfileType.to_u16(), &[0]),
        b.short_entry(Tag::ImageWidth.to_u16(), &[2]),
        b.short_entry(Tag::ImageLength.to_u16(), &[2]),
        b.short_entry(Tag::BitsPerSample.to_u16(), &[8]),
        b.short_entry(Tag::SamplesPerPixel.to_u16(), &[1]),
        b.short_entry(Tag::RowsPerStrip.to_u16(), &[2]),
        b.long_entry(Tag::StripOffsets.to_u16(), &[strip]),
    ];
    let raw_ifd = b.ifd(raw_entries, 0);

    let root_entries = vec![
        b.long_entry(Tag::NewSubfileType.to_u16(), &[1]),
        b.short_entry(Tag::ImageWidth.to_u16(), &[1]),
        b.long_entry(Tag::SubIfds.to_u16(), &[raw_ifd]),
    ];
    let root = b.ifd(root_entries, 0);
    let mut decoder = decode(b.finish(root));

    let raw = decoder
        .find_by_subfile_type(0)
        .unwrap()
        .expect("raw frame sub-IFD not found");
    let raster = decoder.read_image(&raw).unwrap();
    assert_eq!(raster.data, RasterData::U8(vec![1, 2, 3, 4]));
}

#[test]
fn test_cycle_in_directory_chain() {
    let mut b = TiffBuilder::new(false);
    let entries = vec![b.short_entry(Tag::ImageWidth.to_u16(), &[1])];
    let root = b.offset();
    // The directory links back at itself.
    let written = b.ifd(entries, root);
    assert_eq!(written, root);

    let err = Decoder::new(Cursor::new(b.finish(root))).unwrap_err();
    assert!(matches!(
        err,
        RawError::FormatError(FormatError::CycleInOffsets)
    ));
}

#[test]
fn test_bad_signature() {
    let err = Decoder::new(Cursor::new(b"XXNOPE".to_vec())).unwrap_err();
    assert!(matches!(
        err,
        RawError::FormatError(FormatError::SignatureNotFound)
    ));
}

#[test]
fn test_string_tag_strips_terminator() {
    let mut b = TiffBuilder::new(false);
    let entries = vec![
        b.short_entry(Tag::ImageWidth.to_u16(), &[1]),
        b.ascii_entry(Tag::UniqueCameraModel.to_u16(), "Example Camera Mk II"),
    ];
    let root = b.ifd(entries, 0);
    let mut decoder = decode(b.finish(root));

    let dir = first_dir(&decoder);
    let model = decoder
        .get_tag(&dir, Tag::UniqueCameraModel)
        .unwrap()
        .unwrap()
        .into_string()
        .unwrap();
    assert_eq!(model, "Example Camera Mk II");
}
