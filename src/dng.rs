//! Projection of a directory onto the typed DNG 1.4 fields
//!
//! Every field is optional: a missing tag projects to `None` and the math
//! consumers apply the defaults the DNG specification permits. Tags the color
//! pipeline only passes through are retained as raw entries.

use std::io::{Read, Seek};

use nalgebra::{DMatrix, DVector};

use crate::decoder::ifd::Entry;
use crate::decoder::Decoder;
use crate::tags::Tag;
use crate::{Directory, FormatError, RawError, RawResult};

/// The typed DNG view of one image file directory.
///
/// The `Default` value has no planes and every field absent; it is mainly
/// useful for synthesizing frames in tests and tools.
#[derive(Debug, Clone, Default)]
pub struct DngFrame {
    /// Number of camera color planes, from SamplesPerPixel (TIFF default 1).
    pub color_planes: usize,

    // TIFF-EP
    pub cfa_repeat_pattern_dim: Option<Entry>,
    pub cfa_pattern: Option<Entry>,

    // DNG
    pub dng_version: Option<Vec<u8>>,
    pub dng_backward_version: Option<Entry>,
    pub unique_camera_model: Option<String>,
    pub localized_camera_model: Option<Entry>,
    pub cfa_plane_color: Option<Entry>,
    pub cfa_layout: Option<Entry>,
    pub linearization_table: Option<Entry>,
    pub black_level_repeat_dim: Option<Entry>,
    pub black_level: Option<Vec<f64>>,
    pub black_level_delta_h: Option<Entry>,
    pub black_level_delta_v: Option<Entry>,
    pub white_level: Option<Vec<u32>>,
    pub default_scale: Option<Entry>,
    pub best_quality_scale: Option<Entry>,
    pub default_crop_origin: Option<Entry>,
    pub default_crop_size: Option<Entry>,
    /// Kelvin temperature of the first calibration illuminant.
    pub calibration_illuminant1: Option<f64>,
    /// Kelvin temperature of the second calibration illuminant.
    pub calibration_illuminant2: Option<f64>,
    /// XYZ to camera values under illuminant 1, `color_planes x 3`.
    pub color_matrix1: Option<DMatrix<f64>>,
    /// XYZ to camera values under illuminant 2, `color_planes x 3`.
    pub color_matrix2: Option<DMatrix<f64>>,
    /// Per-unit calibration under illuminant 1, `color_planes x color_planes`.
    pub camera_calibration1: Option<DMatrix<f64>>,
    /// Per-unit calibration under illuminant 2, `color_planes x color_planes`.
    pub camera_calibration2: Option<DMatrix<f64>>,
    /// Dimensionality reduction for four-color cameras, `3 x color_planes`.
    pub reduction_matrix1: Option<DMatrix<f64>>,
    pub reduction_matrix2: Option<DMatrix<f64>>,
    /// Analog gain applied before digitization, length `color_planes`.
    pub analog_balance: Option<DVector<f64>>,
    /// Camera-native triplet of the scene neutral, length `color_planes`.
    pub as_shot_neutral: Option<DVector<f64>>,
    /// Shooting white balance as a CIE xy chromaticity, when the camera
    /// records it directly instead of [`DngFrame::as_shot_neutral`].
    pub as_shot_white_xy: Option<(f64, f64)>,
    pub baseline_exposure: Option<Entry>,
    pub baseline_noise: Option<Entry>,
    pub baseline_sharpness: Option<Entry>,
    pub bayer_green_split: Option<Entry>,
    pub linear_response_limit: Option<Entry>,
    pub camera_serial_number: Option<Entry>,
    pub lens_info: Option<Entry>,
    pub chroma_blur_radius: Option<Entry>,
    pub anti_alias_strength: Option<Entry>,
    pub shadow_scale: Option<Entry>,
    pub dng_private_data: Option<Entry>,
    pub maker_note_safety: Option<Entry>,
    pub raw_data_unique_id: Option<Entry>,
    pub original_raw_file_name: Option<Entry>,
    pub original_raw_file_data: Option<Entry>,
    /// Rectangle of photosensitive pixels as top, left, bottom, right.
    pub active_area: Option<Vec<u32>>,
    pub masked_areas: Option<Entry>,
    pub as_shot_icc_profile: Option<Entry>,
    pub as_shot_pre_profile_matrix: Option<Entry>,
    pub current_icc_profile: Option<Entry>,
    pub current_pre_profile_matrix: Option<Entry>,
    pub colorimetric_reference: Option<Entry>,
    pub camera_calibration_signature: Option<Entry>,
    pub profile_calibration_signature: Option<Entry>,
    pub extra_camera_profiles: Option<Entry>,
    pub as_shot_profile_name: Option<Entry>,
    pub noise_reduction_applied: Option<Entry>,
    pub profile_name: Option<Entry>,
    pub profile_hue_sat_map_dims: Option<Entry>,
    pub profile_hue_sat_map_data1: Option<Entry>,
    pub profile_hue_sat_map_data2: Option<Entry>,
    pub profile_tone_curve: Option<Entry>,
    pub profile_embed_policy: Option<Entry>,
    pub profile_copyright: Option<Entry>,
    /// Camera to XYZ (D50) under illuminant 1, `3 x color_planes`.
    pub forward_matrix1: Option<DMatrix<f64>>,
    /// Camera to XYZ (D50) under illuminant 2, `3 x color_planes`.
    pub forward_matrix2: Option<DMatrix<f64>>,
    pub preview_application_name: Option<Entry>,
    pub preview_application_version: Option<Entry>,
    pub preview_settings_name: Option<Entry>,
    pub preview_settings_digest: Option<Entry>,
    pub preview_color_space: Option<Entry>,
    pub preview_date_time: Option<Entry>,
    pub raw_image_digest: Option<Entry>,
    pub original_raw_file_digest: Option<Entry>,
    pub sub_tile_block_size: Option<Entry>,
    pub row_interleave_factor: Option<Entry>,
    pub profile_look_table_dims: Option<Entry>,
    pub profile_look_table_data: Option<Entry>,
    pub opcode_list1: Option<Entry>,
    pub opcode_list2: Option<Entry>,
    pub opcode_list3: Option<Entry>,
    pub noise_profile: Option<Entry>,
}

impl DngFrame {
    pub fn parse<R: Read + Seek>(
        decoder: &mut Decoder<R>,
        dir: &Directory,
    ) -> RawResult<DngFrame> {
        let color_planes = match decoder.get_tag(dir, Tag::SamplesPerPixel)? {
            Some(value) => usize::from(value.into_u16()?),
            None => 1,
        };

        let opaque = |tag| dir.get(tag).cloned();

        Ok(DngFrame {
            color_planes,

            cfa_repeat_pattern_dim: opaque(Tag::CfaRepeatPatternDim),
            cfa_pattern: opaque(Tag::CfaPattern),

            dng_version: decoder
                .get_tag(dir, Tag::DngVersion)?
                .map(|v| v.into_u8_vec())
                .transpose()?,
            dng_backward_version: opaque(Tag::DngBackwardVersion),
            unique_camera_model: decoder
                .get_tag(dir, Tag::UniqueCameraModel)?
                .map(|v| v.into_string())
                .transpose()?,
            localized_camera_model: opaque(Tag::LocalizedCameraModel),
            cfa_plane_color: opaque(Tag::CfaPlaneColor),
            cfa_layout: opaque(Tag::CfaLayout),
            linearization_table: opaque(Tag::LinearizationTable),
            black_level_repeat_dim: opaque(Tag::BlackLevelRepeatDim),
            black_level: decoder
                .get_tag(dir, Tag::BlackLevel)?
                .map(|v| v.into_f64_vec())
                .transpose()?,
            black_level_delta_h: opaque(Tag::BlackLevelDeltaH),
            black_level_delta_v: opaque(Tag::BlackLevelDeltaV),
            white_level: decoder
                .get_tag(dir, Tag::WhiteLevel)?
                .map(|v| v.into_u32_vec())
                .transpose()?,
            default_scale: opaque(Tag::DefaultScale),
            best_quality_scale: opaque(Tag::BestQualityScale),
            default_crop_origin: opaque(Tag::DefaultCropOrigin),
            default_crop_size: opaque(Tag::DefaultCropSize),

            calibration_illuminant1: light_source_temperature(
                decoder,
                dir,
                Tag::CalibrationIlluminant1,
            )?,
            calibration_illuminant2: light_source_temperature(
                decoder,
                dir,
                Tag::CalibrationIlluminant2,
            )?,
            color_matrix1: extract_matrix(decoder, dir, Tag::ColorMatrix1, color_planes, 3)?,
            color_matrix2: extract_matrix(decoder, dir, Tag::ColorMatrix2, color_planes, 3)?,
            camera_calibration1: extract_matrix(
                decoder,
                dir,
                Tag::CameraCalibration1,
                color_planes,
                color_planes,
            )?,
            camera_calibration2: extract_matrix(
                decoder,
                dir,
                Tag::CameraCalibration2,
                color_planes,
                color_planes,
            )?,
            reduction_matrix1: extract_matrix(decoder, dir, Tag::ReductionMatrix1, 3, color_planes)?,
            reduction_matrix2: extract_matrix(decoder, dir, Tag::ReductionMatrix2, 3, color_planes)?,
            analog_balance: extract_vector(decoder, dir, Tag::AnalogBalance, color_planes)?,
            as_shot_neutral: extract_vector(decoder, dir, Tag::AsShotNeutral, color_planes)?,
            as_shot_white_xy: extract_xy(decoder, dir, Tag::AsShotWhiteXy)?,

            baseline_exposure: opaque(Tag::BaselineExposure),
            baseline_noise: opaque(Tag::BaselineNoise),
            baseline_sharpness: opaque(Tag::BaselineSharpness),
            bayer_green_split: opaque(Tag::BayerGreenSplit),
            linear_response_limit: opaque(Tag::LinearResponseLimit),
            camera_serial_number: opaque(Tag::CameraSerialNumber),
            lens_info: opaque(Tag::LensInfo),
            chroma_blur_radius: opaque(Tag::ChromaBlurRadius),
            anti_alias_strength: opaque(Tag::AntiAliasStrength),
            shadow_scale: opaque(Tag::ShadowScale),
            dng_private_data: opaque(Tag::DngPrivateData),
            maker_note_safety: opaque(Tag::MakerNoteSafety),
            raw_data_unique_id: opaque(Tag::RawDataUniqueId),
            original_raw_file_name: opaque(Tag::OriginalRawFileName),
            original_raw_file_data: opaque(Tag::OriginalRawFileData),
            active_area: decoder
                .get_tag(dir, Tag::ActiveArea)?
                .map(|v| v.into_u32_vec())
                .transpose()?,
            masked_areas: opaque(Tag::MaskedAreas),
            as_shot_icc_profile: opaque(Tag::AsShotIccProfile),
            as_shot_pre_profile_matrix: opaque(Tag::AsShotPreProfileMatrix),
            current_icc_profile: opaque(Tag::CurrentIccProfile),
            current_pre_profile_matrix: opaque(Tag::CurrentPreProfileMatrix),
            colorimetric_reference: opaque(Tag::ColorimetricReference),
            camera_calibration_signature: opaque(Tag::CameraCalibrationSignature),
            profile_calibration_signature: opaque(Tag::ProfileCalibrationSignature),
            extra_camera_profiles: opaque(Tag::ExtraCameraProfiles),
            as_shot_profile_name: opaque(Tag::AsShotProfileName),
            noise_reduction_applied: opaque(Tag::NoiseReductionApplied),
            profile_name: opaque(Tag::ProfileName),
            profile_hue_sat_map_dims: opaque(Tag::ProfileHueSatMapDims),
            profile_hue_sat_map_data1: opaque(Tag::ProfileHueSatMapData1),
            profile_hue_sat_map_data2: opaque(Tag::ProfileHueSatMapData2),
            profile_tone_curve: opaque(Tag::ProfileToneCurve),
            profile_embed_policy: opaque(Tag::ProfileEmbedPolicy),
            profile_copyright: opaque(Tag::ProfileCopyright),
            forward_matrix1: extract_matrix(decoder, dir, Tag::ForwardMatrix1, 3, color_planes)?,
            forward_matrix2: extract_matrix(decoder, dir, Tag::ForwardMatrix2, 3, color_planes)?,
            preview_application_name: opaque(Tag::PreviewApplicationName),
            preview_application_version: opaque(Tag::PreviewApplicationVersion),
            preview_settings_name: opaque(Tag::PreviewSettingsName),
            preview_settings_digest: opaque(Tag::PreviewSettingsDigest),
            preview_color_space: opaque(Tag::PreviewColorSpace),
            preview_date_time: opaque(Tag::PreviewDateTime),
            raw_image_digest: opaque(Tag::RawImageDigest),
            original_raw_file_digest: opaque(Tag::OriginalRawFileDigest),
            sub_tile_block_size: opaque(Tag::SubTileBlockSize),
            row_interleave_factor: opaque(Tag::RowInterleaveFactor),
            profile_look_table_dims: opaque(Tag::ProfileLookTableDims),
            profile_look_table_data: opaque(Tag::ProfileLookTableData),
            opcode_list1: opaque(Tag::OpcodeList1),
            opcode_list2: opaque(Tag::OpcodeList2),
            opcode_list3: opaque(Tag::OpcodeList3),
            noise_profile: opaque(Tag::NoiseProfile),
        })
    }
}

/// Maps an EXIF light source code to a kelvin temperature.
///
/// When the high bit is set the low 15 bits carry the temperature directly;
/// otherwise the enumerated sources map to their nominal temperatures.
/// Unrecognized sources map to 0 so downstream interpolation treats them as
/// an unusable endpoint.
pub fn light_source_kelvin(light_source: u16) -> f64 {
    if light_source & 0x8000 != 0 {
        return f64::from(light_source & 0x7fff);
    }
    match light_source {
        // Daylight, flash, fine weather, standard lights B and D55
        1 | 4 | 9 | 18 | 20 => 5500.0,
        // Fluorescent and D42
        2 | 14 => 4200.0,
        // Tungsten and standard light A
        3 | 17 => 2850.0,
        // D65, cloudy weather and standard light C
        10 | 19 | 21 => 6500.0,
        // D75 and shade
        11 | 22 => 7500.0,
        // D64 (daylight fluorescent)
        12 => 6400.0,
        // D50 and white fluorescent
        13 | 23 => 5000.0,
        // Cool white fluorescent
        15 => 3450.0,
        // ISO studio tungsten
        24 => 3200.0,
        _ => 0.0,
    }
}

fn light_source_temperature<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
) -> RawResult<Option<f64>> {
    match decoder.get_tag(dir, tag)? {
        Some(value) => Ok(Some(light_source_kelvin(value.into_u16()?))),
        None => Ok(None),
    }
}

fn extract_matrix<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
    rows: usize,
    cols: usize,
) -> RawResult<Option<DMatrix<f64>>> {
    let value = match decoder.get_tag(dir, tag)? {
        Some(value) => value,
        None => return Ok(None),
    };
    let data = value.into_f64_vec()?;
    if data.len() != rows * cols {
        return Err(RawError::FormatError(FormatError::InvalidTagValueType(tag)));
    }
    Ok(Some(DMatrix::from_row_slice(rows, cols, &data)))
}

fn extract_vector<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
    len: usize,
) -> RawResult<Option<DVector<f64>>> {
    let value = match decoder.get_tag(dir, tag)? {
        Some(value) => value,
        None => return Ok(None),
    };
    let data = value.into_f64_vec()?;
    if data.len() != len {
        return Err(RawError::FormatError(FormatError::InvalidTagValueType(tag)));
    }
    Ok(Some(DVector::from_row_slice(&data)))
}

fn extract_xy<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    dir: &Directory,
    tag: Tag,
) -> RawResult<Option<(f64, f64)>> {
    let value = match decoder.get_tag(dir, tag)? {
        Some(value) => value,
        None => return Ok(None),
    };
    let data = value.into_f64_vec()?;
    if data.len() != 2 {
        return Err(RawError::FormatError(FormatError::InvalidTagValueType(tag)));
    }
    Ok(Some((data[0], data[1])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_source_mapping() {
        assert_eq!(light_source_kelvin(17), 2850.0);
        assert_eq!(light_source_kelvin(21), 6500.0);
        assert_eq!(light_source_kelvin(23), 5000.0);
        assert_eq!(light_source_kelvin(24), 3200.0);
        // Unknown sources are unusable endpoints.
        assert_eq!(light_source_kelvin(255), 0.0);
        // High bit set: the low 15 bits are kelvin.
        assert_eq!(light_source_kelvin(0x8000 | 5600), 5600.0);
    }
}
