//! Color science for the camera pipeline
//!
//! Chromaticity conversions, chromatic adaptation and the dual-illuminant
//! matrix interpolation used by the DNG color model. All math is plain real
//! arithmetic over [`nalgebra`] types; given identical inputs the results are
//! bit-identical across runs.

pub mod pipeline;
pub mod temperature;

use nalgebra::{DMatrix, Matrix3, Vector2, Vector3};

/// CIE xy chromaticity.
pub type Xy = Vector2<f64>;
/// CIE XYZ tristimulus values.
pub type Xyz = Vector3<f64>;
/// Red, green, blue in [0, 1].
pub type Rgb = Vector3<f64>;
/// Hue in degrees [0, 360), saturation and value in [0, 1].
pub type Hsv = Vector3<f64>;
/// An XYZ triplet normalized so that Y equals one.
pub type WhitePoint = Vector3<f64>;

/// D50 white point, the reference white of the ProPhoto RGB working space.
pub fn d50() -> WhitePoint {
    xy_to_xyz(&Xy::new(0.34567, 0.35850))
}

/// D65 white point, the reference white of sRGB.
pub fn d65() -> WhitePoint {
    xy_to_xyz(&Xy::new(0.31271, 0.32902))
}

pub fn matrix_prophoto_to_xyz() -> Matrix3<f64> {
    Matrix3::new(
        0.797675, 0.135192, 0.0313534, //
        0.288040, 0.711874, 0.000086, //
        0.0, 0.0, 0.825210,
    )
}

pub fn matrix_xyz_to_prophoto() -> Matrix3<f64> {
    Matrix3::new(
        1.34594, -0.255608, -0.0511118, //
        -0.544599, 1.50817, 0.0205351, //
        0.0, 0.0, 1.21181,
    )
}

pub fn matrix_srgb_to_xyz() -> Matrix3<f64> {
    Matrix3::new(
        0.412424, 0.357579, 0.180464, //
        0.212656, 0.715158, 0.0721856, //
        0.0193324, 0.119193, 0.950444,
    )
}

// D65
pub fn matrix_xyz_to_srgb() -> Matrix3<f64> {
    Matrix3::new(
        3.24071, -1.53726, -0.498571, //
        -0.969258, 1.87599, 0.0415557, //
        0.0556352, -0.203996, 1.05707,
    )
}

/// The Bradford cone response matrix.
fn bradford() -> Matrix3<f64> {
    Matrix3::new(
        0.8951, 0.2664, -0.1614, //
        -0.7502, 1.7135, 0.0367, //
        0.0389, -0.0685, 1.0296,
    )
}

fn bradford_inverse() -> Matrix3<f64> {
    Matrix3::new(
        0.9869929, -0.1470543, 0.1599627, //
        0.4323053, 0.5183603, 0.0492912, //
        -0.0085287, 0.0400428, 0.9684867,
    )
}

/// Projects a chromaticity onto the XYZ plane with unit luminance.
pub fn xy_to_xyz(xy: &Xy) -> Xyz {
    Xyz::new(xy.x / xy.y, 1.0, (1.0 - xy.x - xy.y) / xy.y)
}

/// Normalizes tristimulus values down to their chromaticity.
pub fn xyz_to_xy(xyz: &Xyz) -> Xy {
    let sum = xyz.x + xyz.y + xyz.z;
    Xy::new(xyz.x / sum, xyz.y / sum)
}

/// Bradford chromatic adaptation from one white point to another.
///
/// Computes the per-cone gain diagonal between the two whites in cone space
/// and wraps it back to XYZ. The result left-multiplies XYZ column vectors.
pub fn white_point_conversion_matrix(source: &WhitePoint, target: &WhitePoint) -> Matrix3<f64> {
    let cone = bradford();
    let source_response = cone * source;
    let target_response = cone * target;
    let gains = Matrix3::from_diagonal(&Vector3::new(
        target_response.x / source_response.x,
        target_response.y / source_response.y,
        target_response.z / source_response.z,
    ));
    bradford_inverse() * gains * cone
}

pub fn rgb_to_hsv(rgb: &Rgb) -> Hsv {
    let max = rgb.x.max(rgb.y).max(rgb.z);
    let min = rgb.x.min(rgb.y).min(rgb.z);
    let delta = max - min;

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == rgb.x {
        (rgb.y - rgb.z) / delta
    } else if max == rgb.y {
        (rgb.z - rgb.x) / delta + 2.0
    } else {
        (rgb.x - rgb.y) / delta + 4.0
    };
    hue += 6.0;
    hue -= (hue / 6.0).floor() * 6.0;
    hue *= 60.0;

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    Hsv::new(hue, saturation, max)
}

pub fn hsv_to_rgb(hsv: &Hsv) -> Rgb {
    let mut hue = hsv.x.clamp(0.0, 360.0);
    let saturation = hsv.y.clamp(0.0, 1.0);
    let value = hsv.z.clamp(0.0, 1.0);

    hue = (hue - (hue / 360.0).floor() * 360.0) / 60.0;
    let sector = hue.floor();
    let fraction = hue - sector;

    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * fraction);
    let t = value * (1.0 - saturation * (1.0 - fraction));

    match sector as u32 {
        0 => Rgb::new(value, t, p),
        1 => Rgb::new(q, value, p),
        2 => Rgb::new(p, value, t),
        3 => Rgb::new(p, q, value),
        4 => Rgb::new(t, p, value),
        _ => Rgb::new(value, p, q),
    }
}

/// Interpolates between two optional matrices keyed at illuminant kelvin
/// temperatures.
///
/// The blend runs in reciprocal temperature, matching the DNG model. Queries
/// at or beyond the cooler key return the first matrix, at or beyond the
/// warmer key the second; a single present matrix always wins outright and
/// two absent matrices yield the identity of the requested shape.
pub fn matrix_interpolation(
    matrix1: Option<&DMatrix<f64>>,
    matrix2: Option<&DMatrix<f64>>,
    value1: f64,
    value2: f64,
    value: f64,
    rows: usize,
    cols: usize,
) -> DMatrix<f64> {
    let (matrix1, matrix2) = match (matrix1, matrix2) {
        (None, None) => return DMatrix::identity(rows, cols),
        (Some(matrix1), None) => return matrix1.clone(),
        (None, Some(matrix2)) => return matrix2.clone(),
        (Some(matrix1), Some(matrix2)) => (matrix1, matrix2),
    };

    if value1 == value2 || value <= value1.min(value2) {
        return matrix1.clone();
    }
    if value >= value1.max(value2) {
        return matrix2.clone();
    }

    let f = ((1.0 / value) - (1.0 / value2)) / ((1.0 / value1) - (1.0 / value2));
    matrix1 * f + matrix2 * (1.0 - f)
}
