//! Composition of the camera to working space transform
//!
//! The DNG color model keys its matrices to the temperature of the shooting
//! white, which is itself only known once the matrices are fixed. The solver
//! breaks the circularity by fixed-point iteration seeded at D50.

use nalgebra::{DMatrix, DVector, Matrix3};

use super::temperature::xy_to_temperature;
use super::{
    d50, matrix_interpolation, matrix_xyz_to_prophoto, white_point_conversion_matrix, xy_to_xyz,
    xyz_to_xy, Xy, Xyz,
};
use crate::dng::DngFrame;
use crate::{FormatError, RawError, RawResult};

/// Convergence threshold on `|dx| + |dy|` between iterations.
const CONVERGENCE: f64 = 1.0e-7;
/// The iteration contracts quickly in practice; hitting this cap means the
/// metadata is degenerate.
const MAX_ITERATIONS: usize = 32;

/// The XYZ to camera-native transform for a given shooting white.
///
/// Both the color matrix and the camera calibration are interpolated between
/// their dual-illuminant variants at the temperature of the white; analog
/// balance applies as a per-plane gain. Missing tags fall back to identities
/// of the appropriate shape.
pub fn matrix_xyz_to_camera(frame: &DngFrame, white_balance: &Xy) -> DMatrix<f64> {
    let kelvin = xy_to_temperature(white_balance).kelvin;
    let planes = frame.color_planes;
    let illuminant1 = frame.calibration_illuminant1.unwrap_or(0.0);
    let illuminant2 = frame.calibration_illuminant2.unwrap_or(0.0);

    let color_matrix = matrix_interpolation(
        frame.color_matrix1.as_ref(),
        frame.color_matrix2.as_ref(),
        illuminant1,
        illuminant2,
        kelvin,
        planes,
        3,
    );
    let camera_calibration = matrix_interpolation(
        frame.camera_calibration1.as_ref(),
        frame.camera_calibration2.as_ref(),
        illuminant1,
        illuminant2,
        kelvin,
        planes,
        planes,
    );
    let analog_balance = match &frame.analog_balance {
        Some(gains) => DMatrix::from_diagonal(gains),
        None => DMatrix::identity(planes, planes),
    };

    analog_balance * camera_calibration * color_matrix
}

/// Inverts the XYZ-to-camera transform; four-color cameras get a least
/// squares inverse.
fn camera_to_xyz(xyz_to_camera: &DMatrix<f64>) -> RawResult<DMatrix<f64>> {
    let inverse = if xyz_to_camera.is_square() {
        xyz_to_camera.clone().try_inverse()
    } else {
        xyz_to_camera.clone().pseudo_inverse(1.0e-12).ok()
    };
    inverse.ok_or(RawError::FormatError(FormatError::NumericDomain(
        "singular camera color matrix",
    )))
}

/// Recovers the shooting white chromaticity from the camera-native neutral.
///
/// Picard iteration: starting from D50's chromaticity, map the neutral
/// through the inverse of the white-dependent camera matrix and take the
/// chromaticity of the result, until the step is below [`CONVERGENCE`].
/// Returns the converged chromaticity.
pub fn camera_neutral_white_balance(frame: &DngFrame) -> RawResult<Xy> {
    let neutral = match &frame.as_shot_neutral {
        Some(neutral) => neutral.clone(),
        None => DVector::from_element(frame.color_planes, 1.0),
    };

    let mut last = xyz_to_xy(&d50());
    for _ in 0..MAX_ITERATIONS {
        let forward = matrix_xyz_to_camera(frame, &last);
        let inverse = camera_to_xyz(&forward)?;
        let xyz = &inverse * &neutral;
        if xyz.len() != 3 {
            return Err(RawError::FormatError(FormatError::NumericDomain(
                "camera matrix does not map back to XYZ",
            )));
        }
        let current = xyz_to_xy(&Xyz::new(xyz[0], xyz[1], xyz[2]));
        let delta = (last.x - current.x).abs() + (last.y - current.y).abs();
        last = current;
        if delta <= CONVERGENCE {
            return Ok(last);
        }
    }

    Err(RawError::FormatError(FormatError::NumericDomain(
        "white balance iteration did not converge",
    )))
}

/// Camera-native values to D50-adapted XYZ for a given shooting white.
pub fn matrix_camera_to_d50(frame: &DngFrame, white_balance: &Xy) -> RawResult<DMatrix<f64>> {
    let white_xyz = xy_to_xyz(white_balance);
    let inverse = camera_to_xyz(&matrix_xyz_to_camera(frame, white_balance))?;
    let adaptation = white_point_conversion_matrix(&white_xyz, &d50());
    Ok(dynamic(&adaptation) * inverse)
}

/// The full camera to ProPhoto RGB transform of a frame.
///
/// Solves the shooting white from the recorded neutral, inverts the camera
/// matrix at that white, adapts to D50 and projects into ProPhoto primaries.
pub fn matrix_camera_to_prophoto(frame: &DngFrame) -> RawResult<DMatrix<f64>> {
    let white_balance = camera_neutral_white_balance(frame)?;
    let camera_to_d50 = matrix_camera_to_d50(frame, &white_balance)?;
    Ok(dynamic(&matrix_xyz_to_prophoto()) * camera_to_d50)
}

fn dynamic(matrix: &Matrix3<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(3, 3, |row, col| matrix[(row, col)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(planes: usize) -> DngFrame {
        DngFrame {
            color_planes: planes,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_illuminant_ignores_temperature() {
        // With only the first matrix present the interpolation must return it
        // unchanged, whatever the solved white balance temperature is.
        let mut frame = frame(3);
        frame.color_matrix1 = Some(DMatrix::from_row_slice(
            3,
            3,
            &[0.9, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.2],
        ));
        frame.calibration_illuminant1 = Some(6500.0);

        for xy in [Xy::new(0.3127, 0.3290), Xy::new(0.4, 0.38)] {
            let m = matrix_xyz_to_camera(&frame, &xy);
            assert_eq!(m, frame.color_matrix1.clone().unwrap());
        }
    }

    #[test]
    fn test_neutral_solver_fixed_point() {
        // Identity matrices and a unit neutral: the fixed point is the
        // chromaticity of equal-energy XYZ.
        let mut frame = frame(3);
        frame.as_shot_neutral = Some(DVector::from_element(3, 1.0));

        let solved = camera_neutral_white_balance(&frame).unwrap();
        assert_relative_eq!(solved.x, 1.0 / 3.0, epsilon = 1e-7);
        assert_relative_eq!(solved.y, 1.0 / 3.0, epsilon = 1e-7);
    }

    #[test]
    fn test_singular_matrix_is_a_domain_error() {
        let mut frame = frame(3);
        frame.color_matrix1 = Some(DMatrix::zeros(3, 3));
        frame.calibration_illuminant1 = Some(5500.0);

        assert!(camera_neutral_white_balance(&frame).is_err());
    }

    #[test]
    fn test_identity_pipeline_shape() {
        let mut frame = frame(3);
        frame.as_shot_neutral = Some(DVector::from_element(3, 1.0));

        let m = matrix_camera_to_prophoto(&frame).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (3, 3));
        assert!(m.iter().all(|v| v.is_finite()));
    }
}
