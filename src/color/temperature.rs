//! Correlated color temperature along the Planckian locus
//!
//! The locus is tabulated as 31 Robertson rows of reciprocal temperature,
//! CIE 1960 uv coordinates and isotemperature line slope. A chromaticity maps
//! to a temperature by walking the rows until the signed distance to the
//! isotemperature line changes sign, then blending the two bracketing rows;
//! the tint is the distance along the blended line, scaled so that typical
//! camera tints land in small integer ranges.

use super::Xy;

/// A correlated color temperature in kelvin together with the offset from
/// the Planckian locus ("tint").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub kelvin: f64,
    pub tint: f64,
}

const TINT_SCALE: f64 = -3000.0;

/// Robertson rows: reciprocal megakelvin, u, v, isotemperature line slope.
const RUVT: [[f64; 4]; 31] = [
    [0.0, 0.18006, 0.26352, -0.24341],
    [10.0, 0.18066, 0.26589, -0.25479],
    [20.0, 0.18133, 0.26846, -0.26876],
    [30.0, 0.18208, 0.27119, -0.28539],
    [40.0, 0.18293, 0.27407, -0.30470],
    [50.0, 0.18388, 0.27709, -0.32675],
    [60.0, 0.18494, 0.28021, -0.35156],
    [70.0, 0.18611, 0.28342, -0.37915],
    [80.0, 0.18740, 0.28668, -0.40955],
    [90.0, 0.18880, 0.28997, -0.44278],
    [100.0, 0.19032, 0.29326, -0.47888],
    [125.0, 0.19462, 0.30141, -0.58204],
    [150.0, 0.19962, 0.30921, -0.70471],
    [175.0, 0.20525, 0.31647, -0.84901],
    [200.0, 0.21142, 0.32312, -1.0182],
    [225.0, 0.21807, 0.32909, -1.2168],
    [250.0, 0.22511, 0.33439, -1.4512],
    [275.0, 0.23247, 0.33904, -1.7298],
    [300.0, 0.24010, 0.34308, -2.0637],
    [325.0, 0.24792, 0.34655, -2.4681],
    [350.0, 0.25591, 0.34951, -2.9641],
    [375.0, 0.26400, 0.35200, -3.5814],
    [400.0, 0.27218, 0.35407, -4.3633],
    [425.0, 0.28039, 0.35577, -5.3762],
    [450.0, 0.28863, 0.35714, -6.7262],
    [475.0, 0.29685, 0.35823, -8.5955],
    [500.0, 0.30505, 0.35907, -11.324],
    [525.0, 0.31320, 0.35968, -15.628],
    [550.0, 0.32129, 0.36011, -23.325],
    [575.0, 0.32931, 0.36038, -40.770],
    [600.0, 0.33724, 0.36051, -116.45],
];

const R: usize = 0;
const U: usize = 1;
const V: usize = 2;
const T: usize = 3;

fn xy_to_uv(xy: &Xy) -> (f64, f64) {
    let divisor = 1.5 - xy.x + 6.0 * xy.y;
    (2.0 * xy.x / divisor, 3.0 * xy.y / divisor)
}

fn uv_to_xy(u: f64, v: f64) -> Xy {
    let divisor = u - 4.0 * v + 2.0;
    Xy::new(1.5 * u / divisor, v / divisor)
}

/// Finds the correlated temperature and tint of a chromaticity.
///
/// Chromaticities beyond the tabulated range clamp to the nearest endpoint
/// row; a point exactly on the locus yields a zero tint.
pub fn xy_to_temperature(xy: &Xy) -> Temperature {
    let (u, v) = xy_to_uv(xy);

    let mut last_dt = 0.0;
    let mut last_du = 0.0;
    let mut last_dv = 0.0;

    for index in 1..RUVT.len() {
        // Isotemperature line slope as a unit direction.
        let mut du = 1.0;
        let mut dv = RUVT[index][T];
        let len = (1.0 + dv * dv).sqrt();
        du /= len;
        dv /= len;

        // Signed distance of the query above or below the line.
        let uu = u - RUVT[index][U];
        let vv = v - RUVT[index][V];
        let mut dt = -uu * dv + vv * du;

        if dt <= 0.0 || index == RUVT.len() - 1 {
            // The blend weight stays in [0, 1]: the previous distance was
            // positive and dt is clamped to the on-locus boundary.
            dt = -dt.min(0.0);
            let f = if index == 1 { 0.0 } else { dt / (last_dt + dt) };

            let kelvin = 1.0e6 / (RUVT[index - 1][R] * f + RUVT[index][R] * (1.0 - f));

            let uu = u - (RUVT[index - 1][U] * f + RUVT[index][U] * (1.0 - f));
            let vv = v - (RUVT[index - 1][V] * f + RUVT[index][V] * (1.0 - f));

            let mut du = du * (1.0 - f) + last_du * f;
            let mut dv = dv * (1.0 - f) + last_dv * f;
            let len = (du * du + dv * dv).sqrt();
            du /= len;
            dv /= len;

            let tint = (uu * du + vv * dv) * TINT_SCALE;

            return Temperature { kelvin, tint };
        }

        last_dt = dt;
        last_du = du;
        last_dv = dv;
    }

    // The loop always returns on its last row.
    unreachable!("ruvt walk terminates on the final row")
}

/// Recovers the chromaticity of a temperature and tint pair.
///
/// Temperatures beyond the tabulated range clamp to the nearest endpoint row.
pub fn temperature_to_xy(temperature: &Temperature) -> Xy {
    let r = 1.0e6 / temperature.kelvin;

    for index in 0..RUVT.len() - 1 {
        if r < RUVT[index + 1][R] || index == RUVT.len() - 2 {
            let f = (RUVT[index + 1][R] - r) / (RUVT[index + 1][R] - RUVT[index][R]);
            let f = f.clamp(0.0, 1.0);

            let mut u = RUVT[index][U] * f + RUVT[index + 1][U] * (1.0 - f);
            let mut v = RUVT[index][V] * f + RUVT[index + 1][V] * (1.0 - f);

            let len1 = (1.0 + RUVT[index][T] * RUVT[index][T]).sqrt();
            let len2 = (1.0 + RUVT[index + 1][T] * RUVT[index + 1][T]).sqrt();
            let mut du = (1.0 / len1) * f + (1.0 / len2) * (1.0 - f);
            let mut dv = (RUVT[index][T] / len1) * f + (RUVT[index + 1][T] / len2) * (1.0 - f);
            let len = (du * du + dv * dv).sqrt();
            du /= len;
            dv /= len;

            u += du * temperature.tint / TINT_SCALE;
            v += dv * temperature.tint / TINT_SCALE;

            return uv_to_xy(u, v);
        }
    }

    unreachable!("ruvt walk terminates on the final row")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temperature_round_trip() {
        for &kelvin in &[
            2000.0, 2500.0, 2856.0, 3200.0, 4000.0, 5000.0, 5500.0, 6500.0, 8000.0, 10000.0,
            15000.0, 25000.0,
        ] {
            for &tint in &[-150.0, -100.0, -50.0, 0.0, 50.0, 100.0, 150.0] {
                let xy = temperature_to_xy(&Temperature { kelvin, tint });
                let back = xy_to_temperature(&xy);
                assert_relative_eq!(back.kelvin, kelvin, epsilon = 1.0);
                assert_relative_eq!(back.tint, tint, epsilon = 0.5);
            }
        }
    }

    #[test]
    fn test_d50_near_5000k() {
        let t = xy_to_temperature(&Xy::new(0.34567, 0.35850));
        assert_relative_eq!(t.kelvin, 5002.0, epsilon = 5.0);
        assert!(t.tint.abs() < 15.0);
    }

    #[test]
    fn test_out_of_range_clamps() {
        // Hotter than the first row maps back near the first row.
        let xy = temperature_to_xy(&Temperature {
            kelvin: 500_000.0,
            tint: 0.0,
        });
        assert!(xy.x.is_finite() && xy.y.is_finite());

        // Colder than the last row clamps to the last row.
        let cold = temperature_to_xy(&Temperature {
            kelvin: 1000.0,
            tint: 0.0,
        });
        let clamped = temperature_to_xy(&Temperature {
            kelvin: 1.0e6 / 600.0,
            tint: 0.0,
        });
        assert_relative_eq!(cold.x, clamped.x, epsilon = 1e-12);
        assert_relative_eq!(cold.y, clamped.y, epsilon = 1e-12);
    }
}
