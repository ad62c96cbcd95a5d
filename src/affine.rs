//! 4×4 double-precision affine helpers: reconstruction of the qform matrix
//! from its quaternion representation, inversion, and derivation of the
//! voxel-axis orientations from an affine.

use crate::typedef::Orientation;
use nalgebra::Matrix4;

/// A 4×4 affine transform over `f64`.
pub type Affine4 = Matrix4<f64>;

/// Build a diagonal affine from grid spacings, with the last row `(0,0,0,1)`.
/// This is the qform fallback when `qform_code <= 0`.
pub fn diagonal_affine(dx: f64, dy: f64, dz: f64) -> Affine4 {
    #[rustfmt::skip]
    let m = Affine4::new(
        dx,  0.0, 0.0, 0.0,
        0.0, dy,  0.0, 0.0,
        0.0, 0.0, dz,  0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

/// Reconstruct the voxel-to-patient affine from the on-disk quaternion
/// parameters, offsets, grid spacings and the `qfac` handedness sign.
///
/// The real part is recovered as `a = sqrt(1 - b² - c² - d²)`; when the
/// stored imaginary parts are slightly over unit length the quaternion is
/// renormalised and `a` set to zero (a 180 degree rotation).
pub fn quaternion_to_affine(
    b: f64,
    c: f64,
    d: f64,
    qx: f64,
    qy: f64,
    qz: f64,
    dx: f64,
    dy: f64,
    dz: f64,
    qfac: f64,
) -> Affine4 {
    let (mut a, mut b, mut c, mut d) = (1.0 - (b * b + c * c + d * d), b, c, d);
    if a < 1.0e-7 {
        let norm = 1.0 / (b * b + c * c + d * d).sqrt();
        b *= norm;
        c *= norm;
        d *= norm;
        a = 0.0;
    } else {
        a = a.sqrt();
    }

    // non-positive spacings default to 1; qfac < 0 flips the k axis
    let xd = if dx > 0.0 { dx } else { 1.0 };
    let yd = if dy > 0.0 { dy } else { 1.0 };
    let zd = if dz > 0.0 { dz } else { 1.0 };
    let zd = if qfac < 0.0 { -zd } else { zd };

    #[rustfmt::skip]
    let m = Affine4::new(
        (a * a + b * b - c * c - d * d) * xd, 2.0 * (b * c - a * d) * yd,           2.0 * (b * d + a * c) * zd,           qx,
        2.0 * (b * c + a * d) * xd,           (a * a + c * c - b * b - d * d) * yd, 2.0 * (c * d - a * b) * zd,           qy,
        2.0 * (b * d - a * c) * xd,           2.0 * (c * d + a * b) * yd,           (a * a + d * d - c * c - b * b) * zd, qz,
        0.0,                                  0.0,                                  0.0,                                  1.0,
    );
    m
}

/// Invert a 4×4 affine. A singular matrix yields the identity.
pub fn affine_inverse(m: &Affine4) -> Affine4 {
    m.try_inverse().unwrap_or_else(Affine4::identity)
}

/// Derive the orientation of the three voxel axes from an affine: for every
/// column of the upper 3×3 block, the dominant row and its sign decide the
/// patient-space direction. An all-zero column maps to `Unknown`.
pub fn matrix_to_orientation(affine: &Affine4) -> [Orientation; 3] {
    let mut out = [Orientation::Unknown; 3];
    for (j, slot) in out.iter_mut().enumerate() {
        let col = [affine[(0, j)], affine[(1, j)], affine[(2, j)]];
        let mut i_max = 0;
        for i in 1..3 {
            if col[i].abs() > col[i_max].abs() {
                i_max = i;
            }
        }
        if col[i_max] == 0.0 {
            continue;
        }
        *slot = match (i_max, col[i_max] > 0.0) {
            (0, true) => Orientation::L2R,
            (0, false) => Orientation::R2L,
            (1, true) => Orientation::P2A,
            (1, false) => Orientation::A2P,
            (2, true) => Orientation::I2S,
            _ => Orientation::S2I,
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_quaternion() {
        let m = quaternion_to_affine(0.0, 0.0, 0.0, 5.0, -6.0, 7.0, 2.0, 3.0, 4.0, 1.0);
        let expected = {
            let mut e = diagonal_affine(2.0, 3.0, 4.0);
            e[(0, 3)] = 5.0;
            e[(1, 3)] = -6.0;
            e[(2, 3)] = 7.0;
            e
        };
        assert_abs_diff_eq!(m, expected, epsilon = 1e-12);
    }

    #[test]
    fn negative_qfac_flips_k() {
        let m = quaternion_to_affine(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 3.0, -1.0);
        assert_abs_diff_eq!(m[(2, 2)], -3.0, epsilon = 1e-12);
    }

    #[test]
    fn half_turn_quaternion() {
        // (b, c, d) = (0, 1, 0) is a 180 degree rotation about j
        let m = quaternion_to_affine(0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0);
        assert_abs_diff_eq!(m[(0, 0)], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m[(1, 1)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m[(2, 2)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_product_is_identity() {
        let m = quaternion_to_affine(0.1, 0.2, -0.3, 9.0, -8.0, 7.0, 0.9, 1.1, 2.5, -1.0);
        let inv = affine_inverse(&m);
        assert_abs_diff_eq!(inv * m, Affine4::identity(), epsilon = 1e-9);
    }

    #[test]
    fn singular_inverse_falls_back() {
        let m = Affine4::zeros();
        assert_eq!(affine_inverse(&m), Affine4::identity());
    }

    #[test]
    fn orientation_from_affine() {
        #[rustfmt::skip]
        let lr = Affine4::new(
            -2.0, 0.0, 0.0, 90.0,
            0.0,  2.0, 0.0, -126.0,
            0.0,  0.0, 2.0, -72.0,
            0.0,  0.0, 0.0, 1.0,
        );
        assert_eq!(
            matrix_to_orientation(&lr),
            [Orientation::R2L, Orientation::P2A, Orientation::I2S]
        );

        #[rustfmt::skip]
        let rl = Affine4::new(
            2.0, 0.0, 0.0, -90.0,
            0.0, 2.0, 0.0, -126.0,
            0.0, 0.0, 2.0, -72.0,
            0.0, 0.0, 0.0, 1.0,
        );
        assert_eq!(
            matrix_to_orientation(&rl),
            [Orientation::L2R, Orientation::P2A, Orientation::I2S]
        );

        assert_eq!(
            matrix_to_orientation(&Affine4::zeros()),
            [Orientation::Unknown; 3]
        );
    }
}
