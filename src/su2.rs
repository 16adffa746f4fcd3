use std::f64::consts::{FRAC_PI_2, PI};

use anyhow::Result;
use nalgebra::{Complex, Matrix2};

use crate::{
    gates::{ry_dense_matrix, rz_dense_matrix, x_dense_matrix, y_dense_matrix, z_dense_matrix},
    Qbit,
};

const EPS: f64 = 1e-10;

/// `U = e^{i·global_phase} · RZ(omega) · RY(theta) · RZ(phi)`, every angle but
/// `theta` in (-π, π].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZyzAngles {
    pub phi: f64,
    pub theta: f64,
    pub omega: f64,
    pub global_phase: f64,
}

impl ZyzAngles {
    pub fn to_matrix(&self) -> Matrix2<Qbit> {
        rz_dense_matrix(self.omega)
            * ry_dense_matrix(self.theta)
            * rz_dense_matrix(self.phi)
            * Complex::from_polar(1.0, self.global_phase)
    }

    /// `[phi, theta, omega, global_phase]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.phi, self.theta, self.omega, self.global_phase]
    }
}

/// `U = e^{i·global_phase} · exp(-i·angle/2 · n·σ)` with a unit `axis` n.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisAngle {
    pub axis: (f64, f64, f64),
    pub angle: f64,
    pub global_phase: f64,
}

impl AxisAngle {
    pub fn to_matrix(&self) -> Matrix2<Qbit> {
        rotation_exp(self.axis, self.angle) * Complex::from_polar(1.0, self.global_phase)
    }
}

pub fn check_unitary(u: &Matrix2<Qbit>) -> Result<()> {
    let deviation = (u.adjoint() * u - Matrix2::identity()).norm();
    if !deviation.is_finite() || deviation > 1e-6 {
        return Err(anyhow::anyhow!(
            "Matrix is not unitary (|U†U - I| = {:e})",
            deviation
        ));
    }
    Ok(())
}

/// Wraps into (-π, π], snapping values next to -π onto π.
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI + EPS {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Splits `U` into `e^{iα}` times a special unitary; α is half the argument of det U,
/// taken in (-π/2, π/2].
fn split_phase(u: &Matrix2<Qbit>) -> (f64, Matrix2<Qbit>) {
    let mut phase = u.determinant().arg() / 2.0;
    if phase <= -FRAC_PI_2 + EPS {
        phase += PI;
    }
    (phase, u * Complex::from_polar(1.0, -phase))
}

pub fn zyz_decompose(u: &Matrix2<Qbit>) -> Result<ZyzAngles> {
    check_unitary(u)?;

    let (global_phase, v) = split_phase(u);

    // v = [[a, -b*], [b, a*]]
    let a = v[(0, 0)];
    let b = v[(1, 0)];
    let theta = 2.0 * b.norm().atan2(a.norm());

    let (phi, omega) = if b.norm() < EPS {
        (-2.0 * a.arg(), 0.0)
    } else if a.norm() < EPS {
        (-2.0 * b.arg(), 0.0)
    } else {
        (-a.arg() - b.arg(), b.arg() - a.arg())
    };

    let mut angles = ZyzAngles {
        phi: wrap_angle(phi),
        theta,
        omega: wrap_angle(omega),
        global_phase,
    };

    // Shifting phi or omega by 2π negates the rotation part
    let rebuilt = angles.to_matrix();
    if (rebuilt + u).norm() < (rebuilt - u).norm() {
        angles.global_phase = wrap_angle(global_phase + PI);
    }

    Ok(angles)
}

pub fn axis_angle(u: &Matrix2<Qbit>) -> Result<AxisAngle> {
    check_unitary(u)?;

    let (global_phase, v) = split_phase(u);

    let cos = ((v[(0, 0)] + v[(1, 1)]).re / 2.0).clamp(-1.0, 1.0);
    let sx = -(v[(0, 1)] + v[(1, 0)]).im / 2.0;
    let sy = (v[(1, 0)] - v[(0, 1)]).re / 2.0;
    let sz = (v[(1, 1)] - v[(0, 0)]).im / 2.0;
    let sin = (sx * sx + sy * sy + sz * sz).sqrt();

    if sin < EPS {
        return Ok(AxisAngle {
            axis: (0.0, 0.0, 1.0),
            angle: 2.0 * cos.acos(),
            global_phase,
        });
    }

    Ok(AxisAngle {
        axis: (sx / sin, sy / sin, sz / sin),
        angle: 2.0 * sin.atan2(cos),
        global_phase,
    })
}

/// exp(-i·angle/2 · n·σ), with `axis` normalised first.
pub fn rotation_exp(axis: (f64, f64, f64), angle: f64) -> Matrix2<Qbit> {
    let (a, b, c) = axis;
    let norm = (a * a + b * b + c * c).sqrt();

    if norm < EPS {
        return Matrix2::identity();
    }

    let minus_i_sin = Complex::new(0.0, -(angle / 2.0).sin());
    let id = Matrix2::identity() * Complex::new((angle / 2.0).cos(), 0.0);
    let x = x_dense_matrix() * (minus_i_sin * a / norm);
    let y = y_dense_matrix() * (minus_i_sin * b / norm);
    let z = z_dense_matrix() * (minus_i_sin * c / norm);
    id + x + y + z
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use super::*;
    use crate::{
        assert_approx_complex_eq, assert_approx_eq,
        gates::{h_dense_matrix, rx_dense_matrix},
    };

    fn assert_same_matrix(expected: &Matrix2<Qbit>, actual: &Matrix2<Qbit>) {
        for r in 0..2 {
            for c in 0..2 {
                let e = expected[(r, c)];
                assert!(
                    (e - actual[(r, c)]).norm() < 1e-9,
                    "Expected {}, but got {}",
                    expected,
                    actual
                );
            }
        }
    }

    #[test]
    fn test_zyz_of_hadamard() -> Result<()> {
        let angles = zyz_decompose(&h_dense_matrix())?;

        assert_approx_eq!(PI, angles.phi, 1e-9);
        assert_approx_eq!(FRAC_PI_2, angles.theta, 1e-9);
        assert_approx_eq!(0.0, angles.omega, 1e-9);
        assert_approx_eq!(FRAC_PI_2, angles.global_phase, 1e-9);
        assert_same_matrix(&h_dense_matrix(), &angles.to_matrix());

        Ok(())
    }

    #[test]
    fn test_zyz_of_diagonal_gate() -> Result<()> {
        let t = Matrix2::new(
            Complex::ONE,
            Complex::ZERO,
            Complex::ZERO,
            Complex::from_polar(1.0, FRAC_PI_4),
        );
        let angles = zyz_decompose(&t)?;

        assert_approx_eq!(FRAC_PI_4, angles.phi, 1e-9);
        assert_approx_eq!(0.0, angles.theta, 1e-9);
        assert_approx_eq!(0.0, angles.omega, 1e-9);
        assert_approx_eq!(FRAC_PI_4 / 2.0, angles.global_phase, 1e-9);
        assert_same_matrix(&t, &angles.to_matrix());

        Ok(())
    }

    #[test]
    fn test_zyz_of_anti_diagonal_gate() -> Result<()> {
        let y = y_dense_matrix();
        let angles = zyz_decompose(&y)?;

        assert_approx_eq!(PI, angles.theta, 1e-9);
        assert_same_matrix(&y, &angles.to_matrix());

        Ok(())
    }

    #[test]
    fn test_zyz_recovers_generic_angles() -> Result<()> {
        let expected = ZyzAngles {
            phi: -0.7,
            theta: 1.1,
            omega: 0.5,
            global_phase: 0.3,
        };
        let angles = zyz_decompose(&expected.to_matrix())?;

        for (e, a) in expected.to_array().iter().zip(angles.to_array()) {
            assert_approx_eq!(*e, a, 1e-9);
        }

        Ok(())
    }

    #[test]
    fn test_zyz_of_minus_identity() -> Result<()> {
        let minus_id = -Matrix2::<Qbit>::identity();
        let angles = zyz_decompose(&minus_id)?;

        assert_approx_eq!(0.0, angles.theta, 1e-9);
        assert_approx_eq!(PI, angles.global_phase, 1e-9);
        assert_same_matrix(&minus_id, &angles.to_matrix());

        Ok(())
    }

    #[test]
    fn test_zyz_of_minus_hadamard() -> Result<()> {
        let minus_h = -h_dense_matrix();
        let angles = zyz_decompose(&minus_h)?;

        assert_approx_eq!(PI, angles.phi, 1e-9);
        assert_approx_eq!(FRAC_PI_2, angles.theta, 1e-9);
        assert_approx_eq!(-FRAC_PI_2, angles.global_phase, 1e-9);
        assert_same_matrix(&minus_h, &angles.to_matrix());

        Ok(())
    }

    #[test]
    fn test_zyz_when_phases_wrap() -> Result<()> {
        // phi comes out as 4 before wrapping
        let a = Complex::from_polar(0.5f64.cos(), -2.0);
        let b = Complex::from_polar(0.5f64.sin(), -2.0);
        let u = Matrix2::new(a, -b.conj(), b, a.conj());

        let angles = zyz_decompose(&u)?;
        assert_approx_eq!(1.0, angles.theta, 1e-9);
        assert_approx_eq!(4.0 - 2.0 * PI, angles.phi, 1e-9);
        assert_approx_eq!(PI, angles.global_phase, 1e-9);
        assert_same_matrix(&u, &angles.to_matrix());

        Ok(())
    }

    #[test]
    fn test_zyz_rebuilds_sampled_unitaries() -> Result<()> {
        for i in 0..24 {
            let t = i as f64;
            let expected = ZyzAngles {
                phi: 0.9 * t - 10.0,
                theta: (0.37 * t) % PI,
                omega: 7.0 - 0.6 * t,
                global_phase: 1.3 * t,
            }
            .to_matrix();

            let angles = zyz_decompose(&expected)?;
            assert!(angles.global_phase > -PI && angles.global_phase <= PI);
            assert_same_matrix(&expected, &angles.to_matrix());
        }

        Ok(())
    }

    #[test]
    fn test_non_unitary_is_rejected() {
        let m = Matrix2::new(Complex::ONE, Complex::ONE, Complex::ZERO, Complex::ONE);
        assert!(zyz_decompose(&m).is_err());
        assert!(axis_angle(&m).is_err());
    }

    #[test]
    fn test_axis_angle_of_rotations() -> Result<()> {
        let rx = axis_angle(&rx_dense_matrix(0.8))?;
        assert_approx_eq!(0.8, rx.angle, 1e-9);
        assert_approx_eq!(1.0, rx.axis.0, 1e-9);
        assert_approx_eq!(0.0, rx.global_phase, 1e-9);

        let h = axis_angle(&h_dense_matrix())?;
        assert_approx_eq!(PI, h.angle, 1e-9);
        assert_approx_eq!(1.0 / 2f64.sqrt(), h.axis.0, 1e-9);
        assert_approx_eq!(0.0, h.axis.1, 1e-9);
        assert_approx_eq!(1.0 / 2f64.sqrt(), h.axis.2, 1e-9);
        assert_same_matrix(&h_dense_matrix(), &h.to_matrix());

        Ok(())
    }

    #[test]
    fn test_rotation_exp_matches_pauli_rotations() {
        let ry = rotation_exp((0.0, 2.0, 0.0), 1.3);
        assert_same_matrix(&ry_dense_matrix(1.3), &ry);

        let id = rotation_exp((0.0, 0.0, 0.0), 1.3);
        assert_approx_complex_eq!(1.0, 0.0, id[(0, 0)]);
        assert_approx_complex_eq!(0.0, 0.0, id[(0, 1)]);
    }

    #[test]
    fn test_wrap_angle() {
        assert_approx_eq!(PI, wrap_angle(-PI));
        assert_approx_eq!(PI, wrap_angle(PI));
        assert_approx_eq!(-0.5, wrap_angle(2.0 * PI - 0.5), 1e-12);
    }
}
