use nalgebra::Matrix2;
use nalgebra_sparse::convert::serial::convert_dense_coo;
use nalgebra_sparse::{coo::CooMatrix, csr::CsrMatrix};
use num_complex::Complex;

use crate::Qbit;

fn from_dense(matrix: &Matrix2<Qbit>) -> CsrMatrix<Qbit> {
    CsrMatrix::from(&convert_dense_coo(matrix))
}

pub fn h_dense_matrix() -> Matrix2<Qbit> {
    let root2 = 2.0_f64.sqrt();
    let one = Complex::new(1.0, 0.0);
    Matrix2::from_row_slice(&[one / root2, one / root2, one / root2, -one / root2])
}

pub fn x_dense_matrix() -> Matrix2<Qbit> {
    Matrix2::from_row_slice(&[Complex::ZERO, Complex::ONE, Complex::ONE, Complex::ZERO])
}

pub fn y_dense_matrix() -> Matrix2<Qbit> {
    Matrix2::from_row_slice(&[Complex::ZERO, -Complex::I, Complex::I, Complex::ZERO])
}

pub fn z_dense_matrix() -> Matrix2<Qbit> {
    Matrix2::from_row_slice(&[Complex::ONE, Complex::ZERO, Complex::ZERO, -Complex::ONE])
}

pub fn rx_dense_matrix(angle: f64) -> Matrix2<Qbit> {
    let c = Complex::new((angle / 2.0).cos(), 0.0);
    let s = Complex::new(0.0, -(angle / 2.0).sin());
    Matrix2::from_row_slice(&[c, s, s, c])
}

pub fn ry_dense_matrix(angle: f64) -> Matrix2<Qbit> {
    let c = Complex::new((angle / 2.0).cos(), 0.0);
    let s = Complex::new((angle / 2.0).sin(), 0.0);
    Matrix2::from_row_slice(&[c, -s, s, c])
}

pub fn rz_dense_matrix(angle: f64) -> Matrix2<Qbit> {
    Matrix2::from_row_slice(&[
        Complex::from_polar(1.0, -angle / 2.0),
        Complex::ZERO,
        Complex::ZERO,
        Complex::from_polar(1.0, angle / 2.0),
    ])
}

pub fn h_matrix() -> CsrMatrix<Qbit> {
    from_dense(&h_dense_matrix())
}

pub fn x_matrix() -> CsrMatrix<Qbit> {
    let mut x_coo = CooMatrix::new(2, 2);
    x_coo.push(0, 1, Complex::new(1.0, 0.0));
    x_coo.push(1, 0, Complex::new(1.0, 0.0));
    CsrMatrix::from(&x_coo)
}

pub fn y_matrix() -> CsrMatrix<Qbit> {
    let mut y_coo = CooMatrix::new(2, 2);
    y_coo.push(0, 1, Complex::new(0.0, -1.0));
    y_coo.push(1, 0, Complex::new(0.0, 1.0));
    CsrMatrix::from(&y_coo)
}

pub fn z_matrix() -> CsrMatrix<Qbit> {
    let mut z_coo = CooMatrix::new(2, 2);
    z_coo.push(0, 0, Complex::new(1.0, 0.0));
    z_coo.push(1, 1, Complex::new(-1.0, 0.0));
    CsrMatrix::from(&z_coo)
}

pub fn s_matrix() -> CsrMatrix<Qbit> {
    phase_matrix(std::f64::consts::FRAC_PI_2)
}

pub fn t_matrix() -> CsrMatrix<Qbit> {
    phase_matrix(std::f64::consts::FRAC_PI_4)
}

/// diag(1, e^{iφ})
pub fn phase_matrix(angle: f64) -> CsrMatrix<Qbit> {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(0, 0, Complex::new(1.0, 0.0));
    coo.push(1, 1, Complex::from_polar(1.0, angle));
    CsrMatrix::from(&coo)
}

pub fn rx_matrix(angle: f64) -> CsrMatrix<Qbit> {
    from_dense(&rx_dense_matrix(angle))
}

pub fn ry_matrix(angle: f64) -> CsrMatrix<Qbit> {
    from_dense(&ry_dense_matrix(angle))
}

pub fn rz_matrix(angle: f64) -> CsrMatrix<Qbit> {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(0, 0, Complex::from_polar(1.0, -angle / 2.0));
    coo.push(1, 1, Complex::from_polar(1.0, angle / 2.0));
    CsrMatrix::from(&coo)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use nalgebra_sparse::convert::serial::convert_csr_dense;

    use super::*;
    use crate::assert_approx_complex_eq;

    #[test]
    fn test_rx_pi_is_x_up_to_phase() {
        let rx = convert_csr_dense(&rx_matrix(PI));
        assert_approx_complex_eq!(0.0, 0.0, rx[(0, 0)]);
        assert_approx_complex_eq!(0.0, -1.0, rx[(0, 1)]);
        assert_approx_complex_eq!(0.0, -1.0, rx[(1, 0)]);
        assert_approx_complex_eq!(0.0, 0.0, rx[(1, 1)]);
    }

    #[test]
    fn test_t_squared_is_s() {
        let t = convert_csr_dense(&t_matrix());
        let s = convert_csr_dense(&s_matrix());
        let tt = &t * &t;
        for (a, b) in tt.iter().zip(s.iter()) {
            assert_approx_complex_eq!(b.re, b.im, *a);
        }
    }

    #[test]
    fn test_sparse_and_dense_rotations_agree() {
        let angle = 0.731;
        let sparse = convert_csr_dense(&rz_matrix(angle));
        let dense = rz_dense_matrix(angle);
        for r in 0..2 {
            for c in 0..2 {
                assert_approx_complex_eq!(dense[(r, c)].re, dense[(r, c)].im, sparse[(r, c)]);
            }
        }
    }
}
