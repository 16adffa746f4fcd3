use nalgebra::Matrix2;

use crate::Qbit;

/// Equality of single-qubit unitaries up to a global phase.
pub struct PhaseEquiv {
    epsilon: f64,
}

impl PhaseEquiv {
    pub fn new(e: f64) -> Self {
        PhaseEquiv { epsilon: e }
    }

    /// 1 - |tr(A†B)| / (|A| |B|), zero iff `b` is a complex multiple of `a`.
    pub fn distance(a: &Matrix2<Qbit>, b: &Matrix2<Qbit>) -> f64 {
        let norms = a.norm() * b.norm();
        if norms == 0.0 {
            return if a.norm() == b.norm() { 0.0 } else { 1.0 };
        }
        (1.0 - (a.adjoint() * b).trace().norm() / norms).max(0.0)
    }

    pub fn equals(&self, a: &Matrix2<Qbit>, b: &Matrix2<Qbit>) -> bool {
        Self::distance(a, b) < self.epsilon
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex;

    use crate::gates::{h_dense_matrix, rz_dense_matrix, z_dense_matrix};

    use super::*;

    #[test]
    fn test_phase_equiv_equals_identity() {
        let equiv = PhaseEquiv::new(1e-8);
        let id = Matrix2::identity();
        assert!(equiv.equals(&id, &id));
    }

    #[test]
    fn test_phase_equiv_not_equals_h_and_z() {
        let equiv = PhaseEquiv::new(1e-8);
        assert!(!equiv.equals(&h_dense_matrix(), &z_dense_matrix()));
    }

    #[test]
    fn test_phase_equiv_equals_with_small_difference() {
        let equiv = PhaseEquiv::new(1e-6);
        let h1 = h_dense_matrix();
        let mut h2 = h_dense_matrix();
        h2[(0, 0)].re += 1e-8;
        assert!(equiv.equals(&h1, &h2));
    }

    #[test]
    fn test_phase_equiv_not_equals_with_large_difference() {
        let equiv = PhaseEquiv::new(1e-8);
        let h1 = h_dense_matrix();
        let mut h2 = h_dense_matrix();
        h2[(0, 0)].re += 1e-2;
        assert!(!equiv.equals(&h1, &h2));
    }

    #[test]
    fn test_phase_equiv_ignores_global_phase() {
        let equiv = PhaseEquiv::new(1e-8);
        let z = z_dense_matrix();
        // RZ(π) = -iZ
        assert!(equiv.equals(&z, &rz_dense_matrix(std::f64::consts::PI)));
        assert!(equiv.equals(&z, &(z * Complex::from_polar(1.0, 0.4))));
    }
}
