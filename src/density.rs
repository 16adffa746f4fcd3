use std::fmt::Display;

use anyhow::Result;
use nalgebra::{DMatrix, Matrix2};
use nalgebra_sparse::convert::serial::convert_csr_dense;
use num_complex::Complex;
use tracing::debug;

use crate::circuit::{Circuit, Operator};
use crate::gates::{x_dense_matrix, y_dense_matrix, z_dense_matrix};
use crate::qstate::QState;
use crate::Qbit;

/// Single-qubit noise channels, described by their Kraus operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoiseChannel {
    /// X with probability `p`
    BitFlip(f64),
    /// Z with probability `p`
    PhaseFlip(f64),
    /// X, Y or Z, each with probability `p / 3`
    Depolarizing(f64),
    /// Decay |1> -> |0> with probability `gamma`
    AmplitudeDamping(f64),
}

impl NoiseChannel {
    fn probability(&self) -> f64 {
        match *self {
            NoiseChannel::BitFlip(p)
            | NoiseChannel::PhaseFlip(p)
            | NoiseChannel::Depolarizing(p)
            | NoiseChannel::AmplitudeDamping(p) => p,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.probability();
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(anyhow::anyhow!(
                "{} has a probability outside of [0, 1]",
                self
            ));
        }
        Ok(())
    }

    pub fn kraus_operators(&self) -> Vec<Matrix2<Qbit>> {
        let scaled = |m: Matrix2<Qbit>, w: f64| m * Complex::new(w.sqrt(), 0.0);

        match *self {
            NoiseChannel::BitFlip(p) => vec![
                scaled(Matrix2::identity(), 1.0 - p),
                scaled(x_dense_matrix(), p),
            ],
            NoiseChannel::PhaseFlip(p) => vec![
                scaled(Matrix2::identity(), 1.0 - p),
                scaled(z_dense_matrix(), p),
            ],
            NoiseChannel::Depolarizing(p) => vec![
                scaled(Matrix2::identity(), 1.0 - p),
                scaled(x_dense_matrix(), p / 3.0),
                scaled(y_dense_matrix(), p / 3.0),
                scaled(z_dense_matrix(), p / 3.0),
            ],
            NoiseChannel::AmplitudeDamping(gamma) => vec![
                Matrix2::new(
                    Complex::ONE,
                    Complex::ZERO,
                    Complex::ZERO,
                    Complex::new((1.0 - gamma).sqrt(), 0.0),
                ),
                Matrix2::new(
                    Complex::ZERO,
                    Complex::new(gamma.sqrt(), 0.0),
                    Complex::ZERO,
                    Complex::ZERO,
                ),
            ],
        }
    }
}

impl Display for NoiseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseChannel::BitFlip(p) => write!(f, "BitFlip({})", p),
            NoiseChannel::PhaseFlip(p) => write!(f, "PhaseFlip({})", p),
            NoiseChannel::Depolarizing(p) => write!(f, "Depolarizing({})", p),
            NoiseChannel::AmplitudeDamping(gamma) => write!(f, "AmplitudeDamping({})", gamma),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DensityMatrix {
    rho: DMatrix<Qbit>,
}

impl DensityMatrix {
    pub fn from_pure(qstate: &QState) -> Self {
        let psi = qstate.amplitudes();
        Self {
            rho: psi * psi.adjoint(),
        }
    }

    pub fn maximally_mixed(num_of_qbits: usize) -> Self {
        let size = 1 << num_of_qbits;
        Self {
            rho: DMatrix::identity(size, size) * Complex::new(1.0 / size as f64, 0.0),
        }
    }

    pub fn num_of_qbits(&self) -> usize {
        self.rho.nrows().ilog2() as usize
    }

    pub fn matrix(&self) -> &DMatrix<Qbit> {
        &self.rho
    }

    pub fn trace(&self) -> f64 {
        self.rho.trace().re
    }

    /// tr(ρ²), 1 for pure states
    pub fn purity(&self) -> f64 {
        (&self.rho * &self.rho).trace().re
    }

    pub fn evolve(&self, circuit: &Circuit) -> Result<DensityMatrix> {
        if circuit.num_of_qbits() != self.num_of_qbits() {
            return Err(anyhow::anyhow!(
                "Circuit acts on {} qubits but the density matrix has {}",
                circuit.num_of_qbits(),
                self.num_of_qbits()
            ));
        }

        let mut rho = self.rho.clone();
        for operator in circuit.operators()? {
            rho = match operator {
                Operator::Unitary(u) => {
                    let u_rho: DMatrix<Qbit> = &u * &rho;
                    let u = convert_csr_dense(&u);
                    u_rho * u.adjoint()
                }
                Operator::Channel(kraus) => {
                    let size = rho.nrows();
                    kraus.iter().fold(DMatrix::zeros(size, size), |acc, k| {
                        let k_rho: DMatrix<Qbit> = k * &rho;
                        let k = convert_csr_dense(k);
                        acc + k_rho * k.adjoint()
                    })
                }
            };
        }
        debug!(
            num_of_qbits = self.num_of_qbits(),
            gates = circuit.len(),
            "evolved density matrix"
        );

        Ok(DensityMatrix { rho })
    }

    pub fn apply_channel(&self, channel: NoiseChannel, index: usize) -> Result<DensityMatrix> {
        let mut circuit = Circuit::new(self.num_of_qbits());
        circuit.add_noise_at(index, channel)?;
        self.evolve(&circuit)
    }
}

/// ⟨ψ|σ|ψ⟩
pub fn fidelity_with_pure(psi: &QState, sigma: &DensityMatrix) -> Result<f64> {
    let psi = psi.amplitudes();
    if psi.len() != sigma.rho.nrows() {
        return Err(anyhow::anyhow!("State and density matrix sizes differ"));
    }
    Ok(psi.dotc(&(&sigma.rho * psi)).re)
}

/// Uhlmann fidelity (tr √(√ρ σ √ρ))²
pub fn fidelity(rho: &DensityMatrix, sigma: &DensityMatrix) -> Result<f64> {
    if rho.rho.shape() != sigma.rho.shape() {
        return Err(anyhow::anyhow!(
            "Cannot compare density matrices of shapes {:?} and {:?}",
            rho.rho.shape(),
            sigma.rho.shape()
        ));
    }

    let sqrt_rho = hermitian_sqrt(&rho.rho);
    let inner = &sqrt_rho * &sigma.rho * &sqrt_rho;
    let eigen = hermitian(inner).symmetric_eigen();
    let root_trace: f64 = eigen.eigenvalues.iter().map(|l| l.max(0.0).sqrt()).sum();

    Ok(root_trace * root_trace)
}

fn hermitian(m: DMatrix<Qbit>) -> DMatrix<Qbit> {
    (&m + m.adjoint()) * Complex::new(0.5, 0.0)
}

fn hermitian_sqrt(m: &DMatrix<Qbit>) -> DMatrix<Qbit> {
    let eigen = hermitian(m.clone()).symmetric_eigen();
    let roots = eigen
        .eigenvalues
        .map(|l| Complex::new(l.max(0.0).sqrt(), 0.0));
    &eigen.eigenvectors * DMatrix::from_diagonal(&roots) * eigen.eigenvectors.adjoint()
}
