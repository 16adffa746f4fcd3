use std::iter;

use crate::{
    circuit::kronecker_product,
    density::DensityMatrix,
    gates::{x_matrix, y_matrix, z_matrix},
    qstate::QState,
};
use anyhow::Result;
use nalgebra_sparse::CsrMatrix;

use crate::Qbit;

#[derive(Clone, Debug, Default)]
pub struct Observable {
    operators: Vec<PauliOperator>,
}

impl Observable {
    pub fn new() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    pub fn add_pauli_operator(&mut self, coefficient: f64, ops: &[(Pauli, usize)]) {
        let operator = PauliOperator {
            coefficient,
            ops: ops
                .iter()
                .map(|&(kind, index)| PauliMatrix { index, kind })
                .collect(),
        };
        self.operators.push(operator);
    }

    /// Sum of `Z_i` over the given qubits.
    pub fn z_sum(qubits: &[usize]) -> Self {
        let mut observable = Self::new();
        for &qubit in qubits {
            observable.add_pauli_operator(1.0, &[(Pauli::Z, qubit)]);
        }
        observable
    }

    /// Full-register matrix of the observable.
    pub fn matrix(&self, num_of_qbits: usize) -> Result<CsrMatrix<Qbit>> {
        let size = 1 << num_of_qbits;
        let mut matrix = CsrMatrix::zeros(size, size);

        for operator in &self.operators {
            let mut kinds = iter::repeat(Pauli::I)
                .take(num_of_qbits)
                .collect::<Vec<_>>();
            for op in &operator.ops {
                let kind = kinds.get_mut(op.index).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Pauli operator on qubit {} for a {}-qubit register",
                        op.index,
                        num_of_qbits
                    )
                })?;
                *kind = op.kind;
            }

            let mut op = CsrMatrix::identity(1);
            for kind in kinds.iter().rev() {
                let factor = match kind {
                    Pauli::I => CsrMatrix::identity(2),
                    Pauli::X => x_matrix(),
                    Pauli::Y => y_matrix(),
                    Pauli::Z => z_matrix(),
                };
                op = kronecker_product(&op, &factor);
            }

            matrix = matrix + op * Qbit::new(operator.coefficient, 0.0);
        }

        Ok(matrix)
    }

    /// <ψ|O|ψ>
    pub fn expectation_value(&self, qstate: &QState) -> Result<f64> {
        let op = self.matrix(qstate.num_of_qbits())?;
        let state = qstate.amplitudes();
        Ok(state.dotc(&(&op * state)).re)
    }

    /// tr(ρO)
    pub fn expectation_value_mixed(&self, rho: &DensityMatrix) -> Result<f64> {
        let op = self.matrix(rho.num_of_qbits())?;
        Ok((&op * rho.matrix()).trace().re)
    }
}

#[derive(Clone, Debug)]
struct PauliOperator {
    coefficient: f64,
    ops: Vec<PauliMatrix>,
}

#[derive(Clone, Debug)]
pub struct PauliMatrix {
    index: usize,
    kind: Pauli,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}
