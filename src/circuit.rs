use std::fmt::Display;

use anyhow::Result;
use nalgebra::{DMatrix, Matrix2};
use nalgebra_sparse::convert::serial::{convert_csr_dense, convert_dense_csr};
use nalgebra_sparse::{coo::CooMatrix, csr::CsrMatrix};
use num_complex::Complex;
use tracing::debug;

use crate::density::NoiseChannel;
use crate::gates::{
    h_matrix, phase_matrix, rx_matrix, ry_matrix, rz_matrix, s_matrix, t_matrix, x_matrix,
    y_matrix, z_matrix,
};
use crate::qstate::QState;
use crate::Qbit;

#[derive(Clone, Debug)]
pub struct Gate {
    kind: GateKind,
    index: GateIndex,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateIndex {
    /// The whole register. Single-qubit kinds are applied to every qubit.
    All,
    One(usize),
    Control { controls: Vec<usize>, target: usize },
}

#[derive(Clone, Debug)]
pub enum GateKind {
    Dense(DMatrix<Qbit>),
    Sparse(CsrMatrix<Qbit>),

    H,
    X,
    Y,
    Z,
    S,
    T,
    RX(f64),
    RY(f64),
    RZ(f64),
    Phase(f64),

    Noise(NoiseChannel),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterizedGate {
    RX,
    RY,
    RZ,
}

impl ParameterizedGate {
    fn kind(self, value: f64) -> GateKind {
        match self {
            ParameterizedGate::RX => GateKind::RX(value),
            ParameterizedGate::RY => GateKind::RY(value),
            ParameterizedGate::RZ => GateKind::RZ(value),
        }
    }
}

#[derive(Clone, Debug)]
struct Parameter {
    gate_index: usize,
    gate: ParameterizedGate,
    value: f64,
}

/// A step of a circuit expanded to the full register.
pub enum Operator {
    Unitary(CsrMatrix<Qbit>),
    /// Kraus operators of a noise channel.
    Channel(Vec<CsrMatrix<Qbit>>),
}

#[derive(Clone, Debug)]
pub struct Circuit {
    gates: Vec<Gate>,
    num_of_qbits: usize,

    parameters: Vec<Parameter>,
}

impl Circuit {
    pub fn new(num_of_qbits: usize) -> Self {
        Self {
            gates: Vec::new(),
            num_of_qbits,
            parameters: Vec::new(),
        }
    }

    pub fn num_of_qbits(&self) -> usize {
        self.num_of_qbits
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn has_noise(&self) -> bool {
        self.gates
            .iter()
            .any(|gate| matches!(gate.kind, GateKind::Noise(_)))
    }

    fn check_index(&self, index: &GateIndex) -> Result<()> {
        match index {
            GateIndex::All => Ok(()),
            GateIndex::One(index) => check_and_reverse_index(self.num_of_qbits, *index).map(|_| ()),
            GateIndex::Control { controls, target } => {
                check_and_reverse_index(self.num_of_qbits, *target)?;
                for (i, control) in controls.iter().enumerate() {
                    check_and_reverse_index(self.num_of_qbits, *control)?;
                    if control == target {
                        return Err(anyhow::anyhow!(
                            "Control and target qubits cannot be the same"
                        ));
                    }
                    if controls[..i].contains(control) {
                        return Err(anyhow::anyhow!("Control qubit {} is duplicated", control));
                    }
                }
                Ok(())
            }
        }
    }

    fn push(&mut self, kind: GateKind, index: GateIndex) -> Result<()> {
        self.check_index(&index)?;

        match (&kind, &index) {
            (GateKind::Noise(channel), GateIndex::One(_)) => channel.validate()?,
            (GateKind::Noise(_), _) => {
                return Err(anyhow::anyhow!(
                    "Noise channels can only act on a single qubit"
                ))
            }
            (GateKind::Dense(matrix), GateIndex::All) => {
                let size = 1 << self.num_of_qbits;
                if matrix.nrows() != size || matrix.ncols() != size {
                    return Err(anyhow::anyhow!(
                        "Register gate must be {}x{}, got {}x{}",
                        size,
                        size,
                        matrix.nrows(),
                        matrix.ncols()
                    ));
                }
            }
            (GateKind::Sparse(matrix), GateIndex::All) => {
                let size = 1 << self.num_of_qbits;
                if matrix.nrows() != size || matrix.ncols() != size {
                    return Err(anyhow::anyhow!("Register gate must be {}x{}", size, size));
                }
            }
            (GateKind::Dense(matrix), _) if matrix.nrows() != 2 || matrix.ncols() != 2 => {
                return Err(anyhow::anyhow!("Single-qubit gate must be 2x2"));
            }
            (GateKind::Sparse(matrix), _) if matrix.nrows() != 2 || matrix.ncols() != 2 => {
                return Err(anyhow::anyhow!("Single-qubit gate must be 2x2"));
            }
            _ => {}
        }

        self.gates.push(Gate { kind, index });
        Ok(())
    }

    pub fn add_gate(&mut self, kind: GateKind, index: usize) -> Result<()> {
        self.push(kind, GateIndex::One(index))
    }

    pub fn add_gate_at(&mut self, index: GateIndex, kind: GateKind) -> Result<()> {
        self.push(kind, index)
    }

    pub fn gate_at(mut self, index: usize, kind: GateKind) -> Result<Self> {
        self.add_gate(kind, index)?;
        Ok(self)
    }

    pub fn add_dense_gate(&mut self, gate: DMatrix<Qbit>, index: GateIndex) -> Result<()> {
        self.push(GateKind::Dense(gate), index)
    }

    pub fn add_noise_at(&mut self, index: usize, channel: NoiseChannel) -> Result<()> {
        self.push(GateKind::Noise(channel), GateIndex::One(index))
    }

    pub fn add_parametric_gate_at(
        &mut self,
        index: usize,
        gate: ParameterizedGate,
        value: f64,
    ) -> Result<()> {
        let gate_index = self.gates.len();
        self.push(gate.kind(value), GateIndex::One(index))?;
        self.parameters.push(Parameter {
            gate_index,
            gate,
            value,
        });

        Ok(())
    }

    pub fn parameters(&self) -> Vec<f64> {
        self.parameters.iter().map(|param| param.value).collect()
    }

    pub fn num_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn set_parameter(&mut self, param_index: usize, value: f64) -> Result<()> {
        let param = self
            .parameters
            .get_mut(param_index)
            .ok_or_else(|| anyhow::anyhow!("Parameter index out of bounds"))?;
        param.value = value;

        // Parameters always point at a gate pushed together with them
        self.gates[param.gate_index].kind = param.gate.kind(value);

        Ok(())
    }

    pub fn set_parameters(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.parameters.len() {
            return Err(anyhow::anyhow!(
                "Number of values does not match number of parameters"
            ));
        }

        for (i, &value) in values.iter().enumerate() {
            self.set_parameter(i, value)?;
        }

        Ok(())
    }

    #[allow(non_snake_case)]
    pub fn H(self, index: usize) -> Result<Self> {
        self.gate_at(index, GateKind::H)
    }

    #[allow(non_snake_case)]
    pub fn X(self, index: usize) -> Result<Self> {
        self.gate_at(index, GateKind::X)
    }

    pub fn add_control(&mut self, control: usize, target: usize, kind: GateKind) -> Result<()> {
        self.add_multi_control(&[control], target, kind)
    }

    pub fn add_multi_control(
        &mut self,
        controls: &[usize],
        target: usize,
        kind: GateKind,
    ) -> Result<()> {
        if controls.is_empty() {
            return self.add_gate(kind, target);
        }
        self.push(
            kind,
            GateIndex::Control {
                controls: controls.to_vec(),
                target,
            },
        )
    }

    pub fn control(mut self, control: usize, target: usize, kind: GateKind) -> Result<Self> {
        self.add_control(control, target, kind)?;
        Ok(self)
    }

    pub fn cnot(self, control: usize, target: usize) -> Result<Self> {
        self.control(control, target, GateKind::X)
    }

    pub fn toffoli(mut self, control1: usize, control2: usize, target: usize) -> Result<Self> {
        self.add_multi_control(&[control1, control2], target, GateKind::X)?;
        Ok(self)
    }

    pub fn swap(self, index1: usize, index2: usize) -> Result<Self> {
        if index1 == index2 {
            return Err(anyhow::anyhow!("Cannot swap a qubit with itself"));
        }

        self.cnot(index1, index2)?
            .cnot(index2, index1)?
            .cnot(index1, index2)
    }

    /// Expands every gate to an operator on the full register.
    pub fn operators(&self) -> Result<Vec<Operator>> {
        self.gates
            .iter()
            .map(|gate| self.operator_for(gate))
            .collect()
    }

    fn operator_for(&self, Gate { kind, index }: &Gate) -> Result<Operator> {
        let n = self.num_of_qbits;

        if let GateKind::Noise(channel) = kind {
            let GateIndex::One(target) = index else {
                return Err(anyhow::anyhow!(
                    "Noise channels can only act on a single qubit"
                ));
            };
            let kraus = channel
                .kraus_operators()
                .iter()
                .map(|k| embed_gate(n, *target, &convert_dense_csr(k)))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Operator::Channel(kraus));
        }

        let matrix = match (kind, index) {
            (GateKind::Dense(matrix), GateIndex::All) => convert_dense_csr(matrix),
            (GateKind::Sparse(matrix), GateIndex::All) => matrix.clone(),
            (kind, GateIndex::All) => {
                let gate = single_qubit_matrix(kind)?;
                let mut matrix = CsrMatrix::identity(1);
                for _ in 0..n {
                    matrix = kronecker_product(&matrix, &gate);
                }
                matrix
            }
            (kind, GateIndex::One(target)) => embed_gate(n, *target, &single_qubit_matrix(kind)?)?,
            (kind, GateIndex::Control { controls, target }) => {
                controlled_matrix(n, controls, *target, &single_qubit_matrix(kind)?)?
            }
        };

        Ok(Operator::Unitary(matrix))
    }

    pub fn apply(&self, state: &QState) -> Result<QState> {
        if state.num_of_qbits() != self.num_of_qbits {
            return Err(anyhow::anyhow!(
                "Circuit acts on {} qubits but the state has {}",
                self.num_of_qbits,
                state.num_of_qbits()
            ));
        }

        let mut result = state.state.clone();
        for operator in self.operators()? {
            match operator {
                Operator::Unitary(matrix) => {
                    result = &matrix * &result;
                }
                Operator::Channel(_) => {
                    return Err(anyhow::anyhow!(
                        "Circuit contains a noise channel; evolve a density matrix instead"
                    ));
                }
            }
        }
        debug!(
            num_of_qbits = self.num_of_qbits,
            gates = self.gates.len(),
            "applied circuit to state vector"
        );

        Ok(QState { state: result })
    }
}

impl Display for Circuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for Gate { kind, index } in &self.gates {
            let name = match kind {
                GateKind::Dense(_) => "U".to_string(),
                GateKind::Sparse(_) => "U".to_string(),
                GateKind::H => "H".to_string(),
                GateKind::X => "X".to_string(),
                GateKind::Y => "Y".to_string(),
                GateKind::Z => "Z".to_string(),
                GateKind::S => "S".to_string(),
                GateKind::T => "T".to_string(),
                GateKind::RX(angle) => format!("RX({:.4})", angle),
                GateKind::RY(angle) => format!("RY({:.4})", angle),
                GateKind::RZ(angle) => format!("RZ({:.4})", angle),
                GateKind::Phase(angle) => format!("P({:.4})", angle),
                GateKind::Noise(channel) => channel.to_string(),
            };
            match index {
                GateIndex::All => writeln!(f, "{} all", name)?,
                GateIndex::One(target) => writeln!(f, "{} q{}", name, target)?,
                GateIndex::Control { controls, target } => {
                    let controls = controls
                        .iter()
                        .map(|c| format!("q{}", c))
                        .collect::<Vec<_>>()
                        .join(",");
                    writeln!(f, "C[{}]-{} q{}", controls, name, target)?
                }
            }
        }
        Ok(())
    }
}

fn single_qubit_matrix(kind: &GateKind) -> Result<CsrMatrix<Qbit>> {
    let matrix = match kind {
        GateKind::Dense(dense_gate) => convert_dense_csr(dense_gate),
        GateKind::Sparse(sparse_gate) => sparse_gate.clone(),
        GateKind::H => h_matrix(),
        GateKind::X => x_matrix(),
        GateKind::Y => y_matrix(),
        GateKind::Z => z_matrix(),
        GateKind::S => s_matrix(),
        GateKind::T => t_matrix(),
        GateKind::RX(angle) => rx_matrix(*angle),
        GateKind::RY(angle) => ry_matrix(*angle),
        GateKind::RZ(angle) => rz_matrix(*angle),
        GateKind::Phase(angle) => phase_matrix(*angle),
        GateKind::Noise(channel) => {
            return Err(anyhow::anyhow!("{} is not a unitary gate", channel));
        }
    };
    Ok(matrix)
}

/// Position of `index` in the Kronecker product, where qubit 0 is the rightmost factor.
pub fn check_and_reverse_index(num_of_qbits: usize, index: usize) -> Result<usize> {
    if index >= num_of_qbits {
        return Err(anyhow::anyhow!(
            "Index out of bounds for the number of qubits {}",
            num_of_qbits
        ));
    }
    Ok(num_of_qbits - 1 - index)
}

/// Lifts a single-qubit gate acting on `index` to the whole register.
pub fn embed_gate(
    num_of_qbits: usize,
    index: usize,
    gate: &CsrMatrix<Qbit>,
) -> Result<CsrMatrix<Qbit>> {
    let index = check_and_reverse_index(num_of_qbits, index)?;

    let mut matrix = CsrMatrix::identity(1);
    for i in 0..num_of_qbits {
        if i == index {
            matrix = kronecker_product(&matrix, gate);
        } else {
            matrix = kronecker_product(&matrix, &CsrMatrix::identity(2));
        }
    }

    Ok(matrix)
}

/// `I + |1..1><1..1|_controls ⊗ (U - I)_target`
pub fn controlled_matrix(
    num_of_qbits: usize,
    controls: &[usize],
    target: usize,
    gate: &CsrMatrix<Qbit>,
) -> Result<CsrMatrix<Qbit>> {
    let target = check_and_reverse_index(num_of_qbits, target)?;
    let controls = controls
        .iter()
        .map(|&c| check_and_reverse_index(num_of_qbits, c))
        .collect::<Result<Vec<_>>>()?;

    if controls.contains(&target) {
        return Err(anyhow::anyhow!(
            "Control and target qubits cannot be the same"
        ));
    }

    // |1><1|
    let mut one_one = CooMatrix::new(2, 2);
    one_one.push(1, 1, Complex::new(1.0, 0.0));
    let one_one = CsrMatrix::from(&one_one);

    let shifted: Matrix2<Qbit> = {
        let dense = convert_csr_dense(gate);
        Matrix2::from_fn(|r, c| dense[(r, c)]) - Matrix2::identity()
    };
    let shifted = convert_dense_csr(&shifted);

    let id = CsrMatrix::identity(2);

    let mut one_matrix = CsrMatrix::identity(1);
    for i in 0..num_of_qbits {
        if controls.contains(&i) {
            one_matrix = kronecker_product(&one_matrix, &one_one);
        } else if i == target {
            one_matrix = kronecker_product(&one_matrix, &shifted);
        } else {
            one_matrix = kronecker_product(&one_matrix, &id);
        }
    }

    Ok(CsrMatrix::identity(1 << num_of_qbits) + one_matrix)
}

pub fn kronecker_product(x: &CsrMatrix<Qbit>, y: &CsrMatrix<Qbit>) -> CsrMatrix<Qbit> {
    let mut result = CooMatrix::new(x.nrows() * y.nrows(), x.ncols() * y.ncols());

    for (rx, cx, value_x) in x.triplet_iter() {
        for (ry, cy, value_y) in y.triplet_iter() {
            let new_row = rx * y.nrows() + ry;
            let new_col = cx * y.ncols() + cy;
            let new_value = value_x * value_y;
            result.push(new_row, new_col, new_value);
        }
    }

    CsrMatrix::from(&result)
}
