use anyhow::Result;
use tracing::debug;

use crate::circuit::{Circuit, GateKind};
use crate::qstate::QState;

const DATA_QUBIT: usize = 0;

/// Appends a RY(θ) on `target` controlled by all of `controls`, expressed with
/// controlled rotations of halved angles, CNOTs and Toffolis only.
pub fn append_multi_controlled_ry(
    circuit: &mut Circuit,
    controls: &[usize],
    target: usize,
    theta: f64,
) -> Result<()> {
    match controls {
        [] => circuit.add_gate(GateKind::RY(theta), target),
        [control] => circuit.add_control(*control, target, GateKind::RY(theta)),
        [rest @ .., last] => {
            circuit.add_control(*last, target, GateKind::RY(theta / 2.0))?;
            append_multi_controlled_x(circuit, rest, *last)?;
            circuit.add_control(*last, target, GateKind::RY(-theta / 2.0))?;
            append_multi_controlled_x(circuit, rest, *last)?;
            append_multi_controlled_ry(circuit, rest, target, theta / 2.0)
        }
    }
}

fn append_multi_controlled_x(circuit: &mut Circuit, controls: &[usize], target: usize) -> Result<()> {
    match controls {
        [control] => circuit.add_control(*control, target, GateKind::X),
        // Toffoli for two controls, a plain multi-controlled X beyond that
        _ => circuit.add_multi_control(controls, target, GateKind::X),
    }
}

fn address_bits(num_of_angles: usize) -> Result<usize> {
    if num_of_angles < 2 || !num_of_angles.is_power_of_two() {
        return Err(anyhow::anyhow!(
            "Number of angles must be a power of 2 and at least 2, got {}",
            num_of_angles
        ));
    }
    Ok(num_of_angles.ilog2() as usize)
}

/// Puts the address qubits `1..=m` in uniform superposition and rotates the data
/// qubit 0 by `thetas[a]` for each address `a`. Qubit `k + 1` holds bit `k` of
/// the address.
pub fn addressed_rotations(thetas: &[f64]) -> Result<Circuit> {
    let m = address_bits(thetas.len())?;
    let address_qubits = (1..=m).collect::<Vec<_>>();

    let mut circuit = Circuit::new(m + 1);
    for &q in &address_qubits {
        circuit.add_gate(GateKind::H, q)?;
    }

    for (address, &theta) in thetas.iter().enumerate() {
        let flips = (0..m)
            .filter(|bit| address & (1 << bit) == 0)
            .map(|bit| bit + 1)
            .collect::<Vec<_>>();

        for &q in &flips {
            circuit.add_gate(GateKind::X, q)?;
        }
        append_multi_controlled_ry(&mut circuit, &address_qubits, DATA_QUBIT, theta)?;
        for &q in &flips {
            circuit.add_gate(GateKind::X, q)?;
        }
    }

    debug!(
        address_bits = m,
        gates = circuit.len(),
        "built addressed rotation circuit"
    );
    Ok(circuit)
}

/// The amplitude of address `a` with data bit `b` sits at `(a << 1) | b`.
pub fn load(thetas: &[f64]) -> Result<QState> {
    let circuit = addressed_rotations(thetas)?;
    circuit.apply(&QState::zero_state(circuit.num_of_qbits()))
}
