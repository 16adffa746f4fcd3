use anyhow::Result;
use tracing::debug;

use crate::circuit::Circuit;
use crate::observable::Observable;
use crate::qstate::QState;

/// Expectation value of `observable` after running `circuit` with `params` on `initial`.
pub fn expectation(
    circuit: &Circuit,
    params: &[f64],
    observable: &Observable,
    initial: &QState,
) -> Result<f64> {
    let mut circuit = circuit.clone();
    circuit.set_parameters(params)?;
    observable.expectation_value(&circuit.apply(initial)?)
}

/// Generalised parameter-shift rule for gates generated by a Pauli operator:
///
/// ∂f/∂θᵢ = [f(θ + s·eᵢ) − f(θ − s·eᵢ)] / (2 sin s)
///
/// which is exact for any shift `s` that is not a multiple of π.
pub fn parameter_shift(
    circuit: &Circuit,
    observable: &Observable,
    initial: &QState,
    shift: f64,
) -> Result<Vec<f64>> {
    let denominator = 2.0 * shift.sin();
    if !shift.is_finite() || denominator.abs() < 1e-12 {
        return Err(anyhow::anyhow!(
            "Shift {} makes the parameter-shift rule singular",
            shift
        ));
    }

    let params = circuit.parameters();
    let gradient = (0..params.len())
        .map(|i| {
            let mut params_plus = params.clone();
            let mut params_minus = params.clone();
            params_plus[i] += shift;
            params_minus[i] -= shift;

            let exp_plus = expectation(circuit, &params_plus, observable, initial)?;
            let exp_minus = expectation(circuit, &params_minus, observable, initial)?;

            Ok((exp_plus - exp_minus) / denominator)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(shift, ?gradient, "parameter-shift gradient");
    Ok(gradient)
}

/// Central finite difference with step `h`.
pub fn finite_difference(
    circuit: &Circuit,
    observable: &Observable,
    initial: &QState,
    h: f64,
) -> Result<Vec<f64>> {
    if !(h.is_finite() && h > 0.0) {
        return Err(anyhow::anyhow!("Step size must be positive, got {}", h));
    }

    let params = circuit.parameters();
    (0..params.len())
        .map(|i| {
            let mut params_plus = params.clone();
            let mut params_minus = params.clone();
            params_plus[i] += h;
            params_minus[i] -= h;

            let exp_plus = expectation(circuit, &params_plus, observable, initial)?;
            let exp_minus = expectation(circuit, &params_minus, observable, initial)?;

            Ok((exp_plus - exp_minus) / (2.0 * h))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::assert_approx_eq;
    use crate::circuit::ParameterizedGate;
    use crate::observable::Pauli;

    fn two_rotations(theta0: f64, theta1: f64) -> Result<Circuit> {
        let mut circuit = Circuit::new(2);
        circuit.add_parametric_gate_at(0, ParameterizedGate::RX, theta0)?;
        circuit.add_parametric_gate_at(1, ParameterizedGate::RX, theta1)?;
        Ok(circuit)
    }

    #[test]
    fn test_parameter_shift_with_arbitrary_shift() -> Result<()> {
        let circuit = two_rotations(0.75, 1.0)?;
        let observable = Observable::z_sum(&[0, 1]);

        let gradient = parameter_shift(&circuit, &observable, &QState::zero_state(2), 1.23)?;

        assert_eq!(2, gradient.len());
        assert_approx_eq!(-(0.75f64).sin(), gradient[0]);
        assert_approx_eq!(-(1.0f64).sin(), gradient[1]);

        Ok(())
    }

    #[test]
    fn test_parameter_shift_matches_finite_difference() -> Result<()> {
        let mut circuit = two_rotations(0.3, -1.1)?;
        circuit.add_parametric_gate_at(0, ParameterizedGate::RY, 0.4)?;
        let mut circuit = circuit.cnot(0, 1)?;
        circuit.add_parametric_gate_at(1, ParameterizedGate::RZ, 2.2)?;
        circuit.add_parametric_gate_at(1, ParameterizedGate::RY, 0.9)?;

        let mut observable = Observable::new();
        observable.add_pauli_operator(0.5, &[(Pauli::Z, 1)]);
        observable.add_pauli_operator(1.5, &[(Pauli::X, 0), (Pauli::Y, 1)]);

        let initial = QState::zero_state(2);
        let exact = parameter_shift(&circuit, &observable, &initial, FRAC_PI_2)?;
        let approx = finite_difference(&circuit, &observable, &initial, 1e-5)?;

        for (e, a) in exact.iter().zip(approx.iter()) {
            assert_approx_eq!(*e, *a, 1e-6);
        }

        Ok(())
    }

    #[test]
    fn test_singular_shift_is_rejected() -> Result<()> {
        let circuit = two_rotations(0.1, 0.2)?;
        let observable = Observable::z_sum(&[0]);

        assert!(parameter_shift(&circuit, &observable, &QState::zero_state(2), 0.0).is_err());
        assert!(
            parameter_shift(&circuit, &observable, &QState::zero_state(2), std::f64::consts::PI)
                .is_err()
        );
        assert!(finite_difference(&circuit, &observable, &QState::zero_state(2), 0.0).is_err());

        Ok(())
    }
}
