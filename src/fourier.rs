use std::f64::consts::TAU;

use anyhow::Result;
use argmin::{
    core::{CostFunction, Executor, State},
    solver::neldermead::NelderMead,
};
use num_complex::Complex;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use crate::{
    circuit::{Circuit, GateKind, ParameterizedGate},
    observable::Observable,
    qstate::QState,
};

pub type Coefficient = Complex<f64>;

/// Fourier coefficients of a 2π-periodic function up to `degree`, in FFT order:
/// `[c_0, c_1, ..., c_d, c_-d, ..., c_-1]`.
pub fn coefficients<F>(mut f: F, degree: usize) -> Result<Vec<Coefficient>>
where
    F: FnMut(f64) -> Result<f64>,
{
    let n = 2 * degree + 1;
    let samples = (0..n)
        .map(|k| f(TAU * k as f64 / n as f64))
        .collect::<Result<Vec<_>>>()?;

    let coeffs = (0..n)
        .map(|j| {
            samples
                .iter()
                .enumerate()
                .map(|(k, &y)| {
                    let angle = -TAU * (j * k) as f64 / n as f64;
                    Complex::from_polar(y, angle)
                })
                .sum::<Coefficient>()
                / n as f64
        })
        .collect();

    Ok(coeffs)
}

/// Σ |a_j - b_j|²
pub fn squared_distance(a: &[Coefficient], b: &[Coefficient]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(anyhow::anyhow!(
            "Cannot compare spectra with {} and {} coefficients",
            a.len(),
            b.len()
        ));
    }
    Ok(a.iter().zip(b).map(|(x, y)| (x - y).norm_sqr()).sum())
}

/// Basic entangler layer, RX(x) on every qubit, basic entangler layer; measures ⟨Z_0⟩.
///
/// A basic entangler layer is an RX rotation per qubit followed by a ring of
/// CNOTs. The first `n` weights feed the first layer, the rest the second.
#[derive(Clone, Debug)]
pub struct EntanglerModel {
    num_of_qbits: usize,
    weights: Vec<f64>,
}

impl EntanglerModel {
    pub fn new(num_of_qbits: usize, weights: Vec<f64>) -> Result<Self> {
        if num_of_qbits == 0 {
            return Err(anyhow::anyhow!("Model needs at least one qubit"));
        }
        if weights.len() != 2 * num_of_qbits {
            return Err(anyhow::anyhow!(
                "A {}-qubit model takes {} weights, got {}",
                num_of_qbits,
                2 * num_of_qbits,
                weights.len()
            ));
        }
        Ok(Self {
            num_of_qbits,
            weights,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Largest frequency in the spectrum.
    pub fn degree(&self) -> usize {
        self.num_of_qbits
    }

    fn add_entangler_layer(&self, circuit: &mut Circuit, weights: &[f64]) -> Result<()> {
        let n = self.num_of_qbits;
        for (i, &w) in weights.iter().enumerate() {
            circuit.add_parametric_gate_at(i, ParameterizedGate::RX, w)?;
        }
        match n {
            1 => {}
            2 => circuit.add_control(0, 1, GateKind::X)?,
            _ => {
                for i in 0..n {
                    circuit.add_control(i, (i + 1) % n, GateKind::X)?;
                }
            }
        }
        Ok(())
    }

    pub fn circuit(&self, x: f64) -> Result<Circuit> {
        let n = self.num_of_qbits;
        let mut circuit = Circuit::new(n);

        self.add_entangler_layer(&mut circuit, &self.weights[..n])?;
        for i in 0..n {
            circuit.add_gate(GateKind::RX(x), i)?;
        }
        self.add_entangler_layer(&mut circuit, &self.weights[n..])?;

        Ok(circuit)
    }

    pub fn evaluate(&self, x: f64) -> Result<f64> {
        let state = self
            .circuit(x)?
            .apply(&QState::zero_state(self.num_of_qbits))?;
        Observable::z_sum(&[0]).expectation_value(&state)
    }

    pub fn coefficients(&self) -> Result<Vec<Coefficient>> {
        coefficients(|x| self.evaluate(x), self.degree())
    }

    pub fn distance_to(&self, target: &[Coefficient]) -> Result<f64> {
        squared_distance(&self.coefficients()?, target)
    }

    /// Searches for weights whose spectrum is closest to `target` with Nelder-Mead,
    /// starting from the current weights.
    pub fn fit(&self, target: &[Coefficient], max_iters: u64, seed: u64) -> Result<FitReport> {
        let expected_len = 2 * self.degree() + 1;
        if target.len() != expected_len {
            return Err(anyhow::anyhow!(
                "Target spectrum needs {} coefficients, got {}",
                expected_len,
                target.len()
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let perturbation = Normal::new(0.0, 0.5)?;
        let mut simplex = vec![self.weights.clone()];
        for _ in 0..self.weights.len() {
            simplex.push(
                self.weights
                    .iter()
                    .map(|w| w + perturbation.sample(&mut rng))
                    .collect(),
            );
        }

        let problem = SpectrumFit {
            num_of_qbits: self.num_of_qbits,
            target: target.to_vec(),
        };
        let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex).with_sd_tolerance(1e-12)?;

        info!(max_iters, "fitting spectrum");
        let res = Executor::new(problem, solver)
            .configure(|state| state.max_iters(max_iters))
            .run()?;

        let weights = res
            .state
            .get_best_param()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No best parameter found in the optimization result"))?;
        let report = FitReport {
            distance: res.state.get_best_cost(),
            iterations: res.state.get_iter(),
            weights,
        };
        debug!(?report, "spectrum fit finished");

        Ok(report)
    }
}

#[derive(Clone, Debug)]
pub struct FitReport {
    pub weights: Vec<f64>,
    pub distance: f64,
    pub iterations: u64,
}

struct SpectrumFit {
    num_of_qbits: usize,
    target: Vec<Coefficient>,
}

impl CostFunction for SpectrumFit {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, weights: &Self::Param) -> Result<Self::Output> {
        EntanglerModel::new(self.num_of_qbits, weights.clone())?.distance_to(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_coefficients_of_trigonometric_polynomial() -> Result<()> {
        // f(x) = 0.5 + cos(x) + 0.25 sin(2x)
        let coeffs = coefficients(|x| Ok(0.5 + x.cos() + 0.25 * (2.0 * x).sin()), 2)?;

        assert_eq!(5, coeffs.len());
        assert_approx_eq!(0.5, coeffs[0].re);
        assert_approx_eq!(0.5, coeffs[1].re);
        assert_approx_eq!(0.0, coeffs[2].re);
        assert_approx_eq!(-0.125, coeffs[2].im);
        assert_approx_eq!(0.125, coeffs[3].im);
        assert_approx_eq!(0.5, coeffs[4].re);

        Ok(())
    }

    #[test]
    fn test_model_spectrum_matches_reference_point() -> Result<()> {
        let model = EntanglerModel::new(3, vec![2.0, 2.0, 2.0, 3.0, 4.0, 5.0])?;
        let target = [-0.1124225, 0.0, 0.0947910, 0.0, 0.0, 0.0947910, 0.0]
            .map(|re| Complex::new(re, 0.0));

        let coeffs = model.coefficients()?;
        assert_eq!(7, coeffs.len());
        assert_approx_eq!(-0.1124225, coeffs[0].re, 1e-6);
        // Odd frequencies cancel for this circuit
        assert_approx_eq!(0.0, coeffs[1].norm(), 1e-10);
        assert_approx_eq!(0.0, coeffs[3].norm(), 1e-10);
        // Real signal, so c_-j is the conjugate of c_j
        assert_approx_eq!(coeffs[2].re, coeffs[5].re);
        assert_approx_eq!(coeffs[2].im, -coeffs[5].im);

        assert_approx_eq!(0.00368, model.distance_to(&target)?, 1e-5);

        Ok(())
    }

    #[test]
    fn test_model_rejects_wrong_weight_count() {
        assert!(EntanglerModel::new(3, vec![0.0; 5]).is_err());
        assert!(EntanglerModel::new(0, vec![]).is_err());
    }

    #[test]
    fn test_squared_distance_length_mismatch() {
        let a = [Complex::new(1.0, 0.0)];
        assert!(squared_distance(&a, &[]).is_err());
        assert_approx_eq!(0.0, squared_distance(&a, &a).unwrap());
    }

    #[test]
    fn test_fit_does_not_increase_distance() -> Result<()> {
        let target = EntanglerModel::new(2, vec![0.4, 1.3, -0.7, 2.1])?.coefficients()?;
        let model = EntanglerModel::new(2, vec![0.0, 0.0, 0.0, 0.0])?;

        let initial = model.distance_to(&target)?;
        let report = model.fit(&target, 100, 42)?;

        assert_eq!(4, report.weights.len());
        assert!(report.distance <= initial + 1e-12);
        assert_approx_eq!(
            report.distance,
            EntanglerModel::new(2, report.weights.clone())?.distance_to(&target)?
        );

        Ok(())
    }
}
