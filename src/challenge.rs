use std::fmt::Display;
use std::str::FromStr;

use anyhow::Result;
use clap::ValueEnum;
use nalgebra::Matrix2;
use num_complex::Complex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    circuit::{Circuit, ParameterizedGate},
    density::{fidelity_with_pure, DensityMatrix, NoiseChannel},
    fourier::{Coefficient, EntanglerModel},
    gradient::parameter_shift,
    observable::Observable,
    qram,
    qstate::QState,
    su2::zyz_decompose,
    su2equiv::PhaseEquiv,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tolerance {
    Absolute(f64),
    /// Relative to the larger magnitude of the two values.
    Relative(f64),
}

impl Tolerance {
    pub fn accepts(&self, expected: f64, actual: f64) -> bool {
        if !actual.is_finite() {
            return false;
        }
        let diff = (expected - actual).abs();
        match *self {
            Tolerance::Absolute(tol) => diff <= tol,
            Tolerance::Relative(tol) => diff <= tol * expected.abs().max(actual.abs()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("Invalid input")]
    Input(#[source] serde_json::Error),

    #[error("Output is not JSON")]
    Output(#[source] serde_json::Error),

    #[error("Expected output is not JSON")]
    Expected(#[source] serde_json::Error),

    #[error("Not a JSON number or list of numbers: {0}")]
    NonNumeric(String),

    #[error("Expected {expected} numbers, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Value {index} is {actual}, expected {expected}")]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Correct,
    WrongAnswer,
    RuntimeError(String),
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Correct => write!(f, "Correct!"),
            Verdict::WrongAnswer => write!(f, "Wrong Answer"),
            Verdict::RuntimeError(message) => write!(f, "Runtime Error. {}", message),
        }
    }
}

/// An exercise that answers one JSON input line with a JSON number or list of numbers.
pub trait Challenge {
    const NAME: &'static str;
    const TOLERANCE: Tolerance;
    /// Pairs of (input line, expected output line).
    const CASES: &'static [(&'static str, &'static str)];

    type Input: DeserializeOwned;
    type Output: Serialize;

    fn solve(input: Self::Input) -> Result<Self::Output>;
}

pub fn run_line<C: Challenge>(line: &str) -> Result<String> {
    let input = serde_json::from_str(line.trim()).map_err(ChallengeError::Input)?;
    let output = C::solve(input)?;
    Ok(serde_json::to_string(&output)?)
}

fn collect_numbers(value: &Value, numbers: &mut Vec<f64>) -> Result<(), ChallengeError> {
    match value {
        Value::Number(number) => {
            let number = number
                .as_f64()
                .ok_or_else(|| ChallengeError::NonNumeric(number.to_string()))?;
            numbers.push(number);
        }
        Value::Array(values) => {
            for value in values {
                collect_numbers(value, numbers)?;
            }
        }
        other => return Err(ChallengeError::NonNumeric(other.to_string())),
    }
    Ok(())
}

fn numbers(value: &Value) -> Result<Vec<f64>, ChallengeError> {
    let mut numbers = Vec::new();
    collect_numbers(value, &mut numbers)?;
    Ok(numbers)
}

/// Numbers of an expected output line, in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct Expected(Vec<f64>);

impl FromStr for Expected {
    type Err = ChallengeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(line.trim()).map_err(ChallengeError::Expected)?;
        Ok(Expected(numbers(&value)?))
    }
}

/// Compares every number of `actual` with the number at the same position in `expected`.
pub fn compare(expected: &Expected, actual: &str, tolerance: Tolerance) -> Result<(), ChallengeError> {
    let value: Value = serde_json::from_str(actual.trim()).map_err(ChallengeError::Output)?;
    let actual = numbers(&value)?;

    if expected.0.len() != actual.len() {
        return Err(ChallengeError::ShapeMismatch {
            expected: expected.0.len(),
            actual: actual.len(),
        });
    }

    for (index, (&e, &a)) in expected.0.iter().zip(&actual).enumerate() {
        if !tolerance.accepts(e, a) {
            return Err(ChallengeError::ValueMismatch {
                index,
                expected: e,
                actual: a,
            });
        }
    }
    Ok(())
}

pub fn judge(expected: &Expected, actual: Result<String>, tolerance: Tolerance) -> Verdict {
    let actual = match actual {
        Ok(actual) => actual,
        Err(err) => return Verdict::RuntimeError(format!("{:#}", err)),
    };

    match compare(expected, &actual, tolerance) {
        Ok(()) => Verdict::Correct,
        Err(err) => {
            debug!(%err, ?expected, %actual, "output rejected");
            Verdict::WrongAnswer
        }
    }
}

/// Runs every embedded case of `C`.
pub fn check<C: Challenge>() -> Vec<Verdict> {
    C::CASES
        .iter()
        .enumerate()
        .map(|(i, (input, expected))| {
            let verdict = match expected.parse::<Expected>() {
                Ok(expected) => judge(&expected, run_line::<C>(input), C::TOLERANCE),
                Err(err) => Verdict::RuntimeError(format!("{:#}", anyhow::Error::from(err))),
            };
            if verdict.is_correct() {
                info!(exercise = C::NAME, case = i + 1, "{}", verdict);
            } else {
                warn!(exercise = C::NAME, case = i + 1, %input, "{}", verdict);
            }
            verdict
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Exercise {
    Fourier,
    BitflipFidelity,
    ParameterShift,
    Decomposition,
    Qram,
}

impl Exercise {
    pub const ALL: [Exercise; 5] = [
        Exercise::Fourier,
        Exercise::BitflipFidelity,
        Exercise::ParameterShift,
        Exercise::Decomposition,
        Exercise::Qram,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Exercise::Fourier => FourierDistance::NAME,
            Exercise::BitflipFidelity => BitFlipFidelity::NAME,
            Exercise::ParameterShift => ParameterShiftGradient::NAME,
            Exercise::Decomposition => Decomposition::NAME,
            Exercise::Qram => AddressedRotations::NAME,
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        match self {
            Exercise::Fourier => FourierDistance::TOLERANCE,
            Exercise::BitflipFidelity => BitFlipFidelity::TOLERANCE,
            Exercise::ParameterShift => ParameterShiftGradient::TOLERANCE,
            Exercise::Decomposition => Decomposition::TOLERANCE,
            Exercise::Qram => AddressedRotations::TOLERANCE,
        }
    }

    pub fn solve_line(&self, line: &str) -> Result<String> {
        match self {
            Exercise::Fourier => run_line::<FourierDistance>(line),
            Exercise::BitflipFidelity => run_line::<BitFlipFidelity>(line),
            Exercise::ParameterShift => run_line::<ParameterShiftGradient>(line),
            Exercise::Decomposition => run_line::<Decomposition>(line),
            Exercise::Qram => run_line::<AddressedRotations>(line),
        }
    }

    pub fn check(&self) -> Vec<Verdict> {
        match self {
            Exercise::Fourier => check::<FourierDistance>(),
            Exercise::BitflipFidelity => check::<BitFlipFidelity>(),
            Exercise::ParameterShift => check::<ParameterShiftGradient>(),
            Exercise::Decomposition => check::<Decomposition>(),
            Exercise::Qram => check::<AddressedRotations>(),
        }
    }
}

/// A Fourier coefficient given either as a real number or as `[re, im]`.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
pub enum CoefficientInput {
    Real(f64),
    Complex([f64; 2]),
}

impl From<CoefficientInput> for Coefficient {
    fn from(value: CoefficientInput) -> Self {
        match value {
            CoefficientInput::Real(re) => Complex::new(re, 0.0),
            CoefficientInput::Complex([re, im]) => Complex::new(re, im),
        }
    }
}

/// Squared distance between a target spectrum and the spectrum of an
/// [`EntanglerModel`] with the given weights.
pub struct FourierDistance;

impl Challenge for FourierDistance {
    const NAME: &'static str = "fourier";
    const TOLERANCE: Tolerance = Tolerance::Absolute(0.01);
    const CASES: &'static [(&'static str, &'static str)] = &[
        (
            "[[-0.1124225, 0, 0.0947910, 0, 0, 0.0947910, 0], [2, 2, 2, 3, 4, 5]]",
            "0.00368",
        ),
        (
            "[[-0.1124225, 0, [0.094791, -0.042875], 0, 0, [0.094791, 0.042875], 0], [2, 2, 2, 3, 4, 5]]",
            "0.0",
        ),
    ];

    type Input = (Vec<CoefficientInput>, Vec<f64>);
    type Output = f64;

    fn solve((coefficients, weights): Self::Input) -> Result<f64> {
        if weights.len() % 2 != 0 {
            return Err(anyhow::anyhow!(
                "Weights come in two layers, got {} values",
                weights.len()
            ));
        }
        let target = coefficients
            .into_iter()
            .map(Coefficient::from)
            .collect::<Vec<_>>();
        EntanglerModel::new(weights.len() / 2, weights)?.distance_to(&target)
    }
}

/// Fidelity of a Bell pair with itself after a bit flip of probability `p` on both qubits.
pub fn bell_fidelity_under_bit_flip(p: f64) -> Result<f64> {
    let bell = Circuit::new(2).H(0)?.cnot(0, 1)?;
    let ideal = bell.apply(&QState::zero_state(2))?;

    let mut noisy = bell;
    noisy.add_noise_at(0, NoiseChannel::BitFlip(p))?;
    noisy.add_noise_at(1, NoiseChannel::BitFlip(p))?;
    let rho = DensityMatrix::from_pure(&QState::zero_state(2)).evolve(&noisy)?;

    fidelity_with_pure(&ideal, &rho)
}

pub struct BitFlipFidelity;

impl Challenge for BitFlipFidelity {
    const NAME: &'static str = "bitflip-fidelity";
    const TOLERANCE: Tolerance = Tolerance::Relative(1e-4);
    const CASES: &'static [(&'static str, &'static str)] = &[
        (
            "[0.05, 0.1, 0.15, 0.2, 0.25]",
            "[0.905, 0.82, 0.745, 0.68, 0.625]",
        ),
        ("[0, 0.5, 1]", "[1.0, 0.5, 1.0]"),
    ];

    type Input = Vec<f64>;
    type Output = Vec<f64>;

    fn solve(probabilities: Self::Input) -> Result<Vec<f64>> {
        probabilities
            .into_iter()
            .map(bell_fidelity_under_bit_flip)
            .collect()
    }
}

/// Gradient of Σ⟨Z_q⟩ for a layer of RX(θ_q), one rotation per qubit.
pub struct ParameterShiftGradient;

impl Challenge for ParameterShiftGradient {
    const NAME: &'static str = "parameter-shift";
    const TOLERANCE: Tolerance = Tolerance::Relative(1e-4);
    const CASES: &'static [(&'static str, &'static str)] = &[
        ("[[0.75, 1.0], 1.23]", "[-0.68164, -0.84147]"),
        (
            "[[0.5, 2.0, -1.0], 0.7853981633974483]",
            "[-0.479426, -0.909297, 0.841471]",
        ),
    ];

    type Input = (Vec<f64>, f64);
    type Output = Vec<f64>;

    fn solve((params, shift): Self::Input) -> Result<Vec<f64>> {
        let n = params.len();
        if n == 0 {
            return Err(anyhow::anyhow!("At least one parameter is required"));
        }

        let mut circuit = Circuit::new(n);
        for (q, &theta) in params.iter().enumerate() {
            circuit.add_parametric_gate_at(q, ParameterizedGate::RX, theta)?;
        }
        let observable = Observable::z_sum(&(0..n).collect::<Vec<_>>());

        parameter_shift(&circuit, &observable, &QState::zero_state(n), shift)
    }
}

/// `[phi, theta, omega, global_phase]` of a 2x2 unitary given as `[[[re, im], ...], ...]`.
pub struct Decomposition;

impl Challenge for Decomposition {
    const NAME: &'static str = "decomposition";
    const TOLERANCE: Tolerance = Tolerance::Absolute(1e-2);
    const CASES: &'static [(&'static str, &'static str)] = &[
        (
            "[[[0.7071067811865476, 0], [0.7071067811865476, 0]], [[0.7071067811865476, 0], [-0.7071067811865476, 0]]]",
            "[3.141593, 1.570796, 0.0, 1.570796]",
        ),
        (
            "[[[1, 0], [0, 0]], [[0, 0], [0.7071067811865476, 0.7071067811865476]]]",
            "[0.785398, 0.0, 0.0, 0.392699]",
        ),
        (
            "[[[0.7852270837, 0.3319886862], [-0.4993421822, 0.1544646379]], [[0.3249075918, 0.4094349717], [0.8355307909, 0.1693704763]]]",
            "[-0.7, 1.1, 0.5, 0.3]",
        ),
        (
            "[[[-1, 0], [0, 0]], [[0, 0], [-1, 0]]]",
            "[0.0, 0.0, 0.0, 3.141593]",
        ),
    ];

    type Input = [[[f64; 2]; 2]; 2];
    type Output = [f64; 4];

    fn solve(rows: Self::Input) -> Result<[f64; 4]> {
        let u = Matrix2::from_fn(|r, c| Complex::new(rows[r][c][0], rows[r][c][1]));
        let angles = zyz_decompose(&u)?;

        let rebuilt = angles.to_matrix();
        let deviation = (rebuilt - u).norm();
        if deviation > 1e-6 {
            if PhaseEquiv::new(1e-6).equals(&u, &rebuilt) {
                return Err(anyhow::anyhow!(
                    "Decomposition matches the input only up to a global phase (|R - U| = {:e})",
                    deviation
                ));
            }
            return Err(anyhow::anyhow!(
                "Decomposition does not reproduce the input (|R - U| = {:e})",
                deviation
            ));
        }

        Ok(angles.to_array())
    }
}

/// Real amplitudes produced by loading one angle per address.
pub struct AddressedRotations;

impl Challenge for AddressedRotations {
    const NAME: &'static str = "qram";
    const TOLERANCE: Tolerance = Tolerance::Absolute(1e-2);
    const CASES: &'static [(&'static str, &'static str)] = &[
        (
            "[0.3, 1.2, 0.0, 3.141592653589793, 2.5, 0.7, 1.9, 3.0]",
            "[0.349583, 0.052834, 0.2918, 0.199631, 0.353553, 0.0, 0.0, 0.353553, 0.111483, 0.335517, 0.332118, 0.121233, 0.205656, 0.287586, 0.025009, 0.352668]",
        ),
        (
            "[0, 0, 0, 0, 0, 0, 0, 0]",
            "[0.353553, 0, 0.353553, 0, 0.353553, 0, 0.353553, 0, 0.353553, 0, 0.353553, 0, 0.353553, 0, 0.353553, 0]",
        ),
    ];

    type Input = Vec<f64>;
    type Output = Vec<f64>;

    fn solve(thetas: Self::Input) -> Result<Vec<f64>> {
        let state = qram::load(&thetas)?;
        state
            .amplitudes()
            .iter()
            .map(|amp| {
                if amp.im.abs() > 1e-9 {
                    return Err(anyhow::anyhow!("Amplitude {} is not real", amp));
                }
                Ok(amp.re)
            })
            .collect()
    }
}
