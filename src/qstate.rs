use std::fmt::Display;

use anyhow::Result;
use nalgebra::DVector;
use num_complex::Complex;
use rand::Rng;

use crate::Qbit;

#[derive(Clone, Debug)]
pub struct QState {
    pub(crate) state: DVector<Qbit>,
}

impl QState {
    pub fn new(state: &[Qbit]) -> Result<Self> {
        let len = state.len();
        if len == 0 || (len & (len - 1)) != 0 {
            return Err(anyhow::anyhow!(
                "State vector length must be a non-zero power of 2"
            ));
        }

        let state = DVector::from_row_slice(state);
        Ok(Self { state })
    }

    pub fn zero_state(num_of_qbits: usize) -> Self {
        let size = 2_usize.pow(num_of_qbits as u32);
        let mut state = DVector::zeros(size);
        state[0] = Complex::new(1.0, 0.0); // |0...0> state
        Self { state }
    }

    pub fn from_str(qbits: &str) -> Result<Self> {
        let index = usize::from_str_radix(qbits, 2)?;
        let size = u32::try_from(qbits.len())
            .ok()
            .and_then(|len| 1_usize.checked_shl(len))
            .ok_or_else(|| anyhow::anyhow!("Too many qubits in label of length {}", qbits.len()))?;
        let mut state = DVector::zeros(size);
        state[index] = Complex::new(1.0, 0.0);

        Ok(Self { state })
    }

    pub fn num_of_qbits(&self) -> usize {
        self.state.len().ilog2() as usize
    }

    pub fn amplitudes(&self) -> &DVector<Qbit> {
        &self.state
    }

    /// <self|other>
    pub fn inner(&self, other: &QState) -> Result<Qbit> {
        if self.state.len() != other.state.len() {
            return Err(anyhow::anyhow!(
                "Cannot take the inner product of {}-qubit and {}-qubit states",
                self.num_of_qbits(),
                other.num_of_qbits()
            ));
        }
        Ok(self.state.dotc(&other.state))
    }

    pub fn fidelity(&self, other: &QState) -> Result<f64> {
        Ok(self.inner(other)?.norm_sqr())
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.state.iter().map(|amp| amp.norm_sqr()).collect()
    }

    /// Measures every qubit `shots` times and returns the count of each basis state.
    pub fn sample<R: Rng>(&self, shots: usize, rng: &mut R) -> Vec<usize> {
        let probabilities = self.probabilities();
        let mut counts = vec![0; probabilities.len()];

        for _ in 0..shots {
            let r = rng.random::<f64>();
            let mut acc = 0.0;
            let mut outcome = probabilities.len() - 1;
            for (i, p) in probabilities.iter().enumerate() {
                acc += p;
                if r < acc {
                    outcome = i;
                    break;
                }
            }
            counts[outcome] += 1;
        }

        counts
    }
}

impl Display for QState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bin_width = self.num_of_qbits();

        for (i, value) in self.state.iter().enumerate() {
            writeln!(f, "|{:0width$b}>: {}", i, value, width = bin_width)?;
        }

        Ok(())
    }
}

impl From<QState> for DVector<Qbit> {
    fn from(qstate: QState) -> Self {
        qstate.state
    }
}
