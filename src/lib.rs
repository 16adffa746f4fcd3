pub mod challenge;
pub mod circuit;
pub mod density;
pub mod fourier;
pub mod gates;
pub mod gradient;
pub mod observable;
pub mod qram;
pub mod qstate;
pub mod su2;
pub mod su2equiv;
mod test_util;

use num_complex::Complex;

pub use circuit::Circuit;
pub use density::DensityMatrix;
pub use qstate::QState;

pub type Qbit = Complex<f64>;
