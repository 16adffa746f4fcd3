//! Fidelity of a Bell pair under the single-qubit noise channels, for a sweep
//! of noise strengths.

use anyhow::Result;
use qsim_challenges::{
    density::{fidelity, fidelity_with_pure, NoiseChannel},
    Circuit, DensityMatrix, QState,
};

fn noisy_bell(channel: NoiseChannel) -> Result<Circuit> {
    let mut circuit = Circuit::new(2).H(0)?.cnot(0, 1)?;
    circuit.add_noise_at(0, channel)?;
    circuit.add_noise_at(1, channel)?;
    Ok(circuit)
}

fn main() -> Result<()> {
    let ideal = Circuit::new(2)
        .H(0)?
        .cnot(0, 1)?
        .apply(&QState::zero_state(2))?;
    let ideal_rho = DensityMatrix::from_pure(&ideal);
    let initial = DensityMatrix::from_pure(&QState::zero_state(2));

    let channels: [(&str, fn(f64) -> NoiseChannel); 4] = [
        ("bit flip", NoiseChannel::BitFlip),
        ("phase flip", NoiseChannel::PhaseFlip),
        ("depolarizing", NoiseChannel::Depolarizing),
        ("amplitude damping", NoiseChannel::AmplitudeDamping),
    ];

    println!("{:<18} {:>5} {:>9} {:>9} {:>7}", "channel", "p", "F(pure)", "F(mixed)", "purity");
    for (name, channel) in channels {
        for p in [0.0, 0.05, 0.1, 0.2, 0.3] {
            let rho = initial.evolve(&noisy_bell(channel(p))?)?;
            println!(
                "{:<18} {:>5.2} {:>9.5} {:>9.5} {:>7.4}",
                name,
                p,
                fidelity_with_pure(&ideal, &rho)?,
                fidelity(&ideal_rho, &rho)?,
                rho.purity()
            );
        }
    }

    Ok(())
}
