//! Loads eight angles into a 4-qubit register and samples the address/data pairs.

use anyhow::Result;
use qsim_challenges::qram::{addressed_rotations, load};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> Result<()> {
    let thetas = [0.3, 1.2, 0.0, std::f64::consts::PI, 2.5, 0.7, 1.9, 3.0];

    let circuit = addressed_rotations(&thetas)?;
    println!("{} gates on {} qubits", circuit.len(), circuit.num_of_qbits());

    let state = load(&thetas)?;
    println!("{}", state);

    let mut rng = StdRng::seed_from_u64(0);
    let counts = state.sample(10000, &mut rng);

    println!("address  theta  estimated");
    for (address, pair) in counts.chunks(2).enumerate() {
        let shots = pair[0] + pair[1];
        if shots == 0 {
            continue;
        }
        // P(data = 1 | address) = sin²(θ/2)
        let estimate = 2.0 * (pair[1] as f64 / shots as f64).sqrt().asin();
        println!("{:>7}  {:>5.2}  {:>9.3}", address, thetas[address], estimate);
    }

    Ok(())
}
