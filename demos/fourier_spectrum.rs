//! Plots the Fourier spectrum of a 3-qubit entangler model and fits the
//! model weights to a target spectrum.

use anyhow::Result;
use num_complex::Complex;
use plotters::prelude::*;
use qsim_challenges::fourier::{Coefficient, EntanglerModel};

/// Frequency of the j-th coefficient in FFT order.
fn frequency(j: usize, degree: usize) -> i32 {
    if j <= degree {
        j as i32
    } else {
        j as i32 - (2 * degree + 1) as i32
    }
}

fn plot_spectra(series: &[(&str, &[Coefficient], RGBColor)], file_name: &str) -> Result<()> {
    let root = BitMapBackend::new(file_name, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let degree = series[0].1.len() / 2;
    let y_max = series
        .iter()
        .flat_map(|(_, coeffs, _)| coeffs.iter().map(|c| c.norm()))
        .fold(0.0, f64::max)
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("|c_j|", ("sans-serif", 20))
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(-(degree as f64) - 0.5..degree as f64 + 0.5, 0.0..y_max)?;

    chart.configure_mesh().draw()?;

    let width = 0.8 / series.len() as f64;
    for (k, (label, coeffs, color)) in series.iter().enumerate() {
        let offset = -0.4 + width * k as f64;
        let color = *color;
        chart
            .draw_series(coeffs.iter().enumerate().map(|(j, c)| {
                let x = frequency(j, degree) as f64 + offset;
                Rectangle::new([(x, 0.0), (x + width, c.norm())], color.filled())
            }))?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<()> {
    let target = [
        -0.1124225, 0.0, 0.0947910, 0.0, 0.0, 0.0947910, 0.0,
    ]
    .map(|re| Complex::new(re, 0.0));

    let model = EntanglerModel::new(3, vec![2.0, 2.0, 2.0, 3.0, 4.0, 5.0])?;
    let initial = model.coefficients()?;
    println!("Initial distance: {:.6}", model.distance_to(&target)?);

    let report = model.fit(&target, 500, 7)?;
    println!(
        "Fitted distance: {:.6} after {} iterations",
        report.distance, report.iterations
    );
    println!("Weights: {:?}", report.weights);

    let fitted = EntanglerModel::new(3, report.weights)?.coefficients()?;
    plot_spectra(
        &[
            ("target", &target[..], BLUE),
            ("initial", &initial[..], RED),
            ("fitted", &fitted[..], GREEN),
        ],
        "spectrum.png",
    )?;

    println!("Spectrum saved to 'spectrum.png'.");

    Ok(())
}
