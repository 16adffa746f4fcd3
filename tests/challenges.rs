use qsim_challenges::challenge::{judge, Exercise, Expected, Verdict};

fn grade(exercise: Exercise, input: &str, expected: &str) -> Verdict {
    let expected: Expected = expected.parse().unwrap();
    judge(&expected, exercise.solve_line(input), exercise.tolerance())
}

#[test]
fn fourier_distance_to_reference_spectrum() {
    let verdict = grade(
        Exercise::Fourier,
        "[[-0.1124225, 0, 0.0947910, 0, 0, 0.0947910, 0], [2, 2, 2, 3, 4, 5]]",
        "0.00368",
    );
    assert_eq!(Verdict::Correct, verdict);
}

#[test]
fn bit_flip_fidelities() {
    let verdict = grade(
        Exercise::BitflipFidelity,
        "[0.05, 0.1, 0.15, 0.2, 0.25]",
        "[0.905, 0.82, 0.745, 0.68, 0.625]",
    );
    assert_eq!(Verdict::Correct, verdict);

    let verdict = grade(Exercise::BitflipFidelity, "[0.1]", "[0.9]");
    assert_eq!(Verdict::WrongAnswer, verdict);
}

#[test]
fn parameter_shift_gradient() {
    let verdict = grade(
        Exercise::ParameterShift,
        "[[0.75, 1.0], 1.23]",
        "[-0.68164, -0.84147]",
    );
    assert_eq!(Verdict::Correct, verdict);
}

#[test]
fn decomposition_of_s_gate() {
    // S = e^{iπ/4} RZ(π/2)
    let verdict = grade(
        Exercise::Decomposition,
        "[[[1, 0], [0, 0]], [[0, 0], [0, 1]]]",
        "[1.570796, 0.0, 0.0, 0.785398]",
    );
    assert_eq!(Verdict::Correct, verdict);
}

#[test]
fn decomposition_of_negated_gates() {
    let verdict = grade(
        Exercise::Decomposition,
        "[[[-1, 0], [0, 0]], [[0, 0], [-1, 0]]]",
        "[0.0, 0.0, 0.0, 3.141593]",
    );
    assert_eq!(Verdict::Correct, verdict);

    // -H = e^{-iπ/2} RY(π/2) RZ(π)
    let verdict = grade(
        Exercise::Decomposition,
        "[[[-0.7071067811865476, 0], [-0.7071067811865476, 0]], [[-0.7071067811865476, 0], [0.7071067811865476, 0]]]",
        "[3.141593, 1.570796, 0.0, -1.570796]",
    );
    assert_eq!(Verdict::Correct, verdict);
}

#[test]
fn qram_with_two_addresses() {
    let verdict = grade(
        Exercise::Qram,
        "[3.141592653589793, 0.0]",
        "[0.0, 0.707107, 0.707107, 0.0]",
    );
    assert_eq!(Verdict::Correct, verdict);
}

#[test]
fn malformed_input_is_a_runtime_error() {
    for exercise in Exercise::ALL {
        let verdict = grade(exercise, "{\"unexpected\": true}", "0");
        assert!(
            matches!(&verdict, Verdict::RuntimeError(message) if message.starts_with("Invalid input")),
            "{} gave {}",
            exercise.name(),
            verdict
        );
    }
}

#[test]
fn embedded_cases_pass() {
    for exercise in Exercise::ALL {
        assert!(exercise.check().iter().all(Verdict::is_correct), "{}", exercise.name());
    }
}
