use approx::assert_relative_eq;
use fit_math::metrics::{accuracy, r_squared};
use fit_math::{perform_regression, MathError, RegressionKind, Sample};
use rstest::rstest;

fn samples(points: &[(f64, f64)]) -> Vec<Sample> {
    points
        .iter()
        .map(|&(x, y)| Sample::new(x, y).unwrap())
        .collect()
}

#[test]
fn test_quadratic_with_negative_terms() {
    // y = 1 + 0.5x - 0.25x^2
    let data: Vec<(f64, f64)> = (-3..=4)
        .map(|i| {
            let x = f64::from(i);
            (x, 1.0 + 0.5 * x - 0.25 * x * x)
        })
        .collect();
    let quadratic = RegressionKind::Polynomial { degree: 2 };
    let fit = perform_regression(&samples(&data), quadratic).unwrap();

    assert_eq!(fit.formula, "y = 1.0000 + 0.5000x - 0.2500x^2");
    assert_relative_eq!(fit.r2.unwrap(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(fit.predict(10.0), -19.0, epsilon = 1e-6);
}

#[test]
fn test_exponential_growth() {
    let data: Vec<(f64, f64)> = (0..6)
        .map(|i| (f64::from(i), 3.0 * (0.4 * f64::from(i)).exp()))
        .collect();
    let fit = perform_regression(&samples(&data), RegressionKind::Exponential).unwrap();

    assert_eq!(fit.formula, "y = 3.0000 × e^(0.4000x)");
    assert!(fit.mae < 1e-9);
}

#[test]
fn test_poor_fit_is_still_a_result() {
    // A line through a symmetric V has slope 0 and explains nothing
    let fit = perform_regression(
        &samples(&[(-2.0, 2.0), (-1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]),
        RegressionKind::Linear,
    )
    .unwrap();

    assert_relative_eq!(fit.r2.unwrap(), 0.0, epsilon = 1e-12);
    assert_eq!(fit.formula, "y = 1.2000 + 0.0000x");
}

#[test]
fn test_constant_target_metrics() {
    assert_eq!(r_squared(&[4.0, 4.0, 4.0], &[4.0, 4.0, 4.0]), Some(1.0));
    let metrics = accuracy(&[4.0, 4.0, 4.0], &[3.0, 4.0, 5.0]);
    assert_eq!(metrics.r2, None);
    assert_relative_eq!(metrics.mae, 2.0 / 3.0, epsilon = 1e-12);
    assert!(metrics.to_string().contains("undefined"));
}

#[rstest]
#[case(RegressionKind::Linear)]
#[case(RegressionKind::Polynomial { degree: 1 })]
#[case(RegressionKind::Exponential)]
fn test_single_enabled_sample_rejected(#[case] kind: RegressionKind) {
    let data = vec![
        Sample::new(1.0, 2.0).unwrap(),
        Sample::new(2.0, 3.0).unwrap().disabled(),
    ];
    assert!(matches!(
        perform_regression(&data, kind),
        Err(MathError::InsufficientData(_))
    ));
}

#[test]
fn test_duplicate_x_is_singular_for_polynomials() {
    let data = samples(&[(1.0, 1.0), (1.0, 2.0), (1.0, 3.0), (1.0, 4.0)]);
    assert!(matches!(
        perform_regression(&data, RegressionKind::Polynomial { degree: 2 }),
        Err(MathError::SingularSystem { .. })
    ));
    assert!(matches!(
        perform_regression(&data, RegressionKind::Linear),
        Err(MathError::CalculationError(_))
    ));
}

#[test]
fn test_small_scale_data_fits_like_unit_scale() {
    let tiny = samples(&[(1e-6, 1e-6), (2e-6, 3e-6), (3e-6, 2e-6), (4e-6, 5e-6)]);
    let unit = samples(&[(1.0, 1.0), (2.0, 3.0), (3.0, 2.0), (4.0, 5.0)]);

    let tiny_fit = perform_regression(&tiny, RegressionKind::Linear).unwrap();
    let unit_fit = perform_regression(&unit, RegressionKind::Linear).unwrap();

    assert!(tiny_fit.r2.unwrap() < 1.0);
    assert_relative_eq!(tiny_fit.r2.unwrap(), unit_fit.r2.unwrap(), epsilon = 1e-9);
    assert_relative_eq!(tiny_fit.coefficients[1], unit_fit.coefficients[1], epsilon = 1e-9);
}

#[test]
fn test_quadratic_on_calendar_years() {
    // y = 0.5(x - 2005)^2 + 3
    let data: Vec<(f64, f64)> = (2000..=2010)
        .map(|year| {
            let x = f64::from(year);
            (x, 0.5 * (x - 2005.0).powi(2) + 3.0)
        })
        .collect();
    let quadratic = RegressionKind::Polynomial { degree: 2 };
    let fit = perform_regression(&samples(&data), quadratic).unwrap();

    assert_relative_eq!(fit.coefficients[2], 0.5, epsilon = 1e-9);
    assert_relative_eq!(fit.coefficients[1], -2005.0, max_relative = 1e-9);
    assert_relative_eq!(fit.r2.unwrap(), 1.0, epsilon = 1e-9);
    assert!(fit.mae < 1e-6);
    assert_relative_eq!(fit.predict(2012.0), 27.5, epsilon = 1e-3);
}
