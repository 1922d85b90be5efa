use approx::assert_abs_diff_eq;
use statlearn::{
    dataset::{binary_subset, load_iris, Dataset, IrisFeature, Species, Standardizer},
    gradient_descent::{GradientDescent, GradientDescentConfig},
    irls::{Irls, IrlsConfig},
    logistic::LogisticRegression,
    metrics::misclassifications,
    solver::LogisticSolver,
};

fn setosa_versicolor(features: &[IrisFeature]) -> (Dataset, Dataset, Standardizer) {
    let samples = load_iris().unwrap();
    let raw = binary_subset(&samples, Species::Setosa, Species::Versicolor, features).unwrap();

    let standardizer = Standardizer::fit(raw.features.view()).unwrap();
    let standardized = raw
        .with_features(standardizer.transform(raw.features.view()).unwrap())
        .unwrap();

    (raw, standardized, standardizer)
}

fn errors_on(model: &LogisticRegression, dataset: &Dataset) -> usize {
    let predictions = model.predict(dataset.features.view()).unwrap();
    misclassifications(dataset.targets.view(), predictions.view()).unwrap()
}

#[test]
fn gradient_descent_separates_setosa_from_versicolor_by_sepals() {
    let (raw, standardized, standardizer) =
        setosa_versicolor(&[IrisFeature::SepalLength, IrisFeature::SepalWidth]);

    let solver = GradientDescent::new(GradientDescentConfig::default()).unwrap();
    let (model, report) = solver.fit_dataset(&standardized).unwrap();

    assert!(report.converged);
    assert!(errors_on(&model, &standardized) <= 1);

    // longer, narrower sepals point to versicolor
    assert!(model.coefficients()[0] > 0.0);
    assert!(model.coefficients()[1] < 0.0);

    let raw_model =
        LogisticRegression::new(standardizer.unscale_weights(model.weights.view()).unwrap());
    assert!(errors_on(&raw_model, &raw) <= 1);
}

#[test]
fn irls_reaches_the_gradient_descent_optimum_in_few_iterations() {
    let (_, standardized, _) =
        setosa_versicolor(&[IrisFeature::SepalLength, IrisFeature::SepalWidth]);

    let (descent, descent_report) = GradientDescent::new(GradientDescentConfig::default())
        .unwrap()
        .fit_dataset(&standardized)
        .unwrap();
    let (newton, newton_report) = Irls::new(IrlsConfig::default())
        .unwrap()
        .fit_dataset(&standardized)
        .unwrap();

    assert!(newton_report.converged);
    assert!(newton_report.iterations < 20);
    assert!(newton_report.iterations < descent_report.iterations);

    let expected = [0.27765, 2.70693, -2.24100];
    for ((a, b), e) in newton
        .weights
        .iter()
        .zip(descent.weights.iter())
        .zip(expected)
    {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        assert_abs_diff_eq!(*a, e, epsilon = 1e-4);
    }

    assert!(errors_on(&newton, &standardized) <= 1);
}

#[test]
fn petal_measurements_separate_perfectly() {
    let (_, standardized, _) =
        setosa_versicolor(&[IrisFeature::PetalLength, IrisFeature::PetalWidth]);

    for solver in [
        Box::new(GradientDescent::new(GradientDescentConfig::default()).unwrap())
            as Box<dyn LogisticSolver>,
        Box::new(Irls::new(IrlsConfig::default()).unwrap()),
    ] {
        let (model, report) = solver.fit_dataset(&standardized).unwrap();
        assert!(report.converged, "{}", solver.name());
        assert_eq!(errors_on(&model, &standardized), 0, "{}", solver.name());
    }
}

#[test]
fn standardization_does_not_change_the_unpenalized_optimum() {
    let samples = load_iris().unwrap();
    let raw = binary_subset(
        &samples,
        Species::Versicolor,
        Species::Virginica,
        &[IrisFeature::PetalLength, IrisFeature::PetalWidth],
    )
    .unwrap();
    let standardizer = Standardizer::fit(raw.features.view()).unwrap();
    let standardized = raw
        .with_features(standardizer.transform(raw.features.view()).unwrap())
        .unwrap();

    let solver = Irls::new(IrlsConfig {
        l2_penalty: 0.0,
        ..IrlsConfig::default()
    })
    .unwrap();

    let (on_raw, raw_report) = solver.fit_dataset(&raw).unwrap();
    let (on_standardized, _) = solver.fit_dataset(&standardized).unwrap();
    let unscaled = standardizer
        .unscale_weights(on_standardized.weights.view())
        .unwrap();

    assert!(raw_report.converged);
    for (a, b) in on_raw.weights.iter().zip(unscaled.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-6);
    }

    // maximum likelihood fit of virginica on petal length and width
    assert_abs_diff_eq!(on_raw.weights[0], -45.2723, epsilon = 1e-3);
    assert_abs_diff_eq!(on_raw.weights[1], 5.7545, epsilon = 1e-3);
    assert_abs_diff_eq!(on_raw.weights[2], 10.4467, epsilon = 1e-3);
    assert_eq!(errors_on(&on_raw, &raw), 6);
}
