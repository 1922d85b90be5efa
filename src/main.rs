use clap::{Args, Parser, Subcommand, ValueEnum};
use statlearn::{
    dataset::{
        binary_subset, load_iris, parse_iris, regression_subset, synthetic_sparse_regression,
        Dataset, IrisFeature, IrisSample, Species, Standardizer,
    },
    gradient_descent::{GradientDescent, GradientDescentConfig},
    irls::{Irls, IrlsConfig},
    lasso::{lasso_path, Lasso, LassoConfig},
    least_squares::RidgeRegression,
    logistic::LogisticRegression,
    metrics::{accuracy, mean_squared_error, misclassifications, r_squared, ConfusionMatrix},
    plot::{plot_decision_boundary, plot_lasso_path, plot_loss_history},
    solver::LogisticSolver,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(version, about = "Logistic regression and the lasso on the iris data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Separate setosa from versicolor with logistic regression
    Logistic(LogisticArgs),
    /// Fit the lasso and trace its regularization path
    Lasso(LassoArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SolverKind {
    GradientDescent,
    Irls,
    Both,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeaturePair {
    Sepal,
    Petal,
}

impl FeaturePair {
    fn features(self) -> [IrisFeature; 2] {
        match self {
            FeaturePair::Sepal => [IrisFeature::SepalLength, IrisFeature::SepalWidth],
            FeaturePair::Petal => [IrisFeature::PetalLength, IrisFeature::PetalWidth],
        }
    }
}

#[derive(Debug, Args)]
struct LogisticArgs {
    #[arg(long, value_enum, default_value_t = SolverKind::Both)]
    solver: SolverKind,

    #[arg(long, value_enum, default_value_t = FeaturePair::Sepal)]
    features: FeaturePair,

    /// Iris csv with the bundled header; defaults to the bundled copy
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, default_value_t = GradientDescentConfig::default().learning_rate)]
    learning_rate: f64,

    /// Gradient descent stops once an update is shorter than this
    #[arg(long, default_value_t = GradientDescentConfig::default().tolerance)]
    tolerance: f64,

    #[arg(long, default_value_t = GradientDescentConfig::default().l2_penalty)]
    l2_penalty: f64,

    #[arg(long, default_value_t = GradientDescentConfig::default().max_iterations)]
    max_iterations: usize,

    /// Newton iterations stop once an update is shorter than this
    #[arg(long, default_value_t = IrlsConfig::default().tolerance)]
    irls_tolerance: f64,

    #[arg(long, default_value_t = IrlsConfig::default().max_iterations)]
    irls_max_iterations: usize,

    #[arg(long, default_value = "plots")]
    output_dir: PathBuf,

    #[arg(long)]
    no_plots: bool,
}

impl LogisticArgs {
    fn gradient_descent_config(&self) -> GradientDescentConfig {
        GradientDescentConfig {
            learning_rate: self.learning_rate,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            l2_penalty: self.l2_penalty,
        }
    }

    fn irls_config(&self) -> IrlsConfig {
        IrlsConfig {
            tolerance: self.irls_tolerance,
            max_iterations: self.irls_max_iterations,
            l2_penalty: self.l2_penalty,
            ..IrlsConfig::default()
        }
    }
}

#[derive(Debug, Args)]
struct LassoArgs {
    #[arg(long, default_value_t = LassoConfig::default().alpha)]
    alpha: f64,

    #[arg(long, default_value_t = 50)]
    n_alphas: usize,

    #[arg(long, default_value_t = 1e-3)]
    lambda_min_ratio: f64,

    /// Use a seeded synthetic sparse problem instead of iris petal width
    #[arg(long)]
    synthetic: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, default_value = "plots")]
    output_dir: PathBuf,

    #[arg(long)]
    no_plots: bool,
}

fn load_samples(data: Option<&Path>) -> statlearn::Result<Vec<IrisSample>> {
    match data {
        Some(path) => parse_iris(path),
        None => load_iris(),
    }
}

fn run_solver(
    solver: &dyn LogisticSolver,
    raw: &Dataset,
    standardized: &Dataset,
    standardizer: &Standardizer,
    args: &LogisticArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (model, report) = solver.fit_dataset(standardized)?;
    let model = LogisticRegression::new(standardizer.unscale_weights(model.weights.view())?);

    let predictions = model.predict(raw.features.view())?;
    let wrong = misclassifications(raw.targets.view(), predictions.view())?;
    let matrix = ConfusionMatrix::new(raw.targets.view(), predictions.view())?;

    println!(
        "{}: {} after {} iterations, loss {:.6}",
        solver.name(),
        if report.converged { "converged" } else { "not converged" },
        report.iterations,
        report.final_loss().unwrap_or(f64::NAN)
    );
    println!(
        "  weights (intercept first, raw scale): {:.4}",
        model.weights
    );
    println!(
        "  accuracy {:.3}%, {wrong} misclassified, {matrix:?}",
        accuracy(raw.targets.view(), predictions.view())? * 100.0
    );

    if !args.no_plots {
        let slug = solver.name().replace(' ', "_");
        plot_decision_boundary(
            args.output_dir.join(format!("{slug}_boundary.svg")),
            raw,
            &model,
            &format!("setosa vs versicolor ({})", solver.name()),
        )?;
        plot_loss_history(
            args.output_dir.join(format!("{slug}_loss.svg")),
            &report.loss_history,
            &format!("{} loss", solver.name()),
        )?;
    }

    Ok(())
}

fn logistic(args: &LogisticArgs) -> Result<(), Box<dyn std::error::Error>> {
    let samples = load_samples(args.data.as_deref())?;
    let raw = binary_subset(
        &samples,
        Species::Setosa,
        Species::Versicolor,
        &args.features.features(),
    )?;

    let standardizer = Standardizer::fit(raw.features.view())?;
    let standardized = raw.with_features(standardizer.transform(raw.features.view())?)?;

    if !args.no_plots {
        std::fs::create_dir_all(&args.output_dir)?;
    }

    if matches!(args.solver, SolverKind::GradientDescent | SolverKind::Both) {
        let solver = GradientDescent::new(args.gradient_descent_config())?;
        run_solver(&solver, &raw, &standardized, &standardizer, args)?;
    }

    if matches!(args.solver, SolverKind::Irls | SolverKind::Both) {
        let solver = Irls::new(args.irls_config())?;
        run_solver(&solver, &raw, &standardized, &standardizer, args)?;
    }

    Ok(())
}

fn lasso(args: &LassoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = if args.synthetic {
        const TRUE_COEFFICIENTS: [f64; 8] = [3.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 1.5];
        const SAMPLES: usize = 200;
        const NOISE: f64 = 0.5;

        synthetic_sparse_regression(SAMPLES, &TRUE_COEFFICIENTS, NOISE, args.seed)?
    } else {
        let samples = load_samples(args.data.as_deref())?;
        regression_subset(
            &samples,
            &[
                IrisFeature::SepalLength,
                IrisFeature::SepalWidth,
                IrisFeature::PetalLength,
            ],
            IrisFeature::PetalWidth,
        )?
    };

    let mut ols = RidgeRegression::ordinary();
    ols.fit(dataset.features.view(), dataset.targets.view())?;
    let ols_predictions = ols.predict(dataset.features.view())?;
    if let Some(weights) = ols.weights() {
        println!(
            "least squares: weights {:.4}, mse {:.5}",
            weights,
            mean_squared_error(dataset.targets.view(), ols_predictions.view())?
        );
    }

    let config = LassoConfig {
        alpha: args.alpha,
        ..LassoConfig::default()
    };
    let fit = Lasso::new(config)?.fit(dataset.features.view(), dataset.targets.view())?;
    let predictions = fit.predict(dataset.features.view())?;
    println!(
        "lasso alpha={}: intercept {:.4}, coefficients {:.4}, support {:?}, r2 {:.4}",
        args.alpha,
        fit.intercept,
        fit.coefficients,
        fit.support(),
        r_squared(dataset.targets.view(), predictions.view())?.unwrap_or(f64::NAN)
    );

    let path = lasso_path(
        dataset.features.view(),
        dataset.targets.view(),
        args.n_alphas,
        args.lambda_min_ratio,
        config,
    )?;

    for (alpha, count) in path.alphas.iter().zip(path.active_counts()) {
        log::debug!("alpha {alpha:.4e}: {count} active");
    }

    if !args.no_plots {
        std::fs::create_dir_all(&args.output_dir)?;
        plot_lasso_path(
            args.output_dir.join("lasso_path.svg"),
            &path,
            &dataset.feature_names,
        )?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Logistic(args) => logistic(args),
        Command::Lasso(args) => lasso(args),
    }
}
