use csv::ReaderBuilder;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

const IRIS_CSV: &str = include_str!("../data/iris.csv");

pub const IRIS_FEATURES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Setosa,
    Versicolor,
    Virginica,
}

impl Species {
    pub fn name(self) -> &'static str {
        match self {
            Species::Setosa => "setosa",
            Species::Versicolor => "versicolor",
            Species::Virginica => "virginica",
        }
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(species: &str) -> Result<Self> {
        match species.trim() {
            "setosa" | "Iris-setosa" => Ok(Species::Setosa),
            "versicolor" | "Iris-versicolor" => Ok(Species::Versicolor),
            "virginica" | "Iris-virginica" => Ok(Species::Virginica),
            val => Err(Error::UnknownSpecies(val.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrisFeature {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl IrisFeature {
    pub const ALL: [Self; IRIS_FEATURES] = [
        IrisFeature::SepalLength,
        IrisFeature::SepalWidth,
        IrisFeature::PetalLength,
        IrisFeature::PetalWidth,
    ];

    /// Position of the measurement in the csv record and in [`IrisSample::measurements`].
    pub fn index(self) -> usize {
        match self {
            IrisFeature::SepalLength => 0,
            IrisFeature::SepalWidth => 1,
            IrisFeature::PetalLength => 2,
            IrisFeature::PetalWidth => 3,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            IrisFeature::SepalLength => "sepal_length",
            IrisFeature::SepalWidth => "sepal_width",
            IrisFeature::PetalLength => "petal_length",
            IrisFeature::PetalWidth => "petal_width",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IrisFeature::SepalLength => "sepal length (cm)",
            IrisFeature::SepalWidth => "sepal width (cm)",
            IrisFeature::PetalLength => "petal length (cm)",
            IrisFeature::PetalWidth => "petal width (cm)",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IrisSample {
    pub measurements: [f64; IRIS_FEATURES],
    pub species: Species,
}

impl IrisSample {
    pub fn get(&self, feature: IrisFeature) -> f64 {
        self.measurements[feature.index()]
    }
}

/// The 150 Fisher iris measurements bundled with the crate.
pub fn load_iris() -> Result<Vec<IrisSample>> {
    read_iris(IRIS_CSV.as_bytes())
}

pub fn parse_iris(file_path: impl AsRef<Path>) -> Result<Vec<IrisSample>> {
    let file = File::open(file_path)?;

    read_iris(BufReader::new(file))
}

fn read_iris<R: Read>(source: R) -> Result<Vec<IrisSample>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);

    let mut samples = Vec::new();

    for result in reader.records() {
        const SPECIES_FIELD_INDEX: usize = IRIS_FEATURES;

        let record = result?;

        if record.len() != IRIS_FEATURES + 1 {
            return Err(Error::DimensionMismatch {
                expected: IRIS_FEATURES + 1,
                actual: record.len(),
            });
        }

        let mut measurements = [0.0; IRIS_FEATURES];
        for (feature, value) in IrisFeature::ALL.iter().zip(record.iter()) {
            measurements[feature.index()] =
                value.trim().parse::<f64>().map_err(|_| Error::InvalidValue {
                    column: feature.column(),
                    value: value.to_string(),
                })?;
        }

        let species = record[SPECIES_FIELD_INDEX].parse()?;

        samples.push(IrisSample {
            measurements,
            species,
        });
    }

    log::debug!("parsed {} iris samples", samples.len());

    Ok(samples)
}

/// Feature matrix with an aligned target vector.
///
/// For classification the targets are `0.0`/`1.0` and `classes` holds the
/// (negative, positive) species; for regression `classes` is `None`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub targets: Array1<f64>,
    pub feature_names: Vec<String>,
    pub classes: Option<[Species; 2]>,
}

impl Dataset {
    pub fn new(
        features: Array2<f64>,
        targets: Array1<f64>,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if features.nrows() != targets.len() {
            return Err(Error::DimensionMismatch {
                expected: features.nrows(),
                actual: targets.len(),
            });
        }
        if features.ncols() != feature_names.len() {
            return Err(Error::DimensionMismatch {
                expected: features.ncols(),
                actual: feature_names.len(),
            });
        }

        Ok(Self {
            features,
            targets,
            feature_names,
            classes: None,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Same targets and names, different (e.g. standardized) features.
    pub fn with_features(&self, features: Array2<f64>) -> Result<Self> {
        let mut dataset = Self::new(
            features,
            self.targets.clone(),
            self.feature_names.clone(),
        )?;
        dataset.classes = self.classes;

        Ok(dataset)
    }
}

fn selected_columns(samples: &[&IrisSample], features: &[IrisFeature]) -> Array2<f64> {
    Array2::from_shape_fn((samples.len(), features.len()), |(i, j)| {
        samples[i].get(features[j])
    })
}

fn feature_names(features: &[IrisFeature]) -> Vec<String> {
    features.iter().map(|f| f.label().to_string()).collect()
}

/// Two-class dataset: rows of `negative` get target 0, rows of `positive` get target 1.
pub fn binary_subset(
    samples: &[IrisSample],
    negative: Species,
    positive: Species,
    features: &[IrisFeature],
) -> Result<Dataset> {
    if negative == positive {
        return Err(Error::InvalidInput(format!(
            "both classes are {}",
            negative.name()
        )));
    }
    if features.is_empty() {
        return Err(Error::InvalidInput("no features selected".to_string()));
    }

    let selected: Vec<&IrisSample> = samples
        .iter()
        .filter(|s| s.species == negative || s.species == positive)
        .collect();

    for class in [negative, positive] {
        if !selected.iter().any(|s| s.species == class) {
            return Err(Error::InvalidInput(format!(
                "no samples of class {}",
                class.name()
            )));
        }
    }

    let targets = selected
        .iter()
        .map(|s| if s.species == positive { 1.0 } else { 0.0 })
        .collect::<Array1<f64>>();

    let mut dataset = Dataset::new(
        selected_columns(&selected, features),
        targets,
        feature_names(features),
    )?;
    dataset.classes = Some([negative, positive]);

    Ok(dataset)
}

/// Regress `response` on `inputs` over every sample.
pub fn regression_subset(
    samples: &[IrisSample],
    inputs: &[IrisFeature],
    response: IrisFeature,
) -> Result<Dataset> {
    if inputs.is_empty() {
        return Err(Error::InvalidInput("no features selected".to_string()));
    }
    if inputs.contains(&response) {
        return Err(Error::InvalidInput(format!(
            "{} is both an input and the response",
            response.column()
        )));
    }

    let all: Vec<&IrisSample> = samples.iter().collect();
    let targets = all.iter().map(|s| s.get(response)).collect::<Array1<f64>>();

    Dataset::new(selected_columns(&all, inputs), targets, feature_names(inputs))
}

/// Gaussian design `X ~ N(0, 1)` with `y = X * coefficients + N(0, noise_std^2)`.
pub fn synthetic_sparse_regression(
    n_samples: usize,
    coefficients: &[f64],
    noise_std: f64,
    seed: u64,
) -> Result<Dataset> {
    let standard = Normal::new(0.0, 1.0).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let noise = Normal::new(0.0, noise_std).map_err(|e| Error::InvalidInput(e.to_string()))?;

    let mut rng = StdRng::seed_from_u64(seed);

    let features = Array2::from_shape_fn((n_samples, coefficients.len()), |_| {
        standard.sample(&mut rng)
    });
    let coefficients = ArrayView1::from(coefficients);
    let noise = Array1::from_shape_fn(n_samples, |_| noise.sample(&mut rng));
    let targets = features.dot(&coefficients) + noise;

    let names = (0..coefficients.len()).map(|j| format!("x{j}")).collect();

    Dataset::new(features, targets, names)
}

/// Prepends the intercept column of ones.
pub fn design_matrix(features: ArrayView2<f64>) -> Array2<f64> {
    let mut design = Array2::ones((features.nrows(), features.ncols() + 1));
    design.slice_mut(s![.., 1..]).assign(&features);

    design
}

/// Per-column z-score normalization.
#[derive(Debug, Clone)]
pub struct Standardizer {
    pub means: Array1<f64>,
    pub std_devs: Array1<f64>,
}

impl Standardizer {
    pub fn fit(features: ArrayView2<f64>) -> Result<Self> {
        let means = features
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InvalidInput("cannot standardize zero samples".to_string()))?;
        let std_devs = features.std_axis(Axis(0), 0.0);

        if let Some(index) = std_devs.iter().position(|&s| s <= f64::EPSILON) {
            return Err(Error::ZeroVariance(index));
        }

        Ok(Self { means, std_devs })
    }

    pub fn transform(&self, features: ArrayView2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.means.len() {
            return Err(Error::DimensionMismatch {
                expected: self.means.len(),
                actual: features.ncols(),
            });
        }

        Ok((&features - &self.means) / &self.std_devs)
    }

    /// Maps intercept-first weights fitted on standardized features back to
    /// the raw feature scale, so that `w_raw . [1, x] == w . [1, (x - mean) / std]`.
    pub fn unscale_weights(&self, weights: ArrayView1<f64>) -> Result<Array1<f64>> {
        if weights.len() != self.means.len() + 1 {
            return Err(Error::DimensionMismatch {
                expected: self.means.len() + 1,
                actual: weights.len(),
            });
        }

        let slopes = &weights.slice(s![1..]) / &self.std_devs;
        let intercept = weights[0] - slopes.dot(&self.means);

        let mut raw = Array1::zeros(weights.len());
        raw[0] = intercept;
        raw.slice_mut(s![1..]).assign(&slopes);

        Ok(raw)
    }
}
