use ndarray::ArrayView1;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::lasso::LassoPath;
use crate::logistic::LogisticRegression;

const SIZE: (u32, u32) = (900, 650);
const BOUNDARY_POINTS: usize = 200;

fn plot_error<E: std::fmt::Display>(error: E) -> Error {
    Error::Plot(error.to_string())
}

fn padded_range(values: ArrayView1<f64>) -> Range<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });

    let padding = if max > min { 0.05 * (max - min) } else { 1.0 };

    (min - padding)..(max + padding)
}

/// Scatter of both classes with the `p = 0.5` line of a two-feature model.
pub fn plot_decision_boundary(
    file_path: impl AsRef<Path>,
    dataset: &Dataset,
    model: &LogisticRegression,
    caption: &str,
) -> Result<()> {
    if dataset.n_features() != 2 || model.n_features() != 2 {
        return Err(Error::InvalidInput(
            "decision boundaries are drawn for two features only".to_string(),
        ));
    }
    if dataset.n_samples() == 0 {
        return Err(Error::InvalidInput("nothing to plot".to_string()));
    }

    let x_range = padded_range(dataset.features.column(0));
    let y_range = padded_range(dataset.features.column(1));

    let root = SVGBackend::new(file_path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(20)
        .set_all_label_area_size(50)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(dataset.feature_names[0].as_str())
        .y_desc(dataset.feature_names[1].as_str())
        .draw()
        .map_err(plot_error)?;

    let [negative_name, positive_name] = dataset
        .classes
        .map_or(["class 0", "class 1"], |[negative, positive]| {
            [negative.name(), positive.name()]
        });

    for (positive, color, name) in [
        (false, BLUE, negative_name),
        (true, RED, positive_name),
    ] {
        let points = dataset
            .features
            .rows()
            .into_iter()
            .zip(dataset.targets.iter())
            .filter(|(_, &target)| (target > 0.5) == positive)
            .map(|(row, _)| Circle::new((row[0], row[1]), 4, color.filled()));

        chart
            .draw_series(points)
            .map_err(plot_error)?
            .label(name)
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    let step = (x_range.end - x_range.start) / (BOUNDARY_POINTS - 1) as f64;
    let boundary = (0..BOUNDARY_POINTS)
        .map(|i| x_range.start + step * i as f64)
        .filter_map(|x1| model.decision_boundary(x1).map(|x2| (x1, x2)))
        .filter(|(_, x2)| y_range.contains(x2));

    chart
        .draw_series(LineSeries::new(boundary, BLACK.stroke_width(2)))
        .map_err(plot_error)?
        .label("p = 0.5")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    log::info!("wrote {}", file_path.as_ref().display());

    Ok(())
}

/// Loss per iteration on a logarithmic axis.
pub fn plot_loss_history(file_path: impl AsRef<Path>, losses: &[f64], caption: &str) -> Result<()> {
    if losses.is_empty() || losses.iter().any(|&l| !l.is_finite() || l <= 0.0) {
        return Err(Error::InvalidInput(
            "loss history must be non-empty and strictly positive".to_string(),
        ));
    }

    let min_loss = losses.iter().copied().fold(f64::INFINITY, f64::min);
    let max_loss = losses.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let root = SVGBackend::new(file_path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(30)
        .set_all_label_area_size(70)
        .build_cartesian_2d(
            0..losses.len(),
            (0.9 * min_loss..1.1 * max_loss).log_scale(),
        )
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_labels(10)
        .x_desc("Iteration")
        .y_labels(10)
        .y_desc("Cross-entropy")
        .y_label_formatter(&|y| format!("{y:.1e}"))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(
            losses.iter().enumerate().map(|(i, &l)| (i, l)),
            BLUE.stroke_width(2),
        ))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    log::info!("wrote {}", file_path.as_ref().display());

    Ok(())
}

/// Coefficient traces against `log10(alpha)`.
pub fn plot_lasso_path(
    file_path: impl AsRef<Path>,
    path: &LassoPath,
    feature_names: &[String],
) -> Result<()> {
    if feature_names.len() != path.coefficients.ncols() {
        return Err(Error::DimensionMismatch {
            expected: path.coefficients.ncols(),
            actual: feature_names.len(),
        });
    }
    if path.alphas.is_empty() {
        return Err(Error::InvalidInput("empty lasso path".to_string()));
    }

    let log_alphas = path.alphas.mapv(f64::log10);
    let x_range = padded_range(log_alphas.view());
    let flat = path.coefficients.iter().copied().collect::<ndarray::Array1<f64>>();
    let y_range = padded_range(flat.view());

    let root = SVGBackend::new(file_path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Lasso path", ("sans-serif", 24))
        .margin(20)
        .set_all_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("log10(alpha)")
        .y_desc("coefficient")
        .draw()
        .map_err(plot_error)?;

    for (j, name) in feature_names.iter().enumerate() {
        let color = Palette99::pick(j).mix(1.0);
        let column = path.coefficients.column(j);
        let trace = log_alphas
            .iter()
            .zip(column.iter())
            .map(|(&x, &c)| (x, c));

        chart
            .draw_series(LineSeries::new(trace, color.stroke_width(2)))
            .map_err(plot_error)?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    log::info!("wrote {}", file_path.as_ref().display());

    Ok(())
}
