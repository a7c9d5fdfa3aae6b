use stepwise_ml_core::columns::single_feature_regression;
use stepwise_ml_core::trace::{
    ChartPoint, LinearIntercept, LinearMeans, LinearSlope, Outcome, RSquared, RegressionEquation,
    SamplePrediction, SamplePredictions,
};
use stepwise_ml_core::{
    Algorithm, Dataset, Engine, Parameters, Step, StepDetail, Summary, TraceBuilder, TraceDocument,
    TraceError, TraceResult,
};
use stepwise_ml_stats::{finite, mean, r_squared, sum_of_products, sum_of_squares};
use tracing::{debug, info};

/// Rows shown in the sample-predictions step (those that exist).
pub const SAMPLE_INDICES: [usize; 5] = [0, 5, 10, 15, 20];

/// A least-squares line with the intermediate sums that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub x_mean: f64,
    pub y_mean: f64,
    pub numerator: f64,
    pub denominator: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Simple (one-feature) ordinary least squares.
///
/// `m = Σ(x−x̄)(y−ȳ) / Σ(x−x̄)²`, `c = ȳ − m·x̄`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegression;

impl LinearRegression {
    pub fn new() -> Self {
        LinearRegression
    }

    pub fn fit(&self, xs: &[f64], ys: &[f64]) -> TraceResult<LineFit> {
        if xs.len() < 2 {
            return Err(TraceError::InsufficientData {
                needed: 2,
                got: xs.len(),
            });
        }
        let x_mean = mean(xs)?;
        let y_mean = mean(ys)?;
        let numerator = sum_of_products(xs, ys)?;
        let denominator = sum_of_squares(xs)?;
        if denominator == 0.0 {
            return Err(TraceError::DegenerateInput(
                "cannot calculate slope: feature has zero variance".into(),
            ));
        }
        let slope = finite("slope", numerator / denominator)?;
        let intercept = finite("intercept", y_mean - slope * x_mean)?;
        Ok(LineFit {
            x_mean,
            y_mean,
            numerator,
            denominator,
            slope,
            intercept,
        })
    }
}

impl Engine for LinearRegression {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LinearRegression
    }

    fn run(&self, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument> {
        let (feature, target) = single_feature_regression(dataset, params)?;
        info!(algorithm = %self.algorithm(), rows = dataset.len(), %feature, %target, "running engine");

        let xs = dataset.numeric_column(&feature)?;
        let ys = dataset.numeric_column(&target)?;
        let n = xs.len();
        let fit = self.fit(&xs, &ys)?;
        debug!(slope = fit.slope, intercept = fit.intercept, "fitted line");

        let predicted: Vec<f64> = xs.iter().map(|&x| fit.predict(x)).collect();
        let r2 = r_squared(&ys, &predicted)?;
        let equation = format!("{target} = {:.3} × {feature} + {:.3}", fit.slope, fit.intercept);

        let mut trace = TraceBuilder::new();
        trace.push(
            Step::new(
                "Calculate Means",
                format!("Calculate mean of X ({feature}) and Y ({target})"),
                StepDetail::LinearMeans(LinearMeans {
                    feature: feature.clone(),
                    target: target.clone(),
                    x_mean: fit.x_mean,
                    y_mean: fit.y_mean,
                    n,
                }),
            )
            .formula("x̄ = Σx/n, ȳ = Σy/n")
            .calculation(format!("x̄ = {:.3}, ȳ = {:.3}", fit.x_mean, fit.y_mean)),
        );
        trace.push(
            Step::new(
                "Calculate Slope (m)",
                "Calculate the slope of the regression line",
                StepDetail::LinearSlope(LinearSlope {
                    numerator: fit.numerator,
                    denominator: fit.denominator,
                    slope: fit.slope,
                }),
            )
            .formula("m = Σ(x-x̄)(y-ȳ) / Σ(x-x̄)²")
            .calculation(format!(
                "m = {:.3} / {:.3} = {:.3}",
                fit.numerator, fit.denominator, fit.slope
            )),
        );
        trace.push(
            Step::new(
                "Calculate Intercept (c)",
                "Calculate the y-intercept of the regression line",
                StepDetail::LinearIntercept(LinearIntercept {
                    x_mean: fit.x_mean,
                    y_mean: fit.y_mean,
                    slope: fit.slope,
                    intercept: fit.intercept,
                }),
            )
            .formula("c = ȳ - m×x̄")
            .calculation(format!(
                "c = {:.3} - {:.3}×{:.3} = {:.3}",
                fit.y_mean, fit.slope, fit.x_mean, fit.intercept
            )),
        );
        trace.push(
            Step::new(
                "Regression Equation",
                "The final linear regression equation",
                StepDetail::RegressionEquation(RegressionEquation {
                    equation: equation.clone(),
                    slope: fit.slope,
                    intercept: fit.intercept,
                    tube_half_width: None,
                }),
            )
            .formula("y = mx + c")
            .calculation(equation.clone()),
        );

        let samples: Vec<SamplePrediction> = SAMPLE_INDICES
            .iter()
            .filter(|&&i| i < n)
            .map(|&i| SamplePrediction {
                index: i,
                x: xs[i],
                y_actual: ys[i],
                y_predicted: predicted[i],
            })
            .collect();
        let sample_calc = samples
            .iter()
            .map(|s| format!("{:.3} × {:.1} + {:.3} = {:.3}", fit.slope, s.x, fit.intercept, s.y_predicted))
            .collect::<Vec<_>>()
            .join("\n");
        trace.push(
            Step::new(
                "Sample Predictions",
                "Predictions for sample data points",
                StepDetail::SamplePredictions(SamplePredictions { samples }),
            )
            .formula("ŷ = m·x + c")
            .calculation(sample_calc),
        );

        let interpretation = format!(
            "The model explains {:.1}% of the variance in {target}",
            r2.r2 * 100.0
        );
        trace.push(
            Step::new(
                "Model Performance (R²)",
                "Coefficient of determination (R-squared)",
                StepDetail::RSquared(RSquared {
                    ss_res: r2.ss_res,
                    ss_tot: r2.ss_tot,
                    r2_score: r2.r2,
                    interpretation,
                }),
            )
            .formula("R² = 1 - (SS_res / SS_tot)")
            .calculation(format!(
                "R² = 1 - ({:.3} / {:.3}) = {:.3}",
                r2.ss_res, r2.ss_tot, r2.r2
            )),
        );

        let chart_data = xs
            .iter()
            .zip(&ys)
            .zip(&predicted)
            .enumerate()
            .map(|(index, ((&x, &y_actual), &y_predicted))| ChartPoint::Fit {
                index,
                x,
                y_actual,
                y_predicted,
            })
            .collect();

        info!(slope = fit.slope, intercept = fit.intercept, r2 = r2.r2, "linear regression finished");
        Ok(trace
            .finish(Summary {
                algorithm: self.algorithm(),
                dataset_size: n,
                features_used: vec![feature],
                target,
                outcome: Outcome::Fit {
                    slope: fit.slope,
                    intercept: fit.intercept,
                    equation,
                    r2_score: r2.r2,
                    support_vector_count: None,
                },
            })
            .with_chart_data(chart_data))
    }
}
