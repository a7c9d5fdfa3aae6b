use stepwise_ml_core::columns::single_feature_regression;
use stepwise_ml_core::params::defaults;
use stepwise_ml_core::trace::{
    ChartPoint, Outcome, RSquared, RegressionEquation, SvrHyperparameters, SvrIntercept,
    SvrObjective, SvrSlope, SvrStandardization, SvrSupportVectors, TubeResidual,
};
use stepwise_ml_core::{
    Algorithm, Dataset, Engine, Parameters, Step, StepDetail, Summary, TraceBuilder, TraceDocument,
    TraceError, TraceResult,
};
use stepwise_ml_stats::{finite, mean, r_squared, stddev};
use tracing::{debug, info, warn};

/// `(√5 − 1) / 2`
const INV_PHI: f64 = 0.618_033_988_749_894_9;
const MAX_ITER: usize = 200;
const TOL: f64 = 1e-12;

/// Linear ε-insensitive support vector regression on one feature.
///
/// Solves the primal `min ½w² + C·Σ max(0, |yᵢ − (w·xᵢ + b)| − ε)` in
/// standardized space. For a fixed `w` the best `b` is a median of the
/// shifted residuals, so the problem reduces to a 1-D convex search over `w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Svr {
    pub c: f64,
    pub epsilon: f64,
}

impl Default for Svr {
    fn default() -> Self {
        Svr {
            c: defaults::SVR_C,
            epsilon: defaults::SVR_EPSILON,
        }
    }
}

/// Optimum in standardized space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledSolution {
    pub w: f64,
    pub b: f64,
    pub objective: f64,
    pub iterations: usize,
}

impl Svr {
    pub fn new(c: f64, epsilon: f64) -> TraceResult<Self> {
        if !(c.is_finite() && c > 0.0) {
            return Err(TraceError::InvalidHyperparameter {
                name: "C",
                value: c,
                reason: "must be a positive number",
            });
        }
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(TraceError::InvalidHyperparameter {
                name: "epsilon",
                value: epsilon,
                reason: "must be zero or positive",
            });
        }
        Ok(Svr { c, epsilon })
    }

    pub fn from_params(params: &Parameters) -> TraceResult<Self> {
        Svr::new(
            params.c.unwrap_or(defaults::SVR_C),
            params.epsilon.unwrap_or(defaults::SVR_EPSILON),
        )
    }

    /// Best intercept for slope `w` and the ε-insensitive loss it leaves.
    ///
    /// `Σ max(0, |rᵢ − b| − ε)` equals `½Σ(|b − (rᵢ−ε)| + |b − (rᵢ+ε)|) − nε`,
    /// minimized anywhere between the n-th and (n+1)-th of the 2n shifted points.
    fn best_intercept(&self, w: f64, xs: &[f64], ys: &[f64]) -> (f64, f64) {
        let n = xs.len();
        let mut points: Vec<f64> = xs
            .iter()
            .zip(ys)
            .flat_map(|(x, y)| {
                let r = y - w * x;
                [r - self.epsilon, r + self.epsilon]
            })
            .collect();
        points.sort_by(f64::total_cmp);
        let b = if n == 0 { 0.0 } else { 0.5 * (points[n - 1] + points[n]) };
        let loss = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| ((y - w * x - b).abs() - self.epsilon).max(0.0))
            .sum();
        (b, loss)
    }

    /// `½w² + C·loss(w)` with the intercept optimized out.
    pub fn objective(&self, w: f64, xs: &[f64], ys: &[f64]) -> f64 {
        let (_, loss) = self.best_intercept(w, xs, ys);
        0.5 * w * w + self.c * loss
    }

    /// Golden-section search over `w`. The objective is convex in `w` and the
    /// optimum satisfies `½w² ≤ f(0)`, which bounds the bracket.
    pub fn fit_scaled(&self, xs: &[f64], ys: &[f64]) -> TraceResult<ScaledSolution> {
        if xs.len() != ys.len() {
            return Err(TraceError::DimensionMismatch {
                expected: xs.len(),
                got: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(TraceError::EmptyInput("Svr::fit_scaled".into()));
        }
        let f = |w: f64| self.objective(w, xs, ys);
        let bound = finite("objective bound", (2.0 * f(0.0)).sqrt())?;

        let (mut lo, mut hi) = (-bound, bound);
        let mut a = hi - INV_PHI * (hi - lo);
        let mut b = lo + INV_PHI * (hi - lo);
        let (mut fa, mut fb) = (f(a), f(b));
        let mut iterations = 0;
        while hi - lo > TOL && iterations < MAX_ITER {
            if fa <= fb {
                hi = b;
                b = a;
                fb = fa;
                a = hi - INV_PHI * (hi - lo);
                fa = f(a);
            } else {
                lo = a;
                a = b;
                fa = fb;
                b = lo + INV_PHI * (hi - lo);
                fb = f(b);
            }
            iterations += 1;
        }

        let w = finite("scaled slope", 0.5 * (lo + hi))?;
        let (b, loss) = self.best_intercept(w, xs, ys);
        debug!(w, b, iterations, "svr search converged");
        Ok(ScaledSolution {
            w,
            b: finite("scaled intercept", b)?,
            objective: finite("objective", 0.5 * w * w + self.c * loss)?,
            iterations,
        })
    }
}

fn standardize(values: &[f64], mu: f64, sigma: f64) -> Vec<f64> {
    values.iter().map(|v| (v - mu) / sigma).collect()
}

impl Engine for Svr {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Svr
    }

    /// `C` and `epsilon` from the parameters override the engine's own.
    fn run(&self, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument> {
        let svr = Svr::new(params.c.unwrap_or(self.c), params.epsilon.unwrap_or(self.epsilon))?;
        let (feature, target) = single_feature_regression(dataset, params)?;
        info!(algorithm = %self.algorithm(), rows = dataset.len(), %feature, %target, c = svr.c, epsilon = svr.epsilon, "running engine");

        let xs = dataset.numeric_column(&feature)?;
        let ys = dataset.numeric_column(&target)?;
        let n = xs.len();
        let (x_mean, x_std) = (mean(&xs)?, stddev(&xs)?);
        let (y_mean, mut y_std) = (mean(&ys)?, stddev(&ys)?);
        if x_std < f64::EPSILON {
            return Err(TraceError::DegenerateInput(format!(
                "feature '{feature}' has zero variance"
            )));
        }
        if y_std < f64::EPSILON {
            warn!(%target, "target is constant; using a scale of 1");
            y_std = 1.0;
        }

        let solution = svr.fit_scaled(&standardize(&xs, x_mean, x_std), &standardize(&ys, y_mean, y_std))?;
        let slope = finite("slope", solution.w * y_std / x_std)?;
        let intercept = finite("intercept", solution.b * y_std + y_mean - slope * x_mean)?;
        let unscaled_epsilon = svr.epsilon * y_std;

        let predicted: Vec<f64> = xs.iter().map(|x| slope * x + intercept).collect();
        let rows: Vec<TubeResidual> = xs
            .iter()
            .zip(&ys)
            .zip(&predicted)
            .enumerate()
            .map(|(index, ((&x, &y_actual), &y_predicted))| {
                let residual = y_actual - y_predicted;
                TubeResidual {
                    index,
                    x,
                    y_actual,
                    y_predicted,
                    residual,
                    is_support_vector: residual.abs() >= unscaled_epsilon,
                }
            })
            .collect();
        let support_vector_count = rows.iter().filter(|r| r.is_support_vector).count();
        let r2 = r_squared(&ys, &predicted)?;
        let equation = format!("{target} = {slope:.3} × {feature} + {intercept:.3}");

        let mut trace = TraceBuilder::new();
        trace.push(
            Step::new(
                "Set Hyperparameters (ε and C)",
                "SVR is controlled by two main parameters: Epsilon (ε) and C",
                StepDetail::SvrHyperparameters(SvrHyperparameters {
                    c: svr.c,
                    epsilon: svr.epsilon,
                    unscaled_epsilon,
                }),
            )
            .formula("ε = width of the insensitivity tube, C = penalty for points outside it")
            .calculation(format!(
                "Using ε = {:.3} (scaled), C = {:.3}. The unscaled tube width is ±{unscaled_epsilon:.3} from the regression line.",
                svr.epsilon, svr.c
            )),
        );
        trace.push(
            Step::new(
                "Data Scaling (Standardization)",
                format!("Standardize '{feature}' and '{target}' to zero mean and unit variance"),
                StepDetail::SvrStandardization(SvrStandardization {
                    x_mean,
                    x_std,
                    y_mean,
                    y_std,
                }),
            )
            .formula("z = (x - μ) / σ")
            .calculation(format!(
                "μx = {x_mean:.3}, σx = {x_std:.3}, μy = {y_mean:.3}, σy = {y_std:.3}"
            )),
        );
        trace.push(
            Step::new(
                "Find Optimal Line (Optimization)",
                "Find the flattest line that keeps as many points as possible inside the ε-tube",
                StepDetail::SvrObjective(SvrObjective {
                    objective_value: solution.objective,
                    scaled_slope: solution.w,
                    scaled_intercept: solution.b,
                    iterations: solution.iterations,
                }),
            )
            .formula("Minimize: ½||w||² + CΣ(ξᵢ + ξᵢ*)")
            .calculation(format!(
                "w' = {:.4}, b' = {:.4}, objective = {:.4} after {} iterations",
                solution.w, solution.b, solution.objective, solution.iterations
            )),
        );
        trace.push(
            Step::new(
                "Calculated Slope (w)",
                "Convert the standardized slope back to the original units",
                StepDetail::SvrSlope(SvrSlope {
                    scaled_slope: solution.w,
                    x_std,
                    y_std,
                    slope,
                }),
            )
            .formula("w = w' × σy / σx")
            .calculation(format!("w = {:.4} × {y_std:.3} / {x_std:.3} = {slope:.4}", solution.w)),
        );
        trace.push(
            Step::new(
                "Calculated Intercept (b)",
                "Convert the standardized intercept back to the original units",
                StepDetail::SvrIntercept(SvrIntercept {
                    scaled_intercept: solution.b,
                    y_std,
                    y_mean,
                    x_mean,
                    slope,
                    intercept,
                }),
            )
            .formula("b = b' × σy + μy - w × μx")
            .calculation(format!(
                "b = {:.4} × {y_std:.3} + {y_mean:.3} - {slope:.4} × {x_mean:.3} = {intercept:.4}",
                solution.b
            )),
        );
        trace.push(
            Step::new(
                "Final SVR Equation",
                format!("The tube is ±{unscaled_epsilon:.3} around this line"),
                StepDetail::RegressionEquation(RegressionEquation {
                    equation: equation.clone(),
                    slope,
                    intercept,
                    tube_half_width: Some(unscaled_epsilon),
                }),
            )
            .formula("y = w·x + b")
            .calculation(equation.clone()),
        );
        trace.push(
            Step::new(
                "Identify Support Vectors",
                "Points on or outside the tube boundary define the model",
                StepDetail::SvrSupportVectors(SvrSupportVectors {
                    unscaled_epsilon,
                    rows,
                    support_vector_count,
                    total_points: n,
                }),
            )
            .formula("support vector ⇔ |yᵢ - ŷᵢ| ≥ ε")
            .calculation(format!(
                "Found {support_vector_count} support vectors out of {n} total points."
            )),
        );
        trace.push(
            Step::new(
                "Model Performance (R²)",
                "Coefficient of determination on the original scale",
                StepDetail::RSquared(RSquared {
                    ss_res: r2.ss_res,
                    ss_tot: r2.ss_tot,
                    r2_score: r2.r2,
                    interpretation: format!(
                        "The model explains {:.1}% of the variance in {target}",
                        r2.r2 * 100.0
                    ),
                }),
            )
            .formula("R² = 1 - (SS_res / SS_tot)")
            .calculation(format!("R² = {:.3}", r2.r2)),
        );

        let chart_data = xs
            .iter()
            .zip(&ys)
            .zip(&predicted)
            .enumerate()
            .map(|(index, ((&x, &y_actual), &y_predicted))| ChartPoint::Tube {
                index,
                x,
                y_actual,
                y_predicted,
                upper_boundary: y_predicted + unscaled_epsilon,
                lower_boundary: y_predicted - unscaled_epsilon,
                is_support_vector: (y_actual - y_predicted).abs() >= unscaled_epsilon,
            })
            .collect();

        info!(slope, intercept, r2 = r2.r2, support_vector_count, "svr finished");
        Ok(trace
            .finish(Summary {
                algorithm: self.algorithm(),
                dataset_size: n,
                features_used: vec![feature],
                target,
                outcome: Outcome::Fit {
                    slope,
                    intercept,
                    equation,
                    r2_score: r2.r2,
                    support_vector_count: Some(support_vector_count),
                },
            })
            .with_chart_data(chart_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use stepwise_ml_core::Value;

    fn dataset(points: &[(f64, f64)]) -> Dataset {
        let rows = points
            .iter()
            .map(|&(x, y)| vec![Value::Number(x), Value::Number(y)])
            .collect();
        Dataset::new(vec!["x".into(), "y".into()], rows).unwrap()
    }

    fn line(n: usize) -> Vec<(f64, f64)> {
        (1..=n).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect()
    }

    fn support_vectors(doc: &TraceDocument) -> &SvrSupportVectors {
        match &doc.steps[6].detail {
            StepDetail::SvrSupportVectors(s) => s,
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_steps_and_line_fit() {
        let doc = Svr::default().run(&dataset(&line(10)), &Parameters::new()).unwrap();
        assert_eq!(doc.steps.len(), 8);
        assert!(doc.validate().is_ok());
        match &doc.summary.outcome {
            Outcome::Fit { slope, r2_score, support_vector_count, .. } => {
                assert!(*slope > 1.5 && *slope <= 2.0 + 1e-9);
                assert!(*r2_score > 0.95);
                assert!(support_vector_count.is_some());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(doc.chart_data.len(), 10);
    }

    #[test]
    fn test_support_vector_flag_matches_tube() {
        let mut points = line(10);
        points[9].1 = 60.0;
        let doc = Svr::default().run(&dataset(&points), &Parameters::new()).unwrap();
        let sv = support_vectors(&doc);
        for row in &sv.rows {
            assert_eq!(row.is_support_vector, row.residual.abs() >= sv.unscaled_epsilon);
        }
        assert!(sv.rows[9].is_support_vector);
        assert_eq!(sv.support_vector_count, sv.rows.iter().filter(|r| r.is_support_vector).count());
        assert_eq!(sv.total_points, 10);
    }

    #[test]
    fn test_wide_tube_gives_flat_line() {
        let p = Parameters::new().with_epsilon(5.0);
        let doc = Svr::default().run(&dataset(&line(10)), &p).unwrap();
        match &doc.summary.outcome {
            Outcome::Fit { slope, intercept, support_vector_count, .. } => {
                assert_abs_diff_eq!(*slope, 0.0);
                assert_abs_diff_eq!(*intercept, 12.0, epsilon = 1e-9);
                assert_eq!(*support_vector_count, Some(0));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_search_reaches_minimum() {
        let svr = Svr::new(2.0, 0.2).unwrap();
        let xs = [-1.5, -0.5, 0.1, 0.7, 1.2];
        let ys = [-1.2, -0.8, 0.3, 0.4, 1.3];
        let s = svr.fit_scaled(&xs, &ys).unwrap();
        for dw in [-1e-3, 1e-3, -1e-1, 1e-1] {
            assert!(s.objective <= svr.objective(s.w + dw, &xs, &ys) + 1e-9);
        }
        assert!(s.iterations > 0 && s.iterations <= MAX_ITER);
    }

    #[test]
    fn test_invalid_hyperparameters() {
        let ds = dataset(&line(5));
        for p in [
            Parameters::new().with_c(0.0),
            Parameters::new().with_c(-1.0),
            Parameters::new().with_epsilon(-0.1),
        ] {
            assert!(matches!(
                Svr::default().run(&ds, &p),
                Err(TraceError::InvalidHyperparameter { .. })
            ));
        }
        assert!(Svr::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn test_zero_variance_feature() {
        let ds = dataset(&[(3.0, 1.0), (3.0, 2.0), (3.0, 4.0)]);
        assert!(matches!(
            Svr::default().run(&ds, &Parameters::new()),
            Err(TraceError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_constant_target() {
        let ds = dataset(&[(1.0, 4.0), (2.0, 4.0), (3.0, 4.0)]);
        let doc = Svr::default().run(&ds, &Parameters::new()).unwrap();
        match &doc.summary.outcome {
            Outcome::Fit { slope, intercept, .. } => {
                assert_abs_diff_eq!(*slope, 0.0);
                assert_abs_diff_eq!(*intercept, 4.0, epsilon = 1e-9);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
