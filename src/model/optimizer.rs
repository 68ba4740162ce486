//! Bounded Nelder–Mead simplex minimiser.
//!
//! Derivative-free, which suits the GARCH likelihood: the objective is cheap,
//! low-dimensional and returns `+inf` outside the admissible region.

use crate::core::error::{HedgingError, HedgingResult};

/// Per-coordinate box `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxConstraints {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BoxConstraints {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> HedgingResult<Self> {
        if lower.len() != upper.len() {
            return Err(HedgingError::model_fit(
                "lower and upper bounds have different dimensions",
            ));
        }
        if lower
            .iter()
            .zip(upper.iter())
            .any(|(lo, hi)| !lo.is_finite() || !hi.is_finite() || lo > hi)
        {
            return Err(HedgingError::model_fit("bounds must be finite with lower <= upper"));
        }
        Ok(Self { lower, upper })
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .map(|(v, (lo, hi))| v.clamp(*lo, *hi))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Initial simplex edge as a fraction of each coordinate's box width.
    pub initial_step: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    /// Relative tolerance on the spread of objective values.
    pub f_tolerance: f64,
    /// Absolute tolerance on the simplex diameter.
    pub x_tolerance: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            initial_step: 0.05,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            f_tolerance: 1e-10,
            x_tolerance: 1e-7,
        }
    }
}

/// Outcome of a minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimise `objective` inside `bounds` starting from `initial`.
///
/// Every trial point is clamped into the box. The search stops when both the
/// objective spread and the simplex diameter fall below tolerance, or when
/// the iteration cap is reached (`converged == false`).
pub fn nelder_mead<F>(
    initial: &[f64],
    bounds: &BoxConstraints,
    options: NelderMeadOptions,
    mut objective: F,
) -> HedgingResult<Minimum>
where
    F: FnMut(&[f64]) -> f64,
{
    let dim = bounds.dimension();
    if dim == 0 || initial.len() != dim {
        return Err(HedgingError::model_fit(format!(
            "initial point has {} coordinates, bounds have {}",
            initial.len(),
            dim
        )));
    }

    let mut evaluations = 0usize;
    let mut eval = |x: &[f64], evaluations: &mut usize| {
        *evaluations += 1;
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let x0 = bounds.clamp(initial);
    let mut simplex = Vec::with_capacity(dim + 1);
    let mut values = Vec::with_capacity(dim + 1);
    values.push(eval(&x0, &mut evaluations));
    simplex.push(x0.clone());

    for d in 0..dim {
        let mut x = x0.clone();
        let step = (bounds.upper[d] - bounds.lower[d]) * options.initial_step.max(1e-6);
        x[d] = (x[d] + step).min(bounds.upper[d]);
        if (x[d] - x0[d]).abs() < 1e-15 {
            x[d] = (x0[d] - step).max(bounds.lower[d]);
        }
        values.push(eval(&x, &mut evaluations));
        simplex.push(x);
    }

    let mut iterations = 0usize;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[dim];
        let diameter = simplex[1..]
            .iter()
            .map(|x| {
                x.iter()
                    .zip(simplex[0].iter())
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0_f64, f64::max)
            })
            .fold(0.0_f64, f64::max);

        if best.is_finite()
            && (worst - best).abs() <= options.f_tolerance * best.abs().max(1.0)
            && diameter <= options.x_tolerance
        {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..dim)
            .map(|d| simplex[..dim].iter().map(|x| x[d]).sum::<f64>() / dim as f64)
            .collect();
        let towards = |coef: f64, from: &[f64]| -> Vec<f64> {
            let x: Vec<f64> = (0..dim)
                .map(|d| centroid[d] + coef * (from[d] - centroid[d]))
                .collect();
            bounds.clamp(&x)
        };

        let xr = towards(-options.reflection, &simplex[dim]);
        let fr = eval(&xr, &mut evaluations);

        if fr < values[0] {
            let xe = towards(-options.reflection * options.expansion, &simplex[dim]);
            let fe = eval(&xe, &mut evaluations);
            if fe < fr {
                simplex[dim] = xe;
                values[dim] = fe;
            } else {
                simplex[dim] = xr;
                values[dim] = fr;
            }
            continue;
        }

        if fr < values[dim - 1] {
            simplex[dim] = xr;
            values[dim] = fr;
            continue;
        }

        // Outside contraction if the reflection helped a little, inside otherwise.
        let (xc, fc) = if fr < values[dim] {
            let xc = towards(-options.reflection * options.contraction, &simplex[dim]);
            let fc = eval(&xc, &mut evaluations);
            (xc, fc)
        } else {
            let xc = towards(options.contraction, &simplex[dim]);
            let fc = eval(&xc, &mut evaluations);
            (xc, fc)
        };

        if fc < values[dim].min(fr) {
            simplex[dim] = xc;
            values[dim] = fc;
            continue;
        }

        for i in 1..=dim {
            let shrunk: Vec<f64> = (0..dim)
                .map(|d| simplex[0][d] + options.shrink * (simplex[i][d] - simplex[0][d]))
                .collect();
            simplex[i] = bounds.clamp(&shrunk);
            values[i] = eval(&simplex[i], &mut evaluations);
        }
    }

    let best = (0..=dim)
        .min_by(|&i, &j| values[i].total_cmp(&values[j]))
        .unwrap_or(0);

    log::debug!(
        "nelder-mead finished after {} iterations ({} evaluations), converged={}, f={}",
        iterations,
        evaluations,
        converged,
        values[best]
    );

    Ok(Minimum {
        x: simplex[best].clone(),
        value: values[best],
        iterations,
        evaluations,
        converged,
    })
}
