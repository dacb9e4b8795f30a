//! One-dimensional root finders shared by the state and saturation solvers
//! and by the correlations built on top of them.
use crate::errors::{MeosError, MeosResult};

const MAX_ITER_NEWTON: usize = 50;
const RTOL_NEWTON: f64 = 1e-10;
const MAX_ITER_SECANT: usize = 100;

/// Damped Newton iteration for a scalar unknown.
///
/// `f` returns the residual, its derivative and an arbitrary payload
/// (usually the state evaluated at `x`). Steps are limited to `bounds`.
/// The iteration converges once the Newton step is below the tolerance;
/// an iterate that is pushed against a bound by every step fails with
/// [`MeosError::IterationFailed`].
pub fn newton<S, F>(
    solver: &str,
    mut x0: f64,
    mut f: F,
    atol: f64,
    bounds: [f64; 2],
) -> MeosResult<(f64, S)>
where
    F: FnMut(f64) -> MeosResult<(f64, f64, S)>,
{
    let [lower, upper] = bounds;
    for _ in 0..MAX_ITER_NEWTON {
        let (fx, dfx, payload) = f(x0)?;
        let step = fx / dfx;
        if !step.is_finite() {
            return Err(MeosError::IterationFailed(solver.to_owned()));
        }
        let tol = atol + RTOL_NEWTON * x0.abs();
        if step.abs() <= tol {
            return Ok((x0, payload));
        }
        // keep the iterate inside the bounds by halving the distance to them
        let mut x = x0 - step;
        if x < lower {
            x = 0.5 * (x0 + lower);
        } else if x > upper {
            x = 0.5 * (x0 + upper);
        }
        if (x - x0).abs() <= tol {
            return Err(MeosError::IterationFailed(format!(
                "{solver}: no root within [{lower}, {upper}] (iterate at {x0})"
            )));
        }
        x0 = x;
    }
    Err(MeosError::not_converged(solver, MAX_ITER_NEWTON, x0))
}

/// The sign of a residual for bracket logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Positive,
    Negative,
}

impl Sign {
    fn of(value: f64) -> Self {
        if value >= 0.0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

/// An interval with a sign change of the residual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bracket {
    left: f64,
    right: f64,
    f_left: f64,
    f_right: f64,
}

impl Bracket {
    /// Evaluate the residual at both ends and check for a sign change.
    pub(crate) fn new<F>(solver: &str, bounds: [f64; 2], f: &mut F) -> MeosResult<Self>
    where
        F: FnMut(f64) -> MeosResult<f64>,
    {
        let [a, b] = bounds;
        if !a.is_finite() || !b.is_finite() || a == b {
            return Err(MeosError::IterationFailed(format!(
                "{solver}: invalid bracket [{a}, {b}]"
            )));
        }
        let (left, right) = if a < b { (a, b) } else { (b, a) };
        let f_left = f(left)?;
        let f_right = f(right)?;
        if Sign::of(f_left) == Sign::of(f_right) {
            return Err(MeosError::IterationFailed(format!(
                "{solver}: no sign change in [{left}, {right}]"
            )));
        }
        Ok(Self {
            left,
            right,
            f_left,
            f_right,
        })
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn shrink(&mut self, x: f64, fx: f64) {
        if Sign::of(self.f_left) == Sign::of(fx) {
            self.left = x;
            self.f_left = fx;
        } else {
            self.right = x;
            self.f_right = fx;
        }
    }
}

/// Secant iteration safeguarded by a bracket (Illinois variant of regula falsi).
///
/// The bracket is validated first and only shrinks afterwards,
/// so the iteration cannot leave the interval.
pub fn bracketed_secant<F>(
    solver: &str,
    mut f: F,
    bounds: [f64; 2],
    xtol: f64,
) -> MeosResult<f64>
where
    F: FnMut(f64) -> MeosResult<f64>,
{
    let mut bracket = Bracket::new(solver, bounds, &mut f)?;
    let mut last_replaced_left = None;
    let mut x_old = f64::NAN;
    for _ in 0..MAX_ITER_SECANT {
        let Bracket {
            left,
            right,
            f_left,
            f_right,
        } = bracket;
        let mut x = right - f_right * (right - left) / (f_right - f_left);
        if !(x > left && x < right) {
            x = 0.5 * (left + right);
        }
        let fx = f(x)?;
        let tol = xtol * (1.0 + x.abs());
        if fx == 0.0 || bracket.width() <= tol || (x - x_old).abs() <= tol {
            return Ok(x);
        }
        let replaced_left = Sign::of(fx) == Sign::of(f_left);
        bracket.shrink(x, fx);
        // halve the residual of an endpoint that is retained twice in a row
        if last_replaced_left == Some(replaced_left) {
            if replaced_left {
                bracket.f_right *= 0.5;
            } else {
                bracket.f_left *= 0.5;
            }
        }
        last_replaced_left = Some(replaced_left);
        x_old = x;
    }
    let x = 0.5 * (bracket.left + bracket.right);
    Err(MeosError::not_converged(solver, MAX_ITER_SECANT, x))
}

/// Scan `grid` for sign changes of `f` and return the enclosing intervals.
///
/// Points at which `f` fails are skipped.
pub fn find_brackets<F>(grid: &[f64], mut f: F) -> Vec<[f64; 2]>
where
    F: FnMut(f64) -> MeosResult<f64>,
{
    let values: Vec<_> = grid
        .iter()
        .filter_map(|&x| f(x).ok().filter(|fx| fx.is_finite()).map(|fx| (x, fx)))
        .collect();
    values
        .windows(2)
        .filter(|w| Sign::of(w[0].1) != Sign::of(w[1].1))
        .map(|w| [w[0].0, w[1].0])
        .collect()
}

/// Logarithmically spaced grid between `start` and `end` (both included).
pub fn geomspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let (ln_start, ln_end) = (start.ln(), end.ln());
    (0..n)
        .map(|i| (ln_start + (ln_end - ln_start) * i as f64 / (n - 1) as f64).exp())
        .collect()
}
