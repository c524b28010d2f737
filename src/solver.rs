use std::{fmt::Display, str::FromStr};

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Stopping tolerance on the Euclidean norm of the step between sweeps.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Sweep budget shared by Gauss-Seidel and Jacobi.
pub const MAX_SWEEPS: usize = 1000;

/// Stationary relaxation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Updates components in place, so row `k` already sees the new values of rows `0..k`.
    #[default]
    GaussSeidel,
    /// Builds the next iterate purely from the previous one.
    Jacobi,
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gauss-seidel" | "gauss_seidel" | "seidel" => Ok(Method::GaussSeidel),
            "jacobi" => Ok(Method::Jacobi),
            other => Err(Error::InvalidArgument(format!(
                "unknown solver method '{}', expected 'gauss-seidel' or 'jacobi'",
                other
            ))),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::GaussSeidel => write!(f, "gauss-seidel"),
            Method::Jacobi => write!(f, "jacobi"),
        }
    }
}

/// Converged iterate together with how it was reached.
#[derive(Debug, Clone)]
pub struct Solution {
    pub x: DVector<f64>,
    /// Number of sweeps performed, including the final one.
    pub sweeps: usize,
    /// Norm of the difference between the last two iterates.
    pub step_norm: f64,
}

/// Iterative solver for square dense systems `A·x = b`.
///
/// Sweeps are repeated until the Euclidean norm of the change between two
/// successive iterates drops below `tolerance`. Running out of `max_sweeps`
/// is reported as [Error::NonConvergence], never as a partial result.
///
/// # Example
/// ```
/// use linalg_interp::{Method, Relaxation};
/// use nalgebra::{DMatrix, DVector};
///
/// let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
/// let b = DVector::from_vec(vec![1.0, 2.0]);
///
/// let solution = Relaxation::new(Method::Jacobi).solve(&a, &b, None).unwrap();
/// assert!((&a * &solution.x - &b).norm() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    method: Method,
    tolerance: f64,
    max_sweeps: usize,
}

impl Default for Relaxation {
    fn default() -> Self {
        Relaxation {
            method: Method::default(),
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: MAX_SWEEPS,
        }
    }
}

impl Relaxation {

    pub fn new(method: Method) -> Self {
        Relaxation { method, ..Default::default() }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }

    /// Solves for a single right-hand side. A missing `x0` starts from zero.
    pub fn solve(
        &self,
        a: &DMatrix<f64>,
        b: &DVector<f64>,
        x0: Option<&DVector<f64>>,
    ) -> Result<Solution> {
        self.check_settings()?;
        check_system(a, b.shape(), x0.map(|x0| x0.shape()))?;

        let x = x0.cloned().unwrap_or_else(|| DVector::zeros(b.len()));
        self.relax(a, b.clone(), x)
    }

    /// Solves `A·X = B` column by column. The result has the shape of `b`.
    pub fn solve_many(
        &self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        x0: Option<&DMatrix<f64>>,
    ) -> Result<DMatrix<f64>> {
        self.check_settings()?;
        check_system(a, b.shape(), x0.map(|x0| x0.shape()))?;

        let mut x = DMatrix::zeros(b.nrows(), b.ncols());
        for column in 0..b.ncols() {
            let guess = match x0 {
                Some(x0) => x0.column(column).into_owned(),
                None => DVector::zeros(b.nrows()),
            };
            let solution = self.relax(a, b.column(column).into_owned(), guess)?;
            x.set_column(column, &solution.x);
        }
        Ok(x)
    }

    /// Approximates `A^-1` by relaxing against every column of the identity.
    pub fn inverse(&self, a: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let identity = DMatrix::identity(a.nrows(), a.nrows());
        self.solve_many(a, &identity, None)
    }

    /// Validates the system and returns an unbounded iterator over its sweeps.
    /// Each item is the step norm of one sweep; the iterate itself is available
    /// through [Sweeps::current]. The sweep budget and tolerance do not apply.
    pub fn sweeps<'a>(
        &self,
        a: &'a DMatrix<f64>,
        b: &DVector<f64>,
        x0: Option<&DVector<f64>>,
    ) -> Result<Sweeps<'a>> {
        check_system(a, b.shape(), x0.map(|x0| x0.shape()))?;

        let x = x0.cloned().unwrap_or_else(|| DVector::zeros(b.len()));
        Ok(Sweeps::new(a, b.clone(), x, self.method))
    }

    fn relax(&self, a: &DMatrix<f64>, b: DVector<f64>, x: DVector<f64>) -> Result<Solution> {
        let mut sweeps = Sweeps::new(a, b, x, self.method);
        let mut step_norm = f64::INFINITY;

        while sweeps.performed() < self.max_sweeps {
            step_norm = sweeps.step();
            log::trace!(
                "{} sweep {}: step norm {:.3e}",
                self.method,
                sweeps.performed(),
                step_norm
            );

            if step_norm < self.tolerance {
                let count = sweeps.performed();
                log::debug!(
                    "{} converged after {} sweeps (step norm {:.3e})",
                    self.method,
                    count,
                    step_norm
                );
                return Ok(Solution { x: sweeps.into_current(), sweeps: count, step_norm });
            }
            if !step_norm.is_finite() {
                break;
            }
        }

        log::warn!(
            "{} stopped after {} sweeps with step norm {:.3e} (tolerance {:.3e})",
            self.method,
            sweeps.performed(),
            step_norm,
            self.tolerance
        );
        Err(Error::NonConvergence {
            sweeps: sweeps.performed(),
            step_norm,
            tolerance: self.tolerance,
        })
    }

    fn check_settings(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_sweeps == 0 {
            return Err(Error::InvalidArgument(
                "sweep budget must allow at least one sweep".to_string(),
            ));
        }
        Ok(())
    }
}

/// Solves `A·x = b` where `b` and `x0` are both `n×1` or both `n×k`.
///
/// `method` is `"gauss-seidel"` (also `"seidel"`) or `"jacobi"`; `None` selects
/// Gauss-Seidel. Runs at most [MAX_SWEEPS] sweeps per column.
///
/// # Example
/// ```
/// use linalg_interp::solve;
/// use nalgebra::DMatrix;
///
/// let a = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0]);
/// let b = DMatrix::from_column_slice(2, 1, &[9.0, 8.0]);
/// let x0 = DMatrix::zeros(2, 1);
///
/// let x = solve(&a, &b, &x0, 1e-10, Some("jacobi")).unwrap();
/// assert!((x[0] - 2.0).abs() < 1e-8);
/// assert!((x[1] - 3.0).abs() < 1e-8);
/// ```
pub fn solve(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    x0: &DMatrix<f64>,
    tolerance: f64,
    method: Option<&str>,
) -> Result<DMatrix<f64>> {
    let method = method.map(str::parse::<Method>).transpose()?.unwrap_or_default();
    Relaxation::new(method)
        .with_tolerance(tolerance)
        .solve_many(a, b, Some(x0))
}

/// Relaxation sweeps over one system, see [Relaxation::sweeps].
pub struct Sweeps<'a> {
    matrix: &'a DMatrix<f64>,
    rhs: DVector<f64>,
    current: DVector<f64>,
    // Jacobi writes the new iterate here and swaps it in once the sweep is done.
    next: DVector<f64>,
    method: Method,
    count: usize,
}

impl<'a> Sweeps<'a> {

    fn new(
        matrix: &'a DMatrix<f64>,
        rhs: DVector<f64>,
        current: DVector<f64>,
        method: Method,
    ) -> Self {
        let next = current.clone();
        Sweeps { matrix, rhs, current, next, method, count: 0 }
    }

    /// Performs one sweep and returns `||x_new - x_old||`.
    pub fn step(&mut self) -> f64 {
        let step_norm = match self.method {
            Method::GaussSeidel => gauss_seidel_sweep(self.matrix, &self.rhs, &mut self.current),
            Method::Jacobi => {
                let step_norm = jacobi_sweep(self.matrix, &self.rhs, &self.current, &mut self.next);
                std::mem::swap(&mut self.current, &mut self.next);
                step_norm
            }
        };
        self.count += 1;
        step_norm
    }

    pub fn current(&self) -> &DVector<f64> {
        &self.current
    }

    /// Number of sweeps performed so far.
    pub fn performed(&self) -> usize {
        self.count
    }

    pub fn into_current(self) -> DVector<f64> {
        self.current
    }
}

impl Iterator for Sweeps<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.step())
    }
}

fn gauss_seidel_sweep(a: &DMatrix<f64>, b: &DVector<f64>, x: &mut DVector<f64>) -> f64 {
    let n = b.len();
    let mut squared_step = 0.0;

    for k in 0..n {
        let mut sum = b[k];
        for j in 0..n {
            if j != k {
                sum -= a[(k, j)] * x[j];
            }
        }
        let updated = sum / a[(k, k)];
        squared_step += (updated - x[k]).powi(2);
        x[k] = updated;
    }
    squared_step.sqrt()
}

fn jacobi_sweep(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    x: &DVector<f64>,
    next: &mut DVector<f64>,
) -> f64 {
    let n = b.len();

    for k in 0..n {
        let mut sum = b[k];
        for j in 0..n {
            if j != k {
                sum -= a[(k, j)] * x[j];
            }
        }
        next[k] = sum / a[(k, k)];
    }
    (&*next - x).norm()
}

fn check_system(
    a: &DMatrix<f64>,
    b_shape: (usize, usize),
    x0_shape: Option<(usize, usize)>,
) -> Result<()> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::ShapeMismatch {
            what: "coefficient matrix A",
            expected: (n, n),
            actual: a.shape(),
        });
    }
    if let Some(x0_shape) = x0_shape {
        if x0_shape != b_shape {
            return Err(Error::ShapeMismatch {
                what: "initial guess x0",
                expected: b_shape,
                actual: x0_shape,
            });
        }
    }
    if b_shape.0 != n {
        return Err(Error::ShapeMismatch {
            what: "right-hand side b",
            expected: (n, b_shape.1),
            actual: b_shape,
        });
    }
    match (0..n).find(|&row| a[(row, row)] == 0.0) {
        Some(row) => Err(Error::ZeroPivot { row }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn tridiagonal_system() -> (DMatrix<f64>, DVector<f64>) {
        let a = DMatrix::from_row_slice(4, 4, &[
            4.0, -1.0, 0.0, 0.0,
            -1.0, 4.0, -1.0, 0.0,
            0.0, -1.0, 6.0, -1.0,
            0.0, 0.0, -1.0, 3.0,
        ]);
        let b = DVector::from_vec(vec![15.0, 10.0, 10.0, 10.0]);
        (a, b)
    }

    /// Strictly diagonally dominant by rows and by columns with a margin of
    /// more than two, so both methods contract the error in the 2-norm.
    fn random_dominant_matrix(rng: &mut StdRng, n: usize) -> DMatrix<f64> {
        let mut a = DMatrix::from_fn(n, n, |row, col| {
            if row == col { 0.0 } else { rng.gen_range(-1.0..1.0) }
        });
        let row_max = a.row_iter().map(|row| row.abs().sum()).fold(0.0, f64::max);
        let col_max = a.column_iter().map(|col| col.abs().sum()).fold(0.0, f64::max);
        let margin = 2.0 * row_max.max(col_max) + 1.0;
        for i in 0..n {
            a[(i, i)] = margin + rng.gen_range(0.0..1.0);
        }
        a
    }

    #[test]
    fn both_methods_match_direct_solve() {
        let eps = 1e-7;
        let (a, b) = tridiagonal_system();
        let x0 = DVector::zeros(4);
        let direct = a.clone().lu().solve(&b).unwrap();

        for method in [Method::GaussSeidel, Method::Jacobi] {
            let solution = Relaxation::new(method).solve(&a, &b, Some(&x0)).unwrap();

            assert!(solution.step_norm < DEFAULT_TOLERANCE);
            for i in 0..4 {
                assert_approx_eq!(solution.x[i], direct[i], eps);
            }
        }
    }

    #[test]
    fn gauss_seidel_needs_fewer_sweeps_than_jacobi() {
        let (a, b) = tridiagonal_system();

        let gauss_seidel = Relaxation::new(Method::GaussSeidel).solve(&a, &b, None).unwrap();
        let jacobi = Relaxation::new(Method::Jacobi).solve(&a, &b, None).unwrap();

        assert!(gauss_seidel.sweeps <= jacobi.sweeps);
    }

    #[test]
    fn first_sweep_uses_fresh_values_only_for_gauss_seidel() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![2.0, 2.0]);

        let mut jacobi = Relaxation::new(Method::Jacobi).sweeps(&a, &b, None).unwrap();
        jacobi.step();
        assert_eq!(&DVector::from_vec(vec![1.0, 1.0]), jacobi.current());

        let mut gauss_seidel = Relaxation::new(Method::GaussSeidel).sweeps(&a, &b, None).unwrap();
        gauss_seidel.step();
        assert_eq!(&DVector::from_vec(vec![1.0, 0.5]), gauss_seidel.current());
        assert_eq!(1, gauss_seidel.performed());
    }

    #[test]
    fn sweeps_as_iterator() {
        let (a, b) = tridiagonal_system();
        let mut sweeps = Relaxation::new(Method::Jacobi).sweeps(&a, &b, None).unwrap();

        let step_norms: Vec<f64> = sweeps.by_ref().take(5).collect();

        assert_eq!(5, step_norms.len());
        assert_eq!(5, sweeps.performed());
        assert!(step_norms.windows(2).all(|w| w[1] < w[0]));

        let mut manual = Relaxation::new(Method::Jacobi).sweeps(&a, &b, None).unwrap();
        for _ in 0..5 {
            manual.step();
        }
        assert_eq!(manual.current(), sweeps.current());
    }

    #[test]
    fn solve_reports_sweeps_performed() {
        let (a, b) = tridiagonal_system();
        let relaxation = Relaxation::new(Method::GaussSeidel);

        let solution = relaxation.solve(&a, &b, None).unwrap();

        let mut sweeps = relaxation.sweeps(&a, &b, None).unwrap();
        let steps_until_converged = sweeps
            .by_ref()
            .position(|step_norm| step_norm < DEFAULT_TOLERANCE)
            .unwrap()
            + 1;
        assert_eq!(steps_until_converged, solution.sweeps);
        assert_eq!(solution.sweeps, sweeps.performed());
        assert_eq!(&solution.x, sweeps.current());
    }

    #[test]
    fn random_dominant_systems_converge_monotonically() {
        let mut rng = StdRng::seed_from_u64(20);

        for _ in 0..25 {
            let n = rng.gen_range(2..9);
            let a = random_dominant_matrix(&mut rng, n);
            let exact = DVector::from_fn(n, |_, _| rng.gen_range(-10.0..10.0));
            let b = &a * &exact;

            for method in [Method::GaussSeidel, Method::Jacobi] {
                let relaxation = Relaxation::new(method).with_tolerance(1e-11);

                let mut sweeps = relaxation.sweeps(&a, &b, None).unwrap();
                let mut error = (sweeps.current() - &exact).norm();
                for _ in 0..30 {
                    sweeps.step();
                    let next_error = (sweeps.current() - &exact).norm();
                    assert!(next_error <= error + 1e-12, "{} error grew from {} to {}", method, error, next_error);
                    error = next_error;
                }

                let solution = relaxation.solve(&a, &b, None).unwrap();
                assert!((&solution.x - &exact).norm() < 1e-8);
            }
        }
    }

    #[test]
    fn inverse_of_dominant_matrix() {
        let (a, _) = tridiagonal_system();

        for method in [Method::GaussSeidel, Method::Jacobi] {
            let inverse = Relaxation::new(method).inverse(&a).unwrap();
            let residual = &a * &inverse - DMatrix::<f64>::identity(4, 4);

            assert_eq!((4, 4), inverse.shape());
            assert!(residual.norm() < 1e-6);
        }
    }

    #[test]
    fn solve_with_matrix_rhs_and_guess() {
        let (a, b) = tridiagonal_system();
        let b = DMatrix::from_columns(&[b.clone(), 2.0 * b]);
        let x0 = DMatrix::from_element(4, 2, 1.0);

        let x = solve(&a, &b, &x0, 1e-10, Some("jacobi")).unwrap();

        assert_eq!((4, 2), x.shape());
        for i in 0..4 {
            assert_approx_eq!(2.0 * x[(i, 0)], x[(i, 1)], 1e-8);
        }
        assert!((&a * &x - &b).norm() < 1e-7);
    }

    #[test]
    fn missing_method_defaults_to_gauss_seidel() {
        let (a, b) = tridiagonal_system();
        let b = DMatrix::from_column_slice(4, 1, b.as_slice());
        let x0 = DMatrix::zeros(4, 1);

        let default = solve(&a, &b, &x0, 1e-8, None).unwrap();
        let gauss_seidel = solve(&a, &b, &x0, 1e-8, Some("gauss-seidel")).unwrap();

        assert_eq!(default, gauss_seidel);
    }

    #[test]
    fn method_names() {
        assert_eq!(Ok(Method::GaussSeidel), "seidel".parse::<Method>());
        assert_eq!(Ok(Method::GaussSeidel), "Gauss-Seidel".parse::<Method>());
        assert_eq!(Ok(Method::Jacobi), " jacobi ".parse::<Method>());
        assert!(matches!("newton".parse::<Method>(), Err(Error::InvalidArgument(_))));
        assert_eq!("jacobi", Method::Jacobi.to_string());
    }

    #[test]
    fn unknown_method() {
        let (a, b) = tridiagonal_system();
        let b = DMatrix::from_column_slice(4, 1, b.as_slice());
        let x0 = DMatrix::zeros(4, 1);

        let result = solve(&a, &b, &x0, 1e-8, Some("conjugate-gradient"));

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn non_square_matrix() {
        let a = DMatrix::from_element(3, 2, 1.0);
        let b = DMatrix::zeros(3, 1);

        let result = solve(&a, &b, &b, 1e-8, None);

        assert_eq!(
            Err(Error::ShapeMismatch { what: "coefficient matrix A", expected: (3, 3), actual: (3, 2) }),
            result
        );
    }

    #[test]
    fn guess_shape_differs_from_rhs() {
        let (a, _) = tridiagonal_system();
        let b = DMatrix::zeros(4, 2);
        let x0 = DMatrix::zeros(4, 1);

        let result = solve(&a, &b, &x0, 1e-8, None);

        assert!(matches!(result, Err(Error::ShapeMismatch { what: "initial guess x0", .. })));
    }

    #[test]
    fn rhs_rows_differ_from_matrix() {
        let (a, _) = tridiagonal_system();
        let b = DVector::zeros(3);

        let result = Relaxation::default().solve(&a, &b, None);

        assert!(matches!(result, Err(Error::ShapeMismatch { what: "right-hand side b", .. })));
    }

    #[test]
    fn zero_on_diagonal() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 0.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);

        assert!(matches!(Relaxation::default().solve(&a, &b, None), Err(Error::ZeroPivot { row: 1 })));
    }

    #[test]
    fn invalid_settings() {
        let (a, b) = tridiagonal_system();

        let negative_tolerance = Relaxation::default().with_tolerance(-1.0).solve(&a, &b, None);
        let no_budget = Relaxation::default().with_max_sweeps(0).solve(&a, &b, None);

        assert!(matches!(negative_tolerance, Err(Error::InvalidArgument(_))));
        assert!(matches!(no_budget, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn budget_exhausted() {
        let (a, b) = tridiagonal_system();

        let result = Relaxation::new(Method::Jacobi).with_max_sweeps(3).solve(&a, &b, None);

        match result {
            Err(Error::NonConvergence { sweeps, step_norm, tolerance }) => {
                assert_eq!(3, sweeps);
                assert!(step_norm > tolerance);
            }
            other => panic!("expected non-convergence, got {:?}", other),
        }
    }

    #[test]
    fn diverging_system_is_reported() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 3.0, 1.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);

        for method in [Method::GaussSeidel, Method::Jacobi] {
            let result = Relaxation::new(method).solve(&a, &b, None);
            assert!(matches!(result, Err(Error::NonConvergence { .. })));
        }
    }

    #[test]
    fn defaults() {
        let relaxation = Relaxation::default();

        assert_eq!(Method::GaussSeidel, relaxation.method());
        assert_eq!(DEFAULT_TOLERANCE, relaxation.tolerance());
        assert_eq!(MAX_SWEEPS, relaxation.max_sweeps());
    }
}
