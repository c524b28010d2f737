use std::fmt::Display;

use nalgebra::DVector;

use crate::{
    error::{Error, Result},
    polynomial::Polynomial,
    tridiagonal::Tridiagonal,
};

/// Degree of the spline pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Straight lines between neighbouring samples.
    Linear = 1,
    /// C¹ piecewise parabola, the first segment is a straight line.
    Quadratic = 2,
    /// C² natural cubic spline, zero curvature at both ends.
    #[default]
    Cubic = 3,
}

impl Order {
    /// Minimal number of samples the order can be built from.
    pub fn min_samples(self) -> usize {
        match self {
            Order::Linear => 2,
            Order::Quadratic | Order::Cubic => 3,
        }
    }
}

impl TryFrom<usize> for Order {
    type Error = Error;

    fn try_from(order: usize) -> Result<Self> {
        match order {
            1 => Ok(Order::Linear),
            2 => Ok(Order::Quadratic),
            3 => Ok(Order::Cubic),
            other => Err(Error::InvalidArgument(format!(
                "spline order must be 1, 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Linear => write!(f, "linear"),
            Order::Quadratic => write!(f, "quadratic"),
            Order::Cubic => write!(f, "cubic"),
        }
    }
}

/// Interpolating spline through sample points `(xd[i], yd[i])`.
///
/// Coefficients are computed once in [Spline::new] and never change, so a
/// spline can be shared between threads and evaluated concurrently.
/// Queries outside `[xd[0], xd[n]]` fail, there is no extrapolation.
#[derive(Debug, Clone)]
pub struct Spline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    polynomials: Vec<Polynomial>,
    order: Order,
    min_x: f64,
    max_x: f64,
    is_knot_spacing_uniform: bool,
}

impl Spline {
    /// # Errors
    /// - [Error::ShapeMismatch] when `xd` and `yd` differ in length,
    /// - [Error::InvalidArgument] for too few or non-finite samples,
    /// - [Error::DataOrdering] when `xd` is not strictly increasing.
    /// ```
    /// use linalg_interp::{Error, Order, Spline};
    ///
    /// let spline = Spline::new(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0], Order::Linear);
    /// assert!(matches!(spline, Err(Error::DataOrdering { index: 2, .. })));
    /// ```
    pub fn new(xd: &[f64], yd: &[f64], order: Order) -> Result<Self> {

        if xd.len() != yd.len() {
            return Err(Error::ShapeMismatch {
                what: "sample values yd",
                expected: (xd.len(), 1),
                actual: (yd.len(), 1),
            });
        }
        if xd.len() < order.min_samples() {
            return Err(Error::InvalidArgument(format!(
                "{} spline needs at least {} samples, got {}",
                order,
                order.min_samples(),
                xd.len()
            )));
        }
        if let Some(value) = xd.iter().chain(yd.iter()).find(|value| !value.is_finite()) {
            return Err(Error::InvalidArgument(format!("samples must be finite, got {}", value)));
        }
        check_ordering(xd)?;

        let polynomials = match order {
            Order::Linear => linear_polynomials(xd, yd),
            Order::Quadratic => quadratic_polynomials(xd, yd),
            Order::Cubic => cubic_polynomials(xd, yd)?,
        };

        let mut spline = Spline {
            xs: xd.to_vec(),
            ys: yd.to_vec(),
            polynomials,
            order,
            min_x: xd[0],
            max_x: xd[xd.len() - 1],
            is_knot_spacing_uniform: false,
        };
        spline.check_knots_spacing();

        log::debug!(
            "built {} spline with {} segments on [{}, {}]",
            order,
            spline.polynomials.len(),
            spline.min_x,
            spline.max_x
        );
        Ok(spline)
    }

    pub fn interpolate(&self, x: f64) -> Result<f64> {
        if self.is_in_range(x) {
            let index = self.find_interval_index(x);
            Ok(self.evaluate_segment(index, x))
        } else {
            Err(self.out_of_range(x))
        }
    }

    /// Evaluates every point of `x_vector`. Fails as a whole if any point is
    /// out of range.
    pub fn batch_interpolate(&self, x_vector: &[f64]) -> Result<Vec<f64>> {

        if let Some(x) = x_vector.iter().find(|x| !self.is_in_range(**x)) {
            return Err(self.out_of_range(*x));
        }

        let mut results = Vec::with_capacity(x_vector.len());
        let mut index = 0;

        for x in x_vector {
            index = self.find_interval_index_with_hint(index, *x);
            results.push(self.evaluate_segment(index, *x));
        }
        Ok(results)
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn segments(&self) -> usize {
        self.polynomials.len()
    }

    /// Coefficients `[y_i, b_i, c_i, a_i]` of segment `i` in powers of
    /// `x - xd[i]`, truncated to the degree of the spline.
    pub fn coefficients(&self, segment: usize) -> Option<&[f64]> {
        self.polynomials.get(segment).map(|polynomial| polynomial.coefficients())
    }

    fn evaluate_segment(&self, index: usize, x: f64) -> f64 {
        // the right end of the last segment is not covered by dx = 0
        if x == self.xs[index + 1] {
            self.ys[index + 1]
        } else {
            self.polynomials[index].evaluate(x)
        }
    }

    fn out_of_range(&self, x: f64) -> Error {
        Error::OutOfRange { x, min: self.min_x, max: self.max_x }
    }

    fn check_knots_spacing(&mut self) {
        let first_spacing = self.xs[1] - self.xs[0];

        self.is_knot_spacing_uniform = self.xs
            .windows(2)
            .map(|w| w[1] - w[0])
            .all(|spacing| (spacing - first_spacing).abs() <= 1e-12 * first_spacing);
    }

    fn is_in_range(&self, x: f64) -> bool {
        self.min_x <= x && x <= self.max_x
    }

    fn find_interval_index(&self, x: f64) -> usize {
        if self.is_knot_spacing_uniform {
            self.find_interval_index_uniform(x)
        } else {
            self.find_interval_index_bisect(x)
        }
    }

    fn find_interval_index_bisect(&self, x: f64) -> usize {
        let mut min = 0;
        let mut max = self.xs.len() - 1;

        while max - min > 1 {
            let mid = (min + max) / 2;
            if x < self.xs[mid] {
                max = mid;
            } else {
                min = mid;
            }
        }
        min
    }

    fn find_interval_index_uniform(&self, x: f64) -> usize {
        let segments = self.polynomials.len();
        let relative_x = (x - self.min_x) / (self.max_x - self.min_x);
        let mut index = ((relative_x * segments as f64).floor() as usize).min(segments - 1);

        // rounding in relative_x can land one segment off
        if x < self.xs[index] && index > 0 {
            index -= 1;
        } else if index + 1 < segments && x >= self.xs[index + 1] {
            index += 1;
        }
        index
    }

    fn find_interval_index_with_hint(&self, index_hint: usize, x: f64) -> usize {

        if self.is_in_interval_range(index_hint, x) {
            return index_hint;
        }
        if index_hint + 1 < self.polynomials.len() && self.is_in_interval_range(index_hint + 1, x) {
            return index_hint + 1;
        }
        self.find_interval_index(x)
    }

    fn is_in_interval_range(&self, interval_index: usize, x: f64) -> bool {
        let is_last = interval_index + 1 == self.polynomials.len();
        self.xs[interval_index] <= x
            && (x < self.xs[interval_index + 1] || (is_last && x == self.max_x))
    }
}

/// Builds a spline of the given numeric order (1, 2 or 3).
///
/// # Example
/// ```
/// use linalg_interp::build;
///
/// let spline = build(&[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 5.0, 7.0], 1).unwrap();
///
/// assert_eq!(2.5, spline.interpolate(1.5).unwrap());
/// assert!(spline.interpolate(4.5).is_err());
/// ```
pub fn build(xd: &[f64], yd: &[f64], order: usize) -> Result<Spline> {
    Spline::new(xd, yd, Order::try_from(order)?)
}

fn check_ordering(xd: &[f64]) -> Result<()> {
    match (1..xd.len()).find(|&index| xd[index] <= xd[index - 1]) {
        Some(index) => Err(Error::DataOrdering {
            index,
            previous: xd[index - 1],
            current: xd[index],
        }),
        None => Ok(()),
    }
}

fn spacings_and_slopes(xd: &[f64], yd: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let spacings: Vec<f64> = xd.windows(2).map(|w| w[1] - w[0]).collect();
    let slopes = yd
        .windows(2)
        .zip(spacings.iter())
        .map(|(w, h)| (w[1] - w[0]) / h)
        .collect();
    (spacings, slopes)
}

fn linear_polynomials(xd: &[f64], yd: &[f64]) -> Vec<Polynomial> {
    let (_, slopes) = spacings_and_slopes(xd, yd);

    slopes
        .iter()
        .enumerate()
        .map(|(i, slope)| Polynomial::new(xd[i], vec![yd[i], *slope]))
        .collect()
}

/// Matches value at both ends and the first derivative at interior nodes.
/// The free parameter is fixed by making the first segment linear.
fn quadratic_polynomials(xd: &[f64], yd: &[f64]) -> Vec<Polynomial> {
    let (spacings, slopes) = spacings_and_slopes(xd, yd);
    let mut polynomials = Vec::with_capacity(slopes.len());

    let mut b = slopes[0];
    for i in 0..slopes.len() {
        let c = (slopes[i] - b) / spacings[i];
        polynomials.push(Polynomial::new(xd[i], vec![yd[i], b, c]));
        b = 2.0 * slopes[i] - b;
    }
    polynomials
}

fn cubic_polynomials(xd: &[f64], yd: &[f64]) -> Result<Vec<Polynomial>> {
    let (spacings, slopes) = spacings_and_slopes(xd, yd);
    let (system, rhs) = natural_spline_system(&spacings, &slopes)?;
    let c = system.solve(&rhs)?;

    Ok((0..spacings.len())
        .map(|i| {
            let h = spacings[i];
            let a = (c[i + 1] - c[i]) / (3.0 * h);
            let b = slopes[i] - h * (c[i + 1] + 2.0 * c[i]) / 3.0;
            Polynomial::new(xd[i], vec![yd[i], b, c[i], a])
        })
        .collect())
}

/// Tridiagonal system for the curvature terms `c_0..c_n` with `c_0 = c_n = 0`.
pub(crate) fn natural_spline_system(
    spacings: &[f64],
    slopes: &[f64],
) -> Result<(Tridiagonal, DVector<f64>)> {
    let size = spacings.len() + 1;
    let mut lower = vec![0.0; size];
    let mut diagonal = vec![1.0; size];
    let mut upper = vec![0.0; size];
    let mut rhs = DVector::zeros(size);

    for i in 1..size - 1 {
        lower[i] = spacings[i - 1];
        diagonal[i] = 2.0 * (spacings[i - 1] + spacings[i]);
        upper[i] = spacings[i];
        rhs[i] = 3.0 * (slopes[i] - slopes[i - 1]);
    }

    Ok((Tridiagonal::new(lower, diagonal, upper)?, rhs))
}
