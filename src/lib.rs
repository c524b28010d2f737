//! Stationary iterative solvers for dense linear systems and piecewise
//! polynomial spline interpolation.
//!
//! - [Relaxation] and [solve] run Gauss-Seidel or Jacobi sweeps on `A·x = b`
//!   until successive iterates agree within a tolerance.
//! - [Spline] and [build] interpolate paired samples with linear, quadratic or
//!   natural cubic pieces.
//!
//! # Example
//! ```
//! use linalg_interp::{Method, Order, Relaxation, Spline};
//! use nalgebra::{DMatrix, DVector};
//! use assert_approx_eq::assert_approx_eq;
//!
//! let a = DMatrix::from_row_slice(4, 4, &[
//!     4.0, -1.0, 0.0, 0.0,
//!     -1.0, 4.0, -1.0, 0.0,
//!     0.0, -1.0, 6.0, -1.0,
//!     0.0, 0.0, -1.0, 3.0,
//! ]);
//! let b = DVector::from_vec(vec![15.0, 10.0, 10.0, 10.0]);
//! let solution = Relaxation::new(Method::GaussSeidel).solve(&a, &b, None).unwrap();
//! assert!((&a * &solution.x - &b).norm() < 1e-6);
//!
//! let spline = Spline::new(&[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 5.0, 7.0], Order::Cubic).unwrap();
//! assert_approx_eq!(4.0, spline.interpolate(2.0).unwrap(), 1e-12);
//! assert!(spline.interpolate(0.0).is_err());
//! ```

mod error;
mod polynomial;
mod solver;
mod spline;
mod tridiagonal;

pub use error::{Error, Result};
pub use solver::{solve, Method, Relaxation, Solution, Sweeps, DEFAULT_TOLERANCE, MAX_SWEEPS};
pub use spline::{build, Order, Spline};
pub use tridiagonal::Tridiagonal;
