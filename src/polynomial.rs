/// Polynomial piece of a spline written around the left end of its segment:
/// `p(x) = c[0] + c[1]·(x - origin) + c[2]·(x - origin)^2 + ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    origin: f64,
    coefficients: Vec<f64>,
}

impl Polynomial {

    pub fn new(origin: f64, coefficients: Vec<f64>) -> Self {
        Polynomial { origin, coefficients }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let dx = x - self.origin;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |result, coefficient| result * dx + coefficient)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}
