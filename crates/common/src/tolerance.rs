use super::error::Error;

/// Default epsilon used when no tolerance is configured.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Epsilon-gated comparator for floating-point potentials.
///
/// The epsilon is relative: two values are treated as equal when they differ
/// by at most `epsilon * max(1, |a|, |b|, scale)`, where `scale` is the
/// magnitude of the terms the values were computed from. A relaxation only
/// counts as an improvement when it clears that margin, so rounding noise on
/// large weights cannot keep policy iteration alive. Infinite operands do not
/// widen the margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    epsilon: f64,
}

impl Tolerance {
    /// Creates a comparator with the given epsilon.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfiguration` if `epsilon` is not a finite,
    /// strictly positive number.
    pub fn new(epsilon: f64) -> Result<Self, Error> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "tolerance epsilon must be a positive finite number, got {}",
                epsilon
            )));
        }
        Ok(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// `a` is smaller than `b` by more than the margin of `a` and `b`.
    pub fn less(&self, a: f64, b: f64) -> bool {
        self.less_at_scale(a, b, 1.0)
    }

    /// Like [`Tolerance::less`], with the margin widened to `scale` when the
    /// operands come out of a larger computation.
    pub fn less_at_scale(&self, a: f64, b: f64, scale: f64) -> bool {
        a + self.margin(a, b, scale) < b
    }

    /// `|a - b|` is within the margin of `a` and `b`.
    pub fn equal(&self, a: f64, b: f64) -> bool {
        self.equal_at_scale(a, b, 1.0)
    }

    pub fn equal_at_scale(&self, a: f64, b: f64, scale: f64) -> bool {
        (a - b).abs() <= self.margin(a, b, scale)
    }

    fn margin(&self, a: f64, b: f64, scale: f64) -> f64 {
        let finite_abs = |x: f64| if x.is_finite() { x.abs() } else { 0.0 };
        let magnitude = finite_abs(a)
            .max(finite_abs(b))
            .max(finite_abs(scale))
            .max(1.0);
        self.epsilon * magnitude
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}
