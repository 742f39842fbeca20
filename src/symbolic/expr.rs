//! Rational functions of named symbols.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use num_traits::{One, Zero};

use super::poly::Poly;
use super::LAPLACE_VARIABLE;
use crate::error::Result;

/// Relative tolerance for comparing two expressions.
const EQ_TOLERANCE: f64 = 1e-9;

/// A quotient of two polynomials.
///
/// Every constructor and arithmetic operation keeps the expression in a light
/// normal form: monomial factors common to both sides are cancelled and the
/// denominator's leading coefficient is 1. Polynomial gcds are only taken by
/// [`Expr::simplify`].
#[derive(Debug, Clone)]
pub struct Expr {
    num: Poly,
    den: Poly,
}

impl Expr {
    /// Build `num / den` in normal form.
    pub fn new(num: Poly, den: Poly) -> Self {
        if num.is_zero() {
            return Self::from_poly(Poly::zero());
        }
        let Some((_, lead)) = den.leading() else {
            // Division by zero is kept as written; it evaluates to inf/NaN
            return Self { num, den };
        };

        let (mut num, mut den) = (num, den);
        let common = num.content().gcd(&den.content());
        if !common.is_one() {
            if let (Some(n), Some(d)) = (num.div_monomial(&common), den.div_monomial(&common)) {
                num = n;
                den = d;
            }
        }
        if lead != 1.0 {
            num = num.scale(1.0 / lead);
            den = den.scale(1.0 / lead);
        }
        Self { num, den }
    }

    pub fn from_poly(num: Poly) -> Self {
        Self {
            num,
            den: Poly::one(),
        }
    }

    pub fn constant(c: f64) -> Self {
        Self::from_poly(Poly::constant(c))
    }

    pub fn symbol(name: &str) -> Self {
        Self::from_poly(Poly::var(name))
    }

    /// The Laplace variable `s`.
    pub fn laplace() -> Self {
        Self::symbol(LAPLACE_VARIABLE)
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    pub fn numer(&self) -> &Poly {
        &self.num
    }

    pub fn denom(&self) -> &Poly {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// The value of an expression without symbols.
    pub fn as_constant(&self) -> Option<f64> {
        Some(self.num.as_constant()? / self.den.as_constant()?)
    }

    /// All symbols in numerator and denominator.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = self.num.variables();
        vars.extend(self.den.variables());
        vars
    }

    /// Evaluate with a value bound to every symbol.
    pub fn eval(&self, values: &HashMap<String, f64>) -> Result<f64> {
        Ok(self.num.eval(values)? / self.den.eval(values)?)
    }

    /// Cancel common factors between numerator and denominator.
    ///
    /// Coefficients below `tolerance` relative to the largest one on their
    /// side are dropped first. Exact division is tried both ways; when both
    /// sides are polynomials in the same single symbol their gcd is removed.
    pub fn simplify(&self, tolerance: f64) -> Expr {
        let mut num = self.num.clone();
        let mut den = self.den.clone();
        num.prune(tolerance * num.max_coeff());
        den.prune(tolerance * den.max_coeff());

        if num.is_zero() {
            return Expr::zero();
        }
        if let Some(q) = num.div_exact(&den, tolerance) {
            return Expr::new(q, Poly::one());
        }
        if let Some(q) = den.div_exact(&num, tolerance) {
            return Expr::new(Poly::one(), q);
        }

        if let (Some(x), Some(y)) = (num.sole_variable(), den.sole_variable()) {
            if x == y {
                let g = num.gcd_univariate(&den, &x, tolerance);
                if g.len() > 1 {
                    if let (Some(n), Some(d)) = (
                        num.div_exact(&g, tolerance),
                        den.div_exact(&g, tolerance),
                    ) {
                        num = n;
                        den = d;
                    }
                }
            }
        }

        Expr::new(num, den)
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::zero()
    }
}

impl From<f64> for Expr {
    fn from(c: f64) -> Self {
        Expr::constant(c)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        if self.den == rhs.den {
            Expr::new(&self.num + &rhs.num, self.den)
        } else {
            let num = &(&self.num * &rhs.den) + &(&rhs.num * &self.den);
            Expr::new(num, &self.den * &rhs.den)
        }
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::new(&self.num * &rhs.num, &self.den * &rhs.den)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::new(&self.num * &rhs.den, &self.den * &rhs.num)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr {
            num: -self.num,
            den: self.den,
        }
    }
}

impl AddAssign for Expr {
    fn add_assign(&mut self, rhs: Expr) {
        *self = std::mem::take(self) + rhs;
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.num.is_zero()
    }
}

impl One for Expr {
    fn one() -> Self {
        Expr::constant(1.0)
    }
}

/// Equal when `a·d - c·b` vanishes relative to its operands.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        let lhs = &self.num * &other.den;
        let rhs = &other.num * &self.den;
        let scale = lhs.max_coeff().max(rhs.max_coeff());
        (&lhs - &rhs).max_coeff() <= EQ_TOLERANCE * scale
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.as_constant() == Some(1.0) {
            return write!(f, "{}", self.num);
        }

        if self.num.len() > 1 {
            write!(f, "({})", self.num)?;
        } else {
            write!(f, "{}", self.num)?;
        }

        let bare = self
            .den
            .as_term()
            .is_some_and(|(m, c)| c == 1.0 && m.degree() == 1);
        if bare {
            write!(f, "/{}", self.den)
        } else {
            write!(f, "/({})", self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn s() -> Expr {
        Expr::laplace()
    }

    #[test]
    fn test_arithmetic_normal_form() {
        let r = Expr::symbol("R");
        let g = Expr::one() / r.clone();
        assert_eq!(g.to_string(), "1/R");
        assert_eq!((g.clone() * r).to_string(), "1");

        let sum = g.clone() + g;
        assert_eq!(sum.to_string(), "2/R");
        assert!((sum.clone() - sum).is_zero());
    }

    #[test]
    fn test_leading_coefficient_normalized() {
        let e = Expr::one() / (s() * Expr::constant(2.0) + Expr::constant(2.0));
        assert_eq!(e.to_string(), "0.5/(s + 1)");
    }

    #[test]
    fn test_simplify_cancels_common_factor() {
        // (s^2 + 3s + 2) / (s^2 + 4s + 3) = (s + 2) / (s + 3)
        let num = s() * s() + s() * Expr::constant(3.0) + Expr::constant(2.0);
        let den = s() * s() + s() * Expr::constant(4.0) + Expr::constant(3.0);
        let e = (num / den).simplify(1e-12);
        assert_eq!(e.denom().len(), 2);
        assert_eq!(e, (s() + Expr::constant(2.0)) / (s() + Expr::constant(3.0)));
    }

    #[test]
    fn test_simplify_exact_quotient() {
        let gm = Expr::symbol("gm");
        let gds = Expr::symbol("gds");
        let e = (gm.clone() * (gds.clone() + Expr::one())) / (gds.clone() + Expr::one());
        assert_eq!(e.simplify(1e-12).to_string(), "gm");

        let e = gm.clone() / (gm * (gds + Expr::one()));
        assert_eq!(e.simplify(1e-12).to_string(), "1/(gds + 1)");
    }

    #[test]
    fn test_equality_by_cross_multiplication() {
        let a = Expr::one() / (s() + Expr::one());
        let b = Expr::constant(2.0) / (s() * Expr::constant(2.0) + Expr::constant(2.0));
        assert_eq!(a, b);
        assert_ne!(a, Expr::one() / s());
    }

    #[test]
    fn test_eval() {
        let e = Expr::symbol("gm") / (Expr::symbol("gds") + Expr::one());
        let values = HashMap::from([("gm".to_string(), 3.0), ("gds".to_string(), 0.5)]);
        assert_relative_eq!(e.eval(&values).unwrap(), 2.0);
        assert!(e.eval(&HashMap::new()).is_err());
        assert_eq!(Expr::constant(4.0).as_constant(), Some(4.0));
    }
}
