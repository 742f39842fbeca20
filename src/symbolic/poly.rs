//! Sparse multivariate polynomials with `f64` coefficients.
//!
//! Terms are kept in graded-lexicographic order, so the leading term is the
//! last entry of the map. Coefficients that cancel to exactly zero are
//! removed immediately; near-zero coefficients are only dropped where a
//! caller asks for it with an explicit tolerance.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{NodalError, Result};

/// A power product such as `gm·s^2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Monomial(BTreeMap<String, u32>);

impl Monomial {
    /// The empty product.
    pub fn one() -> Self {
        Self::default()
    }

    pub fn var(name: &str) -> Self {
        Self(BTreeMap::from([(name.to_string(), 1)]))
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Total degree.
    pub fn degree(&self) -> u32 {
        self.0.values().sum()
    }

    /// Exponent of `var` (0 when absent).
    pub fn exponent(&self, var: &str) -> u32 {
        self.0.get(var).copied().unwrap_or(0)
    }

    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut out = self.0.clone();
        for (var, exp) in &other.0 {
            *out.entry(var.clone()).or_insert(0) += exp;
        }
        Monomial(out)
    }

    /// `self / other`, if `other` divides `self`.
    pub fn div(&self, other: &Monomial) -> Option<Monomial> {
        let mut out = self.0.clone();
        for (var, &exp) in &other.0 {
            let have = out.get_mut(var)?;
            match (*have).cmp(&exp) {
                Ordering::Less => return None,
                Ordering::Equal => {
                    out.remove(var);
                }
                Ordering::Greater => *have -= exp,
            }
        }
        Some(Monomial(out))
    }

    /// Largest monomial dividing both.
    pub fn gcd(&self, other: &Monomial) -> Monomial {
        Monomial(
            self.0
                .iter()
                .filter_map(|(var, &exp)| {
                    let common = exp.min(other.exponent(var));
                    (common > 0).then(|| (var.clone(), common))
                })
                .collect(),
        )
    }

    fn eval(&self, values: &HashMap<String, f64>) -> Result<f64> {
        self.0.iter().try_fold(1.0, |acc, (var, &exp)| {
            let value = values.get(var).ok_or_else(|| NodalError::UnboundSymbol {
                symbol: var.clone(),
            })?;
            Ok(acc * value.powi(exp as i32))
        })
    }
}

impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        self.degree().cmp(&other.degree()).then_with(|| {
            let vars: BTreeSet<&String> = self.0.keys().chain(other.0.keys()).collect();
            vars.into_iter()
                .map(|var| self.exponent(var).cmp(&other.exponent(var)))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        })
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }
        let factors: Vec<String> = self
            .0
            .iter()
            .map(|(var, &exp)| {
                if exp == 1 {
                    var.clone()
                } else {
                    format!("{}^{}", var, exp)
                }
            })
            .collect();
        write!(f, "{}", factors.join("*"))
    }
}

/// A polynomial: monomial → coefficient, no stored zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poly {
    terms: BTreeMap<Monomial, f64>,
}

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    pub fn constant(c: f64) -> Self {
        Self::term(Monomial::one(), c)
    }

    pub fn var(name: &str) -> Self {
        Self::term(Monomial::var(name), 1.0)
    }

    pub fn term(monomial: Monomial, coeff: f64) -> Self {
        let mut terms = BTreeMap::new();
        if coeff != 0.0 {
            terms.insert(monomial, coeff);
        }
        Self { terms }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of a constant polynomial.
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self.terms.get(&Monomial::one()).copied(),
            _ => None,
        }
    }

    /// The single term of a one-term polynomial.
    pub fn as_term(&self) -> Option<(&Monomial, f64)> {
        if self.terms.len() == 1 {
            self.leading()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Leading term in graded-lex order.
    pub fn leading(&self) -> Option<(&Monomial, f64)> {
        self.terms.iter().next_back().map(|(m, &c)| (m, c))
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(m, &c)| (m, c))
    }

    /// Largest coefficient magnitude.
    pub fn max_coeff(&self) -> f64 {
        self.terms.values().fold(0.0, |acc, c| acc.max(c.abs()))
    }

    /// All symbols appearing in the polynomial.
    pub fn variables(&self) -> BTreeSet<String> {
        self.terms
            .keys()
            .flat_map(|m| m.vars().map(str::to_string))
            .collect()
    }

    /// The variable of a univariate polynomial.
    pub fn sole_variable(&self) -> Option<String> {
        let vars = self.variables();
        if vars.len() == 1 {
            vars.into_iter().next()
        } else {
            None
        }
    }

    /// Greatest monomial dividing every term.
    pub fn content(&self) -> Monomial {
        let mut iter = self.terms.keys();
        match iter.next() {
            Some(first) => iter.fold(first.clone(), |acc, m| acc.gcd(m)),
            None => Monomial::one(),
        }
    }

    fn add_term(&mut self, monomial: Monomial, coeff: f64) {
        match self.terms.entry(monomial) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += coeff;
                if *entry.get() == 0.0 {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                if coeff != 0.0 {
                    entry.insert(coeff);
                }
            }
        }
    }

    /// Multiply by `coeff·monomial`.
    pub fn mul_term(&self, monomial: &Monomial, coeff: f64) -> Poly {
        if coeff == 0.0 {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, &c)| (m.mul(monomial), c * coeff))
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Poly {
        self.mul_term(&Monomial::one(), factor)
    }

    /// Divide every term by `monomial`, which must divide all of them.
    pub fn div_monomial(&self, monomial: &Monomial) -> Option<Poly> {
        let terms = self
            .terms
            .iter()
            .map(|(m, &c)| Some((m.div(monomial)?, c)))
            .collect::<Option<BTreeMap<_, _>>>()?;
        Some(Poly { terms })
    }

    /// Drop coefficients with magnitude at or below `threshold`.
    pub fn prune(&mut self, threshold: f64) {
        self.terms.retain(|_, c| c.abs() > threshold);
    }

    /// Exact division. `None` when `divisor` does not divide `self`.
    ///
    /// Each step removes the leading term outright, so round-off can only
    /// leave small residues in lower terms; those are dropped relative to the
    /// dividend's largest coefficient.
    pub fn div_exact(&self, divisor: &Poly, tolerance: f64) -> Option<Poly> {
        let (lead_m, lead_c) = divisor.leading()?;
        if let Some(c) = divisor.as_constant() {
            return Some(self.scale(1.0 / c));
        }

        let threshold = tolerance * self.max_coeff();
        let mut rest = self.clone();
        let mut quotient = Poly::zero();

        while let Some((m, c)) = rest.leading() {
            let factor_m = m.div(lead_m)?;
            let factor_c = c / lead_c;
            let leading = m.clone();

            rest = &rest - &divisor.mul_term(&factor_m, factor_c);
            rest.terms.remove(&leading);
            rest.prune(threshold);
            quotient.add_term(factor_m, factor_c);
        }

        Some(quotient)
    }

    /// Remainder of univariate division in `var`.
    fn rem_univariate(&self, divisor: &Poly, var: &str, tolerance: f64) -> Poly {
        let Some((lead_m, lead_c)) = divisor.leading() else {
            return self.clone();
        };
        let lead_deg = lead_m.exponent(var);
        let threshold = tolerance * self.max_coeff();
        let mut rest = self.clone();

        while let Some((m, c)) = rest.leading() {
            let deg = m.exponent(var);
            if deg < lead_deg {
                break;
            }
            let leading = m.clone();
            let factor_m = if deg > lead_deg {
                Monomial(BTreeMap::from([(var.to_string(), deg - lead_deg)]))
            } else {
                Monomial::one()
            };

            rest = &rest - &divisor.mul_term(&factor_m, c / lead_c);
            rest.terms.remove(&leading);
            rest.prune(threshold);
        }
        rest
    }

    /// Divide by the leading coefficient.
    pub fn monic(&self) -> Poly {
        match self.leading() {
            Some((_, c)) => self.scale(1.0 / c),
            None => self.clone(),
        }
    }

    /// Monic gcd of two polynomials in the same single variable.
    pub fn gcd_univariate(&self, other: &Poly, var: &str, tolerance: f64) -> Poly {
        let mut a = self.monic();
        let mut b = other.monic();
        while !b.is_zero() {
            let r = a.rem_univariate(&b, var, tolerance);
            a = b;
            b = r.monic();
        }
        a.monic()
    }

    /// Evaluate with every symbol bound.
    pub fn eval(&self, values: &HashMap<String, f64>) -> Result<f64> {
        self.terms
            .iter()
            .try_fold(0.0, |acc, (m, c)| Ok(acc + c * m.eval(values)?))
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, &c) in &rhs.terms {
            out.add_term(m.clone(), c);
        }
        out
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, &c) in &rhs.terms {
            out.add_term(m.clone(), -c);
        }
        out
    }
}

impl Mul for &Poly {
    type Output = Poly;

    fn mul(self, rhs: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (m1, &c1) in &self.terms {
            for (m2, &c2) in &rhs.terms {
                out.add_term(m1.mul(m2), c1 * c2);
            }
        }
        out
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        self.scale(-1.0)
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (m, &c)) in self.terms.iter().rev().enumerate() {
            let sign = if c < 0.0 { "-" } else { "+" };
            match (i, sign) {
                (0, "-") => write!(f, "-")?,
                (0, _) => {}
                _ => write!(f, " {} ", sign)?,
            }
            let magnitude = c.abs();
            if m.is_one() {
                write!(f, "{}", magnitude)?;
            } else if magnitude == 1.0 {
                write!(f, "{}", m)?;
            } else {
                write!(f, "{}*{}", magnitude, m)?;
            }
        }
        Ok(())
    }
}
