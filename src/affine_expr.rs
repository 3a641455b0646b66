use std::collections::hash_map::Entry::Occupied;
use std::fmt;
use std::ops::{Add, AddAssign, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num::ToPrimitive;
use rustc_hash::FxHashMap;

use crate::var::Variable;

/// A linear combination of variables plus a constant. The building block for
/// objectives and constraint sides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AffineExpression {
    coeffs: FxHashMap<Variable, f64>,
    constant: f64,
}

impl AffineExpression {
    pub fn new(coeffs: FxHashMap<Variable, f64>, constant: f64) -> Self {
        Self { coeffs, constant }
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.coeffs.keys().cloned().collect()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Variable, &f64)> {
        self.coeffs.iter()
    }

    pub fn num_terms(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeff(&self, var: &Variable) -> f64 {
        self.coeffs.get(var).copied().unwrap_or(0.0)
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn constant_mut(&mut self) -> &mut f64 {
        &mut self.constant
    }

    pub fn contains_var(&self, var: &Variable) -> bool {
        self.coeffs.contains_key(var)
    }

    pub(crate) fn clear(&mut self) {
        self.coeffs.clear();
        self.constant = 0.0;
    }

    /// Substitute `var` with `expr`, scaling by the coefficient `var` carried.
    /// Returns whether the variable was present.
    pub fn replace_var(&mut self, var: &Variable, expr: &AffineExpression) -> bool {
        if let Occupied(entry) = self.coeffs.entry(var.clone()) {
            let (_, c) = entry.remove_entry();
            let mut scaled = expr.clone();
            scaled *= c;
            *self += scaled;
            return true;
        }
        false
    }

    /// Evaluate under an assignment. None when a referenced variable has no
    /// value in the map.
    pub fn value_in(&self, values: &FxHashMap<Variable, f64>) -> Option<f64> {
        let mut val = self.constant;
        for (var, coeff) in &self.coeffs {
            val += coeff * values.get(var)?;
        }
        Some(val)
    }

    /// Coefficient map keyed by current variable name. Useful for structural
    /// comparison across models whose variables differ in identity.
    pub fn coeffs_by_name(&self) -> FxHashMap<String, f64> {
        self.coeffs
            .iter()
            .map(|(var, c)| (var.name().to_string(), *c))
            .collect()
    }
}

impl fmt::Display for AffineExpression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mult = "\u{00D7}";
        let mut terms: Vec<(String, f64)> = self
            .coeffs
            .iter()
            .map(|(var, c)| (var.name().to_string(), *c))
            .collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let len = terms.len();
        for (i, (name, coeff)) in terms.iter().enumerate() {
            if (i + 1 < len) | (self.constant != 0.0) {
                write!(f, "{}{}{} + ", coeff, mult, name)?;
            } else {
                write!(f, "{}{}{}", coeff, mult, name)?;
            }
        }
        if (self.constant != 0.0) | (len == 0) {
            write!(f, "{}", self.constant)?;
        }
        Ok(())
    }
}

impl From<&Variable> for AffineExpression {
    fn from(var: &Variable) -> Self {
        let mut coeffs = FxHashMap::default();
        coeffs.insert(var.clone(), 1.0);
        Self {
            coeffs,
            constant: 0.0,
        }
    }
}

//AF + AF -> AF
impl Add for AffineExpression {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

//AF - AF -> AF
impl Sub for AffineExpression {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self -= rhs;
        self
    }
}

//AF + V -> AF
impl Add<&Variable> for AffineExpression {
    type Output = Self;

    fn add(mut self, rhs: &Variable) -> Self::Output {
        self += rhs;
        self
    }
}

//AF - V -> AF
impl Sub<&Variable> for AffineExpression {
    type Output = Self;

    fn sub(mut self, rhs: &Variable) -> Self::Output {
        self -= rhs;
        self
    }
}

//V + AF -> AF
impl Add<AffineExpression> for &Variable {
    type Output = AffineExpression;

    fn add(self, mut rhs: AffineExpression) -> Self::Output {
        rhs += self;
        rhs
    }
}

//V - AF -> AF
impl Sub<AffineExpression> for &Variable {
    type Output = AffineExpression;

    fn sub(self, rhs: AffineExpression) -> Self::Output {
        let mut out = -rhs;
        out += self;
        out
    }
}

//V + V -> AF
impl Add for &Variable {
    type Output = AffineExpression;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out = AffineExpression::from(self);
        out += rhs;
        out
    }
}

//V - V -> AF
impl Sub for &Variable {
    type Output = AffineExpression;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut out = AffineExpression::from(self);
        out -= rhs;
        out
    }
}

//AF += AF
impl AddAssign for AffineExpression {
    fn add_assign(&mut self, rhs: Self) {
        rhs.coeffs.into_iter().for_each(|(rhs_k, rhs_v)| {
            self.coeffs
                .entry(rhs_k)
                .and_modify(|lhs_v| *lhs_v += rhs_v)
                .or_insert(rhs_v);
        });
        self.coeffs.retain(|_, c| *c != 0.0);
        self.constant += rhs.constant;
    }
}

//AF -= AF
impl SubAssign for AffineExpression {
    fn sub_assign(&mut self, rhs: Self) {
        rhs.coeffs.into_iter().for_each(|(rhs_k, rhs_v)| {
            self.coeffs
                .entry(rhs_k)
                .and_modify(|lhs_v| *lhs_v -= rhs_v)
                .or_insert(-rhs_v);
        });
        self.coeffs.retain(|_, c| *c != 0.0);
        self.constant -= rhs.constant;
    }
}

//AF += V
impl AddAssign<&Variable> for AffineExpression {
    fn add_assign(&mut self, rhs: &Variable) {
        self.coeffs
            .entry(rhs.clone())
            .and_modify(|c| *c += 1.0)
            .or_insert(1.0);
        self.coeffs.retain(|_, c| *c != 0.0);
    }
}

//AF -= V
impl SubAssign<&Variable> for AffineExpression {
    fn sub_assign(&mut self, rhs: &Variable) {
        self.coeffs
            .entry(rhs.clone())
            .and_modify(|c| *c -= 1.0)
            .or_insert(-1.0);
        self.coeffs.retain(|_, c| *c != 0.0);
    }
}

//-AF
impl Neg for AffineExpression {
    type Output = AffineExpression;

    fn neg(mut self) -> Self::Output {
        self *= -1;
        self
    }
}

//-V
impl Neg for &Variable {
    type Output = AffineExpression;

    fn neg(self) -> Self::Output {
        -AffineExpression::from(self)
    }
}

//scalar <-> expression / variable arithmetic, one instantiation per numeric type
macro_rules! scalar_ops_impl(
    ($($T: ty), *$(, )*) => {$(
        impl From<$T> for AffineExpression {
            fn from(num: $T) -> Self {
                let mut expr = Self::default();
                expr.constant = num.to_f64().unwrap();
                expr
            }
        }

        //AF + C
        impl Add<$T> for AffineExpression {
            type Output = AffineExpression;

            fn add(mut self, rhs: $T) -> Self::Output {
                self.constant += rhs.to_f64().unwrap();
                self
            }
        }

        //C + AF
        impl Add<AffineExpression> for $T {
            type Output = AffineExpression;

            fn add(self, mut rhs: AffineExpression) -> Self::Output {
                rhs.constant += self.to_f64().unwrap();
                rhs
            }
        }

        //AF - C
        impl Sub<$T> for AffineExpression {
            type Output = AffineExpression;

            fn sub(mut self, rhs: $T) -> Self::Output {
                self.constant -= rhs.to_f64().unwrap();
                self
            }
        }

        //C - AF
        impl Sub<AffineExpression> for $T {
            type Output = AffineExpression;

            fn sub(self, rhs: AffineExpression) -> Self::Output {
                let mut out = -rhs;
                out.constant += self.to_f64().unwrap();
                out
            }
        }

        //AF * C
        impl Mul<$T> for AffineExpression {
            type Output = AffineExpression;

            fn mul(mut self, rhs: $T) -> Self::Output {
                self *= rhs;
                self
            }
        }

        //C * AF
        impl Mul<AffineExpression> for $T {
            type Output = AffineExpression;

            fn mul(self, mut rhs: AffineExpression) -> Self::Output {
                rhs *= self;
                rhs
            }
        }

        //V + C
        impl Add<$T> for &Variable {
            type Output = AffineExpression;

            fn add(self, rhs: $T) -> Self::Output {
                AffineExpression::from(self) + rhs
            }
        }

        //C + V
        impl Add<&Variable> for $T {
            type Output = AffineExpression;

            fn add(self, rhs: &Variable) -> Self::Output {
                AffineExpression::from(rhs) + self
            }
        }

        //V - C
        impl Sub<$T> for &Variable {
            type Output = AffineExpression;

            fn sub(self, rhs: $T) -> Self::Output {
                AffineExpression::from(self) - rhs
            }
        }

        //C - V
        impl Sub<&Variable> for $T {
            type Output = AffineExpression;

            fn sub(self, rhs: &Variable) -> Self::Output {
                self - AffineExpression::from(rhs)
            }
        }

        //V * C
        impl Mul<$T> for &Variable {
            type Output = AffineExpression;

            fn mul(self, rhs: $T) -> Self::Output {
                AffineExpression::from(self) * rhs
            }
        }

        //C * V
        impl Mul<&Variable> for $T {
            type Output = AffineExpression;

            fn mul(self, rhs: &Variable) -> Self::Output {
                AffineExpression::from(rhs) * self
            }
        }

        //AF += C
        impl AddAssign<$T> for AffineExpression {
            fn add_assign(&mut self, rhs: $T) {
                self.constant += rhs.to_f64().unwrap();
            }
        }

        //AF -= C
        impl SubAssign<$T> for AffineExpression {
            fn sub_assign(&mut self, rhs: $T) {
                self.constant -= rhs.to_f64().unwrap();
            }
        }

        //AF *= C
        impl MulAssign<$T> for AffineExpression {
            fn mul_assign(&mut self, rhs: $T) {
                let r = rhs.to_f64().unwrap();
                self.coeffs.iter_mut().for_each(|(_, v)| *v *= r);
                self.constant *= r;
            }
        }

        //AF /= C
        impl DivAssign<$T> for AffineExpression {
            fn div_assign(&mut self, rhs: $T) {
                let r = rhs.to_f64().unwrap();
                self.coeffs.iter_mut().for_each(|(_, v)| *v /= r);
                self.constant /= r;
            }
        }
    )*}
);

scalar_ops_impl!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);
