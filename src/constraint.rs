use std::collections::HashSet;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::affine_expr::AffineExpression;
use crate::var::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Le, // <=
    Ge, // >=
    Eq, // ==
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Comp::Le => write!(f, "\u{2264}"),
            Comp::Eq => write!(f, "="),
            Comp::Ge => write!(f, "\u{2265}"),
        }
    }
}

/// One named linear relation between two affine expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    lhs: AffineExpression,
    comp: Comp,
    rhs: AffineExpression,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} {} {}", self.name, self.lhs, self.comp, self.rhs)
    }
}

impl Constraint {
    pub fn new<S, T, U>(name: S, lhs: T, comp: Comp, rhs: U) -> Self
    where
        S: Into<String>,
        T: Into<AffineExpression>,
        U: Into<AffineExpression>,
    {
        Self {
            name: name.into(),
            lhs: lhs.into(),
            comp,
            rhs: rhs.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn lhs(&self) -> &AffineExpression {
        &self.lhs
    }

    pub fn rhs(&self) -> &AffineExpression {
        &self.rhs
    }

    pub fn comp(&self) -> Comp {
        self.comp
    }

    pub fn variables(&self) -> Vec<Variable> {
        let vars: HashSet<Variable> = self
            .lhs
            .variables()
            .into_iter()
            .chain(self.rhs.variables())
            .collect();
        vars.into_iter().collect()
    }

    pub fn contains_var(&self, var: &Variable) -> bool {
        self.lhs.contains_var(var) || self.rhs.contains_var(var)
    }

    pub fn replace_var(&mut self, var: &Variable, expr: &AffineExpression) {
        self.lhs.replace_var(var, expr);
        self.rhs.replace_var(var, expr);
    }

    /// Collapse to `coeffs (comp) rhs` with all variables on the left and the
    /// constant on the right. The sense is kept as-is; matrix export relies on
    /// this shape.
    pub fn normalized(&self) -> (FxHashMap<Variable, f64>, Comp, f64) {
        let mut lhs = self.lhs.clone();
        lhs -= self.rhs.clone();
        let rhs_const = -lhs.constant();
        *lhs.constant_mut() = 0.0;

        let coeffs = lhs
            .terms()
            .map(|(var, c)| (var.clone(), *c))
            .collect::<FxHashMap<Variable, f64>>();
        (coeffs, self.comp, rhs_const)
    }
}
