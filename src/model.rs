use std::collections::HashSet;
use std::fmt;

use ndarray::{Array1, Array2};
use rustc_hash::FxHashMap;
use sprs::{CsMat, TriMat};
use tabular::{Row, Table};

use crate::affine_expr::AffineExpression;
use crate::constraint::{Comp, Constraint};
use crate::var::{VarType, Variable};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptDir {
    Max,
    Min,
}

impl fmt::Display for OptDir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptDir::Max => write!(f, "Max"),
            OptDir::Min => write!(f, "Min"),
        }
    }
}

/// A solver-ready optimization problem: one objective, a list of named linear
/// constraints. Built by the scenario machinery, consumed read-only by a
/// solver adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    name: String,
    obj_fn: AffineExpression,
    opt_dir: OptDir,
    constraints: Vec<Constraint>,
}

impl Model {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            obj_fn: AffineExpression::default(),
            opt_dir: OptDir::Min,
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    //set objective function and optimization direction
    pub fn set_obj_fn(&mut self, opt_dir: OptDir, obj_fn: AffineExpression) {
        self.obj_fn = obj_fn;
        self.opt_dir = opt_dir;
    }

    pub fn obj_fn(&self) -> &AffineExpression {
        &self.obj_fn
    }

    pub fn opt_dir(&self) -> OptDir {
        self.opt_dir
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn set_constraints(&mut self, constraints: Vec<Constraint>) {
        self.constraints = constraints;
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Every variable referenced by the objective or a constraint, in a
    /// deterministic order (by name, id as tie-break).
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars: HashSet<Variable> = self.obj_fn.variables().into_iter().collect();
        self.constraints.iter().for_each(|c| {
            c.variables().into_iter().for_each(|v| {
                vars.insert(v);
            })
        });
        let mut vars: Vec<Variable> = vars.into_iter().collect();
        vars.sort_by_key(|v| (v.name().to_string(), v.id()));
        vars
    }

    pub fn variable_index_map(&self) -> FxHashMap<Variable, usize> {
        self.variables()
            .into_iter()
            .enumerate()
            .map(|(i, var)| (var, i))
            .collect()
    }

    /// Dense coefficient export for the solver boundary.
    pub fn to_dense(&self) -> DenseForm {
        let variables = self.variables();
        let var_ind_map: FxHashMap<Variable, usize> = variables
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();

        let m = self.constraints.len();
        let n = variables.len();

        let mut constraints = Array2::<f64>::zeros((m, n));
        let mut rhs = Array1::<f64>::zeros(m);
        let mut senses = Vec::with_capacity(m);
        for (i, con) in self.constraints.iter().enumerate() {
            let (coeffs, comp, b) = con.normalized();
            for (var, coeff) in coeffs {
                constraints[[i, var_ind_map[&var]]] = coeff;
            }
            rhs[i] = b;
            senses.push(comp);
        }

        let mut objective = Array1::<f64>::zeros(n);
        for (var, coeff) in self.obj_fn.terms() {
            objective[var_ind_map[var]] = *coeff;
        }

        let lower = variables
            .iter()
            .map(|v| v.lb().unwrap_or(f64::NEG_INFINITY))
            .collect::<Array1<f64>>();
        let upper = variables
            .iter()
            .map(|v| v.ub().unwrap_or(f64::INFINITY))
            .collect::<Array1<f64>>();
        let integer_mask = variables.iter().map(|v| v.ty() == VarType::Int).collect();

        DenseForm {
            opt_dir: self.opt_dir,
            objective,
            obj_constant: self.obj_fn.constant(),
            constraints,
            senses,
            rhs,
            lower,
            upper,
            integer_mask,
            variables,
        }
    }

    /// Sparse (CSR) coefficient export; same layout as [`Model::to_dense`].
    pub fn to_sparse(&self) -> SparseForm {
        let dense = self.to_dense();
        let m = dense.constraints.nrows();
        let n = dense.constraints.ncols();

        let mut tri = TriMat::new((m, n));
        let var_ind_map: FxHashMap<Variable, usize> = dense
            .variables
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();
        for (i, con) in self.constraints.iter().enumerate() {
            let (coeffs, _, _) = con.normalized();
            for (var, coeff) in coeffs {
                if coeff != 0.0 {
                    tri.add_triplet(i, var_ind_map[&var], coeff);
                }
            }
        }

        SparseForm {
            opt_dir: dense.opt_dir,
            objective: dense.objective,
            obj_constant: dense.obj_constant,
            constraints: tri.to_csr(),
            senses: dense.senses,
            rhs: dense.rhs,
            lower: dense.lower,
            upper: dense.upper,
            integer_mask: dense.integer_mask,
            variables: dense.variables,
        }
    }
}

/// Dense matrix view of a [`Model`]: minimize/maximize `objective · x`
/// subject to `constraints · x (senses) rhs`, `lower <= x <= upper`.
pub struct DenseForm {
    pub opt_dir: OptDir,
    pub objective: Array1<f64>,
    pub obj_constant: f64,
    pub constraints: Array2<f64>,
    pub senses: Vec<Comp>,
    pub rhs: Array1<f64>,
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
    pub integer_mask: Vec<bool>,
    pub variables: Vec<Variable>,
}

/// Sparse counterpart of [`DenseForm`]; constraint matrix in CSR layout.
pub struct SparseForm {
    pub opt_dir: OptDir,
    pub objective: Array1<f64>,
    pub obj_constant: f64,
    pub constraints: CsMat<f64>,
    pub senses: Vec<Comp>,
    pub rhs: Array1<f64>,
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
    pub integer_mask: Vec<bool>,
    pub variables: Vec<Variable>,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut table = Table::new("{:<} {:^} {:<}");
        table.add_row(Row::from_cells([
            self.opt_dir.to_string(),
            ":".to_string(),
            format!("{}", self.obj_fn),
        ]));
        table.add_row(Row::from_cells([
            "Subject to".to_string(),
            ":".to_string(),
            String::new(),
        ]));
        for constraint in &self.constraints {
            table.add_row(Row::from_cells([
                constraint.name().to_string(),
                ":".to_string(),
                format!(
                    "{} {} {}",
                    constraint.lhs(),
                    constraint.comp(),
                    constraint.rhs()
                ),
            ]));
        }
        write!(f, "{}", table)
    }
}
