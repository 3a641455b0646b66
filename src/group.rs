use rustc_hash::FxHashMap;

use crate::var::{Environment, VarType, Variable, VariableDefinition};

/// Which stage of the two-stage program a variable group (or constraint)
/// belongs to. First-stage decisions are made before uncertainty resolves and
/// are shared across scenarios; second-stage (recourse) decisions are made
/// after, one copy per scenario.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    First,
    Second,
}

/// A named family of non-negative decision variables indexed by a key domain,
/// e.g. `land` over crop names or `sold` over sellable products. One variable
/// is minted per key, named `group[key]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableGroup {
    name: String,
    stage: Stage,
    ty: VarType,
    ub: Option<f64>,
    keys: Vec<String>,
    vars: FxHashMap<String, Variable>,
}

impl VariableGroup {
    /// Non-negative continuous group.
    pub fn continuous<S, I, K>(env: &mut Environment, name: S, stage: Stage, keys: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::bounded(env, name, stage, VarType::Float, keys, None)
    }

    /// Non-negative integer group.
    pub fn integer<S, I, K>(env: &mut Environment, name: S, stage: Stage, keys: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::bounded(env, name, stage, VarType::Int, keys, None)
    }

    pub fn bounded<S, I, K>(
        env: &mut Environment,
        name: S,
        stage: Stage,
        ty: VarType,
        keys: I,
        ub: Option<f64>,
    ) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let name = name.into();
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let mut vars = FxHashMap::default();
        for key in &keys {
            let mut def = VariableDefinition::new(ty)
                .with_lb(0)
                .with_name(format!("{}[{}]", name, key));
            if let Some(ub) = ub {
                def = def.with_ub(ub);
            }
            vars.insert(key.clone(), env.add_var(def));
        }
        Self {
            name,
            stage,
            ty,
            ub,
            keys,
            vars,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn ty(&self) -> VarType {
        self.ty
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn var(&self, key: &str) -> Option<&Variable> {
        self.vars.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.keys.iter().map(move |k| (k, &self.vars[k]))
    }

    /// Shape is what must agree across scenarios for first-stage variables to
    /// be merged: same group name, same key domain, same variable type.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty && self.keys == other.keys
    }

    /// Mint a fresh group with identical shape and bounds in `env`. Used by
    /// the aggregator to create the shared first-stage copy.
    pub(crate) fn replicate(&self, env: &mut Environment) -> Self {
        Self::bounded(
            env,
            self.name.clone(),
            self.stage,
            self.ty,
            self.keys.clone(),
            self.ub,
        )
    }
}
