use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use num::ToPrimitive;
use uuid::Uuid; //used for variable identity

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarType {
    Float,
    Int,
}

impl Default for VarType {
    fn default() -> Self {
        VarType::Float
    }
}

/// Builder for a variable: type, bounds, display name.
#[derive(Clone, Debug, Default)]
pub struct VariableDefinition {
    ty: VarType,
    lb: Option<f64>,
    ub: Option<f64>,
    name: String,
}

impl VariableDefinition {
    pub fn new(ty: VarType) -> Self {
        Self {
            ty,
            lb: None,
            ub: None,
            name: String::from(""),
        }
    }

    pub fn with_lb<T: ToPrimitive>(mut self, lb: T) -> Self {
        self.lb = lb.to_f64();
        assert!(self.valid_bounds());
        self
    }

    pub fn with_ub<T: ToPrimitive>(mut self, ub: T) -> Self {
        self.ub = ub.to_f64();
        assert!(self.valid_bounds());
        self
    }

    pub fn with_name<T: ToString>(mut self, name: T) -> Self {
        self.name = name.to_string();
        self
    }

    fn valid_bounds(&self) -> bool {
        //if both bounds exist, lb <= ub
        if let (Some(lb), Some(ub)) = (self.lb, self.ub) {
            return lb <= ub;
        }
        true
    }
}

#[derive(Debug, Clone)]
struct RawVariable {
    ty: VarType,
    lb: Option<f64>,
    ub: Option<f64>,
    name: String,
    id: Uuid,
}

impl RawVariable {
    fn new(def: VariableDefinition) -> Self {
        Self {
            ty: def.ty,
            lb: def.lb,
            ub: def.ub,
            name: def.name,
            id: Uuid::new_v4(),
        }
    }
}

/// A shared handle to one decision variable. Clones refer to the same
/// underlying variable; identity (equality, hashing) is by id, so renaming a
/// variable does not disturb coefficient maps keyed by it.
#[derive(Debug, Clone)]
pub struct Variable {
    raw: Rc<RefCell<RawVariable>>,
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Variable {
    fn new(def: VariableDefinition) -> Self {
        Self {
            raw: Rc::new(RefCell::new(RawVariable::new(def))),
        }
    }

    pub fn ty(&self) -> VarType {
        self.raw.borrow().ty
    }

    pub fn lb(&self) -> Option<f64> {
        self.raw.borrow().lb
    }

    pub fn ub(&self) -> Option<f64> {
        self.raw.borrow().ub
    }

    pub fn id(&self) -> Uuid {
        self.raw.borrow().id
    }

    pub fn name(&self) -> Ref<str> {
        Ref::map(self.raw.borrow(), |raw| raw.name.as_str())
    }

    pub fn name_mut(&self) -> RefMut<String> {
        RefMut::map(self.raw.borrow_mut(), |raw| &mut raw.name)
    }
}

/// Registry through which all variables of one model are minted.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: Vec<Variable>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, def: VariableDefinition) -> Variable {
        let var = Variable::new(def);
        self.vars.push(var.clone());
        var
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }
}
