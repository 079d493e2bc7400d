use std::collections::HashMap;

use bimap::BiHashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `sum = rhs`
    Eq,
    /// `sum <= rhs`
    Le,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,

    /// `(variable index, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,

    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn lhs(&self, assignment: &[bool]) -> f64 {
        self.terms.iter().filter(|(var, _)| assignment.get(*var).copied().unwrap_or(false)).map(|(_, coefficient)| coefficient).sum()
    }

    pub fn is_satisfied(&self, assignment: &[bool]) -> bool {
        let lhs = self.lhs(assignment);
        match self.sense {
            Sense::Eq => (lhs - self.rhs).abs() < 1e-9,
            Sense::Le => lhs <= self.rhs + 1e-9,
        }
    }
}

/// A minimisation problem over binary variables with linear constraints.
///
/// Variables are addressed by index; their names are kept in a bidirectional map so that solver
/// results can be translated back to candidates and DAG edges.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    variables: BiHashMap<String, usize>,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
    constraint_index: HashMap<String, usize>,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binary variable with the given objective coefficient.
    ///
    /// # Returns
    /// The variable index, or `Error::InternalConsistency` if the name is taken.
    pub fn add_binary_variable(&mut self, name: &str, objective: f64) -> Result<usize> {
        if self.variables.contains_left(name) {
            return Err(Error::InternalConsistency(format!("Variable {} added twice", name)));
        }
        let index = self.objective.len();
        self.variables.insert(name.to_string(), index);
        self.objective.push(objective);
        Ok(index)
    }

    pub fn add_to_objective(&mut self, variable: usize, coefficient: f64) {
        if let Some(c) = self.objective.get_mut(variable) {
            *c += coefficient;
        }
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.get_by_left(name).copied()
    }

    pub fn variable_name(&self, index: usize) -> Option<&str> {
        self.variables.get_by_right(&index).map(|s| s.as_str())
    }

    pub fn objective_coefficient(&self, variable: usize) -> f64 {
        self.objective.get(variable).copied().unwrap_or(0.0)
    }

    pub fn nb_variables(&self) -> usize {
        self.objective.len()
    }

    /// # Returns
    /// `Error::InternalConsistency` if a constraint with this name exists or a term refers to an
    /// unknown variable.
    pub fn add_constraint(&mut self, name: &str, terms: Vec<(usize, f64)>, sense: Sense, rhs: f64) -> Result<()> {
        if self.constraint_index.contains_key(name) {
            return Err(Error::InternalConsistency(format!("Constraint {} added twice", name)));
        }
        if let Some((var, _)) = terms.iter().find(|(var, _)| *var >= self.objective.len()) {
            return Err(Error::InternalConsistency(format!("Constraint {} refers to unknown variable {}", name, var)));
        }
        self.constraint_index.insert(name.to_string(), self.constraints.len());
        self.constraints.push(Constraint { name: name.to_string(), terms, sense, rhs });
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraint_index.get(name).map(|i| &self.constraints[*i])
    }

    pub fn nb_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective_value(&self, assignment: &[bool]) -> f64 {
        self.objective.iter().zip(assignment).filter(|(_, chosen)| **chosen).map(|(c, _)| c).sum()
    }

    pub fn is_feasible(&self, assignment: &[bool]) -> bool {
        assignment.len() == self.nb_variables() && self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    /// Names of the chosen variables.
    pub fn chosen_variables<'a>(&'a self, assignment: &'a [bool]) -> impl Iterator<Item = &'a str> + 'a {
        assignment.iter().enumerate().filter(|(_, chosen)| **chosen).filter_map(|(i, _)| self.variable_name(i))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// One value per variable index.
    Optimal(Vec<bool>),
    /// Names of the constraints of an irreducible infeasible subsystem.
    Infeasible(Vec<String>),
}

/// A MIP backend minimising a [`LinearModel`].
pub trait Solver {
    fn optimize(&self, model: &LinearModel) -> Result<SolverOutcome>;
}
