//! The immutable input formula and the variable arena it is built over.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::literal::Variable;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type DecisionLevel = u32;

/// Errors raised when a `CnfFormula` is assembled from parts that do not belong together.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("clause {clause} references variable {variable}, but only {num_vars} variables exist")]
    UnknownVariable {
        clause: usize,
        variable: usize,
        num_vars: usize,
    },
}

/// Arena of variables. A variable is created once per propositional atom and lives for
/// the whole solve; its optional name is only used for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableTable {
    names: Vec<Option<String>>,
}

impl VariableTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Creates `count` variables named `"1"`, `"2"`, ... as DIMACS files number them.
    #[must_use]
    pub fn numbered(count: usize) -> Self {
        Self {
            names: (1..=count).map(|n| Some(n.to_string())).collect(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn new_variable(&mut self, name: Option<String>) -> Variable {
        let var = Variable::new(self.names.len() as u32);
        self.names.push(name);
        var
    }

    #[must_use]
    pub fn name(&self, var: Variable) -> Option<&str> {
        self.names.get(var.index())?.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, var: Variable) -> bool {
        var.index() < self.names.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = Variable> + '_ {
        (0..self.names.len()).map(|i| Variable::new(i as u32))
    }
}

/// An ordered conjunction of clauses over a `VariableTable`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CnfFormula {
    variables: VariableTable,
    clauses: Vec<Clause>,
}

impl CnfFormula {
    /// Builds a formula, rejecting clauses that mention variables outside `variables`.
    ///
    /// # Errors
    ///
    /// `FormulaError::UnknownVariable` for the first offending clause.
    pub fn new(variables: VariableTable, clauses: Vec<Clause>) -> Result<Self, FormulaError> {
        for (index, clause) in clauses.iter().enumerate() {
            if let Some(lit) = clause.iter().find(|lit| !variables.contains(lit.variable())) {
                return Err(FormulaError::UnknownVariable {
                    clause: index,
                    variable: lit.variable().index(),
                    num_vars: variables.len(),
                });
            }
        }
        Ok(Self::from_parts(variables, clauses))
    }

    /// For producers that create every variable they reference.
    pub(crate) fn from_parts(variables: VariableTable, clauses: Vec<Clause>) -> Self {
        debug_assert!(
            clauses
                .iter()
                .flat_map(Clause::iter)
                .all(|lit| variables.contains(lit.variable()))
        );
        Self { variables, clauses }
    }

    #[must_use]
    pub const fn variables(&self) -> &VariableTable {
        &self.variables
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// True when every clause has at least one literal that `assignment` makes true.
    #[must_use]
    pub fn verify(&self, assignment: &Assignment) -> bool {
        self.iter().all(|clause| clause.is_satisfied_by(assignment))
    }
}

impl From<Vec<Vec<i32>>> for CnfFormula {
    fn from(clauses: Vec<Vec<i32>>) -> Self {
        let num_vars = clauses
            .iter()
            .flatten()
            .map(|l| l.unsigned_abs() as usize)
            .max()
            .unwrap_or(0);
        let clauses = clauses.iter().map(|c| Clause::from(c.as_slice())).collect();
        Self::from_parts(VariableTable::numbered(num_vars), clauses)
    }
}

impl Display for CnfFormula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars(), self.len())?;
        for clause in &self.clauses {
            writeln!(f, "{}", clause.iter().map(|l| l.to_string()).chain(["0".to_string()]).join(" "))?;
        }
        Ok(())
    }
}
