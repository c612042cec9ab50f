use crate::sat::literal::{Literal, Variable};
use core::ops::Index;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Assigned(true))
    }

    #[must_use]
    pub const fn is_false(&self) -> bool {
        matches!(self, Self::Assigned(false))
    }
}

/// A (possibly partial) model: one `VarState` per variable.
///
/// Built from the assignment log a solved formula exposes, and used to verify the
/// model against the input clauses. Variables the search never fixed stay
/// `Unassigned`; they are "don't care" for the clauses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars])
    }

    pub fn from_literals<I: IntoIterator<Item = Literal>>(num_vars: usize, literals: I) -> Self {
        let mut assignment = Self::new(num_vars);
        for lit in literals {
            assignment.assign(lit);
        }
        assignment
    }

    pub fn assign(&mut self, lit: Literal) {
        self.0[lit.variable().index()] = VarState::Assigned(lit.is_positive());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        match self.0.get(var.index()) {
            Some(VarState::Assigned(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        let value = self.var_value(lit.variable())?;
        Some(if lit.is_positive() { value } else { !value })
    }

    /// The assigned literals, ordered by variable.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.0.iter().enumerate().filter_map(|(i, state)| match state {
            #[allow(clippy::cast_possible_truncation)]
            VarState::Assigned(b) => Some(Variable::new(i as u32).literal(*b)),
            VarState::Unassigned => None,
        })
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.literals().join(" "))
    }
}
