//! The contract shared by the two backtrackable formula representations.
//!
//! A backtrackable formula wraps an immutable `CnfFormula` and supports three mutations:
//! fixing a literal at a decision level, propagating unit clauses, and undoing everything
//! fixed above a level. The solver is written against this trait only; `FormulaImpls`
//! lets the representation be chosen at runtime.

use crate::sat::adjacency::AdjacencyListFormula;
use crate::sat::cnf::{CnfFormula, DecisionLevel};
use crate::sat::literal::Literal;
use crate::sat::watched::WatchedLiteralsFormula;
use itertools::Either;
use std::fmt::{Display, Formatter};

pub trait BacktrackableFormula {
    /// Wraps every clause of `cnf` in the representation's own tracking structure.
    fn new(cnf: &CnfFormula) -> Self;

    /// Fixes `literal` to true at `level`.
    fn assign(&mut self, literal: Literal, level: DecisionLevel);

    /// Forces the sole live literal of unit clauses at `level` until none remain or a
    /// conflict is found.
    fn unit_propagate(&mut self, level: DecisionLevel);

    /// Undoes every assignment made above `level`.
    fn backtrack(&mut self, level: DecisionLevel);

    fn is_satisfied(&self) -> bool;

    fn is_unsatisfiable(&self) -> bool;

    /// Number of assignments made by unit propagation rather than by a decision.
    fn unit_propagation_steps(&self) -> usize;

    /// The fixed literals, in the order the representation records them.
    fn assignment(&self) -> impl Iterator<Item = Literal> + '_;

    /// Clauses not known to be satisfied, each yielding its literals that are still open.
    fn live_clauses(&self) -> impl Iterator<Item = impl Iterator<Item = Literal> + '_> + '_;
}

/// Which backtrackable representation a solve should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    #[default]
    AdjacencyList,
    WatchedLiterals,
}

impl Representation {
    #[must_use]
    pub const fn from_watched_flag(watched_literals: bool) -> Self {
        if watched_literals {
            Self::WatchedLiterals
        } else {
            Self::AdjacencyList
        }
    }
}

impl Display for Representation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdjacencyList => write!(f, "adjacency-list"),
            Self::WatchedLiterals => write!(f, "watched-literals"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FormulaImpls {
    AdjacencyList(Box<AdjacencyListFormula>),
    WatchedLiterals(Box<WatchedLiteralsFormula>),
}

impl FormulaImpls {
    #[must_use]
    pub fn with_representation(cnf: &CnfFormula, representation: Representation) -> Self {
        match representation {
            Representation::AdjacencyList => Self::AdjacencyList(Box::new(AdjacencyListFormula::new(cnf))),
            Representation::WatchedLiterals => {
                Self::WatchedLiterals(Box::new(WatchedLiteralsFormula::new(cnf)))
            }
        }
    }

    #[must_use]
    pub const fn representation(&self) -> Representation {
        match self {
            Self::AdjacencyList(_) => Representation::AdjacencyList,
            Self::WatchedLiterals(_) => Representation::WatchedLiterals,
        }
    }
}

impl BacktrackableFormula for FormulaImpls {
    fn new(cnf: &CnfFormula) -> Self {
        Self::with_representation(cnf, Representation::default())
    }

    fn assign(&mut self, literal: Literal, level: DecisionLevel) {
        match self {
            Self::AdjacencyList(f) => f.assign(literal, level),
            Self::WatchedLiterals(f) => f.assign(literal, level),
        }
    }

    fn unit_propagate(&mut self, level: DecisionLevel) {
        match self {
            Self::AdjacencyList(f) => f.unit_propagate(level),
            Self::WatchedLiterals(f) => f.unit_propagate(level),
        }
    }

    fn backtrack(&mut self, level: DecisionLevel) {
        match self {
            Self::AdjacencyList(f) => f.backtrack(level),
            Self::WatchedLiterals(f) => f.backtrack(level),
        }
    }

    fn is_satisfied(&self) -> bool {
        match self {
            Self::AdjacencyList(f) => f.is_satisfied(),
            Self::WatchedLiterals(f) => f.is_satisfied(),
        }
    }

    fn is_unsatisfiable(&self) -> bool {
        match self {
            Self::AdjacencyList(f) => f.is_unsatisfiable(),
            Self::WatchedLiterals(f) => f.is_unsatisfiable(),
        }
    }

    fn unit_propagation_steps(&self) -> usize {
        match self {
            Self::AdjacencyList(f) => f.unit_propagation_steps(),
            Self::WatchedLiterals(f) => f.unit_propagation_steps(),
        }
    }

    fn assignment(&self) -> impl Iterator<Item = Literal> + '_ {
        match self {
            Self::AdjacencyList(f) => Either::Left(f.assignment()),
            Self::WatchedLiterals(f) => Either::Right(f.assignment()),
        }
    }

    fn live_clauses(&self) -> impl Iterator<Item = impl Iterator<Item = Literal> + '_> + '_ {
        match self {
            Self::AdjacencyList(f) => Either::Left(f.live_clauses().map(Either::Left)),
            Self::WatchedLiterals(f) => Either::Right(f.live_clauses().map(Either::Right)),
        }
    }
}
